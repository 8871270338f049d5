//! Two-phase generation: configure once, generate per pass

use crate::backend::Backend;
use crate::builder::build_document;
use crate::config::GeneratorConfig;
use crate::document::Document;
use crate::names::collect_secret_names;
use crate::policy::{Recovery, recover};
use crate::Result;
use azsecrets_secrets::{ResolutionMode, resolve_all};

/// A configured secret generator.
///
/// Each call to [`generate`](Generator::generate) connects a fresh client and
/// re-reads every secret, so rotated values are picked up and nothing is
/// cached between passes.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    backend: Backend,
    mode: ResolutionMode,
}

impl Generator {
    /// Parse a YAML configuration and bind it to `backend`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`](crate::Error::Parse) or
    /// [`Error::Configuration`](crate::Error::Configuration) if the
    /// configuration is invalid.
    pub fn configure(raw: &str, backend: Backend) -> Result<Self> {
        let config = GeneratorConfig::from_yaml(raw)?;
        tracing::debug!(
            generator = %config.metadata.name,
            vault = %config.vault,
            documents = config.secrets.len(),
            "Configured generator"
        );
        Ok(Self::from_config(config, backend))
    }

    /// Bind an already parsed configuration to `backend`.
    #[must_use]
    pub const fn from_config(config: GeneratorConfig, backend: Backend) -> Self {
        Self {
            config,
            backend,
            mode: ResolutionMode::Concurrent,
        }
    }

    /// Choose between concurrent (default) and sequential fetching.
    #[must_use]
    pub const fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// The parsed configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run one generation pass.
    ///
    /// Returns one document per configured spec, in configuration order, or
    /// no documents when a fetch failed and the error policy excludes output.
    ///
    /// # Errors
    ///
    /// - [`Error::Credentials`](crate::Error::Credentials) if the backend cannot connect
    /// - [`Error::Resolution`](crate::Error::Resolution) if a fetch fails without a recovery policy
    /// - any error from [`build_document`]
    pub async fn generate(&self) -> Result<Vec<Document>> {
        tracing::debug!(generator = %self.config.metadata.name, "Generate start");
        let client = self.backend.connect(&self.config.vault)?;
        let names = collect_secret_names(&self.config.secrets);

        let (values, patch) = match resolve_all(&client, &names, self.mode).await {
            Ok(values) => (values, None),
            Err(error) => match recover(&self.config, &names, error)? {
                Recovery::Exclude => return Ok(Vec::new()),
                Recovery::Fallback { values, patch } => (values, Some(patch)),
            },
        };

        let documents = self
            .config
            .secrets
            .iter()
            .map(|spec| build_document(spec, &self.config.metadata, &values, patch.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            generator = %self.config.metadata.name,
            documents = documents.len(),
            "Generate end"
        );
        Ok(documents)
    }
}
