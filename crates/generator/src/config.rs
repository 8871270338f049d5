//! Generator configuration
//!
//! The configuration is a kustomize generator resource:
//!
//! ```yaml
//! apiVersion: devjoes/v1
//! kind: AzureSecrets
//! metadata:
//!   name: default-name
//!   namespace: default-ns
//! vault: my-vault
//! onError:
//!   warn: true
//!   patchMetadata:
//!     labels: { secrets-errored: "true" }
//! secrets:
//! - name: test-secret
//!   keys: [FOOKey=FOO, BARKey=BAR]
//! ```
//!
//! `apiVersion` and `kind` are accepted and ignored.

use crate::document::DocumentKind;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Namespace used when the configuration does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    /// Generator identity and the defaults inherited by documents
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Key Vault name
    #[serde(default)]
    pub vault: String,

    /// Documents to generate
    #[serde(default)]
    pub secrets: Vec<DocumentSpec>,

    /// Log progress at debug level
    #[serde(default)]
    pub verbose: bool,

    /// What to do when fetching from the vault fails
    #[serde(default)]
    pub on_error: Option<OnErrorConfig>,
}

/// Name and namespace of the generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectMeta {
    /// Default document name
    #[serde(default)]
    pub name: String,

    /// Default document namespace
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for ObjectMeta {
    fn default() -> Self {
        Self {
            name: String::new(),
            namespace: default_namespace(),
        }
    }
}

/// One document to generate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    /// Document name; inherited from `metadata.name` when empty
    #[serde(default)]
    pub name: String,

    /// Document namespace; inherited from `metadata.namespace` when empty
    #[serde(default)]
    pub namespace: String,

    /// `alias=vaultName` reference tokens, in output order
    #[serde(default)]
    pub keys: Vec<String>,

    /// Base64-decode every value before publishing it
    #[serde(default)]
    pub base64decode: bool,

    /// Produce a ConfigMap instead of a Secret
    #[serde(default)]
    pub output_as_config_map: bool,
}

impl DocumentSpec {
    /// The kind of document this spec produces.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        if self.output_as_config_map {
            DocumentKind::ConfigMap
        } else {
            DocumentKind::Secret
        }
    }
}

/// Error policy for vault fetch failures.
///
/// Without this block, or with `warn: false`, any fetch failure aborts the
/// whole generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnErrorConfig {
    /// Log a warning and recover instead of failing
    #[serde(default)]
    pub warn: bool,

    /// When recovering, emit no documents at all
    #[serde(default)]
    pub exclude: bool,

    /// When recovering with placeholders, merge this into every document
    #[serde(default)]
    pub patch_metadata: PatchMetadata,
}

/// Metadata merged into documents produced from placeholder values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PatchMetadata {
    /// Labels to add
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Annotations to add
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    /// Mark the generated documents immutable
    #[serde(default)]
    pub immutable: bool,
}

impl GeneratorConfig {
    /// Parse and validate a YAML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed YAML and
    /// [`Error::Configuration`] when no vault is named.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw).map_err(|source| Error::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when `vault` is empty.
    pub fn validate(&self) -> Result<()> {
        if self.vault.trim().is_empty() {
            return Err(Error::configuration(format!(
                "generator '{}' does not name a vault",
                self.metadata.name
            )));
        }
        Ok(())
    }

    /// The error policy, if fetch failures should be recovered from.
    #[must_use]
    pub fn recovery_policy(&self) -> Option<&OnErrorConfig> {
        self.on_error.as_ref().filter(|policy| policy.warn)
    }
}
