//! Vault backend selection

use crate::{Error, Result};
use azsecrets_azure::AzureKeyVaultClient;
use azsecrets_secrets::{
    FixtureClient, OfflineClient, OfflineConfig, RetryConfig, RetryingClient, SecretError,
    VaultClient,
};
use std::sync::Arc;

/// Which vault client a generation pass uses.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Azure Key Vault with environment credentials, retrying spurious 401s
    Azure,
    /// Random values after a warning pause, for working without vault access
    Offline(OfflineConfig),
    /// Deterministic values for tests; clones share the call counter
    Fixture(FixtureClient),
}

impl Backend {
    /// Offline when `AZURE_SECRETS_OFFLINE_TESTING_MODE` is set, otherwise Azure.
    #[must_use]
    pub fn from_env() -> Self {
        if OfflineConfig::enabled_in_env() {
            Self::Offline(OfflineConfig::from_env())
        } else {
            Self::Azure
        }
    }

    /// Create a fresh client for `vault`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Credentials`] when the Azure backend is selected and
    /// the environment does not carry usable credentials, and
    /// [`Error::Configuration`] when `vault` is not a valid vault name.
    pub fn connect(&self, vault: &str) -> Result<Arc<dyn VaultClient>> {
        let client: Arc<dyn VaultClient> = match self {
            Self::Azure => {
                let client = AzureKeyVaultClient::from_env(vault).map_err(|source| match source {
                    SecretError::InvalidVault { .. } => Error::configuration(source.to_string()),
                    source => Error::Credentials { source },
                })?;
                Arc::new(RetryingClient::new(client, RetryConfig::default()))
            }
            Self::Offline(config) => Arc::new(OfflineClient::new(vault, *config)),
            Self::Fixture(fixture) => Arc::new(fixture.clone()),
        };
        tracing::debug!(vault, provider = client.provider_name(), "Connected to vault");
        Ok(client)
    }
}
