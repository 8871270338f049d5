//! Secret resolution for azsecrets
//!
//! Provides the [`VaultClient`] capability used to fetch named secrets from a
//! key-value vault, a retry decorator for transient failures, two built-in
//! clients (offline random values and deterministic fixtures) and the
//! resolution engine that fetches a deduplicated set of names either
//! sequentially or concurrently.
//!
//! # Resolution
//!
//! ```ignore
//! use azsecrets_secrets::{ResolutionMode, resolve_all};
//!
//! let names = vec!["DB-PASSWORD".to_string(), "API-KEY".to_string()];
//! let values = resolve_all(&client, &names, ResolutionMode::Concurrent).await?;
//!
//! if let Some(secret) = values.get("API-KEY") {
//!     use_api_key(secret.expose());
//! }
//! // Secrets are zeroed when `values` goes out of scope
//! ```

mod batch;
mod random;
pub mod resolvers;
mod retry;
mod types;

pub use batch::{ResolutionMode, resolve_all, resolve_concurrent, resolve_sequential};
pub use random::{random_alphanumeric, random_base64};
pub use retry::{RetryConfig, RetryingClient, with_retry};
pub use types::{ResolvedValues, SecureSecret};

// Built-in clients (no network access)
pub use resolvers::{FixtureClient, OfflineClient, OfflineConfig};

// The Key Vault backend lives in a separate crate:
// - azsecrets-azure: AzureKeyVaultClient, AzureCredentials

use async_trait::async_trait;
use thiserror::Error;

/// Error types for secret resolution
#[derive(Debug, Error)]
pub enum SecretError {
    /// Secret does not exist in the vault
    #[error("Secret '{name}' not found in vault '{vault}'")]
    NotFound {
        /// Secret name
        name: String,
        /// Vault that was searched
        vault: String,
    },

    /// The vault rejected the request as unauthenticated (HTTP 401).
    ///
    /// Key Vault intermittently answers valid requests with 401, so this is
    /// the only error class treated as transient.
    #[error("Unauthorized getting secret '{name}' from vault '{vault}': {message}")]
    Unauthorized {
        /// Secret name
        name: String,
        /// Vault that was queried
        vault: String,
        /// Response detail
        message: String,
    },

    /// Fetching the secret failed
    #[error("Failed to resolve secret '{name}': {message}")]
    ResolutionFailed {
        /// Secret name
        name: String,
        /// Error message from the client
        message: String,
    },

    /// A transient failure persisted through every retry attempt
    #[error("Giving up on secret '{name}' after {attempts} attempts")]
    RetriesExhausted {
        /// Secret name
        name: String,
        /// Number of attempts made
        attempts: u32,
        /// The error returned by the final attempt
        #[source]
        source: Box<SecretError>,
    },

    /// The client panicked while fetching the secret
    #[error("Fetching secret '{name}' panicked: {message}")]
    Panicked {
        /// Secret name
        name: String,
        /// Panic payload, when it was a string
        message: String,
    },

    /// The vault name cannot be used to address a vault
    #[error("Invalid vault name '{vault}': only letters, digits and hyphens are allowed")]
    InvalidVault {
        /// The rejected vault name
        vault: String,
    },

    /// Vault credentials are missing or invalid
    #[error("{message}")]
    InvalidCredentials {
        /// Description naming the required settings
        message: String,
    },
}

impl SecretError {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// The secret this error refers to, if any.
    #[must_use]
    pub fn secret_name(&self) -> Option<&str> {
        match self {
            Self::NotFound { name, .. }
            | Self::Unauthorized { name, .. }
            | Self::ResolutionFailed { name, .. }
            | Self::RetriesExhausted { name, .. }
            | Self::Panicked { name, .. } => Some(name),
            Self::InvalidVault { .. } | Self::InvalidCredentials { .. } => None,
        }
    }
}

/// Capability for fetching secrets from a vault by name.
///
/// Implementors must provide:
/// - [`get_secret`](VaultClient::get_secret) - Single secret lookup
/// - [`provider_name`](VaultClient::provider_name) - Backend identifier for diagnostics
///
/// Clients are shared across concurrent fetch tasks, so they must be
/// `Send + Sync`; any state they keep (token caches, one-time warnings) has to
/// tolerate concurrent first use.
#[async_trait]
pub trait VaultClient: Send + Sync {
    /// Fetch the current value of the named secret.
    async fn get_secret(&self, name: &str) -> Result<String, SecretError>;

    /// Get the backend name for this client.
    ///
    /// Examples: `"azure"`, `"offline"`, `"fixture"`
    fn provider_name(&self) -> &'static str;

    /// Fetch a secret returning a secure value.
    ///
    /// The returned [`SecureSecret`] will automatically zero its memory on drop.
    async fn get_secret_secure(&self, name: &str) -> Result<SecureSecret, SecretError> {
        let value = self.get_secret(name).await?;
        Ok(SecureSecret::new(value))
    }
}
