//! Azure Key Vault integration for azsecrets
//!
//! This crate provides the networked [`VaultClient`](azsecrets_secrets::VaultClient)
//! implementation:
//! - Service principal credentials from the environment or an auth file via
//!   the [`credentials`] module
//! - Secret lookups against the Key Vault REST API via the [`secrets`] module
//!
//! Retrying spurious 401 responses is left to
//! [`RetryingClient`](azsecrets_secrets::RetryingClient).

pub mod credentials;
pub mod secrets;

// Re-export main types for convenience
pub use credentials::AzureCredentials;
pub use secrets::{AzureEndpoints, AzureKeyVaultClient};
