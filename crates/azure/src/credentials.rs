//! Credentials for Key Vault
//!
//! Credentials come from one of three places, checked in this order:
//! 1. An auth file named by `AZURE_AUTH_LOCATION`
//! 2. `AZURE_TENANT_ID`, `AZURE_CLIENT_ID` and `AZURE_CLIENT_SECRET`
//! 3. The managed identity of the host, only when
//!    `DISABLE_AZURE_AUTH_VALIDATION` is set
//!
//! Presence checks run when the credentials are read. Setting
//! `DISABLE_AZURE_AUTH_VALIDATION` skips them. Without client credentials the
//! client then asks the instance metadata service for a token, which is how
//! pods running with a managed identity authenticate.

use azsecrets_secrets::SecretError;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory (tenant) id of the service principal.
pub const TENANT_ID_ENV: &str = "AZURE_TENANT_ID";
/// Application (client) id of the service principal.
pub const CLIENT_ID_ENV: &str = "AZURE_CLIENT_ID";
/// Client secret of the service principal.
pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
/// Path to a JSON auth file, used instead of the three variables above.
pub const AUTH_LOCATION_ENV: &str = "AZURE_AUTH_LOCATION";
/// Any non-empty value skips the credential presence checks.
pub const DISABLE_VALIDATION_ENV: &str = "DISABLE_AZURE_AUTH_VALIDATION";

/// Where credentials for the token endpoint come from.
#[derive(Debug, Clone)]
pub enum AzureCredentials {
    /// Client credentials held in memory
    ClientSecret(ServicePrincipal),
    /// Client credentials read from a JSON auth file on first use
    AuthFile(PathBuf),
    /// Token issued by the instance metadata service
    ManagedIdentity {
        /// Client id of a user-assigned identity; `None` selects the
        /// system-assigned identity
        client_id: Option<String>,
    },
}

/// Client credentials for the OAuth2 `client_credentials` grant.
#[derive(Debug, Clone)]
pub struct ServicePrincipal {
    /// Directory (tenant) id
    pub tenant_id: String,
    /// Application (client) id
    pub client_id: String,
    /// Client secret
    pub client_secret: SecretString,
    /// Authority host override taken from an auth file
    pub authority_host: Option<String>,
}

impl ServicePrincipal {
    /// Create client credentials for the default authority host.
    #[must_use]
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            authority_host: None,
        }
    }
}

/// The subset of the SDK auth file this client understands.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthFileContents {
    client_id: String,
    client_secret: String,
    tenant_id: String,
    #[serde(default)]
    active_directory_endpoint_url: Option<String>,
}

impl AzureCredentials {
    /// Read credentials from the environment.
    ///
    /// # Errors
    ///
    /// Unless validation is disabled, returns
    /// [`SecretError::InvalidCredentials`] when the auth file does not exist,
    /// or when no auth file is configured and any of the three client
    /// credential variables is unset.
    pub fn from_env() -> Result<Self, SecretError> {
        let validate = env_value(DISABLE_VALIDATION_ENV).is_none();

        if let Some(path) = env_value(AUTH_LOCATION_ENV).map(PathBuf::from) {
            if validate && !path.exists() {
                return Err(SecretError::InvalidCredentials {
                    message: format!("{} does not exist", path.display()),
                });
            }
            tracing::info!(path = %path.display(), "Using file based auth");
            return Ok(Self::AuthFile(path));
        }

        let tenant_id = env_value(TENANT_ID_ENV);
        let client_id = env_value(CLIENT_ID_ENV);
        let client_secret = env_value(CLIENT_SECRET_ENV);

        if validate && (tenant_id.is_none() || client_id.is_none() || client_secret.is_none()) {
            return Err(SecretError::InvalidCredentials {
                message: format!(
                    "The environment variables: {TENANT_ID_ENV}, {CLIENT_ID_ENV}, \
                     {CLIENT_SECRET_ENV} should be set. Or set {DISABLE_VALIDATION_ENV} \
                     to bypass this check."
                ),
            });
        }

        match (tenant_id, client_id, client_secret) {
            (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                tracing::info!(client_id = %client_id, "Using env based auth");
                Ok(Self::ClientSecret(ServicePrincipal::new(
                    tenant_id,
                    client_id,
                    client_secret,
                )))
            }
            (_, client_id, _) => {
                tracing::info!(client_id = ?client_id, "Using managed identity auth");
                Ok(Self::ManagedIdentity { client_id })
            }
        }
    }

    /// Resolve to in-memory client credentials, reading the auth file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidCredentials`] if the auth file cannot be
    /// read or parsed, or for managed identity credentials, which carry no
    /// client secret.
    pub async fn service_principal(&self) -> Result<ServicePrincipal, SecretError> {
        match self {
            Self::ClientSecret(principal) => Ok(principal.clone()),
            Self::AuthFile(path) => read_auth_file(path).await,
            Self::ManagedIdentity { .. } => Err(SecretError::InvalidCredentials {
                message: "Managed identity credentials have no client secret".to_string(),
            }),
        }
    }
}

async fn read_auth_file(path: &Path) -> Result<ServicePrincipal, SecretError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SecretError::InvalidCredentials {
            message: format!("Failed to read auth file {}: {e}", path.display()),
        })?;
    let contents: AuthFileContents =
        serde_json::from_str(&raw).map_err(|e| SecretError::InvalidCredentials {
            message: format!("Invalid auth file {}: {e}", path.display()),
        })?;

    let mut principal = ServicePrincipal::new(
        contents.tenant_id,
        contents.client_id,
        contents.client_secret,
    );
    principal.authority_host = contents
        .active_directory_endpoint_url
        .map(|url| url.trim_end_matches('/').to_string());
    Ok(principal)
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
