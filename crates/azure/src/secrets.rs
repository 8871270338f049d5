//! Key Vault secret client over the REST API

use crate::credentials::{AzureCredentials, ServicePrincipal};
use async_trait::async_trait;
use azsecrets_secrets::{SecretError, VaultClient};
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Key Vault data-plane API version.
pub const API_VERSION: &str = "7.4";

/// Public cloud authority host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Instance metadata service token endpoint used for managed identities.
pub const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

const VAULT_SCOPE: &str = "https://vault.azure.net/.default";
const VAULT_RESOURCE: &str = "https://vault.azure.net";
const IMDS_API_VERSION: &str = "2018-02-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URLs for the token endpoints and the vault.
///
/// All default to the public cloud. Overriding them points the client at
/// sovereign clouds or at a local test server.
#[derive(Debug, Clone, Default)]
pub struct AzureEndpoints {
    /// Authority host used for token requests
    pub authority_host: Option<String>,
    /// Vault base URL; defaults to `https://{vault}.vault.azure.net`
    pub vault_url: Option<String>,
    /// Managed identity token endpoint; defaults to [`IMDS_TOKEN_ENDPOINT`]
    pub identity_endpoint: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SecretBundle {
    value: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Fetches secrets from a single Azure Key Vault.
///
/// A bearer token is requested on first use with the service principal's
/// client credentials and reused for the lifetime of the client. Responses
/// are classified so that 401 surfaces as [`SecretError::Unauthorized`],
/// which callers typically retry through
/// [`RetryingClient`](azsecrets_secrets::RetryingClient).
pub struct AzureKeyVaultClient {
    vault: String,
    credentials: AzureCredentials,
    endpoints: AzureEndpoints,
    http: reqwest::Client,
    token: OnceCell<SecretString>,
}

impl std::fmt::Debug for AzureKeyVaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureKeyVaultClient")
            .field("vault", &self.vault)
            .field("endpoints", &self.endpoints)
            .field("token_cached", &self.token.initialized())
            .finish_non_exhaustive()
    }
}

impl AzureKeyVaultClient {
    /// Create a client for `vault` with explicit credentials.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidVault`] if `vault` is not a valid vault
    /// name, or an error if the HTTP client cannot be initialized.
    pub fn new(vault: impl Into<String>, credentials: AzureCredentials) -> Result<Self, SecretError> {
        let vault = vault.into();
        if !is_valid_vault_name(&vault) {
            return Err(SecretError::InvalidVault { vault });
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("azsecrets/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SecretError::ResolutionFailed {
                name: vault.clone(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            vault,
            credentials,
            endpoints: AzureEndpoints::default(),
            http,
            token: OnceCell::new(),
        })
    }

    /// Create a client for `vault` using credentials from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidCredentials`] when the environment does
    /// not carry usable credentials, see [`AzureCredentials::from_env`].
    pub fn from_env(vault: impl Into<String>) -> Result<Self, SecretError> {
        Self::new(vault, AzureCredentials::from_env()?)
    }

    /// Override the token and vault endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: AzureEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// The URL used to read the current version of `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault base URL is not a valid URL.
    pub fn secret_url(&self, name: &str) -> Result<Url, SecretError> {
        let base = self
            .endpoints
            .vault_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.vault.azure.net", self.vault));

        let invalid = |detail: String| SecretError::ResolutionFailed {
            name: name.to_string(),
            message: format!("Invalid vault URL '{base}': {detail}"),
        };

        let mut url = Url::parse(&base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["secrets", name]);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    async fn access_token(&self, name: &str) -> Result<&SecretString, SecretError> {
        self.token
            .get_or_try_init(|| async {
                if let AzureCredentials::ManagedIdentity { client_id } = &self.credentials {
                    return self.request_identity_token(client_id.as_deref()).await;
                }
                let principal = self.credentials.service_principal().await?;
                self.request_token(&principal).await
            })
            .await
            .map_err(|e| SecretError::ResolutionFailed {
                name: name.to_string(),
                message: format!(
                    "unable to create vault authorizer for vault '{}': {e}",
                    self.vault
                ),
            })
    }

    async fn request_token(&self, principal: &ServicePrincipal) -> Result<SecretString, SecretError> {
        let authority = self
            .endpoints
            .authority_host
            .as_deref()
            .or(principal.authority_host.as_deref())
            .unwrap_or(DEFAULT_AUTHORITY_HOST)
            .trim_end_matches('/');
        let url = format!("{authority}/{}/oauth2/v2.0/token", principal.tenant_id);

        tracing::debug!(client_id = %principal.client_id, "Requesting Key Vault token");
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", principal.client_id.as_str()),
                ("client_secret", principal.client_secret.expose_secret()),
                ("scope", VAULT_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| SecretError::InvalidCredentials {
                message: format!("Token request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SecretError::InvalidCredentials {
                message: format!("Token endpoint returned {status}: {body}"),
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| SecretError::InvalidCredentials {
                    message: format!("Invalid token response: {e}"),
                })?;
        Ok(SecretString::from(token.access_token))
    }

    async fn request_identity_token(
        &self,
        client_id: Option<&str>,
    ) -> Result<SecretString, SecretError> {
        let endpoint = self
            .endpoints
            .identity_endpoint
            .as_deref()
            .unwrap_or(IMDS_TOKEN_ENDPOINT);
        let mut query = vec![("api-version", IMDS_API_VERSION), ("resource", VAULT_RESOURCE)];
        if let Some(client_id) = client_id {
            query.push(("client_id", client_id));
        }

        tracing::debug!(client_id = ?client_id, "Requesting managed identity token");
        let response = self
            .http
            .get(endpoint)
            .query(&query)
            .header("Metadata", "true")
            .send()
            .await
            .map_err(|e| SecretError::InvalidCredentials {
                message: format!("Managed identity token request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SecretError::InvalidCredentials {
                message: format!("Managed identity endpoint returned {status}: {body}"),
            });
        }

        let token: TokenResponse =
            response
                .json()
                .await
                .map_err(|e| SecretError::InvalidCredentials {
                    message: format!("Invalid managed identity token response: {e}"),
                })?;
        Ok(SecretString::from(token.access_token))
    }
}

/// Vault names are used as a host label, so only letters, digits and hyphens
/// are accepted.
fn is_valid_vault_name(vault: &str) -> bool {
    !vault.is_empty() && vault.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Map a non-success Key Vault response to an error.
#[must_use]
pub fn status_error(status: StatusCode, name: &str, vault: &str, body: &str) -> SecretError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| format!("HTTP {status}"),
        |envelope| {
            format!(
                "HTTP {status}: {}: {}",
                envelope.error.code, envelope.error.message
            )
        },
    );

    match status {
        StatusCode::UNAUTHORIZED => SecretError::Unauthorized {
            name: name.to_string(),
            vault: vault.to_string(),
            message: detail,
        },
        StatusCode::NOT_FOUND => SecretError::NotFound {
            name: name.to_string(),
            vault: vault.to_string(),
        },
        _ => SecretError::ResolutionFailed {
            name: name.to_string(),
            message: format!("Error getting secret from vault '{vault}': {detail}"),
        },
    }
}

#[async_trait]
impl VaultClient for AzureKeyVaultClient {
    fn provider_name(&self) -> &'static str {
        "azure"
    }

    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        let url = self.secret_url(name)?;
        let token = self.access_token(name).await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| SecretError::ResolutionFailed {
                name: name.to_string(),
                message: format!("Error getting secret from vault '{}': {e}", self.vault),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(secret = %name, %status, "Key Vault request failed");
            return Err(status_error(status, name, &self.vault, &body));
        }

        let bundle: SecretBundle =
            response
                .json()
                .await
                .map_err(|e| SecretError::ResolutionFailed {
                    name: name.to_string(),
                    message: format!("Invalid Key Vault response: {e}"),
                })?;

        bundle.value.ok_or_else(|| SecretError::ResolutionFailed {
            name: name.to_string(),
            message: format!("Secret in vault '{}' has no value", self.vault),
        })
    }
}
