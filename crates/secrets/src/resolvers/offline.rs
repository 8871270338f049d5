//! Offline client returning random values instead of real secrets

use crate::{SecretError, VaultClient, random_base64};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Setting this variable to any non-empty value enables offline mode.
pub const OFFLINE_MODE_ENV: &str = "AZURE_SECRETS_OFFLINE_TESTING_MODE";

/// Overrides how many seconds the offline warning pauses for.
pub const OFFLINE_WARN_SECONDS_ENV: &str = "AZURE_SECRETS_OFFLINE_TESTING_MODE_WARN_SECONDS";

const DEFAULT_WARN_PAUSE: Duration = Duration::from_secs(5);
const RANDOM_VALUE_LEN: usize = 32;

/// Configuration for [`OfflineClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflineConfig {
    /// How long to pause after the warning, before the first value is returned
    pub warn_pause: Duration,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            warn_pause: DEFAULT_WARN_PAUSE,
        }
    }
}

impl OfflineConfig {
    /// Create a config with an explicit pause.
    #[must_use]
    pub const fn with_pause(warn_pause: Duration) -> Self {
        Self { warn_pause }
    }

    /// Whether offline mode is switched on in the environment.
    #[must_use]
    pub fn enabled_in_env() -> bool {
        std::env::var(OFFLINE_MODE_ENV).is_ok_and(|v| !v.is_empty())
    }

    /// Read the pause from the environment.
    ///
    /// Unset or unparseable values fall back to 5 seconds.
    #[must_use]
    pub fn from_env() -> Self {
        let warn_pause = std::env::var(OFFLINE_WARN_SECONDS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map_or(DEFAULT_WARN_PAUSE, Duration::from_secs);
        Self { warn_pause }
    }
}

/// Returns random base64 strings for every name and never fails.
///
/// Meant for rendering manifests without vault access. Because the output
/// looks like real data, the first fetch logs a loud banner at error level
/// and then deliberately stalls for [`OfflineConfig::warn_pause`] so nobody
/// mistakes the result for real secrets. Concurrent first fetches all wait on the same
/// warning; it is only emitted once per client.
#[derive(Debug)]
pub struct OfflineClient {
    vault: String,
    config: OfflineConfig,
    warned: OnceCell<()>,
}

impl OfflineClient {
    /// Create an offline client standing in for `vault`.
    #[must_use]
    pub fn new(vault: impl Into<String>, config: OfflineConfig) -> Self {
        Self {
            vault: vault.into(),
            config,
            warned: OnceCell::new(),
        }
    }

    async fn warn_operator(&self) {
        self.warned
            .get_or_init(|| async {
                tracing::error!(
                    vault = %self.vault,
                    pause_secs = self.config.warn_pause.as_secs(),
                    "\n\
                     #########################################\n\
                     #                                       #\n\
                     #             AZURE SECRETS             #\n\
                     #       IS IN OFFLINE TESTING MODE      #\n\
                     #        RETURNING RANDOM STRINGS       #\n\
                     #        INSTEAD OF REAL SECRETS!       #\n\
                     #                                       #\n\
                     #########################################"
                );
                tokio::time::sleep(self.config.warn_pause).await;
            })
            .await;
    }
}

#[async_trait]
impl VaultClient for OfflineClient {
    fn provider_name(&self) -> &'static str {
        "offline"
    }

    async fn get_secret(&self, _name: &str) -> Result<String, SecretError> {
        self.warn_operator().await;
        Ok(random_base64("", RANDOM_VALUE_LEN))
    }
}
