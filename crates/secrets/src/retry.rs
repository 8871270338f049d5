//! Bounded retry for transient vault failures

use crate::{SecretError, VaultClient};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    /// Six attempts with no delay, matching Key Vault's spurious 401s.
    fn default() -> Self {
        Self {
            max_attempts: 6,
            delay: Duration::ZERO,
        }
    }
}

/// Execute a fetch, retrying while `is_transient` accepts the error.
///
/// Non-transient errors are returned immediately. When every attempt fails
/// with a transient error the last one is wrapped in
/// [`SecretError::RetriesExhausted`].
///
/// # Errors
///
/// Returns the first non-transient error, or `RetriesExhausted`.
pub async fn with_retry<T, F, Fut, P>(
    config: &RetryConfig,
    name: &str,
    is_transient: P,
    mut operation: F,
) -> Result<T, SecretError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SecretError>>,
    P: Fn(&SecretError) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if !is_transient(&e) => return Err(e),
            Err(e) if attempt >= max_attempts => {
                return Err(SecretError::RetriesExhausted {
                    name: name.to_string(),
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                tracing::warn!(
                    secret = %name,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Transient vault error, retrying"
                );
                if !config.delay.is_zero() {
                    tokio::time::sleep(config.delay).await;
                }
            }
        }
    }
}

/// Decorator adding [`with_retry`] to any [`VaultClient`].
///
/// The retry policy stays independent of the transport: the wrapped client
/// only has to classify its failures through [`SecretError::is_transient`].
#[derive(Debug)]
pub struct RetryingClient<C> {
    inner: C,
    config: RetryConfig,
}

impl<C: VaultClient> RetryingClient<C> {
    /// Wrap `inner` with the given retry configuration.
    #[must_use]
    pub const fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// The wrapped client.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: VaultClient> VaultClient for RetryingClient<C> {
    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        with_retry(&self.config, name, SecretError::is_transient, move || {
            self.inner.get_secret(name)
        })
        .await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
