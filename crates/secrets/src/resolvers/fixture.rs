//! Deterministic client for tests

use crate::{SecretError, VaultClient};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Returns fixed values derived from the requested name.
///
/// | Name            | Result                                         |
/// |-----------------|------------------------------------------------|
/// | `ERR`           | error `"test error"`                           |
/// | `RND`           | a random non-negative integer                  |
/// | `B64<rest>`     | base64 of `"Secret value for <rest>"`          |
/// | anything else   | `"Secret value for <name>"`                    |
///
/// Every call sleeps for a fixed latency (one second by default) so that
/// sequential and concurrent resolution are distinguishable. Clones share a
/// call counter, which lets tests assert how many fetches were issued.
#[derive(Debug, Clone)]
pub struct FixtureClient {
    latency: Duration,
    calls: Arc<AtomicUsize>,
}

impl Default for FixtureClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureClient {
    /// Name that always fails.
    pub const ERROR_NAME: &'static str = "ERR";
    /// Name that returns a fresh random number on every fetch.
    pub const RANDOM_NAME: &'static str = "RND";
    /// Prefix that makes the value base64-encoded.
    pub const BASE64_PREFIX: &'static str = "B64";

    /// Create a fixture client with the default one second latency.
    #[must_use]
    pub fn new() -> Self {
        Self::with_latency(Duration::from_secs(1))
    }

    /// Create a fixture client with a custom per-call latency.
    #[must_use]
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of fetches issued through this client and its clones.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The value returned for `name`, without latency or call counting.
    ///
    /// # Errors
    ///
    /// Fails for [`FixtureClient::ERROR_NAME`].
    pub fn value_for(name: &str) -> Result<String, SecretError> {
        if name == Self::ERROR_NAME {
            return Err(SecretError::ResolutionFailed {
                name: name.to_string(),
                message: "test error".to_string(),
            });
        }
        if name == Self::RANDOM_NAME {
            return Ok(rand::thread_rng().gen_range(0..=i64::MAX).to_string());
        }
        if let Some(rest) = name.strip_prefix(Self::BASE64_PREFIX) {
            return Ok(STANDARD.encode(format!("Secret value for {rest}")));
        }
        Ok(format!("Secret value for {name}"))
    }
}

#[async_trait]
impl VaultClient for FixtureClient {
    fn provider_name(&self) -> &'static str {
        "fixture"
    }

    async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = Self::value_for(name);
        tokio::time::sleep(self.latency).await;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value() {
        assert_eq!(
            FixtureClient::value_for("FOO").unwrap(),
            "Secret value for FOO"
        );
    }

    #[test]
    fn test_base64_prefix() {
        let value = FixtureClient::value_for("B64FOO").unwrap();
        assert_eq!(value, STANDARD.encode("Secret value for FOO"));
    }

    #[test]
    fn test_error_name() {
        let err = FixtureClient::value_for("ERR").unwrap_err();
        assert!(err.to_string().contains("test error"));
        assert_eq!(err.secret_name(), Some("ERR"));
    }

    #[test]
    fn test_random_name_is_numeric() {
        let value = FixtureClient::value_for("RND").unwrap();
        assert!(value.parse::<i64>().unwrap() >= 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_and_call_count() {
        let client = FixtureClient::new();
        let clone = client.clone();

        let start = tokio::time::Instant::now();
        client.get_secret("FOO").await.unwrap();
        clone.get_secret("BAR").await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_still_counts_call() {
        let client = FixtureClient::with_latency(Duration::ZERO);
        assert!(client.get_secret("ERR").await.is_err());
        assert_eq!(client.calls(), 1);
    }
}
