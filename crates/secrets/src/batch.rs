//! Resolution of a deduplicated name set against a single vault client
//!
//! Two strategies are provided:
//! - Concurrent: one task per name in a [`JoinSet`], first error wins
//! - Sequential: names fetched in order, kept for diagnosing vault problems
//!
//! Both guard every fetch with `catch_unwind`, so a client that panics
//! produces an ordinary [`SecretError::Panicked`] instead of taking the
//! engine down or leaving a result slot empty.

use crate::{ResolvedValues, SecretError, SecureSecret, VaultClient};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;

/// How a name set is fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionMode {
    /// One task per name, all in flight at once
    #[default]
    Concurrent,
    /// One name at a time in the given order
    Sequential,
}

/// Resolve every name in `names` using `mode`.
///
/// On success the result holds exactly one entry per name. On failure no
/// values are returned at all.
///
/// # Errors
///
/// Returns the first fetch error encountered.
pub async fn resolve_all(
    client: &Arc<dyn VaultClient>,
    names: &[String],
    mode: ResolutionMode,
) -> Result<ResolvedValues, SecretError> {
    tracing::debug!(
        provider = client.provider_name(),
        count = names.len(),
        ?mode,
        "Resolving secrets"
    );
    match mode {
        ResolutionMode::Concurrent => resolve_concurrent(client, names).await,
        ResolutionMode::Sequential => resolve_sequential(client.as_ref(), names).await,
    }
}

/// Fetch names one after another, stopping at the first error.
///
/// # Errors
///
/// Returns the first fetch error encountered.
pub async fn resolve_sequential(
    client: &dyn VaultClient,
    names: &[String],
) -> Result<ResolvedValues, SecretError> {
    let mut values = ResolvedValues::with_capacity(names.len());
    for name in names {
        tracing::debug!(secret = %name, "Getting value");
        let value = fetch_guarded(client, name).await?;
        values.insert(name.clone(), value);
    }
    Ok(values)
}

/// Fetch all names concurrently, one task per name.
///
/// Results are consumed in completion order and placed by name, so the
/// output does not depend on scheduling. The first error is returned
/// immediately and the tasks still in flight are aborted.
///
/// # Errors
///
/// Returns the first fetch error to complete.
pub async fn resolve_concurrent(
    client: &Arc<dyn VaultClient>,
    names: &[String],
) -> Result<ResolvedValues, SecretError> {
    let mut tasks = JoinSet::new();
    let mut task_names = HashMap::with_capacity(names.len());

    for name in names {
        tracing::debug!(secret = %name, "Getting value");
        let client = Arc::clone(client);
        let task_name = name.clone();
        let handle = tasks.spawn(async move {
            let result = fetch_guarded(client.as_ref(), &task_name).await;
            (task_name, result)
        });
        task_names.insert(handle.id(), name.clone());
    }

    let mut values = ResolvedValues::with_capacity(names.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        let (name, result) = match joined {
            Ok((_, report)) => report,
            Err(join_error) => {
                let name = task_names
                    .get(&join_error.id())
                    .cloned()
                    .unwrap_or_default();
                (
                    name.clone(),
                    Err(SecretError::Panicked {
                        name,
                        message: join_error.to_string(),
                    }),
                )
            }
        };

        match result {
            Ok(value) => {
                tracing::debug!(secret = %name, "Got value");
                values.insert(name, value);
            }
            Err(e) => {
                tracing::debug!(secret = %name, error = %e, "Fetch failed");
                tasks.abort_all();
                return Err(e);
            }
        }
    }

    Ok(values)
}

/// Fetch one secret, converting a panic inside the client into an error.
async fn fetch_guarded(client: &dyn VaultClient, name: &str) -> Result<SecureSecret, SecretError> {
    match AssertUnwindSafe(client.get_secret_secure(name))
        .catch_unwind()
        .await
    {
        Ok(result) => result,
        Err(payload) => Err(SecretError::Panicked {
            name: name.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FixtureClient;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn fixture(latency: Duration) -> (FixtureClient, Arc<dyn VaultClient>) {
        let fixture = FixtureClient::with_latency(latency);
        let client: Arc<dyn VaultClient> = Arc::new(fixture.clone());
        (fixture, client)
    }

    struct PanickingClient;

    #[async_trait]
    impl VaultClient for PanickingClient {
        #[allow(clippy::panic)]
        async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
            if name == "BOOM" {
                panic!("client exploded");
            }
            Ok(format!("value of {name}"))
        }

        fn provider_name(&self) -> &'static str {
            "panicking"
        }
    }

    /// Fails `FAIL` at once; `SLOW` records completion after ten seconds.
    #[derive(Default)]
    struct SlowClient {
        slow_finished: AtomicBool,
    }

    #[async_trait]
    impl VaultClient for SlowClient {
        async fn get_secret(&self, name: &str) -> Result<String, SecretError> {
            if name == "FAIL" {
                return Err(SecretError::ResolutionFailed {
                    name: name.to_string(),
                    message: "denied".to_string(),
                });
            }
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.slow_finished.store(true, Ordering::SeqCst);
            Ok("slow".to_string())
        }

        fn provider_name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_empty_name_set() {
        let (fixture, client) = fixture(Duration::ZERO);
        for mode in [ResolutionMode::Concurrent, ResolutionMode::Sequential] {
            let values = resolve_all(&client, &[], mode).await.unwrap();
            assert!(values.is_empty());
        }
        assert_eq!(fixture.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_resolves_every_name() {
        let (fixture, client) = fixture(Duration::from_secs(1));
        let requested = names(&["BAR", "B64BAZ", "FOO"]);

        let values = resolve_concurrent(&client, &requested).await.unwrap();

        assert_eq!(values.len(), 3);
        assert_eq!(values.get("FOO").unwrap().expose(), "Secret value for FOO");
        assert_eq!(values.get("BAR").unwrap().expose(), "Secret value for BAR");
        assert!(values.contains("B64BAZ"));
        assert_eq!(fixture.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_is_faster_than_sequential() {
        let requested = names(&["A", "B", "C", "D", "E", "F", "G", "H", "I"]);

        let (_, client) = fixture(Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        resolve_all(&client, &requested, ResolutionMode::Concurrent)
            .await
            .unwrap();
        let concurrent = start.elapsed();

        let (_, client) = fixture(Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        resolve_all(&client, &requested, ResolutionMode::Sequential)
            .await
            .unwrap();
        let sequential = start.elapsed();

        assert!(concurrent < Duration::from_secs(2));
        assert!(sequential >= Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_returns_first_error() {
        let (_, client) = fixture(Duration::from_secs(1));
        let requested = names(&["BAR", "ERR", "FOO"]);

        let err = resolve_concurrent(&client, &requested).await.unwrap_err();

        assert_eq!(err.secret_name(), Some("ERR"));
        assert!(err.to_string().contains("test error"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_error_aborts_pending_fetches() {
        let slow = Arc::new(SlowClient::default());
        let client: Arc<dyn VaultClient> = slow.clone();

        let err = resolve_concurrent(&client, &names(&["FAIL", "SLOW"]))
            .await
            .unwrap_err();
        assert_eq!(err.secret_name(), Some("FAIL"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!slow.slow_finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_stops_at_first_error() {
        let (fixture, client) = fixture(Duration::from_secs(1));
        let requested = names(&["AAA", "ERR", "ZZZ"]);

        let err = resolve_all(&client, &requested, ResolutionMode::Sequential)
            .await
            .unwrap_err();

        assert_eq!(err.secret_name(), Some("ERR"));
        assert_eq!(fixture.calls(), 2);
    }

    #[tokio::test]
    async fn test_panic_becomes_error_concurrent() {
        let client: Arc<dyn VaultClient> = Arc::new(PanickingClient);
        let requested = names(&["BOOM", "FINE"]);

        let err = resolve_concurrent(&client, &requested).await.unwrap_err();

        match err {
            SecretError::Panicked { name, message } => {
                assert_eq!(name, "BOOM");
                assert!(message.contains("client exploded"));
            }
            other => panic!("expected Panicked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_error_sequential() {
        let requested = names(&["BOOM"]);

        let err = resolve_sequential(&PanickingClient, &requested)
            .await
            .unwrap_err();

        assert!(matches!(err, SecretError::Panicked { .. }));
    }

    #[test]
    fn test_default_mode_is_concurrent() {
        assert_eq!(ResolutionMode::default(), ResolutionMode::Concurrent);
    }
}
