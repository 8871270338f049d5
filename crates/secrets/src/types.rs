//! Secure secret types with automatic memory zeroing
//!
//! - [`SecureSecret`]: A wrapper around `secrecy::SecretString` that auto-zeros on drop
//! - [`ResolvedValues`]: The vault values resolved for one generation pass

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

/// A resolved secret value with automatic memory zeroing on drop.
///
/// This type wraps `secrecy::SecretString` to ensure:
/// - Secret values are zeroed from memory when dropped
/// - Debug output shows `[REDACTED]` instead of the actual value
/// - Explicit `.expose()` call required to access the value
#[derive(Clone)]
pub struct SecureSecret {
    inner: SecretString,
}

impl SecureSecret {
    /// Create a new secure secret from a string.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }

    /// Expose the secret value for use.
    ///
    /// The caller must ensure the exposed value is not logged.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Get the length of the secret value without exposing it.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Check if the secret value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Vault values resolved for a single generation pass.
///
/// Keyed by vault name. A `ResolvedValues` is only ever handed out complete:
/// the resolution engine either returns every requested name or an error, so
/// consumers never observe a partially populated set.
///
/// Values are zeroed when this struct is dropped. Nothing is cached between
/// passes; every pass fetches again so rotated secrets are picked up.
#[derive(Default, Clone)]
pub struct ResolvedValues {
    values: HashMap<String, SecureSecret>,
}

impl ResolvedValues {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a value under its vault name.
    pub fn insert(&mut self, name: String, value: SecureSecret) {
        self.values.insert(name, value);
    }

    /// Get a value by vault name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SecureSecret> {
        self.values.get(name)
    }

    /// Check if a vault name was resolved.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of resolved names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl FromIterator<(String, SecureSecret)> for ResolvedValues {
    fn from_iter<I: IntoIterator<Item = (String, SecureSecret)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Debug for ResolvedValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        f.debug_struct("ResolvedValues")
            .field("count", &self.values.len())
            .field("names", &names)
            .finish()
    }
}
