//! Generated documents

use crate::config::PatchMetadata;
use azsecrets_secrets::SecureSecret;

/// The kind of key-value bundle a document becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Kubernetes `Secret`
    Secret,
    /// Kubernetes `ConfigMap`
    ConfigMap,
}

impl DocumentKind {
    /// Kubernetes kind name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secret => "Secret",
            Self::ConfigMap => "ConfigMap",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finished key-value document.
///
/// Entries keep the order of the reference tokens they came from. Values
/// are redacted in `Debug` output.
#[derive(Debug, Clone)]
pub struct Document {
    /// Secret or ConfigMap
    pub kind: DocumentKind,
    /// Effective name after inheritance
    pub name: String,
    /// Effective namespace after inheritance
    pub namespace: String,
    /// Metadata merged in when values are placeholders
    pub patch: Option<PatchMetadata>,
    data: Vec<(String, SecureSecret)>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new(kind: DocumentKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            patch: None,
            data: Vec::new(),
        }
    }

    /// Append an entry. Returns `false` and leaves the document unchanged if
    /// `key` is already present.
    pub fn push(&mut self, key: impl Into<String>, value: SecureSecret) -> bool {
        let key = key.into();
        if self.contains_key(&key) {
            return false;
        }
        self.data.push((key, value));
        true
    }

    /// Whether an entry with `key` exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.iter().any(|(k, _)| k == key)
    }

    /// The value published under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.expose())
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.expose()))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
