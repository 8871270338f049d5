//! Error types for the generator

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use azsecrets_secrets::SecretError;
use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;

/// Error type for secret generation
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The generator configuration is invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(azsecrets::config))]
    Configuration {
        /// Error message describing the configuration issue
        message: String,
    },

    /// The generator configuration is not valid YAML for this generator
    #[error("Failed to parse generator configuration")]
    #[diagnostic(
        code(azsecrets::parse),
        help("Expected fields: metadata, vault, secrets, onError, verbose")
    )]
    Parse {
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// Vault credentials are missing or unusable
    #[error("Invalid vault credentials")]
    #[diagnostic(
        code(azsecrets::credentials),
        help(
            "Set AZURE_TENANT_ID, AZURE_CLIENT_ID and AZURE_CLIENT_SECRET, or point \
             AZURE_AUTH_LOCATION at an auth file"
        )
    )]
    Credentials {
        /// The credential error reported by the vault client
        #[source]
        source: SecretError,
    },

    /// Resolving vault secrets failed and no error policy recovered it
    #[error("Error generating {generator} from vault '{vault}'")]
    #[diagnostic(
        code(azsecrets::resolution),
        help("Set onError.warn to substitute placeholder values instead of failing")
    )]
    Resolution {
        /// Name of the generator that failed
        generator: String,
        /// Vault that was queried
        vault: String,
        /// The first fetch error
        #[source]
        source: SecretError,
    },

    /// A value marked for base64 decoding could not be decoded
    #[error("Could not base64 decode '{value}' for key '{key}': {message}")]
    #[diagnostic(
        code(azsecrets::decode),
        help("Unset base64decode for this document or store the value base64-encoded")
    )]
    Decode {
        /// Output key the value was destined for
        key: String,
        /// The raw value as returned by the vault
        value: String,
        /// Why decoding failed
        message: String,
    },

    /// Two references in one document use the same output key
    #[error("Duplicate key '{key}' in document '{document}'")]
    #[diagnostic(code(azsecrets::duplicate_key))]
    DuplicateKey {
        /// Document name
        document: String,
        /// The repeated output key
        key: String,
    },

    /// Serializing generated manifests failed
    #[error("Serialization error: {message}")]
    #[diagnostic(code(azsecrets::serialization))]
    Serialization {
        /// Error message describing the serialization issue
        message: String,
    },

    /// I/O error
    #[error("I/O {operation} failed{}", path.as_ref().map_or(String::new(), |p| format!(": {}", p.display())))]
    #[diagnostic(
        code(azsecrets::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// Path that caused the error, if available
        path: Option<Box<Path>>,
        /// Operation that failed (e.g., "read", "write")
        operation: String,
    },
}

impl Error {
    /// Create a configuration error
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an I/O error with path context
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: impl AsRef<Path>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.as_ref().into()),
            operation: operation.into(),
        }
    }

    /// Create an I/O error without path context
    #[must_use]
    pub fn io_no_path(source: std::io::Error, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: None,
            operation: operation.into(),
        }
    }
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic as _;

    #[test]
    fn test_resolution_error_names_generator_and_vault() {
        let err = Error::Resolution {
            generator: "app-secrets".to_string(),
            vault: "prod-vault".to_string(),
            source: SecretError::NotFound {
                name: "DB".to_string(),
                vault: "prod-vault".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("app-secrets"));
        assert!(msg.contains("prod-vault"));
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("azsecrets::resolution")
        );
    }

    #[test]
    fn test_decode_error_includes_raw_value() {
        let err = Error::Decode {
            key: "password".to_string(),
            value: "not base64!".to_string(),
            message: "Invalid symbol 32".to_string(),
        };
        assert!(err.to_string().contains("'not base64!'"));
    }

    #[test]
    fn test_io_error_display() {
        let err = Error::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            "/tmp/generator.yaml",
            "read",
        );
        assert_eq!(err.to_string(), "I/O read failed: /tmp/generator.yaml");

        let err = Error::io_no_path(std::io::Error::other("closed"), "write");
        assert_eq!(err.to_string(), "I/O write failed");
    }
}
