//! Recovery from vault fetch failures

use crate::config::{GeneratorConfig, PatchMetadata};
use crate::{Error, Result};
use azsecrets_secrets::{ResolvedValues, SecretError, SecureSecret, random_base64};

const PLACEHOLDER_PREFIX: &str = "ERROR_";
const PLACEHOLDER_RANDOM_LEN: usize = 32;

/// How a failed resolution continues.
#[derive(Debug)]
pub enum Recovery {
    /// Emit no documents and report success
    Exclude,
    /// Build documents from placeholder values and tag them with `patch`
    Fallback {
        /// One placeholder per requested name
        values: ResolvedValues,
        /// Metadata merged into every document
        patch: PatchMetadata,
    },
}

/// Decide what happens after resolving `names` failed with `error`.
///
/// # Errors
///
/// Returns [`Error::Resolution`] unless `onError.warn` is set.
pub fn recover(config: &GeneratorConfig, names: &[String], error: SecretError) -> Result<Recovery> {
    let Some(policy) = config.recovery_policy() else {
        return Err(Error::Resolution {
            generator: config.metadata.name.clone(),
            vault: config.vault.clone(),
            source: error,
        });
    };

    tracing::warn!(
        generator = %config.metadata.name,
        vault = %config.vault,
        error = %error,
        exclude = policy.exclude,
        "Error generating secrets"
    );

    if policy.exclude {
        return Ok(Recovery::Exclude);
    }

    let values = names
        .iter()
        .map(|name| (name.clone(), SecureSecret::new(placeholder_value())))
        .collect();
    Ok(Recovery::Fallback {
        values,
        patch: policy.patch_metadata.clone(),
    })
}

/// A fresh placeholder: base64 of `ERROR_` and 32 random alphanumerics.
///
/// The random tail keeps a placeholder from ever being a guessable password.
#[must_use]
pub fn placeholder_value() -> String {
    random_base64(PLACEHOLDER_PREFIX, PLACEHOLDER_RANDOM_LEN)
}
