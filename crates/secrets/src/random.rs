//! Random stand-in values

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use rand::distributions::Alphanumeric;

/// Generate `len` random characters from `[0-9a-zA-Z]`.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Base64-encode `prefix` followed by `len` random alphanumeric characters.
#[must_use]
pub fn random_base64(prefix: &str, len: usize) -> String {
    STANDARD.encode(format!("{prefix}{}", random_alphanumeric(len)))
}
