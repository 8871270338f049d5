//! `alias=vaultName` reference tokens

/// One entry of a document's `keys` list.
///
/// The token `FOOKey=FOO` publishes the vault secret `FOO` under the output
/// key `FOOKey`. Parsing splits on the first `=`, so the vault name may not
/// contain one but everything after it belongs to the vault name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretReference<'a> {
    /// Key the value is published under
    pub alias: &'a str,
    /// Name of the secret in the vault
    pub vault_name: &'a str,
}

impl<'a> SecretReference<'a> {
    /// Parse a token, returning `None` if it is malformed.
    ///
    /// A token is malformed when it has no `=` or either side is empty.
    /// Malformed tokens are skipped everywhere; they never cause a fetch.
    #[must_use]
    pub fn parse(token: &'a str) -> Option<Self> {
        let (alias, vault_name) = token.split_once('=')?;
        if alias.is_empty() || vault_name.is_empty() {
            return None;
        }
        Some(Self { alias, vault_name })
    }
}
