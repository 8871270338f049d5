//! Unique vault names needed by a set of documents

use crate::config::DocumentSpec;
use crate::reference::SecretReference;
use std::collections::BTreeSet;

/// Collect the sorted, deduplicated vault names referenced by `specs`.
///
/// This is the fetch list: each name is fetched once no matter how many
/// documents or aliases refer to it. Malformed tokens contribute nothing.
#[must_use]
pub fn collect_secret_names(specs: &[DocumentSpec]) -> Vec<String> {
    specs
        .iter()
        .flat_map(|spec| spec.keys.iter())
        .filter_map(|token| SecretReference::parse(token))
        .map(|reference| reference.vault_name)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
