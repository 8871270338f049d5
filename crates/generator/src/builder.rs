//! Projection of resolved values into documents

use crate::config::{DocumentSpec, ObjectMeta, PatchMetadata};
use crate::document::Document;
use crate::reference::SecretReference;
use crate::{Error, Result};
use azsecrets_secrets::{ResolvedValues, SecureSecret};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Build one document from `spec` and the resolved values.
///
/// Name and namespace fall back to `defaults` when the spec leaves them
/// empty. Tokens are processed in order: malformed tokens and tokens whose
/// vault name was not resolved are skipped, every other token becomes one
/// entry keyed by its alias.
///
/// # Errors
///
/// - [`Error::Configuration`] if name or namespace is still empty after inheritance
/// - [`Error::Decode`] if `base64decode` is set and a value is not base64 of UTF-8 text
/// - [`Error::DuplicateKey`] if two tokens share an alias
pub fn build_document(
    spec: &DocumentSpec,
    defaults: &ObjectMeta,
    values: &ResolvedValues,
    patch: Option<&PatchMetadata>,
) -> Result<Document> {
    let name = inherit(&spec.name, &defaults.name);
    let namespace = inherit(&spec.namespace, &defaults.namespace);
    if name.is_empty() {
        return Err(Error::configuration(format!(
            "Document is missing name: {spec:?}"
        )));
    }
    if namespace.is_empty() {
        return Err(Error::configuration(format!(
            "Document is missing namespace: {spec:?}"
        )));
    }

    let mut document = Document::new(spec.kind(), name, namespace);
    document.patch = patch.cloned();

    for reference in spec.keys.iter().filter_map(|t| SecretReference::parse(t)) {
        let Some(value) = values.get(reference.vault_name) else {
            continue;
        };
        let value = if spec.base64decode {
            decode(reference.alias, value.expose())?
        } else {
            value.clone()
        };
        if !document.push(reference.alias, value) {
            return Err(Error::DuplicateKey {
                document: name.to_string(),
                key: reference.alias.to_string(),
            });
        }
    }

    tracing::debug!(
        kind = %document.kind,
        name = %document.name,
        namespace = %document.namespace,
        entries = document.len(),
        "Built document"
    );
    Ok(document)
}

fn inherit<'a>(own: &'a str, default: &'a str) -> &'a str {
    if own.is_empty() { default } else { own }
}

fn decode(key: &str, raw: &str) -> Result<SecureSecret> {
    let failed = |message: String| Error::Decode {
        key: key.to_string(),
        value: raw.to_string(),
        message,
    };
    let bytes = STANDARD.decode(raw).map_err(|e| failed(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| failed(e.to_string()))?;
    Ok(SecureSecret::new(text))
}
