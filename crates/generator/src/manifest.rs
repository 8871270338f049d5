//! Kubernetes manifest rendering
//!
//! Documents become `v1` Secrets (type `Opaque`, values base64-encoded) or
//! ConfigMaps (plain values). Keys are sorted and documents are separated by
//! `---`, the layout kustomize expects from an exec generator.

use crate::document::{Document, DocumentKind};
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    api_version: &'static str,
    data: BTreeMap<&'a str, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    immutable: Option<bool>,
    kind: &'static str,
    metadata: Metadata<'a>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    secret_type: Option<&'static str>,
}

#[derive(Serialize)]
struct Metadata<'a> {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    annotations: BTreeMap<&'a str, &'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: BTreeMap<&'a str, &'a str>,
    name: &'a str,
    namespace: &'a str,
}

impl<'a> Manifest<'a> {
    fn from_document(document: &'a Document) -> Self {
        let (data, secret_type) = match document.kind {
            DocumentKind::Secret => (
                document
                    .entries()
                    .map(|(k, v)| (k, STANDARD.encode(v)))
                    .collect(),
                Some("Opaque"),
            ),
            DocumentKind::ConfigMap => (
                document
                    .entries()
                    .map(|(k, v)| (k, v.to_string()))
                    .collect(),
                None,
            ),
        };

        let patch = document.patch.as_ref();
        Self {
            api_version: "v1",
            data,
            immutable: patch.filter(|p| p.immutable).map(|_| true),
            kind: document.kind.as_str(),
            metadata: Metadata {
                annotations: patch.map(|p| borrowed(&p.annotations)).unwrap_or_default(),
                labels: patch.map(|p| borrowed(&p.labels)).unwrap_or_default(),
                name: &document.name,
                namespace: &document.namespace,
            },
            secret_type,
        }
    }
}

fn borrowed(map: &BTreeMap<String, String>) -> BTreeMap<&str, &str> {
    map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Render one document as a YAML manifest.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if YAML serialization fails.
pub fn render_document(document: &Document) -> Result<String> {
    serde_yaml::to_string(&Manifest::from_document(document)).map_err(|e| Error::Serialization {
        message: e.to_string(),
    })
}

/// Render documents as a multi-document YAML stream.
///
/// An empty slice renders as an empty string.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if YAML serialization fails.
pub fn render_documents(documents: &[Document]) -> Result<String> {
    let rendered = documents
        .iter()
        .map(render_document)
        .collect::<Result<Vec<_>>>()?;
    Ok(rendered.join("---\n"))
}
