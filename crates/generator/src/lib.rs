//! Kustomize secret generator backed by Azure Key Vault
//!
//! A [`Generator`] is configured once from a YAML generator resource and then
//! produces Kubernetes Secrets and ConfigMaps on every
//! [`generate`](Generator::generate) call:
//!
//! 1. [`collect_secret_names`] reduces every `alias=vaultName` token to the
//!    sorted set of unique vault names
//! 2. the names are fetched through the selected [`Backend`], concurrently
//!    unless sequential mode was requested
//! 3. on failure, the `onError` policy either aborts, drops all output, or
//!    substitutes placeholder values ([`recover`])
//! 4. [`build_document`] projects the values into one [`Document`] per spec
//!
//! ```ignore
//! use azsecrets_generator::{Backend, Generator, render_documents};
//!
//! let generator = Generator::configure(&yaml, Backend::from_env())?;
//! let documents = generator.generate().await?;
//! print!("{}", render_documents(&documents)?);
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod document;
mod error;
pub mod generator;
pub mod manifest;
pub mod names;
pub mod policy;
pub mod reference;

pub use backend::Backend;
pub use builder::build_document;
pub use config::{DocumentSpec, GeneratorConfig, ObjectMeta, OnErrorConfig, PatchMetadata};
pub use document::{Document, DocumentKind};
pub use error::{Error, Result};
pub use generator::Generator;
pub use manifest::{render_document, render_documents};
pub use names::collect_secret_names;
pub use policy::{Recovery, placeholder_value, recover};
pub use reference::SecretReference;

// Resolution types callers need alongside the generator
pub use azsecrets_secrets::{FixtureClient, OfflineConfig, ResolutionMode};
