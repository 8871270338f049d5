//! Vault client implementations
//!
//! This module provides built-in clients that never touch the network:
//!
//! - [`OfflineClient`] - Random values for working without vault access
//! - [`FixtureClient`] - Deterministic values for tests
//!
//! The Key Vault client is available via a separate crate:
//!
//! - `azure` - Azure Key Vault (azsecrets-azure crate)

mod fixture;
mod offline;

pub use fixture::FixtureClient;
pub use offline::{OFFLINE_MODE_ENV, OFFLINE_WARN_SECONDS_ENV, OfflineClient, OfflineConfig};
