//! # iris-core
//!
//! Shared vocabulary for the iris object-adapter crates:
//!
//! - **Identities**: [`Identity`] `(name, category)` keys and facet formatting
//! - **Errors**: [`RegistryError`] for servant and locator registration
//! - **Logging**: [`logging::init_subscriber`] and in-memory log capture for tests

#![deny(unsafe_code)]

pub mod errors;
pub mod identity;
pub mod logging;

pub use errors::{ObjectKind, RegistryError};
pub use identity::{DEFAULT_FACET, Identity, IdentityParseError, escape_facet};
