//! # iris-adapter
//!
//! Servant bookkeeping for one object adapter:
//!
//! - [`ServantRegistry`]: `(identity, facet)` → servant table with a
//!   category → [`ServantLocator`] fallback table
//! - [`resolve`]: the lookup order a dispatcher follows for each request

#![deny(unsafe_code)]

pub mod current;
pub mod locator;
pub mod registry;
pub mod resolve;
pub mod servant;

pub use current::Current;
pub use locator::{Cookie, Located, LocatorError, ServantLocator};
pub use registry::ServantRegistry;
pub use resolve::{Resolution, resolve};
pub use servant::{FacetMap, Servant};
