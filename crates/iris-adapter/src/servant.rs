//! Servants: the application objects that handle invocations.

use std::collections::HashMap;
use std::sync::Arc;

/// An application object registered with an adapter.
///
/// The registry stores servants opaquely and never calls into them; request
/// execution belongs to the dispatcher.
pub trait Servant: Send + Sync {
    /// Type id of the most-derived interface, e.g. `::Demo::Printer`.
    fn interface_id(&self) -> &str;
}

/// All servants registered under one identity, keyed by facet.
pub type FacetMap = HashMap<String, Arc<dyn Servant>>;
