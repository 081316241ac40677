//! Per-request context passed to servant locators.

use iris_core::{DEFAULT_FACET, Identity};

/// Target and operation of one incoming request, as decoded by the framing layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Current {
    /// Name of the adapter that received the request.
    pub adapter: String,
    /// Target object.
    pub identity: Identity,
    /// Target facet; empty for the default facet.
    pub facet: String,
    /// Operation name.
    pub operation: String,
}

impl Current {
    /// A request for the default facet of `identity`.
    pub fn new(adapter: impl Into<String>, identity: Identity, operation: impl Into<String>) -> Self {
        Self {
            adapter: adapter.into(),
            identity,
            facet: DEFAULT_FACET.to_string(),
            operation: operation.into(),
        }
    }

    /// Target `facet` instead of the default one.
    #[must_use]
    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = facet.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_default_facet() {
        let current = Current::new("Hello", Identity::named("printer"), "print");
        assert_eq!(current.facet, DEFAULT_FACET);
        assert_eq!(current.with_facet("admin").facet, "admin");
    }
}
