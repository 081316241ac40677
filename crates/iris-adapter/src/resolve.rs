//! Request target resolution for dispatchers.
//!
//! Order: the servant registered under `(identity, facet)`; otherwise the
//! locator of the identity's category, falling back to the catch-all `""`
//! locator. Only the first locator found is asked.

use std::fmt;
use std::sync::Arc;

use crate::current::Current;
use crate::locator::{Cookie, Located, LocatorError, ServantLocator};
use crate::registry::ServantRegistry;
use crate::servant::Servant;

/// Where a request goes.
pub enum Resolution {
    /// A statically registered servant.
    Servant(Arc<dyn Servant>),
    /// A servant produced by a locator; call [`Resolution::finish`] afterwards.
    Located {
        /// The servant that will handle the request.
        servant: Arc<dyn Servant>,
        /// Handed back to the locator in `finished`.
        cookie: Option<Cookie>,
        /// The locator that produced the servant.
        locator: Arc<dyn ServantLocator>,
    },
    /// The identity has servants, but not for the requested facet.
    FacetNotFound,
    /// Nothing handles the identity.
    ObjectNotFound,
}

impl Resolution {
    /// The servant to dispatch to, if one was found.
    pub fn servant(&self) -> Option<&Arc<dyn Servant>> {
        match self {
            Self::Servant(servant) | Self::Located { servant, .. } => Some(servant),
            Self::FacetNotFound | Self::ObjectNotFound => None,
        }
    }

    /// Whether a servant was found.
    pub fn is_found(&self) -> bool {
        self.servant().is_some()
    }

    /// Complete the request: for located servants, return the cookie to the
    /// locator through `finished`. No-op otherwise.
    pub fn finish(self, current: &Current) {
        if let Self::Located {
            servant,
            cookie,
            locator,
        } = self
        {
            locator.finished(current, &servant, cookie);
        }
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Servant(servant) => f.debug_tuple("Servant").field(&servant.interface_id()).finish(),
            Self::Located { servant, cookie, .. } => f
                .debug_struct("Located")
                .field("servant", &servant.interface_id())
                .field("cookie", &cookie.is_some())
                .finish_non_exhaustive(),
            Self::FacetNotFound => f.write_str("FacetNotFound"),
            Self::ObjectNotFound => f.write_str("ObjectNotFound"),
        }
    }
}

/// Resolve the target of `current` against `registry`.
///
/// A failing `locate` is returned as is; a locator that finds nothing yields
/// one of the not-found variants.
pub fn resolve(registry: &ServantRegistry, current: &Current) -> Result<Resolution, LocatorError> {
    if let Some(servant) = registry.find_servant(&current.identity, &current.facet) {
        return Ok(Resolution::Servant(servant));
    }

    let category = current.identity.category.as_str();
    let locator = registry.find_servant_locator(category).or_else(|| {
        if category.is_empty() {
            None
        } else {
            registry.find_servant_locator("")
        }
    });

    if let Some(locator) = locator {
        if let Some(Located { servant, cookie }) = locator.locate(current)? {
            return Ok(Resolution::Located {
                servant,
                cookie,
                locator,
            });
        }
    }

    if registry.has_servant(&current.identity) {
        Ok(Resolution::FacetNotFound)
    } else {
        Ok(Resolution::ObjectNotFound)
    }
}
