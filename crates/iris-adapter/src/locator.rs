//! Servant locators: dynamic servant resolution for a whole category.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

use crate::current::Current;
use crate::servant::Servant;

/// Opaque state a locator hands out in `locate` and gets back in `finished`.
pub type Cookie = Box<dyn Any + Send + Sync>;

/// A servant produced by [`ServantLocator::locate`], with its cookie.
pub struct Located {
    /// The servant that will handle the request.
    pub servant: Arc<dyn Servant>,
    /// Passed back to [`ServantLocator::finished`] after the request.
    pub cookie: Option<Cookie>,
}

impl Located {
    /// A located servant without a cookie.
    pub fn new(servant: Arc<dyn Servant>) -> Self {
        Self {
            servant,
            cookie: None,
        }
    }

    /// Attach a cookie.
    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Any + Send + Sync) -> Self {
        self.cookie = Some(Box::new(cookie));
        self
    }
}

/// A failure raised by a locator capability.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LocatorError {
    message: String,
}

impl LocatorError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Resolves servants on demand for identities of one category.
///
/// Registered with [`crate::ServantRegistry::add_servant_locator`]; the empty
/// category is the catch-all consulted when no category-specific locator
/// exists.
pub trait ServantLocator: Send + Sync {
    /// Find or create a servant for the request. `Ok(None)` means the object
    /// does not exist.
    fn locate(&self, current: &Current) -> Result<Option<Located>, LocatorError>;

    /// Called once the request dispatched to a located servant has completed.
    fn finished(&self, current: &Current, servant: &Arc<dyn Servant>, cookie: Option<Cookie>);

    /// Called exactly once when the owning registry is destroyed.
    fn deactivate(&self, category: &str) -> Result<(), LocatorError>;
}
