//! Registration errors for servants and servant locators.
//!
//! Both variants are caller-recoverable: the caller picked a colliding or
//! missing key. Use of a registry after it was destroyed is not represented
//! here; that is a programming error and panics at the call site.

use std::fmt;

use thiserror::Error;

use crate::identity::{Identity, escape_facet};

/// The kind of object a registration error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A servant registered under `(identity, facet)`.
    Servant,
    /// A servant locator registered under a category.
    ServantLocator,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Servant => write!(f, "servant"),
            Self::ServantLocator => write!(f, "servant locator"),
        }
    }
}

/// Failure to add or remove a registry entry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The key is already taken.
    #[error("{kind} `{id}` is already registered")]
    AlreadyRegistered {
        /// What kind of object collided.
        kind: ObjectKind,
        /// Printable key of the colliding entry.
        id: String,
    },

    /// The key has no registration.
    #[error("{kind} `{id}` is not registered")]
    NotRegistered {
        /// What kind of object was looked up.
        kind: ObjectKind,
        /// Printable key of the missing entry.
        id: String,
    },
}

impl RegistryError {
    /// A servant is already registered under `(identity, facet)`.
    pub fn servant_exists(identity: &Identity, facet: &str) -> Self {
        Self::AlreadyRegistered {
            kind: ObjectKind::Servant,
            id: servant_id(identity, Some(facet)),
        }
    }

    /// No servant is registered under `(identity, facet)`.
    pub fn servant_missing(identity: &Identity, facet: Option<&str>) -> Self {
        Self::NotRegistered {
            kind: ObjectKind::Servant,
            id: servant_id(identity, facet),
        }
    }

    /// A locator is already registered for `category`.
    pub fn locator_exists(category: &str) -> Self {
        Self::AlreadyRegistered {
            kind: ObjectKind::ServantLocator,
            id: escape_facet(category),
        }
    }

    /// The kind of object this error refers to.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::AlreadyRegistered { kind, .. } | Self::NotRegistered { kind, .. } => *kind,
        }
    }

    /// Printable key of the entry this error refers to.
    pub fn id(&self) -> &str {
        match self {
            Self::AlreadyRegistered { id, .. } | Self::NotRegistered { id, .. } => id,
        }
    }
}

/// `identity`, or `identity -f facet` for a non-default facet.
fn servant_id(identity: &Identity, facet: Option<&str>) -> String {
    match facet {
        Some(facet) if !facet.is_empty() => format!("{identity} -f {}", escape_facet(facet)),
        _ => identity.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servant_exists_default_facet() {
        let err = RegistryError::servant_exists(&Identity::new("obj", "cat"), "");
        assert_eq!(err.kind(), ObjectKind::Servant);
        assert_eq!(err.id(), "cat/obj");
        assert_eq!(err.to_string(), "servant `cat/obj` is already registered");
    }

    #[test]
    fn servant_missing_with_facet() {
        let err = RegistryError::servant_missing(&Identity::named("obj"), Some("admin"));
        assert_eq!(err.id(), "obj -f admin");
        assert_eq!(err.to_string(), "servant `obj -f admin` is not registered");
    }

    #[test]
    fn servant_missing_without_facet() {
        let err = RegistryError::servant_missing(&Identity::named("obj"), None);
        assert_eq!(err.id(), "obj");
    }

    #[test]
    fn facet_is_escaped() {
        let err = RegistryError::servant_exists(&Identity::named("obj"), "a\tb");
        assert_eq!(err.id(), "obj -f a\\tb");
    }

    #[test]
    fn locator_exists_default_category() {
        let err = RegistryError::locator_exists("");
        assert_eq!(err.kind(), ObjectKind::ServantLocator);
        assert_eq!(err.to_string(), "servant locator `` is already registered");
    }

    #[test]
    fn object_kind_display() {
        assert_eq!(ObjectKind::Servant.to_string(), "servant");
        assert_eq!(ObjectKind::ServantLocator.to_string(), "servant locator");
    }
}
