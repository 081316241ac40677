//! Object identities and facet helpers.
//!
//! An [`Identity`] is the stable `(name, category)` key of a remotely
//! invokable object. Its textual form is `category/name`, or just `name`
//! when the category is empty. Slashes and backslashes inside either part
//! are escaped with a backslash so the form round-trips through
//! [`str::parse`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The default facet of an identity.
pub const DEFAULT_FACET: &str = "";

/// Stable `(name, category)` key of an object.
///
/// Equality and ordering are structural over both fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Object name, unique within its category.
    pub name: String,
    /// Category used to select a servant locator on lookup misses.
    #[serde(default)]
    pub category: String,
}

impl Identity {
    /// Create an identity in the given category.
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }

    /// Create an identity in the default (empty) category.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.category.is_empty() {
            write_escaped(f, &self.category)?;
            f.write_str("/")?;
        }
        write_escaped(f, &self.name)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, part: &str) -> fmt::Result {
    for c in part.chars() {
        if c == '/' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

/// Failure to parse the textual form of an [`Identity`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IdentityParseError {
    /// The name part is empty.
    #[error("identity `{0}` has an empty name")]
    EmptyName(String),
    /// More than one unescaped `/` separator.
    #[error("identity `{0}` has more than one unescaped `/`")]
    TooManySeparators(String),
    /// A trailing backslash with nothing to escape.
    #[error("identity `{0}` ends with a dangling escape")]
    DanglingEscape(String),
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut category: Option<String> = None;
        let mut current = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(IdentityParseError::DanglingEscape(s.to_owned())),
                },
                '/' => {
                    if category.is_some() {
                        return Err(IdentityParseError::TooManySeparators(s.to_owned()));
                    }
                    category = Some(std::mem::take(&mut current));
                }
                other => current.push(other),
            }
        }

        if current.is_empty() {
            return Err(IdentityParseError::EmptyName(s.to_owned()));
        }
        Ok(Self {
            name: current,
            category: category.unwrap_or_default(),
        })
    }
}

/// Render a facet for diagnostics, escaping quotes and non-printable characters.
pub fn escape_facet(facet: &str) -> String {
    facet.escape_debug().to_string()
}
