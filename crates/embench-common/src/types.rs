//! Core identifier types used throughout the harness.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a symbol resolvable through a resolution domain.
///
/// Symbol names are dot-separated, namespace-first, e.g. `app.core.home`
/// or `embench.support.clock`.
///
/// # Example
/// ```
/// use embench_common::SymbolName;
///
/// let name = SymbolName::from("app.core.home");
/// assert_eq!(name.as_str(), "app.core.home");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolName(String);

impl SymbolName {
    /// Creates a new SymbolName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the symbol name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SymbolName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SymbolName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SymbolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a top-level item inside the embedded application (a job,
/// project, or other named record the application manages).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemName(String);

impl ItemName {
    /// Creates a new ItemName from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the item name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
