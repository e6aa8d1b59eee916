//! Namespace patterns for routing symbol lookups.

use embench_common::SymbolName;
use std::fmt;

/// A dot-separated namespace prefix, e.g. `embench.support` or `app.core`.
///
/// A pattern matches a symbol name when the name equals the prefix or
/// lives below it (`app.core` matches `app.core.home` but not
/// `app.corelib.x`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern(String);

impl NamePattern {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this pattern covers the given symbol name.
    pub fn matches(&self, name: &SymbolName) -> bool {
        let name = name.as_str();
        if name == self.0 {
            return true;
        }
        name.len() > self.0.len()
            && name.starts_with(&self.0)
            && name.as_bytes()[self.0.len()] == b'.'
    }
}

impl From<&str> for NamePattern {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.*", self.0)
    }
}
