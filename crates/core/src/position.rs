//! Ledger positions on the unbounded grid.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Realm assumed when a position carries no `realm:` prefix.
pub const DEFAULT_REALM: &str = "public";

/// Key identifying one ledger: `"x,y"` or `"realm:x,y"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    /// Wrap a raw position key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Position for grid coordinates in the public realm.
    pub fn at(x: i64, y: i64) -> Self {
        Self(format!("{},{}", x, y))
    }

    /// Position for grid coordinates inside a named realm.
    ///
    /// The public realm is written without a prefix.
    pub fn in_realm(realm: &str, x: i64, y: i64) -> Self {
        if realm == DEFAULT_REALM {
            Self::at(x, y)
        } else {
            Self(format!("{}:{},{}", realm, x, y))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring before the first `:`, or `"public"`.
    pub fn realm(&self) -> &str {
        match self.0.split_once(':') {
            Some((realm, _)) => realm,
            None => DEFAULT_REALM,
        }
    }

    /// The coordinate part with any realm prefix removed.
    pub fn coordinate(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, coordinate)) => coordinate,
            None => &self.0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Position {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for Position {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for Position {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
