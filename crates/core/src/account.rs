//! Accounts, tiers and ledger ownership.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Stored ownership value meaning "nobody owns this ledger".
pub const UNOWNED: &str = "0";

/// Colour used for unowned cells.
const UNOWNED_COLOR: &str = "#2d2d2d";

/// Errors raised while decoding account fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("unknown account tier: {0}")]
    UnknownTier(u8),

    #[error("unknown account tier name: {0}")]
    UnknownTierName(String),
}

/// Account privilege level.
///
/// Ordering follows privilege: `Guest < User < Moderator < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Tier {
    Guest = 0,
    User = 1,
    Moderator = 2,
    Admin = 3,
}

impl Tier {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable tier name.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Guest => "Guest",
            Tier::User => "User",
            Tier::Moderator => "Moderator",
            Tier::Admin => "Administrator",
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = AccountError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Tier::Guest),
            1 => Ok(Tier::User),
            2 => Ok(Tier::Moderator),
            3 => Ok(Tier::Admin),
            other => Err(AccountError::UnknownTier(other)),
        }
    }
}

impl FromStr for Tier {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "guest" => Ok(Tier::Guest),
            "user" => Ok(Tier::User),
            "moderator" | "mod" => Ok(Tier::Moderator),
            "admin" | "administrator" => Ok(Tier::Admin),
            _ => Err(AccountError::UnknownTierName(s.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unique account identity (a UUID string for registered accounts).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Wrap an existing identity.
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Generate a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two display colours derived from the second to fourth UUID groups.
    ///
    /// Identities that are not hyphenated UUIDs get the unowned colour.
    pub fn colors(&self) -> [String; 2] {
        let groups: Vec<&str> = self.0.split('-').collect();
        let nibbles = |group: usize, range: std::ops::Range<usize>| {
            groups.get(group).and_then(|g| g.get(range))
        };
        let parts = [
            nibbles(1, 0..2),
            nibbles(1, 2..4),
            nibbles(2, 0..2),
            nibbles(2, 2..4),
            nibbles(3, 0..2),
            nibbles(3, 2..4),
        ];
        match parts {
            [Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)] => {
                [format!("#{}{}{}", a, b, c), format!("#{}{}{}", d, e, f)]
            }
            _ => [UNOWNED_COLOR.to_string(), UNOWNED_COLOR.to_string()],
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(identity: &str) -> Self {
        Self::new(identity)
    }
}

/// Who owns a block or ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// Stored as the sentinel `"0"`.
    Unowned,
    Account(AccountId),
}

impl Ownership {
    /// Parse the stored form; `"0"` is the unowned sentinel.
    pub fn parse(value: &str) -> Self {
        if value == UNOWNED {
            Ownership::Unowned
        } else {
            Ownership::Account(AccountId::new(value))
        }
    }

    /// The stored form.
    pub fn as_str(&self) -> &str {
        match self {
            Ownership::Unowned => UNOWNED,
            Ownership::Account(id) => id.as_str(),
        }
    }

    pub fn is_unowned(&self) -> bool {
        matches!(self, Ownership::Unowned)
    }

    pub fn account(&self) -> Option<&AccountId> {
        match self {
            Ownership::Unowned => None,
            Ownership::Account(id) => Some(id),
        }
    }

    pub fn is_owned_by(&self, identity: &AccountId) -> bool {
        self.account() == Some(identity)
    }

    /// Display colours of the owner; the unowned colour twice when unowned.
    pub fn colors(&self) -> [String; 2] {
        match self {
            Ownership::Unowned => [UNOWNED_COLOR.to_string(), UNOWNED_COLOR.to_string()],
            Ownership::Account(id) => id.colors(),
        }
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AccountId> for Ownership {
    fn from(id: AccountId) -> Self {
        Ownership::Account(id)
    }
}

/// An account as seen by the authorization logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub identity: AccountId,
    pub display_name: String,
    pub tier: Tier,
    /// Creation instant in milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl Account {
    /// Create a new account with a generated identity.
    pub fn new(display_name: impl Into<String>, tier: Tier) -> Self {
        Self {
            identity: AccountId::generate(),
            display_name: display_name.into(),
            tier,
            created_at: crate::block::current_timestamp(),
        }
    }

    /// Create an account with a known identity.
    pub fn with_identity(identity: AccountId, display_name: impl Into<String>, tier: Tier) -> Self {
        Self {
            identity,
            display_name: display_name.into(),
            tier,
            created_at: crate::block::current_timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.tier == Tier::Admin
    }

    pub fn is_guest(&self) -> bool {
        self.tier == Tier::Guest
    }
}
