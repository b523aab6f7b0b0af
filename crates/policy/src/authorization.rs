//! Mint authorization.
//!
//! Decides whether an account may append to a ledger. Rules are evaluated in
//! a fixed order and the first one that matches decides:
//!
//! 1. Admins are always allowed.
//! 2. Guests are always denied.
//! 3. An account still cooling down is denied.
//! 4. A ledger whose last block is Locked denies anyone below Moderator.
//! 5. The current owner, or anyone on an unowned ledger, is allowed.
//! 6. A takeover is allowed only if the account's net value is at least the
//!    ledger's value.

use hybridledger_core::{Account, BlockType, Ledger, Tier};
use std::fmt;
use thiserror::Error;

/// Why a mint was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    Admin,
    Owner,
    Unowned,
    Takeover,
}

impl fmt::Display for AllowReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AllowReason::Admin => "administrator",
            AllowReason::Owner => "ledger owner",
            AllowReason::Unowned => "ledger is unowned",
            AllowReason::Takeover => "net value covers ledger value",
        };
        f.write_str(text)
    }
}

/// Why a mint was denied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DenyReason {
    #[error("guest accounts cannot mint")]
    Guest,

    #[error("cooling down for another {remaining_ms} ms")]
    Cooldown { remaining_ms: i64 },

    #[error("ledger is locked")]
    Locked,

    #[error("net value {net_value:.6} is below ledger value {ledger_value:.6}")]
    Outvalued { net_value: f64, ledger_value: f64 },
}

/// Outcome of [`can_mint`].
#[derive(Debug, Clone, PartialEq)]
pub enum MintDecision {
    Allow(AllowReason),
    Deny(DenyReason),
}

impl MintDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, MintDecision::Allow(_))
    }

    /// Convert into a `Result`, keeping the denial reason as the error.
    pub fn into_result(self) -> Result<AllowReason, DenyReason> {
        match self {
            MintDecision::Allow(reason) => Ok(reason),
            MintDecision::Deny(reason) => Err(reason),
        }
    }
}

/// Account figures the policy needs but cannot derive from a snapshot.
///
/// Both figures come from the record store, so they are only asked for when
/// an earlier rule has not already decided.
pub trait Standing {
    type Error;

    /// Instant the decision is made at, in milliseconds.
    fn now_ms(&self) -> i64;

    /// Milliseconds left before `account` may mint again.
    fn cooldown_remaining(&self, account: &Account) -> Result<i64, Self::Error>;

    /// Value of everything `account` owns minus what it has spent.
    fn net_value(&self, account: &Account) -> Result<f64, Self::Error>;
}

/// Decide whether `account` may mint on `ledger`.
pub fn can_mint<S: Standing>(
    ledger: &Ledger,
    account: &Account,
    standing: &S,
) -> Result<MintDecision, S::Error> {
    match account.tier {
        Tier::Admin => return Ok(MintDecision::Allow(AllowReason::Admin)),
        Tier::Guest => return Ok(MintDecision::Deny(DenyReason::Guest)),
        Tier::User | Tier::Moderator => {}
    }

    let remaining_ms = standing.cooldown_remaining(account)?;
    if remaining_ms > 0 {
        return Ok(MintDecision::Deny(DenyReason::Cooldown { remaining_ms }));
    }

    if ledger.last_block().block_type == BlockType::Locked && account.tier < Tier::Moderator {
        return Ok(MintDecision::Deny(DenyReason::Locked));
    }

    let ownership = ledger.ownership();
    if ownership.is_unowned() {
        return Ok(MintDecision::Allow(AllowReason::Unowned));
    }
    if ownership.is_owned_by(&account.identity) {
        return Ok(MintDecision::Allow(AllowReason::Owner));
    }

    let ledger_value = ledger.value_at(standing.now_ms());
    let net_value = standing.net_value(account)?;
    if net_value >= ledger_value {
        Ok(MintDecision::Allow(AllowReason::Takeover))
    } else {
        Ok(MintDecision::Deny(DenyReason::Outvalued {
            net_value,
            ledger_value,
        }))
    }
}
