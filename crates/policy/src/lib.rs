//! Minting policy for hybridledger.
//!
//! This crate holds the rules that sit between a loaded ledger and a new
//! block:
//! - **Authorization**: who may append to which ledger
//! - **Cooldown**: how long an account waits between mints
//! - **Difficulty**: how hard each block kind is to mine
//!
//! Everything here is pure. Figures that need the record store reach the
//! authorization rules through the [`Standing`] trait.
//!
//! # Example
//!
//! ```rust
//! use hybridledger_core::{Account, Block, Ledger, Position, Tier};
//! use hybridledger_policy::{can_mint, Standing};
//!
//! struct Fresh;
//!
//! impl Standing for Fresh {
//!     type Error = std::convert::Infallible;
//!     fn now_ms(&self) -> i64 { 0 }
//!     fn cooldown_remaining(&self, _: &Account) -> Result<i64, Self::Error> { Ok(0) }
//!     fn net_value(&self, _: &Account) -> Result<f64, Self::Error> { Ok(0.0) }
//! }
//!
//! let mut placeholder = Block::empty(Position::from("0,0"));
//! placeholder.mine(1);
//! let ledger = Ledger::unclaimed(placeholder);
//!
//! let alice = Account::new("alice", Tier::User);
//! assert!(can_mint(&ledger, &alice, &Fresh).unwrap().is_allowed());
//! ```

pub mod authorization;
pub mod cooldown;
pub mod difficulty;

// Re-export commonly used types
pub use authorization::{can_mint, AllowReason, DenyReason, MintDecision, Standing};
pub use cooldown::{CooldownConfig, MintHistory, DEFAULT_BASE_INTERVAL_MS};
pub use difficulty::DifficultyTable;
