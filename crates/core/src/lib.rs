//! Core primitives for hybridledger.
//!
//! This crate provides the types every other crate builds on:
//! - Blake3 digests and the field-ordered block hash
//! - Positions and realms
//! - Accounts, tiers and ownership
//! - Blocks, proof-of-work minting and block value
//! - Ledger snapshots with the pristine check and value aggregation

pub mod account;
pub mod block;
pub mod hash;
pub mod ledger;
pub mod position;

// Re-export commonly used types at the crate root
pub use account::{Account, AccountError, AccountId, Ownership, Tier, UNOWNED};
pub use block::{current_timestamp, parse_amount, Block, BlockError, BlockType};
pub use hash::{hash, hash_fields, pick, Hash, H256};
pub use ledger::Ledger;
pub use position::{Position, DEFAULT_REALM};
