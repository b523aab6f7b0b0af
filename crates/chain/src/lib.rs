//! Ledger orchestration for hybridledger.
//!
//! This crate ties the block model, the record store and the minting policy
//! together:
//! - **Loading**: resolve a position to a ledger, synthesizing a placeholder
//! - **Minting**: authorize, mine and commit new blocks
//! - **Standing**: account cooldown and net value from stored blocks
//! - **Repair**: relink and re-mine a ledger after an out-of-band edit
//!
//! # Example
//!
//! ```rust,no_run
//! use hybridledger_chain::{ChainConfig, LedgerBook};
//! use hybridledger_core::{Account, BlockType, Position, Tier};
//! use hybridledger_storage::{BlockStore, Storage};
//!
//! let storage = Storage::open("./ledger_data").unwrap();
//! let store = BlockStore::new(&storage);
//! let book = LedgerBook::new(&store, ChainConfig::default());
//!
//! let alice = Account::new("alice", Tier::User);
//! let mut ledger = book.load_ledger(&Position::from("0,0")).unwrap();
//! book.mint(&mut ledger, &alice, BlockType::Minted, "hello").unwrap();
//!
//! assert!(ledger.check_pristine());
//! println!("worth {}", ledger.value());
//! ```

pub mod book;
pub mod config;
mod standing;

// Re-export commonly used types
pub use book::{ChainError, LedgerBook, Result};
pub use config::ChainConfig;
