//! Persistent storage layer for hybridledger.
//!
//! This crate provides the record store the ledger logic consumes:
//! - Block records, addressed by position and index
//! - Owner and block-id secondary indexes
//! - Account records
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Ledger Layer                          │
//! │          (load, commit, repair, authorization)           │
//! └────────────────────────┬────────────────────────────────┘
//!                          │ RecordStore
//! ┌────────────────────────▼────────────────────────────────┐
//! │                   Storage Layer                          │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐  │
//! │  │ BlockStore  │  │AccountStore │  │ Storage (DB)    │  │
//! │  │  - Position │  │  - Identity │  │  - sled wrapper │  │
//! │  │  - Owner    │  │  - Tier     │  │  - serialization│  │
//! │  │  - Block id │  │             │  │  - key helpers  │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────┘  │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//! ┌────────────────────────▼────────────────────────────────┐
//! │                    sled Database                         │
//! │              (Embedded Key-Value Store)                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use hybridledger_storage::{BlockRecord, BlockStore, RecordStore, Storage};
//! use hybridledger_core::{Block, Position};
//!
//! let storage = Storage::open("./ledger_data").unwrap();
//! let store = BlockStore::new(&storage);
//!
//! let mut placeholder = Block::empty(Position::from("0,0"));
//! placeholder.mine(1);
//! store.create(&BlockRecord::from(&placeholder)).unwrap();
//!
//! let records = store.find_by_position(&Position::from("0,0")).unwrap();
//! assert_eq!(records.len(), 1);
//! ```

pub mod accounts;
pub mod db;
pub mod records;

// Re-export commonly used types
pub use accounts::AccountStore;
pub use db::{BatchOp, Result, Storage, StorageError};
pub use records::{BlockPatch, BlockRecord, BlockStore, RecordStore};
