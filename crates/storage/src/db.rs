//! sled database wrapper with serialization helpers.

use hybridledger_core::{AccountId, Position};
use sled::transaction::{ConflictableTransactionResult, TransactionError};
use sled::Db;
use std::path::Path;
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Index {index} of position {position} is already taken")]
    IndexTaken { position: String, index: u64 },

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Wrapper around sled database with serialization helpers.
pub struct Storage {
    db: Db,
}

impl Storage {
    /// Open a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open an in-memory database (for testing).
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Store a serializable value.
    pub fn put<K, V>(&self, key: K, value: &V) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: serde::Serialize,
    {
        let encoded = bincode::serialize(value)?;
        self.db.insert(key, encoded)?;
        Ok(())
    }

    /// Retrieve and deserialize a value.
    pub fn get<K, V>(&self, key: K) -> Result<Option<V>>
    where
        K: AsRef<[u8]>,
        V: serde::de::DeserializeOwned,
    {
        match self.db.get(key)? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Retrieve a value, returning error if not found.
    pub fn get_or_err<K, V>(&self, key: K) -> Result<V>
    where
        K: AsRef<[u8]> + std::fmt::Debug + Clone,
        V: serde::de::DeserializeOwned,
    {
        self.get(key.clone())?
            .ok_or_else(|| StorageError::NotFound(format!("{:?}", key)))
    }

    /// Deserialize every value whose key starts with `prefix`, in key order.
    pub fn scan<V>(&self, prefix: &[u8]) -> Result<Vec<V>>
    where
        V: serde::de::DeserializeOwned,
    {
        let mut values = Vec::new();
        for entry in self.db.scan_prefix(prefix) {
            let (_, bytes) = entry?;
            values.push(bincode::deserialize(&bytes)?);
        }
        Ok(values)
    }

    /// Apply `operations` atomically, but only while `guard` still holds
    /// `expected` (`None` meaning vacant).
    ///
    /// The check and the writes run in one sled transaction. Returns `false`
    /// and writes nothing when the guard no longer matches.
    pub fn batch_if(
        &self,
        guard: &[u8],
        expected: Option<&[u8]>,
        operations: &[BatchOp],
    ) -> Result<bool> {
        let applied = self
            .db
            .transaction(|tx| -> ConflictableTransactionResult<bool, StorageError> {
                if tx.get(guard)?.as_deref() != expected {
                    return Ok(false);
                }
                for op in operations {
                    match op {
                        BatchOp::Insert { key, value } => {
                            tx.insert(key.as_slice(), value.as_slice())?;
                        }
                        BatchOp::Remove { key } => {
                            tx.remove(key.as_slice())?;
                        }
                    }
                }
                Ok(true)
            });

        match applied {
            Ok(applied) => Ok(applied),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(StorageError::Database(e)),
        }
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    // =========================================================================
    // Key Construction Helpers
    // =========================================================================

    /// Prefix shared by every block of one position.
    /// Format: "ledger:" + position + 0x00
    pub fn ledger_prefix(position: &Position) -> Vec<u8> {
        let mut key = b"ledger:".to_vec();
        key.extend_from_slice(position.as_str().as_bytes());
        key.push(0);
        key
    }

    /// Primary key of a block.
    /// Format: "ledger:" + position + 0x00 + index (big-endian u64)
    ///
    /// Big-endian indexes make a prefix scan come back index-ascending.
    pub fn block_key(position: &Position, index: u64) -> Vec<u8> {
        let mut key = Self::ledger_prefix(position);
        key.extend_from_slice(&index.to_be_bytes());
        key
    }

    /// Secondary index from block id to primary key.
    /// Format: "blockid:{id}"
    pub fn block_id_key(id: &str) -> Vec<u8> {
        format!("blockid:{}", id).into_bytes()
    }

    /// Prefix of the owner index for one identity.
    /// Format: "owner:" + identity + 0x00
    pub fn owner_prefix(identity: &AccountId) -> Vec<u8> {
        let mut key = b"owner:".to_vec();
        key.extend_from_slice(identity.as_str().as_bytes());
        key.push(0);
        key
    }

    /// Owner index entry pointing at a block's primary key.
    /// Format: "owner:" + identity + 0x00 + id
    pub fn owner_key(identity: &AccountId, id: &str) -> Vec<u8> {
        let mut key = Self::owner_prefix(identity);
        key.extend_from_slice(id.as_bytes());
        key
    }

    /// Key of an account record.
    /// Format: "account:{identity}"
    pub fn account_key(identity: &AccountId) -> Vec<u8> {
        format!("account:{}", identity).into_bytes()
    }

    /// Prefix shared by every account record.
    pub fn account_prefix() -> &'static [u8] {
        b"account:"
    }
}

/// A write applied by [`Storage::batch_if`].
pub enum BatchOp {
    Insert { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
}
