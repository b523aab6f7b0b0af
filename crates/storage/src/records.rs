//! Block records and the record store that holds them.

use crate::db::{BatchOp, Result, Storage, StorageError};
use hybridledger_core::{AccountId, Block, BlockType, Hash, Ownership, Position, UNOWNED};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted shape of a block.
///
/// Field names are the external contract; the hash is never stored because
/// it is derived from the other fields on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    pub index: u64,
    pub position: String,
    pub ownership: String,
    pub block_type: u8,
    pub data: String,
    pub previous_hash: String,
    pub mint_count: u64,
    pub nonce: u64,
    pub timestamp: i64,
    pub id: String,
}

impl From<&Block> for BlockRecord {
    fn from(block: &Block) -> Self {
        Self {
            index: block.index,
            position: block.position.to_string(),
            ownership: block.ownership.to_string(),
            block_type: block.block_type.as_u8(),
            data: block.data.clone(),
            previous_hash: block.previous_hash_str(),
            mint_count: block.mint_count,
            nonce: block.nonce,
            timestamp: block.timestamp,
            id: block.id.to_string(),
        }
    }
}

impl TryFrom<BlockRecord> for Block {
    type Error = StorageError;

    fn try_from(record: BlockRecord) -> Result<Self> {
        let block_type = BlockType::try_from(record.block_type)
            .map_err(|e| StorageError::Corrupt(format!("block {}: {}", record.id, e)))?;
        let previous_hash = parse_previous_hash(&record.previous_hash)
            .map_err(|e| StorageError::Corrupt(format!("block {}: {}", record.id, e)))?;
        let id = Uuid::parse_str(&record.id)
            .map_err(|e| StorageError::Corrupt(format!("block id {}: {}", record.id, e)))?;

        let block = Block::new(
            record.index,
            Position::new(record.position),
            Ownership::parse(&record.ownership),
            block_type,
            record.data,
            previous_hash,
        )
        .restored(record.mint_count, record.nonce, record.timestamp, id);
        Ok(block)
    }
}

fn parse_previous_hash(value: &str) -> std::result::Result<Option<Hash>, String> {
    if value == UNOWNED {
        return Ok(None);
    }
    Hash::from_hex(value)
        .map(Some)
        .map_err(|e| format!("previous hash {:?}: {}", value, e))
}

/// The fields a repair may rewrite on a stored block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPatch {
    pub mint_count: u64,
    pub nonce: u64,
    pub previous_hash: String,
}

impl From<&Block> for BlockPatch {
    fn from(block: &Block) -> Self {
        Self {
            mint_count: block.mint_count,
            nonce: block.nonce,
            previous_hash: block.previous_hash_str(),
        }
    }
}

/// Ordered, filterable block store consumed by the ledger logic.
pub trait RecordStore {
    /// All records of one position, index-ascending.
    fn find_by_position(&self, position: &Position) -> Result<Vec<BlockRecord>>;

    /// Insert a new record.
    ///
    /// Fails with [`StorageError::IndexTaken`] when the position already
    /// holds a record at that index, except that a Genesis record may retire
    /// an unowned Empty placeholder at the same index.
    fn create(&self, record: &BlockRecord) -> Result<()>;

    /// Rewrite the repairable fields of the record with `id`.
    fn update(&self, id: &str, patch: &BlockPatch) -> Result<()>;

    /// Every record whose ownership is `identity`, in no particular order.
    fn find_owned_by(&self, identity: &AccountId) -> Result<Vec<BlockRecord>>;
}

/// sled-backed [`RecordStore`].
pub struct BlockStore<'a> {
    storage: &'a Storage,
}

impl<'a> BlockStore<'a> {
    /// Create a new BlockStore wrapping the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Get a record by block id.
    pub fn get(&self, id: &str) -> Result<Option<BlockRecord>> {
        match self.storage.get::<_, Vec<u8>>(Storage::block_id_key(id))? {
            Some(primary) => self.storage.get(primary),
            None => Ok(None),
        }
    }

    /// The record itself plus its `blockid:` and `owner:` index entries.
    fn insert_ops(record: &BlockRecord, primary: &[u8]) -> Result<Vec<BatchOp>> {
        let pointer = bincode::serialize(&primary.to_vec())?;
        let mut ops = vec![
            BatchOp::Insert {
                key: primary.to_vec(),
                value: bincode::serialize(record)?,
            },
            BatchOp::Insert {
                key: Storage::block_id_key(&record.id),
                value: pointer.clone(),
            },
        ];
        if let Some(owner) = Ownership::parse(&record.ownership).account() {
            ops.push(BatchOp::Insert {
                key: Storage::owner_key(owner, &record.id),
                value: pointer,
            });
        }
        Ok(ops)
    }

    /// Swap a stored Empty placeholder for a Genesis record at the same slot.
    ///
    /// The swap only lands if the slot still holds the placeholder that was
    /// read, so of two concurrent claimers exactly one succeeds.
    fn retire_placeholder(&self, record: &BlockRecord, primary: &[u8]) -> Result<bool> {
        if record.block_type != BlockType::Genesis.as_u8() {
            return Ok(false);
        }
        let placeholder = match self.storage.get::<_, BlockRecord>(primary)? {
            Some(existing)
                if existing.block_type == BlockType::Empty.as_u8()
                    && existing.ownership == UNOWNED =>
            {
                existing
            }
            _ => return Ok(false),
        };

        let mut ops = Self::insert_ops(record, primary)?;
        ops.push(BatchOp::Remove {
            key: Storage::block_id_key(&placeholder.id),
        });
        let expected = bincode::serialize(&placeholder)?;
        self.storage.batch_if(primary, Some(expected.as_slice()), &ops)
    }
}

impl RecordStore for BlockStore<'_> {
    fn find_by_position(&self, position: &Position) -> Result<Vec<BlockRecord>> {
        self.storage.scan(&Storage::ledger_prefix(position))
    }

    fn create(&self, record: &BlockRecord) -> Result<()> {
        let position = Position::new(record.position.clone());
        let primary = Storage::block_key(&position, record.index);

        let ops = Self::insert_ops(record, &primary)?;
        if self.storage.batch_if(&primary, None, &ops)?
            || self.retire_placeholder(record, &primary)?
        {
            return Ok(());
        }
        Err(StorageError::IndexTaken {
            position: record.position.clone(),
            index: record.index,
        })
    }

    fn update(&self, id: &str, patch: &BlockPatch) -> Result<()> {
        let primary: Vec<u8> = self.storage.get_or_err(Storage::block_id_key(id))?;
        let mut record: BlockRecord = self.storage.get(&primary)?.ok_or_else(|| {
            StorageError::Corrupt(format!("block id {} points at a missing record", id))
        })?;

        record.mint_count = patch.mint_count;
        record.nonce = patch.nonce;
        record.previous_hash = patch.previous_hash.clone();
        self.storage.put(&primary, &record)
    }

    fn find_owned_by(&self, identity: &AccountId) -> Result<Vec<BlockRecord>> {
        let pointers: Vec<Vec<u8>> = self.storage.scan(&Storage::owner_prefix(identity))?;
        let mut records = Vec::with_capacity(pointers.len());
        for primary in pointers {
            // The owner index is a hint; the record decides.
            match self.storage.get::<_, BlockRecord>(&primary)? {
                Some(record) if record.ownership == identity.as_str() => records.push(record),
                _ => {}
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Storage {
        Storage::open_temporary().unwrap()
    }

    fn alice() -> AccountId {
        AccountId::from("alice")
    }

    fn placeholder(position: &str) -> Block {
        let mut block = Block::empty(Position::from(position));
        block.mine(1);
        block
    }

    fn owned_chain(position: &str) -> Vec<Block> {
        let empty = placeholder(position);
        let mut genesis = Block::genesis(&empty, alice());
        genesis.mine(1);
        let mut minted = Block::chained(
            &genesis,
            Ownership::Account(alice()),
            BlockType::Minted,
            "hello",
        );
        minted.mine(1);
        vec![genesis, minted]
    }

    #[test]
    fn test_record_roundtrip_preserves_hash() {
        let block = owned_chain("0,0").remove(1);
        let record = BlockRecord::from(&block);
        let restored = Block::try_from(record).unwrap();

        assert_eq!(restored.hash(), block.hash());
        assert_eq!(restored, block);
    }

    #[test]
    fn test_record_uses_contract_field_names() {
        let record = BlockRecord::from(&placeholder("0,0"));
        let json = serde_json::to_value(&record).unwrap();

        for field in [
            "index",
            "position",
            "ownership",
            "blockType",
            "data",
            "previousHash",
            "mintCount",
            "nonce",
            "timestamp",
            "id",
        ] {
            assert!(json.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(json["previousHash"], "0");
        assert_eq!(json["ownership"], "0");
    }

    #[test]
    fn test_corrupt_records_are_rejected() {
        let mut record = BlockRecord::from(&placeholder("0,0"));
        record.block_type = 42;
        assert!(matches!(
            Block::try_from(record.clone()),
            Err(StorageError::Corrupt(_))
        ));

        record.block_type = 0;
        record.previous_hash = "zz".into();
        assert!(matches!(Block::try_from(record), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_find_by_position_orders_by_index() {
        let storage = setup();
        let store = BlockStore::new(&storage);

        let chain = owned_chain("1,1");
        for block in chain.iter().rev() {
            store.create(&BlockRecord::from(block)).unwrap();
        }
        store
            .create(&BlockRecord::from(&owned_chain("1,10")[0]))
            .unwrap();

        let records = store.find_by_position(&Position::from("1,1")).unwrap();
        let indexes: Vec<u64> = records.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 1]);
        assert_eq!(
            store
                .find_by_position(&Position::from("1,10"))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_create_rejects_taken_index() {
        let storage = setup();
        let store = BlockStore::new(&storage);

        let chain = owned_chain("0,0");
        store.create(&BlockRecord::from(&chain[1])).unwrap();

        let mut rival = chain[1].clone();
        rival.data = "rival".into();
        rival.id = Uuid::new_v4();
        rival.rehash();

        let result = store.create(&BlockRecord::from(&rival));
        assert!(matches!(
            result,
            Err(StorageError::IndexTaken { index: 1, .. })
        ));
        assert_eq!(store.get(&chain[1].id.to_string()).unwrap().unwrap().data, "hello");
    }

    #[test]
    fn test_genesis_retires_stored_placeholder() {
        let storage = setup();
        let store = BlockStore::new(&storage);

        let empty = placeholder("0,0");
        store.create(&BlockRecord::from(&empty)).unwrap();

        let mut genesis = Block::genesis(&empty, alice());
        genesis.mine(1);
        store.create(&BlockRecord::from(&genesis)).unwrap();

        let records = store.find_by_position(&Position::from("0,0")).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].block_type, BlockType::Genesis.as_u8());
        assert!(store.get(&empty.id.to_string()).unwrap().is_none());
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        for _ in 0..50 {
            let storage = setup();
            let store = BlockStore::new(&storage);

            let empty = placeholder("0,0");
            store.create(&BlockRecord::from(&empty)).unwrap();

            let claims: Vec<Block> = ["alice", "bob"]
                .iter()
                .map(|name| {
                    let mut genesis = Block::genesis(&empty, AccountId::from(*name));
                    genesis.mine(0);
                    genesis
                })
                .collect();

            let results: Vec<Result<()>> = std::thread::scope(|s| {
                let store = &store;
                let handles: Vec<_> = claims
                    .iter()
                    .map(|genesis| s.spawn(move || store.create(&BlockRecord::from(genesis))))
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(results
                .iter()
                .any(|r| matches!(r, Err(StorageError::IndexTaken { index: 0, .. }))));

            let records = store.find_by_position(&Position::from("0,0")).unwrap();
            assert_eq!(records.len(), 1);
            let winner = records[0].ownership.clone();
            for name in ["alice", "bob"] {
                let owned = store.find_owned_by(&AccountId::from(name)).unwrap();
                let expected = if name == winner { 1 } else { 0 };
                assert_eq!(owned.len(), expected);
                assert!(owned.iter().all(|r| r.ownership == name));
            }
        }
    }

    #[test]
    fn test_find_owned_by_ignores_stale_index_entries() {
        let storage = setup();
        let store = BlockStore::new(&storage);

        let genesis = owned_chain("0,0").remove(0);
        store.create(&BlockRecord::from(&genesis)).unwrap();

        let primary = Storage::block_key(&Position::from("0,0"), 0);
        let id = genesis.id.to_string();
        storage
            .put(Storage::owner_key(&AccountId::from("bob"), &id), &primary)
            .unwrap();

        assert!(store
            .find_owned_by(&AccountId::from("bob"))
            .unwrap()
            .is_empty());
        assert_eq!(store.find_owned_by(&alice()).unwrap().len(), 1);
    }

    #[test]
    fn test_update_rewrites_repairable_fields_only() {
        let storage = setup();
        let store = BlockStore::new(&storage);

        let block = owned_chain("0,0").remove(1);
        store.create(&BlockRecord::from(&block)).unwrap();

        let patch = BlockPatch {
            mint_count: 7,
            nonce: 99,
            previous_hash: "0".into(),
        };
        store.update(&block.id.to_string(), &patch).unwrap();

        let record = store.get(&block.id.to_string()).unwrap().unwrap();
        assert_eq!(record.mint_count, 7);
        assert_eq!(record.nonce, 99);
        assert_eq!(record.previous_hash, "0");
        assert_eq!(record.data, "hello");
        assert_eq!(record.ownership, "alice");
        assert_eq!(record.index, 1);
    }

    #[test]
    fn test_update_unknown_id() {
        let storage = setup();
        let store = BlockStore::new(&storage);
        let patch = BlockPatch {
            mint_count: 1,
            nonce: 0,
            previous_hash: "0".into(),
        };
        assert!(matches!(
            store.update("missing", &patch),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_owned_by() {
        let storage = setup();
        let store = BlockStore::new(&storage);

        for block in owned_chain("0,0").iter().chain(owned_chain("5,5").iter()) {
            store.create(&BlockRecord::from(block)).unwrap();
        }
        store
            .create(&BlockRecord::from(&placeholder("9,9")))
            .unwrap();

        let owned = store.find_owned_by(&alice()).unwrap();
        assert_eq!(owned.len(), 4);
        assert!(owned.iter().all(|r| r.ownership == "alice"));

        assert!(store
            .find_owned_by(&AccountId::from("bob"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let block = owned_chain("3,3").remove(0);
        {
            let storage = Storage::open(dir.path()).unwrap();
            BlockStore::new(&storage)
                .create(&BlockRecord::from(&block))
                .unwrap();
            storage.flush().unwrap();
        }

        let storage = Storage::open(dir.path()).unwrap();
        let records = BlockStore::new(&storage)
            .find_by_position(&Position::from("3,3"))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, block.id.to_string());
    }
}
