//! Blocks: typed, proof-of-work sealed ledger entries.

use crate::account::{AccountId, Ownership};
use crate::hash::{hash_fields, Hash};
use crate::position::Position;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Reward per leading zero for a block minted exactly once.
pub const BASE_REWARD: f64 = 0.005;

/// Reward lost per additional re-mint.
pub const REWARD_DECAY: f64 = 0.001;

/// Milliseconds of age worth one unit of value.
pub const AGING_PERIOD_MS: f64 = 1_050_000_000.0;

/// Nonce units worth one unit of value.
const NONCE_SCALE: f64 = 1_000_000.0;

/// Values are rounded to this many fractional units.
const VALUE_PRECISION: f64 = 1_000_000.0;

/// Payload of the placeholder block synthesized for unclaimed positions.
pub const EMPTY_DATA: &str = "Empty";

/// Payload of the block that opens an owned ledger.
pub const GENESIS_DATA: &str = "Genesis";

/// Errors raised while decoding block fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("unknown block type: {0}")]
    UnknownType(u8),

    #[error("unknown block type name: {0}")]
    UnknownTypeName(String),
}

/// The seven block kinds. The payload in `data` is interpreted per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BlockType {
    /// Placeholder for a position nobody has claimed.
    Empty = 0,
    /// Opens an owned ledger.
    Genesis = 1,
    /// Free-text message.
    Minted = 2,
    /// `data` is the amount spent.
    Transaction = 3,
    /// `data` lists referenced block ids.
    Acquirement = 4,
    /// Prevents non-moderators from taking the ledger over.
    Locked = 5,
    /// Message readable only by the block's owner.
    Obfuscated = 6,
}

impl BlockType {
    pub const ALL: [BlockType; 7] = [
        BlockType::Empty,
        BlockType::Genesis,
        BlockType::Minted,
        BlockType::Transaction,
        BlockType::Acquirement,
        BlockType::Locked,
        BlockType::Obfuscated,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockType::Empty => "EMPTY",
            BlockType::Genesis => "GENESIS",
            BlockType::Minted => "MINTED",
            BlockType::Transaction => "TRANSACTION",
            BlockType::Acquirement => "ACQUIREMENT",
            BlockType::Locked => "LOCKED",
            BlockType::Obfuscated => "OBFUSCATED",
        }
    }
}

impl TryFrom<u8> for BlockType {
    type Error = BlockError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        BlockType::ALL
            .get(value as usize)
            .copied()
            .ok_or(BlockError::UnknownType(value))
    }
}

impl FromStr for BlockType {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockType::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BlockError::UnknownTypeName(s.to_string()))
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current Unix time in milliseconds.
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A single ledger entry.
///
/// The cached hash is private: every constructor and every mutating method
/// refreshes it, so a block built through this API always satisfies
/// `hash() == compute_hash()`. Direct writes to the public fields leave the
/// cache stale until [`Block::rehash`] or [`Block::mine`] runs, which is how
/// an out-of-band edit shows up to [`crate::Ledger::check_pristine`].
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Position in the ledger's sequence, 0 for the first block.
    pub index: u64,
    pub position: Position,
    pub ownership: Ownership,
    pub block_type: BlockType,
    pub data: String,
    /// Digest of the predecessor; `None` is stored as `"0"`.
    pub previous_hash: Option<Hash>,
    /// Number of mining runs, including the first.
    pub mint_count: u64,
    pub nonce: u64,
    /// Creation instant in milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub id: Uuid,
    hash: Hash,
}

impl Block {
    /// Create a new, unmined block stamped with the current time.
    pub fn new(
        index: u64,
        position: Position,
        ownership: Ownership,
        block_type: BlockType,
        data: impl Into<String>,
        previous_hash: Option<Hash>,
    ) -> Self {
        let mut block = Self {
            index,
            position,
            ownership,
            block_type,
            data: data.into(),
            previous_hash,
            mint_count: 0,
            nonce: 0,
            timestamp: current_timestamp(),
            id: Uuid::new_v4(),
            hash: Hash::default(),
        };
        block.rehash();
        block
    }

    /// The unowned placeholder for a position with no stored blocks.
    pub fn empty(position: Position) -> Self {
        Self::new(
            0,
            position,
            Ownership::Unowned,
            BlockType::Empty,
            EMPTY_DATA,
            None,
        )
    }

    /// The Genesis block that replaces an Empty placeholder.
    ///
    /// It keeps the placeholder's index and links to its hash.
    pub fn genesis(placeholder: &Block, owner: AccountId) -> Self {
        Self::new(
            placeholder.index,
            placeholder.position.clone(),
            Ownership::Account(owner),
            BlockType::Genesis,
            GENESIS_DATA,
            Some(placeholder.hash()),
        )
    }

    /// A block appended directly after `parent`.
    pub fn chained(
        parent: &Block,
        ownership: Ownership,
        block_type: BlockType,
        data: impl Into<String>,
    ) -> Self {
        Self::new(
            parent.index + 1,
            parent.position.clone(),
            ownership,
            block_type,
            data,
            Some(parent.hash()),
        )
    }

    /// Restore the fields that only exist once a block has been stored.
    pub fn restored(mut self, mint_count: u64, nonce: u64, timestamp: i64, id: Uuid) -> Self {
        self.mint_count = mint_count;
        self.nonce = nonce;
        self.timestamp = timestamp;
        self.id = id;
        self.rehash();
        self
    }

    /// Start the mining search from `nonce` instead of 0.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self.rehash();
        self
    }

    /// Digest over the nine hashed fields, in fixed order.
    pub fn compute_hash(&self) -> Hash {
        let index = self.index.to_string();
        let mint_count = self.mint_count.to_string();
        let block_type = self.block_type.as_u8().to_string();
        let timestamp = self.timestamp.to_string();
        let previous = self.previous_hash_str();
        let nonce = self.nonce.to_string();

        hash_fields(&[
            index.as_bytes(),
            self.position.as_str().as_bytes(),
            mint_count.as_bytes(),
            self.ownership.as_str().as_bytes(),
            block_type.as_bytes(),
            timestamp.as_bytes(),
            previous.as_bytes(),
            self.data.as_bytes(),
            nonce.as_bytes(),
        ])
    }

    /// The cached hash.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Recompute the cached hash from the current fields.
    pub fn rehash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Whether the cached hash matches the fields.
    pub fn is_sealed(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// The predecessor digest in its stored form.
    pub fn previous_hash_str(&self) -> String {
        match &self.previous_hash {
            Some(hash) => hash.to_hex(),
            None => crate::account::UNOWNED.to_string(),
        }
    }

    /// Proof-of-work search.
    ///
    /// Bumps `mint_count`, then advances `nonce` until the hash has at least
    /// `difficulty` leading hex zeros. Expected work grows as 16^difficulty
    /// and there is no iteration cap. Returns the number of digests computed.
    pub fn mine(&mut self, difficulty: u32) -> u64 {
        self.mint_count += 1;
        let mut attempts = 0u64;
        loop {
            self.rehash();
            attempts += 1;
            if self.hash.meets_difficulty(difficulty) {
                return attempts;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }

    /// Leading hex zeros of the cached hash.
    pub fn difficulty(&self) -> u32 {
        self.hash.leading_zeros()
    }

    /// Block value at `now_ms`.
    ///
    /// `nonce / 1e6 + max(0, BASE_REWARD - REWARD_DECAY * (mint_count - 1)) * difficulty + age / AGING_PERIOD_MS`,
    /// rounded to six decimals and never negative. Age before the block's
    /// own timestamp counts as zero.
    pub fn value_at(&self, now_ms: i64) -> f64 {
        let nonce_term = self.nonce as f64 / NONCE_SCALE;
        let work_term = mint_reward(self.mint_count) * self.difficulty() as f64;
        let elapsed = now_ms.saturating_sub(self.timestamp).max(0) as f64;
        let aging_term = elapsed / AGING_PERIOD_MS;

        let total = nonce_term + work_term + aging_term;
        ((total * VALUE_PRECISION).round() / VALUE_PRECISION).max(0.0)
    }

    /// Block value right now.
    pub fn value(&self) -> f64 {
        self.value_at(current_timestamp())
    }

    /// Amount spent by a Transaction block.
    ///
    /// `None` for other kinds and for payloads that are not a finite number.
    pub fn spend(&self) -> Option<f64> {
        if self.block_type != BlockType::Transaction {
            return None;
        }
        parse_amount(&self.data)
    }

    /// Block ids referenced by an Acquirement block.
    pub fn references(&self) -> Vec<&str> {
        if self.block_type != BlockType::Acquirement {
            return Vec::new();
        }
        self.data
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Payload as shown to `viewer`.
    ///
    /// Obfuscated payloads are visible to the block owner only.
    pub fn visible_data(&self, viewer: Option<&AccountId>) -> Option<&str> {
        match self.block_type {
            BlockType::Obfuscated => match viewer {
                Some(id) if self.ownership.is_owned_by(id) => Some(&self.data),
                _ => None,
            },
            _ => Some(&self.data),
        }
    }

    pub fn is_empty_placeholder(&self) -> bool {
        self.block_type == BlockType::Empty && self.ownership.is_unowned()
    }
}

/// Reward per leading zero after `mint_count` mining runs.
///
/// Every re-mint past the first costs `REWARD_DECAY`; the reward bottoms out
/// at zero.
pub fn mint_reward(mint_count: u64) -> f64 {
    (BASE_REWARD - REWARD_DECAY * (mint_count as f64 - 1.0)).max(0.0)
}

/// Parse a spend amount, rejecting NaN and infinities.
pub fn parse_amount(data: &str) -> Option<f64> {
    data.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> AccountId {
        AccountId::from("c31a83ff-6aa5-4e6c-a2c2-023af54d850f")
    }

    fn minted_block() -> Block {
        Block::new(
            1,
            Position::from("0,0"),
            Ownership::Account(owner()),
            BlockType::Minted,
            "hello",
            None,
        )
    }

    #[test]
    fn test_new_block_is_sealed() {
        let block = minted_block();
        assert!(block.is_sealed());
        assert_eq!(block.mint_count, 0);
        assert_eq!(block.nonce, 0);
    }

    #[test]
    fn test_block_type_codes() {
        for (code, kind) in BlockType::ALL.iter().enumerate() {
            assert_eq!(kind.as_u8() as usize, code);
            assert_eq!(BlockType::try_from(code as u8).unwrap(), *kind);
        }
        assert_eq!(BlockType::try_from(7), Err(BlockError::UnknownType(7)));
        assert_eq!("locked".parse::<BlockType>().unwrap(), BlockType::Locked);
    }

    #[test]
    fn test_mine_reaches_difficulty() {
        for difficulty in 0..=3 {
            let mut block = minted_block();
            block.mine(difficulty);
            assert!(block.hash().to_hex().starts_with(&"0".repeat(difficulty as usize)));
            assert!(block.difficulty() >= difficulty);
            assert!(block.is_sealed());
            assert_eq!(block.mint_count, 1);
        }
    }

    #[test]
    fn test_mine_is_deterministic() {
        let mut a = minted_block();
        let mut b = a.clone();
        a.mine(2);
        b.mine(2);
        assert_eq!(a.nonce, b.nonce);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_mine_from_seed() {
        let mut block = minted_block().with_nonce(500);
        block.mine(0);
        assert_eq!(block.nonce, 500);
        assert_eq!(block.mint_count, 1);
    }

    #[test]
    fn test_every_hashed_field_changes_digest() {
        let base = minted_block();
        let original = base.compute_hash();

        let mut changed = base.clone();
        changed.index += 1;
        assert_ne!(changed.compute_hash(), original);

        let mut changed = base.clone();
        changed.position = Position::from("0,1");
        assert_ne!(changed.compute_hash(), original);

        let mut changed = base.clone();
        changed.mint_count += 1;
        assert_ne!(changed.compute_hash(), original);

        let mut changed = base.clone();
        changed.ownership = Ownership::Unowned;
        assert_ne!(changed.compute_hash(), original);

        let mut changed = base.clone();
        changed.block_type = BlockType::Locked;
        assert_ne!(changed.compute_hash(), original);

        let mut changed = base.clone();
        changed.timestamp += 1;
        assert_ne!(changed.compute_hash(), original);

        let mut changed = base.clone();
        changed.previous_hash = Some(original);
        assert_ne!(changed.compute_hash(), original);

        let mut changed = base.clone();
        changed.data.push('!');
        assert_ne!(changed.compute_hash(), original);

        let mut changed = base;
        changed.nonce += 1;
        assert_ne!(changed.compute_hash(), original);
    }

    #[test]
    fn test_bytes_cannot_shift_between_fields() {
        let mut a = minted_block();
        a.position = Position::from("P");
        a.mint_count = 3;
        a.ownership = Ownership::parse("1\u{1f}O");

        let mut b = a.clone();
        b.position = Position::from("P\u{1f}3");
        b.mint_count = 1;
        b.ownership = Ownership::parse("O");

        assert_ne!(a, b);
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_direct_edit_leaves_cache_stale() {
        let mut block = minted_block();
        block.data = "tampered".into();
        assert!(!block.is_sealed());
        block.rehash();
        assert!(block.is_sealed());
    }

    #[test]
    fn test_genesis_links_to_placeholder() {
        let mut empty = Block::empty(Position::from("0,0"));
        empty.mine(1);
        let genesis = Block::genesis(&empty, owner());

        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, Some(empty.hash()));
        assert_eq!(genesis.block_type, BlockType::Genesis);
        assert!(genesis.ownership.is_owned_by(&owner()));
    }

    #[test]
    fn test_chained_increments_index() {
        let parent = minted_block();
        let child = Block::chained(&parent, Ownership::Unowned, BlockType::Minted, "next");
        assert_eq!(child.index, parent.index + 1);
        assert_eq!(child.previous_hash, Some(parent.hash()));
        assert_eq!(child.position, parent.position);
    }

    #[test]
    fn test_value_formula() {
        let mut block = minted_block().restored(0, 2_000_000, 0, Uuid::new_v4());
        block.mine(0);
        let difficulty = block.difficulty() as f64;
        let expected = block.nonce as f64 / 1_000_000.0 + BASE_REWARD * difficulty;
        let expected = (expected * 1_000_000.0).round() / 1_000_000.0;
        assert!((block.value_at(block.timestamp) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_value_grows_with_age() {
        let mut block = minted_block();
        block.mine(1);
        let young = block.value_at(block.timestamp);
        let old = block.value_at(block.timestamp + AGING_PERIOD_MS as i64);
        assert!(old >= young);
        assert!((old - young - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_value_ignores_clock_skew() {
        let mut block = minted_block();
        block.mine(1);
        assert_eq!(block.value_at(block.timestamp - 10_000), block.value_at(block.timestamp));
    }

    #[test]
    fn test_remint_reduces_reward() {
        assert!(mint_reward(1) > mint_reward(2));
        assert!(mint_reward(2) > mint_reward(3));
        assert!((mint_reward(1) - BASE_REWARD).abs() < 1e-12);
        assert_eq!(mint_reward(6), 0.0);
        assert_eq!(mint_reward(40), 0.0);
    }

    #[test]
    fn test_value_never_negative() {
        let mut block = minted_block();
        block.mine(1);
        block.mint_count = 100;
        block.rehash();
        assert!(block.value_at(block.timestamp) >= 0.0);
    }

    #[test]
    fn test_spend_parsing() {
        let mut block = minted_block();
        block.block_type = BlockType::Transaction;
        block.data = " 3.5 ".into();
        assert_eq!(block.spend(), Some(3.5));

        block.data = "lots".into();
        assert_eq!(block.spend(), None);

        block.data = "NaN".into();
        assert_eq!(block.spend(), None);

        block.block_type = BlockType::Minted;
        block.data = "3".into();
        assert_eq!(block.spend(), None);
    }

    #[test]
    fn test_references() {
        let mut block = minted_block();
        block.block_type = BlockType::Acquirement;
        block.data = "a, b,,c".into();
        assert_eq!(block.references(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_obfuscated_visibility() {
        let mut block = minted_block();
        block.block_type = BlockType::Obfuscated;
        block.data = "secret".into();

        assert_eq!(block.visible_data(Some(&owner())), Some("secret"));
        assert_eq!(block.visible_data(Some(&AccountId::from("other"))), None);
        assert_eq!(block.visible_data(None), None);

        block.block_type = BlockType::Minted;
        assert_eq!(block.visible_data(None), Some("secret"));
    }
}
