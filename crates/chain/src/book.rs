//! Ledger loading, minting and repair.
//!
//! [`LedgerBook`] brings together the record store, the mining difficulty
//! table and the authorization policy.

use crate::config::ChainConfig;
use hybridledger_core::{
    current_timestamp, parse_amount, Account, AccountId, Block, BlockType, Hash, Ledger,
    Ownership, Position,
};
use hybridledger_policy::{AllowReason, DenyReason};
use hybridledger_storage::{BlockPatch, BlockRecord, RecordStore, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("ledger {0} is already claimed")]
    NotClaimable(Position),

    #[error("mint denied: {0}")]
    Unauthorized(DenyReason),

    #[error("transaction amount is not a number: {0:?}")]
    MalformedSpend(String),

    #[error("{0} blocks cannot be minted directly")]
    UnsupportedKind(BlockType),
}

pub type Result<T> = std::result::Result<T, ChainError>;

/// Ledger operations over a record store.
pub struct LedgerBook<'s, S: RecordStore> {
    pub(crate) store: &'s S,
    pub(crate) config: ChainConfig,
}

impl<'s, S: RecordStore> LedgerBook<'s, S> {
    /// Create a new book over `store`.
    pub fn new(store: &'s S, config: ChainConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn store(&self) -> &'s S {
        self.store
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load the ledger at `position`.
    ///
    /// A position with no stored blocks yields a freshly mined Empty
    /// placeholder, which is only stored when the config asks for it.
    pub fn load_ledger(&self, position: &Position) -> Result<Ledger> {
        let blocks = self
            .store
            .find_by_position(position)?
            .into_iter()
            .map(Block::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match Ledger::from_blocks(position.clone(), blocks) {
            Some(ledger) => Ok(ledger),
            None => self.placeholder(position),
        }
    }

    fn placeholder(&self, position: &Position) -> Result<Ledger> {
        let mut block = Block::empty(position.clone());
        self.seal(&mut block);

        if self.config.persist_placeholders {
            match self.store.create(&BlockRecord::from(&block)) {
                Ok(()) => debug!(position = %position, "stored placeholder"),
                // someone else wrote the first block in the meantime
                Err(StorageError::IndexTaken { .. }) => return self.load_ledger(position),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Ledger::unclaimed(block))
    }

    // =========================================================================
    // Minting
    // =========================================================================

    /// Mine `block` at the configured difficulty for its kind.
    fn seal(&self, block: &mut Block) {
        let difficulty = self.config.difficulty.of(block.block_type);
        let attempts = block.mine(difficulty);
        debug!(
            position = %block.position,
            kind = %block.block_type,
            difficulty,
            attempts,
            nonce = block.nonce,
            hash = %block.hash(),
            "mined block"
        );
    }

    /// Apply `block` to `ledger` and persist it.
    ///
    /// The in-memory append always happens. If the store then rejects the
    /// block, the failure is logged and returned, and `ledger` is left ahead
    /// of the store.
    pub fn commit(&self, ledger: &mut Ledger, block: Block) -> Result<()> {
        let record = BlockRecord::from(&block);
        let kind = block.block_type;
        ledger.append(block);

        match self.store.create(&record) {
            Ok(()) => {
                info!(
                    position = %record.position,
                    index = record.index,
                    kind = %kind,
                    owner = %record.ownership,
                    "committed block"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    position = %record.position,
                    index = record.index,
                    error = %e,
                    "block kept in memory but not persisted"
                );
                Err(e.into())
            }
        }
    }

    /// Claim an unclaimed ledger for `owner`.
    ///
    /// Commits a Genesis block chained from the placeholder, then a Minted
    /// block carrying `data`. Fails with [`ChainError::NotClaimable`] on a
    /// ledger that has any owner or history.
    pub fn mint_by_authorizing(
        &self,
        ledger: &mut Ledger,
        owner: &AccountId,
        data: impl Into<String>,
    ) -> Result<()> {
        self.claim(ledger, owner)?;
        self.append_mined(
            ledger,
            Ownership::Account(owner.clone()),
            BlockType::Minted,
            data.into(),
        )
    }

    /// Authorize `account`, then mine and commit a `kind` block on `ledger`.
    pub fn mint(
        &self,
        ledger: &mut Ledger,
        account: &Account,
        kind: BlockType,
        data: impl Into<String>,
    ) -> Result<AllowReason> {
        self.mint_at(ledger, account, kind, data, current_timestamp())
    }

    /// [`LedgerBook::mint`] with authorization evaluated at `now_ms`.
    ///
    /// An unclaimed ledger is first claimed with a Genesis block, so minting
    /// a Minted block there is the same as [`LedgerBook::mint_by_authorizing`].
    /// The new block is owned by `account`.
    pub fn mint_at(
        &self,
        ledger: &mut Ledger,
        account: &Account,
        kind: BlockType,
        data: impl Into<String>,
        now_ms: i64,
    ) -> Result<AllowReason> {
        let data = data.into();
        match kind {
            BlockType::Empty | BlockType::Genesis => return Err(ChainError::UnsupportedKind(kind)),
            BlockType::Transaction if parse_amount(&data).is_none() => {
                return Err(ChainError::MalformedSpend(data))
            }
            _ => {}
        }

        let reason = match self.can_mint_at(ledger, account, now_ms)?.into_result() {
            Ok(reason) => reason,
            Err(denial) => {
                warn!(
                    position = %ledger.position(),
                    account = %account.identity,
                    reason = %denial,
                    "mint denied"
                );
                return Err(ChainError::Unauthorized(denial));
            }
        };

        if ledger.is_unclaimed() {
            self.claim(ledger, &account.identity)?;
        }
        self.append_mined(ledger, account.identity.clone().into(), kind, data)?;
        Ok(reason)
    }

    fn claim(&self, ledger: &mut Ledger, owner: &AccountId) -> Result<()> {
        if !ledger.is_unclaimed() {
            return Err(ChainError::NotClaimable(ledger.position().clone()));
        }
        let mut genesis = Block::genesis(ledger.last_block(), owner.clone());
        self.seal(&mut genesis);
        self.commit(ledger, genesis)
    }

    fn append_mined(
        &self,
        ledger: &mut Ledger,
        ownership: Ownership,
        kind: BlockType,
        data: String,
    ) -> Result<()> {
        let mut block = Block::chained(ledger.last_block(), ownership, kind, data);
        self.seal(&mut block);
        self.commit(ledger, block)
    }

    // =========================================================================
    // Repair
    // =========================================================================

    /// Relink and re-mine `ledger` after an out-of-band edit.
    ///
    /// Walks the blocks index-ascending. Every block after the first gets
    /// its predecessor's current hash as `previous_hash`; non-Empty blocks
    /// are re-mined at their kind's difficulty. Blocks whose repairable
    /// fields changed are written back. Returns how many were written.
    pub fn repair(&self, ledger: &mut Ledger) -> Result<usize> {
        let mut updated = 0;
        let mut previous: Option<Hash> = None;

        for (i, block) in ledger.blocks_mut().iter_mut().enumerate() {
            let before = BlockPatch::from(&*block);
            if i > 0 {
                block.previous_hash = previous;
            }
            match block.block_type {
                BlockType::Empty => block.rehash(),
                _ => self.seal(block),
            }
            previous = Some(block.hash());

            let after = BlockPatch::from(&*block);
            if after != before {
                self.store.update(&block.id.to_string(), &after)?;
                updated += 1;
            }
        }

        info!(position = %ledger.position(), updated, "repaired ledger");
        Ok(updated)
    }
}
