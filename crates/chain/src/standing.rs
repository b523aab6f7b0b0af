//! Account standing read from the record store.

use crate::book::{ChainError, LedgerBook, Result};
use hybridledger_core::{current_timestamp, parse_amount, Account, BlockType, Ledger, Position};
use hybridledger_policy::{can_mint, MintDecision, MintHistory, Standing};
use hybridledger_storage::RecordStore;
use std::collections::BTreeSet;

impl<S: RecordStore> LedgerBook<'_, S> {
    /// Milliseconds before `account` may mint again.
    pub fn cooldown_remaining(&self, account: &Account) -> Result<i64> {
        self.cooldown_remaining_at(account, current_timestamp())
    }

    /// [`LedgerBook::cooldown_remaining`] measured at `now_ms`.
    ///
    /// Positive means still waiting. Every block the account owns counts
    /// towards its lifetime total.
    pub fn cooldown_remaining_at(&self, account: &Account, now_ms: i64) -> Result<i64> {
        if account.is_admin() {
            return Ok(0);
        }
        let records = self.store.find_owned_by(&account.identity)?;
        let history = MintHistory::from_timestamps(records.iter().map(|record| record.timestamp));
        Ok(self
            .config
            .cooldown
            .remaining(account.tier, history.as_ref(), now_ms))
    }

    /// Value of the ledgers `account` currently owns, minus its spends.
    pub fn net_value(&self, account: &Account) -> Result<f64> {
        self.net_value_at(account, current_timestamp())
    }

    /// [`LedgerBook::net_value`] measured at `now_ms`.
    ///
    /// A position contributes its ledger value only while `account` is its
    /// current owner. Transaction spends are subtracted wherever they were
    /// minted. The result is not clamped.
    pub fn net_value_at(&self, account: &Account, now_ms: i64) -> Result<f64> {
        let records = self.store.find_owned_by(&account.identity)?;
        if records.is_empty() {
            return Ok(0.0);
        }

        let positions: BTreeSet<&str> = records.iter().map(|r| r.position.as_str()).collect();
        let mut owned = 0.0;
        for position in positions {
            let ledger = self.load_ledger(&Position::from(position))?;
            if ledger.ownership().is_owned_by(&account.identity) {
                owned += ledger.value_at(now_ms);
            }
        }

        let spent: f64 = records
            .iter()
            .filter(|r| r.block_type == BlockType::Transaction.as_u8())
            .filter_map(|r| parse_amount(&r.data))
            .sum();

        Ok(owned - spent)
    }

    /// Whether `account` may mint on `ledger` right now.
    pub fn can_mint(&self, ledger: &Ledger, account: &Account) -> Result<MintDecision> {
        self.can_mint_at(ledger, account, current_timestamp())
    }

    /// [`LedgerBook::can_mint`] evaluated at `now_ms`.
    pub fn can_mint_at(
        &self,
        ledger: &Ledger,
        account: &Account,
        now_ms: i64,
    ) -> Result<MintDecision> {
        can_mint(ledger, account, &AtInstant { book: self, now_ms })
    }
}

/// Store-backed [`Standing`] frozen at one instant.
struct AtInstant<'b, 's, S: RecordStore> {
    book: &'b LedgerBook<'s, S>,
    now_ms: i64,
}

impl<S: RecordStore> Standing for AtInstant<'_, '_, S> {
    type Error = ChainError;

    fn now_ms(&self) -> i64 {
        self.now_ms
    }

    fn cooldown_remaining(&self, account: &Account) -> Result<i64> {
        self.book.cooldown_remaining_at(account, self.now_ms)
    }

    fn net_value(&self, account: &Account) -> Result<f64> {
        self.book.net_value_at(account, self.now_ms)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ChainConfig, LedgerBook};
    use hybridledger_core::{Account, AccountId, Block, BlockType, Position, Tier};
    use hybridledger_storage::{BlockRecord, BlockStore, RecordStore, Storage};
    use uuid::Uuid;

    fn record(
        position: &str,
        owner: &AccountId,
        index: u64,
        kind: BlockType,
        data: &str,
        timestamp: i64,
    ) -> BlockRecord {
        let block = Block::new(
            index,
            Position::from(position),
            owner.clone().into(),
            kind,
            data,
            None,
        )
        .restored(1, 0, timestamp, Uuid::new_v4());
        BlockRecord::from(&block)
    }

    #[test]
    fn test_cooldown_from_owned_records() {
        let storage = Storage::open_temporary().unwrap();
        let store = BlockStore::new(&storage);
        let book = LedgerBook::new(&store, ChainConfig::default());
        let alice = Account::new("alice", Tier::User);

        assert_eq!(book.cooldown_remaining_at(&alice, 0).unwrap(), 0);

        store
            .create(&record("0,0", &alice.identity, 0, BlockType::Genesis, "Genesis", 1_000))
            .unwrap();
        store
            .create(&record("0,0", &alice.identity, 1, BlockType::Minted, "a", 4_000))
            .unwrap();

        // last mint at 4000, two mints * 500 ms
        assert_eq!(book.cooldown_remaining_at(&alice, 4_200).unwrap(), 800);
        assert_eq!(book.cooldown_remaining_at(&alice, 5_000).unwrap(), 0);

        let moderator = Account::with_identity(alice.identity.clone(), "alice", Tier::Moderator);
        assert_eq!(book.cooldown_remaining_at(&moderator, 4_200).unwrap(), 300);

        let admin = Account::with_identity(alice.identity.clone(), "alice", Tier::Admin);
        assert_eq!(book.cooldown_remaining_at(&admin, 4_200).unwrap(), 0);
    }

    #[test]
    fn test_net_value_without_blocks_is_zero() {
        let storage = Storage::open_temporary().unwrap();
        let store = BlockStore::new(&storage);
        let book = LedgerBook::new(&store, ChainConfig::default());

        let nobody = Account::new("nobody", Tier::User);
        assert_eq!(book.net_value_at(&nobody, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_malformed_stored_spend_counts_as_zero() {
        let storage = Storage::open_temporary().unwrap();
        let store = BlockStore::new(&storage);
        let book = LedgerBook::new(&store, ChainConfig::default());
        let alice = Account::new("alice", Tier::User);
        let bob = AccountId::from("bob");

        // alice's spends sit on a ledger bob has since taken over
        store
            .create(&record("9,9", &alice.identity, 0, BlockType::Transaction, "2.5", 0))
            .unwrap();
        store
            .create(&record("9,9", &alice.identity, 1, BlockType::Transaction, "oops", 0))
            .unwrap();
        store
            .create(&record("9,9", &bob, 2, BlockType::Minted, "mine now", 0))
            .unwrap();

        assert_eq!(book.net_value_at(&alice, 0).unwrap(), -2.5);
    }
}
