//! Account records.

use crate::db::{Result, Storage};
use hybridledger_core::{Account, AccountId};

/// Manages stored accounts.
pub struct AccountStore<'a> {
    storage: &'a Storage,
}

impl<'a> AccountStore<'a> {
    /// Create a new AccountStore wrapping the given storage.
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create or replace an account.
    pub fn put_account(&self, account: &Account) -> Result<()> {
        self.storage
            .put(Storage::account_key(&account.identity), account)
    }

    /// Get an account by identity.
    pub fn get_account(&self, identity: &AccountId) -> Result<Option<Account>> {
        self.storage.get(Storage::account_key(identity))
    }

    /// All accounts, ordered by identity.
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        self.storage.scan(Storage::account_prefix())
    }

    /// Find an account by display name (first match).
    pub fn find_by_name(&self, display_name: &str) -> Result<Option<Account>> {
        Ok(self
            .list_accounts()?
            .into_iter()
            .find(|account| account.display_name == display_name))
    }
}
