//! Sharded account store with per-account locking.
//!
//! Each account lives behind its own `tokio::sync::Mutex`, so an inbound
//! event and a reconciliation sweep serialize per account while unrelated
//! accounts proceed in parallel. The map itself is a `DashMap`; its shard
//! locks are only ever held for a single map operation.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use slatebank_types::{AccountId, Balance, Result, SlatebankError};
use tokio::sync::Mutex;

use crate::UserAccount;

/// Handle to one account's lock.
pub type AccountCell = Arc<Mutex<UserAccount>>;

/// The source of truth for all per-account state.
pub struct AccountStore {
    accounts: DashMap<AccountId, AccountCell>,
}

impl AccountStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Explicitly create a zero-balance record.
    ///
    /// # Errors
    /// Returns [`SlatebankError::AlreadyInitialized`] if the account exists.
    pub fn initialize(&self, id: AccountId) -> Result<()> {
        if self.accounts.contains_key(&id) {
            return Err(SlatebankError::AlreadyInitialized(id));
        }
        self.accounts
            .insert(id, Arc::new(Mutex::new(UserAccount::new(Utc::now()))));
        Ok(())
    }

    /// Get the account cell, creating a zero-balance record on first
    /// interaction.
    #[must_use]
    pub fn open(&self, id: AccountId) -> AccountCell {
        self.accounts
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(UserAccount::new(Utc::now()))))
            .value()
            .clone()
    }

    /// Get the account cell without creating it.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<AccountCell> {
        self.accounts.get(&id).map(|cell| cell.value().clone())
    }

    /// Read an account's balance.
    ///
    /// # Errors
    /// Returns [`SlatebankError::NotInitialized`] if the account is unknown.
    pub async fn balance(&self, id: AccountId) -> Result<Balance> {
        let cell = self.get(id).ok_or(SlatebankError::NotInitialized(id))?;
        let account = cell.lock().await;
        Ok(account.balance)
    }

    /// Snapshot of all known account ids.
    #[must_use]
    pub fn ids(&self) -> Vec<AccountId> {
        self.accounts.iter().map(|entry| *entry.key()).collect()
    }

    /// Remove an account if nobody is using it and `pred` holds.
    ///
    /// The removal only happens when the store holds the sole reference to
    /// the cell and its lock is free — an in-flight operation on the same
    /// account always wins over eviction. Callers must drop their own clone
    /// of the cell before calling this.
    pub fn remove_if_idle(
        &self,
        id: AccountId,
        pred: impl Fn(&UserAccount) -> bool,
    ) -> bool {
        self.accounts
            .remove_if(&id, |_, cell| {
                if Arc::strong_count(cell) > 1 {
                    return false;
                }
                cell.try_lock().map(|account| pred(&account)).unwrap_or(false)
            })
            .is_some()
    }

    /// Dump every account for persistence. Intended for a quiescent
    /// shutdown path; accounts locked by in-flight work are awaited.
    pub async fn export(&self) -> Vec<(AccountId, UserAccount)> {
        let mut out = Vec::with_capacity(self.accounts.len());
        for id in self.ids() {
            if let Some(cell) = self.get(id) {
                out.push((id, cell.lock().await.clone()));
            }
        }
        out
    }

    /// Rebuild a store from persisted records.
    #[must_use]
    pub fn restore(records: Vec<(AccountId, UserAccount)>) -> Self {
        let store = Self::new();
        for (id, account) in records {
            store.accounts.insert(id, Arc::new(Mutex::new(account)));
        }
        store
    }

    /// Number of accounts tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use slatebank_types::BalanceDelta;

    #[tokio::test]
    async fn open_creates_lazily() {
        let store = AccountStore::new();
        assert!(store.is_empty());
        let cell = store.open(AccountId(1));
        assert_eq!(store.len(), 1);
        assert!(cell.lock().await.balance.is_zero());
    }

    #[tokio::test]
    async fn open_returns_same_account() {
        let store = AccountStore::new();
        let cell = store.open(AccountId(1));
        cell.lock()
            .await
            .adjust(&BalanceDelta::deposit_open(Decimal::new(5, 0)))
            .unwrap();
        drop(cell);

        let again = store.open(AccountId(1));
        assert_eq!(
            again.lock().await.balance.awaiting_finalization,
            Decimal::new(5, 0)
        );
    }

    #[test]
    fn initialize_rejects_duplicates() {
        let store = AccountStore::new();
        store.initialize(AccountId(1)).unwrap();
        let err = store.initialize(AccountId(1)).unwrap_err();
        assert!(matches!(err, SlatebankError::AlreadyInitialized(_)));
    }

    #[tokio::test]
    async fn balance_requires_initialization() {
        let store = AccountStore::new();
        let err = store.balance(AccountId(404)).await.unwrap_err();
        assert!(matches!(err, SlatebankError::NotInitialized(_)));

        store.initialize(AccountId(404)).unwrap();
        assert!(store.balance(AccountId(404)).await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn remove_if_idle_respects_predicate() {
        let store = AccountStore::new();
        store.open(AccountId(1));
        assert!(!store.remove_if_idle(AccountId(1), |_| false));
        assert!(store.remove_if_idle(AccountId(1), |_| true));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn export_restore_roundtrip() {
        let store = AccountStore::new();
        let cell = store.open(AccountId(1));
        cell.lock()
            .await
            .adjust(&BalanceDelta::deposit_open(Decimal::new(7, 0)))
            .unwrap();
        drop(cell);
        store.open(AccountId(2));

        let records = store.export().await;
        let restored = AccountStore::restore(records);
        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored
                .balance(AccountId(1))
                .await
                .unwrap()
                .awaiting_finalization,
            Decimal::new(7, 0)
        );
    }

    #[tokio::test]
    async fn remove_if_idle_skips_in_use_account() {
        let store = AccountStore::new();
        let held = store.open(AccountId(1));
        // Someone still holds the cell — eviction must back off.
        assert!(!store.remove_if_idle(AccountId(1), |_| true));
        drop(held);
        assert!(store.remove_if_idle(AccountId(1), |_| true));
    }
}
