//! Transaction registry — maps open transaction ids to their owner.
//!
//! Every entry lives in two places at once: the aggregate map here and the
//! owner's own `txs` list. `assign` and `unassign` update both together;
//! callers must hold the owner's account lock, which is what makes the pair
//! atomic with respect to concurrent reconciliation sweeps.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use slatebank_types::{AccountId, Result, SlatebankError, TxId, TxPhase, TxRecord};

use crate::UserAccount;

/// Aggregate registry of all open transactions.
pub struct TransactionRegistry {
    entries: Mutex<HashMap<TxId, TxRecord>>,
}

impl TransactionRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TxId, TxRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a transaction and append it to the owner's list.
    ///
    /// # Errors
    /// Returns [`SlatebankError::AlreadyAssigned`] if the id exists; neither
    /// the aggregate map nor the owner's list is touched in that case.
    pub fn assign(&self, tx_id: &TxId, record: TxRecord, owner: &mut UserAccount) -> Result<()> {
        {
            let mut entries = self.lock();
            if entries.contains_key(tx_id) {
                return Err(SlatebankError::AlreadyAssigned(tx_id.clone()));
            }
            entries.insert(tx_id.clone(), record);
        }
        owner.txs.push(tx_id.clone());
        Ok(())
    }

    /// Remove a transaction from the aggregate map and the owner's list.
    ///
    /// # Errors
    /// Returns [`SlatebankError::UnknownTransaction`] if the id is absent.
    pub fn unassign(&self, tx_id: &TxId, owner: &mut UserAccount) -> Result<TxRecord> {
        let record = self
            .lock()
            .remove(tx_id)
            .ok_or_else(|| SlatebankError::UnknownTransaction(tx_id.clone()))?;
        owner.txs.retain(|id| id != tx_id);
        Ok(record)
    }

    /// Which account owns this transaction.
    ///
    /// # Errors
    /// Returns [`SlatebankError::UnknownTransaction`] if the id is absent.
    pub fn owner_of(&self, tx_id: &TxId) -> Result<AccountId> {
        self.lock()
            .get(tx_id)
            .map(|record| record.account)
            .ok_or_else(|| SlatebankError::UnknownTransaction(tx_id.clone()))
    }

    /// Whether the id is currently registered.
    #[must_use]
    pub fn is_known(&self, tx_id: &TxId) -> bool {
        self.lock().contains_key(tx_id)
    }

    /// Copy of the record, if present.
    #[must_use]
    pub fn get(&self, tx_id: &TxId) -> Option<TxRecord> {
        self.lock().get(tx_id).cloned()
    }

    /// Advance a transaction from `Assigned` to `Finalized`.
    ///
    /// # Errors
    /// - [`SlatebankError::UnknownTransaction`] if the id is absent
    /// - [`SlatebankError::WrongPhase`] if it was already finalized
    pub fn mark_finalized(&self, tx_id: &TxId) -> Result<()> {
        let mut entries = self.lock();
        let record = entries
            .get_mut(tx_id)
            .ok_or_else(|| SlatebankError::UnknownTransaction(tx_id.clone()))?;
        if record.phase != TxPhase::Assigned {
            return Err(SlatebankError::WrongPhase {
                tx_id: tx_id.clone(),
                phase: record.phase,
            });
        }
        record.phase = TxPhase::Finalized;
        Ok(())
    }

    /// Rebuild a registry from persisted records ([`Self::snapshot`] is the
    /// dual). Owners' tx lists are restored with their accounts.
    #[must_use]
    pub fn restore(entries: Vec<(TxId, TxRecord)>) -> Self {
        Self {
            entries: Mutex::new(entries.into_iter().collect()),
        }
    }

    /// Snapshot of all open transactions, for the reconciliation sweep.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(TxId, TxRecord)> {
        self.lock()
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    /// Number of open transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use slatebank_types::TxKind;

    fn setup() -> (TransactionRegistry, UserAccount) {
        (TransactionRegistry::new(), UserAccount::new(Utc::now()))
    }

    fn record(account: AccountId) -> TxRecord {
        TxRecord::new(account, TxKind::Deposit, Decimal::new(10, 0), Utc::now())
    }

    #[test]
    fn assign_updates_both_maps() {
        let (registry, mut owner) = setup();
        let tx = TxId::new("tx-1");
        registry.assign(&tx, record(AccountId(1)), &mut owner).unwrap();

        assert!(registry.is_known(&tx));
        assert_eq!(registry.owner_of(&tx).unwrap(), AccountId(1));
        assert_eq!(owner.txs, vec![tx]);
    }

    #[test]
    fn duplicate_assign_leaves_state_unchanged() {
        let (registry, mut owner) = setup();
        let tx = TxId::new("tx-1");
        registry.assign(&tx, record(AccountId(1)), &mut owner).unwrap();

        let mut other = UserAccount::new(Utc::now());
        let err = registry
            .assign(&tx, record(AccountId(2)), &mut other)
            .unwrap_err();
        assert!(matches!(err, SlatebankError::AlreadyAssigned(_)));

        // Aggregate map still points at the first owner; the second
        // account's list is untouched.
        assert_eq!(registry.owner_of(&tx).unwrap(), AccountId(1));
        assert!(other.txs.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unassign_removes_from_both_maps() {
        let (registry, mut owner) = setup();
        let tx = TxId::new("tx-1");
        registry.assign(&tx, record(AccountId(1)), &mut owner).unwrap();

        let removed = registry.unassign(&tx, &mut owner).unwrap();
        assert_eq!(removed.account, AccountId(1));
        assert!(!registry.is_known(&tx));
        assert!(owner.txs.is_empty());
    }

    #[test]
    fn unassign_unknown_fails() {
        let (registry, mut owner) = setup();
        let err = registry
            .unassign(&TxId::new("missing"), &mut owner)
            .unwrap_err();
        assert!(matches!(err, SlatebankError::UnknownTransaction(_)));
    }

    #[test]
    fn mark_finalized_is_monotonic() {
        let (registry, mut owner) = setup();
        let tx = TxId::new("tx-1");
        registry.assign(&tx, record(AccountId(1)), &mut owner).unwrap();

        registry.mark_finalized(&tx).unwrap();
        assert_eq!(registry.get(&tx).unwrap().phase, TxPhase::Finalized);

        let err = registry.mark_finalized(&tx).unwrap_err();
        assert!(matches!(err, SlatebankError::WrongPhase { .. }));
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let (registry, mut owner) = setup();
        registry
            .assign(&TxId::new("a"), record(AccountId(1)), &mut owner)
            .unwrap();

        let restored = TransactionRegistry::restore(registry.snapshot());
        assert!(restored.is_known(&TxId::new("a")));
        assert_eq!(restored.owner_of(&TxId::new("a")).unwrap(), AccountId(1));
    }

    #[test]
    fn snapshot_lists_open_txs() {
        let (registry, mut owner) = setup();
        registry
            .assign(&TxId::new("a"), record(AccountId(1)), &mut owner)
            .unwrap();
        registry
            .assign(&TxId::new("b"), record(AccountId(1)), &mut owner)
            .unwrap();

        let mut ids: Vec<String> = registry
            .snapshot()
            .into_iter()
            .map(|(id, _)| id.0)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
