//! A single custodial account: balance, open transactions, consent, and the
//! timestamps the accounting sweep runs on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slatebank_types::{Balance, BalanceDelta, ConsentRecord, Result, TxId};

/// Everything slatebank persists for one account.
///
/// Mutated only while the owning [`AccountStore`](crate::AccountStore) entry
/// lock is held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub balance: Balance,
    /// Ids of this account's open transactions. Kept in lockstep with the
    /// aggregate registry by `TransactionRegistry::assign`/`unassign`.
    pub txs: Vec<TxId>,
    pub consent: ConsentRecord,
    pub created_at: DateTime<Utc>,
    /// Last inbound event for this account; drives inactivity eviction.
    pub last_active_at: DateTime<Utc>,
    /// Set when `spendable + awaiting_confirmation` first exceeded the free
    /// ceiling; cleared when the balance drops back under it.
    pub over_limit_since: Option<DateTime<Utc>>,
    /// Whether the fee warning for the current billing cycle went out.
    pub fee_warned: bool,
}

impl UserAccount {
    /// Fresh zero-balance account.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            balance: Balance::new(),
            txs: Vec::new(),
            consent: ConsentRecord::new(),
            created_at: now,
            last_active_at: now,
            over_limit_since: None,
            fee_warned: false,
        }
    }

    /// Record an inbound event from this account.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }

    /// Apply a balance delta, logging at high severity on an invariant
    /// violation (that means a sequencing bug, not user error).
    ///
    /// # Errors
    /// Propagates [`Balance::apply`] failures; the balance is unchanged.
    pub fn adjust(&mut self, delta: &BalanceDelta) -> Result<Balance> {
        if let Err(err) = self.balance.apply(delta) {
            tracing::error!(%err, ?delta, "ledger adjustment refused");
            return Err(err);
        }
        Ok(self.balance)
    }

    /// Whether this account has any open transactions.
    #[must_use]
    pub fn has_open_txs(&self) -> bool {
        !self.txs.is_empty()
    }

    /// Whether this account qualifies for destruction: empty balance, no
    /// open transactions, and inactive for longer than `window`.
    #[must_use]
    pub fn is_evictable(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.balance.is_zero() && self.txs.is_empty() && now - self.last_active_at > window
    }
}
