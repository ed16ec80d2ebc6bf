//! Transaction model: the registry entry tracked for every open slate
//! negotiation, and the status shape reported back by the wallet backend.
//!
//! Lifecycle: `Assigned → Finalized → (confirmed | canceled)`. The two
//! terminal outcomes are never stored — reaching one removes the record from
//! the registry entirely.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::AccountId;

/// Which direction a transaction moves value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// User pays the custodial wallet.
    Deposit,
    /// Custodial wallet pays the user.
    Withdraw,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Withdraw => write!(f, "withdrawal"),
        }
    }
}

/// How far the slate negotiation has progressed.
///
/// Transitions are monotonic: `Assigned → Finalized`, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxPhase {
    /// Funds reserved in a non-spendable bucket; waiting for the second
    /// protocol round.
    Assigned,
    /// Cryptographic exchange complete; waiting for on-chain confirmation.
    Finalized,
}

impl fmt::Display for TxPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assigned => write!(f, "ASSIGNED"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// Registry entry for one open transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRecord {
    /// The account that owns this transaction.
    pub account: AccountId,
    pub kind: TxKind,
    /// Amount reserved at assignment time. This — not the backend-reported
    /// amount — is what confirm/cancel reverse, so the ledger always
    /// releases exactly what it reserved.
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub phase: TxPhase,
}

impl TxRecord {
    /// Create a freshly assigned record.
    #[must_use]
    pub fn new(account: AccountId, kind: TxKind, amount: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            account,
            kind,
            amount,
            created_at: now,
            phase: TxPhase::Assigned,
        }
    }

    /// Age of this transaction at `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// Backend-reported confirmation state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Confirmed on chain — terminal success.
    Confirmed,
    /// Broadcast but not yet buried deep enough.
    Confirming,
    /// Canceled backend-side — terminal failure.
    Canceled,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::Confirming => write!(f, "confirming"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// Full status report from `WalletBackend::query_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxStatusReport {
    pub status: TxStatus,
    pub kind: TxKind,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_starts_assigned() {
        let rec = TxRecord::new(AccountId(1), TxKind::Deposit, Decimal::new(10, 0), Utc::now());
        assert_eq!(rec.phase, TxPhase::Assigned);
        assert_eq!(rec.kind, TxKind::Deposit);
    }

    #[test]
    fn age_measures_elapsed() {
        let now = Utc::now();
        let rec = TxRecord::new(AccountId(1), TxKind::Withdraw, Decimal::ONE, now);
        let later = now + chrono::Duration::seconds(90);
        assert_eq!(rec.age(later).num_seconds(), 90);
    }

    #[test]
    fn kind_display() {
        assert_eq!(TxKind::Deposit.to_string(), "deposit");
        assert_eq!(TxKind::Withdraw.to_string(), "withdrawal");
    }

    #[test]
    fn record_serde_roundtrip() {
        let rec = TxRecord::new(AccountId(9), TxKind::Deposit, Decimal::new(25, 1), Utc::now());
        let json = serde_json::to_string(&rec).unwrap();
        let back: TxRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
