//! Balance tracking types for the slatebank custodial model.
//!
//! Every account holds four non-negative buckets. Value only ever enters or
//! leaves the sum of the four at transaction open, confirm, and cancel;
//! everything else is a transfer between buckets. All mutation goes through
//! [`Balance::apply`], which checks every resulting component before
//! committing — a failed apply leaves the balance untouched.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Result, SlatebankError, TxPhase};

/// The custodial balance of a single account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Balance {
    /// Immediately spendable / withdrawable.
    pub spendable: Decimal,
    /// Deposited and finalized, waiting for on-chain confirmation.
    pub awaiting_confirmation: Decimal,
    /// Deposit opened, waiting for the user's finalizing slate.
    pub awaiting_finalization: Decimal,
    /// Reserved by an open withdrawal.
    pub locked: Decimal,
}

impl Balance {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            spendable: Decimal::ZERO,
            awaiting_confirmation: Decimal::ZERO,
            awaiting_finalization: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }

    /// Total owned value (sum of all four buckets).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.spendable + self.awaiting_confirmation + self.awaiting_finalization + self.locked
    }

    /// Whether every bucket is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.spendable.is_zero()
            && self.awaiting_confirmation.is_zero()
            && self.awaiting_finalization.is_zero()
            && self.locked.is_zero()
    }

    /// Apply a signed delta to all four buckets atomically.
    ///
    /// Either every component is applied or none is: if any resulting bucket
    /// would go negative, the balance is left unchanged.
    ///
    /// # Errors
    /// Returns [`SlatebankError::InvariantViolation`] naming the offending
    /// bucket if the delta would drive it negative.
    pub fn apply(&mut self, delta: &BalanceDelta) -> Result<()> {
        let next = Self {
            spendable: self.spendable + delta.spendable,
            awaiting_confirmation: self.awaiting_confirmation + delta.awaiting_confirmation,
            awaiting_finalization: self.awaiting_finalization + delta.awaiting_finalization,
            locked: self.locked + delta.locked,
        };
        for (bucket, value) in [
            ("spendable", next.spendable),
            ("awaiting_confirmation", next.awaiting_confirmation),
            ("awaiting_finalization", next.awaiting_finalization),
            ("locked", next.locked),
        ] {
            if value.is_sign_negative() {
                return Err(SlatebankError::InvariantViolation {
                    reason: format!("{bucket} would go negative ({value})"),
                });
            }
        }
        *self = next;
        Ok(())
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::new()
    }
}

/// A signed 4-tuple of bucket deltas, applied atomically via
/// [`Balance::apply`].
///
/// The named constructors below are the only deltas the engine ever issues;
/// each corresponds to one lifecycle edge of a deposit or withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub spendable: Decimal,
    pub awaiting_confirmation: Decimal,
    pub awaiting_finalization: Decimal,
    pub locked: Decimal,
}

impl BalanceDelta {
    #[must_use]
    pub fn new(
        spendable: Decimal,
        awaiting_confirmation: Decimal,
        awaiting_finalization: Decimal,
        locked: Decimal,
    ) -> Self {
        Self {
            spendable,
            awaiting_confirmation,
            awaiting_finalization,
            locked,
        }
    }

    /// Deposit opened: the offered amount enters `awaiting_finalization`.
    /// Increases the account total.
    #[must_use]
    pub fn deposit_open(amount: Decimal) -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, amount, Decimal::ZERO)
    }

    /// Deposit slate finalized: `awaiting_finalization → awaiting_confirmation`.
    #[must_use]
    pub fn deposit_finalized(amount: Decimal) -> Self {
        Self::new(Decimal::ZERO, amount, -amount, Decimal::ZERO)
    }

    /// Deposit confirmed on chain: the pending bucket for `phase` empties
    /// into `spendable`.
    #[must_use]
    pub fn deposit_confirmed(phase: TxPhase, amount: Decimal) -> Self {
        match phase {
            TxPhase::Assigned => Self::new(amount, Decimal::ZERO, -amount, Decimal::ZERO),
            TxPhase::Finalized => Self::new(amount, -amount, Decimal::ZERO, Decimal::ZERO),
        }
    }

    /// Deposit canceled: the pending bucket for `phase` is drained.
    /// Decreases the account total (exactly reversing the open).
    #[must_use]
    pub fn deposit_canceled(phase: TxPhase, amount: Decimal) -> Self {
        match phase {
            TxPhase::Assigned => {
                Self::new(Decimal::ZERO, Decimal::ZERO, -amount, Decimal::ZERO)
            }
            TxPhase::Finalized => {
                Self::new(Decimal::ZERO, -amount, Decimal::ZERO, Decimal::ZERO)
            }
        }
    }

    /// Withdrawal opened: `spendable → locked`.
    #[must_use]
    pub fn withdraw_open(amount: Decimal) -> Self {
        Self::new(-amount, Decimal::ZERO, Decimal::ZERO, amount)
    }

    /// Withdrawal confirmed on chain: the locked reservation leaves the
    /// ledger. Decreases the account total.
    #[must_use]
    pub fn withdraw_confirmed(amount: Decimal) -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, -amount)
    }

    /// Withdrawal canceled: `locked → spendable` (exact reverse of the open).
    #[must_use]
    pub fn withdraw_canceled(amount: Decimal) -> Self {
        Self::new(amount, Decimal::ZERO, Decimal::ZERO, -amount)
    }

    /// Custodial fee charged out of `spendable`.
    #[must_use]
    pub fn fee(amount: Decimal) -> Self {
        Self::new(-amount, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
    }

    /// The exact inverse of this delta. Applying a delta and then its
    /// inverse restores the prior balance.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self::new(
            -self.spendable,
            -self.awaiting_confirmation,
            -self.awaiting_finalization,
            -self.locked,
        )
    }

    /// Net change to the account total.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.spendable + self.awaiting_confirmation + self.awaiting_finalization + self.locked
    }

    /// Whether this delta only moves value between buckets.
    #[must_use]
    pub fn conserves_total(&self) -> bool {
        self.net().is_zero()
    }
}
