//! Bank-wide custody accounting.
//!
//! Mathematical invariant checkable in any quiescent state:
//! ```text
//! Σ(account totals) == credits - debits - charged
//! ```
//! where credits accrue at deposit open, debits at withdrawal confirmation
//! and deposit cancellation, and charged at fee collection. If this ever
//! fails, value was created or destroyed somewhere it must not be.

use std::sync::{Mutex, PoisonError};

use rust_decimal::Decimal;
use slatebank_types::{Result, SlatebankError};

#[derive(Debug, Default, Clone, Copy)]
struct CustodyState {
    credits: Decimal,
    debits: Decimal,
    charged: Decimal,
}

/// Cross-user aggregate counters, guarded by one short-lived mutex.
pub struct BankLedger {
    state: Mutex<CustodyState>,
}

impl BankLedger {
    /// Create a new bank ledger with zero counters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CustodyState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CustodyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record value entering custody (deposit opened).
    pub fn credit(&self, amount: Decimal) {
        self.lock().credits += amount;
    }

    /// Record value leaving custody (withdrawal confirmed, deposit
    /// canceled).
    pub fn debit(&self, amount: Decimal) {
        self.lock().debits += amount;
    }

    /// Record a custodial fee moving from a user to the bank.
    pub fn charge(&self, amount: Decimal) {
        self.lock().charged += amount;
    }

    /// Total fees collected since genesis.
    #[must_use]
    pub fn total_charged(&self) -> Decimal {
        self.lock().charged
    }

    /// Expected sum of all account totals.
    #[must_use]
    pub fn expected_custody(&self) -> Decimal {
        let state = self.lock();
        state.credits - state.debits - state.charged
    }

    /// Verify the custody invariant against an actual account-total sum.
    ///
    /// Only meaningful when no operation is mid-flight; the caller is
    /// responsible for quiescence.
    ///
    /// # Errors
    /// Returns [`SlatebankError::InvariantViolation`] if actual ≠ expected.
    pub fn audit(&self, actual: Decimal) -> Result<()> {
        let expected = self.expected_custody();
        if actual != expected {
            let state = self.lock();
            return Err(SlatebankError::InvariantViolation {
                reason: format!(
                    "custody drift: actual {actual} != expected {expected} \
                     (credits={}, debits={}, charged={})",
                    state.credits, state.debits, state.charged,
                ),
            });
        }
        Ok(())
    }
}

impl Default for BankLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn empty_bank_expects_zero() {
        let bank = BankLedger::new();
        assert_eq!(bank.expected_custody(), Decimal::ZERO);
        assert!(bank.audit(Decimal::ZERO).is_ok());
    }

    #[test]
    fn credits_and_debits_move_expectation() {
        let bank = BankLedger::new();
        bank.credit(dec(10));
        bank.credit(dec(5));
        bank.debit(dec(3));
        assert_eq!(bank.expected_custody(), dec(12));
    }

    #[test]
    fn charge_reduces_user_side() {
        let bank = BankLedger::new();
        bank.credit(dec(20));
        bank.charge(dec(1));
        assert_eq!(bank.expected_custody(), dec(19));
        assert_eq!(bank.total_charged(), dec(1));
    }

    #[test]
    fn audit_catches_drift() {
        let bank = BankLedger::new();
        bank.credit(dec(10));
        assert!(bank.audit(dec(10)).is_ok());
        let err = bank.audit(dec(11)).unwrap_err();
        assert!(matches!(err, SlatebankError::InvariantViolation { .. }));
    }

    #[test]
    fn internal_transfers_do_not_move_expectation() {
        // A withdrawal open (spendable → locked) or deposit finalize touches
        // no bank counter: the custodial total is unchanged.
        let bank = BankLedger::new();
        bank.credit(dec(10));
        assert_eq!(bank.expected_custody(), dec(10));
    }
}
