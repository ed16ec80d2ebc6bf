//! The `Policy` capability interface.
//!
//! The engine is polymorphic over a `dyn Policy`; every financial decision
//! and every ledger/registry mutation goes through one of these methods.
//! The engine itself never touches a balance directly.
//!
//! ## Extending the default
//!
//! Each method is independently overridable by wrapping the default and
//! delegating the rest:
//!
//! ```ignore
//! struct NoDeposits(DefaultPolicy);
//!
//! impl Policy for NoDeposits {
//!     fn can_deposit(&self, _account: &UserAccount, _amount: Decimal) -> SpendApproval {
//!         SpendApproval::rejected("deposits are closed", None)
//!     }
//!     // every other method forwards to self.0 ...
//! }
//! ```
//!
//! ## Mutation contracts
//!
//! The `assign_*`/`finalize_*`/`confirm_*`/`cancel_*` methods are the only
//! places balances move. Callers hold the owner's account lock for the whole
//! surrounding operation; an implementation must leave the ledger and
//! registry untouched when it returns an error (the engine treats a failed
//! call as "nothing happened" and, after a backend reservation, compensates
//! with `release_lock`).

use rust_decimal::Decimal;
use slatebank_ledger::UserAccount;
use slatebank_types::{AccountId, Result, TxId};

/// A withdrawal request: an explicit amount or everything spendable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WithdrawRequest {
    Amount(Decimal),
    Max,
}

/// Early-veto verdict for an inbound sender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ignore {
    pub ignore: bool,
    /// Reply text; `None` means drop the message silently.
    pub reason: Option<String>,
}

impl Ignore {
    /// Let the message through.
    #[must_use]
    pub fn pass() -> Self {
        Self::default()
    }

    /// Veto, optionally with a user-visible reason.
    #[must_use]
    pub fn veto(reason: Option<String>) -> Self {
        Self {
            ignore: true,
            reason,
        }
    }
}

/// Outcome of `can_deposit` / `can_withdraw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendApproval {
    pub allowed: bool,
    /// Human-readable rejection reason; absent means the engine composes a
    /// generic one from the amounts.
    pub reason: Option<String>,
    /// The amount the policy would allow — possibly capped below the
    /// request, and meaningful even on rejection.
    pub approved: Option<Decimal>,
}

impl SpendApproval {
    #[must_use]
    pub fn approved(amount: Decimal) -> Self {
        Self {
            allowed: true,
            reason: None,
            approved: Some(amount),
        }
    }

    #[must_use]
    pub fn rejected(reason: impl Into<String>, approved: Option<Decimal>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            approved,
        }
    }
}

/// Message overrides returned by a successful `assign_*_tx`.
///
/// `None` slots fall back to the engine's standard texts (with the
/// `{slatepack}` placeholder substituted).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignReply {
    pub instructions: Option<String>,
    pub slate_text: Option<String>,
    pub epilogue: Option<String>,
}

/// Outcome of `should_see_eula`. The version is always reported so callers
/// can record decisions against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EulaGate {
    pub required: bool,
    pub prompt: Option<String>,
    pub version: String,
}

/// The pluggable personality. See the module docs for contracts.
pub trait Policy: Send + Sync {
    /// Early veto for a sender, before anything else runs.
    fn should_ignore(&self, account: AccountId) -> Ignore;

    /// Whether the user must (re-)consent before financial operations.
    fn should_see_eula(&self, account: &UserAccount) -> EulaGate;

    /// Record the user's approval of `version`.
    fn approved_eula(&self, account: &mut UserAccount, version: &str);

    /// Record the user's denial of `version`. Non-blocking by itself.
    fn denied_eula(&self, account: &mut UserAccount, version: &str);

    /// Authorize a deposit of `amount`.
    fn can_deposit(&self, account: &UserAccount, amount: Decimal) -> SpendApproval;

    /// Authorize a withdrawal.
    fn can_withdraw(&self, account: &UserAccount, request: WithdrawRequest) -> SpendApproval;

    /// Reserve an opened deposit: `awaiting_finalization += amount`, plus
    /// registry assignment. No side effects on failure.
    fn assign_deposit_tx(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<AssignReply>;

    /// Reserve an opened withdrawal: `spendable -= amount; locked += amount`,
    /// plus registry assignment. No side effects on failure.
    fn assign_withdraw_tx(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<AssignReply>;

    /// Gate for the second deposit round.
    fn should_finalize_deposit_tx(&self, tx_id: &TxId) -> Result<()>;

    /// Gate for the second withdrawal round.
    fn should_finalize_withdraw_tx(&self, tx_id: &TxId) -> Result<()>;

    /// Deposit slate finalized: `awaiting_finalization → awaiting_confirmation`.
    /// Returns an optional message override for the finalize reply.
    fn finalize_deposit_tx(&self, account: &mut UserAccount, tx_id: &TxId)
    -> Result<Option<String>>;

    /// Withdrawal slate finalized: balances already moved at lock time, so
    /// this only advances the phase.
    fn finalize_withdraw_tx(
        &self,
        account: &mut UserAccount,
        tx_id: &TxId,
    ) -> Result<Option<String>>;

    /// Backend confirmed a deposit: pending bucket → `spendable`, unassign.
    fn confirm_deposit_tx(
        &self,
        account: &mut UserAccount,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<()>;

    /// Backend confirmed a withdrawal: `locked` drains, unassign.
    fn confirm_withdraw_tx(
        &self,
        account: &mut UserAccount,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<()>;

    /// Deposit canceled: pending bucket drains, unassign.
    fn cancel_deposit_tx(
        &self,
        account: &mut UserAccount,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<()>;

    /// Withdrawal canceled: `locked → spendable`, unassign.
    fn cancel_withdraw_tx(
        &self,
        account: &mut UserAccount,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<()>;
}
