//! The baseline personality.
//!
//! Behavior, as documented for implementers:
//! - deposits are always allowed, at the full offered amount
//! - withdrawals are allowed up to `spendable`; a request that would fit
//!   once pending deposits confirm gets a "wait for confirmation" reply,
//!   anything beyond that is an insufficient-balance rejection
//! - consent is sticky per EULA version; an empty configured version
//!   disables the gate entirely

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

use slatebank_ledger::{BankLedger, TransactionRegistry, UserAccount};
use slatebank_types::{
    AccountId, BalanceDelta, PolicyConfig, Result, SlatebankError, TxId, TxKind, TxPhase,
    TxRecord,
};

use crate::policy::{AssignReply, EulaGate, Ignore, Policy, SpendApproval, WithdrawRequest};

/// Default policy: open deposits, spendable-bounded withdrawals, versioned
/// consent, and faithful bookkeeping against the registry and bank.
pub struct DefaultPolicy {
    registry: Arc<TransactionRegistry>,
    bank: Arc<BankLedger>,
    config: PolicyConfig,
}

impl DefaultPolicy {
    #[must_use]
    pub fn new(
        registry: Arc<TransactionRegistry>,
        bank: Arc<BankLedger>,
        config: PolicyConfig,
    ) -> Self {
        Self {
            registry,
            bank,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Look up a registered transaction and check it is of the expected
    /// kind. A kind mismatch is reported as an unknown transaction — the
    /// user gets the same generic reply either way.
    fn expect_kind(&self, tx_id: &TxId, kind: TxKind) -> Result<TxRecord> {
        let record = self
            .registry
            .get(tx_id)
            .ok_or_else(|| SlatebankError::UnknownTransaction(tx_id.clone()))?;
        if record.kind != kind {
            return Err(SlatebankError::UnknownTransaction(tx_id.clone()));
        }
        Ok(record)
    }

    /// Adjust the ledger and register the tx; on registry failure the
    /// ledger change is rolled back so the whole call is all-or-nothing.
    fn adjust_and_assign(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        kind: TxKind,
        amount: Decimal,
        delta: &BalanceDelta,
        tx_id: &TxId,
    ) -> Result<()> {
        account.adjust(delta)?;
        let record = TxRecord::new(account_id, kind, amount, Utc::now());
        if let Err(err) = self.registry.assign(tx_id, record, account) {
            // The inverse of a delta that just applied cannot underflow.
            let _ = account.adjust(&delta.inverse());
            return Err(err);
        }
        Ok(())
    }
}

impl Policy for DefaultPolicy {
    fn should_ignore(&self, _account: AccountId) -> Ignore {
        Ignore::pass()
    }

    fn should_see_eula(&self, account: &UserAccount) -> EulaGate {
        let version = self.config.eula_version.clone();
        let required = !version.is_empty() && !account.consent.covers(&version);
        EulaGate {
            required,
            prompt: required.then(|| self.config.eula_text.clone()),
            version,
        }
    }

    fn approved_eula(&self, account: &mut UserAccount, version: &str) {
        account.consent.approve(version, Utc::now());
        tracing::info!(version, "EULA approved");
    }

    fn denied_eula(&self, account: &mut UserAccount, version: &str) {
        account.consent.deny(Utc::now());
        tracing::info!(version, "EULA denied");
    }

    fn can_deposit(&self, _account: &UserAccount, amount: Decimal) -> SpendApproval {
        SpendApproval::approved(amount)
    }

    fn can_withdraw(&self, account: &UserAccount, request: WithdrawRequest) -> SpendApproval {
        let spendable = account.balance.spendable;
        let confirming = account.balance.awaiting_confirmation;

        match request {
            WithdrawRequest::Max => {
                if spendable.is_zero() {
                    SpendApproval::rejected(
                        "You have no spendable balance to withdraw.",
                        Some(Decimal::ZERO),
                    )
                } else {
                    SpendApproval::approved(spendable)
                }
            }
            WithdrawRequest::Amount(requested) => {
                if requested <= spendable {
                    SpendApproval::approved(requested)
                } else if requested <= spendable + confirming {
                    SpendApproval::rejected(
                        format!(
                            "You requested {requested} but only {spendable} is spendable \
                             right now; {confirming} is still awaiting confirmation. \
                             Try again once it confirms.",
                        ),
                        Some(spendable),
                    )
                } else {
                    SpendApproval::rejected(
                        format!(
                            "Insufficient balance: requested {requested}, \
                             spendable {spendable}.",
                        ),
                        Some(spendable),
                    )
                }
            }
        }
    }

    fn assign_deposit_tx(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<AssignReply> {
        self.adjust_and_assign(
            account,
            account_id,
            TxKind::Deposit,
            amount,
            &BalanceDelta::deposit_open(amount),
            tx_id,
        )?;
        self.bank.credit(amount);
        tracing::info!(%account_id, %tx_id, %amount, "deposit assigned");
        Ok(AssignReply::default())
    }

    fn assign_withdraw_tx(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<AssignReply> {
        self.adjust_and_assign(
            account,
            account_id,
            TxKind::Withdraw,
            amount,
            &BalanceDelta::withdraw_open(amount),
            tx_id,
        )?;
        tracing::info!(%account_id, %tx_id, %amount, "withdrawal assigned");
        Ok(AssignReply::default())
    }

    fn should_finalize_deposit_tx(&self, tx_id: &TxId) -> Result<()> {
        let record = self.expect_kind(tx_id, TxKind::Deposit)?;
        if record.phase != TxPhase::Assigned {
            return Err(SlatebankError::WrongPhase {
                tx_id: tx_id.clone(),
                phase: record.phase,
            });
        }
        Ok(())
    }

    fn should_finalize_withdraw_tx(&self, tx_id: &TxId) -> Result<()> {
        let record = self.expect_kind(tx_id, TxKind::Withdraw)?;
        if record.phase != TxPhase::Assigned {
            return Err(SlatebankError::WrongPhase {
                tx_id: tx_id.clone(),
                phase: record.phase,
            });
        }
        Ok(())
    }

    fn finalize_deposit_tx(
        &self,
        account: &mut UserAccount,
        tx_id: &TxId,
    ) -> Result<Option<String>> {
        let record = self.expect_kind(tx_id, TxKind::Deposit)?;
        account.adjust(&BalanceDelta::deposit_finalized(record.amount))?;
        if let Err(err) = self.registry.mark_finalized(tx_id) {
            let _ = account.adjust(&BalanceDelta::deposit_finalized(record.amount).inverse());
            return Err(err);
        }
        tracing::info!(%tx_id, "deposit finalized");
        Ok(None)
    }

    fn finalize_withdraw_tx(
        &self,
        _account: &mut UserAccount,
        tx_id: &TxId,
    ) -> Result<Option<String>> {
        // Balances moved when the withdrawal was locked; only the phase
        // advances here.
        self.expect_kind(tx_id, TxKind::Withdraw)?;
        self.registry.mark_finalized(tx_id)?;
        tracing::info!(%tx_id, "withdrawal finalized");
        Ok(None)
    }

    fn confirm_deposit_tx(
        &self,
        account: &mut UserAccount,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<()> {
        let record = self.expect_kind(tx_id, TxKind::Deposit)?;
        if record.amount != amount {
            tracing::warn!(
                %tx_id, ledger = %record.amount, backend = %amount,
                "confirmed amount differs from reservation; settling the reserved amount"
            );
        }
        account.adjust(&BalanceDelta::deposit_confirmed(record.phase, record.amount))?;
        self.registry.unassign(tx_id, account)?;
        tracing::info!(%tx_id, amount = %record.amount, "deposit confirmed");
        Ok(())
    }

    fn confirm_withdraw_tx(
        &self,
        account: &mut UserAccount,
        amount: Decimal,
        tx_id: &TxId,
    ) -> Result<()> {
        let record = self.expect_kind(tx_id, TxKind::Withdraw)?;
        if record.amount != amount {
            tracing::warn!(
                %tx_id, ledger = %record.amount, backend = %amount,
                "confirmed amount differs from reservation; settling the reserved amount"
            );
        }
        account.adjust(&BalanceDelta::withdraw_confirmed(record.amount))?;
        self.registry.unassign(tx_id, account)?;
        self.bank.debit(record.amount);
        tracing::info!(%tx_id, amount = %record.amount, "withdrawal confirmed");
        Ok(())
    }

    fn cancel_deposit_tx(
        &self,
        account: &mut UserAccount,
        _amount: Decimal,
        tx_id: &TxId,
    ) -> Result<()> {
        let record = self.expect_kind(tx_id, TxKind::Deposit)?;
        account.adjust(&BalanceDelta::deposit_canceled(record.phase, record.amount))?;
        self.registry.unassign(tx_id, account)?;
        self.bank.debit(record.amount);
        tracing::info!(%tx_id, amount = %record.amount, "deposit canceled");
        Ok(())
    }

    fn cancel_withdraw_tx(
        &self,
        account: &mut UserAccount,
        _amount: Decimal,
        tx_id: &TxId,
    ) -> Result<()> {
        let record = self.expect_kind(tx_id, TxKind::Withdraw)?;
        account.adjust(&BalanceDelta::withdraw_canceled(record.amount))?;
        self.registry.unassign(tx_id, account)?;
        tracing::info!(%tx_id, amount = %record.amount, "withdrawal canceled");
        Ok(())
    }
}
