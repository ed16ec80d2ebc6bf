//! Reconciliation scheduler — converges ledger state with wallet ground
//! truth.
//!
//! Two independent periodic sweeps:
//!
//! - **Transaction sweep**: queries the backend for every open transaction
//!   and applies the terminal outcome (confirm / cancel). Transactions the
//!   user abandoned past the configured age are force-canceled so locked
//!   funds come back.
//! - **Accounting sweep**: warns and then charges over-ceiling accounts,
//!   and destroys empty accounts that went inactive.
//!
//! Both sweeps take the same per-account lock as inbound-event processing
//! before touching that account's ledger or registry state, so a sweep can
//! never race a live negotiation on the same account. A second sweep over
//! an already-settled transaction finds it gone from the registry and skips
//! it — reconciliation is idempotent.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use slatebank_ledger::{AccountStore, BankLedger, TransactionRegistry, UserAccount};
use slatebank_policy::Policy;
use slatebank_types::{
    AccountId, BalanceDelta, EngineConfig, OutboundMessage, PolicyConfig, Result,
    SchedulerConfig, TxId, TxKind, TxRecord, TxStatus,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::backend::{WalletBackend, with_deadline};
use crate::text;

/// Counters from one transaction sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub confirmed: usize,
    pub canceled: usize,
    pub stale: usize,
    pub skipped: usize,
}

/// Counters from one accounting sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccountingSummary {
    pub warned: usize,
    pub charged: usize,
    pub evicted: usize,
}

/// The periodic reconciliation jobs. Construct once and `run()` it on the
/// runtime; the sweep methods are public so deployments (and tests) can
/// also trigger them directly.
pub struct ReconciliationScheduler {
    store: Arc<AccountStore>,
    registry: Arc<TransactionRegistry>,
    policy: Arc<dyn Policy>,
    backend: Arc<dyn WalletBackend>,
    bank: Arc<BankLedger>,
    policy_config: PolicyConfig,
    engine_config: EngineConfig,
    scheduler_config: SchedulerConfig,
    notifier: mpsc::Sender<OutboundMessage>,
}

impl ReconciliationScheduler {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        store: Arc<AccountStore>,
        registry: Arc<TransactionRegistry>,
        policy: Arc<dyn Policy>,
        backend: Arc<dyn WalletBackend>,
        bank: Arc<BankLedger>,
        policy_config: PolicyConfig,
        engine_config: EngineConfig,
        scheduler_config: SchedulerConfig,
        notifier: mpsc::Sender<OutboundMessage>,
    ) -> Self {
        Self {
            store,
            registry,
            policy,
            backend,
            bank,
            policy_config,
            engine_config,
            scheduler_config,
            notifier,
        }
    }

    /// Run both sweeps on their configured timers. Never returns; spawn it.
    pub async fn run(&self) {
        let mut tx_tick = tokio::time::interval(self.scheduler_config.tx_sweep_interval());
        let mut acct_tick = tokio::time::interval(self.scheduler_config.accounting_interval());
        tx_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        acct_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval's first tick fires immediately; swallow it so the
        // first sweep happens one full period after startup.
        tx_tick.tick().await;
        acct_tick.tick().await;

        loop {
            tokio::select! {
                _ = tx_tick.tick() => {
                    self.sweep_transactions().await;
                }
                _ = acct_tick.tick() => {
                    self.sweep_accounting().await;
                }
            }
        }
    }

    /// One pass over every open transaction.
    pub async fn sweep_transactions(&self) -> SweepSummary {
        let mut summary = SweepSummary::default();

        if let Err(err) = self.rpc(self.backend.sync()).await {
            tracing::warn!(%err, "wallet sync failed; deferring sweep to next tick");
            return summary;
        }

        let now = Utc::now();
        for (tx_id, snap) in self.registry.snapshot() {
            let Some(cell) = self.store.get(snap.account) else {
                tracing::error!(%tx_id, account = %snap.account, "registry entry without account");
                continue;
            };
            let mut account = cell.lock().await;
            // Re-read under the lock: the entry may have settled since the
            // snapshot. Finding it gone is the idempotency path.
            let Some(record) = self.registry.get(&tx_id) else {
                summary.skipped += 1;
                continue;
            };

            let report = match self.rpc(self.backend.query_status(&tx_id)).await {
                Ok(report) => {
                    if report.kind != record.kind {
                        tracing::warn!(
                            %tx_id, ledger = %record.kind, backend = %report.kind,
                            "backend reports a different operation kind"
                        );
                    }
                    Some(report)
                }
                Err(err) => {
                    tracing::debug!(%tx_id, %err, "status query failed; will retry next tick");
                    None
                }
            };

            match report {
                Some(report) if report.status == TxStatus::Confirmed => {
                    if self
                        .settle(&mut account, &record, &tx_id, Settle::Confirm(report.amount))
                        .is_ok()
                    {
                        summary.confirmed += 1;
                        self.notify(record.account, text::confirmed(record.kind, record.amount))
                            .await;
                    }
                }
                Some(report) if report.status == TxStatus::Canceled => {
                    if self
                        .settle(&mut account, &record, &tx_id, Settle::Cancel)
                        .is_ok()
                    {
                        summary.canceled += 1;
                        self.notify(record.account, text::canceled(record.kind, record.amount))
                            .await;
                    }
                }
                other => {
                    // Still confirming, or the backend was unreachable.
                    // Either way an over-age transaction is force-canceled
                    // so the reservation comes back.
                    if record.age(now) > self.policy_config.max_age(record.kind) {
                        self.release_quietly(&tx_id).await;
                        if self
                            .settle(&mut account, &record, &tx_id, Settle::Cancel)
                            .is_ok()
                        {
                            summary.stale += 1;
                            self.notify(
                                record.account,
                                text::stale_canceled(record.kind, record.amount),
                            )
                            .await;
                        }
                    } else if other.is_none() {
                        summary.skipped += 1;
                    }
                }
            }
        }

        tracing::debug!(?summary, "transaction sweep complete");
        summary
    }

    fn settle(
        &self,
        account: &mut UserAccount,
        record: &TxRecord,
        tx_id: &TxId,
        outcome: Settle,
    ) -> Result<()> {
        let result = match (record.kind, outcome) {
            (TxKind::Deposit, Settle::Confirm(amount)) => {
                self.policy.confirm_deposit_tx(account, amount, tx_id)
            }
            (TxKind::Withdraw, Settle::Confirm(amount)) => {
                self.policy.confirm_withdraw_tx(account, amount, tx_id)
            }
            (TxKind::Deposit, Settle::Cancel) => {
                self.policy.cancel_deposit_tx(account, record.amount, tx_id)
            }
            (TxKind::Withdraw, Settle::Cancel) => {
                self.policy.cancel_withdraw_tx(account, record.amount, tx_id)
            }
        };
        if let Err(err) = &result {
            tracing::error!(%tx_id, %err, "settlement bookkeeping failed");
        }
        result
    }

    /// One pass over every account: custodial fees, then eviction.
    pub async fn sweep_accounting(&self) -> AccountingSummary {
        let mut summary = AccountingSummary::default();
        let now = Utc::now();
        let cfg = &self.policy_config;
        let mut evictable = Vec::new();

        for id in self.store.ids() {
            let Some(cell) = self.store.get(id) else {
                continue;
            };
            let mut account = cell.lock().await;

            let free = account.balance.spendable + account.balance.awaiting_confirmation;
            if free > cfg.max_free_balance {
                let since = *account.over_limit_since.get_or_insert(now);
                let elapsed = now - since;
                if elapsed >= cfg.billing_period() {
                    // Fees come out of spendable alone; if it cannot cover
                    // the fee the charge waits for a later sweep.
                    if account.balance.spendable >= cfg.monthly_fee
                        && account.adjust(&BalanceDelta::fee(cfg.monthly_fee)).is_ok()
                    {
                        self.bank.charge(cfg.monthly_fee);
                        account.over_limit_since = Some(now);
                        account.fee_warned = false;
                        summary.charged += 1;
                        self.notify(id, text::fee_charged(cfg.monthly_fee)).await;
                    } else {
                        tracing::debug!(%id, "fee deferred: spendable below fee");
                    }
                } else if elapsed >= cfg.fee_warning() && !account.fee_warned {
                    account.fee_warned = true;
                    summary.warned += 1;
                    self.notify(id, text::fee_warning(free, cfg.max_free_balance, cfg.monthly_fee))
                        .await;
                }
            } else {
                account.over_limit_since = None;
                account.fee_warned = false;
            }

            if account.is_evictable(now, cfg.inactivity_window()) {
                evictable.push(id);
            }
        }

        // Second pass with no cell handle held: eviction backs off from any
        // account something else is still using.
        for id in evictable {
            let window = cfg.inactivity_window();
            if self
                .store
                .remove_if_idle(id, |account| account.is_evictable(now, window))
            {
                summary.evicted += 1;
                tracing::info!(%id, "destroyed inactive empty account");
            }
        }

        tracing::debug!(?summary, "accounting sweep complete");
        summary
    }

    /// Verify the custody conservation invariant. Only meaningful in a
    /// quiescent state (no negotiation mid-flight); intended for operators
    /// and tests rather than the timer loop.
    pub async fn audit_custody(&self) -> Result<()> {
        let mut total = Decimal::ZERO;
        for id in self.store.ids() {
            if let Some(cell) = self.store.get(id) {
                total += cell.lock().await.balance.total();
            }
        }
        let result = self.bank.audit(total);
        if let Err(err) = &result {
            tracing::error!(%err, "custody audit failed");
        }
        result
    }

    async fn notify(&self, account: AccountId, message: String) {
        if self
            .notifier
            .send(OutboundMessage::private(account, message))
            .await
            .is_err()
        {
            tracing::warn!(%account, "notification channel closed; dropping notice");
        }
    }

    async fn rpc<T>(
        &self,
        call: impl std::future::Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        with_deadline(self.engine_config.rpc_timeout(), call).await
    }

    async fn release_quietly(&self, tx_id: &TxId) {
        match self.rpc(self.backend.release_lock(tx_id)).await {
            Ok(()) => {}
            Err(err) => {
                tracing::warn!(%tx_id, %err, "release_lock for stale transaction failed");
            }
        }
    }
}

/// Terminal outcome to apply during the sweep.
#[derive(Debug, Clone, Copy)]
enum Settle {
    Confirm(Decimal),
    Cancel,
}
