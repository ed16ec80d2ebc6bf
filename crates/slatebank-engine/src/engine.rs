//! The slate-negotiation protocol engine.
//!
//! Two initiation shapes exist per operation, mirroring who produces the
//! first cryptographic artifact:
//!
//! - **RSR** — the engine initiates on an explicit command: it asks the
//!   backend for an outbound slate (`send` for withdrawals, `invoice` for
//!   deposits), hands it to the user, and waits for the returned slate.
//! - **SRS** — the user initiates by pasting a slate unprompted. `S1` is an
//!   unsolicited deposit offer, `S2`/`I2` are second-round responses to
//!   slates we issued, `I1` is an invoice aimed at us and is always refused.
//!
//! The negotiation only ever reaches the finalizing stage; confirmed and
//! canceled are reached exclusively through the reconciliation sweep.
//!
//! Failure discipline: a backend failure aborts the round before anything
//! was committed; a policy failure after a backend reservation triggers a
//! best-effort compensating `release_lock` so the backend never holds a
//! reservation the ledger does not reflect.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use slatebank_ledger::{AccountStore, TransactionRegistry, UserAccount};
use slatebank_policy::{AssignReply, Policy, SpendApproval, WithdrawRequest};
use slatebank_types::{
    AccountId, ChatId, EngineConfig, OutboundMessage, Slate, SlateStatus, SlatebankError, TxId,
    TxKind,
};

use crate::backend::{WalletBackend, with_deadline};
use crate::command::{Command, parse_command};
use crate::pipeline::{RequestPipeline, Verdict};
use crate::slatepack::{contains_slatepack, extract_slatepack};
use crate::text;

/// Drives the per-transaction state machine and produces the replies to
/// send. One instance serves all accounts; per-account mutual exclusion
/// comes from the store's entry locks.
pub struct ProtocolEngine {
    store: Arc<AccountStore>,
    registry: Arc<TransactionRegistry>,
    policy: Arc<dyn Policy>,
    backend: Arc<dyn WalletBackend>,
    pipeline: RequestPipeline,
    config: EngineConfig,
}

impl ProtocolEngine {
    #[must_use]
    pub fn new(
        store: Arc<AccountStore>,
        registry: Arc<TransactionRegistry>,
        policy: Arc<dyn Policy>,
        backend: Arc<dyn WalletBackend>,
        config: EngineConfig,
    ) -> Self {
        let pipeline =
            RequestPipeline::new(Arc::clone(&policy), Arc::clone(&backend), config.clone());
        Self {
            store,
            registry,
            policy,
            backend,
            pipeline,
            config,
        }
    }

    /// Process one inbound message and produce the replies.
    ///
    /// Commands and slatepack-bearing texts are handled; anything else is
    /// silently ignored (the transport sees plenty of unrelated chatter).
    pub async fn handle_message(
        &self,
        account_id: AccountId,
        chat: ChatId,
        message: &str,
    ) -> Vec<OutboundMessage> {
        match parse_command(message) {
            Some(Ok(command)) => self.handle_command(account_id, chat, command).await,
            Some(Err(err)) => vec![OutboundMessage::origin(chat, usage_reply(&err))],
            None if contains_slatepack(message) => {
                self.handle_slatepack(account_id, chat, message).await
            }
            None => Vec::new(),
        }
    }

    async fn handle_command(
        &self,
        account_id: AccountId,
        chat: ChatId,
        command: Command,
    ) -> Vec<OutboundMessage> {
        let cell = self.store.open(account_id);
        let mut account = cell.lock().await;
        account.touch(Utc::now());

        match command {
            Command::Balance => match self.pipeline.basic(account_id) {
                Verdict::Proceed => {
                    vec![OutboundMessage::origin(chat, text::balance(&account.balance))]
                }
                verdict => verdict_replies(chat, verdict),
            },
            Command::Approve => match self.pipeline.basic(account_id) {
                Verdict::Proceed => {
                    let gate = self.policy.should_see_eula(&account);
                    if gate.required {
                        self.policy.approved_eula(&mut account, &gate.version);
                        vec![OutboundMessage::origin(chat, text::CONSENT_RECORDED)]
                    } else {
                        vec![OutboundMessage::origin(chat, text::NOTHING_TO_APPROVE)]
                    }
                }
                verdict => verdict_replies(chat, verdict),
            },
            Command::Deny => match self.pipeline.basic(account_id) {
                Verdict::Proceed => {
                    let gate = self.policy.should_see_eula(&account);
                    if gate.required {
                        self.policy.denied_eula(&mut account, &gate.version);
                        vec![OutboundMessage::origin(chat, text::CONSENT_DENIED)]
                    } else {
                        vec![OutboundMessage::origin(chat, text::NOTHING_TO_APPROVE)]
                    }
                }
                verdict => verdict_replies(chat, verdict),
            },
            Command::Deposit(amount) => {
                match self.pipeline.financial(account_id, &account).await {
                    Verdict::Proceed => {
                        self.deposit_rsr(&mut account, account_id, chat, amount).await
                    }
                    verdict => verdict_replies(chat, verdict),
                }
            }
            Command::Withdraw(request) => {
                match self.pipeline.financial(account_id, &account).await {
                    Verdict::Proceed => {
                        self.withdraw_rsr(&mut account, account_id, chat, request).await
                    }
                    verdict => verdict_replies(chat, verdict),
                }
            }
        }
    }

    /// Deposit, RSR shape: `can_deposit → invoice → assign_deposit_tx`.
    async fn deposit_rsr(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        chat: ChatId,
        amount: Decimal,
    ) -> Vec<OutboundMessage> {
        let approval = self.policy.can_deposit(account, amount);
        if !approval.allowed {
            return vec![OutboundMessage::origin(
                chat,
                rejection_reply(Some(amount), &approval),
            )];
        }
        let approved = approval.approved.unwrap_or(amount);

        let init = match self.rpc(self.backend.invoice(approved, None)).await {
            Ok(init) => init,
            Err(err) => return vec![OutboundMessage::origin(chat, user_facing(&err))],
        };

        match self
            .policy
            .assign_deposit_tx(account, account_id, approved, &init.tx_id)
        {
            Ok(reply) => self.assign_messages(
                account_id,
                chat,
                reply,
                &init.slatepack,
                text::DEPOSIT_INSTRUCTIONS,
            ),
            Err(err) => {
                self.release_quietly(&init.tx_id).await;
                vec![OutboundMessage::origin(chat, user_facing(&err))]
            }
        }
    }

    /// Withdrawal, RSR shape: `can_withdraw → send → assign_withdraw_tx`.
    async fn withdraw_rsr(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        chat: ChatId,
        request: WithdrawRequest,
    ) -> Vec<OutboundMessage> {
        let requested = match request {
            WithdrawRequest::Amount(amount) => Some(amount),
            WithdrawRequest::Max => None,
        };
        let approval = self.policy.can_withdraw(account, request);
        if !approval.allowed {
            return vec![OutboundMessage::origin(
                chat,
                rejection_reply(requested, &approval),
            )];
        }
        let Some(spending) = approval.approved.or(requested) else {
            return vec![OutboundMessage::origin(
                chat,
                text::generic_rejection(requested, None),
            )];
        };

        let init = match self.rpc(self.backend.send(spending, None)).await {
            Ok(init) => init,
            Err(err) => return vec![OutboundMessage::origin(chat, user_facing(&err))],
        };

        match self
            .policy
            .assign_withdraw_tx(account, account_id, spending, &init.tx_id)
        {
            Ok(reply) => self.assign_messages(
                account_id,
                chat,
                reply,
                &init.slatepack,
                text::WITHDRAW_INSTRUCTIONS,
            ),
            Err(err) => {
                self.release_quietly(&init.tx_id).await;
                vec![OutboundMessage::origin(chat, user_facing(&err))]
            }
        }
    }

    /// Inbound slatepack, SRS shape: decode and dispatch on the status code.
    async fn handle_slatepack(
        &self,
        account_id: AccountId,
        chat: ChatId,
        message: &str,
    ) -> Vec<OutboundMessage> {
        let cell = self.store.open(account_id);
        let mut account = cell.lock().await;
        account.touch(Utc::now());

        match self.pipeline.financial(account_id, &account).await {
            Verdict::Proceed => {}
            verdict => return verdict_replies(chat, verdict),
        }

        let Some(pack) = extract_slatepack(message) else {
            return vec![OutboundMessage::origin(chat, text::MALFORMED_SLATEPACK)];
        };
        let slate = match self.rpc(self.backend.decode_slatepack(&pack)).await {
            Ok(slate) => slate,
            Err(err) => return vec![OutboundMessage::origin(chat, user_facing(&err))],
        };

        match slate.status {
            SlateStatus::I1 => {
                // Unsolicited invoice: permanently unsupported, no state
                // mutation of any kind.
                vec![OutboundMessage::origin(chat, text::INVOICE_REJECTED)]
            }
            SlateStatus::S1 => {
                self.deposit_srs(&mut account, account_id, chat, &pack, &slate)
                    .await
            }
            SlateStatus::S2 => {
                self.finalize_round(&mut account, account_id, chat, &pack, &slate, TxKind::Withdraw)
                    .await
            }
            SlateStatus::I2 => {
                self.finalize_round(&mut account, account_id, chat, &pack, &slate, TxKind::Deposit)
                    .await
            }
        }
    }

    /// Deposit, SRS shape: the user opened with an `S1` slate, so the
    /// deposit-approval path re-enters through `receive` instead of
    /// `invoice`. After our response the user finalizes wallet-side; the
    /// reservation waits in `awaiting_finalization` for the sweep.
    async fn deposit_srs(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        chat: ChatId,
        pack: &str,
        slate: &Slate,
    ) -> Vec<OutboundMessage> {
        let approval = self.policy.can_deposit(account, slate.amount);
        if !approval.allowed {
            return vec![OutboundMessage::origin(
                chat,
                rejection_reply(Some(slate.amount), &approval),
            )];
        }
        let approved = approval.approved.unwrap_or(slate.amount);

        let init = match self.rpc(self.backend.receive(pack)).await {
            Ok(init) => init,
            Err(err) => return vec![OutboundMessage::origin(chat, user_facing(&err))],
        };

        match self
            .policy
            .assign_deposit_tx(account, account_id, approved, &init.tx_id)
        {
            Ok(reply) => self.assign_messages(
                account_id,
                chat,
                reply,
                &init.slatepack,
                text::RECEIVE_INSTRUCTIONS,
            ),
            Err(err) => {
                self.release_quietly(&init.tx_id).await;
                vec![OutboundMessage::origin(chat, user_facing(&err))]
            }
        }
    }

    /// Second round of an engine-initiated negotiation (`S2` or `I2`):
    /// `should_finalize → finalize → finalize_*_tx`.
    async fn finalize_round(
        &self,
        account: &mut UserAccount,
        account_id: AccountId,
        chat: ChatId,
        pack: &str,
        slate: &Slate,
        kind: TxKind,
    ) -> Vec<OutboundMessage> {
        // The slate must reference an open transaction of the right kind
        // owned by the sender; anything else gets the same generic reply.
        match self.registry.owner_of(&slate.id) {
            Ok(owner) if owner == account_id => {}
            Ok(_) | Err(_) => {
                return vec![OutboundMessage::origin(chat, text::UNKNOWN_REQUEST)];
            }
        }
        let gate = match kind {
            TxKind::Deposit => self.policy.should_finalize_deposit_tx(&slate.id),
            TxKind::Withdraw => self.policy.should_finalize_withdraw_tx(&slate.id),
        };
        if let Err(err) = gate {
            return vec![OutboundMessage::origin(chat, user_facing(&err))];
        }

        if let Err(err) = self.rpc(self.backend.finalize(pack)).await {
            return vec![OutboundMessage::origin(chat, user_facing(&err))];
        }

        let outcome = match kind {
            TxKind::Deposit => self.policy.finalize_deposit_tx(account, &slate.id),
            TxKind::Withdraw => self.policy.finalize_withdraw_tx(account, &slate.id),
        };
        match outcome {
            Ok(message) => {
                let default = match kind {
                    TxKind::Deposit => text::DEPOSIT_FINALIZED,
                    TxKind::Withdraw => text::WITHDRAW_FINALIZED,
                };
                vec![OutboundMessage::origin(
                    chat,
                    message.unwrap_or_else(|| default.to_string()),
                )]
            }
            Err(err) => {
                // The slate is already finalized and broadcast; there is no
                // reservation left to release. This means the books and the
                // chain disagree — surfaced for operators, not retried.
                tracing::error!(tx_id = %slate.id, %err, "bookkeeping failed after broadcast");
                vec![OutboundMessage::origin(chat, user_facing(&err))]
            }
        }
    }

    /// The standard three-message emission after a successful assignment:
    /// instructions (origin), the slate itself (private), and an optional
    /// epilogue (origin). The policy may override any of the three; the
    /// `{slatepack}` placeholder is substituted in each.
    fn assign_messages(
        &self,
        account_id: AccountId,
        chat: ChatId,
        reply: AssignReply,
        slatepack: &str,
        default_instructions: &str,
    ) -> Vec<OutboundMessage> {
        let instructions = reply
            .instructions
            .unwrap_or_else(|| default_instructions.to_string());
        let slate_text = reply.slate_text.unwrap_or_else(|| slatepack.to_string());

        let mut out = vec![
            OutboundMessage::origin(chat, text::substitute_slatepack(&instructions, slatepack)),
            OutboundMessage::private(account_id, text::substitute_slatepack(&slate_text, slatepack)),
        ];
        if let Some(epilogue) = reply.epilogue {
            out.push(OutboundMessage::origin(
                chat,
                text::substitute_slatepack(&epilogue, slatepack),
            ));
        }
        out
    }

    async fn rpc<T>(
        &self,
        call: impl std::future::Future<Output = slatebank_types::Result<T>> + Send,
    ) -> slatebank_types::Result<T> {
        with_deadline(self.config.rpc_timeout(), call).await
    }

    /// Best-effort compensating release of a backend reservation. Logged,
    /// never re-thrown.
    async fn release_quietly(&self, tx_id: &TxId) {
        match self.rpc(self.backend.release_lock(tx_id)).await {
            Ok(()) => {}
            Err(err) => {
                tracing::warn!(%tx_id, %err, "compensating release_lock failed");
            }
        }
    }
}

/// Reply for a rejected spend: the policy's reason if it gave one, else a
/// generic message citing the amounts we know.
fn rejection_reply(requested: Option<Decimal>, approval: &SpendApproval) -> String {
    approval
        .reason
        .clone()
        .unwrap_or_else(|| text::generic_rejection(requested, approval.approved))
}

fn verdict_replies(chat: ChatId, verdict: Verdict) -> Vec<OutboundMessage> {
    match verdict {
        Verdict::Proceed | Verdict::Drop => Vec::new(),
        Verdict::Reply(reply) => vec![OutboundMessage::origin(chat, reply)],
    }
}

fn usage_reply(err: &SlatebankError) -> String {
    match err {
        SlatebankError::MissingAmount => text::DEPOSIT_USAGE.to_string(),
        SlatebankError::InvalidAmount { input } => {
            format!("{input:?} is not a valid amount.")
        }
        other => user_facing(other),
    }
}

/// Map an internal error onto the single user-visible reply for the round.
fn user_facing(err: &SlatebankError) -> String {
    match err {
        SlatebankError::PolicyRejection { reason } => reason.clone(),
        SlatebankError::BackendFailure { reason } => format!("Wallet error: {reason}"),
        SlatebankError::BackendTimeout { .. } => text::WALLET_NOT_READY.to_string(),
        SlatebankError::MalformedSlatepack { .. } => text::MALFORMED_SLATEPACK.to_string(),
        SlatebankError::UnknownTransaction(_)
        | SlatebankError::AlreadyAssigned(_)
        | SlatebankError::WrongPhase { .. } => text::UNKNOWN_REQUEST.to_string(),
        _ => "Something went wrong on our side; the operation was aborted.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_misuse_reads_as_unknown_request() {
        for err in [
            SlatebankError::UnknownTransaction(TxId::new("x")),
            SlatebankError::AlreadyAssigned(TxId::new("x")),
        ] {
            assert_eq!(user_facing(&err), text::UNKNOWN_REQUEST);
        }
    }

    #[test]
    fn policy_reason_passes_through() {
        let err = SlatebankError::PolicyRejection {
            reason: "not today".into(),
        };
        assert_eq!(user_facing(&err), "not today");
    }

    #[test]
    fn backend_failure_is_user_visible() {
        let err = SlatebankError::BackendFailure {
            reason: "no such output".into(),
        };
        assert!(user_facing(&err).contains("no such output"));
    }

    #[test]
    fn invariant_violation_stays_generic() {
        let err = SlatebankError::InvariantViolation {
            reason: "spendable would go negative".into(),
        };
        let reply = user_facing(&err);
        assert!(!reply.contains("negative"), "internal detail leaked: {reply}");
    }

    #[test]
    fn missing_amount_gets_usage() {
        assert_eq!(usage_reply(&SlatebankError::MissingAmount), text::DEPOSIT_USAGE);
    }
}
