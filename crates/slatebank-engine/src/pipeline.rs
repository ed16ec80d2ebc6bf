//! The inbound request validation pipeline.
//!
//! Cross-cutting checks run as an explicit, ordered sequence with early
//! exit — not as nested handler wrappers. The order is fixed:
//!
//! 1. **ignore-policy** — drop or refuse vetoed senders before anything else
//! 2. **wallet-ready** — no point negotiating against a dead wallet
//! 3. **consent** — financial operations require the current EULA version
//!
//! Argument parsing happens upstream in [`crate::command`]; the pipeline
//! only sees well-formed requests.

use std::sync::Arc;

use slatebank_ledger::UserAccount;
use slatebank_policy::Policy;
use slatebank_types::{AccountId, EngineConfig};

use crate::backend::WalletBackend;
use crate::text;

/// Outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// All gates passed.
    Proceed,
    /// Drop the message with no reply.
    Drop,
    /// Refuse with a single reply.
    Reply(String),
}

/// Ordered validation gates shared by every financial entry point.
pub struct RequestPipeline {
    policy: Arc<dyn Policy>,
    backend: Arc<dyn WalletBackend>,
    config: EngineConfig,
}

impl RequestPipeline {
    #[must_use]
    pub fn new(
        policy: Arc<dyn Policy>,
        backend: Arc<dyn WalletBackend>,
        config: EngineConfig,
    ) -> Self {
        Self {
            policy,
            backend,
            config,
        }
    }

    /// Gate 1 only — for commands with no financial effect.
    #[must_use]
    pub fn basic(&self, account_id: AccountId) -> Verdict {
        let verdict = self.policy.should_ignore(account_id);
        if verdict.ignore {
            return match verdict.reason {
                Some(reason) => Verdict::Reply(reason),
                None => Verdict::Drop,
            };
        }
        Verdict::Proceed
    }

    /// All three gates — for deposits, withdrawals, and inbound slates.
    pub async fn financial(&self, account_id: AccountId, account: &UserAccount) -> Verdict {
        match self.basic(account_id) {
            Verdict::Proceed => {}
            blocked => return blocked,
        }

        let ready = tokio::time::timeout(self.config.rpc_timeout(), self.backend.is_ready()).await;
        match ready {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(%err, "wallet not ready");
                return Verdict::Reply(text::WALLET_NOT_READY.to_string());
            }
            Err(_) => {
                tracing::warn!("wallet readiness check timed out");
                return Verdict::Reply(text::WALLET_NOT_READY.to_string());
            }
        }

        let gate = self.policy.should_see_eula(account);
        if gate.required {
            let prompt = gate.prompt.unwrap_or_default();
            return Verdict::Reply(format!("{prompt}\n\n{}", text::EULA_SUFFIX));
        }

        Verdict::Proceed
    }
}
