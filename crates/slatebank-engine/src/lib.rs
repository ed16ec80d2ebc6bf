//! # slatebank-engine
//!
//! **Protocol plane**: the slate-negotiation state machine that turns chat
//! commands and pasted slatepacks into wallet RPCs and ledger mutations, and
//! the reconciliation scheduler that converges the ledger with the wallet's
//! view of the chain.
//!
//! ## Architecture
//!
//! ```text
//! chat transport → ProtocolEngine.handle_message()
//!                    ├─ RequestPipeline    (ignore → wallet-ready → consent)
//!                    ├─ Policy             (authorize, mutate ledger/registry)
//!                    └─ WalletBackend      (slates, finalize, release locks)
//!
//! timers → ReconciliationScheduler
//!            ├─ transaction sweep  (confirm / cancel / stale-cancel)
//!            └─ accounting sweep   (fee warn+charge, eviction)
//! ```
//!
//! The negotiation itself only ever reaches `finalizing`; terminal outcomes
//! (confirmed, canceled) come exclusively from the scheduler consulting
//! backend ground truth.

pub mod backend;
pub mod command;
pub mod engine;
pub mod pipeline;
pub mod reconcile;
pub mod slatepack;
pub mod text;

pub use backend::WalletBackend;
pub use command::Command;
pub use engine::ProtocolEngine;
pub use pipeline::{RequestPipeline, Verdict};
pub use reconcile::{AccountingSummary, ReconciliationScheduler, SweepSummary};
