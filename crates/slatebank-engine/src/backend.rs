//! The wallet backend capability.
//!
//! Slate construction, finalization, broadcasting, and confirmation tracking
//! all live behind this trait; the engine only sequences calls and keeps the
//! books. Implementations wrap the wallet's owner/foreign RPC APIs.
//!
//! Failure semantics: any error aborts the current protocol round and is
//! surfaced to the user — never retried within the round. Only `sync` and
//! `query_status` are idempotent and safe to retry on a later scheduler
//! tick.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use slatebank_types::{Result, Slate, SlateInit, SlatebankError, TxId, TxStatusReport};

/// Opaque RPC capability of the custodial wallet.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    /// Rescan the wallet against the chain. Idempotent.
    async fn sync(&self) -> Result<()>;

    /// Whether the wallet can serve requests right now.
    async fn is_ready(&self) -> Result<()>;

    /// Open an outbound payment (withdrawal, first round). Locks outputs
    /// backend-side until finalized or released.
    async fn send(&self, amount: Decimal, dest: Option<&str>) -> Result<SlateInit>;

    /// Open an invoice (deposit, first round).
    async fn invoice(&self, amount: Decimal, dest: Option<&str>) -> Result<SlateInit>;

    /// Accept an unsolicited inbound payment slate (deposit, SRS shape).
    async fn receive(&self, slatepack: &str) -> Result<SlateInit>;

    /// Finalize and broadcast a returned slate; the result is the finalized
    /// slatepack.
    async fn finalize(&self, slatepack: &str) -> Result<String>;

    /// Release a backend-side reservation for an aborted or stale
    /// transaction.
    async fn release_lock(&self, tx_id: &TxId) -> Result<()>;

    /// Decode a slatepack into its header. The payload stays opaque.
    async fn decode_slatepack(&self, slatepack: &str) -> Result<Slate>;

    /// Report the confirmation state of a transaction. Idempotent.
    async fn query_status(&self, tx_id: &TxId) -> Result<TxStatusReport>;
}

/// Apply the standard RPC deadline to a backend call.
///
/// # Errors
/// Returns [`SlatebankError::BackendTimeout`] if the deadline elapses, else
/// whatever the call itself produced.
pub async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T>> + Send,
) -> Result<T> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(SlatebankError::BackendTimeout {
            secs: deadline.as_secs(),
        }),
    }
}
