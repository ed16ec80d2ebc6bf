//! Error types for the slatebank ledger engine.
//!
//! All errors use the `SB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Request / slatepack errors
//! - 2xx: Balance / ledger errors
//! - 3xx: Transaction registry errors
//! - 4xx: Policy errors
//! - 5xx: Wallet backend errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, TxId, TxPhase};

/// Central error enum for all slatebank operations.
#[derive(Debug, Error)]
pub enum SlatebankError {
    // =================================================================
    // Request / Slatepack Errors (1xx)
    // =================================================================
    /// The amount argument could not be parsed or is not positive.
    #[error("SB_ERR_100: Invalid amount: {input:?}")]
    InvalidAmount { input: String },

    /// A command that requires an amount was given none.
    #[error("SB_ERR_101: Missing amount argument")]
    MissingAmount,

    /// A slatepack block was detected but could not be decoded.
    #[error("SB_ERR_102: Malformed slatepack: {reason}")]
    MalformedSlatepack { reason: String },

    // =================================================================
    // Balance / Ledger Errors (2xx)
    // =================================================================
    /// Not enough spendable balance to perform the operation.
    #[error("SB_ERR_200: Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Decimal,
        available: Decimal,
    },

    /// A balance mutation would drive a bucket negative — a protocol
    /// sequencing bug, never silently clamped.
    #[error("SB_ERR_201: Ledger invariant violation: {reason}")]
    InvariantViolation { reason: String },

    /// The account has no ledger record yet.
    #[error("SB_ERR_202: Account not initialized: {0}")]
    NotInitialized(AccountId),

    /// The account already has a ledger record.
    #[error("SB_ERR_203: Account already initialized: {0}")]
    AlreadyInitialized(AccountId),

    // =================================================================
    // Transaction Registry Errors (3xx)
    // =================================================================
    /// A transaction with this id is already registered.
    #[error("SB_ERR_300: Transaction already assigned: {0}")]
    AlreadyAssigned(TxId),

    /// The transaction id is not (or no longer) in the registry.
    #[error("SB_ERR_301: Unknown transaction: {0}")]
    UnknownTransaction(TxId),

    /// The transaction is not in the phase the operation requires.
    #[error("SB_ERR_302: Transaction {tx_id} is {phase}, cannot proceed")]
    WrongPhase { tx_id: TxId, phase: TxPhase },

    // =================================================================
    // Policy Errors (4xx)
    // =================================================================
    /// The personality layer refused the operation.
    #[error("SB_ERR_400: Policy rejection: {reason}")]
    PolicyRejection { reason: String },

    // =================================================================
    // Wallet Backend Errors (5xx)
    // =================================================================
    /// A wallet RPC failed. Never retried within the same protocol round.
    #[error("SB_ERR_500: Wallet backend failure: {reason}")]
    BackendFailure { reason: String },

    /// A wallet RPC exceeded its deadline.
    #[error("SB_ERR_501: Wallet backend timed out after {secs}s")]
    BackendTimeout { secs: u64 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SB_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("SB_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (disk, network).
    #[error("SB_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SlatebankError>;

// Conversion from std::io::Error
impl From<std::io::Error> for SlatebankError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
