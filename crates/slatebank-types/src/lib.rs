//! # slatebank-types
//!
//! Shared types, errors, and configuration for the **slatebank** custodial
//! ledger engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`ChatId`], [`TxId`]
//! - **Balance model**: [`Balance`], [`BalanceDelta`]
//! - **Transaction model**: [`TxKind`], [`TxPhase`], [`TxRecord`], [`TxStatus`], [`TxStatusReport`]
//! - **Slate model**: [`SlateStatus`], [`Slate`], [`SlateInit`]
//! - **Consent model**: [`ConsentRecord`]
//! - **Outbound messages**: [`ChatTarget`], [`OutboundMessage`]
//! - **Configuration**: [`PolicyConfig`], [`EngineConfig`], [`SchedulerConfig`]
//! - **Errors**: [`SlatebankError`] with `SB_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod balance;
pub mod config;
pub mod consent;
pub mod constants;
pub mod error;
pub mod ids;
pub mod message;
pub mod slate;
pub mod transaction;

// Re-export all primary types at crate root for ergonomic imports:
//   use slatebank_types::{Balance, TxRecord, SlatebankError, ...};

pub use balance::*;
pub use config::*;
pub use consent::*;
pub use error::*;
pub use ids::*;
pub use message::*;
pub use slate::*;
pub use transaction::*;

// Constants are accessed via `slatebank_types::constants::FOO`
// (not re-exported to avoid name collisions).
