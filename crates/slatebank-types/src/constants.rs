//! System-wide constants for the slatebank ledger engine.

/// Default free custodial balance ceiling before fees apply, in whole coins.
pub const DEFAULT_MAX_FREE_BALANCE: i64 = 10;

/// Default monthly custodial fee, in whole coins.
pub const DEFAULT_MONTHLY_FEE: i64 = 1;

/// Default delay before an over-ceiling account is warned (25 days).
pub const DEFAULT_FEE_WARNING_SECS: u64 = 2_160_000;

/// Default billing period after which the fee is actually charged
/// (one mean synodic month).
pub const DEFAULT_BILLING_PERIOD_SECS: u64 = 2_629_800;

/// Default maximum age of an unanswered deposit before force-cancel (1 day).
pub const DEFAULT_MAX_DEPOSIT_AGE_SECS: u64 = 86_400;

/// Default maximum age of an unanswered withdrawal before force-cancel (1 day).
pub const DEFAULT_MAX_WITHDRAWAL_AGE_SECS: u64 = 86_400;

/// Default inactivity window after which a zero-balance account is destroyed.
pub const DEFAULT_INACTIVITY_WINDOW_SECS: u64 = 3_600;

/// Default timeout applied to every wallet backend RPC.
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 30;

/// Default interval between transaction-status sweeps.
pub const DEFAULT_TX_SWEEP_SECS: u64 = 600;

/// Default interval between accounting sweeps.
pub const DEFAULT_ACCOUNTING_SWEEP_SECS: u64 = 36_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "slatebank";
