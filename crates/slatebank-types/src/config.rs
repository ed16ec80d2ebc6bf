//! Configuration types, loaded once at startup and read-only afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Result, SlatebankError, TxKind, constants};

/// Thresholds and policy knobs consulted by the personality layer and the
/// reconciliation sweeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Free custodial balance ceiling (`spendable + awaiting_confirmation`);
    /// above it the fee cycle starts.
    pub max_free_balance: Decimal,
    /// Monthly custodial fee charged to over-ceiling accounts.
    pub monthly_fee: Decimal,
    /// How long an account may sit over the ceiling before the warning.
    pub fee_warning_secs: u64,
    /// How long over the ceiling before the fee is actually charged.
    pub billing_period_secs: u64,
    /// Maximum age of an unanswered deposit before force-cancel.
    pub max_deposit_age_secs: u64,
    /// Maximum age of an unanswered withdrawal before force-cancel.
    pub max_withdrawal_age_secs: u64,
    /// Inactivity window after which an empty account is destroyed.
    pub inactivity_window_secs: u64,
    /// The terms-of-service text shown to users.
    pub eula_text: String,
    /// The version tag consent is tracked against.
    pub eula_version: String,
}

impl PolicyConfig {
    /// Maximum age for a transaction of the given kind.
    #[must_use]
    pub fn max_age(&self, kind: TxKind) -> chrono::Duration {
        let secs = match kind {
            TxKind::Deposit => self.max_deposit_age_secs,
            TxKind::Withdraw => self.max_withdrawal_age_secs,
        };
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn fee_warning(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.fee_warning_secs).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn billing_period(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.billing_period_secs).unwrap_or(i64::MAX))
    }

    #[must_use]
    pub fn inactivity_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.inactivity_window_secs).unwrap_or(i64::MAX))
    }

    /// Validate startup configuration.
    ///
    /// # Errors
    /// Returns [`SlatebankError::Configuration`] on nonsensical values.
    pub fn validate(&self) -> Result<()> {
        if self.max_free_balance.is_sign_negative() {
            return Err(SlatebankError::Configuration(
                "max_free_balance must be non-negative".into(),
            ));
        }
        if self.monthly_fee.is_sign_negative() {
            return Err(SlatebankError::Configuration(
                "monthly_fee must be non-negative".into(),
            ));
        }
        if self.fee_warning_secs >= self.billing_period_secs {
            return Err(SlatebankError::Configuration(
                "fee_warning_secs must be shorter than billing_period_secs".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_free_balance: Decimal::new(constants::DEFAULT_MAX_FREE_BALANCE, 0),
            monthly_fee: Decimal::new(constants::DEFAULT_MONTHLY_FEE, 0),
            fee_warning_secs: constants::DEFAULT_FEE_WARNING_SECS,
            billing_period_secs: constants::DEFAULT_BILLING_PERIOD_SECS,
            max_deposit_age_secs: constants::DEFAULT_MAX_DEPOSIT_AGE_SECS,
            max_withdrawal_age_secs: constants::DEFAULT_MAX_WITHDRAWAL_AGE_SECS,
            inactivity_window_secs: constants::DEFAULT_INACTIVITY_WINDOW_SECS,
            eula_text: String::new(),
            eula_version: String::new(),
        }
    }
}

/// Protocol engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Timeout applied to every wallet backend RPC.
    pub rpc_timeout_secs: u64,
}

impl EngineConfig {
    #[must_use]
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rpc_timeout_secs: constants::DEFAULT_RPC_TIMEOUT_SECS,
        }
    }
}

/// Reconciliation scheduler timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between transaction-status sweeps.
    pub tx_sweep_secs: u64,
    /// Interval between accounting sweeps.
    pub accounting_sweep_secs: u64,
}

impl SchedulerConfig {
    #[must_use]
    pub fn tx_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.tx_sweep_secs)
    }

    #[must_use]
    pub fn accounting_interval(&self) -> Duration {
        Duration::from_secs(self.accounting_sweep_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tx_sweep_secs: constants::DEFAULT_TX_SWEEP_SECS,
            accounting_sweep_secs: constants::DEFAULT_ACCOUNTING_SWEEP_SECS,
        }
    }
}
