//! Standard reply texts.
//!
//! The personality may override the three assign-stage messages; everything
//! else is fixed. Templates carry a `{slatepack}` placeholder substituted at
//! emission time.

use rust_decimal::Decimal;
use slatebank_types::Balance;

pub const DEPOSIT_USAGE: &str =
    "Usage: /deposit <amount> — or just paste a slatepack to deposit directly.";

pub const WITHDRAW_USAGE: &str = "Usage: /withdraw <amount|max>";

pub const WALLET_NOT_READY: &str =
    "The wallet is not available right now. Please try again in a few minutes.";

pub const EULA_SUFFIX: &str = "Reply /approve to accept or /deny to refuse.";

pub const CONSENT_RECORDED: &str = "Thanks, your approval has been recorded.";

pub const CONSENT_DENIED: &str =
    "Understood. You can approve later with /approve if you change your mind.";

pub const NOTHING_TO_APPROVE: &str = "There is nothing awaiting your approval.";

pub const DEPOSIT_INSTRUCTIONS: &str = "I sent you a deposit invoice in a private message. \
     Open it in your wallet, sign it, and paste the response back here.";

pub const WITHDRAW_INSTRUCTIONS: &str = "I sent you a withdrawal slate in a private message. \
     Open it in your wallet, sign it, and paste the response back here.";

pub const RECEIVE_INSTRUCTIONS: &str = "Deposit offer accepted — my response is in your private \
     messages. Finalize it in your wallet to complete the deposit.";

pub const DEPOSIT_FINALIZED: &str =
    "Deposit finalized and broadcast. Your funds will become spendable once confirmed.";

pub const WITHDRAW_FINALIZED: &str =
    "Withdrawal finalized and broadcast. The coins are on their way.";

pub const INVOICE_REJECTED: &str = "We do not pay invoices.";

pub const UNKNOWN_REQUEST: &str =
    "This slatepack does not match any open request of yours, or the request expired.";

pub const MALFORMED_SLATEPACK: &str =
    "That looks like a slatepack, but it could not be decoded. Please paste the full block.";

/// Substitute the `{slatepack}` placeholder if the template carries one.
#[must_use]
pub fn substitute_slatepack(template: &str, slatepack: &str) -> String {
    template.replace("{slatepack}", slatepack)
}

/// The `/balance` reply.
#[must_use]
pub fn balance(b: &Balance) -> String {
    format!(
        "Spendable: {}\nAwaiting confirmation: {}\nAwaiting finalization: {}\nLocked: {}",
        b.spendable, b.awaiting_confirmation, b.awaiting_finalization, b.locked
    )
}

/// Generic rejection when the policy gave no reason of its own.
#[must_use]
pub fn generic_rejection(requested: Option<Decimal>, approved: Option<Decimal>) -> String {
    match (requested, approved) {
        (Some(requested), Some(approved)) => format!(
            "Your request for {requested} was not approved; the most that would \
             be approved is {approved}."
        ),
        (None, Some(approved)) => {
            format!("Your request was not approved; the most that would be approved is {approved}.")
        }
        (Some(requested), None) => format!("Your request for {requested} was not approved."),
        (None, None) => "Your request was not approved.".to_string(),
    }
}

/// Notification for a stale, force-canceled transaction.
#[must_use]
pub fn stale_canceled(kind: slatebank_types::TxKind, amount: Decimal) -> String {
    format!(
        "Your {kind} of {amount} went unanswered for too long and has been \
         canceled. The reserved funds were released."
    )
}

/// Notification for a backend-confirmed transaction.
#[must_use]
pub fn confirmed(kind: slatebank_types::TxKind, amount: Decimal) -> String {
    format!("Your {kind} of {amount} is confirmed.")
}

/// Notification for a backend-canceled transaction.
#[must_use]
pub fn canceled(kind: slatebank_types::TxKind, amount: Decimal) -> String {
    format!("Your {kind} of {amount} was canceled. The reserved funds were released.")
}

/// Over-ceiling warning, sent once per billing cycle.
#[must_use]
pub fn fee_warning(free: Decimal, ceiling: Decimal, fee: Decimal) -> String {
    format!(
        "You are holding {free} with the custodian, above the free ceiling of \
         {ceiling}. Withdraw soon or a monthly fee of {fee} will be charged."
    )
}

/// Fee-charged notice.
#[must_use]
pub fn fee_charged(fee: Decimal) -> String {
    format!("A custodial fee of {fee} has been deducted from your spendable balance.")
}
