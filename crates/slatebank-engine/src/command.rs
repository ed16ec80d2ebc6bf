//! Chat command parsing.
//!
//! Commands are the slash-prefixed first word of a message. Everything that
//! is not a known command falls through to free-text handling (which may
//! carry a slatepack).

use rust_decimal::Decimal;
use slatebank_policy::WithdrawRequest;
use slatebank_types::{Result, SlatebankError};

/// A parsed inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/deposit <amount>`
    Deposit(Decimal),
    /// `/withdraw [amount|max]` — no argument means `max`.
    Withdraw(WithdrawRequest),
    /// `/balance`
    Balance,
    /// `/approve` — accept the pending EULA version.
    Approve,
    /// `/deny` — refuse the pending EULA version.
    Deny,
}

/// Parse a message as a command.
///
/// Returns `None` if the text is not a command at all, `Some(Err(..))` when
/// it is a known command with bad arguments.
#[must_use]
pub fn parse_command(text: &str) -> Option<Result<Command>> {
    let mut words = text.split_whitespace();
    let head = words.next()?;
    // Allow the platform's `/cmd@botname` addressing form.
    let name = head.split('@').next().unwrap_or(head);

    match name {
        "/deposit" => Some(match words.next() {
            None => Err(SlatebankError::MissingAmount),
            Some(arg) => parse_amount(arg).map(Command::Deposit),
        }),
        "/withdraw" => Some(match words.next() {
            None => Ok(Command::Withdraw(WithdrawRequest::Max)),
            Some("max") => Ok(Command::Withdraw(WithdrawRequest::Max)),
            Some(arg) => parse_amount(arg).map(|a| Command::Withdraw(WithdrawRequest::Amount(a))),
        }),
        "/balance" => Some(Ok(Command::Balance)),
        "/approve" => Some(Ok(Command::Approve)),
        "/deny" => Some(Ok(Command::Deny)),
        _ => None,
    }
}

fn parse_amount(arg: &str) -> Result<Decimal> {
    let amount: Decimal = arg.parse().map_err(|_| SlatebankError::InvalidAmount {
        input: arg.to_string(),
    })?;
    if amount <= Decimal::ZERO {
        return Err(SlatebankError::InvalidAmount {
            input: arg.to_string(),
        });
    }
    Ok(amount)
}
