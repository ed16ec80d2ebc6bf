//! Slate model: the decoded view of a slatepack the engine dispatches on.
//!
//! The slatepack payload itself stays opaque — only the wallet backend can
//! decode it. What comes back is the tiny header the protocol engine needs:
//! the transaction id, the negotiation status code, and the amount.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{SlatebankError, TxId};

/// Status code (`sta`) of a decoded slate — which round of which flow the
/// sender believes this slate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlateStatus {
    /// Standard send, first round: an unsolicited deposit offer.
    S1,
    /// Standard send, second round: the response to a withdrawal slate we
    /// issued.
    S2,
    /// Invoice, first round: the user is invoicing *us*. Never honored.
    I1,
    /// Invoice, second round: the response to a deposit invoice we issued.
    I2,
}

impl FromStr for SlateStatus {
    type Err = SlatebankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S1" => Ok(Self::S1),
            "S2" => Ok(Self::S2),
            "I1" => Ok(Self::I1),
            "I2" => Ok(Self::I2),
            other => Err(SlatebankError::MalformedSlatepack {
                reason: format!("unknown slate status {other:?}"),
            }),
        }
    }
}

impl fmt::Display for SlateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::S1 => write!(f, "S1"),
            Self::S2 => write!(f, "S2"),
            Self::I1 => write!(f, "I1"),
            Self::I2 => write!(f, "I2"),
        }
    }
}

/// Decoded slate header, as returned by `WalletBackend::decode_slatepack`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slate {
    /// Backend transaction id (`id` field of the slate).
    pub id: TxId,
    /// Negotiation status (`sta` field).
    pub status: SlateStatus,
    /// Amount in play (`amt` field).
    pub amount: Decimal,
}

/// The artifacts a backend hands back when it opens a new negotiation
/// round: the outbound slatepack text and the id it minted for the
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlateInit {
    pub slatepack: String,
    pub tx_id: TxId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_codes() {
        assert_eq!("S1".parse::<SlateStatus>().unwrap(), SlateStatus::S1);
        assert_eq!("I2".parse::<SlateStatus>().unwrap(), SlateStatus::I2);
    }

    #[test]
    fn status_rejects_unknown_code() {
        let err = "S3".parse::<SlateStatus>().unwrap_err();
        assert!(matches!(err, SlatebankError::MalformedSlatepack { .. }));
    }

    #[test]
    fn status_display_roundtrips() {
        for code in [SlateStatus::S1, SlateStatus::S2, SlateStatus::I1, SlateStatus::I2] {
            assert_eq!(code.to_string().parse::<SlateStatus>().unwrap(), code);
        }
    }

    #[test]
    fn slate_serde_roundtrip() {
        let slate = Slate {
            id: TxId::new("tx-9"),
            status: SlateStatus::S2,
            amount: Decimal::new(125, 1),
        };
        let json = serde_json::to_string(&slate).unwrap();
        let back: Slate = serde_json::from_str(&json).unwrap();
        assert_eq!(slate, back);
    }
}
