//! Outbound reply shape handed to the chat transport.
//!
//! The engine never talks to the chat platform directly; it produces
//! [`OutboundMessage`] values and the transport layer delivers them.

use serde::{Deserialize, Serialize};

use crate::{AccountId, ChatId};

/// Where a reply should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatTarget {
    /// The chat the triggering message arrived from.
    Origin(ChatId),
    /// The user's private channel. Slatepacks always go here.
    Private(AccountId),
}

/// One text reply to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub target: ChatTarget,
    pub text: String,
}

impl OutboundMessage {
    #[must_use]
    pub fn origin(chat: ChatId, text: impl Into<String>) -> Self {
        Self {
            target: ChatTarget::Origin(chat),
            text: text.into(),
        }
    }

    #[must_use]
    pub fn private(account: AccountId, text: impl Into<String>) -> Self {
        Self {
            target: ChatTarget::Private(account),
            text: text.into(),
        }
    }
}
