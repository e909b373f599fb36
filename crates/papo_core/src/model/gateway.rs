//! Gateway-facing request and response shapes.
//!
//! # Responsibility
//! - Model what the message-gateway collaborator hands the core and what
//!   the core hands back.
//! - Stay protocol-agnostic: no wire format, no reply formatting for
//!   direct commands.

use crate::model::ids::{AccountId, ActionClass, ChannelId, CommunityId, MessageId};
use serde::{Deserialize, Serialize};

/// Authenticated ledger action request.
///
/// Actor identity is supplied by the collaborator; the core performs no
/// session or authentication work of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub community: CommunityId,
    pub actor: AccountId,
    pub target: AccountId,
    pub amount: i64,
    pub reason: Option<String>,
    pub class: ActionClass,
}

/// Successful ledger mutation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Target balance after the mutation.
    pub new_balance: i64,
    /// True when a grant hit the configured jackpot constant.
    pub jackpot: bool,
}

/// Delivery hint for outbound chat replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Visible to the whole channel.
    Public,
    /// Visible only to the triggering member.
    Ephemeral,
}

/// Side-effect command asking the collaborator to send chat text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub visibility: Visibility,
}

impl Notification {
    pub fn public(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visibility: Visibility::Public,
        }
    }

    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            visibility: Visibility::Ephemeral,
        }
    }
}

/// One structured preview/embed attached to a raw message.
///
/// Field order is part of the extraction contract: `url`, then `title`,
/// then `description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEmbed {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Raw inbound message event used for trigger/link/reminder capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessageEvent {
    pub community: CommunityId,
    pub author: AccountId,
    pub channel: ChannelId,
    pub message: MessageId,
    pub text: String,
    pub embeds: Vec<MessageEmbed>,
    /// True when the message mentions the agent itself.
    pub mentioned_self: bool,
}

/// Request to backfill-capture links from a channel's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryScanRequest {
    pub community: CommunityId,
    pub channel: ChannelId,
    /// Upper bound on messages inspected, newest first.
    pub max_messages: u32,
    /// Only messages from this author are captured.
    pub author: AccountId,
    pub requesting_actor: AccountId,
}

/// Outcome of a (possibly partial) history scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Messages inspected, whether or not they matched the author filter.
    pub scanned: u64,
    /// Link payloads extracted from matching messages.
    pub matched: u64,
    /// Payloads newly persisted (duplicates count as zero).
    pub inserted: u64,
    /// False when the scan ended early on cancellation or a fetch failure.
    pub complete: bool,
}
