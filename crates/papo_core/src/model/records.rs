//! Persisted record shapes.
//!
//! # Invariants
//! - `LedgerEntry` rows are append-only; `seq` is assigned at write time.
//! - `LinkCapture` rows are unique per (community, owner, message, url).
//! - `BonkEvent` rows are append-only outside the bounded removal path.

use crate::model::ids::{AccountId, ChannelId, CommunityId, MessageId};
use serde::{Deserialize, Serialize};

/// Immutable audit record for one balance mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic sequence id assigned by storage.
    pub seq: i64,
    pub community: CommunityId,
    /// Who caused the mutation.
    pub actor: AccountId,
    /// Whose balance changed.
    pub target: AccountId,
    pub delta: i64,
    pub reason: Option<String>,
    /// Epoch milliseconds.
    pub ts: i64,
}

/// One captured platform link, keyed to its origin message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCapture {
    pub community: CommunityId,
    pub owner: AccountId,
    pub channel: ChannelId,
    pub message: MessageId,
    pub url: String,
    /// Epoch milliseconds.
    pub ts: i64,
}

/// Free-text reminder note. Repeats are legitimate; no dedup applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNote {
    /// Storage-assigned id; 0 before the row is persisted.
    pub id: i64,
    pub community: CommunityId,
    pub author: AccountId,
    pub channel: ChannelId,
    pub message: MessageId,
    /// Referenced-accounts text as rendered by the gateway.
    pub mentions: String,
    pub note: String,
    /// Epoch milliseconds.
    pub ts: i64,
}

/// One recorded bonk trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonkEvent {
    /// Storage-assigned id; 0 before the row is persisted.
    pub id: i64,
    pub community: CommunityId,
    pub actor: AccountId,
    pub target: AccountId,
    pub channel: ChannelId,
    pub message: MessageId,
    /// Epoch milliseconds.
    pub ts: i64,
}
