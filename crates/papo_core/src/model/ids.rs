//! Opaque identity aliases and action classes.

use serde::{Deserialize, Serialize};

/// Community (guild/server) identity supplied by the gateway.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CommunityId = i64;

/// Member/account identity supplied by the gateway.
pub type AccountId = i64;

/// Channel identity supplied by the gateway.
pub type ChannelId = i64;

/// Message identity supplied by the gateway.
pub type MessageId = i64;

/// Named category of rate-limited/validated operation.
///
/// Each class carries its own authorization rule and cooldown duration;
/// an allowance in one class never affects another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    /// Currency grant toward the designated account.
    Grant,
    /// Currency removal from the designated account.
    Revoke,
    /// Automated removal attributed to the system actor.
    Penalty,
    /// Bonk trigger recording.
    Bonk,
}

impl ActionClass {
    /// Stable string id used in logs and rejection payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
            Self::Penalty => "penalty",
            Self::Bonk => "bonk",
        }
    }
}
