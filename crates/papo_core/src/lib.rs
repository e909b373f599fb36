//! Core domain logic for the Papo community agent.
//! This crate is the single source of truth for ledger, capture and
//! bonk-counter invariants; gateway plumbing lives in the embedder.

pub mod config;
pub mod cooldown;
pub mod db;
pub mod extract;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{BonkRules, CaptureRules, ConfigError, LedgerRules, PapoConfig};
pub use cooldown::CooldownGate;
pub use extract::{extract_links, LinkPattern};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::gateway::{
    ActionRequest, HistoryScanRequest, MessageEmbed, Notification, RawMessageEvent, Receipt,
    ScanReport, Visibility,
};
pub use model::ids::{AccountId, ActionClass, ChannelId, CommunityId, MessageId};
pub use model::records::{BonkEvent, LedgerEntry, LinkCapture, ReminderNote};
pub use repo::bonk_repo::{BonkRepository, SqliteBonkRepository};
pub use repo::capture_repo::{CaptureRepository, SqliteCaptureRepository};
pub use repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
pub use repo::{RepoError, RepoResult};
pub use service::bonk_service::{BonkError, BonkOutcome, BonkService, BonkStats, CountWindow};
pub use service::capture_service::{
    CaptureError, CaptureService, ChannelHistory, HistoryFetchError,
};
pub use service::transaction_service::{ExecuteError, TransactionService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
