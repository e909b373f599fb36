//! Runtime configuration for the community agent core.
//!
//! # Responsibility
//! - Collect every tunable that used to be a hard-coded constant: amounts,
//!   cooldowns, thresholds, designated identities, link hosts.
//! - Validate cross-field rules before the core starts serving requests.
//!
//! # Invariants
//! - `validate()` must pass before a config reaches any service.
//! - Defaults reproduce the shipped bot behavior (step 5, jackpot 50,
//!   8 s grant cooldown, streak 10, penalty 20).

use crate::model::ids::AccountId;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Top-level core configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PapoConfig {
    #[serde(default)]
    pub ledger: LedgerRules,
    #[serde(default)]
    pub bonk: BonkRules,
    #[serde(default)]
    pub capture: CaptureRules,
}

/// Rules for direct currency grants/revokes and the balance leaderboard.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerRules {
    /// Actors allowed to grant/revoke. Admins are implicitly included.
    #[serde(default)]
    pub authorized_actors: Vec<AccountId>,
    /// Admin actors: cooldown-exempt, allowed to grant/revoke, allowed to
    /// request history scans and reminder purges.
    #[serde(default)]
    pub admin_actors: Vec<AccountId>,
    /// Identity automated penalties are attributed to.
    #[serde(default)]
    pub system_actor: AccountId,
    /// When set, the only account that may receive or lose currency.
    #[serde(default)]
    pub designated_target: Option<AccountId>,
    #[serde(default = "LedgerRules::default_amount_step")]
    pub amount_step: i64,
    #[serde(default = "LedgerRules::default_jackpot_amount")]
    pub jackpot_amount: i64,
    #[serde(default = "LedgerRules::default_grant_cooldown_ms")]
    pub grant_cooldown_ms: u64,
    #[serde(default = "LedgerRules::default_leaderboard_default")]
    pub leaderboard_default: u32,
    #[serde(default = "LedgerRules::default_leaderboard_max")]
    pub leaderboard_max: u32,
}

impl LedgerRules {
    fn default_amount_step() -> i64 {
        5
    }

    fn default_jackpot_amount() -> i64 {
        50
    }

    fn default_grant_cooldown_ms() -> u64 {
        8_000
    }

    fn default_leaderboard_default() -> u32 {
        10
    }

    fn default_leaderboard_max() -> u32 {
        30
    }

    /// Returns whether `amount` has an acceptable mutation shape:
    /// positive and either a step multiple or exactly the jackpot.
    pub fn amount_is_valid(&self, amount: i64) -> bool {
        amount > 0 && (amount % self.amount_step == 0 || amount == self.jackpot_amount)
    }

    pub fn is_admin(&self, actor: AccountId) -> bool {
        self.admin_actors.contains(&actor)
    }

    pub fn is_authorized_actor(&self, actor: AccountId) -> bool {
        self.authorized_actors.contains(&actor) || self.is_admin(actor)
    }
}

impl Default for LedgerRules {
    fn default() -> Self {
        Self {
            authorized_actors: Vec::new(),
            admin_actors: Vec::new(),
            system_actor: 0,
            designated_target: None,
            amount_step: Self::default_amount_step(),
            jackpot_amount: Self::default_jackpot_amount(),
            grant_cooldown_ms: Self::default_grant_cooldown_ms(),
            leaderboard_default: Self::default_leaderboard_default(),
            leaderboard_max: Self::default_leaderboard_max(),
        }
    }
}

/// Rules for bonk trigger recording and its threshold side effects.
#[derive(Debug, Clone, Deserialize)]
pub struct BonkRules {
    /// The account bonks are counted against.
    #[serde(default)]
    pub target: AccountId,
    /// Case-insensitive substring that turns a self-mention into a bonk.
    #[serde(default = "BonkRules::default_trigger_word")]
    pub trigger_word: String,
    /// Every multiple of this daily count emits a streak notification.
    /// Zero disables the check.
    #[serde(default = "BonkRules::default_streak_step")]
    pub streak_step: u64,
    /// Every multiple of this daily count applies the penalty. Zero
    /// disables the check.
    #[serde(default = "BonkRules::default_penalty_step")]
    pub penalty_step: u64,
    /// Magnitude removed from the target on each penalty crossing.
    #[serde(default = "BonkRules::default_penalty_amount")]
    pub penalty_amount: i64,
    #[serde(default = "BonkRules::default_bonk_cooldown_ms")]
    pub bonk_cooldown_ms: u64,
}

impl BonkRules {
    fn default_trigger_word() -> String {
        "bonk".to_string()
    }

    fn default_streak_step() -> u64 {
        10
    }

    fn default_penalty_step() -> u64 {
        20
    }

    fn default_penalty_amount() -> i64 {
        5
    }

    fn default_bonk_cooldown_ms() -> u64 {
        30_000
    }
}

impl Default for BonkRules {
    fn default() -> Self {
        Self {
            target: 0,
            trigger_word: Self::default_trigger_word(),
            streak_step: Self::default_streak_step(),
            penalty_step: Self::default_penalty_step(),
            penalty_amount: Self::default_penalty_amount(),
            bonk_cooldown_ms: Self::default_bonk_cooldown_ms(),
        }
    }
}

/// Rules for link capture and the reminder bank.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureRules {
    /// When set, live capture only records links from this author.
    #[serde(default)]
    pub tracked_owner: Option<AccountId>,
    /// Hosts (and their subdomains) whose links are captured.
    #[serde(default = "CaptureRules::default_link_hosts")]
    pub link_hosts: Vec<String>,
    /// Reminder notes are truncated to this many characters.
    #[serde(default = "CaptureRules::default_reminder_max_chars")]
    pub reminder_max_chars: usize,
    /// Page size requested from the gateway during history scans.
    #[serde(default = "CaptureRules::default_scan_page_size")]
    pub scan_page_size: u32,
}

impl CaptureRules {
    fn default_link_hosts() -> Vec<String> {
        vec!["tiktok.com".to_string(), "vm.tiktok.com".to_string()]
    }

    fn default_reminder_max_chars() -> usize {
        500
    }

    fn default_scan_page_size() -> u32 {
        100
    }
}

impl Default for CaptureRules {
    fn default() -> Self {
        Self {
            tracked_owner: None,
            link_hosts: Self::default_link_hosts(),
            reminder_max_chars: Self::default_reminder_max_chars(),
            scan_page_size: Self::default_scan_page_size(),
        }
    }
}

/// Declaration-level configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    NonPositiveAmountStep(i64),
    NonPositiveJackpot(i64),
    InvalidPenaltyAmount(i64),
    EmptyTriggerWord,
    ZeroScanPageSize,
    ZeroReminderLength,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveAmountStep(value) => {
                write!(f, "amount step must be positive, got {value}")
            }
            Self::NonPositiveJackpot(value) => {
                write!(f, "jackpot amount must be positive, got {value}")
            }
            Self::InvalidPenaltyAmount(value) => write!(
                f,
                "penalty amount {value} would be rejected by the amount-shape rule"
            ),
            Self::EmptyTriggerWord => write!(f, "bonk trigger word must not be empty"),
            Self::ZeroScanPageSize => write!(f, "scan page size must be at least 1"),
            Self::ZeroReminderLength => write!(f, "reminder length cap must be at least 1"),
        }
    }
}

impl Error for ConfigError {}

impl PapoConfig {
    /// Validates cross-field invariants.
    ///
    /// The penalty amount is executed through the same orchestrator path
    /// as direct requests, so it must already satisfy the amount-shape
    /// rule here rather than failing at the first threshold crossing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.amount_step <= 0 {
            return Err(ConfigError::NonPositiveAmountStep(self.ledger.amount_step));
        }
        if self.ledger.jackpot_amount <= 0 {
            return Err(ConfigError::NonPositiveJackpot(self.ledger.jackpot_amount));
        }
        if self.bonk.penalty_step > 0 && !self.ledger.amount_is_valid(self.bonk.penalty_amount) {
            return Err(ConfigError::InvalidPenaltyAmount(self.bonk.penalty_amount));
        }
        if self.bonk.trigger_word.trim().is_empty() {
            return Err(ConfigError::EmptyTriggerWord);
        }
        if self.capture.scan_page_size == 0 {
            return Err(ConfigError::ZeroScanPageSize);
        }
        if self.capture.reminder_max_chars == 0 {
            return Err(ConfigError::ZeroReminderLength);
        }
        Ok(())
    }
}
