//! Bonk counter engine: trigger recording, streak and penalty thresholds.
//!
//! # Responsibility
//! - Record cooldown-gated bonk events and derive windowed aggregates.
//! - Fire streak/penalty side effects on daily-count threshold crossings.
//!
//! # Invariants
//! - Both threshold checks evaluate the same `count_today` value computed
//!   once per recorded trigger; a count that is a multiple of both steps
//!   fires both.
//! - The penalty flows through `TransactionService::execute`, sharing the
//!   ledger's atomicity discipline; its failure never rolls back the
//!   already-recorded trigger.
//! - The daily count is scoped to the target, not the acting member.

use crate::config::PapoConfig;
use crate::cooldown::CooldownGate;
use crate::model::gateway::{ActionRequest, Notification, RawMessageEvent};
use crate::model::ids::{AccountId, ActionClass, ChannelId, CommunityId, MessageId};
use crate::model::records::BonkEvent;
use crate::repo::bonk_repo::{BonkRepository, WindowStart};
use crate::repo::ledger_repo::LedgerRepository;
use crate::repo::RepoError;
use crate::service::transaction_service::TransactionService;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Aggregation window for counts, leaderboards and removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountWindow {
    /// All recorded events.
    All,
    /// The current UTC calendar day.
    Day,
    /// Rolling 7x24h from now.
    Week,
}

/// Per-pair trigger statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonkStats {
    pub today: u64,
    pub last_7_days: u64,
    pub all_time: u64,
}

/// Result of one recorded trigger, including side-effect commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonkOutcome {
    /// Bonks against the target so far on the current UTC day.
    pub count_today: u64,
    /// Streak/penalty notifications for the collaborator to deliver.
    pub notifications: Vec<Notification>,
}

/// Counter-engine errors.
#[derive(Debug)]
pub enum BonkError {
    /// Actor is still inside the bonk cooldown window.
    OnCooldown,
    /// Storage failed; the trigger was not recorded.
    Storage(RepoError),
}

impl Display for BonkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnCooldown => write!(f, "actor is on bonk cooldown"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BonkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::OnCooldown => None,
        }
    }
}

impl From<RepoError> for BonkError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Counter/streak engine facade.
pub struct BonkService<B: BonkRepository, L: LedgerRepository> {
    bonks: B,
    ledger: TransactionService<L>,
    gate: Arc<CooldownGate>,
    config: Arc<PapoConfig>,
}

impl<B: BonkRepository, L: LedgerRepository> BonkService<B, L> {
    /// Creates the engine over a bonk repository and the orchestrator
    /// used for penalty mutations.
    pub fn new(
        bonks: B,
        ledger: TransactionService<L>,
        gate: Arc<CooldownGate>,
        config: Arc<PapoConfig>,
    ) -> Self {
        Self {
            bonks,
            ledger,
            gate,
            config,
        }
    }

    /// Inspects a raw message for the bonk trigger.
    ///
    /// Returns `Ok(None)` when the message is not a bonk; a recognized
    /// trigger is recorded with the author as the acting member.
    pub fn observe_message(
        &self,
        event: &RawMessageEvent,
    ) -> Result<Option<BonkOutcome>, BonkError> {
        if !event.mentioned_self {
            return Ok(None);
        }
        let trigger = self.config.bonk.trigger_word.to_lowercase();
        if !event.text.to_lowercase().contains(&trigger) {
            return Ok(None);
        }
        self.record_bonk(event.community, event.author, event.channel, event.message)
            .map(Some)
    }

    /// Records one bonk against the configured target and evaluates both
    /// threshold checks on the resulting daily count.
    pub fn record_bonk(
        &self,
        community: CommunityId,
        actor: AccountId,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<BonkOutcome, BonkError> {
        if !self.gate.check_and_stamp(actor, ActionClass::Bonk) {
            return Err(BonkError::OnCooldown);
        }

        let rules = &self.config.bonk;
        let now = Utc::now();
        let target = rules.target;

        self.bonks.append(&BonkEvent {
            id: 0,
            community,
            actor,
            target,
            channel,
            message,
            ts: now.timestamp_millis(),
        })?;
        let count_today =
            self.bonks
                .count_for_target(community, target, window_start(CountWindow::Day, now))?;

        info!(
            "event=bonk_recorded module=service status=ok target={target} count_today={count_today}"
        );

        let mut notifications = Vec::new();
        if rules.streak_step > 0 && count_today % rules.streak_step == 0 {
            notifications.push(Notification::public(format!(
                "\u{1F528} <@{target}> has been bonked {count_today} times today!"
            )));
        }
        if rules.penalty_step > 0 && count_today % rules.penalty_step == 0 {
            if let Some(notification) = self.apply_penalty(community, target, count_today) {
                notifications.push(notification);
            }
        }

        Ok(BonkOutcome {
            count_today,
            notifications,
        })
    }

    fn apply_penalty(
        &self,
        community: CommunityId,
        target: AccountId,
        count_today: u64,
    ) -> Option<Notification> {
        let rules = &self.config.bonk;
        let request = ActionRequest {
            community,
            actor: self.config.ledger.system_actor,
            target,
            amount: rules.penalty_amount,
            reason: Some(format!("bonk penalty at {count_today} today")),
            class: ActionClass::Penalty,
        };
        match self.ledger.execute(&request) {
            Ok(receipt) => Some(Notification::public(format!(
                "\u{26A0}\u{FE0F} Bonk threshold reached: <@{target}> loses {}. New total: {}.",
                rules.penalty_amount, receipt.new_balance
            ))),
            // The trigger row is already durable; a rejected penalty is
            // surfaced in logs rather than unwinding the count.
            Err(err) => {
                error!(
                    "event=bonk_penalty module=service status=error code={} error={err}",
                    err.code()
                );
                None
            }
        }
    }

    /// Returns today/7-day/all-time counts for one (actor, target) pair.
    pub fn stats_for(
        &self,
        community: CommunityId,
        actor: AccountId,
        target: AccountId,
    ) -> Result<BonkStats, BonkError> {
        let now = Utc::now();
        Ok(BonkStats {
            today: self.bonks.count_for_pair(
                community,
                actor,
                target,
                window_start(CountWindow::Day, now),
            )?,
            last_7_days: self.bonks.count_for_pair(
                community,
                actor,
                target,
                window_start(CountWindow::Week, now),
            )?,
            all_time: self.bonks.count_for_pair(
                community,
                actor,
                target,
                window_start(CountWindow::All, now),
            )?,
        })
    }

    /// Returns the top bonkers of the target within the window.
    pub fn leaderboard(
        &self,
        community: CommunityId,
        target: AccountId,
        window: CountWindow,
        limit: u32,
    ) -> Result<Vec<(AccountId, u64)>, BonkError> {
        let since = window_start(window, Utc::now());
        Ok(self.bonks.leaderboard(community, target, since, limit)?)
    }

    /// Removes up to `count` newest matching events and reports how many
    /// were actually removed. Under-supply is not an error.
    pub fn remove_recent(
        &self,
        community: CommunityId,
        actor: AccountId,
        target: AccountId,
        window: CountWindow,
        count: u32,
    ) -> Result<u64, BonkError> {
        let since = window_start(window, Utc::now());
        let removed = self
            .bonks
            .remove_recent(community, actor, target, since, count)?;
        info!(
            "event=bonk_removed module=service status=ok actor={actor} target={target} removed={removed}"
        );
        Ok(removed)
    }
}

/// Lower bound in epoch milliseconds for the given window.
pub fn window_start(window: CountWindow, now: DateTime<Utc>) -> WindowStart {
    match window {
        CountWindow::All => None,
        CountWindow::Day => Some(
            now.date_naive()
                .and_time(NaiveTime::MIN)
                .and_utc()
                .timestamp_millis(),
        ),
        CountWindow::Week => Some((now - Duration::days(7)).timestamp_millis()),
    }
}

#[cfg(test)]
mod tests {
    use super::{window_start, CountWindow};
    use chrono::{TimeZone, Utc};

    #[test]
    fn day_window_starts_at_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap();
        let start = window_start(CountWindow::Day, now).unwrap();
        let midnight = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(start, midnight.timestamp_millis());
    }

    #[test]
    fn week_window_is_rolling_seven_days() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 15, 30, 0).unwrap();
        let start = window_start(CountWindow::Week, now).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 3, 15, 30, 0).unwrap();
        assert_eq!(start, expected.timestamp_millis());
    }

    #[test]
    fn all_window_has_no_lower_bound() {
        assert_eq!(window_start(CountWindow::All, Utc::now()), None);
    }
}
