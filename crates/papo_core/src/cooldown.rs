//! Per-actor cooldown gating for rate-limited action classes.
//!
//! # Responsibility
//! - Enforce minimum inter-action spacing per (actor, action class).
//! - Keep check-and-set atomic per key so two concurrent calls for the
//!   same actor cannot both pass.
//!
//! # Invariants
//! - The stamp advances only on an allowed call; a denied call must not
//!   re-arm the cooldown.
//! - State is process-local and resets on restart.
//! - Classes without a configured duration always allow and store nothing.

use crate::config::PapoConfig;
use crate::model::ids::{AccountId, ActionClass};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Process-local cooldown gate shared by all concurrent handlers.
pub struct CooldownGate {
    durations: HashMap<ActionClass, Duration>,
    stamps: DashMap<(AccountId, ActionClass), Instant>,
}

impl CooldownGate {
    /// Creates a gate from explicit per-class durations.
    ///
    /// Zero durations are dropped, making those classes unlimited.
    pub fn new(durations: HashMap<ActionClass, Duration>) -> Self {
        let durations = durations
            .into_iter()
            .filter(|(_, duration)| !duration.is_zero())
            .collect();
        Self {
            durations,
            stamps: DashMap::new(),
        }
    }

    /// Creates a gate with the configured grant and bonk spacings.
    pub fn from_config(config: &PapoConfig) -> Self {
        let mut durations = HashMap::new();
        durations.insert(
            ActionClass::Grant,
            Duration::from_millis(config.ledger.grant_cooldown_ms),
        );
        durations.insert(
            ActionClass::Bonk,
            Duration::from_millis(config.bonk.bonk_cooldown_ms),
        );
        Self::new(durations)
    }

    /// Returns whether the class is rate limited at all.
    pub fn limits(&self, class: ActionClass) -> bool {
        self.durations.contains_key(&class)
    }

    /// Atomically checks the actor's spacing and stamps on allow.
    pub fn check_and_stamp(&self, actor: AccountId, class: ActionClass) -> bool {
        self.check_and_stamp_at(actor, class, Instant::now())
    }

    /// Deterministic variant taking the current instant explicitly.
    pub fn check_and_stamp_at(
        &self,
        actor: AccountId,
        class: ActionClass,
        now: Instant,
    ) -> bool {
        let Some(window) = self.durations.get(&class).copied() else {
            return true;
        };

        // The entry guard holds the per-key shard lock across the whole
        // check-and-set, so a losing concurrent call observes the fresh
        // stamp rather than racing past it.
        match self.stamps.entry((actor, class)) {
            Entry::Occupied(mut occupied) => {
                if now.saturating_duration_since(*occupied.get()) >= window {
                    occupied.insert(now);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CooldownGate;
    use crate::model::ids::ActionClass;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    fn gate_with(class: ActionClass, duration: Duration) -> CooldownGate {
        let mut durations = HashMap::new();
        durations.insert(class, duration);
        CooldownGate::new(durations)
    }

    #[test]
    fn denies_inside_window_and_allows_at_boundary() {
        let gate = gate_with(ActionClass::Grant, Duration::from_secs(8));
        let start = Instant::now();

        assert!(gate.check_and_stamp_at(1, ActionClass::Grant, start));
        assert!(!gate.check_and_stamp_at(1, ActionClass::Grant, start + Duration::from_secs(7)));
        assert!(gate.check_and_stamp_at(1, ActionClass::Grant, start + Duration::from_secs(8)));
    }

    #[test]
    fn denied_call_does_not_rearm_the_window() {
        let gate = gate_with(ActionClass::Grant, Duration::from_secs(8));
        let start = Instant::now();

        assert!(gate.check_and_stamp_at(1, ActionClass::Grant, start));
        // Denials at 5 and 7 must not push the allow point past 8.
        assert!(!gate.check_and_stamp_at(1, ActionClass::Grant, start + Duration::from_secs(5)));
        assert!(!gate.check_and_stamp_at(1, ActionClass::Grant, start + Duration::from_secs(7)));
        assert!(gate.check_and_stamp_at(1, ActionClass::Grant, start + Duration::from_secs(8)));
    }

    #[test]
    fn classes_and_actors_are_independent() {
        let mut durations = HashMap::new();
        durations.insert(ActionClass::Grant, Duration::from_secs(8));
        durations.insert(ActionClass::Bonk, Duration::from_secs(30));
        let gate = CooldownGate::new(durations);
        let start = Instant::now();

        assert!(gate.check_and_stamp_at(1, ActionClass::Grant, start));
        assert!(gate.check_and_stamp_at(1, ActionClass::Bonk, start));
        assert!(gate.check_and_stamp_at(2, ActionClass::Grant, start));
        assert!(!gate.check_and_stamp_at(1, ActionClass::Grant, start + Duration::from_secs(1)));
    }

    #[test]
    fn unlimited_class_always_allows() {
        let gate = gate_with(ActionClass::Grant, Duration::from_secs(8));
        let start = Instant::now();

        assert!(gate.check_and_stamp_at(9, ActionClass::Revoke, start));
        assert!(gate.check_and_stamp_at(9, ActionClass::Revoke, start));
        assert!(!gate.limits(ActionClass::Revoke));
    }

    #[test]
    fn zero_duration_means_unlimited() {
        let gate = gate_with(ActionClass::Bonk, Duration::ZERO);
        let start = Instant::now();

        assert!(gate.check_and_stamp_at(3, ActionClass::Bonk, start));
        assert!(gate.check_and_stamp_at(3, ActionClass::Bonk, start));
    }
}
