//! Transaction orchestrator: validated, audited balance mutation.
//!
//! # Responsibility
//! - Run the ordered validation pipeline over action requests.
//! - Perform balance mutation + audit append as one atomic unit.
//! - Expose balance and leaderboard read paths.
//!
//! # Invariants
//! - Validation order is authorization, target, amount shape, cooldown;
//!   the first failure short-circuits with no state touched.
//! - A rejected request never consumes a cooldown slot and never writes
//!   an audit row.
//! - Admin actors are exempt from cooldown, never from authorization.

use crate::config::PapoConfig;
use crate::cooldown::CooldownGate;
use crate::model::gateway::{ActionRequest, Receipt};
use crate::model::ids::{AccountId, ActionClass, CommunityId};
use crate::repo::ledger_repo::LedgerRepository;
use crate::repo::RepoError;
use chrono::Utc;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Rejection reasons for `execute`, ordered by pipeline position.
#[derive(Debug)]
pub enum ExecuteError {
    /// Actor lacks the capability for this action class. Reported
    /// generically; never reveals who the correct actor would be.
    NotAuthorized,
    /// Target is not the designated receiving account.
    IneligibleTarget(AccountId),
    /// Amount is not positive, not a step multiple, and not the jackpot.
    InvalidAmount(i64),
    /// Actor is still inside the class cooldown window.
    OnCooldown,
    /// The class is not a ledger operation.
    UnsupportedClass(ActionClass),
    /// Storage failed; no partial write occurred.
    Storage(RepoError),
}

impl ExecuteError {
    /// Stable reason code for the gateway's rejection payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthorized => "not_authorized",
            Self::IneligibleTarget(_) => "ineligible_target",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::OnCooldown => "on_cooldown",
            Self::UnsupportedClass(_) => "unsupported_class",
            Self::Storage(_) => "storage_unavailable",
        }
    }
}

impl Display for ExecuteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAuthorized => write!(f, "actor is not authorized for this action"),
            Self::IneligibleTarget(target) => {
                write!(f, "account {target} cannot be the target of this action")
            }
            Self::InvalidAmount(amount) => write!(f, "amount {amount} has an invalid shape"),
            Self::OnCooldown => write!(f, "actor is on cooldown for this action"),
            Self::UnsupportedClass(class) => {
                write!(f, "action class {} is not a ledger operation", class.as_str())
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExecuteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ExecuteError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Orchestrator facade over a ledger repository implementation.
pub struct TransactionService<L: LedgerRepository> {
    ledger: L,
    gate: Arc<CooldownGate>,
    config: Arc<PapoConfig>,
}

impl<L: LedgerRepository> TransactionService<L> {
    /// Creates a service using the provided repository implementation.
    pub fn new(ledger: L, gate: Arc<CooldownGate>, config: Arc<PapoConfig>) -> Self {
        Self {
            ledger,
            gate,
            config,
        }
    }

    /// Validates and applies one ledger action request.
    pub fn execute(&self, request: &ActionRequest) -> Result<Receipt, ExecuteError> {
        let rules = &self.config.ledger;

        if !matches!(
            request.class,
            ActionClass::Grant | ActionClass::Revoke | ActionClass::Penalty
        ) {
            return Err(ExecuteError::UnsupportedClass(request.class));
        }

        let authorized = match request.class {
            ActionClass::Penalty => request.actor == rules.system_actor,
            _ => rules.is_authorized_actor(request.actor),
        };
        if !authorized {
            debug!(
                "event=ledger_execute module=service status=rejected code=not_authorized class={}",
                request.class.as_str()
            );
            return Err(ExecuteError::NotAuthorized);
        }

        if let Some(designated) = rules.designated_target {
            if request.target != designated {
                return Err(ExecuteError::IneligibleTarget(request.target));
            }
        }

        if !rules.amount_is_valid(request.amount) {
            return Err(ExecuteError::InvalidAmount(request.amount));
        }

        if self.gate.limits(request.class)
            && !rules.is_admin(request.actor)
            && !self.gate.check_and_stamp(request.actor, request.class)
        {
            return Err(ExecuteError::OnCooldown);
        }

        let delta = match request.class {
            ActionClass::Grant => request.amount,
            _ => -request.amount,
        };
        let new_balance = self.ledger.adjust_with_audit(
            request.community,
            request.actor,
            request.target,
            delta,
            request.reason.as_deref(),
            Utc::now().timestamp_millis(),
        )?;

        info!(
            "event=ledger_execute module=service status=ok class={} delta={delta} balance={new_balance}",
            request.class.as_str()
        );

        Ok(Receipt {
            new_balance,
            jackpot: request.class == ActionClass::Grant
                && request.amount == rules.jackpot_amount,
        })
    }

    /// Returns the target's current balance, 0 if never mutated.
    pub fn balance_of(
        &self,
        community: CommunityId,
        account: AccountId,
    ) -> Result<i64, ExecuteError> {
        Ok(self.ledger.balance_of(community, account)?)
    }

    /// Returns the balance leaderboard with the configured limit clamp.
    pub fn leaderboard(
        &self,
        community: CommunityId,
        limit: Option<u32>,
    ) -> Result<Vec<(AccountId, i64)>, ExecuteError> {
        let limit = self.clamp_limit(limit);
        Ok(self.ledger.rank_top(community, limit)?)
    }

    fn clamp_limit(&self, limit: Option<u32>) -> u32 {
        let rules = &self.config.ledger;
        match limit {
            None | Some(0) => rules.leaderboard_default,
            Some(value) => value.min(rules.leaderboard_max),
        }
    }
}
