//! Reflection intake and deletion orchestration.
//!
//! # Responsibility
//! - Validate, tag and persist reflections; run streaks and goal matching
//!   in the same transaction.
//! - Reverse exactly the ledger/XP effect on deletion.
//!
//! # Invariants
//! - Classification happens before the transaction opens; a classifier
//!   failure degrades to the default domain and never fails the intake.
//! - Reflection XP is currently fixed at 0; the ledger entry is still
//!   written so re-enabling it stays a scoring change.
//! - Deletion does not reverse streak state or goal progress the
//!   reflection caused; only the ledger and the XP aggregate roll back.

use crate::classify::{resolve_tagging, ReflectionClassifier};
use crate::clock::Clock;
use crate::config::ScoringConfig;
use crate::model::ledger::{XpLedgerEntry, XpSource};
use crate::model::reflection::{Reflection, ReflectionId};
use crate::model::user::UserId;
use crate::progression::goal_match::{match_goals, Activity, GoalMatchOutcome};
use crate::progression::streak::{advance_streak, StreakState};
use crate::repo::goal_repo::{GoalRepository, SqliteGoalRepository};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use crate::repo::reflection_repo::{ReflectionRepository, SqliteReflectionRepository};
use crate::repo::user_repo::{ProgressDelta, SqliteUserRepository, UserRepository};
use crate::service::{load_or_bootstrap_user, ServiceError};
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

/// XP granted per reflection. Deliberately zero; plumbing retained.
const REFLECTION_XP: i64 = 0;

/// One reflection intake request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReflectionIntakeRequest {
    pub user_id: UserId,
    pub primary_response: String,
    pub follow_up_response: Option<String>,
    /// When empty, the classifier capability is consulted.
    pub domains: Vec<String>,
    pub skill_id: Option<String>,
    pub skill_name: Option<String>,
    pub prompt: Option<String>,
}

/// Outcome of one committed reflection intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionIntakeResult {
    pub reflection: Reflection,
    pub xp_earned: i64,
    pub goals_updated: Vec<GoalMatchOutcome>,
}

/// Outcome of one committed reflection deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectionDeleteResult {
    /// Ledger XP removed and subtracted from the aggregate.
    pub xp_removed: i64,
}

/// Reflection intake orchestrator.
pub struct ReflectionService<'conn, 'cls, C: Clock> {
    conn: &'conn mut Connection,
    config: ScoringConfig,
    clock: C,
    classifier: &'cls dyn ReflectionClassifier,
}

impl<'conn, 'cls, C: Clock> ReflectionService<'conn, 'cls, C> {
    /// Creates the service after validating the scoring configuration.
    pub fn try_new(
        conn: &'conn mut Connection,
        config: ScoringConfig,
        clock: C,
        classifier: &'cls dyn ReflectionClassifier,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        Ok(Self {
            conn,
            config,
            clock,
            classifier,
        })
    }

    /// Validates, tags and persists one reflection atomically.
    pub fn create(
        &mut self,
        request: &ReflectionIntakeRequest,
    ) -> Result<ReflectionIntakeResult, ServiceError> {
        let trimmed = request.primary_response.trim();
        if trimmed.chars().count() < self.config.min_reflection_chars {
            return Err(ServiceError::InvalidRequest(format!(
                "primary response must be at least {} characters",
                self.config.min_reflection_chars
            )));
        }

        // External call stays outside the transaction; it can only delay
        // the request, never hold the write lock.
        let tagging = resolve_tagging(
            self.classifier,
            trimmed,
            request.domains.clone(),
            request.skill_id.clone(),
            request.skill_name.clone(),
        );

        let today = self.clock.today();
        let now_ms = self.clock.now_epoch_ms();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(crate::repo::RepoError::from)?;

        let user = load_or_bootstrap_user(
            &tx,
            self.config.auto_provision_users,
            now_ms,
            request.user_id,
        )?;

        let reflection = Reflection {
            id: Uuid::new_v4(),
            user_id: user.id,
            primary_response: request.primary_response.clone(),
            follow_up_response: request.follow_up_response.clone(),
            domains: tagging.domains,
            skill_id: tagging.skill_id,
            skill_name: tagging.skill_name,
            prompt: request.prompt.clone(),
            xp_earned: REFLECTION_XP,
            logged_for_date: today,
            created_at: now_ms,
        };
        SqliteReflectionRepository::try_new(&tx)?.insert(&reflection)?;

        SqliteLedgerRepository::try_new(&tx)?.append(&XpLedgerEntry::new(
            user.id,
            reflection.xp_earned,
            XpSource::Reflection,
            Some(reflection.id),
            format!("reflection in {}", reflection.primary_domain()),
            now_ms,
        ))?;

        let goal_repo = SqliteGoalRepository::try_new(&tx)?;
        let active_goals = goal_repo.list_active(user.id)?;
        let activity = Activity::Reflection {
            skill_id: reflection.skill_id.clone(),
            domains: reflection.domains.clone(),
        };
        let outcomes = match_goals(&active_goals, &activity);
        for outcome in &outcomes {
            let status = if outcome.completed {
                crate::model::goal::GoalStatus::Completed
            } else {
                crate::model::goal::GoalStatus::Active
            };
            let completed_at = outcome.completed.then_some(now_ms);
            goal_repo.update_progress(
                outcome.goal_id,
                outcome.current_value,
                status,
                completed_at,
            )?;
        }

        let streak = advance_streak(
            StreakState {
                current: user.current_streak,
                longest: user.longest_streak,
                last_log_date: user.last_log_date,
            },
            today,
        );

        SqliteUserRepository::try_new(&tx)?.apply_progress(
            user.id,
            &ProgressDelta {
                xp_delta: reflection.xp_earned,
                streak,
            },
        )?;

        tx.commit().map_err(crate::repo::RepoError::from)?;

        info!(
            "event=reflection_intake module=service status=ok user={} reflection={} goals_updated={} streak={}",
            user.id,
            reflection.id,
            outcomes.len(),
            streak.current
        );

        Ok(ReflectionIntakeResult {
            xp_earned: reflection.xp_earned,
            reflection,
            goals_updated: outcomes,
        })
    }

    /// Deletes one owned reflection, reversing only its ledger/XP effect.
    pub fn delete(
        &mut self,
        user_id: UserId,
        reflection_id: ReflectionId,
    ) -> Result<ReflectionDeleteResult, ServiceError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(crate::repo::RepoError::from)?;

        let reflection_repo = SqliteReflectionRepository::try_new(&tx)?;
        let reflection = reflection_repo
            .get(reflection_id)?
            .filter(|reflection| reflection.user_id == user_id)
            .ok_or(ServiceError::NotFound(reflection_id))?;

        let removed = SqliteLedgerRepository::try_new(&tx)?.remove_for_source(
            user_id,
            XpSource::Reflection,
            reflection.id,
        )?;
        reflection_repo.delete(reflection.id)?;

        let user_repo = SqliteUserRepository::try_new(&tx)?;
        let user = user_repo
            .get_user(user_id)?
            .ok_or(ServiceError::UnknownUser(user_id))?;
        // Streak and goal progress stay as they were; only XP reverses.
        user_repo.apply_progress(
            user.id,
            &ProgressDelta {
                xp_delta: -removed,
                streak: StreakState {
                    current: user.current_streak,
                    longest: user.longest_streak,
                    last_log_date: user.last_log_date,
                },
            },
        )?;

        tx.commit().map_err(crate::repo::RepoError::from)?;

        info!(
            "event=reflection_delete module=service status=ok user={user_id} reflection={reflection_id} xp_removed={removed}"
        );

        Ok(ReflectionDeleteResult {
            xp_removed: removed,
        })
    }
}
