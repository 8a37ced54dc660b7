//! Goal creation, patching and listing.
//!
//! # Responsibility
//! - Validate goal shape, derive due dates from the goal cadence, and
//!   apply explicit status/progress patches.
//!
//! # Invariants
//! - Weekly/Monthly due dates are derived from the creation day; Custom
//!   goals must supply their own.
//! - A patch setting `current_value >= target_value` while the goal is
//!   Active and no explicit status is given auto-completes the goal.

use crate::clock::Clock;
use crate::config::ScoringConfig;
use crate::model::goal::{Goal, GoalId, GoalStatus, GoalTargetType, GoalType};
use crate::model::user::UserId;
use crate::repo::goal_repo::{GoalRepository, SqliteGoalRepository};
use crate::service::{load_or_bootstrap_user, ServiceError};
use chrono::{Datelike, Days, NaiveDate};
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

/// One goal creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalCreateRequest {
    pub user_id: UserId,
    pub title: String,
    pub goal_type: GoalType,
    pub target_type: GoalTargetType,
    pub target_value: i64,
    pub target_skill_id: Option<String>,
    pub target_domain: Option<String>,
    /// Required for Custom goals; ignored otherwise.
    pub due_date: Option<NaiveDate>,
}

/// Partial update for one goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GoalPatch {
    pub status: Option<GoalStatus>,
    pub current_value: Option<i64>,
}

/// Goal lifecycle orchestrator.
pub struct GoalService<'conn, C: Clock> {
    conn: &'conn mut Connection,
    config: ScoringConfig,
    clock: C,
}

impl<'conn, C: Clock> GoalService<'conn, C> {
    /// Creates the service after validating the scoring configuration.
    pub fn try_new(
        conn: &'conn mut Connection,
        config: ScoringConfig,
        clock: C,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        Ok(Self {
            conn,
            config,
            clock,
        })
    }

    /// Creates one Active goal with a derived or supplied due date.
    pub fn create(&mut self, request: &GoalCreateRequest) -> Result<Goal, ServiceError> {
        let today = self.clock.today();
        let now_ms = self.clock.now_epoch_ms();

        let due_date = match request.goal_type {
            GoalType::Weekly => Some(end_of_week(today)),
            GoalType::Monthly => Some(end_of_month(today)),
            GoalType::Custom => request.due_date,
        };

        let goal = Goal {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            title: request.title.clone(),
            goal_type: request.goal_type,
            target_type: request.target_type,
            target_value: request.target_value,
            target_skill_id: request.target_skill_id.clone(),
            target_domain: request.target_domain.clone(),
            current_value: 0,
            status: GoalStatus::Active,
            due_date,
            completed_at: None,
            created_at: now_ms,
        };
        goal.validate()
            .map_err(|err| ServiceError::InvalidRequest(err.to_string()))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(crate::repo::RepoError::from)?;

        load_or_bootstrap_user(
            &tx,
            self.config.auto_provision_users,
            now_ms,
            request.user_id,
        )?;
        SqliteGoalRepository::try_new(&tx)?.insert(&goal)?;
        tx.commit().map_err(crate::repo::RepoError::from)?;

        info!(
            "event=goal_create module=service status=ok user={} goal={} target_type={:?} target={}",
            goal.user_id, goal.id, goal.target_type, goal.target_value
        );

        Ok(goal)
    }

    /// Applies one ownership-checked status/progress patch.
    pub fn patch(
        &mut self,
        user_id: UserId,
        goal_id: GoalId,
        patch: &GoalPatch,
    ) -> Result<Goal, ServiceError> {
        if patch.status.is_none() && patch.current_value.is_none() {
            return Err(ServiceError::InvalidRequest(
                "patch must set status or current_value".to_string(),
            ));
        }
        if let Some(value) = patch.current_value {
            if value < 0 {
                return Err(ServiceError::InvalidRequest(format!(
                    "current_value must be >= 0, got {value}"
                )));
            }
        }

        let now_ms = self.clock.now_epoch_ms();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(crate::repo::RepoError::from)?;

        let repo = SqliteGoalRepository::try_new(&tx)?;
        let goal = repo
            .get(goal_id)?
            .filter(|goal| goal.user_id == user_id)
            .ok_or(ServiceError::NotFound(goal_id))?;

        let new_value = patch.current_value.unwrap_or(goal.current_value);
        let new_status = match patch.status {
            Some(status) => status,
            None if goal.status == GoalStatus::Active && new_value >= goal.target_value => {
                GoalStatus::Completed
            }
            None => goal.status,
        };
        let completed_at =
            (new_status == GoalStatus::Completed && goal.completed_at.is_none()).then_some(now_ms);

        repo.update_progress(goal_id, new_value, new_status, completed_at)?;
        let updated = repo
            .get(goal_id)?
            .ok_or(ServiceError::NotFound(goal_id))?;
        tx.commit().map_err(crate::repo::RepoError::from)?;

        info!(
            "event=goal_patch module=service status=ok user={user_id} goal={goal_id} value={new_value} new_status={new_status:?}"
        );

        Ok(updated)
    }

    /// Lists all goals for one user, newest first.
    pub fn list(&mut self, user_id: UserId) -> Result<Vec<Goal>, ServiceError> {
        let goals = SqliteGoalRepository::try_new(self.conn)?.list_for_user(user_id)?;
        Ok(goals)
    }
}

/// Sunday of the week containing `today`.
fn end_of_week(today: NaiveDate) -> NaiveDate {
    let to_sunday = 6 - today.weekday().num_days_from_monday() as u64;
    today
        .checked_add_days(Days::new(to_sunday))
        .unwrap_or(today)
}

/// Last day of the month containing `today`.
fn end_of_month(today: NaiveDate) -> NaiveDate {
    let (next_year, next_month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.checked_sub_days(Days::new(1)))
        .unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::{end_of_month, end_of_week};
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_ends_on_sunday() {
        // 2026-03-02 is a Monday.
        assert_eq!(end_of_week(day(2026, 3, 2)), day(2026, 3, 8));
        assert_eq!(end_of_week(day(2026, 3, 8)), day(2026, 3, 8));
    }

    #[test]
    fn month_end_handles_lengths_and_year_rollover() {
        assert_eq!(end_of_month(day(2026, 2, 10)), day(2026, 2, 28));
        assert_eq!(end_of_month(day(2028, 2, 1)), day(2028, 2, 29));
        assert_eq!(end_of_month(day(2026, 12, 31)), day(2026, 12, 31));
        assert_eq!(end_of_month(day(2026, 4, 15)), day(2026, 4, 30));
    }
}
