//! Goal repository.
//!
//! # Responsibility
//! - Persist goals and serve the active-goal reads matching needs.
//! - Apply progress/status updates produced by the matcher or by explicit
//!   patches.
//!
//! # Invariants
//! - Write paths call `Goal::validate()` before SQL mutations.
//! - `completed_at` is written once, by the update that sets `Completed`.

use crate::model::goal::{
    goal_status_to_db, goal_type_to_db, parse_goal_status, parse_goal_type, parse_target_type,
    target_type_to_db, Goal, GoalId, GoalStatus,
};
use crate::model::user::UserId;
use crate::repo::{
    date_to_db, ensure_connection_ready, parse_date, parse_uuid, RepoError, RepoResult, TableSpec,
};
use rusqlite::{params, Connection, Row};

const GOAL_TABLES: &[TableSpec] = &[(
    "goals",
    &[
        "id",
        "user_id",
        "title",
        "goal_type",
        "target_type",
        "target_value",
        "target_skill_id",
        "target_domain",
        "current_value",
        "status",
        "due_date",
        "completed_at",
        "created_at",
    ],
)];

const GOAL_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    title,
    goal_type,
    target_type,
    target_value,
    target_skill_id,
    target_domain,
    current_value,
    status,
    due_date,
    completed_at,
    created_at
FROM goals";

/// Repository interface for goal persistence.
pub trait GoalRepository {
    fn insert(&self, goal: &Goal) -> RepoResult<()>;
    fn get(&self, id: GoalId) -> RepoResult<Option<Goal>>;
    /// Active goals only; matching input.
    fn list_active(&self, user_id: UserId) -> RepoResult<Vec<Goal>>;
    /// All goals for one user, newest first.
    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Goal>>;
    /// Writes progress and status produced by matching or patching.
    fn update_progress(
        &self,
        id: GoalId,
        current_value: i64,
        status: GoalStatus,
        completed_at: Option<i64>,
    ) -> RepoResult<()>;
}

/// SQLite-backed goal repository.
pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, GOAL_TABLES)?;
        Ok(Self { conn })
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn insert(&self, goal: &Goal) -> RepoResult<()> {
        goal.validate()
            .map_err(|err| RepoError::Validation(err.to_string()))?;

        self.conn.execute(
            "INSERT INTO goals (
                id,
                user_id,
                title,
                goal_type,
                target_type,
                target_value,
                target_skill_id,
                target_domain,
                current_value,
                status,
                due_date,
                completed_at,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                goal.id.to_string(),
                goal.user_id.to_string(),
                goal.title.as_str(),
                goal_type_to_db(goal.goal_type),
                target_type_to_db(goal.target_type),
                goal.target_value,
                goal.target_skill_id.as_deref(),
                goal.target_domain.as_deref(),
                goal.current_value,
                goal_status_to_db(goal.status),
                goal.due_date.map(date_to_db),
                goal.completed_at,
                goal.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: GoalId) -> RepoResult<Option<Goal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{GOAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_goal_row(row)?));
        }
        Ok(None)
    }

    fn list_active(&self, user_id: UserId) -> RepoResult<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GOAL_SELECT_SQL}
             WHERE user_id = ?1
               AND status = 'active'
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }
        Ok(goals)
    }

    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{GOAL_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }
        Ok(goals)
    }

    fn update_progress(
        &self,
        id: GoalId,
        current_value: i64,
        status: GoalStatus,
        completed_at: Option<i64>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE goals
             SET
                current_value = ?1,
                status = ?2,
                completed_at = COALESCE(completed_at, ?3)
             WHERE id = ?4;",
            params![
                current_value,
                goal_status_to_db(status),
                completed_at,
                id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_goal_row(row: &Row<'_>) -> RepoResult<Goal> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;

    let type_text: String = row.get("goal_type")?;
    let goal_type = parse_goal_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid goal type `{type_text}` in goals.goal_type"))
    })?;

    let target_text: String = row.get("target_type")?;
    let target_type = parse_target_type(&target_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid target type `{target_text}` in goals.target_type"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_goal_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in goals.status"))
    })?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(parse_date(&value, "goals.due_date")?),
        None => None,
    };

    Ok(Goal {
        id: parse_uuid(&id_text, "goals.id")?,
        user_id: parse_uuid(&user_text, "goals.user_id")?,
        title: row.get("title")?,
        goal_type,
        target_type,
        target_value: row.get("target_value")?,
        target_skill_id: row.get("target_skill_id")?,
        target_domain: row.get("target_domain")?,
        current_value: row.get("current_value")?,
        status,
        due_date,
        completed_at: row.get("completed_at")?,
        created_at: row.get("created_at")?,
    })
}
