//! User aggregate repository.
//!
//! # Responsibility
//! - Read and bootstrap the single denormalized progression row per user.
//! - Apply aggregate progress deltas produced inside intake transactions.
//!
//! # Invariants
//! - `apply_progress` is only called from inside the transaction that also
//!   writes the justifying ledger/signal/reflection rows.
//! - Bootstrap is insert-only; it never overwrites an existing row.

use crate::model::user::{User, UserId};
use crate::progression::streak::StreakState;
use crate::repo::{
    date_to_db, ensure_connection_ready, parse_date, parse_uuid, RepoError, RepoResult, TableSpec,
};
use rusqlite::{params, Connection, Row};

const USER_TABLES: &[TableSpec] = &[(
    "users",
    &[
        "id",
        "display_name",
        "role",
        "total_xp",
        "current_streak",
        "longest_streak",
        "last_log_date",
        "created_at",
    ],
)];

const USER_SELECT_SQL: &str = "SELECT
    id,
    display_name,
    role,
    total_xp,
    current_streak,
    longest_streak,
    last_log_date,
    created_at
FROM users";

/// Aggregate progress delta applied by one intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressDelta {
    pub xp_delta: i64,
    pub streak: StreakState,
}

/// Repository interface for the user aggregate store.
pub trait UserRepository {
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Inserts the deterministic bootstrap row; fails if the id exists.
    fn insert_bootstrap(&self, user: &User) -> RepoResult<()>;
    /// Applies one intake's XP and streak delta to an existing row.
    fn apply_progress(&self, id: UserId, delta: &ProgressDelta) -> RepoResult<()>;
}

/// SQLite-backed user aggregate repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, USER_TABLES)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn insert_bootstrap(&self, user: &User) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO users (
                id,
                display_name,
                role,
                total_xp,
                current_streak,
                longest_streak,
                last_log_date,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                user.id.to_string(),
                user.display_name.as_str(),
                user.role.as_str(),
                user.total_xp,
                user.current_streak,
                user.longest_streak,
                user.last_log_date.map(date_to_db),
                user.created_at,
            ],
        )?;
        Ok(())
    }

    fn apply_progress(&self, id: UserId, delta: &ProgressDelta) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                total_xp = total_xp + ?1,
                current_streak = ?2,
                longest_streak = ?3,
                last_log_date = ?4
             WHERE id = ?5;",
            params![
                delta.xp_delta,
                delta.streak.current,
                delta.streak.longest,
                delta.streak.last_log_date.map(date_to_db),
                id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let last_log_date = match row.get::<_, Option<String>>("last_log_date")? {
        Some(value) => Some(parse_date(&value, "users.last_log_date")?),
        None => None,
    };

    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        display_name: row.get("display_name")?,
        role: row.get("role")?,
        total_xp: row.get("total_xp")?,
        current_streak: row.get("current_streak")?,
        longest_streak: row.get("longest_streak")?,
        last_log_date,
        created_at: row.get("created_at")?,
    })
}
