//! Signal and subskill-progress repository.
//!
//! # Responsibility
//! - Persist scored signals and serve the same-day reads scoring needs.
//! - Maintain the per-(user, subskill) rollup via upsert.
//!
//! # Invariants
//! - Persisted signals are immutable; no update API exists.
//! - Day queries are keyed on the stored `logged_for_date`, never on
//!   creation timestamps.

use crate::model::signal::{Signal, SubskillProgress};
use crate::model::user::UserId;
use crate::repo::{
    date_to_db, ensure_connection_ready, parse_date, parse_uuid, RepoResult, TableSpec,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const SIGNAL_TABLES: &[TableSpec] = &[
    (
        "signals",
        &[
            "id",
            "user_id",
            "subskill_id",
            "template_id",
            "logged_for_date",
            "xp_earned",
            "note",
            "created_at",
        ],
    ),
    (
        "subskill_progress",
        &[
            "user_id",
            "subskill_id",
            "xp_earned",
            "signal_count",
            "last_signal_date",
        ],
    ),
];

const SIGNAL_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    subskill_id,
    template_id,
    logged_for_date,
    xp_earned,
    note,
    created_at
FROM signals";

/// Repository interface for signal persistence.
pub trait SignalRepository {
    fn insert_signal(&self, signal: &Signal) -> RepoResult<()>;
    /// Lists one user's signals for one calendar day, oldest first by
    /// creation timestamp. Rows sharing a timestamp have no defined
    /// relative order; day-state consumers are order-insensitive.
    fn list_for_date(&self, user_id: UserId, date: NaiveDate) -> RepoResult<Vec<Signal>>;
    /// Adds one signal's contribution to the per-subskill rollup.
    fn upsert_subskill_progress(
        &self,
        user_id: UserId,
        subskill_id: &str,
        xp_delta: i64,
        date: NaiveDate,
    ) -> RepoResult<()>;
    fn get_subskill_progress(
        &self,
        user_id: UserId,
        subskill_id: &str,
    ) -> RepoResult<Option<SubskillProgress>>;
}

/// SQLite-backed signal repository.
pub struct SqliteSignalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSignalRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, SIGNAL_TABLES)?;
        Ok(Self { conn })
    }
}

impl SignalRepository for SqliteSignalRepository<'_> {
    fn insert_signal(&self, signal: &Signal) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO signals (
                id,
                user_id,
                subskill_id,
                template_id,
                logged_for_date,
                xp_earned,
                note,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                signal.id.to_string(),
                signal.user_id.to_string(),
                signal.subskill_id.as_str(),
                signal.template_id.as_str(),
                date_to_db(signal.logged_for_date),
                signal.xp_earned,
                signal.note.as_deref(),
                signal.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_for_date(&self, user_id: UserId, date: NaiveDate) -> RepoResult<Vec<Signal>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SIGNAL_SELECT_SQL}
             WHERE user_id = ?1
               AND logged_for_date = ?2
             ORDER BY created_at ASC, id ASC;"
        ))?;

        let mut rows = stmt.query(params![user_id.to_string(), date_to_db(date)])?;
        let mut signals = Vec::new();
        while let Some(row) = rows.next()? {
            signals.push(parse_signal_row(row)?);
        }
        Ok(signals)
    }

    fn upsert_subskill_progress(
        &self,
        user_id: UserId,
        subskill_id: &str,
        xp_delta: i64,
        date: NaiveDate,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO subskill_progress (
                user_id,
                subskill_id,
                xp_earned,
                signal_count,
                last_signal_date
            ) VALUES (?1, ?2, ?3, 1, ?4)
            ON CONFLICT(user_id, subskill_id) DO UPDATE SET
                xp_earned = xp_earned + excluded.xp_earned,
                signal_count = signal_count + 1,
                last_signal_date = excluded.last_signal_date;",
            params![
                user_id.to_string(),
                subskill_id,
                xp_delta,
                date_to_db(date),
            ],
        )?;
        Ok(())
    }

    fn get_subskill_progress(
        &self,
        user_id: UserId,
        subskill_id: &str,
    ) -> RepoResult<Option<SubskillProgress>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, subskill_id, xp_earned, signal_count, last_signal_date
             FROM subskill_progress
             WHERE user_id = ?1 AND subskill_id = ?2;",
        )?;
        let mut rows = stmt.query(params![user_id.to_string(), subskill_id])?;
        if let Some(row) = rows.next()? {
            let user_text: String = row.get("user_id")?;
            let date_text: String = row.get("last_signal_date")?;
            return Ok(Some(SubskillProgress {
                user_id: parse_uuid(&user_text, "subskill_progress.user_id")?,
                subskill_id: row.get("subskill_id")?,
                xp_earned: row.get("xp_earned")?,
                signal_count: row.get("signal_count")?,
                last_signal_date: parse_date(&date_text, "subskill_progress.last_signal_date")?,
            }));
        }
        Ok(None)
    }
}

fn parse_signal_row(row: &Row<'_>) -> RepoResult<Signal> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let date_text: String = row.get("logged_for_date")?;

    Ok(Signal {
        id: parse_uuid(&id_text, "signals.id")?,
        user_id: parse_uuid(&user_text, "signals.user_id")?,
        subskill_id: row.get("subskill_id")?,
        template_id: row.get("template_id")?,
        logged_for_date: parse_date(&date_text, "signals.logged_for_date")?,
        xp_earned: row.get("xp_earned")?,
        note: row.get("note")?,
        created_at: row.get("created_at")?,
    })
}
