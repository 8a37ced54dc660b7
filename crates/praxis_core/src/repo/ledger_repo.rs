//! XP ledger repository.
//!
//! # Responsibility
//! - Append audit entries for every XP grant/adjustment.
//! - Remove entries for one source as part of reflection deletion, and
//!   report the removed sum so the aggregate can be decremented by exactly
//!   that amount.
//!
//! # Invariants
//! - No update API: the ledger is append-only outside of source removal.
//! - `remove_for_source` is scoped by user, source type and source id.

use crate::model::ledger::{parse_xp_source, XpLedgerEntry, XpSource};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult, TableSpec};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const LEDGER_TABLES: &[TableSpec] = &[(
    "xp_ledger",
    &[
        "id",
        "user_id",
        "amount",
        "source_type",
        "source_id",
        "description",
        "created_at",
    ],
)];

/// Repository interface for the append-only XP ledger.
pub trait LedgerRepository {
    /// Appends one entry and returns it with the assigned rowid.
    fn append(&self, entry: &XpLedgerEntry) -> RepoResult<XpLedgerEntry>;
    /// Deletes all entries for one (user, source, source_id) and returns
    /// the sum of the removed amounts.
    fn remove_for_source(
        &self,
        user_id: UserId,
        source: XpSource,
        source_id: Uuid,
    ) -> RepoResult<i64>;
    /// Sum of all entries for one user.
    fn sum_for_user(&self, user_id: UserId) -> RepoResult<i64>;
    /// Entries for one user, newest first.
    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<XpLedgerEntry>>;
}

/// SQLite-backed ledger repository.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, LEDGER_TABLES)?;
        Ok(Self { conn })
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn append(&self, entry: &XpLedgerEntry) -> RepoResult<XpLedgerEntry> {
        self.conn.execute(
            "INSERT INTO xp_ledger (
                user_id,
                amount,
                source_type,
                source_id,
                description,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.user_id.to_string(),
                entry.amount,
                entry.source.as_str(),
                entry.source_id.map(|id| id.to_string()),
                entry.description.as_str(),
                entry.created_at,
            ],
        )?;

        let mut persisted = entry.clone();
        persisted.id = self.conn.last_insert_rowid();
        Ok(persisted)
    }

    fn remove_for_source(
        &self,
        user_id: UserId,
        source: XpSource,
        source_id: Uuid,
    ) -> RepoResult<i64> {
        let removed: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0)
             FROM xp_ledger
             WHERE user_id = ?1
               AND source_type = ?2
               AND source_id = ?3;",
            params![
                user_id.to_string(),
                source.as_str(),
                source_id.to_string()
            ],
            |row| row.get(0),
        )?;

        self.conn.execute(
            "DELETE FROM xp_ledger
             WHERE user_id = ?1
               AND source_type = ?2
               AND source_id = ?3;",
            params![
                user_id.to_string(),
                source.as_str(),
                source_id.to_string()
            ],
        )?;

        Ok(removed)
    }

    fn sum_for_user(&self, user_id: UserId) -> RepoResult<i64> {
        let total: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM xp_ledger WHERE user_id = ?1;",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<XpLedgerEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, amount, source_type, source_id, description, created_at
             FROM xp_ledger
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_ledger_row(row)?);
        }
        Ok(entries)
    }
}

fn parse_ledger_row(row: &Row<'_>) -> RepoResult<XpLedgerEntry> {
    let user_text: String = row.get("user_id")?;
    let source_text: String = row.get("source_type")?;
    let source = parse_xp_source(&source_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid source value `{source_text}` in xp_ledger.source_type"
        ))
    })?;
    let source_id = match row.get::<_, Option<String>>("source_id")? {
        Some(value) => Some(parse_uuid(&value, "xp_ledger.source_id")?),
        None => None,
    };

    Ok(XpLedgerEntry {
        id: row.get("id")?,
        user_id: parse_uuid(&user_text, "xp_ledger.user_id")?,
        amount: row.get("amount")?,
        source,
        source_id,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}
