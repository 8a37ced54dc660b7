//! Reflection repository.
//!
//! # Responsibility
//! - Persist reflections with their resolved domain/skill tagging.
//! - Serve ownership-checked reads and hard deletion.
//!
//! # Invariants
//! - `domains` is stored as a JSON array in a TEXT column; order is
//!   preserved (first element is the primary domain).

use crate::model::reflection::{Reflection, ReflectionId};
use crate::model::user::UserId;
use crate::repo::{
    date_to_db, ensure_connection_ready, parse_date, parse_uuid, RepoError, RepoResult, TableSpec,
};
use rusqlite::{params, Connection, Row};

const REFLECTION_TABLES: &[TableSpec] = &[(
    "reflections",
    &[
        "id",
        "user_id",
        "primary_response",
        "follow_up_response",
        "domains",
        "skill_id",
        "skill_name",
        "prompt",
        "xp_earned",
        "logged_for_date",
        "created_at",
    ],
)];

const REFLECTION_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    primary_response,
    follow_up_response,
    domains,
    skill_id,
    skill_name,
    prompt,
    xp_earned,
    logged_for_date,
    created_at
FROM reflections";

/// Repository interface for reflection persistence.
pub trait ReflectionRepository {
    fn insert(&self, reflection: &Reflection) -> RepoResult<()>;
    fn get(&self, id: ReflectionId) -> RepoResult<Option<Reflection>>;
    /// Lists one user's reflections, newest first.
    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Reflection>>;
    /// Hard-deletes one reflection.
    fn delete(&self, id: ReflectionId) -> RepoResult<()>;
}

/// SQLite-backed reflection repository.
pub struct SqliteReflectionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReflectionRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REFLECTION_TABLES)?;
        Ok(Self { conn })
    }
}

impl ReflectionRepository for SqliteReflectionRepository<'_> {
    fn insert(&self, reflection: &Reflection) -> RepoResult<()> {
        let domains_json = serde_json::to_string(&reflection.domains).map_err(|err| {
            RepoError::InvalidData(format!("unserializable reflection domains: {err}"))
        })?;

        self.conn.execute(
            "INSERT INTO reflections (
                id,
                user_id,
                primary_response,
                follow_up_response,
                domains,
                skill_id,
                skill_name,
                prompt,
                xp_earned,
                logged_for_date,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                reflection.id.to_string(),
                reflection.user_id.to_string(),
                reflection.primary_response.as_str(),
                reflection.follow_up_response.as_deref(),
                domains_json,
                reflection.skill_id.as_deref(),
                reflection.skill_name.as_deref(),
                reflection.prompt.as_deref(),
                reflection.xp_earned,
                date_to_db(reflection.logged_for_date),
                reflection.created_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: ReflectionId) -> RepoResult<Option<Reflection>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REFLECTION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reflection_row(row)?));
        }
        Ok(None)
    }

    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<Reflection>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REFLECTION_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut reflections = Vec::new();
        while let Some(row) = rows.next()? {
            reflections.push(parse_reflection_row(row)?);
        }
        Ok(reflections)
    }

    fn delete(&self, id: ReflectionId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reflections WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_reflection_row(row: &Row<'_>) -> RepoResult<Reflection> {
    let id_text: String = row.get("id")?;
    let user_text: String = row.get("user_id")?;
    let date_text: String = row.get("logged_for_date")?;
    let domains_text: String = row.get("domains")?;
    let domains: Vec<String> = serde_json::from_str(&domains_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid domains value `{domains_text}` in reflections.domains"
        ))
    })?;

    Ok(Reflection {
        id: parse_uuid(&id_text, "reflections.id")?,
        user_id: parse_uuid(&user_text, "reflections.user_id")?,
        primary_response: row.get("primary_response")?,
        follow_up_response: row.get("follow_up_response")?,
        domains,
        skill_id: row.get("skill_id")?,
        skill_name: row.get("skill_name")?,
        prompt: row.get("prompt")?,
        xp_earned: row.get("xp_earned")?,
        logged_for_date: parse_date(&date_text, "reflections.logged_for_date")?,
        created_at: row.get("created_at")?,
    })
}
