//! Transactional intake orchestrators.
//!
//! # Responsibility
//! - Orchestrate scoring, streaks, goal matching, ledger and aggregate
//!   writes into single atomic units of work.
//! - Keep callers decoupled from storage and transaction details.
//!
//! # Invariants
//! - Every mutation path runs inside one IMMEDIATE transaction: partial
//!   writes never commit, and the write lock taken at BEGIN serializes
//!   concurrent intakes so the daily cap cannot be over-granted by a
//!   read-then-write race.
//! - The user aggregate and the ledger only change together.

use crate::config::ConfigError;
use crate::model::user::{User, UserId};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod goal_service;
pub mod reflection_service;
pub mod signal_service;

/// Service error for all intake surfaces.
///
/// HTTP mapping is a caller concern: `InvalidRequest`/`DateOutOfWindow`
/// are 400-class, `UnknownUser`/`NotFound` are 404-class, everything else
/// is 500-class.
#[derive(Debug)]
pub enum ServiceError {
    /// Request shape or content failed validation; nothing was written.
    InvalidRequest(String),
    /// Signal intake date outside the {today, yesterday} window.
    DateOutOfWindow { given: NaiveDate, today: NaiveDate },
    /// Unseen user id and auto-provisioning is disabled.
    UnknownUser(UserId),
    /// Target record missing or owned by another user.
    NotFound(Uuid),
    /// Service constructed with an invalid scoring configuration.
    Config(ConfigError),
    /// Persistence-layer failure; the enclosing transaction rolled back.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            Self::DateOutOfWindow { given, today } => write!(
                f,
                "date {given} outside allowed window (today {today} or yesterday)"
            ),
            Self::UnknownUser(id) => write!(f, "unknown user: {id}"),
            Self::NotFound(id) => write!(f, "not found: {id}"),
            Self::Config(err) => write!(f, "invalid scoring config: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ConfigError> for ServiceError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Loads the user aggregate, bootstrapping it when the sandbox identity
/// policy allows.
///
/// # Contract
/// - Must be called inside the caller's transaction: the bootstrap insert
///   commits or rolls back with the rest of the intake.
pub(crate) fn load_or_bootstrap_user(
    conn: &Connection,
    auto_provision: bool,
    now_ms: i64,
    user_id: UserId,
) -> Result<User, ServiceError> {
    let repo = SqliteUserRepository::try_new(conn)?;
    if let Some(user) = repo.get_user(user_id)? {
        return Ok(user);
    }
    if !auto_provision {
        return Err(ServiceError::UnknownUser(user_id));
    }

    let user = User::bootstrap(user_id, now_ms);
    repo.insert_bootstrap(&user)?;
    info!("event=user_bootstrap module=service status=ok user={user_id}");
    Ok(user)
}
