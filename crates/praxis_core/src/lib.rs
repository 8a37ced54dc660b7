//! Core progression engine for Praxis.
//! This crate is the single source of truth for XP, streak and goal
//! invariants.

pub mod classify;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod progression;
pub mod repo;
pub mod service;

pub use classify::{Classification, ClassifyError, ReflectionClassifier, UnavailableClassifier};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, ScoringConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::goal::{Goal, GoalId, GoalStatus, GoalTargetType, GoalType};
pub use model::ledger::{XpLedgerEntry, XpSource};
pub use model::reflection::{Reflection, ReflectionId, DEFAULT_DOMAIN};
pub use model::signal::{Signal, SignalDraft, SignalId, SubskillProgress};
pub use model::user::{User, UserId};
pub use progression::goal_match::{Activity, GoalMatchOutcome};
pub use repo::{RepoError, RepoResult};
pub use service::goal_service::{GoalCreateRequest, GoalPatch, GoalService};
pub use service::reflection_service::{
    ReflectionIntakeRequest, ReflectionIntakeResult, ReflectionService,
};
pub use service::signal_service::{SignalIntakeRequest, SignalIntakeResult, SignalService};
pub use service::ServiceError;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
