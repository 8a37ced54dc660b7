//! User aggregate model.
//!
//! # Responsibility
//! - Hold the single denormalized progression row per user.
//! - Provide the deterministic bootstrap shape used by sandbox
//!   auto-provisioning.
//!
//! # Invariants
//! - `longest_streak >= current_streak` at all times.
//! - `total_xp` equals the sum of this user's ledger entries; both are only
//!   ever mutated inside the same transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a user aggregate row.
pub type UserId = Uuid;

/// Role assigned to auto-provisioned sandbox users.
pub const BOOTSTRAP_ROLE: &str = "teacher";

/// Denormalized progression aggregate, one row per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Synthesized on bootstrap, editable later by profile surfaces.
    pub display_name: String,
    /// Fixed to `teacher` on bootstrap.
    pub role: String,
    /// Sum of all ledger entries for this user.
    pub total_xp: i64,
    /// Consecutive-day activity counter.
    pub current_streak: u32,
    /// High-water mark of `current_streak`. Never decreases.
    pub longest_streak: u32,
    /// Calendar day of the most recent logged activity.
    pub last_log_date: Option<NaiveDate>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

impl User {
    /// Builds the deterministic bootstrap row for an unseen user id.
    ///
    /// # Contract
    /// - All counters start at zero, streak history empty.
    /// - `role` is fixed to [`BOOTSTRAP_ROLE`].
    pub fn bootstrap(id: UserId, created_at: i64) -> Self {
        Self {
            display_name: format!("teacher-{}", &id.to_string()[..8]),
            role: BOOTSTRAP_ROLE.to_string(),
            total_xp: 0,
            current_streak: 0,
            longest_streak: 0,
            last_log_date: None,
            created_at,
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{User, BOOTSTRAP_ROLE};
    use uuid::Uuid;

    #[test]
    fn bootstrap_row_starts_with_zero_counters() {
        let user = User::bootstrap(Uuid::new_v4(), 1_700_000_000_000);
        assert_eq!(user.total_xp, 0);
        assert_eq!(user.current_streak, 0);
        assert_eq!(user.longest_streak, 0);
        assert!(user.last_log_date.is_none());
        assert_eq!(user.role, BOOTSTRAP_ROLE);
        assert!(user.display_name.starts_with("teacher-"));
    }
}
