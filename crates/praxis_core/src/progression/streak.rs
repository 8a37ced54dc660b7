//! Consecutive-day streak calculation.
//!
//! # Responsibility
//! - Advance a user's streak counters from one activity write.
//!
//! # Invariants
//! - `longest` never decreases across any sequence of updates.
//! - Re-logging on the same calendar day is idempotent.
//! - Continuity is evaluated against the wall-clock day of the write, not
//!   the activity's own logged-for date. Logging "for yesterday" while it
//!   is calendar-today therefore does not extend yesterday's streak.

use chrono::{Days, NaiveDate};

/// Streak fields of the user aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current: u32,
    pub longest: u32,
    pub last_log_date: Option<NaiveDate>,
}

/// Advances the streak for an activity happening on `today`.
pub fn advance_streak(state: StreakState, today: NaiveDate) -> StreakState {
    let yesterday = today.checked_sub_days(Days::new(1));

    let current = match state.last_log_date {
        Some(last) if last == today => state.current,
        Some(last) if Some(last) == yesterday => state.current + 1,
        _ => 1,
    };

    StreakState {
        current,
        longest: state.longest.max(current),
        last_log_date: Some(today),
    }
}
