//! Wall-clock seam for date-window and streak decisions.
//!
//! # Responsibility
//! - Give services one injectable source of "now" so today/yesterday
//!   windows and streak continuity are deterministic under test.
//!
//! # Invariants
//! - All day-granularity decisions use `today()`; time of day is discarded
//!   at this boundary, never later.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current instant for intake decisions.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar day of `now()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// `now()` as epoch milliseconds, the storage timestamp format.
    fn now_epoch_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Production clock reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Pins the clock to noon UTC on the given calendar day.
    pub fn at_day(date: NaiveDate) -> Self {
        Self(
            date.and_hms_opt(12, 0, 0)
                .expect("noon is always a valid time")
                .and_utc(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};
    use chrono::NaiveDate;

    #[test]
    fn fixed_clock_reports_its_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let clock = FixedClock::at_day(day);
        assert_eq!(clock.today(), day);
        assert!(clock.now_epoch_ms() > 0);
    }
}
