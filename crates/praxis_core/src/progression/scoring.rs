//! Signal batch scoring: diminishing returns, daily cap, variety bonus.
//!
//! # Responsibility
//! - Compute the final per-signal XP for one batch against one day's
//!   already-persisted state.
//!
//! # Invariants
//! - `sum(existing day XP) + total_new_xp <= daily_cap` always.
//! - Every per-signal value is floored independently; the batch total is
//!   the sum of the final per-signal values, so the ledger and the user
//!   aggregate can never drift apart.
//! - The variety bonus is exempt from the cap.

use crate::config::ScoringConfig;
use crate::model::signal::{Signal, SignalDraft};
use std::collections::HashMap;

/// Already-persisted scoring state for one (user, day).
#[derive(Debug, Clone, Default)]
pub struct DayState {
    /// Sum of `xp_earned` over the day's existing signals.
    pub xp_already_earned: i64,
    /// Same-day signal count per subskill.
    pub subskill_counts: HashMap<String, u32>,
}

impl DayState {
    /// Derives the day state from that day's persisted signals.
    pub fn from_signals(signals: &[Signal]) -> Self {
        let mut state = Self::default();
        for signal in signals {
            state.xp_already_earned += signal.xp_earned;
            *state
                .subskill_counts
                .entry(signal.subskill_id.clone())
                .or_insert(0) += 1;
        }
        state
    }
}

/// Scoring result for one batch, aligned with the draft order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchScore {
    /// Final XP per draft, after diminishing returns and cap rescale.
    pub per_signal_xp: Vec<i64>,
    /// Sum of `per_signal_xp`.
    pub total_new_xp: i64,
    /// Cap-exempt bonus for distinct subskills first touched today.
    pub variety_bonus: i64,
    /// `total_new_xp + variety_bonus`.
    pub total_awarded: i64,
}

/// Scores one signal batch against the day's existing state.
///
/// Order matters: each draft sees the same-day occurrences of its subskill
/// from both persisted signals and earlier drafts in this batch.
pub fn score_signal_batch(
    config: &ScoringConfig,
    day: &DayState,
    drafts: &[SignalDraft],
) -> BatchScore {
    let mut seen_counts = day.subskill_counts.clone();
    let mut adjusted: Vec<i64> = Vec::with_capacity(drafts.len());
    let mut fresh_subskills = 0i64;

    for draft in drafts {
        let prior = seen_counts.entry(draft.subskill_id.clone()).or_insert(0);
        if *prior == 0 && !day.subskill_counts.contains_key(&draft.subskill_id) {
            fresh_subskills += 1;
        }
        let multiplier = config.multiplier_for_repetition(*prior);
        adjusted.push((draft.xp_value as f64 * multiplier).floor() as i64);
        *prior += 1;
    }

    // The batch total is accumulated in i128: per-signal values are bounded
    // only at >= 0, so an i64 sum could overflow and skip the cap guard.
    let raw_total: i128 = adjusted.iter().map(|&xp| i128::from(xp)).sum();
    let remaining_cap = config.daily_cap - day.xp_already_earned;
    let per_signal_xp = if raw_total > i128::from(remaining_cap) {
        if remaining_cap <= 0 {
            vec![0; adjusted.len()]
        } else {
            // Integer rescale; i128 keeps the product exact for any i64 input.
            adjusted
                .iter()
                .map(|&xp| (i128::from(xp) * i128::from(remaining_cap) / raw_total) as i64)
                .collect()
        }
    } else {
        adjusted
    };

    let total_new_xp: i64 = per_signal_xp.iter().sum();
    let variety_bonus = fresh_subskills * config.variety_bonus_per_subskill;

    BatchScore {
        per_signal_xp,
        total_new_xp,
        variety_bonus,
        total_awarded: total_new_xp + variety_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::{score_signal_batch, DayState};
    use crate::config::ScoringConfig;
    use crate::model::signal::SignalDraft;
    use std::collections::HashMap;

    fn draft(subskill: &str, xp: i64) -> SignalDraft {
        SignalDraft {
            template_id: "t1".to_string(),
            subskill_id: subskill.to_string(),
            xp_value: xp,
            note: None,
        }
    }

    fn day(xp: i64, counts: &[(&str, u32)]) -> DayState {
        DayState {
            xp_already_earned: xp,
            subskill_counts: counts
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn diminishing_returns_floor_each_step() {
        let config = ScoringConfig::default();
        let drafts = vec![draft("s1", 10), draft("s1", 10), draft("s1", 10), draft("s1", 10)];
        let score = score_signal_batch(&config, &DayState::default(), &drafts);
        assert_eq!(score.per_signal_xp, vec![10, 5, 2, 1]);
        assert_eq!(score.total_new_xp, 18);
    }

    #[test]
    fn existing_day_occurrences_push_the_table_forward() {
        let config = ScoringConfig::default();
        let state = day(15, &[("s1", 2)]);
        let score = score_signal_batch(&config, &state, &[draft("s1", 10)]);
        // Third repetition today: multiplier 0.25.
        assert_eq!(score.per_signal_xp, vec![2]);
        assert_eq!(score.variety_bonus, 0);
    }

    #[test]
    fn cap_rescales_proportionally_with_floor() {
        let config = ScoringConfig {
            daily_cap: 20,
            ..ScoringConfig::default()
        };
        let state = day(10, &[("s0", 1)]);
        let score = score_signal_batch(&config, &state, &[draft("s1", 15), draft("s2", 5)]);
        // remaining=10, raw total=20 -> ratio 0.5
        assert_eq!(score.per_signal_xp, vec![7, 2]);
        assert_eq!(score.total_new_xp, 9);
        assert!(state.xp_already_earned + score.total_new_xp <= config.daily_cap);
    }

    #[test]
    fn exhausted_cap_zeroes_every_signal_but_not_the_bonus() {
        let config = ScoringConfig::default();
        let state = day(config.daily_cap, &[("s0", 3)]);
        let score = score_signal_batch(&config, &state, &[draft("s1", 10), draft("s2", 10)]);
        assert_eq!(score.per_signal_xp, vec![0, 0]);
        assert_eq!(score.total_new_xp, 0);
        assert_eq!(score.variety_bonus, 2 * config.variety_bonus_per_subskill);
        assert_eq!(score.total_awarded, score.variety_bonus);
    }

    #[test]
    fn extreme_base_values_still_respect_the_cap() {
        let config = ScoringConfig::default();
        let drafts = vec![draft("s1", i64::MAX), draft("s2", i64::MAX)];
        let score = score_signal_batch(&config, &DayState::default(), &drafts);
        assert!(score.total_new_xp <= config.daily_cap);
        assert!(score.per_signal_xp.iter().all(|&xp| (0..=config.daily_cap).contains(&xp)));
        assert_eq!(score.total_new_xp, score.per_signal_xp.iter().sum::<i64>());
    }

    #[test]
    fn variety_bonus_counts_distinct_new_subskills_once() {
        let config = ScoringConfig::default();
        let state = day(10, &[("seen", 1)]);
        let drafts = vec![
            draft("fresh-a", 10),
            draft("fresh-a", 10),
            draft("fresh-b", 10),
            draft("seen", 10),
        ];
        let score = score_signal_batch(&config, &state, &drafts);
        assert_eq!(score.variety_bonus, 2 * config.variety_bonus_per_subskill);
    }

    #[test]
    fn day_state_from_signals_accumulates_counts_and_xp() {
        use crate::model::signal::Signal;
        use chrono::NaiveDate;
        use uuid::Uuid;

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let user_id = Uuid::new_v4();
        let signal = |subskill: &str, xp: i64| Signal {
            id: Uuid::new_v4(),
            user_id,
            subskill_id: subskill.to_string(),
            template_id: "t1".to_string(),
            logged_for_date: date,
            xp_earned: xp,
            note: None,
            created_at: 0,
        };

        let state = DayState::from_signals(&[signal("s1", 10), signal("s1", 5), signal("s2", 3)]);
        assert_eq!(state.xp_already_earned, 18);
        assert_eq!(state.subskill_counts.get("s1"), Some(&2));
        assert_eq!(state.subskill_counts.get("s2"), Some(&1));
    }
}
