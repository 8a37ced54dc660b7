//! Injectable scoring configuration.
//!
//! # Responsibility
//! - Carry every tunable the progression engine consults, so scoring rules
//!   are testable and adjustable without code changes.
//!
//! # Invariants
//! - `validate()` must pass before a config is handed to any service.
//! - The multiplier table is consulted as `table[min(n, 3)]` where `n` is
//!   the count of prior same-day signals for the same subskill.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of diminishing-returns steps; repetitions beyond this reuse the
/// last multiplier.
pub const DIMINISHING_STEPS: usize = 4;

/// Tunables for signal scoring, streaks and sandbox identity policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Maximum total signal XP one user can earn per calendar day.
    pub daily_cap: i64,
    /// Multiplier applied to the nth same-day same-subskill signal.
    pub diminishing_multipliers: [f64; DIMINISHING_STEPS],
    /// Bonus per distinct subskill not yet logged that day. Exempt from
    /// the daily cap.
    pub variety_bonus_per_subskill: i64,
    /// Minimum trimmed length of a reflection's primary response.
    pub min_reflection_chars: usize,
    /// Sandbox/demo flag: when set, an unseen user id is bootstrapped on
    /// first write instead of being rejected.
    pub auto_provision_users: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            daily_cap: 100,
            diminishing_multipliers: [1.0, 0.5, 0.25, 0.1],
            variety_bonus_per_subskill: 5,
            min_reflection_chars: 10,
            auto_provision_users: false,
        }
    }
}

/// Config validation failures.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonPositiveDailyCap(i64),
    NegativeVarietyBonus(i64),
    MultiplierOutOfRange(f64),
    MultipliersNotDecreasing,
    ZeroMinReflectionChars,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveDailyCap(value) => {
                write!(f, "daily cap must be > 0, got {value}")
            }
            Self::NegativeVarietyBonus(value) => {
                write!(f, "variety bonus must be >= 0, got {value}")
            }
            Self::MultiplierOutOfRange(value) => {
                write!(f, "diminishing multiplier must be within [0, 1], got {value}")
            }
            Self::MultipliersNotDecreasing => {
                write!(f, "diminishing multipliers must be non-increasing")
            }
            Self::ZeroMinReflectionChars => {
                write!(f, "min reflection chars must be > 0")
            }
        }
    }
}

impl Error for ConfigError {}

impl ScoringConfig {
    /// Checks numeric ranges and multiplier-table monotonicity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_cap <= 0 {
            return Err(ConfigError::NonPositiveDailyCap(self.daily_cap));
        }
        if self.variety_bonus_per_subskill < 0 {
            return Err(ConfigError::NegativeVarietyBonus(
                self.variety_bonus_per_subskill,
            ));
        }
        for multiplier in self.diminishing_multipliers {
            if !(0.0..=1.0).contains(&multiplier) || !multiplier.is_finite() {
                return Err(ConfigError::MultiplierOutOfRange(multiplier));
            }
        }
        for pair in self.diminishing_multipliers.windows(2) {
            if pair[1] > pair[0] {
                return Err(ConfigError::MultipliersNotDecreasing);
            }
        }
        // A zero floor would admit empty reflections.
        if self.min_reflection_chars == 0 {
            return Err(ConfigError::ZeroMinReflectionChars);
        }
        Ok(())
    }

    /// Returns the multiplier for the nth repetition of a subskill today.
    pub fn multiplier_for_repetition(&self, prior_occurrences: u32) -> f64 {
        let index = (prior_occurrences as usize).min(DIMINISHING_STEPS - 1);
        self.diminishing_multipliers[index]
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ScoringConfig};

    #[test]
    fn default_config_is_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn repetition_lookup_saturates_at_last_step() {
        let config = ScoringConfig::default();
        assert_eq!(config.multiplier_for_repetition(0), 1.0);
        assert_eq!(config.multiplier_for_repetition(1), 0.5);
        assert_eq!(config.multiplier_for_repetition(2), 0.25);
        assert_eq!(config.multiplier_for_repetition(3), 0.1);
        assert_eq!(config.multiplier_for_repetition(17), 0.1);
    }

    #[test]
    fn rejects_bad_ranges() {
        let mut config = ScoringConfig {
            daily_cap: 0,
            ..ScoringConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveDailyCap(0)));

        config.daily_cap = 100;
        config.variety_bonus_per_subskill = -5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeVarietyBonus(-5))
        );

        config.variety_bonus_per_subskill = 5;
        config.diminishing_multipliers = [1.0, 1.5, 0.25, 0.1];
        assert_eq!(
            config.validate(),
            Err(ConfigError::MultiplierOutOfRange(1.5))
        );

        config.diminishing_multipliers = [0.5, 1.0, 0.25, 0.1];
        assert_eq!(config.validate(), Err(ConfigError::MultipliersNotDecreasing));

        config.diminishing_multipliers = [1.0, 0.5, 0.25, 0.1];
        config.min_reflection_chars = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMinReflectionChars));
    }
}
