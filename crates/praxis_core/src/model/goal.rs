//! Goal model and lifecycle vocabulary.
//!
//! # Responsibility
//! - Define the self-set goal record, its kind/target/status enums and the
//!   stable string forms used by storage.
//! - Validate the companion-field rules that depend on the target type.
//!
//! # Invariants
//! - `Completed` and `Abandoned` are terminal: a terminal goal is never
//!   matched again by the progress updater.
//! - `current_value` is not clamped on completion; overshoot is preserved.

use crate::model::user::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a goal.
pub type GoalId = Uuid;

/// Cadence of a goal; drives due-date derivation at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Weekly,
    Monthly,
    Custom,
}

/// What a goal counts toward its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalTargetType {
    ReflectionCount,
    SkillFocus,
    DomainFocus,
}

/// Lifecycle state. `Completed` and `Abandoned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

impl GoalStatus {
    /// Terminal goals are excluded from matching and auto-completion.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

/// A user-defined target tracked to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub title: String,
    pub goal_type: GoalType,
    pub target_type: GoalTargetType,
    pub target_value: i64,
    /// Required when `target_type == SkillFocus`.
    pub target_skill_id: Option<String>,
    /// Required when `target_type == DomainFocus`.
    pub target_domain: Option<String>,
    pub current_value: i64,
    pub status: GoalStatus,
    pub due_date: Option<NaiveDate>,
    /// Set once, when the goal first reaches `Completed`.
    pub completed_at: Option<i64>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

/// Goal shape validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    TargetValueTooSmall(i64),
    MissingTargetSkill,
    MissingTargetDomain,
    MissingCustomDueDate,
    EmptyTitle,
}

impl Display for GoalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetValueTooSmall(value) => {
                write!(f, "target value must be >= 1, got {value}")
            }
            Self::MissingTargetSkill => {
                write!(f, "skill_focus goals require a target skill id")
            }
            Self::MissingTargetDomain => {
                write!(f, "domain_focus goals require a target domain")
            }
            Self::MissingCustomDueDate => {
                write!(f, "custom goals require an explicit due date")
            }
            Self::EmptyTitle => write!(f, "goal title must not be empty"),
        }
    }
}

impl Error for GoalValidationError {}

impl Goal {
    /// Checks target-value range and companion-field presence.
    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.title.trim().is_empty() {
            return Err(GoalValidationError::EmptyTitle);
        }
        if self.target_value < 1 {
            return Err(GoalValidationError::TargetValueTooSmall(self.target_value));
        }
        if self.goal_type == GoalType::Custom && self.due_date.is_none() {
            return Err(GoalValidationError::MissingCustomDueDate);
        }
        match self.target_type {
            GoalTargetType::SkillFocus if self.target_skill_id.is_none() => {
                Err(GoalValidationError::MissingTargetSkill)
            }
            GoalTargetType::DomainFocus if self.target_domain.is_none() => {
                Err(GoalValidationError::MissingTargetDomain)
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn goal_type_to_db(value: GoalType) -> &'static str {
    match value {
        GoalType::Weekly => "weekly",
        GoalType::Monthly => "monthly",
        GoalType::Custom => "custom",
    }
}

pub(crate) fn parse_goal_type(value: &str) -> Option<GoalType> {
    match value {
        "weekly" => Some(GoalType::Weekly),
        "monthly" => Some(GoalType::Monthly),
        "custom" => Some(GoalType::Custom),
        _ => None,
    }
}

pub(crate) fn target_type_to_db(value: GoalTargetType) -> &'static str {
    match value {
        GoalTargetType::ReflectionCount => "reflection_count",
        GoalTargetType::SkillFocus => "skill_focus",
        GoalTargetType::DomainFocus => "domain_focus",
    }
}

pub(crate) fn parse_target_type(value: &str) -> Option<GoalTargetType> {
    match value {
        "reflection_count" => Some(GoalTargetType::ReflectionCount),
        "skill_focus" => Some(GoalTargetType::SkillFocus),
        "domain_focus" => Some(GoalTargetType::DomainFocus),
        _ => None,
    }
}

pub(crate) fn goal_status_to_db(value: GoalStatus) -> &'static str {
    match value {
        GoalStatus::Active => "active",
        GoalStatus::Completed => "completed",
        GoalStatus::Abandoned => "abandoned",
    }
}

pub(crate) fn parse_goal_status(value: &str) -> Option<GoalStatus> {
    match value {
        "active" => Some(GoalStatus::Active),
        "completed" => Some(GoalStatus::Completed),
        "abandoned" => Some(GoalStatus::Abandoned),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn goal(target_type: GoalTargetType) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "five reflections".to_string(),
            goal_type: GoalType::Weekly,
            target_type,
            target_value: 5,
            target_skill_id: None,
            target_domain: None,
            current_value: 0,
            status: GoalStatus::Active,
            due_date: NaiveDate::from_ymd_opt(2026, 3, 8),
            completed_at: None,
            created_at: 0,
        }
    }

    #[test]
    fn reflection_count_needs_no_companion_field() {
        assert!(goal(GoalTargetType::ReflectionCount).validate().is_ok());
    }

    #[test]
    fn focus_targets_require_companion_fields() {
        assert_eq!(
            goal(GoalTargetType::SkillFocus).validate(),
            Err(GoalValidationError::MissingTargetSkill)
        );
        assert_eq!(
            goal(GoalTargetType::DomainFocus).validate(),
            Err(GoalValidationError::MissingTargetDomain)
        );

        let mut skill = goal(GoalTargetType::SkillFocus);
        skill.target_skill_id = Some("wait-time".to_string());
        assert!(skill.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_target_and_empty_title() {
        let mut g = goal(GoalTargetType::ReflectionCount);
        g.target_value = 0;
        assert_eq!(
            g.validate(),
            Err(GoalValidationError::TargetValueTooSmall(0))
        );

        let mut g = goal(GoalTargetType::ReflectionCount);
        g.title = "   ".to_string();
        assert_eq!(g.validate(), Err(GoalValidationError::EmptyTitle));
    }

    #[test]
    fn terminal_statuses() {
        assert!(!GoalStatus::Active.is_terminal());
        assert!(GoalStatus::Completed.is_terminal());
        assert!(GoalStatus::Abandoned.is_terminal());
    }

    #[test]
    fn db_strings_roundtrip() {
        for value in [GoalType::Weekly, GoalType::Monthly, GoalType::Custom] {
            assert_eq!(parse_goal_type(goal_type_to_db(value)), Some(value));
        }
        for value in [
            GoalTargetType::ReflectionCount,
            GoalTargetType::SkillFocus,
            GoalTargetType::DomainFocus,
        ] {
            assert_eq!(parse_target_type(target_type_to_db(value)), Some(value));
        }
        for value in [GoalStatus::Active, GoalStatus::Completed, GoalStatus::Abandoned] {
            assert_eq!(parse_goal_status(goal_status_to_db(value)), Some(value));
        }
    }
}
