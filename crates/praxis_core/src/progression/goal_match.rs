//! Goal matching and progress advancement.
//!
//! # Responsibility
//! - Evaluate one activity against a user's active goals and compute the
//!   resulting progress deltas and completions.
//!
//! # Invariants
//! - Terminal goals never match.
//! - `current_value` is not clamped on completion; overshoot survives.
//! - Signal batches match no goal under current wiring; only reflections
//!   advance goals. The activity enum keeps that a single, reviewable
//!   decision point.

use crate::model::goal::{Goal, GoalId, GoalTargetType};

/// One unit of activity, consumed uniformly by streaks and goal matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    SignalBatch {
        subskill_ids: Vec<String>,
    },
    Reflection {
        skill_id: Option<String>,
        domains: Vec<String>,
    },
}

/// Progress outcome for one matched goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalMatchOutcome {
    pub goal_id: GoalId,
    pub title: String,
    /// Value after this match.
    pub current_value: i64,
    pub target_value: i64,
    /// Whether this match pushed the goal to `Completed`.
    pub completed: bool,
}

/// Matches one activity against a set of goals.
///
/// Returns one outcome per matched goal, in input order. Callers persist
/// the new values and stamp `completed_at` for completions.
pub fn match_goals(goals: &[Goal], activity: &Activity) -> Vec<GoalMatchOutcome> {
    goals
        .iter()
        .filter(|goal| !goal.status.is_terminal())
        .filter(|goal| matches_activity(goal, activity))
        .map(|goal| {
            let current_value = goal.current_value + 1;
            GoalMatchOutcome {
                goal_id: goal.id,
                title: goal.title.clone(),
                current_value,
                target_value: goal.target_value,
                completed: current_value >= goal.target_value,
            }
        })
        .collect()
}

fn matches_activity(goal: &Goal, activity: &Activity) -> bool {
    let (skill_id, domains) = match activity {
        // Current wiring: signals do not advance goals of any target type.
        Activity::SignalBatch { .. } => return false,
        Activity::Reflection { skill_id, domains } => (skill_id, domains),
    };

    match goal.target_type {
        GoalTargetType::ReflectionCount => true,
        GoalTargetType::SkillFocus => match (&goal.target_skill_id, skill_id) {
            (Some(target), Some(actual)) => target == actual,
            _ => false,
        },
        GoalTargetType::DomainFocus => goal
            .target_domain
            .as_ref()
            .is_some_and(|target| domains.iter().any(|domain| domain == target)),
    }
}

#[cfg(test)]
mod tests {
    use super::{match_goals, Activity};
    use crate::model::goal::{Goal, GoalStatus, GoalTargetType, GoalType};
    use uuid::Uuid;

    fn goal(target_type: GoalTargetType, current: i64, target: i64) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "test goal".to_string(),
            goal_type: GoalType::Weekly,
            target_type,
            target_value: target,
            target_skill_id: None,
            target_domain: None,
            current_value: current,
            status: GoalStatus::Active,
            due_date: None,
            completed_at: None,
            created_at: 0,
        }
    }

    fn reflection(skill: Option<&str>, domains: &[&str]) -> Activity {
        Activity::Reflection {
            skill_id: skill.map(str::to_string),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn reflection_count_matches_every_reflection() {
        let goals = vec![goal(GoalTargetType::ReflectionCount, 0, 3)];
        let outcomes = match_goals(&goals, &reflection(None, &[]));
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].current_value, 1);
        assert!(!outcomes[0].completed);
    }

    #[test]
    fn skill_focus_requires_exact_skill_match() {
        let mut g = goal(GoalTargetType::SkillFocus, 0, 2);
        g.target_skill_id = Some("wait-time".to_string());
        let goals = vec![g];

        assert!(match_goals(&goals, &reflection(Some("wait-time"), &[])).len() == 1);
        assert!(match_goals(&goals, &reflection(Some("cold-call"), &[])).is_empty());
        assert!(match_goals(&goals, &reflection(None, &[])).is_empty());
    }

    #[test]
    fn domain_focus_matches_any_listed_domain() {
        let mut g = goal(GoalTargetType::DomainFocus, 0, 2);
        g.target_domain = Some("instruction".to_string());
        let goals = vec![g];

        assert_eq!(
            match_goals(&goals, &reflection(None, &["assessment", "instruction"])).len(),
            1
        );
        assert!(match_goals(&goals, &reflection(None, &["assessment"])).is_empty());
    }

    #[test]
    fn completion_fires_at_target_without_clamping() {
        let goals = vec![goal(GoalTargetType::ReflectionCount, 2, 3)];
        let outcomes = match_goals(&goals, &reflection(None, &[]));
        assert!(outcomes[0].completed);
        assert_eq!(outcomes[0].current_value, 3);

        // Overshoot: already past target but still active.
        let goals = vec![goal(GoalTargetType::ReflectionCount, 7, 3)];
        let outcomes = match_goals(&goals, &reflection(None, &[]));
        assert!(outcomes[0].completed);
        assert_eq!(outcomes[0].current_value, 8);
    }

    #[test]
    fn terminal_goals_never_match() {
        let mut completed = goal(GoalTargetType::ReflectionCount, 3, 3);
        completed.status = GoalStatus::Completed;
        let mut abandoned = goal(GoalTargetType::ReflectionCount, 1, 3);
        abandoned.status = GoalStatus::Abandoned;

        assert!(match_goals(&[completed, abandoned], &reflection(None, &[])).is_empty());
    }

    #[test]
    fn signal_batches_do_not_advance_goals() {
        let goals = vec![goal(GoalTargetType::ReflectionCount, 0, 3)];
        let activity = Activity::SignalBatch {
            subskill_ids: vec!["wait-time".to_string()],
        };
        assert!(match_goals(&goals, &activity).is_empty());
    }
}
