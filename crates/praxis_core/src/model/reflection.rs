//! Reflection model.
//!
//! # Responsibility
//! - Define the longer-form reflection record and its input shape.
//! - Keep the XP plumbing in place even while reflection XP is fixed at 0.
//!
//! # Invariants
//! - `domains` is ordered; the first element is the primary domain.
//! - A reflection may be deleted; deletion reverses only its ledger effect.

use crate::model::user::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a persisted reflection.
pub type ReflectionId = Uuid;

/// Domain assigned when neither the caller nor the classifier supplies one.
pub const DEFAULT_DOMAIN: &str = "general_practice";

/// One longer-form reflection, stored with its resolved tagging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub id: ReflectionId,
    pub user_id: UserId,
    pub primary_response: String,
    pub follow_up_response: Option<String>,
    /// Ordered; index 0 is treated as the primary domain.
    pub domains: Vec<String>,
    pub skill_id: Option<String>,
    pub skill_name: Option<String>,
    pub prompt: Option<String>,
    /// Currently always 0; retained so re-enabling reflection XP is a
    /// config change, not a schema change.
    pub xp_earned: i64,
    /// Calendar day the reflection was logged.
    pub logged_for_date: NaiveDate,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

impl Reflection {
    /// Returns the primary domain, falling back to the configured default.
    pub fn primary_domain(&self) -> &str {
        self.domains
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_DOMAIN)
    }
}

#[cfg(test)]
mod tests {
    use super::{Reflection, DEFAULT_DOMAIN};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn reflection(domains: Vec<String>) -> Reflection {
        Reflection {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            primary_response: "tried longer wait time in third period".to_string(),
            follow_up_response: None,
            domains,
            skill_id: None,
            skill_name: None,
            prompt: None,
            xp_earned: 0,
            logged_for_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            created_at: 0,
        }
    }

    #[test]
    fn first_domain_is_primary() {
        let r = reflection(vec!["instruction".to_string(), "assessment".to_string()]);
        assert_eq!(r.primary_domain(), "instruction");
    }

    #[test]
    fn empty_domains_fall_back_to_default() {
        assert_eq!(reflection(vec![]).primary_domain(), DEFAULT_DOMAIN);
    }
}
