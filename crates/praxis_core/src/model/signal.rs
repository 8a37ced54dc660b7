//! Practice signal model.
//!
//! # Responsibility
//! - Define the persisted signal record and the client-facing draft shape.
//! - Validate draft input before any scoring or persistence happens.
//!
//! # Invariants
//! - A persisted signal is immutable; `xp_earned` is the post-scoring value,
//!   never the raw base value from the draft.

use crate::model::is_valid_slug;
use crate::model::user::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a persisted signal.
pub type SignalId = Uuid;

/// One logged observation of practice, already scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    pub user_id: UserId,
    pub subskill_id: String,
    pub template_id: String,
    /// Calendar day the practice happened (time of day discarded).
    pub logged_for_date: NaiveDate,
    /// XP after diminishing returns and daily-cap rescale.
    pub xp_earned: i64,
    pub note: Option<String>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

/// Client-submitted signal before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalDraft {
    pub template_id: String,
    pub subskill_id: String,
    /// Base XP value of the prompt template, pre-scoring.
    pub xp_value: i64,
    pub note: Option<String>,
}

/// Draft validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalDraftError {
    InvalidSubskillId(String),
    InvalidTemplateId(String),
    NegativeXpValue(i64),
}

impl Display for SignalDraftError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSubskillId(value) => write!(f, "invalid subskill id: `{value}`"),
            Self::InvalidTemplateId(value) => write!(f, "invalid template id: `{value}`"),
            Self::NegativeXpValue(value) => write!(f, "xp value must be >= 0, got {value}"),
        }
    }
}

impl Error for SignalDraftError {}

impl SignalDraft {
    /// Checks identifier shapes and base XP range.
    pub fn validate(&self) -> Result<(), SignalDraftError> {
        if !is_valid_slug(&self.subskill_id) {
            return Err(SignalDraftError::InvalidSubskillId(self.subskill_id.clone()));
        }
        if !is_valid_slug(&self.template_id) {
            return Err(SignalDraftError::InvalidTemplateId(self.template_id.clone()));
        }
        if self.xp_value < 0 {
            return Err(SignalDraftError::NegativeXpValue(self.xp_value));
        }
        Ok(())
    }
}

/// Per-(user, subskill) rollup advanced by signal intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubskillProgress {
    pub user_id: UserId,
    pub subskill_id: String,
    pub xp_earned: i64,
    pub signal_count: u32,
    pub last_signal_date: NaiveDate,
}
