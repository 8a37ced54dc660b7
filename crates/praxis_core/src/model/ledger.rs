//! XP ledger entry model.
//!
//! # Responsibility
//! - Define the append-only audit record behind every XP mutation.
//! - Provide stable string forms for the `source_type` column.
//!
//! # Invariants
//! - Entries are written only inside an intake transaction.
//! - The only removal path is reflection deletion, which targets
//!   `source = Reflection` plus a matching `source_id`.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Origin of one XP grant or adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    Signal,
    Reflection,
    VarietyBonus,
}

impl XpSource {
    /// Stable string id used in the `source_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Signal => "signal",
            Self::Reflection => "reflection",
            Self::VarietyBonus => "variety_bonus",
        }
    }
}

/// Parses one ledger source from its stored string form.
pub fn parse_xp_source(value: &str) -> Option<XpSource> {
    match value {
        "signal" => Some(XpSource::Signal),
        "reflection" => Some(XpSource::Reflection),
        "variety_bonus" => Some(XpSource::VarietyBonus),
        _ => None,
    }
}

/// One append-only XP audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpLedgerEntry {
    /// SQLite rowid; zero until persisted.
    pub id: i64,
    pub user_id: UserId,
    pub amount: i64,
    pub source: XpSource,
    /// Absent for variety bonuses, which aggregate a whole batch.
    pub source_id: Option<Uuid>,
    pub description: String,
    /// Write timestamp in epoch milliseconds.
    pub created_at: i64,
}

impl XpLedgerEntry {
    /// Builds an unpersisted entry; the repository assigns the rowid.
    pub fn new(
        user_id: UserId,
        amount: i64,
        source: XpSource,
        source_id: Option<Uuid>,
        description: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: 0,
            user_id,
            amount,
            source,
            source_id,
            description: description.into(),
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_xp_source, XpSource};

    #[test]
    fn source_strings_roundtrip() {
        for source in [XpSource::Signal, XpSource::Reflection, XpSource::VarietyBonus] {
            assert_eq!(parse_xp_source(source.as_str()), Some(source));
        }
        assert_eq!(parse_xp_source("bonus"), None);
    }
}
