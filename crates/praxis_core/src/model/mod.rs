//! Domain records for the progression engine.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep one storage-shaped record per concept (user, signal, reflection,
//!   goal, ledger entry).
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Ledger entries are append-only; the only removal path is reflection
//!   deletion.

pub mod goal;
pub mod ledger;
pub mod reflection;
pub mod signal;
pub mod user;

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid slug regex"));

/// Returns whether `value` is a usable external identifier slug.
///
/// Subskill ids, template ids and domain names all arrive from clients as
/// free strings; the core only accepts lowercase slug shapes.
pub fn is_valid_slug(value: &str) -> bool {
    SLUG_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::is_valid_slug;

    #[test]
    fn accepts_lowercase_slugs() {
        assert!(is_valid_slug("classroom_management"));
        assert!(is_valid_slug("wait-time"));
        assert!(is_valid_slug("q3"));
    }

    #[test]
    fn rejects_empty_uppercase_and_spaced_values() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Wait Time"));
        assert!(!is_valid_slug("UPPER"));
        assert!(!is_valid_slug("-leading-dash"));
    }
}
