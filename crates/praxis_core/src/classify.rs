//! Reflection classification capability seam.
//!
//! # Responsibility
//! - Define the narrow contract the core consumes from an external text
//!   classifier, without depending on any concrete backend.
//! - Guarantee a fallback: classification failure never fails the
//!   enclosing reflection intake.
//!
//! # Invariants
//! - Implementations must bound their own latency and surface overruns as
//!   `ClassifyError::Timeout`; the core never blocks indefinitely here.
//! - `resolve_tagging` always returns a usable domain list.

use crate::model::reflection::DEFAULT_DOMAIN;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of classifying one reflection text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub domain: String,
    pub skill_id: Option<String>,
    pub skill_name: Option<String>,
}

/// Classifier failure modes. Every one of them degrades to the default
/// domain at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// No classifier backend is configured or reachable.
    Unavailable,
    /// The backend exceeded its own latency bound.
    Timeout,
    /// The backend answered with an unusable payload.
    Failed(String),
}

impl Display for ClassifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "classifier unavailable"),
            Self::Timeout => write!(f, "classifier timed out"),
            Self::Failed(details) => write!(f, "classifier failed: {details}"),
        }
    }
}

impl Error for ClassifyError {}

/// Capability contract for external reflection classification.
pub trait ReflectionClassifier {
    fn classify(&self, text: &str) -> Result<Classification, ClassifyError>;
}

/// Default capability: always reports the backend as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableClassifier;

impl ReflectionClassifier for UnavailableClassifier {
    fn classify(&self, _text: &str) -> Result<Classification, ClassifyError> {
        Err(ClassifyError::Unavailable)
    }
}

/// Tagging resolved for one reflection, whatever the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTagging {
    pub domains: Vec<String>,
    pub skill_id: Option<String>,
    pub skill_name: Option<String>,
}

/// Resolves reflection tagging from caller input, the classifier, or the
/// default domain, in that order.
///
/// # Contract
/// - Caller-supplied non-empty domains win; the classifier is not consulted.
/// - Classifier errors are logged and swallowed (soft-fail dependency).
/// - The returned domain list is never empty.
pub fn resolve_tagging(
    classifier: &dyn ReflectionClassifier,
    text: &str,
    supplied_domains: Vec<String>,
    supplied_skill_id: Option<String>,
    supplied_skill_name: Option<String>,
) -> ResolvedTagging {
    if !supplied_domains.is_empty() {
        return ResolvedTagging {
            domains: supplied_domains,
            skill_id: supplied_skill_id,
            skill_name: supplied_skill_name,
        };
    }

    match classifier.classify(text) {
        Ok(classification) => ResolvedTagging {
            domains: vec![classification.domain],
            skill_id: supplied_skill_id.or(classification.skill_id),
            skill_name: supplied_skill_name.or(classification.skill_name),
        },
        Err(err) => {
            warn!("event=classify_fallback module=classify status=degraded error={err}");
            ResolvedTagging {
                domains: vec![DEFAULT_DOMAIN.to_string()],
                skill_id: supplied_skill_id,
                skill_name: supplied_skill_name,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        resolve_tagging, Classification, ClassifyError, ReflectionClassifier,
        UnavailableClassifier,
    };
    use crate::model::reflection::DEFAULT_DOMAIN;

    struct FixedClassifier(Result<Classification, ClassifyError>);

    impl ReflectionClassifier for FixedClassifier {
        fn classify(&self, _text: &str) -> Result<Classification, ClassifyError> {
            self.0.clone()
        }
    }

    #[test]
    fn caller_domains_skip_the_classifier() {
        let classifier = FixedClassifier(Err(ClassifyError::Failed("boom".to_string())));
        let tagging = resolve_tagging(
            &classifier,
            "text",
            vec!["instruction".to_string()],
            None,
            None,
        );
        assert_eq!(tagging.domains, vec!["instruction".to_string()]);
    }

    #[test]
    fn classifier_result_fills_missing_tagging() {
        let classifier = FixedClassifier(Ok(Classification {
            domain: "assessment".to_string(),
            skill_id: Some("exit-tickets".to_string()),
            skill_name: Some("Exit tickets".to_string()),
        }));
        let tagging = resolve_tagging(&classifier, "text", vec![], None, None);
        assert_eq!(tagging.domains, vec!["assessment".to_string()]);
        assert_eq!(tagging.skill_id.as_deref(), Some("exit-tickets"));
    }

    #[test]
    fn errors_degrade_to_default_domain() {
        for err in [
            ClassifyError::Unavailable,
            ClassifyError::Timeout,
            ClassifyError::Failed("bad payload".to_string()),
        ] {
            let tagging =
                resolve_tagging(&FixedClassifier(Err(err)), "text", vec![], None, None);
            assert_eq!(tagging.domains, vec![DEFAULT_DOMAIN.to_string()]);
        }
    }

    #[test]
    fn default_capability_is_unavailable() {
        let tagging = resolve_tagging(&UnavailableClassifier, "text", vec![], None, None);
        assert_eq!(tagging.domains, vec![DEFAULT_DOMAIN.to_string()]);
    }
}
