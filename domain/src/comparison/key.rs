//! Coarse fingerprints used to pair items across two results.
//!
//! Keys deliberately conflate near-duplicates so matching is a hash lookup
//! instead of pairwise text comparison.

use crate::analysis::{Finding, Recommendation};
use crate::core::string::char_prefix;
use serde::{Deserialize, Serialize};

/// Characters of the description that take part in a recommendation key.
pub const RECOMMENDATION_KEY_PREFIX_CHARS: usize = 50;

/// `(type, file, line-or-0)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FindingKey {
    pub finding_type: String,
    pub file: String,
    pub line: u32,
}

impl FindingKey {
    pub fn of(finding: &Finding) -> Self {
        Self {
            finding_type: finding.finding_type.trim().to_lowercase(),
            file: finding.file.trim().to_string(),
            line: finding.line.unwrap_or(0),
        }
    }
}

impl std::fmt::Display for FindingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}|{}", self.finding_type, self.file, self.line)
    }
}

/// `(category, first 50 chars of description)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecommendationKey {
    pub category: String,
    pub description_prefix: String,
}

impl RecommendationKey {
    pub fn of(recommendation: &Recommendation) -> Self {
        let description = recommendation.description.trim().to_lowercase();
        Self {
            category: recommendation.category.trim().to_lowercase(),
            description_prefix: char_prefix(&description, RECOMMENDATION_KEY_PREFIX_CHARS)
                .to_string(),
        }
    }
}

impl std::fmt::Display for RecommendationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}|{}", self.category, self.description_prefix)
    }
}

pub fn create_finding_key(finding: &Finding) -> FindingKey {
    FindingKey::of(finding)
}

pub fn create_recommendation_key(recommendation: &Recommendation) -> RecommendationKey {
    RecommendationKey::of(recommendation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Priority, Severity};

    #[test]
    fn test_finding_key_is_stable_across_instances() {
        let a = Finding::new("id-1", "injection-vulnerability", Severity::Critical, "first wording")
            .at("services/email.js", Some(42));
        let b = Finding::new("id-2", "injection-vulnerability", Severity::Low, "other wording")
            .at("services/email.js", Some(42))
            .with_evidence("x");

        assert_eq!(create_finding_key(&a), create_finding_key(&b));
        assert_eq!(create_finding_key(&a), create_finding_key(&a.clone()));
        assert_eq!(
            create_finding_key(&a).to_string(),
            "injection-vulnerability|services/email.js|42"
        );
    }

    #[test]
    fn test_missing_line_keys_as_zero() {
        let f = Finding::new("a", "coupling-issue", Severity::Low, "m").at("src/app.rs", None);
        assert_eq!(FindingKey::of(&f).line, 0);
    }

    #[test]
    fn test_recommendation_key_uses_fifty_char_prefix() {
        let long = "x".repeat(80);
        let a = Recommendation::new("a", Priority::MustFix, "Security", format!("{}tail-a", long));
        let b = Recommendation::new("b", Priority::Consider, "security", format!("{}tail-b", long));
        let key = RecommendationKey::of(&a);
        assert_eq!(key.description_prefix.chars().count(), 50);
        assert_eq!(key, RecommendationKey::of(&b));
    }
}
