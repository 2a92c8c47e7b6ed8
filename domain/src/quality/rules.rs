//! Hard and soft validation rules over a result set.
//!
//! Only `Error` violations block the gate; warnings are reported and
//! otherwise ignored.

use crate::analysis::{Finding, Recommendation, Severity};
use serde::{Deserialize, Serialize};

/// Severity level of a rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// Blocks the gate.
    Error,
    /// Informational.
    Warning,
}

/// Identifies a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationRule {
    /// The result set reports at least one finding.
    AtLeastOneFinding,
    /// Every critical finding carries evidence.
    CriticalFindingsHaveEvidence,
    /// Every recommendation explains why.
    RecommendationsHaveRationale,
}

impl ValidationRule {
    pub const ALL: [ValidationRule; 3] = [
        ValidationRule::AtLeastOneFinding,
        ValidationRule::CriticalFindingsHaveEvidence,
        ValidationRule::RecommendationsHaveRationale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationRule::AtLeastOneFinding => "at-least-one-finding",
            ValidationRule::CriticalFindingsHaveEvidence => "critical-findings-have-evidence",
            ValidationRule::RecommendationsHaveRationale => "recommendations-have-rationale",
        }
    }

    pub fn severity(&self) -> RuleSeverity {
        match self {
            ValidationRule::AtLeastOneFinding | ValidationRule::CriticalFindingsHaveEvidence => {
                RuleSeverity::Error
            }
            ValidationRule::RecommendationsHaveRationale => RuleSeverity::Warning,
        }
    }

    /// Check the rule; `None` when it holds.
    pub fn check(&self, findings: &[&Finding], recommendations: &[&Recommendation]) -> Option<RuleViolation> {
        let message = match self {
            ValidationRule::AtLeastOneFinding => {
                findings.is_empty().then(|| "No findings were reported".to_string())
            }
            ValidationRule::CriticalFindingsHaveEvidence => {
                let bare: Vec<&str> = findings
                    .iter()
                    .filter(|f| f.severity == Severity::Critical && !f.has_evidence())
                    .map(|f| f.id.as_str())
                    .collect();
                (!bare.is_empty())
                    .then(|| format!("Critical finding(s) without evidence: {}", bare.join(", ")))
            }
            ValidationRule::RecommendationsHaveRationale => {
                let missing = recommendations
                    .iter()
                    .filter(|r| r.rationale.trim().is_empty())
                    .count();
                (missing > 0).then(|| format!("{} recommendation(s) have no rationale", missing))
            }
        }?;
        Some(RuleViolation {
            rule: *self,
            severity: self.severity(),
            message,
        })
    }
}

impl std::fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rule that did not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: ValidationRule,
    pub severity: RuleSeverity,
    pub message: String,
}

/// Run every rule.
pub fn check_rules(findings: &[&Finding], recommendations: &[&Recommendation]) -> Vec<RuleViolation> {
    ValidationRule::ALL
        .iter()
        .filter_map(|rule| rule.check(findings, recommendations))
        .collect()
}
