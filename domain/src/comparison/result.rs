//! Value objects produced by comparing two agent results.

use crate::analysis::{Finding, Recommendation};
use serde::{Deserialize, Serialize};

/// Kind of disagreement between two results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    /// Same location, divergent judgment
    InterpretationDifference,
    PriorityMismatch,
    ConfidenceConflict,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::InterpretationDifference => "interpretation-difference",
            ConflictType::PriorityMismatch => "priority-mismatch",
            ConflictType::ConfidenceConflict => "confidence-conflict",
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Medium,
    High,
}

impl ConflictSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Medium => "medium",
            ConflictSeverity::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub conflict_type: ConflictType,
    pub severity: ConflictSeverity,
    pub description: String,
    /// Id of the item on the first side, when the conflict is item-level
    pub first_id: Option<String>,
    pub second_id: Option<String>,
}

impl Conflict {
    pub fn new(
        conflict_type: ConflictType,
        severity: ConflictSeverity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            conflict_type,
            severity,
            description: description.into(),
            first_id: None,
            second_id: None,
        }
    }

    pub fn between(mut self, first_id: impl Into<String>, second_id: impl Into<String>) -> Self {
        self.first_id = Some(first_id.into());
        self.second_id = Some(second_id.into());
        self
    }

    pub fn is_high(&self) -> bool {
        self.severity == ConflictSeverity::High
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingMatch {
    pub first: Finding,
    pub second: Finding,
    pub similarity: f64,
    pub severity_match: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationMatch {
    pub first: Recommendation,
    pub second: Recommendation,
    pub similarity: f64,
    pub priority_match: bool,
}

/// Generic comparison of one item kind across the two sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemComparison<T, M> {
    pub matches: Vec<M>,
    pub unique_to_first: Vec<T>,
    pub unique_to_second: Vec<T>,
    pub conflicts: Vec<Conflict>,
}

impl<T, M> Default for ItemComparison<T, M> {
    fn default() -> Self {
        Self {
            matches: Vec::new(),
            unique_to_first: Vec::new(),
            unique_to_second: Vec::new(),
            conflicts: Vec::new(),
        }
    }
}

impl<T, M> ItemComparison<T, M> {
    /// `|matches| / (|matches| + |unique1| + |unique2|)`.
    ///
    /// 1.0 when nothing was compared; 0.0 when every keyed pair conflicts.
    pub fn overlap(&self) -> f64 {
        let total = self.matches.len() + self.unique_to_first.len() + self.unique_to_second.len();
        match total {
            0 if self.conflicts.is_empty() => 1.0,
            0 => 0.0,
            _ => self.matches.len() as f64 / total as f64,
        }
    }
}

pub type FindingComparison = ItemComparison<Finding, FindingMatch>;
pub type RecommendationComparison = ItemComparison<Recommendation, RecommendationMatch>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightKind {
    HighAgreement,
    LowAgreement,
    Escalation,
    CoverageImbalance,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::HighAgreement => "high-agreement",
            InsightKind::LowAgreement => "low-agreement",
            InsightKind::Escalation => "escalation",
            InsightKind::CoverageImbalance => "coverage-imbalance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
    pub actionable: bool,
}

/// Outcome of comparing two agent results.
///
/// `first` and `second` keep the order the results were passed in; the
/// agreement score does not depend on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub first_label: String,
    pub second_label: String,
    pub agreement_score: f64,
    pub findings: FindingComparison,
    pub recommendations: RecommendationComparison,
    /// Every conflict: item-level ones followed by the confidence conflict
    pub conflicts: Vec<Conflict>,
    pub insights: Vec<Insight>,
}

impl ComparisonResult {
    pub fn has_high_conflict(&self) -> bool {
        self.conflicts.iter().any(Conflict::is_high)
    }

    pub fn conflicts_of(&self, conflict_type: ConflictType) -> impl Iterator<Item = &Conflict> {
        self.conflicts
            .iter()
            .filter(move |c| c.conflict_type == conflict_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_of_empty_comparison_is_one() {
        let cmp = FindingComparison::default();
        assert_eq!(cmp.overlap(), 1.0);
    }

    #[test]
    fn test_conflicts_only_comparison_has_no_overlap() {
        let mut cmp = FindingComparison::default();
        cmp.conflicts.push(Conflict::new(
            ConflictType::InterpretationDifference,
            ConflictSeverity::Medium,
            "x",
        ));
        assert_eq!(cmp.overlap(), 0.0);
    }

    #[test]
    fn test_conflict_type_serializes_kebab_case() {
        let json = serde_json::to_string(&ConflictType::ConfidenceConflict).unwrap();
        assert_eq!(json, "\"confidence-conflict\"");
    }
}
