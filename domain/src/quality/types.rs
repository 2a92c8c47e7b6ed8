//! Quality validation value objects.

use super::rules::{RuleSeverity, RuleViolation};
use crate::analysis::Feedback;
use serde::{Deserialize, Serialize};

/// The four independently scored quality dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityDimension {
    Completeness,
    Consistency,
    Actionability,
    Evidence,
}

impl QualityDimension {
    pub const ALL: [QualityDimension; 4] = [
        QualityDimension::Completeness,
        QualityDimension::Consistency,
        QualityDimension::Actionability,
        QualityDimension::Evidence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityDimension::Completeness => "completeness",
            QualityDimension::Consistency => "consistency",
            QualityDimension::Actionability => "actionability",
            QualityDimension::Evidence => "evidence",
        }
    }
}

impl std::fmt::Display for QualityDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Score in [0,1] for one dimension, plus what pulled it down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f64,
    pub issues: Vec<String>,
    /// Only populated for completeness
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_areas: Vec<String>,
}

impl DimensionScore {
    pub fn new(score: f64) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            issues: Vec::new(),
            missing_areas: Vec::new(),
        }
    }

    pub fn with_issue(mut self, issue: impl Into<String>) -> Self {
        self.issues.push(issue.into());
        self
    }
}

/// Just the four scores, as consumed by the pass/fail decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub completeness: f64,
    pub consistency: f64,
    pub actionability: f64,
    pub evidence: f64,
}

impl DimensionScores {
    pub fn get(&self, dimension: QualityDimension) -> f64 {
        match dimension {
            QualityDimension::Completeness => self.completeness,
            QualityDimension::Consistency => self.consistency,
            QualityDimension::Actionability => self.actionability,
            QualityDimension::Evidence => self.evidence,
        }
    }
}

/// Feedback aimed at one result of the refined set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetedFeedback {
    /// Index into `RefinedAnalysisResult::results`
    pub result: usize,
    pub feedback: Feedback,
}

/// What to improve when the gate fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub dimension: QualityDimension,
    pub description: String,
    pub feedback: Vec<TargetedFeedback>,
}

/// Outcome of running the quality gates over a refined result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityValidation {
    pub completeness: DimensionScore,
    pub consistency: DimensionScore,
    pub actionability: DimensionScore,
    pub evidence: DimensionScore,
    pub overall_score: f64,
    pub passes_gates: bool,
    pub violations: Vec<RuleViolation>,
    /// Empty when the gate passes
    pub improvements: Vec<Improvement>,
}

impl QualityValidation {
    pub fn scores(&self) -> DimensionScores {
        DimensionScores {
            completeness: self.completeness.score,
            consistency: self.consistency.score,
            actionability: self.actionability.score,
            evidence: self.evidence.score,
        }
    }

    pub fn dimension(&self, dimension: QualityDimension) -> &DimensionScore {
        match dimension {
            QualityDimension::Completeness => &self.completeness,
            QualityDimension::Consistency => &self.consistency,
            QualityDimension::Actionability => &self.actionability,
            QualityDimension::Evidence => &self.evidence,
        }
    }

    /// Violations that block the gate
    pub fn errors(&self) -> impl Iterator<Item = &RuleViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == RuleSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RuleViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == RuleSeverity::Warning)
    }

    /// Every feedback item of every improvement, in order.
    pub fn feedback(&self) -> impl Iterator<Item = &TargetedFeedback> {
        self.improvements.iter().flat_map(|i| i.feedback.iter())
    }
}
