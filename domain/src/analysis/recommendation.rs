//! Recommendation value object

use super::finding::Severity;
use serde::{Deserialize, Serialize};

/// Urgency of a recommendation.
///
/// Ordered by urgency: `Consider < ShouldFix < MustFix`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Consider,
    #[default]
    ShouldFix,
    MustFix,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Consider => "consider",
            Priority::ShouldFix => "should-fix",
            Priority::MustFix => "must-fix",
        }
    }

    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "must-fix" | "mustfix" | "critical" | "high" | "required" => Some(Priority::MustFix),
            "should-fix" | "shouldfix" | "medium" | "recommended" => Some(Priority::ShouldFix),
            "consider" | "low" | "optional" | "nice-to-have" => Some(Priority::Consider),
            _ => None,
        }
    }

    /// Priority a recommendation should carry given the worst related finding.
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::High => Priority::MustFix,
            Severity::Medium => Priority::ShouldFix,
            Severity::Low => Priority::Consider,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Effort estimate for implementing a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Low => "low",
            Effort::Medium => "medium",
            Effort::High => "high",
        }
    }

    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "small" | "trivial" => Some(Effort::Low),
            "medium" | "moderate" => Some(Effort::Medium),
            "high" | "large" | "significant" => Some(Effort::High),
            _ => None,
        }
    }
}

/// An actionable suggestion produced alongside findings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    /// `None` when the model emitted a label outside the known set
    pub priority: Option<Priority>,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub implementation: String,
    /// `None` when the model omitted or garbled the estimate
    pub effort: Option<Effort>,
    pub confidence: f64,
    /// Ids of the findings this recommendation addresses
    #[serde(default)]
    pub related_findings: Vec<String>,
}

impl Recommendation {
    pub fn new(
        id: impl Into<String>,
        priority: Priority,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            priority: Some(priority),
            category: category.into(),
            description: description.into(),
            rationale: String::new(),
            implementation: String::new(),
            effort: Some(Effort::Medium),
            confidence: 0.5,
            related_findings: Vec::new(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = implementation.into();
        self
    }

    pub fn with_effort(mut self, effort: Option<Effort>) -> Self {
        self.effort = effort;
        self
    }

    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority;
        self
    }

    /// Clamped to `[0, 1]`; a non-finite value leaves the confidence unchanged.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        if confidence.is_finite() {
            self.confidence = confidence.clamp(0.0, 1.0);
        }
        self
    }

    pub fn related_to(mut self, finding_id: impl Into<String>) -> Self {
        self.related_findings.push(finding_id.into());
        self
    }

    /// Priority used for ordering; unknown priorities rank lowest.
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or(Priority::Consider)
    }
}
