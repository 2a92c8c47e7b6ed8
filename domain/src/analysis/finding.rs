//! Finding value object

use serde::{Deserialize, Serialize};

/// File sentinel for findings that apply to the change as a whole.
pub const BROAD_SCOPE: &str = "*";

/// Severity of a finding, totally ordered from `Low` to `Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Lenient parse used for model output; unknown labels map to `None`.
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "minor" | "info" => Some(Severity::Low),
            "medium" | "moderate" | "warning" => Some(Severity::Medium),
            "high" | "major" | "error" => Some(Severity::High),
            "critical" | "blocker" | "severe" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An observation about the change under review.
///
/// Findings are immutable once an agent has produced them; refinement and
/// repair passes build new values through the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    /// Category tag, e.g. `injection-vulnerability`
    #[serde(rename = "type")]
    pub finding_type: String,
    pub severity: Severity,
    pub message: String,
    /// Originating file, or [`BROAD_SCOPE`]
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default)]
    pub evidence: Vec<String>,
    pub confidence: f64,
}

impl Finding {
    pub fn new(
        id: impl Into<String>,
        finding_type: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            finding_type: finding_type.into(),
            severity,
            message: message.into(),
            file: BROAD_SCOPE.to_string(),
            line: None,
            evidence: Vec::new(),
            confidence: 0.5,
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: Option<u32>) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence.push(evidence.into());
        self
    }

    /// Clamped to `[0, 1]`; a non-finite value leaves the confidence unchanged.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        if confidence.is_finite() {
            self.confidence = confidence.clamp(0.0, 1.0);
        }
        self
    }

    pub fn with_type(mut self, finding_type: impl Into<String>) -> Self {
        self.finding_type = finding_type.into();
        self
    }

    pub fn applies_broadly(&self) -> bool {
        self.file == BROAD_SCOPE
    }

    pub fn has_evidence(&self) -> bool {
        self.evidence.iter().any(|e| !e.trim().is_empty())
    }

    /// Human-readable location, e.g. `services/email.js:42`
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.file, line),
            None => self.file.clone(),
        }
    }
}
