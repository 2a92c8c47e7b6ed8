//! Per-agent analysis output and the fallback used when an agent fails.

use super::finding::{Finding, Severity};
use super::recommendation::{Effort, Priority, Recommendation};
use crate::core::model::Model;
use serde::{Deserialize, Serialize};

/// Confidence assigned to every fallback analysis, whatever the failure kind.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Finding type emitted by the fallback analysis.
pub const ANALYSIS_ERROR_TYPE: &str = "analysis-error";

/// Analysis domain of an agent.
///
/// The set is closed: every agent is one of these variants, and
/// domain-specific behavior is selected by matching on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Architectural,
    Security,
    Performance,
    Testing,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 4] = [
        AnalysisType::Architectural,
        AnalysisType::Security,
        AnalysisType::Performance,
        AnalysisType::Testing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Architectural => "architectural",
            AnalysisType::Security => "security",
            AnalysisType::Performance => "performance",
            AnalysisType::Testing => "testing",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AnalysisType::Architectural => "Architecture",
            AnalysisType::Security => "Security",
            AnalysisType::Performance => "Performance",
            AnalysisType::Testing => "Testing",
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "architectural" | "architecture" | "arch" => Ok(AnalysisType::Architectural),
            "security" | "sec" => Ok(AnalysisType::Security),
            "performance" | "perf" => Ok(AnalysisType::Performance),
            "testing" | "tests" | "test" => Ok(AnalysisType::Testing),
            other => Err(format!(
                "Unknown analysis type: {}. Valid: architectural, security, performance, testing",
                other
            )),
        }
    }
}

/// Aggregate risk of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Maximum finding severity; `Low` when there are no findings.
    pub fn from_findings(findings: &[Finding]) -> Self {
        match findings.iter().map(|f| f.severity).max() {
            Some(Severity::Critical) => RiskLevel::Critical,
            Some(Severity::High) => RiskLevel::High,
            Some(Severity::Medium) => RiskLevel::Medium,
            Some(Severity::Low) | None => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of one agent for one review context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecializedAnalysis {
    pub analysis_type: AnalysisType,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    /// Free-text summary returned by the model
    #[serde(default)]
    pub summary: String,
}

impl SpecializedAnalysis {
    /// Build an analysis; risk level is derived from the findings.
    pub fn new(
        analysis_type: AnalysisType,
        findings: Vec<Finding>,
        recommendations: Vec<Recommendation>,
        confidence: f64,
    ) -> Self {
        let risk_level = RiskLevel::from_findings(&findings);
        Self {
            analysis_type,
            findings,
            recommendations,
            risk_level,
            confidence: confidence.clamp(0.0, 1.0),
            summary: String::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Analysis substituted when the LLM call fails.
    ///
    /// Always one medium `analysis-error` finding, one `should-fix`
    /// manual-review recommendation, confidence [`FALLBACK_CONFIDENCE`].
    pub fn fallback(analysis_type: AnalysisType, reason: &str) -> Self {
        let finding_id = format!("{}-analysis-error", analysis_type.as_str());
        let finding = Finding::new(
            finding_id.clone(),
            ANALYSIS_ERROR_TYPE,
            Severity::Medium,
            format!(
                "{} analysis could not be completed: {}",
                analysis_type.display_name(),
                reason
            ),
        )
        .with_confidence(FALLBACK_CONFIDENCE);

        let recommendation = Recommendation::new(
            format!("{}-manual-review", analysis_type.as_str()),
            Priority::ShouldFix,
            "manual-review",
            format!(
                "Perform a manual {} review of this change",
                analysis_type.as_str()
            ),
        )
        .with_rationale("Automated analysis failed, so this area has not been assessed")
        .with_implementation(format!(
            "Ask a reviewer familiar with {} concerns to walk through every changed file",
            analysis_type.as_str()
        ))
        .with_effort(Some(Effort::Medium))
        .with_confidence(FALLBACK_CONFIDENCE)
        .related_to(finding_id);

        Self::new(
            analysis_type,
            vec![finding],
            vec![recommendation],
            FALLBACK_CONFIDENCE,
        )
        .with_summary(format!("Fallback analysis: {}", reason))
    }

    /// Whether this is the fallback analysis substituted for a failure.
    pub fn is_fallback(&self) -> bool {
        self.findings.len() == 1 && self.findings[0].finding_type == ANALYSIS_ERROR_TYPE
    }

    /// Recompute the derived risk level after the findings changed.
    pub fn recompute_risk(mut self) -> Self {
        self.risk_level = RiskLevel::from_findings(&self.findings);
        self
    }

    pub fn finding(&self, id: &str) -> Option<&Finding> {
        self.findings.iter().find(|f| f.id == id)
    }
}

/// A [`SpecializedAnalysis`] annotated with the agent and model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_type: AnalysisType,
    pub model: Model,
    pub analysis: SpecializedAnalysis,
}

impl AgentResult {
    pub fn new(model: Model, analysis: SpecializedAnalysis) -> Self {
        Self {
            agent_type: analysis.analysis_type,
            model,
            analysis,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.analysis.confidence
    }

    /// Label such as `security@gpt-4o`
    pub fn label(&self) -> String {
        format!("{}@{}", self.agent_type, self.model)
    }
}
