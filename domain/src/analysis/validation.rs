//! Rule-based self-validation of a single agent's analysis.

use super::classify::is_domain_specific;
use super::finding::Severity;
use super::specialized::{AnalysisType, SpecializedAnalysis};
use serde::{Deserialize, Serialize};

/// Score every analysis starts from before penalties.
pub const BASE_VALIDATION_SCORE: f64 = 0.8;
/// Lowest score validation will report.
pub const MIN_VALIDATION_SCORE: f64 = 0.1;
/// Implementation text shorter than this counts as under-detailed.
pub const DETAILED_IMPLEMENTATION_CHARS: usize = 50;

const MISSING_ITEMS_PENALTY: f64 = 0.2;
const HEURISTIC_GAP_PENALTY: f64 = 0.1;

/// Result of validating one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentValidation {
    /// `true` when there are no errors (warnings are allowed)
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub score: f64,
}

/// Validate an analysis against the generic and type-specific heuristics.
pub fn validate_analysis(analysis: &SpecializedAnalysis) -> AgentValidation {
    let mut score = BASE_VALIDATION_SCORE;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if analysis.findings.is_empty() {
        errors.push("Analysis produced no findings".to_string());
        score -= MISSING_ITEMS_PENALTY;
    }
    if analysis.recommendations.is_empty() {
        errors.push("Analysis produced no recommendations".to_string());
        score -= MISSING_ITEMS_PENALTY;
    }

    let ty = analysis.analysis_type;
    if !analysis.findings.is_empty()
        && !analysis
            .findings
            .iter()
            .any(|f| is_domain_specific(ty, &f.finding_type))
    {
        warnings.push(format!(
            "No {}-specific finding types were identified",
            ty.as_str()
        ));
        score -= HEURISTIC_GAP_PENALTY;
    }

    let under_detailed = analysis
        .recommendations
        .iter()
        .filter(|r| r.implementation.trim().chars().count() < DETAILED_IMPLEMENTATION_CHARS)
        .count();
    if under_detailed > 0 {
        warnings.push(format!(
            "{} recommendation(s) have under-detailed implementation guidance",
            under_detailed
        ));
        score -= HEURISTIC_GAP_PENALTY;
    }

    let without_evidence = analysis.findings.iter().filter(|f| !f.has_evidence()).count();
    if without_evidence > 0 {
        warnings.push(format!("{} finding(s) lack evidence", without_evidence));
        score -= HEURISTIC_GAP_PENALTY;
    }

    if let Some(warning) = type_specific_gap(ty, analysis) {
        warnings.push(warning);
        score -= HEURISTIC_GAP_PENALTY;
    }

    AgentValidation {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        score: score.max(MIN_VALIDATION_SCORE),
    }
}

pub(crate) fn type_specific_gap(ty: AnalysisType, analysis: &SpecializedAnalysis) -> Option<String> {
    match ty {
        // Severe security and performance issues must be pinned to a line
        AnalysisType::Security | AnalysisType::Performance => {
            let unlocated = analysis
                .findings
                .iter()
                .filter(|f| f.severity >= Severity::High && f.line.is_none())
                .count();
            (unlocated > 0).then(|| {
                format!(
                    "{} high-severity finding(s) have no line number",
                    unlocated
                )
            })
        }
        AnalysisType::Architectural => {
            let all_broad =
                !analysis.findings.is_empty() && analysis.findings.iter().all(|f| f.applies_broadly());
            all_broad.then(|| "No architectural finding is tied to a specific file".to_string())
        }
        AnalysisType::Testing => None,
    }
}
