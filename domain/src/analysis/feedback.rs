//! Typed refinement feedback and its local, additive application.

use super::specialized::SpecializedAnalysis;
use serde::{Deserialize, Serialize};

/// Confidence added by one `LowConfidence` feedback item.
pub const REFINEMENT_CONFIDENCE_DELTA: f64 = 0.1;

/// One improvement request aimed at an analysis.
///
/// Each variant carries only what its transformation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Feedback {
    /// Append `evidence` to the finding
    MissingEvidence { finding_id: String, evidence: String },
    /// Append `guidance` to the recommendation's implementation text
    VagueRecommendation {
        recommendation_id: String,
        guidance: String,
    },
    /// Raise the finding's confidence by the refinement delta
    LowConfidence { finding_id: String },
    /// Note an area the analysis did not cover
    IncompleteAnalysis { area: String },
}

impl Feedback {
    pub fn kind(&self) -> &'static str {
        match self {
            Feedback::MissingEvidence { .. } => "missing-evidence",
            Feedback::VagueRecommendation { .. } => "vague-recommendation",
            Feedback::LowConfidence { .. } => "low-confidence",
            Feedback::IncompleteAnalysis { .. } => "incomplete-analysis",
        }
    }
}

/// Apply feedback to an analysis, producing a new value.
///
/// Transformations only add text or raise confidence, so the aggregate
/// confidence of the result is never lower than the input's. Feedback that
/// targets an unknown id is ignored.
pub fn apply_feedback(
    analysis: &SpecializedAnalysis,
    feedback: &[Feedback],
    delta: f64,
) -> SpecializedAnalysis {
    let mut refined = analysis.clone();
    let delta = delta.max(0.0);

    for item in feedback {
        match item {
            Feedback::MissingEvidence {
                finding_id,
                evidence,
            } => {
                if let Some(f) = refined.findings.iter_mut().find(|f| &f.id == finding_id)
                    && !f.evidence.contains(evidence)
                {
                    f.evidence.push(evidence.clone());
                }
            }
            Feedback::VagueRecommendation {
                recommendation_id,
                guidance,
            } => {
                if let Some(r) = refined
                    .recommendations
                    .iter_mut()
                    .find(|r| &r.id == recommendation_id)
                    && !r.implementation.contains(guidance.as_str())
                {
                    if r.implementation.trim().is_empty() {
                        r.implementation = guidance.clone();
                    } else {
                        r.implementation = format!("{} {}", r.implementation.trim_end(), guidance);
                    }
                }
            }
            Feedback::LowConfidence { finding_id } => {
                if let Some(f) = refined.findings.iter_mut().find(|f| &f.id == finding_id) {
                    f.confidence = (f.confidence + delta).min(1.0);
                    refined.confidence = (refined.confidence + delta / 2.0).min(1.0);
                }
            }
            Feedback::IncompleteAnalysis { area } => {
                let note = format!("Not yet covered: {}", area);
                if !refined.summary.contains(&note) {
                    if refined.summary.is_empty() {
                        refined.summary = note;
                    } else {
                        refined.summary = format!("{}\n{}", refined.summary, note);
                    }
                    refined.confidence = (refined.confidence + delta / 4.0).min(1.0);
                }
            }
        }
    }

    refined.confidence = refined.confidence.max(analysis.confidence);
    refined.recompute_risk()
}
