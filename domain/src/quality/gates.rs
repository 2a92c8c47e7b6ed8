//! The quality gate: scoring, pass/fail, improvements, and standards repair.

use super::config::{QualityConfig, QualityThresholds};
use super::repair::{fill_evidence, repair_analysis};
use super::rules::{RuleSeverity, check_rules};
use super::scorers::{
    count_duplicate_findings, evidence_count, priority_alignment, score_actionability,
    score_completeness, score_consistency, score_evidence,
};
use super::types::{
    DimensionScores, Improvement, QualityDimension, QualityValidation, TargetedFeedback,
};
use crate::analysis::{Feedback, Finding, Recommendation, Severity};
use crate::core::string::truncate;
use crate::refinement::RefinedAnalysisResult;

const FEEDBACK_TEXT_LEN: usize = 120;

/// Pass iff every dimension clears its threshold and no blocking rule fired.
///
/// Raising any one score while holding the rest fixed can never turn a pass
/// into a fail.
pub fn gate_passes(
    scores: &DimensionScores,
    thresholds: &QualityThresholds,
    has_blocking_violation: bool,
) -> bool {
    !has_blocking_violation
        && scores.completeness >= thresholds.completeness
        && scores.consistency >= thresholds.consistency
        && scores.actionability >= thresholds.actionability
        && scores.evidence >= thresholds.evidence
}

/// Validates refined result sets against the configured quality bar.
#[derive(Debug, Clone, Default)]
pub struct QualityGates {
    config: QualityConfig,
}

impl QualityGates {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    pub fn validate_results(&self, refined: &RefinedAnalysisResult) -> QualityValidation {
        let completeness = score_completeness(refined, &self.config);
        let consistency = score_consistency(refined);
        let actionability = score_actionability(refined, &self.config);
        let evidence = score_evidence(refined, &self.config);

        let findings: Vec<&Finding> = refined.all_findings().collect();
        let recommendations: Vec<&Recommendation> = refined.all_recommendations().collect();
        let violations = check_rules(&findings, &recommendations);
        let blocking = violations.iter().any(|v| v.severity == RuleSeverity::Error);

        let w = &self.config.weights;
        let overall_score = w.completeness * completeness.score
            + w.consistency * consistency.score
            + w.actionability * actionability.score
            + w.evidence * evidence.score
            + w.confidence * refined.consensus.confidence;

        let mut validation = QualityValidation {
            completeness,
            consistency,
            actionability,
            evidence,
            overall_score: overall_score.clamp(0.0, 1.0),
            passes_gates: false,
            violations,
            improvements: Vec::new(),
        };
        validation.passes_gates =
            gate_passes(&validation.scores(), &self.config.thresholds, blocking);
        if !validation.passes_gates {
            validation.improvements = self.improvements(refined, &validation, blocking);
        }
        validation
    }

    /// Repair a failed result set; a passing one is returned as is.
    ///
    /// The consensus is rebuilt from the repaired analyses. Refinement
    /// rounds are kept.
    pub fn ensure_standards(
        &self,
        refined: &RefinedAnalysisResult,
        validation: &QualityValidation,
    ) -> RefinedAnalysisResult {
        if validation.passes_gates {
            return refined.clone();
        }
        let mut repaired = refined.clone();
        for result in &mut repaired.results {
            result.analysis = repair_analysis(&result.analysis, &self.config);
        }
        repaired.auxiliary_findings = refined
            .auxiliary_findings
            .iter()
            .map(|f| fill_evidence(f, &self.config))
            .collect();
        let agreement = repaired.agreement_score;
        repaired.rebuild_consensus(agreement)
    }

    fn improvements(
        &self,
        refined: &RefinedAnalysisResult,
        validation: &QualityValidation,
        blocking: bool,
    ) -> Vec<Improvement> {
        let thresholds = &self.config.thresholds;
        let scores = validation.scores();
        let mut out = Vec::new();

        for dimension in QualityDimension::ALL {
            let score = scores.get(dimension);
            let threshold = match dimension {
                QualityDimension::Completeness => thresholds.completeness,
                QualityDimension::Consistency => thresholds.consistency,
                QualityDimension::Actionability => thresholds.actionability,
                QualityDimension::Evidence => thresholds.evidence,
            };
            let evidence_rule_broken = dimension == QualityDimension::Evidence && blocking;
            if score >= threshold && !evidence_rule_broken {
                continue;
            }
            let feedback = match dimension {
                QualityDimension::Completeness => self.completeness_feedback(refined, validation),
                QualityDimension::Consistency => Vec::new(),
                QualityDimension::Actionability => self.actionability_feedback(refined),
                QualityDimension::Evidence => self.evidence_feedback(refined),
            };
            out.push(Improvement {
                dimension,
                description: self.describe(refined, dimension, score, threshold),
                feedback,
            });
        }
        out
    }

    fn describe(
        &self,
        refined: &RefinedAnalysisResult,
        dimension: QualityDimension,
        score: f64,
        threshold: f64,
    ) -> String {
        let detail = match dimension {
            QualityDimension::Consistency => {
                let duplicates: usize = refined
                    .results
                    .iter()
                    .map(|r| count_duplicate_findings(&r.analysis))
                    .sum();
                let (aligned, checked) = refined
                    .results
                    .iter()
                    .map(|r| priority_alignment(&r.analysis))
                    .fold((0, 0), |(a, c), (x, y)| (a + x, c + y));
                format!(
                    "; {} duplicate finding(s), {} recommendation(s) with misaligned priority",
                    duplicates,
                    checked - aligned
                )
            }
            _ => String::new(),
        };
        format!(
            "Raise {} from {:.2} to at least {:.2}{}",
            dimension, score, threshold, detail
        )
    }

    fn completeness_feedback(
        &self,
        refined: &RefinedAnalysisResult,
        validation: &QualityValidation,
    ) -> Vec<TargetedFeedback> {
        if refined.results.is_empty() {
            return Vec::new();
        }
        validation
            .completeness
            .missing_areas
            .iter()
            .map(|area| TargetedFeedback {
                result: 0,
                feedback: Feedback::IncompleteAnalysis { area: area.clone() },
            })
            .collect()
    }

    fn actionability_feedback(&self, refined: &RefinedAnalysisResult) -> Vec<TargetedFeedback> {
        let min = self.config.min_implementation_chars;
        refined
            .results
            .iter()
            .enumerate()
            .flat_map(|(idx, r)| {
                r.analysis
                    .recommendations
                    .iter()
                    .filter(move |rec| rec.implementation.trim().chars().count() < min)
                    .map(move |rec| TargetedFeedback {
                        result: idx,
                        feedback: Feedback::VagueRecommendation {
                            recommendation_id: rec.id.clone(),
                            guidance: format!(
                                "Spell out the concrete change for '{}' and where it goes.",
                                truncate(&rec.description, FEEDBACK_TEXT_LEN)
                            ),
                        },
                    })
            })
            .collect()
    }

    fn evidence_feedback(&self, refined: &RefinedAnalysisResult) -> Vec<TargetedFeedback> {
        let min_critical = self.config.critical_evidence_min;
        refined
            .results
            .iter()
            .enumerate()
            .flat_map(|(idx, r)| {
                r.analysis
                    .findings
                    .iter()
                    .filter(move |f| {
                        !f.has_evidence()
                            || (f.severity == Severity::Critical && evidence_count(f) < min_critical)
                    })
                    .map(move |f| TargetedFeedback {
                        result: idx,
                        feedback: Feedback::MissingEvidence {
                            finding_id: f.id.clone(),
                            evidence: format!(
                                "{} at {}: {}",
                                f.finding_type,
                                f.location(),
                                truncate(&f.message, FEEDBACK_TEXT_LEN)
                            ),
                        },
                    })
            })
            .collect()
    }
}
