//! The four dimension scorers.
//!
//! Each scorer is a pure function of the refined result set; scores are in
//! [0,1] and the issue list says what pulled a score down.

use super::config::QualityConfig;
use super::types::DimensionScore;
use crate::analysis::{AnalysisType, Finding, Priority, Recommendation, Severity, SpecializedAnalysis};
use crate::comparison::FindingKey;
use crate::refinement::RefinedAnalysisResult;
use std::collections::HashSet;

/// Subtracted from completeness when there are no findings, and again when
/// there are no recommendations.
pub const MISSING_ITEMS_PENALTY: f64 = 0.2;

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Expected-type coverage, evidence coverage, recommendation coverage and
/// prioritized-recommendation presence, averaged; minus the missing-item
/// penalties.
pub fn score_completeness(refined: &RefinedAnalysisResult, config: &QualityConfig) -> DimensionScore {
    let findings: Vec<&Finding> = refined.all_findings().collect();
    let recommendations: Vec<&Recommendation> = refined.all_recommendations().collect();
    let mut issues = Vec::new();

    let present: HashSet<AnalysisType> = refined
        .results
        .iter()
        .filter(|r| !r.analysis.is_fallback())
        .map(|r| r.agent_type)
        .collect();
    let missing_areas: Vec<String> = config
        .expected_types
        .iter()
        .filter(|t| !present.contains(t))
        .map(|t| t.as_str().to_string())
        .collect();
    let type_coverage = if config.expected_types.is_empty() {
        1.0
    } else {
        1.0 - fraction(missing_areas.len(), config.expected_types.len())
    };
    if !missing_areas.is_empty() {
        issues.push(format!("Missing analysis areas: {}", missing_areas.join(", ")));
    }

    let evidence_coverage = fraction(
        findings.iter().filter(|f| f.has_evidence()).count(),
        findings.len(),
    );

    let recommendation_coverage = if findings.is_empty() {
        0.0
    } else {
        (recommendations.len() as f64 / findings.len() as f64).min(1.0)
    };
    if !findings.is_empty() && recommendations.len() < findings.len() {
        issues.push(format!(
            "{} recommendation(s) for {} finding(s)",
            recommendations.len(),
            findings.len()
        ));
    }

    let prioritized = if recommendations.iter().any(|r| r.priority.is_some()) {
        1.0
    } else {
        0.0
    };

    let mut score = mean(&[type_coverage, evidence_coverage, recommendation_coverage, prioritized]);
    if findings.is_empty() {
        score -= MISSING_ITEMS_PENALTY;
        issues.push("No findings".to_string());
    }
    if recommendations.is_empty() {
        score -= MISSING_ITEMS_PENALTY;
        issues.push("No recommendations".to_string());
    }

    DimensionScore {
        score: score.clamp(0.0, 1.0),
        issues,
        missing_areas,
    }
}

/// Findings that repeat an earlier key within the same analysis.
pub fn count_duplicate_findings(analysis: &SpecializedAnalysis) -> usize {
    let mut seen = HashSet::new();
    analysis
        .findings
        .iter()
        .filter(|f| !seen.insert(FindingKey::of(f)))
        .count()
}

/// `(aligned, checked)` recommendations of one analysis.
///
/// A recommendation is checked when at least one of its related finding ids
/// resolves; it is aligned when its priority is the one the highest related
/// severity calls for.
pub fn priority_alignment(analysis: &SpecializedAnalysis) -> (usize, usize) {
    let mut aligned = 0;
    let mut checked = 0;
    for rec in &analysis.recommendations {
        let Some(max) = max_related_severity(analysis, rec) else {
            continue;
        };
        checked += 1;
        if rec.priority == Some(Priority::for_severity(max)) {
            aligned += 1;
        }
    }
    (aligned, checked)
}

pub(crate) fn max_related_severity(analysis: &SpecializedAnalysis, rec: &Recommendation) -> Option<Severity> {
    rec.related_findings
        .iter()
        .filter_map(|id| analysis.finding(id))
        .map(|f| f.severity)
        .max()
}

/// Agreement score, duplicate-free ratio and priority alignment, averaged.
pub fn score_consistency(refined: &RefinedAnalysisResult) -> DimensionScore {
    let mut issues = Vec::new();

    let total_findings: usize = refined.results.iter().map(|r| r.analysis.findings.len()).sum();
    let duplicates: usize = refined
        .results
        .iter()
        .map(|r| count_duplicate_findings(&r.analysis))
        .sum();
    let duplicate_free = 1.0 - fraction(duplicates, total_findings);
    if duplicates > 0 {
        issues.push(format!("{} duplicate finding(s)", duplicates));
    }

    let (aligned, checked) = refined
        .results
        .iter()
        .map(|r| priority_alignment(&r.analysis))
        .fold((0, 0), |(a, c), (x, y)| (a + x, c + y));
    let alignment = if checked == 0 { 1.0 } else { fraction(aligned, checked) };
    if aligned < checked {
        issues.push(format!(
            "{} recommendation(s) have a priority that does not match their findings' severity",
            checked - aligned
        ));
    }

    if refined.agreement_score < 0.5 {
        issues.push(format!(
            "Low cross-agent agreement ({:.2})",
            refined.agreement_score
        ));
    }

    let score = mean(&[refined.agreement_score.clamp(0.0, 1.0), duplicate_free, alignment]);
    DimensionScore {
        score: score.clamp(0.0, 1.0),
        issues,
        missing_areas: Vec::new(),
    }
}

/// Four independent fractions over all recommendations, averaged.
pub fn score_actionability(refined: &RefinedAnalysisResult, config: &QualityConfig) -> DimensionScore {
    let recs: Vec<&Recommendation> = refined.all_recommendations().collect();
    if recs.is_empty() {
        return DimensionScore::new(0.0).with_issue("No recommendations to act on");
    }
    let n = recs.len();
    let mut issues = Vec::new();

    let detailed = recs
        .iter()
        .filter(|r| r.implementation.trim().chars().count() >= config.min_implementation_chars)
        .count();
    let rationale = recs.iter().filter(|r| !r.rationale.trim().is_empty()).count();
    let effort = recs.iter().filter(|r| r.effort.is_some()).count();
    let priority = recs.iter().filter(|r| r.priority.is_some()).count();

    for (count, what) in [
        (detailed, "detailed implementation guidance"),
        (rationale, "a rationale"),
        (effort, "a valid effort estimate"),
        (priority, "a valid priority"),
    ] {
        if count < n {
            issues.push(format!("{} recommendation(s) lack {}", n - count, what));
        }
    }

    let score = mean(&[
        fraction(detailed, n),
        fraction(rationale, n),
        fraction(effort, n),
        fraction(priority, n),
    ]);
    DimensionScore {
        score,
        issues,
        missing_areas: Vec::new(),
    }
}

/// Fraction of findings with evidence, times a multiplier that shrinks for
/// each critical finding with too little evidence.
pub fn score_evidence(refined: &RefinedAnalysisResult, config: &QualityConfig) -> DimensionScore {
    let findings: Vec<&Finding> = refined.all_findings().collect();
    if findings.is_empty() {
        return DimensionScore::new(0.0).with_issue("No findings to back with evidence");
    }
    let mut issues = Vec::new();

    let backed = findings.iter().filter(|f| f.has_evidence()).count();
    if backed < findings.len() {
        issues.push(format!("{} finding(s) lack evidence", findings.len() - backed));
    }

    let thin_critical = findings
        .iter()
        .filter(|f| f.severity == Severity::Critical && evidence_count(f) < config.critical_evidence_min)
        .count();
    if thin_critical > 0 {
        issues.push(format!(
            "{} critical finding(s) have fewer than {} evidence items",
            thin_critical, config.critical_evidence_min
        ));
    }

    let multiplier = config
        .critical_evidence_penalty
        .powi(thin_critical as i32)
        .max(config.critical_penalty_floor);
    DimensionScore {
        score: (fraction(backed, findings.len()) * multiplier).clamp(0.0, 1.0),
        issues,
        missing_areas: Vec::new(),
    }
}

pub(crate) fn evidence_count(finding: &Finding) -> usize {
    finding.evidence.iter().filter(|e| !e.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AgentResult, Effort};
    use crate::core::model::Model;

    fn refined(analyses: Vec<SpecializedAnalysis>, agreement: f64) -> RefinedAnalysisResult {
        let results = analyses
            .into_iter()
            .map(|a| AgentResult::new(Model::Gpt4o, a))
            .collect();
        RefinedAnalysisResult::new(results, agreement)
    }

    fn critical_sqli() -> Finding {
        Finding::new("f1", "injection-vulnerability", Severity::Critical, "SQL injection")
            .at("services/email.js", Some(42))
            .with_evidence("db.query('...' + userId)")
    }

    fn solid_rec() -> Recommendation {
        Recommendation::new("r1", Priority::MustFix, "security", "Parameterize the digest query")
            .with_rationale("String concatenation lets userId inject SQL")
            .with_implementation("Use db.query(sql, [userId]) with a placeholder")
            .with_effort(Some(Effort::Low))
            .related_to("f1")
    }

    // ==================== Completeness ====================

    #[test]
    fn test_empty_result_set_completeness_is_zero() {
        let r = refined(vec![SpecializedAnalysis::new(AnalysisType::Security, vec![], vec![], 0.5)], 1.0);
        let score = score_completeness(&r, &QualityConfig::default());
        assert_eq!(score.score, 0.0);
        assert!(score.issues.iter().any(|i| i == "No findings"));
        assert!(score.issues.iter().any(|i| i == "No recommendations"));
        assert_eq!(score.missing_areas, vec!["architectural", "performance", "testing"]);
    }

    #[test]
    fn test_full_coverage_completeness() {
        let config = QualityConfig::default().with_expected_types(vec![AnalysisType::Security]);
        let r = refined(
            vec![SpecializedAnalysis::new(AnalysisType::Security, vec![critical_sqli()], vec![solid_rec()], 0.8)],
            1.0,
        );
        let score = score_completeness(&r, &config);
        assert!((score.score - 1.0).abs() < 1e-9, "{:?}", score);
        assert!(score.missing_areas.is_empty());
    }

    #[test]
    fn test_fallback_does_not_count_as_coverage() {
        let config = QualityConfig::default().with_expected_types(vec![AnalysisType::Security]);
        let r = refined(vec![SpecializedAnalysis::fallback(AnalysisType::Security, "timeout")], 1.0);
        let score = score_completeness(&r, &config);
        assert_eq!(score.missing_areas, vec!["security"]);
    }

    // ==================== Consistency ====================

    #[test]
    fn test_duplicates_and_misaligned_priority_lower_consistency() {
        let mut dup = critical_sqli();
        dup.id = "f2".to_string();
        let misaligned = solid_rec().with_priority(Some(Priority::Consider));
        let r = refined(
            vec![SpecializedAnalysis::new(
                AnalysisType::Security,
                vec![critical_sqli(), dup],
                vec![misaligned],
                0.8,
            )],
            1.0,
        );
        let score = score_consistency(&r);
        // mean(1.0, 0.5, 0.0)
        assert!((score.score - 0.5).abs() < 1e-9);
        assert_eq!(score.issues.len(), 2);
    }

    #[test]
    fn test_count_duplicate_findings_is_per_key() {
        let a = SpecializedAnalysis::new(
            AnalysisType::Security,
            vec![critical_sqli(), critical_sqli(), critical_sqli().at("other.js", Some(1))],
            vec![],
            0.5,
        );
        assert_eq!(count_duplicate_findings(&a), 1);
    }

    // ==================== Actionability ====================

    #[test]
    fn test_actionability_counts_each_property_independently() {
        let bare = Recommendation::new("r2", Priority::ShouldFix, "security", "Harden it")
            .with_effort(None);
        let r = refined(
            vec![SpecializedAnalysis::new(AnalysisType::Security, vec![critical_sqli()], vec![solid_rec(), bare], 0.8)],
            1.0,
        );
        let score = score_actionability(&r, &QualityConfig::default());
        // detailed 1/2, rationale 1/2, effort 1/2, priority 2/2
        assert!((score.score - 0.625).abs() < 1e-9);
        assert_eq!(score.issues.len(), 3);
    }

    // ==================== Evidence ====================

    #[test]
    fn test_thin_critical_evidence_is_penalized() {
        let r = refined(
            vec![SpecializedAnalysis::new(AnalysisType::Security, vec![critical_sqli()], vec![], 0.8)],
            1.0,
        );
        let score = score_evidence(&r, &QualityConfig::default());
        assert!((score.score - 0.8).abs() < 1e-9);

        let strong = critical_sqli().with_evidence("userId comes from req.query");
        let r = refined(
            vec![SpecializedAnalysis::new(AnalysisType::Security, vec![strong], vec![], 0.8)],
            1.0,
        );
        assert!((score_evidence(&r, &QualityConfig::default()).score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_multiplier_is_floored() {
        let findings: Vec<Finding> = (0..6)
            .map(|i| critical_sqli().at("a.js", Some(i)))
            .collect();
        let r = refined(vec![SpecializedAnalysis::new(AnalysisType::Security, findings, vec![], 0.8)], 1.0);
        assert!((score_evidence(&r, &QualityConfig::default()).score - 0.5).abs() < 1e-9);
    }
}
