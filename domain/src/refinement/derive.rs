//! Turning a critique plus local quality signals into typed feedback.

use super::state::{Critique, RefinementConfig};
use crate::analysis::classify::is_domain_specific;
use crate::analysis::validation::{DETAILED_IMPLEMENTATION_CHARS, type_specific_gap};
use crate::analysis::{AgentValidation, Feedback, Finding, Recommendation, SpecializedAnalysis};
use crate::core::context::PrContext;
use crate::core::string::truncate;
use std::collections::HashSet;

const EVIDENCE_EXCERPT_LEN: usize = 160;

/// Feedback for one analysis.
///
/// Local signals (missing evidence, low confidence, thin implementation
/// text) are always checked; the critique adds targeted ids and blind spots.
/// Each target receives at most one item of each kind.
pub fn derive_feedback(
    analysis: &SpecializedAnalysis,
    critique: &Critique,
    context: &PrContext,
    config: &RefinementConfig,
) -> Vec<Feedback> {
    let mut feedback = Vec::new();
    let doubted: HashSet<&str> = critique
        .low_confidence_findings
        .iter()
        .map(String::as_str)
        .collect();
    let vague: HashSet<&str> = critique
        .vague_recommendations
        .iter()
        .map(String::as_str)
        .collect();

    for finding in &analysis.findings {
        if !finding.has_evidence() {
            feedback.push(Feedback::MissingEvidence {
                finding_id: finding.id.clone(),
                evidence: evidence_hint(context, finding),
            });
        }
        if finding.confidence < config.low_confidence_threshold || doubted.contains(finding.id.as_str())
        {
            feedback.push(Feedback::LowConfidence {
                finding_id: finding.id.clone(),
            });
        }
    }

    for rec in &analysis.recommendations {
        let thin = rec.implementation.trim().chars().count() < config.min_implementation_chars;
        if thin || vague.contains(rec.id.as_str()) {
            feedback.push(Feedback::VagueRecommendation {
                recommendation_id: rec.id.clone(),
                guidance: guidance_for(rec, critique),
            });
        }
    }

    for area in &critique.blind_spots {
        if !area.trim().is_empty() {
            feedback.push(Feedback::IncompleteAnalysis {
                area: area.trim().to_string(),
            });
        }
    }

    feedback
}

/// Feedback for an agent's own validation warnings.
///
/// Only gaps not already targeted by `existing` are added: implementation
/// text that is present but under-detailed, and the domain-specific gaps
/// validation reports as warnings.
pub fn validation_feedback(
    analysis: &SpecializedAnalysis,
    validation: &AgentValidation,
    critique: &Critique,
    existing: &[Feedback],
) -> Vec<Feedback> {
    if validation.warnings.is_empty() {
        return Vec::new();
    }
    let targeted: HashSet<&str> = existing
        .iter()
        .filter_map(|f| match f {
            Feedback::VagueRecommendation {
                recommendation_id, ..
            } => Some(recommendation_id.as_str()),
            _ => None,
        })
        .collect();

    let mut feedback: Vec<Feedback> = analysis
        .recommendations
        .iter()
        .filter(|r| r.implementation.trim().chars().count() < DETAILED_IMPLEMENTATION_CHARS)
        .filter(|r| !targeted.contains(r.id.as_str()))
        .map(|r| Feedback::VagueRecommendation {
            recommendation_id: r.id.clone(),
            guidance: guidance_for(r, critique),
        })
        .collect();

    let ty = analysis.analysis_type;
    if !analysis.findings.is_empty()
        && !analysis.findings.iter().any(|f| is_domain_specific(ty, &f.finding_type))
    {
        feedback.push(Feedback::IncompleteAnalysis {
            area: format!("{}-specific issue types", ty.as_str()),
        });
    }
    if let Some(gap) = type_specific_gap(ty, analysis) {
        feedback.push(Feedback::IncompleteAnalysis { area: gap });
    }
    feedback
}

/// Best available excerpt backing a finding.
///
/// Prefers the finding's line in its file's patch, then the first added line
/// of that patch, then a plain location note.
pub fn evidence_hint(context: &PrContext, finding: &Finding) -> String {
    let excerpt = context
        .files
        .iter()
        .find(|f| f.path == finding.file)
        .and_then(|file| {
            let added: Vec<&str> = file
                .patch
                .lines()
                .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
                .map(|l| l[1..].trim())
                .filter(|l| !l.is_empty())
                .collect();
            finding
                .line
                .and_then(|n| file.patch.lines().nth(n.saturating_sub(1) as usize))
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .or_else(|| added.first().copied())
                .map(str::to_string)
        });

    match excerpt {
        Some(text) => format!("{}: {}", finding.location(), truncate(&text, EVIDENCE_EXCERPT_LEN)),
        None => format!(
            "{} reported at {}: {}",
            finding.finding_type,
            finding.location(),
            truncate(&finding.message, EVIDENCE_EXCERPT_LEN)
        ),
    }
}

fn guidance_for(rec: &Recommendation, critique: &Critique) -> String {
    match critique.deeper_investigation.first() {
        Some(hint) => format!("Next step: {}", hint.trim()),
        None => format!(
            "Apply the {} change where it was reported and add a test that fails without it.",
            rec.category
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisType, Priority, Severity};
    use crate::core::context::ChangedFile;

    fn context() -> PrContext {
        PrContext::new("Add digest emails").with_file(ChangedFile::new(
            "services/email.js",
            "@@ -1,2 +1,3 @@\n+const q = 'SELECT * FROM users WHERE id=' + userId;\n db.query(q);",
        ))
    }

    #[test]
    fn test_local_signals_produce_feedback() {
        let analysis = SpecializedAnalysis::new(
            AnalysisType::Security,
            vec![
                Finding::new("f1", "injection-vulnerability", Severity::Critical, "SQL injection")
                    .at("services/email.js", None)
                    .with_confidence(0.4),
            ],
            vec![Recommendation::new("r1", Priority::MustFix, "security", "Parameterize")],
            0.6,
        );
        let feedback = derive_feedback(&analysis, &Critique::default(), &context(), &RefinementConfig::default());
        let kinds: Vec<_> = feedback.iter().map(Feedback::kind).collect();
        assert_eq!(kinds, vec!["missing-evidence", "low-confidence", "vague-recommendation"]);

        match &feedback[0] {
            Feedback::MissingEvidence { evidence, .. } => {
                assert!(evidence.contains("SELECT * FROM users"), "{}", evidence)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_critique_targets_and_blind_spots() {
        let analysis = SpecializedAnalysis::new(
            AnalysisType::Security,
            vec![Finding::new("f1", "auth-weakness", Severity::Medium, "Weak session")
                .at("routes/login.js", Some(3))
                .with_evidence("req.session.user = body.user")
                .with_confidence(0.9)],
            vec![Recommendation::new("r1", Priority::ShouldFix, "auth", "Rotate session ids")
                .with_implementation("Call req.session.regenerate() after login succeeds")],
            0.8,
        );
        let critique = Critique {
            blind_spots: vec!["CSRF protection".to_string(), " ".to_string()],
            low_confidence_findings: vec!["f1".to_string()],
            vague_recommendations: vec!["r1".to_string()],
            deeper_investigation: vec!["check the logout route".to_string()],
            ..Default::default()
        };
        let feedback = derive_feedback(&analysis, &critique, &context(), &RefinementConfig::default());
        assert_eq!(feedback.len(), 3);
        assert!(feedback.contains(&Feedback::IncompleteAnalysis {
            area: "CSRF protection".to_string()
        }));
        assert!(feedback.contains(&Feedback::VagueRecommendation {
            recommendation_id: "r1".to_string(),
            guidance: "Next step: check the logout route".to_string()
        }));
    }

    #[test]
    fn test_validation_warnings_become_feedback() {
        let analysis = SpecializedAnalysis::new(
            AnalysisType::Security,
            vec![Finding::new("f1", "general", Severity::High, "Something is off")
                .at("services/email.js", None)
                .with_evidence("db.query(q)")],
            vec![Recommendation::new("r1", Priority::MustFix, "security", "Fix it")
                .with_implementation("Use placeholders in the query")],
            0.7,
        );
        let validation = crate::analysis::validate_analysis(&analysis);
        let feedback = validation_feedback(&analysis, &validation, &Critique::default(), &[]);
        let kinds: Vec<_> = feedback.iter().map(Feedback::kind).collect();
        assert_eq!(
            kinds,
            vec!["vague-recommendation", "incomplete-analysis", "incomplete-analysis"]
        );
        assert!(feedback.contains(&Feedback::IncompleteAnalysis {
            area: "security-specific issue types".to_string()
        }));

        // already-targeted recommendations are skipped
        let again = validation_feedback(&analysis, &validation, &Critique::default(), &feedback);
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn test_evidence_hint_without_patch_uses_location() {
        let f = Finding::new("f", "missing-tests", Severity::Low, "No tests for digest")
            .at("services/digest.js", Some(9));
        let hint = evidence_hint(&context(), &f);
        assert_eq!(hint, "missing-tests reported at services/digest.js:9: No tests for digest");
    }
}
