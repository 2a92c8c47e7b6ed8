//! Deterministic repairs applied when a result set fails the gates.
//!
//! Repairs only enrich existing findings and recommendations or drop
//! exact-key duplicate findings; they never invent new items.

use super::config::QualityConfig;
use super::scorers::{evidence_count, max_related_severity};
use crate::analysis::{Finding, Priority, Severity, SpecializedAnalysis};
use crate::comparison::FindingKey;
use crate::core::string::truncate;
use std::collections::HashMap;

const PLACEHOLDER_MESSAGE_LEN: usize = 120;

/// Collapse findings sharing a key, keeping the highest-severity instance.
///
/// The survivor takes the position of the key's first occurrence and picks
/// up the other instances' evidence. Ties keep the earlier instance.
/// Running it on its own output changes nothing.
pub fn dedup_findings(findings: &[Finding]) -> Vec<Finding> {
    dedup_with_aliases(findings).0
}

/// Dedup plus a map from every dropped id to the id that replaced it.
fn dedup_with_aliases(findings: &[Finding]) -> (Vec<Finding>, HashMap<String, String>) {
    let mut out: Vec<Finding> = Vec::new();
    let mut slot: HashMap<FindingKey, usize> = HashMap::new();
    let mut dropped: Vec<(String, usize)> = Vec::new();

    for finding in findings {
        let key = FindingKey::of(finding);
        let Some(&idx) = slot.get(&key) else {
            slot.insert(key, out.len());
            out.push(finding.clone());
            continue;
        };
        let loser = if finding.severity > out[idx].severity {
            std::mem::replace(&mut out[idx], finding.clone())
        } else {
            finding.clone()
        };
        for e in loser.evidence {
            if !out[idx].evidence.contains(&e) {
                out[idx].evidence.push(e);
            }
        }
        dropped.push((loser.id, idx));
    }

    let aliases = dropped
        .into_iter()
        .filter(|(id, idx)| &out[*idx].id != id)
        .map(|(id, idx)| (id, out[idx].id.clone()))
        .collect();
    (out, aliases)
}

/// Evidence synthesized from the finding's own location and message.
fn placeholder_evidence(finding: &Finding, nth: usize) -> String {
    match nth {
        0 => format!(
            "Reported at {}: {}",
            finding.location(),
            truncate(&finding.message, PLACEHOLDER_MESSAGE_LEN)
        ),
        1 => format!(
            "Flagged {} {}; confirm against the diff before merging",
            finding.severity, finding.finding_type
        ),
        n => format!("Evidence item {} pending for {}", n + 1, finding.location()),
    }
}

/// Top up evidence to one item, or to the configured minimum for critical findings.
pub fn fill_evidence(finding: &Finding, config: &QualityConfig) -> Finding {
    let required = if finding.severity == Severity::Critical {
        config.critical_evidence_min.max(1)
    } else {
        1
    };
    let mut repaired = finding.clone();
    repaired.evidence.retain(|e| !e.trim().is_empty());
    for nth in 0..required {
        if evidence_count(&repaired) >= required {
            break;
        }
        let text = placeholder_evidence(finding, nth);
        if !repaired.evidence.contains(&text) {
            repaired.evidence.push(text);
        }
    }
    repaired
}

/// Repair one analysis; the input is left untouched.
pub fn repair_analysis(analysis: &SpecializedAnalysis, config: &QualityConfig) -> SpecializedAnalysis {
    let (findings, aliases) = dedup_with_aliases(&analysis.findings);
    let mut repaired = analysis.clone();
    repaired.findings = findings.iter().map(|f| fill_evidence(f, config)).collect();

    let mut recommendations = analysis.recommendations.clone();
    for rec in &mut recommendations {
        let mut related: Vec<String> = Vec::new();
        for id in &rec.related_findings {
            let id = aliases.get(id).unwrap_or(id);
            if !related.contains(id) {
                related.push(id.clone());
            }
        }
        rec.related_findings = related;

        if rec.implementation.trim().chars().count() < config.min_implementation_chars {
            let placeholder = format!("Address the {} concern: {}", rec.category, rec.description);
            rec.implementation = if rec.implementation.trim().is_empty() {
                placeholder
            } else {
                format!("{} {}", rec.implementation.trim(), placeholder)
            };
        }
    }
    repaired.recommendations = recommendations;

    // Priorities are re-aligned against the deduplicated findings
    let aligned: Vec<Option<Priority>> = repaired
        .recommendations
        .iter()
        .map(|rec| max_related_severity(&repaired, rec).map(Priority::for_severity))
        .collect();
    for (rec, priority) in repaired.recommendations.iter_mut().zip(aligned) {
        if let Some(priority) = priority {
            rec.priority = Some(priority);
        }
    }

    repaired.recompute_risk()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisType, Recommendation};

    fn at(id: &str, severity: Severity, line: u32) -> Finding {
        Finding::new(id, "injection-vulnerability", severity, "SQL injection")
            .at("services/email.js", Some(line))
    }

    // ==================== Dedup ====================

    #[test]
    fn test_dedup_keeps_highest_severity() {
        let findings = vec![
            at("a", Severity::Medium, 42).with_evidence("e-a"),
            at("b", Severity::Low, 7),
            at("c", Severity::Critical, 42).with_evidence("e-c"),
        ];
        let deduped = dedup_findings(&findings);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].id, "c");
        assert_eq!(deduped[0].evidence, vec!["e-c", "e-a"]);
        assert_eq!(deduped[1].id, "b");
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let findings = vec![
            at("a", Severity::High, 42),
            at("b", Severity::High, 42).with_evidence("x"),
            at("c", Severity::Low, 1),
            at("d", Severity::Critical, 1),
        ];
        let once = dedup_findings(&findings);
        let twice = dedup_findings(&once);
        assert_eq!(once, twice);
    }

    // ==================== Analysis repair ====================

    #[test]
    fn test_repair_fills_and_realigns() {
        let analysis = SpecializedAnalysis::new(
            AnalysisType::Security,
            vec![at("a", Severity::Medium, 42), at("b", Severity::Critical, 42)],
            vec![Recommendation::new("r1", Priority::Consider, "security", "Parameterize")
                .related_to("a")],
            0.7,
        );
        let config = QualityConfig::default();
        let repaired = repair_analysis(&analysis, &config);

        assert_eq!(repaired.findings.len(), 1);
        let f = &repaired.findings[0];
        assert_eq!(f.id, "b");
        assert_eq!(f.evidence.len(), 2);
        assert!(f.evidence[0].starts_with("Reported at services/email.js:42"));

        let r = &repaired.recommendations[0];
        assert_eq!(r.related_findings, vec!["b"]);
        assert_eq!(r.priority, Some(Priority::MustFix));
        assert_eq!(r.implementation, "Address the security concern: Parameterize");

        // the original is untouched
        assert_eq!(analysis.findings.len(), 2);
        assert!(analysis.recommendations[0].implementation.is_empty());
    }

    #[test]
    fn test_repair_never_adds_items() {
        let analysis = SpecializedAnalysis::new(AnalysisType::Testing, vec![], vec![], 0.5);
        let repaired = repair_analysis(&analysis, &QualityConfig::default());
        assert!(repaired.findings.is_empty());
        assert!(repaired.recommendations.is_empty());
    }
}
