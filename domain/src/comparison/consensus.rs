//! Merged view of every agent's findings and recommendations.

use super::key::{FindingKey, RecommendationKey};
use crate::analysis::{AgentResult, Finding, Recommendation, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Weight of mean agent confidence in the consensus confidence.
pub const CONFIDENCE_WEIGHT: f64 = 0.6;
/// Weight of mean pairwise agreement in the consensus confidence.
pub const AGREEMENT_WEIGHT: f64 = 0.4;

/// Union of all results with key-duplicates collapsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusAnalysis {
    pub findings: Vec<Finding>,
    pub recommendations: Vec<Recommendation>,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub agreement_score: f64,
    /// `type@model` label of every contributing result
    pub contributors: Vec<String>,
}

impl ConsensusAnalysis {
    /// Build the consensus from agent results and any auxiliary (plugin) findings.
    ///
    /// Order is first-seen across `results`, then `auxiliary`. On a key
    /// collision the higher severity (or priority) instance wins and evidence
    /// and related finding ids are merged.
    pub fn build(results: &[AgentResult], agreement_score: f64, auxiliary: &[Finding]) -> Self {
        let findings = merge_by_key(
            results
                .iter()
                .flat_map(|r| r.analysis.findings.iter())
                .chain(auxiliary.iter()),
            FindingKey::of,
            merge_finding,
        );
        let recommendations = merge_by_key(
            results.iter().flat_map(|r| r.analysis.recommendations.iter()),
            RecommendationKey::of,
            merge_recommendation,
        );

        let confidence = if results.is_empty() {
            0.0
        } else {
            let mean = results.iter().map(AgentResult::confidence).sum::<f64>() / results.len() as f64;
            if results.len() < 2 {
                mean
            } else {
                CONFIDENCE_WEIGHT * mean + AGREEMENT_WEIGHT * agreement_score
            }
        };

        Self {
            risk_level: RiskLevel::from_findings(&findings),
            findings,
            recommendations,
            confidence: confidence.clamp(0.0, 1.0),
            agreement_score,
            contributors: results.iter().map(AgentResult::label).collect(),
        }
    }
}

fn merge_by_key<'a, T, K, I, F, M>(items: I, key: F, merge: M) -> Vec<T>
where
    T: Clone + 'a,
    K: Eq + Hash,
    I: Iterator<Item = &'a T>,
    F: Fn(&T) -> K,
    M: Fn(&T, &T) -> T,
{
    let mut out: Vec<T> = Vec::new();
    let mut seen: HashMap<K, usize> = HashMap::new();
    for item in items {
        match seen.get(&key(item)) {
            Some(&idx) => {
                let merged = merge(&out[idx], item);
                out[idx] = merged;
            }
            None => {
                seen.insert(key(item), out.len());
                out.push(item.clone());
            }
        }
    }
    out
}

fn merge_finding(kept: &Finding, incoming: &Finding) -> Finding {
    let (winner, other) = if incoming.severity > kept.severity {
        (incoming, kept)
    } else {
        (kept, incoming)
    };
    let mut merged = winner.clone();
    for e in &other.evidence {
        if !merged.evidence.contains(e) {
            merged.evidence.push(e.clone());
        }
    }
    merged.confidence = kept.confidence.max(incoming.confidence);
    merged
}

fn merge_recommendation(kept: &Recommendation, incoming: &Recommendation) -> Recommendation {
    let (winner, other) = if incoming.effective_priority() > kept.effective_priority() {
        (incoming, kept)
    } else {
        (kept, incoming)
    };
    let mut merged = winner.clone();
    for id in &other.related_findings {
        if !merged.related_findings.contains(id) {
            merged.related_findings.push(id.clone());
        }
    }
    if merged.rationale.trim().is_empty() {
        merged.rationale = other.rationale.clone();
    }
    if merged.implementation.trim().len() < other.implementation.trim().len() {
        merged.implementation = other.implementation.clone();
    }
    if merged.effort.is_none() {
        merged.effort = other.effort;
    }
    merged.confidence = kept.confidence.max(incoming.confidence);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisType, Priority, Severity, SpecializedAnalysis};
    use crate::core::model::Model;

    fn result(model: Model, findings: Vec<Finding>, recs: Vec<Recommendation>, confidence: f64) -> AgentResult {
        AgentResult::new(
            model,
            SpecializedAnalysis::new(AnalysisType::Security, findings, recs, confidence),
        )
    }

    #[test]
    fn test_duplicates_collapse_to_highest_severity() {
        let a = Finding::new("a", "injection-vulnerability", Severity::High, "m")
            .at("services/email.js", Some(42))
            .with_evidence("e1");
        let b = Finding::new("b", "injection-vulnerability", Severity::Critical, "m")
            .at("services/email.js", Some(42))
            .with_evidence("e2");
        let results = vec![
            result(Model::Gpt4o, vec![a], vec![], 0.8),
            result(Model::Gpt41, vec![b], vec![], 0.6),
        ];
        let consensus = ConsensusAnalysis::build(&results, 1.0, &[]);
        assert_eq!(consensus.findings.len(), 1);
        let f = &consensus.findings[0];
        assert_eq!(f.id, "b");
        assert_eq!(f.severity, Severity::Critical);
        assert_eq!(f.evidence, vec!["e2", "e1"]);
        assert_eq!(consensus.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_confidence_blends_agreement() {
        let results = vec![
            result(Model::Gpt4o, vec![], vec![], 0.8),
            result(Model::Gpt41, vec![], vec![], 0.6),
        ];
        let consensus = ConsensusAnalysis::build(&results, 0.5, &[]);
        // 0.6 * 0.7 + 0.4 * 0.5
        assert!((consensus.confidence - 0.62).abs() < 1e-9);
        assert_eq!(consensus.contributors.len(), 2);
    }

    #[test]
    fn test_single_result_uses_its_confidence() {
        let results = vec![result(Model::Gpt4o, vec![], vec![], 0.8)];
        let consensus = ConsensusAnalysis::build(&results, 0.0, &[]);
        assert!((consensus.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_recommendation_merge_keeps_urgent_priority() {
        let low = Recommendation::new("r1", Priority::Consider, "security", "Use parameterized queries")
            .with_rationale("Prevents injection")
            .related_to("f1");
        let high = Recommendation::new("r2", Priority::MustFix, "security", "Use parameterized queries")
            .related_to("f2");
        let results = vec![
            result(Model::Gpt4o, vec![], vec![low], 0.8),
            result(Model::Gpt41, vec![], vec![high], 0.8),
        ];
        let consensus = ConsensusAnalysis::build(&results, 1.0, &[]);
        assert_eq!(consensus.recommendations.len(), 1);
        let r = &consensus.recommendations[0];
        assert_eq!(r.priority, Some(Priority::MustFix));
        assert_eq!(r.rationale, "Prevents injection");
        assert_eq!(r.related_findings, vec!["f2", "f1"]);
    }

    #[test]
    fn test_auxiliary_findings_are_included() {
        let aux = Finding::new("plugin-secrets-x-0", "secret-exposure", Severity::High, "key")
            .at("config.js", Some(1));
        let consensus = ConsensusAnalysis::build(&[], 1.0, &[aux]);
        assert_eq!(consensus.findings.len(), 1);
        assert_eq!(consensus.confidence, 0.0);
    }
}
