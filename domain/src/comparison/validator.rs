//! Pairwise cross-validation of agent results.

use super::config::CrossValidationConfig;
use super::key::{FindingKey, RecommendationKey};
use super::result::{
    ComparisonResult, Conflict, ConflictSeverity, ConflictType, FindingComparison, FindingMatch,
    Insight, InsightKind, RecommendationComparison, RecommendationMatch,
};
use super::similarity::{finding_similarity, recommendation_similarity};
use crate::analysis::{AgentResult, Priority, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;

// Absorbs float noise at both band edges: an exact 0.3 difference is not a
// conflict and an exact 0.5 difference is high
const CONFIDENCE_EPSILON: f64 = 1e-9;

/// Running counters over every comparison this validator has made.
///
/// Observability only; nothing reads them back into a decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub total_comparisons: u64,
    /// Comparisons whose agreement exceeded the high-agreement threshold
    pub high_agreement_count: u64,
    pub conflict_count: u64,
    pub average_agreement: f64,
}

impl ValidationMetrics {
    fn record(&mut self, agreement: f64, conflicts: usize, high_agreement: bool) {
        self.total_comparisons += 1;
        if high_agreement {
            self.high_agreement_count += 1;
        }
        self.conflict_count += conflicts as u64;
        let n = self.total_comparisons as f64;
        self.average_agreement += (agreement - self.average_agreement) / n;
    }
}

/// One entry of an all-pairs comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparison {
    pub first_index: usize,
    pub second_index: usize,
    pub result: ComparisonResult,
}

/// Compares agent results for agreement and conflict.
#[derive(Debug, Default)]
pub struct CrossValidator {
    config: CrossValidationConfig,
    metrics: Mutex<ValidationMetrics>,
}

impl CrossValidator {
    pub fn new(config: CrossValidationConfig) -> Self {
        Self {
            config,
            metrics: Mutex::new(ValidationMetrics::default()),
        }
    }

    pub fn config(&self) -> &CrossValidationConfig {
        &self.config
    }

    /// Snapshot of the running metrics.
    pub fn metrics(&self) -> ValidationMetrics {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn compare_results(&self, first: &AgentResult, second: &AgentResult) -> ComparisonResult {
        let findings = self.compare_findings(first, second);
        let recommendations = self.compare_recommendations(first, second);
        let agreement_score = (findings.overlap() + recommendations.overlap()) / 2.0;

        let mut conflicts: Vec<Conflict> = findings
            .conflicts
            .iter()
            .chain(recommendations.conflicts.iter())
            .cloned()
            .collect();
        if let Some(conflict) = self.confidence_conflict(first, second) {
            conflicts.push(conflict);
        }

        let insights = self.generate_insights(first, second, agreement_score, &conflicts);

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record(
                agreement_score,
                conflicts.len(),
                agreement_score > self.config.high_agreement_threshold,
            );
        }

        ComparisonResult {
            first_label: first.label(),
            second_label: second.label(),
            agreement_score,
            findings,
            recommendations,
            conflicts,
            insights,
        }
    }

    /// Compare every unordered pair of `results`, in index order.
    pub fn compare_all(&self, results: &[AgentResult]) -> Vec<PairwiseComparison> {
        let mut out = Vec::new();
        for i in 0..results.len() {
            for j in (i + 1)..results.len() {
                out.push(PairwiseComparison {
                    first_index: i,
                    second_index: j,
                    result: self.compare_results(&results[i], &results[j]),
                });
            }
        }
        out
    }

    /// Mean agreement over all pairs; 1.0 when there are fewer than two results.
    pub fn mean_pairwise_agreement(&self, comparisons: &[PairwiseComparison]) -> f64 {
        if comparisons.is_empty() {
            return 1.0;
        }
        comparisons
            .iter()
            .map(|c| c.result.agreement_score)
            .sum::<f64>()
            / comparisons.len() as f64
    }

    /// Mean agreement over pairs produced by the same agent type.
    ///
    /// Different domains rarely report the same items, so only same-domain
    /// pairs (one agent across several models) say anything about
    /// agreement. 1.0 when no such pair exists.
    pub fn peer_agreement(&self, results: &[AgentResult], comparisons: &[PairwiseComparison]) -> f64 {
        let peers: Vec<f64> = comparisons
            .iter()
            .filter(|c| {
                match (results.get(c.first_index), results.get(c.second_index)) {
                    (Some(a), Some(b)) => a.agent_type == b.agent_type,
                    _ => false,
                }
            })
            .map(|c| c.result.agreement_score)
            .collect();
        if peers.is_empty() {
            return 1.0;
        }
        peers.iter().sum::<f64>() / peers.len() as f64
    }

    fn compare_findings(&self, first: &AgentResult, second: &AgentResult) -> FindingComparison {
        let a = &first.analysis.findings;
        let b = &second.analysis.findings;
        let pairing = pair_by_key(a, b, FindingKey::of);

        let mut cmp = FindingComparison::default();
        for (i, j) in pairing.pairs {
            let (fa, fb) = (&a[i], &b[j]);
            let similarity = finding_similarity(fa, fb, self.config.line_proximity);
            if similarity >= self.config.similarity_threshold {
                cmp.matches.push(FindingMatch {
                    first: fa.clone(),
                    second: fb.clone(),
                    similarity,
                    severity_match: fa.severity == fb.severity,
                });
            } else {
                let severity = if fa.severity.max(fb.severity) >= Severity::High {
                    ConflictSeverity::High
                } else {
                    ConflictSeverity::Medium
                };
                cmp.conflicts.push(
                    Conflict::new(
                        ConflictType::InterpretationDifference,
                        severity,
                        format!(
                            "{} at {}: {} rated {} vs {} rated {}",
                            fa.finding_type,
                            fa.location(),
                            first.label(),
                            fa.severity,
                            second.label(),
                            fb.severity
                        ),
                    )
                    .between(&fa.id, &fb.id),
                );
            }
        }
        cmp.unique_to_first = pairing.only_first.into_iter().map(|i| a[i].clone()).collect();
        cmp.unique_to_second = pairing.only_second.into_iter().map(|j| b[j].clone()).collect();
        cmp
    }

    fn compare_recommendations(
        &self,
        first: &AgentResult,
        second: &AgentResult,
    ) -> RecommendationComparison {
        let a = &first.analysis.recommendations;
        let b = &second.analysis.recommendations;
        let pairing = pair_by_key(a, b, RecommendationKey::of);

        let mut cmp = RecommendationComparison::default();
        for (i, j) in pairing.pairs {
            let (ra, rb) = (&a[i], &b[j]);
            let similarity = recommendation_similarity(ra, rb);
            let (pa, pb) = (ra.effective_priority(), rb.effective_priority());
            if similarity >= self.config.similarity_threshold {
                cmp.matches.push(RecommendationMatch {
                    first: ra.clone(),
                    second: rb.clone(),
                    similarity,
                    priority_match: pa == pb,
                });
                continue;
            }
            let (conflict_type, severity) = if pa != pb {
                let severity = if pa.max(pb) == Priority::MustFix {
                    ConflictSeverity::High
                } else {
                    ConflictSeverity::Medium
                };
                (ConflictType::PriorityMismatch, severity)
            } else {
                (ConflictType::InterpretationDifference, ConflictSeverity::Medium)
            };
            cmp.conflicts.push(
                Conflict::new(
                    conflict_type,
                    severity,
                    format!(
                        "{} recommendation '{}': {} says {} vs {} says {}",
                        ra.category,
                        ra.description,
                        first.label(),
                        pa,
                        second.label(),
                        pb
                    ),
                )
                .between(&ra.id, &rb.id),
            );
        }
        cmp.unique_to_first = pairing.only_first.into_iter().map(|i| a[i].clone()).collect();
        cmp.unique_to_second = pairing.only_second.into_iter().map(|j| b[j].clone()).collect();
        cmp
    }

    fn confidence_conflict(&self, first: &AgentResult, second: &AgentResult) -> Option<Conflict> {
        let diff = (first.confidence() - second.confidence()).abs();
        if diff <= self.config.confidence_conflict_threshold + CONFIDENCE_EPSILON {
            return None;
        }
        let severity = if diff >= self.config.high_confidence_conflict_threshold - CONFIDENCE_EPSILON
        {
            ConflictSeverity::High
        } else {
            ConflictSeverity::Medium
        };
        Some(Conflict::new(
            ConflictType::ConfidenceConflict,
            severity,
            format!(
                "{} confidence {:.2} vs {} confidence {:.2} (diff {:.2})",
                first.label(),
                first.confidence(),
                second.label(),
                second.confidence(),
                diff
            ),
        ))
    }

    fn generate_insights(
        &self,
        first: &AgentResult,
        second: &AgentResult,
        agreement: f64,
        conflicts: &[Conflict],
    ) -> Vec<Insight> {
        let mut insights = Vec::new();

        if agreement > self.config.high_agreement_threshold {
            insights.push(Insight {
                kind: InsightKind::HighAgreement,
                message: format!(
                    "{} and {} largely agree ({:.0}%)",
                    first.label(),
                    second.label(),
                    agreement * 100.0
                ),
                actionable: false,
            });
        } else if agreement < self.config.low_agreement_threshold {
            insights.push(Insight {
                kind: InsightKind::LowAgreement,
                message: format!(
                    "{} and {} disagree ({:.0}% agreement); validate the findings manually",
                    first.label(),
                    second.label(),
                    agreement * 100.0
                ),
                actionable: true,
            });
        }

        let high = conflicts.iter().filter(|c| c.is_high()).count();
        if high > 0 {
            insights.push(Insight {
                kind: InsightKind::Escalation,
                message: format!("{} high-severity conflict(s) need a human decision", high),
                actionable: true,
            });
        }

        let n1 = first.analysis.findings.len();
        let n2 = second.analysis.findings.len();
        let (more, fewer) = (n1.max(n2) as f64, n1.min(n2) as f64);
        if more > 0.0 && more > self.config.coverage_imbalance_ratio * fewer {
            insights.push(Insight {
                kind: InsightKind::CoverageImbalance,
                message: format!(
                    "Coverage differs: {} reported {} finding(s), {} reported {}",
                    first.label(),
                    n1,
                    second.label(),
                    n2
                ),
                actionable: true,
            });
        }

        insights
    }
}

struct Pairing {
    pairs: Vec<(usize, usize)>,
    only_first: Vec<usize>,
    only_second: Vec<usize>,
}

/// Pair items by key in first-side order; each item pairs at most once.
fn pair_by_key<T, K, F>(first: &[T], second: &[T], key: F) -> Pairing
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut index: HashMap<K, VecDeque<usize>> = HashMap::new();
    for (j, item) in second.iter().enumerate() {
        index.entry(key(item)).or_default().push_back(j);
    }

    let mut pairs = Vec::new();
    let mut only_first = Vec::new();
    let mut taken = vec![false; second.len()];
    for (i, item) in first.iter().enumerate() {
        match index.get_mut(&key(item)).and_then(VecDeque::pop_front) {
            Some(j) => {
                taken[j] = true;
                pairs.push((i, j));
            }
            None => only_first.push(i),
        }
    }
    let only_second = taken
        .iter()
        .enumerate()
        .filter(|(_, t)| !**t)
        .map(|(j, _)| j)
        .collect();

    Pairing {
        pairs,
        only_first,
        only_second,
    }
}
