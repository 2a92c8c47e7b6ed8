//! Refinement session state: phases, critiques, rounds and the refined result.

use crate::analysis::{AgentResult, Finding, Recommendation, REFINEMENT_CONFIDENCE_DELTA};
use crate::comparison::ConsensusAnalysis;
use serde::{Deserialize, Serialize};

/// Overall score improvement below which refinement counts as converged.
pub const CONVERGENCE_EPSILON: f64 = 0.01;

/// Phase of a refinement session
///
/// `Initial → Critiquing → Refining → Validating → (Converged | NextIteration) → Terminal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefinementPhase {
    Initial,
    Critiquing,
    Refining,
    Validating,
    Converged,
    NextIteration,
    Terminal,
}

impl RefinementPhase {
    pub fn as_str(&self) -> &str {
        match self {
            RefinementPhase::Initial => "initial",
            RefinementPhase::Critiquing => "critiquing",
            RefinementPhase::Refining => "refining",
            RefinementPhase::Validating => "validating",
            RefinementPhase::Converged => "converged",
            RefinementPhase::NextIteration => "next-iteration",
            RefinementPhase::Terminal => "terminal",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            RefinementPhase::Initial => "Initial",
            RefinementPhase::Critiquing => "Self-Critique",
            RefinementPhase::Refining => "Refining",
            RefinementPhase::Validating => "Re-Validating",
            RefinementPhase::Converged => "Converged",
            RefinementPhase::NextIteration => "Next Iteration",
            RefinementPhase::Terminal => "Done",
        }
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: RefinementPhase) -> bool {
        use RefinementPhase::*;
        matches!(
            (self, next),
            (Initial, Critiquing)
                | (Initial, Terminal)
                | (Critiquing, Refining)
                | (Refining, Validating)
                | (Validating, Converged)
                | (Validating, NextIteration)
                | (NextIteration, Critiquing)
                | (NextIteration, Terminal)
                | (Converged, Terminal)
        )
    }
}

impl std::fmt::Display for RefinementPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Structured self-critique of one analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Critique {
    /// Areas the analysis did not look at
    pub blind_spots: Vec<String>,
    pub weak_assumptions: Vec<String>,
    /// Suggestions for deeper investigation
    pub deeper_investigation: Vec<String>,
    /// Ids of findings whose confidence the critic doubts
    pub low_confidence_findings: Vec<String>,
    /// Ids of recommendations that need concrete steps
    pub vague_recommendations: Vec<String>,
    pub is_complete: bool,
}

impl Critique {
    pub fn is_empty(&self) -> bool {
        self.blind_spots.is_empty()
            && self.weak_assumptions.is_empty()
            && self.deeper_investigation.is_empty()
            && self.low_confidence_findings.is_empty()
            && self.vague_recommendations.is_empty()
    }
}

/// Tunables for the refinement loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    pub max_iterations: u32,
    pub convergence_epsilon: f64,
    /// Confidence added per low-confidence feedback item
    pub confidence_delta: f64,
    /// Findings below this confidence get low-confidence feedback
    pub low_confidence_threshold: f64,
    /// Implementation text shorter than this gets vague-recommendation feedback
    pub min_implementation_chars: usize,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2,
            convergence_epsilon: CONVERGENCE_EPSILON,
            confidence_delta: REFINEMENT_CONFIDENCE_DELTA,
            low_confidence_threshold: 0.5,
            min_implementation_chars: 20,
        }
    }
}

impl RefinementConfig {
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Snapshot of one critique → refine → re-validate cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementRound {
    /// 1-based
    pub iteration: u32,
    /// One critique per result, in result order
    pub critiques: Vec<Critique>,
    pub feedback_applied: usize,
    pub score_before: f64,
    pub score_after: f64,
    /// Results as they stood at the end of this round
    pub results: Vec<AgentResult>,
    /// `Converged` or `NextIteration`
    pub outcome: RefinementPhase,
}

impl RefinementRound {
    pub fn improvement(&self) -> f64 {
        self.score_after - self.score_before
    }
}

/// Result set after (possibly zero) refinement rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedAnalysisResult {
    pub results: Vec<AgentResult>,
    pub consensus: ConsensusAnalysis,
    pub agreement_score: f64,
    pub rounds: Vec<RefinementRound>,
    pub converged: bool,
    /// Plugin findings merged into the consensus, not owned by any agent
    pub auxiliary_findings: Vec<Finding>,
}

impl RefinedAnalysisResult {
    pub fn new(results: Vec<AgentResult>, agreement_score: f64) -> Self {
        let consensus = ConsensusAnalysis::build(&results, agreement_score, &[]);
        Self {
            results,
            consensus,
            agreement_score,
            rounds: Vec::new(),
            converged: false,
            auxiliary_findings: Vec::new(),
        }
    }

    pub fn with_auxiliary_findings(mut self, findings: Vec<Finding>) -> Self {
        self.auxiliary_findings = findings;
        let agreement_score = self.agreement_score;
        self.rebuild_consensus(agreement_score)
    }

    /// Recompute the consensus from the current results and auxiliary findings.
    pub fn rebuild_consensus(mut self, agreement_score: f64) -> Self {
        self.agreement_score = agreement_score;
        self.consensus =
            ConsensusAnalysis::build(&self.results, agreement_score, &self.auxiliary_findings);
        self
    }

    /// Findings of every result, then the auxiliary findings.
    pub fn all_findings(&self) -> impl Iterator<Item = &Finding> {
        self.results
            .iter()
            .flat_map(|r| r.analysis.findings.iter())
            .chain(self.auxiliary_findings.iter())
    }

    pub fn all_recommendations(&self) -> impl Iterator<Item = &Recommendation> {
        self.results
            .iter()
            .flat_map(|r| r.analysis.recommendations.iter())
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisType, Severity, SpecializedAnalysis};
    use crate::core::model::Model;

    #[test]
    fn test_phase_transitions() {
        use RefinementPhase::*;
        assert!(Initial.can_transition_to(Critiquing));
        assert!(Initial.can_transition_to(Terminal));
        assert!(Validating.can_transition_to(Converged));
        assert!(NextIteration.can_transition_to(Critiquing));
        assert!(!Critiquing.can_transition_to(Validating));
        assert!(!Terminal.can_transition_to(Initial));
    }

    #[test]
    fn test_critique_deserializes_camel_case_with_defaults() {
        let critique: Critique =
            serde_json::from_str(r#"{"blindSpots":["rate limiting"],"isComplete":false}"#).unwrap();
        assert_eq!(critique.blind_spots, vec!["rate limiting"]);
        assert!(critique.weak_assumptions.is_empty());
        assert!(!critique.is_empty());
        assert!(Critique::default().is_empty());
    }

    #[test]
    fn test_auxiliary_findings_join_consensus() {
        let results = vec![AgentResult::new(
            Model::Gpt4o,
            SpecializedAnalysis::new(AnalysisType::Security, vec![], vec![], 0.7),
        )];
        let aux = Finding::new("plugin-a-b-0", "secret-exposure", Severity::High, "key")
            .at("config.js", Some(2));
        let refined = RefinedAnalysisResult::new(results, 1.0).with_auxiliary_findings(vec![aux]);
        assert_eq!(refined.consensus.findings.len(), 1);
        assert_eq!(refined.all_findings().count(), 1);
        assert_eq!(refined.round_count(), 0);
    }
}
