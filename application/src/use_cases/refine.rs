//! Iterative refinement engine
//!
//! Critique → refine → re-validate, bounded by `max_iterations`.
//!
//! ```text
//! Initial → Critiquing → Refining → Validating → Converged    → Terminal
//!                ↑                              → NextIteration ┘
//!                └──────────────────────────────────┘
//! ```

use crate::agents::AnalysisAgent;
use crate::ports::llm_service::{LlmService, LlmServiceError};
use crate::ports::progress::PipelineProgressNotifier;
use council_domain::refinement::{derive_feedback, validation_feedback};
use council_domain::{
    AgentResult, Critique, CrossValidator, PrContext, PromptTemplate, QualityGates,
    RefinedAnalysisResult, RefinementConfig, RefinementPhase, RefinementRound,
    SpecializedAnalysis, apply_feedback, parse_critique,
};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drives refinement rounds over a result set
pub struct RefinementEngine<S: LlmService + 'static> {
    llm: Arc<S>,
    validator: Arc<CrossValidator>,
    gates: Arc<QualityGates>,
    config: RefinementConfig,
    timeout: Duration,
}

impl<S: LlmService + 'static> RefinementEngine<S> {
    pub fn new(
        llm: Arc<S>,
        validator: Arc<CrossValidator>,
        gates: Arc<QualityGates>,
        config: RefinementConfig,
    ) -> Self {
        Self {
            llm,
            validator,
            gates,
            config,
            timeout: crate::agents::DEFAULT_LLM_TIMEOUT,
        }
    }

    /// Timeout for each critique call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    /// Run up to `max_iterations` rounds.
    ///
    /// Results are matched to agents by analysis type; results without an
    /// agent get the feedback applied directly. With `max_iterations == 0`
    /// the input is returned unchanged.
    pub async fn refine(
        &self,
        initial: RefinedAnalysisResult,
        context: &PrContext,
        agents: &[Arc<dyn AnalysisAgent>],
        max_iterations: u32,
        progress: &dyn PipelineProgressNotifier,
    ) -> RefinedAnalysisResult {
        let mut phase = RefinementPhase::Initial;
        if max_iterations == 0 {
            advance(&mut phase, RefinementPhase::Terminal);
            return initial;
        }

        let mut current = initial;
        let mut score = self.gates.validate_results(&current).overall_score;
        info!(
            "Refinement starting: {} result(s), score {:.3}, up to {} iteration(s)",
            current.results.len(),
            score,
            max_iterations
        );

        for iteration in 1..=max_iterations {
            advance(&mut phase, RefinementPhase::Critiquing);
            let critiques: Vec<Critique> = join_all(
                current
                    .results
                    .iter()
                    .map(|result| self.critique(result, context)),
            )
            .await;

            advance(&mut phase, RefinementPhase::Refining);
            let mut feedback_applied = 0;
            let results: Vec<AgentResult> = current
                .results
                .iter()
                .zip(&critiques)
                .map(|(result, critique)| {
                    let (analysis, applied) = self.refine_one(result, critique, context, agents);
                    feedback_applied += applied;
                    AgentResult {
                        analysis,
                        ..result.clone()
                    }
                })
                .collect();

            advance(&mut phase, RefinementPhase::Validating);
            let comparisons = self.validator.compare_all(&results);
            let agreement = self.validator.peer_agreement(&results, &comparisons);
            current.results = results;
            current = current.rebuild_consensus(agreement);
            let score_after = self.gates.validate_results(&current).overall_score;

            let complete = critiques.iter().all(|c| c.is_complete);
            let improvement = score_after - score;
            let converged = complete || improvement < self.config.convergence_epsilon;
            let outcome = if converged {
                RefinementPhase::Converged
            } else {
                RefinementPhase::NextIteration
            };
            advance(&mut phase, outcome);

            let round = RefinementRound {
                iteration,
                critiques,
                feedback_applied,
                score_before: score,
                score_after,
                results: current.results.clone(),
                outcome,
            };
            info!(
                "Refinement round {}: {} feedback item(s), score {:.3} -> {:.3}",
                iteration, feedback_applied, score, score_after
            );
            progress.on_refinement_round(&round);
            current.rounds.push(round);
            score = score_after;

            if converged {
                current.converged = true;
                break;
            }
        }

        advance(&mut phase, RefinementPhase::Terminal);
        current
    }

    /// Critique one result; any failure yields an empty critique.
    async fn critique(&self, result: &AgentResult, context: &PrContext) -> Critique {
        let prompt = PromptTemplate::critique_prompt(&result.analysis, context);
        let call = self
            .llm
            .generate_text(&result.model, PromptTemplate::critique_system(), &prompt);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(response) => response,
            Err(_) => Err(LlmServiceError::Timeout(self.timeout.as_secs())),
        };
        match response {
            Ok(text) => parse_critique(&text).unwrap_or_else(|| {
                debug!("Critique for {} was not parseable", result.label());
                Critique::default()
            }),
            Err(e) => {
                warn!("Critique for {} failed: {}", result.label(), e);
                Critique::default()
            }
        }
    }

    fn refine_one(
        &self,
        result: &AgentResult,
        critique: &Critique,
        context: &PrContext,
        agents: &[Arc<dyn AnalysisAgent>],
    ) -> (SpecializedAnalysis, usize) {
        let analysis = &result.analysis;
        let mut feedback = derive_feedback(analysis, critique, context, &self.config);
        let agent = agents.iter().find(|a| a.analysis_type() == result.agent_type);
        let refined = match agent {
            Some(agent) => {
                let validation = agent.validate(analysis);
                let extra = validation_feedback(analysis, &validation, critique, &feedback);
                feedback.extend(extra);
                agent.refine(analysis, &feedback)
            }
            None => apply_feedback(analysis, &feedback, self.config.confidence_delta),
        };
        debug!(
            "{}: applied {} feedback item(s)",
            result.label(),
            feedback.len()
        );
        (refined, feedback.len())
    }
}

fn advance(phase: &mut RefinementPhase, next: RefinementPhase) {
    debug_assert!(
        phase.can_transition_to(next),
        "illegal refinement transition {} -> {}",
        phase,
        next
    );
    debug!("Refinement phase: {} -> {}", phase, next);
    *phase = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::SpecializedAgent;
    use crate::ports::progress::NoProgress;
    use crate::test_support::{MockLlmService, Reply, context, good_analysis, thin_analysis};
    use council_domain::refinement::CONVERGENCE_EPSILON;
    use council_domain::{AnalysisType, Model};
    use std::sync::atomic::Ordering;

    struct Fixture {
        engine: RefinementEngine<MockLlmService>,
        agents: Vec<Arc<dyn AnalysisAgent>>,
        initial: RefinedAnalysisResult,
    }

    async fn fixture(mock: MockLlmService) -> Fixture {
        let llm = Arc::new(mock);
        let types = [AnalysisType::Security, AnalysisType::Performance];
        let agents: Vec<Arc<dyn AnalysisAgent>> = types
            .iter()
            .map(|ty| {
                Arc::new(SpecializedAgent::new(*ty, Arc::clone(&llm), Model::Gpt4o))
                    as Arc<dyn AnalysisAgent>
            })
            .collect();
        let mut results = Vec::new();
        for agent in &agents {
            let analysis = agent.analyze(&context(), None).await;
            results.push(AgentResult::new(Model::Gpt4o, analysis));
        }
        let validator = Arc::new(CrossValidator::default());
        let agreement = validator.peer_agreement(&results, &validator.compare_all(&results));
        let gates = Arc::new(QualityGates::default());
        let engine = RefinementEngine::new(llm, validator, gates, RefinementConfig::default())
            .with_timeout(Duration::from_millis(200));
        Fixture {
            engine,
            agents,
            initial: RefinedAnalysisResult::new(results, agreement),
        }
    }

    fn thin_mock() -> MockLlmService {
        MockLlmService::new()
            .with_reply(AnalysisType::Security, Reply::Analysis(thin_analysis(AnalysisType::Security)))
            .with_reply(
                AnalysisType::Performance,
                Reply::Analysis(thin_analysis(AnalysisType::Performance)),
            )
    }

    #[tokio::test]
    async fn test_zero_iterations_returns_input_unchanged() {
        let f = fixture(thin_mock()).await;
        let out = f
            .engine
            .refine(f.initial.clone(), &context(), &f.agents, 0, &NoProgress)
            .await;
        assert_eq!(out, f.initial);
        assert_eq!(out.round_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_critique_still_refines_locally() {
        let f = fixture(thin_mock()).await;
        let out = f
            .engine
            .refine(f.initial.clone(), &context(), &f.agents, 2, &NoProgress)
            .await;

        assert!(out.round_count() >= 1);
        let round = &out.rounds[0];
        assert!(round.critiques.iter().all(Critique::is_empty));
        assert!(round.feedback_applied > 0);
        assert!(round.score_after > round.score_before);
        for (before, after) in f.initial.results.iter().zip(&out.results) {
            assert!(after.confidence() >= before.confidence());
            assert!(after.analysis.findings.iter().all(|x| x.has_evidence()));
        }
    }

    #[tokio::test]
    async fn test_complete_critique_converges_after_one_round() {
        let mock = thin_mock().with_critique(r#"{"blindSpots": [], "isComplete": true}"#);
        let f = fixture(mock).await;
        let out = f
            .engine
            .refine(f.initial.clone(), &context(), &f.agents, 5, &NoProgress)
            .await;

        assert!(out.converged);
        assert_eq!(out.round_count(), 1);
        assert_eq!(out.rounds[0].outcome, RefinementPhase::Converged);
        assert_eq!(f.engine.llm.critique_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_improvement_converges() {
        let mock = MockLlmService::new()
            .with_reply(AnalysisType::Security, Reply::Analysis(good_analysis(AnalysisType::Security)))
            .with_reply(
                AnalysisType::Performance,
                Reply::Analysis(good_analysis(AnalysisType::Performance)),
            );
        let f = fixture(mock).await;
        let out = f
            .engine
            .refine(f.initial.clone(), &context(), &f.agents, 3, &NoProgress)
            .await;
        assert!(out.converged);
        assert_eq!(out.round_count(), 1);
        assert!(out.rounds[0].improvement() < CONVERGENCE_EPSILON);
    }

    #[tokio::test]
    async fn test_blind_spots_are_recorded() {
        let mock = thin_mock().with_critique(
            r#"```json
{"blindSpots": ["rate limiting"], "deeperInvestigation": ["check the cron schedule"],
 "vagueRecommendations": ["security-r1"], "isComplete": false}
```"#,
        );
        let f = fixture(mock).await;
        let out = f
            .engine
            .refine(f.initial.clone(), &context(), &f.agents, 1, &NoProgress)
            .await;
        assert_eq!(out.round_count(), 1);
        assert!(out.results[0].analysis.summary.contains("Not yet covered: rate limiting"));
        assert!(out.results[0].analysis.recommendations[0]
            .implementation
            .contains("Next step: check the cron schedule"));
    }
}
