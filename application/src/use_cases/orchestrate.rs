//! Multi-model orchestration
//!
//! Fans every agent out across every configured model, then cross-validates
//! the results and builds the consensus.

use super::refine::RefinementEngine;
use crate::agents::AnalysisAgent;
use crate::ports::llm_service::LlmService;
use crate::ports::progress::{NoProgress, PipelineProgressNotifier, PipelineStage};
use council_domain::{
    AgentResult, ConsensusAnalysis, CrossValidator, DomainError, Model, PairwiseComparison,
    PrContext, RefinedAnalysisResult, SpecializedAnalysis,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Output of one fan-out plus cross-validation
#[derive(Debug, Clone)]
pub struct MultiModelAnalysisResult {
    /// Ordered by agent, then model
    pub results: Vec<AgentResult>,
    pub comparisons: Vec<PairwiseComparison>,
    /// Agreement among same-agent pairs (1.0 when there are none)
    pub agreement_score: f64,
    pub consensus: ConsensusAnalysis,
}

impl MultiModelAnalysisResult {
    pub fn into_refined(self) -> RefinedAnalysisResult {
        RefinedAnalysisResult::new(self.results, self.agreement_score)
    }

    pub fn fallback_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.analysis.is_fallback())
            .count()
    }
}

/// Runs agents concurrently and reconciles their output
pub struct MultiModelOrchestrator<S: LlmService + 'static> {
    validator: Arc<CrossValidator>,
    refinement: RefinementEngine<S>,
    models: Vec<Model>,
    task_timeout: Duration,
    cancellation_token: Option<CancellationToken>,
}

impl<S: LlmService + 'static> MultiModelOrchestrator<S> {
    pub fn new(
        validator: Arc<CrossValidator>,
        refinement: RefinementEngine<S>,
        task_timeout: Duration,
    ) -> Self {
        Self {
            validator,
            refinement,
            models: Vec::new(),
            task_timeout,
            cancellation_token: None,
        }
    }

    /// Models each agent runs against; empty means each agent's default
    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.models = models;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub async fn conduct_multi_model_analysis(
        &self,
        context: &PrContext,
        agents: &[Arc<dyn AnalysisAgent>],
    ) -> Result<MultiModelAnalysisResult, DomainError> {
        self.conduct_with_progress(context, agents, &NoProgress).await
    }

    /// Fan out, collect, cross-validate.
    ///
    /// Every agent × model pair yields exactly one result: a task that
    /// panics or exceeds the task timeout is replaced by its fallback.
    pub async fn conduct_with_progress(
        &self,
        context: &PrContext,
        agents: &[Arc<dyn AnalysisAgent>],
        progress: &dyn PipelineProgressNotifier,
    ) -> Result<MultiModelAnalysisResult, DomainError> {
        context.validate()?;
        if agents.is_empty() {
            return Err(DomainError::NoAgents);
        }

        let mut slots: Vec<(Arc<dyn AnalysisAgent>, Model)> = Vec::new();
        for agent in agents {
            if self.models.is_empty() {
                slots.push((Arc::clone(agent), agent.default_model().clone()));
            } else {
                for model in &self.models {
                    slots.push((Arc::clone(agent), model.clone()));
                }
            }
        }

        info!(
            "Starting analysis: {} agent(s) x {} model(s) = {} task(s)",
            agents.len(),
            self.models.len().max(1),
            slots.len()
        );
        progress.on_stage_start(PipelineStage::Analysis, slots.len());

        let context = Arc::new(context.clone());
        let mut join_set = JoinSet::new();
        for (index, (agent, model)) in slots.iter().enumerate() {
            let agent = Arc::clone(agent);
            let model = model.clone();
            let context = Arc::clone(&context);
            let task_timeout = self.task_timeout;

            join_set.spawn(async move {
                let analysis_type = agent.analysis_type();
                let call_model = model.clone();
                let mut call = tokio::spawn(async move {
                    agent.analyze_with_model(&context, None, &call_model).await
                });
                let analysis = match tokio::time::timeout(task_timeout, &mut call).await {
                    Ok(Ok(analysis)) => analysis,
                    Ok(Err(e)) => {
                        warn!("{}@{} task failed: {}", analysis_type, model, e);
                        SpecializedAnalysis::fallback(analysis_type, "analysis task panicked")
                    }
                    Err(_) => {
                        call.abort();
                        warn!("{}@{} task timed out", analysis_type, model);
                        SpecializedAnalysis::fallback(analysis_type, "analysis task timed out")
                    }
                };
                (index, AgentResult::new(model, analysis))
            });
        }

        let mut collected: Vec<Option<AgentResult>> = vec![None; slots.len()];
        loop {
            let joined = if let Some(ref token) = self.cancellation_token {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        join_set.abort_all();
                        return Err(DomainError::Cancelled);
                    }
                    joined = join_set.join_next() => joined,
                }
            } else {
                join_set.join_next().await
            };

            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((index, result)) => {
                    let fallback = result.analysis.is_fallback();
                    progress.on_agent_complete(result.agent_type, &result.model, fallback);
                    collected[index] = Some(result);
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }
        progress.on_stage_complete(PipelineStage::Analysis);

        let results: Vec<AgentResult> = collected
            .into_iter()
            .zip(&slots)
            .map(|(result, (agent, model))| {
                result.unwrap_or_else(|| {
                    AgentResult::new(
                        model.clone(),
                        SpecializedAnalysis::fallback(agent.analysis_type(), "analysis task was lost"),
                    )
                })
            })
            .collect();

        progress.on_stage_start(PipelineStage::CrossValidation, 0);
        let comparisons = self.validator.compare_all(&results);
        let agreement_score = self.validator.peer_agreement(&results, &comparisons);
        let consensus = ConsensusAnalysis::build(&results, agreement_score, &[]);
        progress.on_stage_complete(PipelineStage::CrossValidation);

        info!(
            "Analysis complete: {} result(s), {} comparison(s), agreement {:.2}",
            results.len(),
            comparisons.len(),
            agreement_score
        );

        Ok(MultiModelAnalysisResult {
            results,
            comparisons,
            agreement_score,
            consensus,
        })
    }

    /// Delegate to the refinement engine
    pub async fn iterative_refinement(
        &self,
        refined: RefinedAnalysisResult,
        context: &PrContext,
        agents: &[Arc<dyn AnalysisAgent>],
        max_iterations: u32,
        progress: &dyn PipelineProgressNotifier,
    ) -> RefinedAnalysisResult {
        self.refinement
            .refine(refined, context, agents, max_iterations, progress)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::SpecializedAgent;
    use crate::test_support::{MockLlmService, Reply, context, good_analysis};
    use council_domain::{AnalysisType, QualityGates, RefinementConfig};

    fn orchestrator(llm: Arc<MockLlmService>, task_timeout: Duration) -> MultiModelOrchestrator<MockLlmService> {
        let validator = Arc::new(CrossValidator::default());
        let engine = RefinementEngine::new(
            llm,
            Arc::clone(&validator),
            Arc::new(QualityGates::default()),
            RefinementConfig::default(),
        );
        MultiModelOrchestrator::new(validator, engine, task_timeout)
    }

    fn agents(llm: &Arc<MockLlmService>, types: &[AnalysisType], timeout: Duration) -> Vec<Arc<dyn AnalysisAgent>> {
        types
            .iter()
            .map(|ty| {
                Arc::new(
                    SpecializedAgent::new(*ty, Arc::clone(llm), Model::Gpt4o).with_timeout(timeout),
                ) as Arc<dyn AnalysisAgent>
            })
            .collect()
    }

    // ==================== Validation ====================

    #[tokio::test]
    async fn test_rejects_empty_agents() {
        let llm = Arc::new(MockLlmService::new());
        let err = orchestrator(llm, Duration::from_secs(1))
            .conduct_multi_model_analysis(&context(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoAgents));
    }

    #[tokio::test]
    async fn test_rejects_malformed_context() {
        let llm = Arc::new(MockLlmService::new());
        let a = agents(&llm, &[AnalysisType::Security], Duration::from_secs(1));
        let err = orchestrator(llm, Duration::from_secs(1))
            .conduct_multi_model_analysis(&PrContext::new("no files"), &a)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidContext(_)));
    }

    // ==================== Fan-out ====================

    #[tokio::test]
    async fn test_agents_times_models_in_order() {
        let llm = Arc::new(
            MockLlmService::new()
                .with_reply(AnalysisType::Security, Reply::Analysis(good_analysis(AnalysisType::Security)))
                .with_reply(AnalysisType::Testing, Reply::Analysis(good_analysis(AnalysisType::Testing))),
        );
        let a = agents(&llm, &[AnalysisType::Security, AnalysisType::Testing], Duration::from_secs(1));
        let out = orchestrator(Arc::clone(&llm), Duration::from_secs(2))
            .with_models(vec![Model::Gpt4o, Model::ClaudeSonnet45])
            .conduct_multi_model_analysis(&context(), &a)
            .await
            .unwrap();

        let labels: Vec<String> = out.results.iter().map(AgentResult::label).collect();
        assert_eq!(
            labels,
            vec![
                "security@gpt-4o",
                "security@claude-sonnet-4.5",
                "testing@gpt-4o",
                "testing@claude-sonnet-4.5",
            ]
        );
        assert_eq!(out.comparisons.len(), 6);
        assert_eq!(out.fallback_count(), 0);
        // identical replies per agent make same-agent pairs agree fully
        assert!(out.comparisons[0].result.agreement_score > 0.99);
    }

    #[tokio::test]
    async fn test_panic_and_timeout_become_fallbacks() {
        let llm = Arc::new(
            MockLlmService::new()
                .with_reply(AnalysisType::Security, Reply::Panic)
                .with_reply(AnalysisType::Performance, Reply::Hang)
                .with_reply(AnalysisType::Testing, Reply::Analysis(good_analysis(AnalysisType::Testing))),
        );
        let a = agents(
            &llm,
            &[AnalysisType::Security, AnalysisType::Performance, AnalysisType::Testing],
            Duration::from_secs(30),
        );
        let out = orchestrator(Arc::clone(&llm), Duration::from_millis(100))
            .conduct_multi_model_analysis(&context(), &a)
            .await
            .unwrap();

        assert_eq!(out.results.len(), 3);
        assert!(out.results[0].analysis.is_fallback());
        assert!(out.results[1].analysis.is_fallback());
        assert!(out.results[1].analysis.summary.contains("timed out"));
        assert!(!out.results[2].analysis.is_fallback());
        assert_eq!(out.fallback_count(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_aborts() {
        let llm = Arc::new(MockLlmService::new().with_reply(AnalysisType::Security, Reply::Hang));
        let a = agents(&llm, &[AnalysisType::Security], Duration::from_secs(30));
        let token = CancellationToken::new();
        token.cancel();
        let err = orchestrator(Arc::clone(&llm), Duration::from_secs(30))
            .with_cancellation(token)
            .conduct_multi_model_analysis(&context(), &a)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_consensus_confidence_blends_agreement() {
        let llm = Arc::new(
            MockLlmService::new()
                .with_reply(AnalysisType::Security, Reply::Analysis(good_analysis(AnalysisType::Security))),
        );
        let a = agents(&llm, &[AnalysisType::Security], Duration::from_secs(1));
        let out = orchestrator(Arc::clone(&llm), Duration::from_secs(2))
            .with_models(vec![Model::Gpt4o, Model::Gpt41])
            .conduct_multi_model_analysis(&context(), &a)
            .await
            .unwrap();
        // two identical results: 0.6 * 0.85 + 0.4 * 1.0
        assert!((out.consensus.confidence - 0.91).abs() < 1e-9);
        assert_eq!(out.consensus.findings.len(), 1);
    }
}
