//! Run Review use case
//!
//! The pipeline entry point: analysis → plugins → refinement → quality
//! gates → bounded feedback rounds → standards repair.

use super::orchestrate::MultiModelOrchestrator;
use super::refine::RefinementEngine;
use crate::agents::AnalysisAgent;
use crate::config::PipelineConfig;
use crate::ports::llm_service::LlmService;
use crate::ports::plugin::{AnalysisPlugin, PluginInput};
use crate::ports::progress::{NoProgress, PipelineProgressNotifier, PipelineStage};
use council_domain::analysis::BROAD_SCOPE;
use council_domain::{
    AgentResult, ConsensusAnalysis, CrossValidator, DomainError, Finding, PrContext,
    QualityGates, QualityValidation, RefinedAnalysisResult, RefinementRound, apply_feedback,
};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors surfaced to the caller of a review
#[derive(Error, Debug)]
pub enum RunReviewError {
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl RunReviewError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunReviewError::Domain(e) if e.is_cancelled())
    }
}

/// Input for the RunReview use case
#[derive(Clone)]
pub struct RunReviewInput {
    pub context: PrContext,
    /// Ordered; result order follows agent order
    pub agents: Vec<Arc<dyn AnalysisAgent>>,
}

impl RunReviewInput {
    pub fn new(context: PrContext, agents: Vec<Arc<dyn AnalysisAgent>>) -> Self {
        Self { context, agents }
    }
}

/// Final, quality-gated verdict
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutput {
    pub validation: QualityValidation,
    pub consensus: ConsensusAnalysis,
    pub analyses: Vec<AgentResult>,
    pub rounds: Vec<RefinementRound>,
    pub auxiliary_findings: Vec<Finding>,
    /// Gate-driven feedback rounds that ran after refinement
    pub feedback_rounds: u32,
    /// Whether `ensure_standards` had to repair the result set
    pub repaired: bool,
}

impl ReviewOutput {
    pub fn passed(&self) -> bool {
        self.validation.passes_gates
    }
}

/// Use case for running a full review
pub struct RunReviewUseCase<S: LlmService + 'static> {
    llm: Arc<S>,
    validator: Arc<CrossValidator>,
    config: PipelineConfig,
    plugins: Vec<Arc<dyn AnalysisPlugin>>,
    cancellation_token: Option<CancellationToken>,
}

impl<S: LlmService + 'static> RunReviewUseCase<S> {
    pub fn new(llm: Arc<S>, config: PipelineConfig) -> Self {
        let validator = Arc::new(CrossValidator::new(config.cross_validation.clone()));
        Self {
            llm,
            validator,
            config,
            plugins: Vec::new(),
            cancellation_token: None,
        }
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn AnalysisPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn validator(&self) -> &CrossValidator {
        &self.validator
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: RunReviewInput) -> Result<ReviewOutput, RunReviewError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunReviewInput,
        progress: &dyn PipelineProgressNotifier,
    ) -> Result<ReviewOutput, RunReviewError> {
        let RunReviewInput { context, agents } = input;

        // Completeness expects exactly the domains that were asked for
        let mut expected: Vec<_> = agents.iter().map(|a| a.analysis_type()).collect();
        expected.sort();
        expected.dedup();
        let gates = Arc::new(QualityGates::new(
            self.config.quality.clone().with_expected_types(expected),
        ));

        let engine = RefinementEngine::new(
            Arc::clone(&self.llm),
            Arc::clone(&self.validator),
            Arc::clone(&gates),
            self.config.refinement.clone(),
        )
        .with_timeout(self.config.llm_timeout);
        let mut orchestrator =
            MultiModelOrchestrator::new(Arc::clone(&self.validator), engine, self.config.task_timeout())
                .with_models(self.config.models.clone());
        if let Some(token) = &self.cancellation_token {
            orchestrator = orchestrator.with_cancellation(token.clone());
        }

        // Analysis + cross-validation
        let analysis = orchestrator
            .conduct_with_progress(&context, &agents, progress)
            .await?;
        self.check_cancelled()?;

        // Plugins
        let auxiliary = self.run_plugins(&context, progress).await;
        let refined = analysis.into_refined().with_auxiliary_findings(auxiliary);

        // Refinement
        progress.on_stage_start(PipelineStage::Refinement, self.config.refinement.max_iterations as usize);
        let mut refined = orchestrator
            .iterative_refinement(
                refined,
                &context,
                &agents,
                self.config.refinement.max_iterations,
                progress,
            )
            .await;
        progress.on_stage_complete(PipelineStage::Refinement);
        self.check_cancelled()?;

        // Gates
        progress.on_stage_start(PipelineStage::QualityGates, 1);
        let mut validation = gates.validate_results(&refined);
        progress.on_gate_result(&validation);
        progress.on_stage_complete(PipelineStage::QualityGates);

        // Feedback rounds driven by the gate's improvements
        let mut feedback_rounds = 0;
        while !validation.passes_gates && feedback_rounds < self.config.max_feedback_rounds {
            feedback_rounds += 1;
            progress.on_stage_start(PipelineStage::Feedback, 1);
            refined = self.apply_improvements(refined, &validation, &agents);
            validation = gates.validate_results(&refined);
            info!(
                "Feedback round {}: overall {:.3}, passes: {}",
                feedback_rounds, validation.overall_score, validation.passes_gates
            );
            progress.on_gate_result(&validation);
            progress.on_stage_complete(PipelineStage::Feedback);
            self.check_cancelled()?;
        }

        // Last resort: deterministic repair
        let repaired = !validation.passes_gates;
        if repaired {
            progress.on_stage_start(PipelineStage::Repair, 1);
            refined = gates.ensure_standards(&refined, &validation);
            validation = gates.validate_results(&refined);
            info!(
                "Repaired result set: overall {:.3}, passes: {}",
                validation.overall_score, validation.passes_gates
            );
            progress.on_gate_result(&validation);
            progress.on_stage_complete(PipelineStage::Repair);
        }

        if !validation.passes_gates {
            warn!(
                "Review did not clear the quality gates (overall {:.3})",
                validation.overall_score
            );
        }

        Ok(ReviewOutput {
            validation,
            consensus: refined.consensus,
            analyses: refined.results,
            rounds: refined.rounds,
            auxiliary_findings: refined.auxiliary_findings,
            feedback_rounds,
            repaired,
        })
    }

    fn check_cancelled(&self) -> Result<(), RunReviewError> {
        match &self.cancellation_token {
            Some(token) if token.is_cancelled() => Err(DomainError::Cancelled.into()),
            _ => Ok(()),
        }
    }

    /// Run every plugin over every changed file; failing plugins are skipped.
    async fn run_plugins(
        &self,
        context: &PrContext,
        progress: &dyn PipelineProgressNotifier,
    ) -> Vec<Finding> {
        if self.plugins.is_empty() {
            return Vec::new();
        }

        let chunks: Vec<PluginInput> = if context.files.is_empty() {
            vec![PluginInput {
                file_path: BROAD_SCOPE.to_string(),
                chunk_content: context.diff_text(),
            }]
        } else {
            context
                .files
                .iter()
                .map(|f| PluginInput {
                    file_path: f.path.clone(),
                    chunk_content: f.patch.clone(),
                })
                .collect()
        };

        progress.on_stage_start(PipelineStage::Plugins, self.plugins.len() * chunks.len());
        let calls = self.plugins.iter().flat_map(|plugin| {
            chunks.iter().map(move |chunk| {
                let plugin = Arc::clone(plugin);
                let chunk = chunk.clone();
                async move {
                    let file_path = chunk.file_path.clone();
                    (plugin.name().to_string(), file_path, plugin.execute(chunk).await)
                }
            })
        });

        let mut findings = Vec::new();
        for (name, file_path, outcome) in join_all(calls).await {
            match outcome {
                Ok(output) => {
                    let offset = findings.len();
                    findings.extend(
                        output
                            .findings
                            .into_iter()
                            .enumerate()
                            .map(|(i, f)| f.into_finding(&file_path, offset + i)),
                    );
                }
                Err(e) => warn!("Plugin {} skipped for {}: {}", name, file_path, e),
            }
        }
        progress.on_stage_complete(PipelineStage::Plugins);
        info!("Plugins reported {} finding(s)", findings.len());
        findings
    }

    /// Route the gate's targeted feedback to the owning agents.
    fn apply_improvements(
        &self,
        mut refined: RefinedAnalysisResult,
        validation: &QualityValidation,
        agents: &[Arc<dyn AnalysisAgent>],
    ) -> RefinedAnalysisResult {
        for (index, result) in refined.results.iter_mut().enumerate() {
            let feedback: Vec<_> = validation
                .feedback()
                .filter(|t| t.result == index)
                .map(|t| t.feedback.clone())
                .collect();
            if feedback.is_empty() {
                continue;
            }
            let analysis = match agents.iter().find(|a| a.analysis_type() == result.agent_type) {
                Some(agent) => agent.refine(&result.analysis, &feedback),
                None => apply_feedback(
                    &result.analysis,
                    &feedback,
                    self.config.refinement.confidence_delta,
                ),
            };
            result.analysis = analysis;
        }
        let comparisons = self.validator.compare_all(&refined.results);
        let agreement = self.validator.peer_agreement(&refined.results, &comparisons);
        refined.rebuild_consensus(agreement)
    }
}
