//! Pipeline parameters: use case loop control.
//!
//! [`PipelineConfig`] groups the static parameters that control
//! [`RunReviewUseCase`](crate::use_cases::run_review::RunReviewUseCase).
//! Thresholds live in the domain config types it embeds.

use council_domain::{CrossValidationConfig, Model, QualityConfig, RefinementConfig};
use std::time::Duration;

/// Extra time the orchestrator allows a task beyond the LLM timeout
pub const TASK_TIMEOUT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Models every agent runs against; empty means each agent's default
    pub models: Vec<Model>,
    /// Timeout for each LLM call
    pub llm_timeout: Duration,
    /// Gate-driven feedback rounds after refinement
    pub max_feedback_rounds: u32,
    pub cross_validation: CrossValidationConfig,
    pub refinement: RefinementConfig,
    pub quality: QualityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            llm_timeout: Duration::from_secs(120),
            max_feedback_rounds: 1,
            cross_validation: CrossValidationConfig::default(),
            refinement: RefinementConfig::default(),
            quality: QualityConfig::default(),
        }
    }
}

impl PipelineConfig {
    // ==================== Builder Methods ====================

    pub fn with_models(mut self, models: Vec<Model>) -> Self {
        self.models = models;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.refinement.max_iterations = max;
        self
    }

    pub fn with_max_feedback_rounds(mut self, max: u32) -> Self {
        self.max_feedback_rounds = max;
        self
    }

    pub fn with_cross_validation(mut self, config: CrossValidationConfig) -> Self {
        self.cross_validation = config;
        self
    }

    pub fn with_refinement(mut self, config: RefinementConfig) -> Self {
        self.refinement = config;
        self
    }

    pub fn with_quality(mut self, config: QualityConfig) -> Self {
        self.quality = config;
        self
    }

    /// Upper bound on one orchestrated agent task
    pub fn task_timeout(&self) -> Duration {
        self.llm_timeout + TASK_TIMEOUT_GRACE
    }
}
