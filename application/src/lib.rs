//! Application layer for review-council
//!
//! This crate contains use cases, agents, port definitions, and application
//! configuration. It depends only on the domain layer.

pub mod agents;
pub mod config;
pub mod ports;
pub mod services;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use agents::{AnalysisAgent, SpecializedAgent};
pub use config::PipelineConfig;
pub use ports::{
    llm_gateway::{GatewayError, LlmGateway, LlmSession},
    llm_service::{LlmService, LlmServiceError},
    plugin::{AnalysisPlugin, PluginError, PluginInput, PluginOutput},
    progress::{NoProgress, PipelineProgressNotifier, PipelineStage},
};
pub use services::GatewayLlmService;
pub use use_cases::orchestrate::{MultiModelAnalysisResult, MultiModelOrchestrator};
pub use use_cases::refine::RefinementEngine;
pub use use_cases::run_review::{ReviewOutput, RunReviewError, RunReviewInput, RunReviewUseCase};
