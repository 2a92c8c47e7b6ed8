//! LLM Service port
//!
//! The structured view of an LLM that agents and the refinement engine use.
//! [`GatewayLlmService`](crate::services::GatewayLlmService) implements it on
//! top of an [`LlmGateway`](super::llm_gateway::LlmGateway).

use super::llm_gateway::GatewayError;
use async_trait::async_trait;
use council_domain::{AnalysisType, LlmAnalysis, Model, PrContext};
use thiserror::Error;

/// Errors that can occur when asking the LLM for an analysis or text
#[derive(Error, Debug)]
pub enum LlmServiceError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("LLM call timed out after {0}s")]
    Timeout(u64),
}

/// Structured LLM access
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Run one analysis call and parse the response.
    ///
    /// `prompt` is the full user prompt; `context` is passed along for
    /// implementations that want to log or route on it.
    async fn generate_analysis(
        &self,
        model: &Model,
        analysis_type: AnalysisType,
        context: &PrContext,
        prompt: &str,
    ) -> Result<LlmAnalysis, LlmServiceError>;

    /// Free-form completion (used for self-critique)
    async fn generate_text(
        &self,
        model: &Model,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, LlmServiceError>;
}
