//! Analysis agents
//!
//! The [`AnalysisAgent`] trait is what the orchestrator and refinement
//! engine see. [`SpecializedAgent`] is the one implementation: it serves
//! every [`AnalysisType`] and picks domain-specific behavior by matching on
//! the type.

mod specialized;

pub use specialized::{DEFAULT_LLM_TIMEOUT, SpecializedAgent};

use async_trait::async_trait;
use council_domain::{
    AgentValidation, AnalysisType, Feedback, Model, PrContext, SpecializedAnalysis,
    validate_analysis,
};

/// One analysis domain backed by an LLM
///
/// `analyze` never fails: LLM errors, malformed responses and timeouts all
/// produce [`SpecializedAnalysis::fallback`].
#[async_trait]
pub trait AnalysisAgent: Send + Sync {
    fn analysis_type(&self) -> AnalysisType;

    /// Model used by [`analyze`](Self::analyze)
    fn default_model(&self) -> &Model;

    /// Analyze the change with an explicit model
    async fn analyze_with_model(
        &self,
        context: &PrContext,
        prompt: Option<&str>,
        model: &Model,
    ) -> SpecializedAnalysis;

    /// Analyze the change with the default model
    async fn analyze(&self, context: &PrContext, prompt: Option<&str>) -> SpecializedAnalysis {
        let model = self.default_model().clone();
        self.analyze_with_model(context, prompt, &model).await
    }

    fn validate(&self, analysis: &SpecializedAnalysis) -> AgentValidation {
        validate_analysis(analysis)
    }

    /// Apply feedback; the result never has lower confidence than the input
    fn refine(&self, analysis: &SpecializedAnalysis, feedback: &[Feedback]) -> SpecializedAnalysis;
}
