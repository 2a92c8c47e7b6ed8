//! LLM-backed agent for a single analysis domain

use super::AnalysisAgent;
use crate::ports::llm_service::{LlmService, LlmServiceError};
use async_trait::async_trait;
use council_domain::analysis::classify_finding;
use council_domain::{
    AnalysisType, Feedback, LlmAnalysis, Model, PrContext, PromptTemplate, Recommendation,
    SpecializedAnalysis, apply_feedback, analysis::REFINEMENT_CONFIDENCE_DELTA,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout applied to each analysis call unless overridden
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);

/// Agent serving one [`AnalysisType`]
pub struct SpecializedAgent<S: LlmService + 'static> {
    analysis_type: AnalysisType,
    llm: Arc<S>,
    model: Model,
    timeout: Duration,
    confidence_delta: f64,
}

impl<S: LlmService + 'static> SpecializedAgent<S> {
    pub fn new(analysis_type: AnalysisType, llm: Arc<S>, model: Model) -> Self {
        Self {
            analysis_type,
            llm,
            model,
            timeout: DEFAULT_LLM_TIMEOUT,
            confidence_delta: REFINEMENT_CONFIDENCE_DELTA,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_confidence_delta(mut self, delta: f64) -> Self {
        self.confidence_delta = delta;
        self
    }

    /// Turn a parsed response into this agent's analysis.
    ///
    /// Findings are reclassified into domain sub-types, empty implementation
    /// text is backfilled, and risk is derived from the findings.
    fn post_process(&self, response: LlmAnalysis) -> SpecializedAnalysis {
        let ty = self.analysis_type;
        let findings = response
            .findings
            .into_iter()
            .map(|f| classify_finding(ty, f))
            .collect();
        let recommendations = response
            .recommendations
            .into_iter()
            .map(|r| {
                if r.implementation.trim().is_empty() {
                    let text = default_implementation(ty, &r);
                    r.with_implementation(text)
                } else {
                    r
                }
            })
            .collect();
        SpecializedAnalysis::new(ty, findings, recommendations, response.confidence)
            .with_summary(response.analysis)
    }
}

/// Generic next step for a recommendation the model left without one
fn default_implementation(analysis_type: AnalysisType, rec: &Recommendation) -> String {
    let step = match analysis_type {
        AnalysisType::Architectural => {
            "Move the logic behind an interface owned by the calling module"
        }
        AnalysisType::Security => {
            "Validate and sanitize the affected input, then add a regression test for the exploit path"
        }
        AnalysisType::Performance => {
            "Measure the hot path, batch or cache the repeated work, and compare timings"
        }
        AnalysisType::Testing => {
            "Add unit tests for the changed branches including the failure cases"
        }
    };
    format!("{} ({}: {})", step, rec.category, rec.description)
}

#[async_trait]
impl<S: LlmService + 'static> AnalysisAgent for SpecializedAgent<S> {
    fn analysis_type(&self) -> AnalysisType {
        self.analysis_type
    }

    fn default_model(&self) -> &Model {
        &self.model
    }

    async fn analyze_with_model(
        &self,
        context: &PrContext,
        prompt: Option<&str>,
        model: &Model,
    ) -> SpecializedAnalysis {
        let ty = self.analysis_type;
        let prompt = match prompt {
            Some(p) => p.to_string(),
            None => PromptTemplate::analysis_prompt(ty, context),
        };

        let call = self.llm.generate_analysis(model, ty, context, &prompt);
        let result = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(LlmServiceError::Timeout(self.timeout.as_secs())),
        };

        match result {
            Ok(response) => {
                debug!(
                    agent = %ty,
                    model = %model,
                    findings = response.findings.len(),
                    heuristic = response.heuristic,
                    "Analysis response parsed"
                );
                self.post_process(response)
            }
            Err(e) => {
                warn!(agent = %ty, model = %model, "Analysis failed, using fallback: {}", e);
                SpecializedAnalysis::fallback(ty, &e.to_string())
            }
        }
    }

    fn refine(&self, analysis: &SpecializedAnalysis, feedback: &[Feedback]) -> SpecializedAnalysis {
        apply_feedback(analysis, feedback, self.confidence_delta)
    }
}
