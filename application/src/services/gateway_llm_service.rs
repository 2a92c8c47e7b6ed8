//! [`LlmService`] on top of an [`LlmGateway`]

use crate::ports::llm_gateway::LlmGateway;
use crate::ports::llm_service::{LlmService, LlmServiceError};
use async_trait::async_trait;
use council_domain::{
    AnalysisType, LlmAnalysis, Model, PrContext, PromptTemplate, parse_analysis,
};
use std::sync::Arc;
use tracing::debug;

/// Opens one gateway session per call and parses the reply
pub struct GatewayLlmService<G: LlmGateway + 'static> {
    gateway: Arc<G>,
}

impl<G: LlmGateway + 'static> GatewayLlmService<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl<G: LlmGateway + 'static> LlmService for GatewayLlmService<G> {
    async fn generate_analysis(
        &self,
        model: &Model,
        analysis_type: AnalysisType,
        context: &PrContext,
        prompt: &str,
    ) -> Result<LlmAnalysis, LlmServiceError> {
        debug!(
            agent = %analysis_type,
            model = %model,
            files = context.files.len(),
            "Requesting analysis"
        );
        let session = self
            .gateway
            .create_session_with_system_prompt(model, &PromptTemplate::analysis_system(analysis_type))
            .await?;
        let response = session.send(prompt).await?;
        parse_analysis(&response, analysis_type)
            .ok_or_else(|| LlmServiceError::MalformedResponse("empty response".to_string()))
    }

    async fn generate_text(
        &self,
        model: &Model,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, LlmServiceError> {
        let session = self
            .gateway
            .create_session_with_system_prompt(model, system_prompt)
            .await?;
        Ok(session.send(prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::{GatewayError, LlmSession};

    // ==================== Test Mocks ====================

    struct MockSession {
        model: Model,
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmSession for MockSession {
        fn model(&self) -> &Model {
            &self.model
        }

        async fn send(&self, _content: &str) -> Result<String, GatewayError> {
            self.reply
                .clone()
                .ok_or_else(|| GatewayError::RequestFailed("boom".to_string()))
        }
    }

    struct MockGateway {
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmGateway for MockGateway {
        async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
            Ok(Box::new(MockSession {
                model: model.clone(),
                reply: self.reply.clone(),
            }))
        }

        async fn create_session_with_system_prompt(
            &self,
            model: &Model,
            _system_prompt: &str,
        ) -> Result<Box<dyn LlmSession>, GatewayError> {
            self.create_session(model).await
        }

        async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
            Ok(vec![Model::Gpt4o])
        }
    }

    fn service(reply: Option<&str>) -> GatewayLlmService<MockGateway> {
        GatewayLlmService::new(Arc::new(MockGateway {
            reply: reply.map(str::to_string),
        }))
    }

    #[tokio::test]
    async fn test_fenced_json_is_parsed() {
        let reply = r#"Here you go:
```json
{"analysis": "ok", "confidence": 0.8,
 "findings": [{"id": "f1", "type": "injection-vulnerability", "severity": "critical",
               "message": "SQLi", "file": "a.js", "line": 3, "evidence": ["q + id"]}],
 "recommendations": []}
```"#;
        let parsed = service(Some(reply))
            .generate_analysis(&Model::Gpt4o, AnalysisType::Security, &PrContext::new("t"), "p")
            .await
            .unwrap();
        assert_eq!(parsed.findings.len(), 1);
        assert_eq!(parsed.confidence, 0.8);
        assert!(!parsed.heuristic);
    }

    #[tokio::test]
    async fn test_blank_reply_is_malformed() {
        let err = service(Some("  "))
            .generate_analysis(&Model::Gpt4o, AnalysisType::Security, &PrContext::new("t"), "p")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmServiceError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_gateway_error_propagates() {
        let err = service(None)
            .generate_text(&Model::Gpt4o, "sys", "p")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmServiceError::Gateway(GatewayError::RequestFailed(_))));
    }
}
