//! OpenAI-compatible chat completions adapter
//!
//! Works against any server that speaks `POST /v1/chat/completions`
//! (OpenAI, Azure-style proxies, local inference servers). The API is
//! stateless, so each session keeps its conversation history locally.

use crate::config::FileProviderConfig;
use async_trait::async_trait;
use council_application::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use council_domain::Model;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Connection settings shared by the gateway and its sessions
#[derive(Debug)]
struct Endpoint {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl Endpoint {
    fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/{}", base, path)
        } else {
            format!("{}/v1/{}", base, path)
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

/// [`LlmGateway`] over an OpenAI-compatible HTTP API.
pub struct OpenAiCompatibleGateway {
    endpoint: Arc<Endpoint>,
}

impl OpenAiCompatibleGateway {
    pub fn new(config: &FileProviderConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("review-council/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            debug!(
                "No API key found in {}; sending unauthenticated requests",
                config.api_key_env
            );
        }
        Ok(Self {
            endpoint: Arc::new(Endpoint {
                client,
                base_url: config.base_url.clone(),
                api_key,
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            }),
        })
    }

    fn open(&self, model: &Model, system_prompt: Option<&str>) -> Box<dyn LlmSession> {
        Box::new(OpenAiSession {
            endpoint: Arc::clone(&self.endpoint),
            model: model.clone(),
            system_prompt: system_prompt
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            messages: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn create_session(&self, model: &Model) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(self.open(model, None))
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(self.open(model, Some(system_prompt)))
    }

    async fn available_models(&self) -> Result<Vec<Model>, GatewayError> {
        let request = self.endpoint.client.get(self.endpoint.url("models"));
        let response = self
            .endpoint
            .authorize(request)
            .send()
            .await
            .map_err(convert_reqwest_error)?;
        let response = check_status(response, None).await?;
        let list: ModelList = response
            .json()
            .await
            .map_err(|e| GatewayError::RequestFailed(format!("Invalid model list: {}", e)))?;
        Ok(list
            .data
            .into_iter()
            .map(|entry| {
                let Ok(model) = entry.id.parse::<Model>();
                model
            })
            .collect())
    }
}

pub struct OpenAiSession {
    endpoint: Arc<Endpoint>,
    model: Model,
    system_prompt: Option<String>,
    /// Conversation history (stateless API requires full history each call)
    messages: Mutex<Vec<ChatMessage>>,
}

impl OpenAiSession {
    fn request_messages(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        self.system_prompt
            .iter()
            .map(|prompt| ChatMessage::new("system", prompt))
            .chain(history.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl LlmSession for OpenAiSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        let mut history = self.messages.lock().await;
        history.push(ChatMessage::new("user", content));

        let body = ChatRequest {
            model: self.model.as_str(),
            messages: self.request_messages(&history),
            max_tokens: self.endpoint.max_tokens,
            temperature: self.endpoint.temperature,
        };
        debug!(
            model = %self.model,
            messages = body.messages.len(),
            "Calling chat completions"
        );

        let request = self
            .endpoint
            .client
            .post(self.endpoint.url("chat/completions"))
            .json(&body);
        let response = self
            .endpoint
            .authorize(request)
            .send()
            .await
            .map_err(convert_reqwest_error)?;
        let response = check_status(response, Some(&self.model)).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::RequestFailed(format!("Invalid response body: {}", e)))?;

        let reply = first_choice_text(parsed)?;
        history.push(ChatMessage::new("assistant", &reply));
        Ok(reply)
    }
}

fn first_choice_text(response: ChatResponse) -> Result<String, GatewayError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GatewayError::RequestFailed("No choices in response".to_string()))
}

fn convert_reqwest_error(error: reqwest::Error) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout
    } else if error.is_connect() {
        GatewayError::ConnectionError(error.to_string())
    } else {
        GatewayError::RequestFailed(error.to_string())
    }
}

async fn check_status(
    response: reqwest::Response,
    model: Option<&Model>,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), &body, model))
}

fn status_error(status: u16, body: &str, model: Option<&Model>) -> GatewayError {
    let detail: String = body.chars().take(200).collect();
    match (status, model) {
        (404, Some(model)) => GatewayError::ModelNotAvailable(model.to_string()),
        (408 | 504, _) => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status, detail)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(base_url: &str) -> Endpoint {
        Endpoint {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            api_key: None,
            max_tokens: 16,
            temperature: 0.0,
        }
    }

    #[test]
    fn test_url_joins_versioned_and_bare_bases() {
        assert_eq!(
            endpoint("https://api.openai.com").url("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint("http://localhost:8080/v1/").url("models"),
            "http://localhost:8080/v1/models"
        );
    }

    #[test]
    fn test_request_includes_system_prompt_first() {
        let session = OpenAiSession {
            endpoint: Arc::new(endpoint("http://localhost")),
            model: Model::Gpt4o,
            system_prompt: Some("You are a security reviewer".to_string()),
            messages: Mutex::new(Vec::new()),
        };
        let history = vec![ChatMessage::new("user", "review this")];
        let body = ChatRequest {
            model: session.model.as_str(),
            messages: session.request_messages(&history),
            max_tokens: 16,
            temperature: 0.0,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "review this");
    }

    #[test]
    fn test_first_choice_text() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"summary\":\"ok\"}"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_text(parsed).unwrap(), r#"{"summary":"ok"}"#);

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            first_choice_text(empty),
            Err(GatewayError::RequestFailed(_))
        ));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(404, "no such model", Some(&Model::Gpt41)),
            GatewayError::ModelNotAvailable(m) if m == "gpt-4.1"
        ));
        assert!(matches!(status_error(504, "", None), GatewayError::Timeout));
        let err = status_error(500, &"x".repeat(500), None);
        match err {
            GatewayError::RequestFailed(msg) => assert!(msg.len() < 220),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sessions_keep_model_and_start_empty() {
        let gateway = OpenAiCompatibleGateway::new(&FileProviderConfig::default()).unwrap();
        let session = gateway
            .create_session_with_system_prompt(&Model::ClaudeHaiku45, "sys")
            .await
            .unwrap();
        assert_eq!(session.model(), &Model::ClaudeHaiku45);
    }
}
