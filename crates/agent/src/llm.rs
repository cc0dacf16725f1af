use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use parley_core::config::LlmConfig;
use parley_core::prompts::{ChatPrompt, PromptKind};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
    #[error("upstream response contained no choices")]
    EmptyResponse,
    #[error("llm client is misconfigured: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One chat-completion exchange. No retries.
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LlmError>;
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed { message: String },
    Plain(String),
}

/// Client for any endpoint that speaks the OpenAI `chat/completions` format
/// (OpenAI, Groq, Ollama).
pub struct OpenAiCompatibleClient {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    negotiation_model: String,
    drafting_model: String,
    analysis_model: String,
}

impl OpenAiCompatibleClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Configuration(error.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.endpoint_base()),
            api_key: config.api_key.clone(),
            negotiation_model: config.model_for(PromptKind::Negotiation).to_string(),
            drafting_model: config.model_for(PromptKind::Drafting).to_string(),
            analysis_model: config.model_for(PromptKind::Analysis).to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn model(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Negotiation => &self.negotiation_model,
            PromptKind::Drafting => &self.drafting_model,
            PromptKind::Analysis => &self.analysis_model,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, LlmError> {
        let model = self.model(prompt.kind);
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system".to_string(), content: prompt.system.clone() },
                ChatMessage { role: "user".to_string(), content: prompt.user.clone() },
            ],
            temperature: prompt.temperature,
        };

        debug!(
            event_name = "llm.request",
            kind = prompt.kind.as_str(),
            model,
            temperature = prompt.temperature,
            "sending chat completion"
        );

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| LlmError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), message: error_message(&raw) });
        }

        let parsed = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|error| LlmError::Decode(error.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Prefers the provider's `{"error": {"message": ..}}` detail over the raw body.
fn error_message(raw: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(raw) {
        Ok(ErrorEnvelope { error: ErrorBody::Detailed { message } })
        | Ok(ErrorEnvelope { error: ErrorBody::Plain(message) }) => message,
        Err(_) if raw.trim().is_empty() => "no response body".to_string(),
        Err(_) => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    use parley_core::config::{LlmConfig, LlmProvider};
    use parley_core::prompts::{ChatPrompt, PromptKind};

    use super::{error_message, LlmClient, LlmError, OpenAiCompatibleClient};

    type Captured = Arc<Mutex<Vec<Value>>>;

    async fn spawn_upstream(status: StatusCode, reply: Value) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    move |State(captured): State<Captured>, Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            captured.lock().expect("capture lock").push(body);
                            (status, Json(reply))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let address = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        (format!("http://{address}/v1"), captured)
    }

    fn config(base_url: String) -> LlmConfig {
        LlmConfig {
            provider: LlmProvider::Ollama,
            api_key: None,
            base_url: Some(base_url),
            negotiation_model: Some("advisor-model".to_string()),
            drafting_model: None,
            analysis_model: None,
            timeout_secs: 5,
        }
    }

    fn prompt(kind: PromptKind, temperature: f32) -> ChatPrompt {
        ChatPrompt {
            kind,
            system: "system text".to_string(),
            user: "user text".to_string(),
            temperature,
        }
    }

    #[tokio::test]
    async fn sends_system_and_user_messages_with_model_and_temperature() {
        let (base_url, captured) = spawn_upstream(
            StatusCode::OK,
            json!({ "choices": [{ "message": { "role": "assistant", "content": "Hold firm." } }] }),
        )
        .await;
        let client = OpenAiCompatibleClient::from_config(&config(base_url)).expect("client");

        let reply = client.complete(&prompt(PromptKind::Negotiation, 0.7)).await.expect("reply");

        assert_eq!(reply, "Hold firm.");
        let requests = captured.lock().expect("capture lock");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["model"], "advisor-model");
        assert_eq!(requests[0]["messages"][0]["role"], "system");
        assert_eq!(requests[0]["messages"][1]["content"], "user text");
        assert!((requests[0]["temperature"].as_f64().unwrap_or_default() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn unconfigured_feature_models_fall_back_to_provider_default() {
        let (base_url, captured) = spawn_upstream(
            StatusCode::OK,
            json!({ "choices": [{ "message": { "role": "assistant", "content": "Draft" } }] }),
        )
        .await;
        let client = OpenAiCompatibleClient::from_config(&config(base_url)).expect("client");

        client.complete(&prompt(PromptKind::Drafting, 0.2)).await.expect("reply");

        let requests = captured.lock().expect("capture lock");
        assert_eq!(requests[0]["model"], LlmProvider::Ollama.default_model());
    }

    #[tokio::test]
    async fn upstream_error_status_carries_provider_message() {
        let (base_url, _) = spawn_upstream(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": { "message": "model overloaded" } }),
        )
        .await;
        let client = OpenAiCompatibleClient::from_config(&config(base_url)).expect("client");

        let error = client
            .complete(&prompt(PromptKind::Negotiation, 0.7))
            .await
            .expect_err("upstream failure");

        match error {
            LlmError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "model overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_are_an_error() {
        let (base_url, _) = spawn_upstream(StatusCode::OK, json!({ "choices": [] })).await;
        let client = OpenAiCompatibleClient::from_config(&config(base_url)).expect("client");

        let error = client
            .complete(&prompt(PromptKind::Analysis, 0.3))
            .await
            .expect_err("no choices");

        assert!(matches!(error, LlmError::EmptyResponse));
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message(r#"{"error":"bad key"}"#), "bad key");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
        assert_eq!(error_message("  "), "no response body");
    }
}
