//! OpenAI chat-completions provider.
//!
//! Both operations send the query as a single user message. The blocking path
//! folds every outcome into a [`Completion`]; the streaming path hands back a
//! [`FragmentStream`] and lets transport failures reach the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::openai;
use super::stream::{FragmentStream, fragment_stream, single_fragment};
use crate::core::types::missing_credential_message;
use crate::core::{
    ApiKey, Completion, CompletionProvider, Credential, HttpClient, HttpClientConfig, LlmError,
    Message,
};

/// Provider configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// `None` when no key could be resolved; every request then reports it.
    pub credential: Option<Credential>,
    pub base_url: String,
    pub model: String,
    pub http_config: HttpClientConfig,
}

impl OpenAiConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            credential: api_key.resolve(),
            base_url: openai::API_BASE.to_string(),
            model: openai::DEFAULT_MODEL.to_string(),
            http_config: HttpClientConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = config;
        self
    }

    fn url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            openai::CHAT_COMPLETIONS_ENDPOINT
        )
    }
}

/// Request body for `/chat/completions`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl CompletionRequest {
    pub fn for_query(model: &str, query: &str, stream: bool) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![Message::user(query)],
            stream,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub struct OpenAiClient {
    config: OpenAiConfig,
    http: HttpClient,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let http = HttpClient::new(config.http_config.clone(), None)?;
        Ok(Self { config, http })
    }

    fn headers(credential: &Credential) -> Vec<(String, String)> {
        vec![("Authorization".to_string(), credential.bearer())]
    }

    #[tracing::instrument(name = "chat", skip(self, query), fields(model = %self.config.model))]
    async fn complete(&self, query: &str) -> Completion {
        let Some(credential) = &self.config.credential else {
            tracing::warn!("Completion requested without an API key");
            return Completion::MissingCredential;
        };

        let request = CompletionRequest::for_query(&self.config.model, query, false);
        let raw = match self
            .http
            .post_json(&self.config.url(), &Self::headers(credential), &request)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                return Completion::Transport {
                    message: error_chain(&e),
                };
            }
        };

        interpret_response(raw.status.as_u16(), &raw.body)
    }

    #[tracing::instrument(name = "chat_stream", skip(self, query), fields(model = %self.config.model), err)]
    async fn open_stream(&self, query: &str) -> Result<FragmentStream, LlmError> {
        let Some(credential) = &self.config.credential else {
            tracing::warn!("Streaming completion requested without an API key");
            return Ok(single_fragment(missing_credential_message()));
        };

        let request = CompletionRequest::for_query(&self.config.model, query, true);
        let res = self
            .http
            .post_stream(&self.config.url(), &Self::headers(credential), &request)
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res
                .text()
                .await
                .map_err(|e| LlmError::network("Failed to read error body", e))?;
            let message = match serde_json::from_str::<Value>(&body) {
                Ok(value) => provider_error_message(&value),
                Err(_) => body,
            };
            return Err(LlmError::Api {
                message,
                status_code: Some(status.as_u16()),
                source: None,
            });
        }

        Ok(fragment_stream(res.bytes_stream()))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn chat(&self, query: &str) -> Completion {
        self.complete(query).await
    }

    async fn chat_stream(&self, query: &str) -> Result<FragmentStream, LlmError> {
        self.open_stream(query).await
    }
}

/// Classifies a blocking response body.
pub fn interpret_response(status: u16, body: &str) -> Completion {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(status, error = %e, "Response body is not JSON");
            return Completion::Decode {
                body: body.to_string(),
            };
        }
    };

    if status >= 400 || has_error_field(&value) {
        tracing::warn!(status, "Provider reported an error");
        return Completion::Provider {
            message: provider_error_message(&value),
        };
    }

    if value.get("choices").is_none() {
        return Completion::Shape { body: value };
    }

    match serde_json::from_value::<CompletionResponse>(value.clone()) {
        Ok(CompletionResponse { choices }) => match choices.into_iter().next() {
            Some(Choice {
                message: ChoiceMessage {
                    content: Some(text),
                },
            }) => Completion::Answer {
                text,
                references: Vec::new(),
            },
            _ => Completion::Shape { body: value },
        },
        Err(e) => {
            tracing::debug!(error = %e, "Response has choices but an unexpected layout");
            Completion::Shape { body: value }
        }
    }
}

fn has_error_field(value: &Value) -> bool {
    value.get("error").is_some_and(|e| !e.is_null())
}

/// The provider's own message where there is one, otherwise the raw error
/// object, otherwise the whole body.
fn provider_error_message(value: &Value) -> String {
    match value.get("error") {
        Some(Value::Object(error)) => match error.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => Value::Object(error.clone()).to_string(),
        },
        Some(Value::String(message)) => message.clone(),
        Some(other) if !other.is_null() => other.to_string(),
        _ => value.to_string(),
    }
}

/// Flattens an error and its causes into one line for display.
fn error_chain(error: &LlmError) -> String {
    let mut message = match error {
        LlmError::Network { message, .. } => message.clone(),
        other => other.to_string(),
    };
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
