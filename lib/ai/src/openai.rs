//! OpenAI chat-completions backend.
//!
//! Serves every provider handle in the roster: OpenAI itself, any
//! OpenAI-compatible gateway, and Ollama's `/v1` endpoint. Structured output
//! is requested through the `json_schema` response format.

use crate::backend::{LlmBackend, LlmBackendConfig, LlmProvider, LlmRequest, LlmResponse, TokenUsage};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP backend for OpenAI-compatible chat-completion APIs.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    config: LlmBackendConfig,
    endpoint: String,
    client: Client,
}

impl OpenAiBackend {
    /// Creates a backend. `timeout` bounds each outbound call.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::InvalidConfig` if the model or base URL is
    /// missing, the provider needs an API key that is not set, or the HTTP
    /// client cannot be built.
    pub fn new(config: LlmBackendConfig, timeout: Duration) -> Result<Self, LlmError> {
        if config.model.trim().is_empty() {
            return Err(LlmError::InvalidConfig {
                reason: "model identifier is empty".to_string(),
            });
        }

        let base_url = config
            .resolved_base_url()
            .ok_or_else(|| LlmError::InvalidConfig {
                reason: format!("provider '{}' needs a base_url", config.provider),
            })?;

        if config.provider.requires_api_key()
            && config.api_key.as_deref().is_none_or(|key| key.is_empty())
        {
            return Err(LlmError::InvalidConfig {
                reason: format!("provider '{}' needs an api_key", config.provider),
            });
        }

        let endpoint = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    /// Returns the chat-completions URL this backend posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = chat_request_body(&self.config.model, request);

        debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            endpoint = %self.endpoint,
            "Sending chat completion request"
        );

        let mut http_request = self.client.post(&self.endpoint).json(&body);
        if let Some(api_key) = self.config.api_key.as_deref()
            && !api_key.is_empty()
        {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else if e.is_connect() {
                LlmError::ProviderUnavailable {
                    provider: self.config.provider.to_string(),
                    reason: e.to_string(),
                }
            } else {
                LlmError::RequestFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok());
            return Err(LlmError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                provider = %self.config.provider,
                model = %self.config.model,
                status = %status,
                body = %body,
                "Chat completion endpoint returned error"
            );
            return Err(LlmError::RequestFailed {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::ResponseParseFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        parse_completion(completion, request.output_schema.is_some())
    }

    fn provider(&self) -> LlmProvider {
        self.config.provider
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Builds the chat-completions request body.
fn chat_request_body(model: &str, request: &LlmRequest) -> JsonValue {
    let mut body = serde_json::json!({
        "model": model,
        "messages": request.messages(),
    });

    if let Some(schema) = &request.output_schema {
        body["response_format"] = serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": false,
            },
        });
    }

    body
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// Converts a completion into a response. When structured output was
/// requested the content is parsed as JSON; unparseable content leaves
/// `structured_output` empty for the caller to reject.
fn parse_completion(completion: ChatCompletion, structured: bool) -> Result<LlmResponse, LlmError> {
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| LlmError::ResponseParseFailed {
            reason: "completion has no message content".to_string(),
        })?;

    let structured_output = if structured {
        serde_json::from_str(strip_code_fence(&content)).ok()
    } else {
        None
    };

    let usage = completion
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        structured_output,
        usage,
        model: completion.model,
    })
}

/// Strips a surrounding markdown code fence, which some models add even in
/// JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::OutputSchema;

    fn completion(content: Option<&str>) -> ChatCompletion {
        serde_json::from_value(serde_json::json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        }))
        .expect("completion")
    }

    #[test]
    fn request_body_carries_json_schema_format() {
        let request = LlmRequest::new("Extract medications")
            .with_system("You are a clinical scribe.")
            .with_output_schema(OutputSchema::new(
                "medication",
                serde_json::json!({"type": "object"}),
            ));

        let body = chat_request_body("gpt-3.5-turbo", &request);
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Extract medications");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "medication");
    }

    #[test]
    fn plain_request_has_no_response_format() {
        let body = chat_request_body("llama3", &LlmRequest::new("hi"));
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn parse_completion_reads_structured_output() {
        let response =
            parse_completion(completion(Some(r#"{"medications": []}"#)), true).expect("parse");
        assert_eq!(
            response.structured_output,
            Some(serde_json::json!({"medications": []}))
        );
        assert_eq!(response.usage.total(), 19);
        assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
    }

    #[test]
    fn parse_completion_strips_code_fence() {
        let fenced = "```json\n{\"intent\": [\"Medication\"]}\n```";
        let response = parse_completion(completion(Some(fenced)), true).expect("parse");
        assert_eq!(
            response.structured_output,
            Some(serde_json::json!({"intent": ["Medication"]}))
        );
    }

    #[test]
    fn parse_completion_leaves_non_json_unstructured() {
        let response = parse_completion(completion(Some("I cannot help")), true).expect("parse");
        assert!(response.structured_output.is_none());
        assert_eq!(response.content, "I cannot help");
    }

    #[test]
    fn parse_completion_rejects_empty_content() {
        let err = parse_completion(completion(None), true).expect_err("no content");
        assert!(matches!(err, LlmError::ResponseParseFailed { .. }));
    }

    #[test]
    fn endpoint_is_derived_from_base_url() {
        let backend = OpenAiBackend::new(
            LlmBackendConfig::ollama("http://localhost:11434/", "llama3.1"),
            Duration::from_secs(5),
        )
        .expect("backend");
        assert_eq!(backend.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(backend.provider(), LlmProvider::Ollama);
    }

    #[test]
    fn new_rejects_empty_model() {
        let err = OpenAiBackend::new(
            LlmBackendConfig::ollama("http://localhost:11434", " "),
            Duration::from_secs(5),
        )
        .expect_err("empty model");
        assert!(matches!(err, LlmError::InvalidConfig { .. }));
    }
}
