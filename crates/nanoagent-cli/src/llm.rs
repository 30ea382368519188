//! OpenAI-compatible chat-completions client.
//!
//! Sends each prompt as a single user message and returns the text of the
//! first choice.  Works against any endpoint speaking the OpenAI wire
//! format (Groq, OpenAI, Ollama, vLLM, ...).

use std::time::Duration;

use async_trait::async_trait;
use nanoagent_core::{AgentError, LanguageModel, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::config::LlmConfig;

/// [`LanguageModel`] backed by a `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompatModel {
    config: LlmConfig,
    http: reqwest::Client,
}

impl OpenAiCompatModel {
    /// Create a client for the given settings.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { config, http })
    }

    /// The JSON body for one prompt.
    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("invalid authorization header: {e}"),
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = self.request_body(prompt);

        tracing::debug!(url = %url, model = %self.config.model, "sending LLM request");

        let resp = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(AgentError::LlmRequestFailed {
                reason: format!("API returned {status}: {text}"),
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| AgentError::LlmRequestFailed {
            reason: format!("invalid JSON response: {e}"),
        })?;

        parse_chat_response(&v)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
pub fn parse_chat_response(v: &Value) -> Result<String> {
    let message = &v["choices"][0]["message"];

    if message.is_null() {
        return Err(AgentError::LlmRequestFailed {
            reason: "missing `choices[0].message` in response".into(),
        });
    }

    match &message["content"] {
        Value::String(content) => Ok(content.clone()),
        Value::Null => Ok(String::new()),
        other => Err(AgentError::LlmRequestFailed {
            reason: format!("unexpected `content` in response: {other}"),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let v = json!({
            "id": "chatcmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "hello" } },
                { "index": 1, "message": { "role": "assistant", "content": "ignored" } }
            ]
        });
        assert_eq!(parse_chat_response(&v).unwrap(), "hello");
    }

    #[test]
    fn null_content_is_empty() {
        let v = json!({ "choices": [{ "message": { "role": "assistant", "content": null } }] });
        assert_eq!(parse_chat_response(&v).unwrap(), "");
    }

    #[test]
    fn missing_message_is_an_error() {
        let err = parse_chat_response(&json!({ "error": { "message": "rate limited" } }))
            .unwrap_err();
        assert!(matches!(err, AgentError::LlmRequestFailed { .. }));
        assert!(err.to_string().contains("choices[0].message"));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = LlmConfig {
            api_key: "sk-live-123".into(),
            ..LlmConfig::default()
        };
        let model = OpenAiCompatModel::new(config).unwrap();
        let rendered = format!("{model:?}");
        assert!(!rendered.contains("sk-live-123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn request_body_carries_prompt_and_sampling() {
        let model = OpenAiCompatModel::new(LlmConfig::default()).unwrap();
        let body = model.request_body("what is 2 + 3?");

        assert_eq!(body["model"], "qwen-2.5-32b");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "what is 2 + 3?");
        assert_eq!(body["max_tokens"], 2048);
    }
}
