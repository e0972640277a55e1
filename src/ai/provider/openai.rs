//! OpenAI-Compatible Provider
//!
//! Uses the Chat Completions API. Works against OpenAI and any server that
//! speaks the same protocol (vLLM, llama.cpp server, LM Studio). The context
//! window is fixed server-side, so it is not sent; overflow is detected from
//! the `context_length_exceeded` error the server returns.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{CompletionRequest, ModelInvoker, ProviderConfig};
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, StrataError};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "openai";

/// OpenAI-compatible provider with secure API key handling
pub struct OpenAiProvider {
    api_key: SecretString,
    api_base: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                StrataError::Config(
                    "OpenAI API key not found. Set OPENAI_API_KEY env var or llm.api_key in config"
                        .to_string(),
                )
            })?;

        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StrataError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            client,
        })
    }

    fn build_request(request: &CompletionRequest<'_>) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: request.system_prompt.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.user_prompt.to_string(),
        });

        ChatCompletionRequest {
            model: request.model.to_string(),
            messages,
            temperature: request.options.temperature,
            max_tokens: Some(request.options.max_tokens),
        }
    }
}

#[async_trait]
impl ModelInvoker for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let body = Self::build_request(&request);
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                StrataError::Llm(ErrorClassifier::classify(
                    &format!("OpenAI request failed: {}", e),
                    PROVIDER,
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StrataError::Llm(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("OpenAI API error ({}): {}", status, text),
                PROVIDER,
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            StrataError::Llm(LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Failed to decode OpenAI response: {}", e),
                PROVIDER,
            ))
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                model = request.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenAI completion finished"
            );
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                StrataError::Llm(LlmError::with_provider(
                    ErrorCategory::ParseError,
                    "No content in OpenAI response",
                    PROVIDER,
                ))
            })
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::GenerationOptions;

    #[test]
    fn test_api_base_normalized_and_key_hidden() {
        let config = ProviderConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            api_base: Some("http://localhost:8080/v1/".to_string()),
            ..Default::default()
        };
        let provider = OpenAiProvider::new(config).expect("provider");
        assert_eq!(provider.api_base, "http://localhost:8080/v1");
        assert!(!format!("{:?}", provider).contains("sk-test"));
    }

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest {
            model: "gpt-4o-mini",
            system_prompt: "sys",
            user_prompt: "user",
            options: GenerationOptions {
                temperature: 0.3,
                max_tokens: 300,
                context_window: 8_192,
            },
        };
        let body = serde_json::to_value(OpenAiProvider::build_request(&request)).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 300);
        assert!(body.get("num_ctx").is_none());
        assert_eq!(body["messages"][1]["content"], "user");
    }
}
