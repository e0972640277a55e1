//! Ollama Local Model Provider
//!
//! Talks to a locally-running Ollama server through `/api/chat`.
//! The requested context window is passed as `num_ctx`. Ollama truncates
//! oversized prompts silently, so a prompt that fills the whole window is
//! reported as a context overflow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{CompletionRequest, ModelInvoker, ProviderConfig};
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, StrataError};

const DEFAULT_API_BASE: &str = "http://localhost:11434";
const PROVIDER: &str = "ollama";

/// Ollama Local Model Provider
pub struct OllamaProvider {
    api_base: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_base = config
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let api_base = Self::validate_endpoint(&api_base)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StrataError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { api_base, client })
    }

    /// Only allow http/https and warn for non-local endpoints
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            StrataError::Config(format!("Invalid Ollama endpoint URL '{}': {}", endpoint, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(StrataError::Config(format!(
                "Ollama endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
        {
            warn!(
                "Ollama endpoint is not localhost: {}. Ensure this is intentional.",
                host
            );
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    fn build_request(request: &CompletionRequest<'_>) -> OllamaChatRequest {
        let mut messages = Vec::with_capacity(2);
        if !request.system_prompt.is_empty() {
            messages.push(OllamaMessage {
                role: "system".to_string(),
                content: request.system_prompt.to_string(),
            });
        }
        messages.push(OllamaMessage {
            role: "user".to_string(),
            content: request.user_prompt.to_string(),
        });

        OllamaChatRequest {
            model: request.model.to_string(),
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: request.options.temperature,
                num_predict: request.options.max_tokens,
                num_ctx: request.options.context_window,
            },
        }
    }
}

#[async_trait]
impl ModelInvoker for OllamaProvider {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let start_time = Instant::now();
        let body = Self::build_request(&request);
        let url = format!("{}/api/chat", self.api_base);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let message = if e.is_connect() {
                    format!(
                        "Failed to connect to Ollama at {}. Is Ollama running? Start with: ollama serve",
                        self.api_base
                    )
                } else if e.is_timeout() {
                    format!("Ollama request timed out: {}", e)
                } else {
                    format!("Ollama request failed: {}", e)
                };
                let category = if e.is_connect() || e.is_timeout() {
                    ErrorCategory::Network
                } else {
                    ErrorCategory::Unknown
                };
                StrataError::Llm(LlmError::with_provider(category, message, PROVIDER))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StrataError::Llm(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Ollama API error ({}): {}", status, text),
                PROVIDER,
            )));
        }

        let parsed: OllamaChatResponse = response.json().await.map_err(|e| {
            StrataError::Llm(LlmError::with_provider(
                ErrorCategory::ParseError,
                format!("Failed to decode Ollama response: {}", e),
                PROVIDER,
            ))
        })?;

        if let Some(error) = parsed.error {
            return Err(StrataError::Llm(ErrorClassifier::classify(&error, PROVIDER)));
        }

        let prompt_tokens = parsed.prompt_eval_count.unwrap_or(0);
        if prompt_tokens > 0 && prompt_tokens >= request.options.context_window {
            return Err(StrataError::Llm(LlmError::with_provider(
                ErrorCategory::ContextOverflow,
                format!(
                    "prompt filled the context window ({} >= {} tokens)",
                    prompt_tokens, request.options.context_window
                ),
                PROVIDER,
            )));
        }

        debug!(
            model = request.model,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            prompt_tokens,
            output_tokens = parsed.eval_count.unwrap_or(0),
            "Ollama completion finished"
        );

        Ok(parsed.message.map(|m| m.content).unwrap_or_default())
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
    num_ctx: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<OllamaMessage>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}
