//! Model Invocation
//!
//! Defines the `ModelInvoker` trait: a single "send prompt, get text" call
//! parameterized by model identity and generation options.
//!
//! Pipelines never reach for ambient client state. Each pipeline instance is
//! handed a `ModelContext` (invoker + model + options) and clones it into its
//! workers, so concurrent calls share nothing mutable.

mod ollama;
mod openai;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::network as net_constants;
use crate::types::{Result, StrataError};

// =============================================================================
// Generation Options
// =============================================================================

/// Per-call generation options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Context window requested from the model
    pub context_window: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 2048,
            context_window: net_constants::DEFAULT_CONTEXT_WINDOW,
        }
    }
}

/// A single completion request
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub options: GenerationOptions,
}

// =============================================================================
// Model Invoker Trait
// =============================================================================

/// Blocking-style completion call against a language model
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Send the prompts and return the raw response text
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Shared invoker handle for concurrent pipeline stages.
pub type SharedInvoker = Arc<dyn ModelInvoker>;

// =============================================================================
// Invocation Context
// =============================================================================

/// Explicit invocation context: which invoker, which model, which options
#[derive(Clone)]
pub struct ModelContext {
    invoker: SharedInvoker,
    model: String,
    options: GenerationOptions,
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("provider", &self.invoker.name())
            .field("model", &self.model)
            .field("options", &self.options)
            .finish()
    }
}

impl ModelContext {
    pub fn new(
        invoker: SharedInvoker,
        model: impl Into<String>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            invoker,
            model: model.into(),
            options,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn options(&self) -> GenerationOptions {
        self.options
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = max_tokens;
        self
    }

    /// Complete with this context's options
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.complete_with(system_prompt, user_prompt, self.options)
            .await
    }

    /// Complete with explicit options (used by context-window escalation)
    pub async fn complete_with(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: GenerationOptions,
    ) -> Result<String> {
        tracing::debug!(
            provider = self.invoker.name(),
            model = %self.model,
            context_window = options.context_window,
            "Invoking model"
        );
        self.invoker
            .complete(CompletionRequest {
                model: &self.model,
                system_prompt,
                user_prompt,
                options,
            })
            .await
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for model providers
///
/// API keys are never serialized and are redacted in debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type: "ollama", "openai"
    pub provider: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
            api_key: None,
            api_base: None,
        }
    }
}

/// Create a shared invoker from configuration
pub fn create_invoker(config: &ProviderConfig) -> Result<SharedInvoker> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        _ => Err(StrataError::Config(format!(
            "Unknown provider: {}. Supported: ollama, openai",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedInvoker;

    #[test]
    fn test_provider_config_redacts_key() {
        let config = ProviderConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let config = ProviderConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_invoker(&config),
            Err(StrataError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_context_passes_model_and_options() {
        let invoker = ScriptedInvoker::new(|call| {
            Ok(format!("{}@{}", call.model, call.options.context_window))
        });
        let ctx = ModelContext::new(invoker.shared(), "coder:7b", GenerationOptions::default())
            .with_temperature(0.0);

        let text = ctx.complete("sys", "user").await.unwrap();
        assert_eq!(text, "coder:7b@8192");

        let wider = GenerationOptions {
            context_window: 32_768,
            ..ctx.options()
        };
        let text = ctx.complete_with("sys", "user", wider).await.unwrap();
        assert_eq!(text, "coder:7b@32768");

        let calls = invoker.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].options.temperature, 0.0);
    }
}
