//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (`<config dir>/strata/`) and project (`.strata/`) level configuration.

use serde::{Deserialize, Serialize};

use crate::ai::provider::{GenerationOptions, ProviderConfig};
use crate::constants::{analysis, knowledge, network, quick_scan};
use crate::types::{Result, StrataError};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Model provider settings
    pub llm: LlmConfig,

    /// Model identity per tier
    pub models: ModelsConfig,

    /// Quick scan and file analysis settings
    pub analysis: AnalysisConfig,

    /// Knowledge document settings
    pub knowledge: KnowledgeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            llm: LlmConfig::default(),
            models: ModelsConfig::default(),
            analysis: AnalysisConfig::default(),
            knowledge: KnowledgeConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `StrataError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(StrataError::Config(format!(
                "LLM temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }

        if !(0.0..=2.0).contains(&self.analysis.ensemble_temperature) {
            return Err(StrataError::Config(format!(
                "Ensemble temperature must be between 0.0 and 2.0, got {}",
                self.analysis.ensemble_temperature
            )));
        }

        if self.llm.timeout_secs == 0 {
            return Err(StrataError::Config(
                "LLM timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.analysis.single_shot_timeout_secs == 0 {
            return Err(StrataError::Config(
                "analysis.single_shot_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.analysis.workers == 0 {
            return Err(StrataError::Config(
                "analysis.workers must be greater than 0".to_string(),
            ));
        }

        if self.analysis.ensemble_size == 0 {
            return Err(StrataError::Config(
                "analysis.ensemble_size must be greater than 0".to_string(),
            ));
        }

        let windows = &self.knowledge.context_windows;
        if windows.is_empty() {
            return Err(StrataError::Config(
                "knowledge.context_windows must list at least one size".to_string(),
            ));
        }
        if windows.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(StrataError::Config(format!(
                "knowledge.context_windows must be strictly ascending, got {:?}",
                windows
            )));
        }

        Ok(())
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            provider: self.llm.provider.clone(),
            timeout_secs: self.llm.timeout_secs,
            api_key: self.llm.api_key.clone(),
            api_base: self.llm.api_base.clone(),
        }
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
            context_window: self.llm.context_window,
        }
    }
}

// =============================================================================
// LLM Configuration
// =============================================================================

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "ollama" or "openai"
    pub provider: String,

    /// Override the provider's default endpoint
    pub api_base: Option<String>,

    /// API key (OpenAI also reads OPENAI_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Temperature for single-answer calls
    pub temperature: f32,

    /// Token budget for file analysis and single-shot calls. Knowledge
    /// documents use at least 4096; quick-scan answers are capped at 512.
    pub max_tokens: u32,

    /// Context window for analysis calls. Knowledge documents use
    /// `knowledge.context_windows` instead.
    pub context_window: u32,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("context_window", &self.context_window)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        let options = GenerationOptions::default();
        Self {
            provider: "ollama".to_string(),
            api_base: None,
            api_key: None,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            context_window: network::DEFAULT_CONTEXT_WINDOW,
        }
    }
}

// =============================================================================
// Model Configuration
// =============================================================================

/// Model identity for each tier: fast for quick, larger for deep
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub quick: String,
    pub detailed: String,
    pub deep: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            quick: "llama3.2:3b".to_string(),
            detailed: "qwen2.5-coder:7b".to_string(),
            deep: "qwen2.5-coder:32b".to_string(),
        }
    }
}

// =============================================================================
// Analysis Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Worker count for per-file analysis
    pub workers: usize,

    /// Maximum file size in bytes
    pub max_file_size: u64,

    /// Characters of file content sent to the model
    pub max_file_chars: usize,

    /// Parallel quick-scan calls
    pub ensemble_size: usize,

    pub ensemble_temperature: f32,

    /// Extra glob patterns to exclude
    pub exclude: Vec<String>,

    /// Deadline for `strata explain`
    pub single_shot_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            workers: analysis::DEFAULT_WORKERS,
            max_file_size: analysis::MAX_FILE_SIZE,
            max_file_chars: analysis::MAX_FILE_CHARS,
            ensemble_size: quick_scan::ENSEMBLE_SIZE,
            ensemble_temperature: quick_scan::ENSEMBLE_TEMPERATURE,
            exclude: Vec::new(),
            single_shot_timeout_secs: analysis::SINGLE_SHOT_TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Knowledge Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Context-window sizes tried in order on overflow
    pub context_windows: Vec<u32>,

    /// Characters of each phase-1 document quoted in phase-2 prompts
    pub excerpt_chars: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            context_windows: knowledge::CONTEXT_WINDOWS.to_vec(),
            excerpt_chars: knowledge::EXCERPT_CHARS,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.llm.provider, "ollama");
        assert_eq!(config.analysis.workers, 4);
        assert_eq!(config.analysis.ensemble_size, 10);
        assert_eq!(config.analysis.max_file_size, 100 * 1024);
        assert_eq!(config.knowledge.context_windows, vec![8_192, 16_384, 32_768]);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.llm.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.workers = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.ensemble_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_escalation_ladder() {
        let mut config = Config::default();
        config.knowledge.context_windows = vec![];
        assert!(config.validate().is_err());

        config.knowledge.context_windows = vec![16_384, 8_192];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ascending"));

        config.knowledge.context_windows = vec![4_096];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.llm.api_key = Some("sk-secret".to_string());

        let toml = toml::to_string(&config).unwrap();
        assert!(!toml.contains("sk-secret"));
        assert!(!format!("{:?}", config).contains("sk-secret"));
        assert_eq!(config.provider_config().api_key.as_deref(), Some("sk-secret"));
    }
}
