//! Unified Error Type System
//!
//! Centralized error types for the analysis pipeline.
//!
//! ## Taxonomy
//!
//! - **Infrastructure**: cannot enumerate files, cannot read/write the cache or
//!   configuration. Fatal for the active tier.
//! - **Model**: a single model call failed. Recorded per unit of work; the tier
//!   continues unless the unit is a knowledge document.
//! - **ContextOverflow**: a model error category that triggers the escalating
//!   context-window retry before surfacing as a plain model error.
//! - **Aggregation**: the quick-scan ensemble produced nothing usable.
//!
//! Malformed model output is not an error here: parsers substitute defaults and
//! flag the record instead.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Classification of a model-call failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Prompt plus output exceeded the model's context window
    ContextOverflow,
    /// Rate limited by the provider
    RateLimit,
    /// Authentication failed
    Auth,
    /// Connectivity issues
    Network,
    /// Provider or model unavailable
    Unavailable,
    /// Invalid request
    BadRequest,
    /// Provider response could not be decoded
    ParseError,
    /// Temporary server-side issue
    Transient,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ContextOverflow => write!(f, "CONTEXT_OVERFLOW"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Model-call error with category and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    pub fn is_context_overflow(&self) -> bool {
        self.category == ErrorCategory::ContextOverflow
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps raw provider failures to categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();

        if lower.contains("context length")
            || lower.contains("context window")
            || lower.contains("context_length_exceeded")
            || lower.contains("maximum context")
            || lower.contains("too many tokens")
            || (lower.contains("token")
                && (lower.contains("limit") || lower.contains("exceed")))
        {
            return LlmError::with_provider(ErrorCategory::ContextOverflow, message, provider);
        }

        if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
        {
            return LlmError::with_provider(ErrorCategory::RateLimit, message, provider);
        }

        if lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
        {
            return LlmError::with_provider(ErrorCategory::Auth, message, provider);
        }

        if lower.contains("connection")
            || lower.contains("connect")
            || lower.contains("dns")
            || lower.contains("timed out")
            || lower.contains("timeout")
        {
            return LlmError::with_provider(ErrorCategory::Network, message, provider);
        }

        if lower.contains("503")
            || lower.contains("502")
            || lower.contains("service unavailable")
            || lower.contains("model not found")
            || lower.contains("not found")
        {
            return LlmError::with_provider(ErrorCategory::Unavailable, message, provider);
        }

        if lower.contains("400") || lower.contains("bad request") || lower.contains("invalid") {
            return LlmError::with_provider(ErrorCategory::BadRequest, message, provider);
        }

        if lower.contains("overloaded") || lower.contains("temporary") || lower.contains("500") {
            return LlmError::with_provider(ErrorCategory::Transient, message, provider);
        }

        LlmError::with_provider(ErrorCategory::Unknown, message, provider)
    }

    /// Classify an HTTP status, falling back to the body text for 400s
    /// since providers report context overflow as a bad request.
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        match status {
            400 | 413 => {
                let classified = Self::classify(message, provider);
                if classified.is_context_overflow() {
                    classified
                } else {
                    LlmError::with_provider(ErrorCategory::BadRequest, message, provider)
                }
            }
            429 => LlmError::with_provider(ErrorCategory::RateLimit, message, provider),
            401 | 403 => LlmError::with_provider(ErrorCategory::Auth, message, provider),
            404 => LlmError::with_provider(ErrorCategory::Unavailable, message, provider),
            500 | 502 | 503 | 504 => {
                LlmError::with_provider(ErrorCategory::Transient, message, provider)
            }
            _ => Self::classify(message, provider),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // Infrastructure Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot enumerate project files: {0}")]
    Enumeration(String),

    #[error("Cache error at {}: {message}", path.display())]
    Cache { path: PathBuf, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not initialized: run 'strata init' first")]
    NotInitialized,

    // -------------------------------------------------------------------------
    // Model Errors
    // -------------------------------------------------------------------------
    #[error("Model error: {0}")]
    Llm(LlmError),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    #[error("Knowledge generation failed for {tier}/{document}: {source}")]
    Knowledge {
        tier: String,
        document: String,
        #[source]
        source: Box<StrataError>,
    },

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

impl From<LlmError> for StrataError {
    fn from(err: LlmError) -> Self {
        StrataError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, StrataError>;

impl StrataError {
    /// Create an LLM error from a message with unknown category
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(LlmError::new(ErrorCategory::Unknown, message))
    }

    /// Create an LLM error with category
    pub fn llm_with_category(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Llm(LlmError::new(category, message))
    }

    pub fn cache(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Cache {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    pub fn knowledge(
        tier: impl Into<String>,
        document: impl Into<String>,
        source: StrataError,
    ) -> Self {
        Self::Knowledge {
            tier: tier.into(),
            document: document.into(),
            source: Box::new(source),
        }
    }

    /// Fatal for the active tier
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Json(_)
                | Self::Enumeration(_)
                | Self::Cache { .. }
                | Self::Config(_)
                | Self::NotInitialized
        )
    }

    /// A single model call failed (including overflow)
    pub fn is_model_error(&self) -> bool {
        matches!(self, Self::Llm(_))
    }

    pub fn is_context_overflow(&self) -> bool {
        matches!(self, Self::Llm(e) if e.is_context_overflow())
    }
}

// =============================================================================
// Tests
// =============================================================================
