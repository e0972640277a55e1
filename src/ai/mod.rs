//! AI Integration Layer
//!
//! Model invocation, response text handling and timeouts.

pub mod prompt;
pub mod provider;
pub mod response;
pub mod timeout;

pub use prompt::PromptBuilder;
pub use provider::{
    CompletionRequest, GenerationOptions, ModelContext, ModelInvoker, OllamaProvider,
    OpenAiProvider, ProviderConfig, SharedInvoker, create_invoker,
};
pub use response::{KeyValueBlock, strip_code_fences, truncate_chars};
pub use timeout::with_timeout;
