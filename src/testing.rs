//! Test doubles shared by the pipeline tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::ai::provider::{CompletionRequest, GenerationOptions, ModelInvoker, SharedInvoker};
use crate::types::Result;

/// One call seen by [`ScriptedInvoker`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub options: GenerationOptions,
}

type Script = dyn Fn(&RecordedCall) -> Result<String> + Send + Sync;

/// Invoker whose responses come from a closure; records every call
pub struct ScriptedInvoker {
    script: Box<Script>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedInvoker {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&RecordedCall) -> Result<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Always answer with the same text
    pub fn constant(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    pub fn shared(self: &Arc<Self>) -> SharedInvoker {
        self.clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelInvoker for ScriptedInvoker {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let call = RecordedCall {
            model: request.model.to_string(),
            system_prompt: request.system_prompt.to_string(),
            user_prompt: request.user_prompt.to_string(),
            options: request.options,
        };
        self.calls.lock().unwrap().push(call.clone());
        // Let other tasks interleave like a real network call would.
        tokio::task::yield_now().await;
        (self.script)(&call)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
