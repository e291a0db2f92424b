//! Chat-completion client abstraction
//!
//! Participants share one injected [`ChatClient`]. [`OpenAiClient`] talks to any
//! `OpenAI`-compatible endpoint; [`LoggingClient`] wraps another client and
//! records latency and token usage.

mod error;
mod openai;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use openai::{OpenAiClient, DEFAULT_BASE_URL};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// History plus system prompt in, assistant output out
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn generate(&self, request: &ChatRequest) -> Result<Generation, LlmError>;

    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ChatClient + ?Sized> ChatClient for Arc<T> {
    async fn generate(&self, request: &ChatRequest) -> Result<Generation, LlmError> {
        (**self).generate(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for chat clients
pub struct LoggingClient {
    inner: Arc<dyn ChatClient>,
    model_id: String,
}

impl LoggingClient {
    pub fn new(inner: Arc<dyn ChatClient>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ChatClient for LoggingClient {
    async fn generate(&self, request: &ChatRequest) -> Result<Generation, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(generation) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = generation.usage.input_tokens,
                    output_tokens = generation.usage.output_tokens,
                    function_calls = generation.function_calls.len(),
                    "Chat completion finished"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Chat completion failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
