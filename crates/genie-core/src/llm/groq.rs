//! Groq provider (OpenAI-compatible API hosting Llama vision models).
//!
//! Groq uses the same Chat Completions format as OpenAI,
//! so this delegates to `OpenAiCompatProvider` with its own endpoint.

use super::openai_compat::OpenAiCompatProvider;
use super::provider::{InferenceProvider, InferenceRequest, InferenceResponse};
use crate::error::InferenceError;
use async_trait::async_trait;
use std::time::Duration;

/// Groq provider wrapping an OpenAI-compatible endpoint.
pub struct GroqProvider {
    inner: OpenAiCompatProvider,
}

impl GroqProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            inner: OpenAiCompatProvider::new("groq", endpoint, api_key, model, timeout),
        }
    }
}

#[async_trait]
impl InferenceProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn generate(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        self.inner.generate(request).await
    }

    fn timeout(&self) -> Duration {
        self.inner.timeout()
    }
}
