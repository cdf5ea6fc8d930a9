//! xAI Grok provider (OpenAI-compatible API).

use super::openai_compat::OpenAiCompatProvider;
use super::provider::{InferenceProvider, InferenceRequest, InferenceResponse};
use crate::error::InferenceError;
use async_trait::async_trait;
use std::time::Duration;

/// Grok provider wrapping the xAI Chat Completions endpoint.
pub struct GrokProvider {
    inner: OpenAiCompatProvider,
}

impl GrokProvider {
    pub fn new(endpoint: &str, api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            inner: OpenAiCompatProvider::new("grok", endpoint, api_key, model, timeout),
        }
    }
}

#[async_trait]
impl InferenceProvider for GrokProvider {
    fn name(&self) -> &str {
        "grok"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grok_reports_own_name_and_model() {
        let provider = GrokProvider::new(
            "https://api.x.ai/v1",
            "xai-key",
            "grok-2-vision-1212",
            Duration::from_secs(45),
        );
        assert_eq!(provider.name(), "grok");
        assert_eq!(provider.model(), "grok-2-vision-1212");
        assert_eq!(provider.timeout(), Duration::from_secs(45));
    }
}
