//! Inference provider trait and request/response types.
//!
//! Defines the interface that all providers implement, plus the factory that
//! turns the configured `[[providers]]` chain into live provider objects.

use crate::config::{Config, InferenceConfig, ProviderConfig, ProviderKind};
use crate::error::InferenceError;
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

/// Base64-encoded image ready to send to an inference API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes and format string.
    ///
    /// The format is the image format identifier (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A single prompt (plus optional photo) sent to one provider.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Text prompt for the model
    pub prompt: String,
    /// Optional photo to send alongside the prompt
    pub image: Option<ImageInput>,
    /// Ask the provider for JSON output where the API supports it
    pub expect_json: bool,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl InferenceRequest {
    /// Build a request using the configured sampling settings.
    pub fn new(
        prompt: impl Into<String>,
        image: Option<ImageInput>,
        expect_json: bool,
        config: &InferenceConfig,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            image,
            expect_json,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// The raw answer from one provider call.
#[derive(Debug, Clone)]
pub struct InferenceResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all inference providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the client holds a `Vec<Box<dyn InferenceProvider>>`).
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini", "groq").
    fn name(&self) -> &str;

    /// Model this provider instance talks to.
    fn model(&self) -> &str;

    /// Send one request and return the raw text answer.
    async fn generate(&self, request: &InferenceRequest)
        -> Result<InferenceResponse, InferenceError>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates providers from `[[providers]]` entries.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create one provider from its config entry.
    ///
    /// Fails when the API key cannot be resolved.
    pub fn create(
        provider: &ProviderConfig,
        inference: &InferenceConfig,
    ) -> Result<Box<dyn InferenceProvider>, InferenceError> {
        let api_key =
            resolve_env_var(&provider.api_key).ok_or_else(|| InferenceError::Provider {
                provider: provider.kind.to_string(),
                message: format!(
                    "{} API key not set. Set {} env var.",
                    provider.kind.label(),
                    provider.kind.env_var()
                ),
                status_code: None,
            })?;
        let timeout = Duration::from_millis(inference.timeout_ms);
        let endpoint = provider.effective_endpoint();

        let created: Box<dyn InferenceProvider> = match provider.kind {
            ProviderKind::Gemini => Box::new(super::gemini::GeminiProvider::new(
                endpoint,
                provider.api_version.as_deref().unwrap_or("v1beta"),
                &api_key,
                &provider.model,
                timeout,
            )),
            ProviderKind::Groq => Box::new(super::groq::GroqProvider::new(
                endpoint,
                &api_key,
                &provider.model,
                timeout,
            )),
            ProviderKind::Grok => Box::new(super::grok::GrokProvider::new(
                endpoint,
                &api_key,
                &provider.model,
                timeout,
            )),
        };
        Ok(created)
    }

    /// Build the whole fallback chain, skipping disabled entries and entries
    /// without credentials.
    ///
    /// Returns `NoProviders` if nothing usable remains.
    pub fn create_chain(
        config: &Config,
    ) -> Result<Vec<Box<dyn InferenceProvider>>, InferenceError> {
        let mut chain = Vec::new();
        let mut skipped = Vec::new();

        for entry in config.enabled_providers() {
            match Self::create(entry, &config.inference) {
                Ok(provider) => {
                    tracing::debug!(
                        "Fallback chain #{}: {} ({})",
                        chain.len() + 1,
                        provider.name(),
                        provider.model()
                    );
                    chain.push(provider);
                }
                Err(e) => {
                    tracing::warn!("Skipping provider {}: {e}", entry.kind);
                    skipped.push(e.to_string());
                }
            }
        }

        if chain.is_empty() {
            let reason = if skipped.is_empty() {
                "every provider is disabled".to_string()
            } else {
                skipped.join("; ")
            };
            return Err(InferenceError::NoProviders(reason));
        }
        Ok(chain)
    }
}
