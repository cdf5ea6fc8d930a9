//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Retry, timeout and sampling settings for the inference client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Maximum calls to one provider while it keeps answering "rate limited"
    pub max_attempts: u32,

    /// Base backoff delay in milliseconds (doubles per retry, plus jitter)
    pub retry_base_delay_ms: u64,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Memoize identical text-only queries for the lifetime of the process
    pub cache_text_queries: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            timeout_ms: 60_000,
            max_tokens: 2048,
            temperature: 0.4,
            cache_text_queries: true,
        }
    }
}

/// Photo preparation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoConfig {
    /// Downscale photos larger than `max_dimension` before upload
    pub downscale: bool,

    /// Longest edge in pixels after downscaling
    pub max_dimension: u32,

    /// JPEG quality used when a downscaled photo is re-encoded (1-100)
    pub jpeg_quality: u8,
}

impl Default for PhotoConfig {
    fn default() -> Self {
        Self {
            downscale: true,
            max_dimension: 1024,
            jpeg_quality: 85,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// The wire shape a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini `generateContent`
    Gemini,
    /// Groq (OpenAI-compatible chat completions)
    Groq,
    /// xAI Grok (OpenAI-compatible chat completions)
    Grok,
}

impl ProviderKind {
    /// Default API base URL.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::Grok => "https://api.x.ai/v1",
        }
    }

    /// Environment variable conventionally holding the API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::Grok => "XAI_API_KEY",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Groq => "Groq",
            ProviderKind::Grok => "Grok",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::Groq => write!(f, "groq"),
            ProviderKind::Grok => write!(f, "grok"),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// One entry in the fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which API shape to speak
    pub kind: ProviderKind,

    /// Model identifier
    pub model: String,

    /// API base URL (defaults per kind)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API version path segment (Gemini only, defaults to "v1beta")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Whether this entry takes part in the chain
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl ProviderConfig {
    /// Build an entry with the conventional `${ENV_VAR}` key reference.
    pub fn new(kind: ProviderKind, model: &str) -> Self {
        Self {
            kind,
            model: model.to_string(),
            endpoint: None,
            api_version: None,
            api_key: format!("${{{}}}", kind.env_var()),
            enabled: true,
        }
    }

    /// The Gemini → Groq → Grok chain used when no config file exists.
    pub fn default_chain() -> Vec<Self> {
        vec![
            Self::new(ProviderKind::Gemini, "gemini-2.5-flash"),
            Self::new(
                ProviderKind::Groq,
                "meta-llama/llama-4-scout-17b-16e-instruct",
            ),
            Self::new(ProviderKind::Grok, "grok-2-vision-1212"),
        ]
    }

    /// Endpoint with the per-kind default applied.
    pub fn effective_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.kind.default_endpoint())
    }

    /// Whether the key is written inline rather than referenced from the environment.
    pub fn has_literal_key(&self) -> bool {
        !self.api_key.is_empty() && !self.api_key.starts_with("${")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_new_uses_env_reference() {
        let cfg = ProviderConfig::new(ProviderKind::Groq, "llama");
        assert_eq!(cfg.api_key, "${GROQ_API_KEY}");
        assert!(!cfg.has_literal_key());
        assert_eq!(cfg.effective_endpoint(), "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_endpoint_override() {
        let mut cfg = ProviderConfig::new(ProviderKind::Gemini, "gemini-2.5-flash");
        cfg.endpoint = Some("http://localhost:8080".to_string());
        assert_eq!(cfg.effective_endpoint(), "http://localhost:8080");
    }

    #[test]
    fn test_provider_kind_serde_lowercase() {
        let json = serde_json::to_string(&ProviderKind::Grok).unwrap();
        assert_eq!(json, "\"grok\"");
        let kind: ProviderKind = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(kind, ProviderKind::Gemini);
    }
}
