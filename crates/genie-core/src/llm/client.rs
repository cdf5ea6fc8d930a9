//! Resilient inference client: ordered provider fallback with rate-limit retry.
//!
//! Each `submit` walks the provider chain in priority order. A provider that
//! answers "rate limited" is retried with jittered exponential backoff up to
//! `max_attempts` calls; any other failure moves on to the next provider
//! immediately. When structured output is requested, an answer that does not
//! parse counts as a provider failure too. The caller always gets a
//! `Result`, never a panic.

use super::json;
use super::provider::{ImageInput, InferenceProvider, InferenceRequest, InferenceResponse};
use super::retry::{self, RetryPolicy};
use crate::config::{Config, InferenceConfig};
use crate::error::InferenceError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// What a successful call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Free text, trimmed
    Text(String),
    /// Parsed structured output
    Json(Value),
}

impl Content {
    /// The text answer, if this is free text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            Content::Json(_) => None,
        }
    }

    /// The structured answer, if this is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Content::Json(value) => Some(value),
            Content::Text(_) => None,
        }
    }
}

/// A successful answer plus where it came from.
#[derive(Debug, Clone)]
pub struct Completion<T> {
    /// Decoded answer
    pub content: T,
    /// Provider that answered
    pub provider: String,
    /// Model reported by the provider
    pub model: String,
    /// Total provider calls made for this submit (all providers)
    pub attempts: u32,
    /// Latency of the successful call in milliseconds
    pub latency_ms: u64,
    /// Tokens used by the successful call, if reported
    pub tokens_used: Option<u32>,
    /// Served from the text-query memo cache
    pub cached: bool,
}

#[derive(Clone)]
struct CachedAnswer {
    response: InferenceResponse,
    provider: String,
}

/// Ordered fallback chain over inference providers.
pub struct ResilientInferenceClient {
    providers: Vec<Box<dyn InferenceProvider>>,
    policy: RetryPolicy,
    inference: InferenceConfig,
    cache: Option<Mutex<HashMap<(String, bool), CachedAnswer>>>,
}

impl ResilientInferenceClient {
    /// Create a client over an explicit provider chain.
    pub fn new(providers: Vec<Box<dyn InferenceProvider>>, inference: InferenceConfig) -> Self {
        let policy = RetryPolicy {
            max_attempts: inference.max_attempts.max(1),
            base_delay_ms: inference.retry_base_delay_ms,
        };
        let cache = inference
            .cache_text_queries
            .then(|| Mutex::new(HashMap::new()));
        Self {
            providers,
            policy,
            inference,
            cache,
        }
    }

    /// Build the chain from the `[[providers]]` config section.
    pub fn from_config(config: &Config) -> Result<Self, InferenceError> {
        let providers = super::provider::ProviderFactory::create_chain(config)?;
        Ok(Self::new(providers, config.inference.clone()))
    }

    /// Names of the providers in fallback order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Retry limits in effect.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Submit a prompt (and optional photo) and return the first usable answer.
    ///
    /// With `expect_json`, the answer is parsed as JSON (code fences
    /// stripped) and returned as `Content::Json`; otherwise as `Content::Text`.
    pub async fn submit(
        &self,
        prompt: &str,
        image: Option<ImageInput>,
        expect_json: bool,
    ) -> Result<Completion<Content>, InferenceError> {
        if expect_json {
            self.run(prompt, image, true, |text| {
                json::parse_json::<Value>(text)
                    .map(Content::Json)
                    .map_err(|e| e.to_string())
            })
            .await
        } else {
            self.run(prompt, image, false, |text| Ok(Content::Text(text.trim().to_string())))
                .await
        }
    }

    /// Submit a prompt expecting JSON and deserialize it into `T`.
    ///
    /// An answer that is valid JSON but does not match `T` is treated like
    /// any other unparseable answer and triggers fallback.
    pub async fn submit_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        image: Option<ImageInput>,
    ) -> Result<Completion<T>, InferenceError> {
        self.run(prompt, image, true, |text| {
            json::parse_json::<T>(text).map_err(|e| e.to_string())
        })
        .await
    }

    async fn run<T, F>(
        &self,
        prompt: &str,
        image: Option<ImageInput>,
        expect_json: bool,
        decode: F,
    ) -> Result<Completion<T>, InferenceError>
    where
        F: Fn(&str) -> Result<T, String>,
    {
        if prompt.trim().is_empty() {
            return Err(InferenceError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }

        let cache_key = image.is_none().then(|| (prompt.to_string(), expect_json));
        if let Some(hit) = self.cache_lookup(cache_key.as_ref()) {
            if let Ok(content) = decode(&hit.response.text) {
                tracing::debug!("Memo cache hit ({})", hit.provider);
                return Ok(Completion {
                    content,
                    provider: hit.provider,
                    model: hit.response.model,
                    attempts: 0,
                    latency_ms: 0,
                    tokens_used: hit.response.tokens_used,
                    cached: true,
                });
            }
        }

        let request = InferenceRequest::new(prompt, image, expect_json, &self.inference);
        let mut attempts = 0u32;
        let mut last_error: Option<InferenceError> = None;

        for (index, provider) in self.providers.iter().enumerate() {
            for attempt in 0..self.policy.max_attempts {
                if attempt > 0 {
                    let delay = retry::jittered_backoff(attempt - 1, self.policy.base_delay_ms);
                    tracing::debug!(
                        "Retry {attempt}/{} for {} after {delay:?}",
                        self.policy.max_attempts - 1,
                        provider.name()
                    );
                    tokio::time::sleep(delay).await;
                }

                attempts += 1;
                let error = match self.call(provider.as_ref(), &request).await {
                    Ok(response) => match decode(&response.text) {
                        Ok(content) => {
                            tracing::info!(
                                "{} ({}) answered in {}ms after {attempts} call(s)",
                                provider.name(),
                                response.model,
                                response.latency_ms
                            );
                            let completion = Completion {
                                content,
                                provider: provider.name().to_string(),
                                model: response.model.clone(),
                                attempts,
                                latency_ms: response.latency_ms,
                                tokens_used: response.tokens_used,
                                cached: false,
                            };
                            self.cache_store(cache_key, response, provider.name());
                            return Ok(completion);
                        }
                        Err(message) => InferenceError::Parse {
                            provider: provider.name().to_string(),
                            message,
                        },
                    },
                    Err(e) => e,
                };

                let retry_same = retry::is_rate_limited(&error)
                    && attempt + 1 < self.policy.max_attempts;
                if retry_same {
                    tracing::debug!("{} rate limited: {error}", provider.name());
                } else {
                    tracing::warn!(
                        "Provider {}/{} failed: {error}",
                        index + 1,
                        self.providers.len()
                    );
                }
                last_error = Some(error);
                if !retry_same {
                    break;
                }
            }
        }

        let last_error = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no inference providers configured".to_string());
        Err(InferenceError::Exhausted {
            providers: self.providers.len(),
            attempts,
            last_error,
        })
    }

    /// One provider call bounded by the provider's timeout.
    async fn call(
        &self,
        provider: &dyn InferenceProvider,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let timeout = provider
            .timeout()
            .min(Duration::from_millis(self.inference.timeout_ms));
        match tokio::time::timeout(timeout, provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout {
                provider: provider.name().to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    fn cache_lookup(&self, key: Option<&(String, bool)>) -> Option<CachedAnswer> {
        let (cache, key) = (self.cache.as_ref()?, key?);
        let guard = cache.lock().ok()?;
        guard.get(key).cloned()
    }

    fn cache_store(&self, key: Option<(String, bool)>, response: InferenceResponse, provider: &str) {
        let (Some(cache), Some(key)) = (self.cache.as_ref(), key) else {
            return;
        };
        if let Ok(mut guard) = cache.lock() {
            guard.insert(
                key,
                CachedAnswer {
                    response,
                    provider: provider.to_string(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// One scripted outcome per call.
    #[derive(Clone)]
    enum Step {
        Ok(&'static str),
        Http(u16),
        Transport,
        Hang,
    }

    /// A mock provider that plays back a script, repeating the last step.
    struct ScriptedProvider {
        name: &'static str,
        script: Vec<Step>,
        calls: Arc<AtomicU32>,
        last_prompt_had_image: Arc<Mutex<Option<bool>>>,
    }

    impl ScriptedProvider {
        fn new(name: &'static str, script: Vec<Step>) -> Self {
            Self {
                name,
                script,
                calls: Arc::new(AtomicU32::new(0)),
                last_prompt_had_image: Arc::new(Mutex::new(None)),
            }
        }

        fn calls_handle(&self) -> Arc<AtomicU32> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl InferenceProvider for ScriptedProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn model(&self) -> &str {
            "mock-v1"
        }

        async fn generate(
            &self,
            request: &InferenceRequest,
        ) -> Result<InferenceResponse, InferenceError> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            *self.last_prompt_had_image.lock().unwrap() = Some(request.image.is_some());
            let step = self
                .script
                .get(idx)
                .or_else(|| self.script.last())
                .cloned()
                .unwrap_or(Step::Transport);
            match step {
                Step::Ok(text) => Ok(InferenceResponse {
                    text: text.to_string(),
                    model: format!("{}-model", self.name),
                    tokens_used: Some(7),
                    latency_ms: 3,
                }),
                Step::Http(code) => Err(InferenceError::Provider {
                    provider: self.name.to_string(),
                    message: format!("HTTP {code}"),
                    status_code: Some(code),
                }),
                Step::Transport => Err(InferenceError::Provider {
                    provider: self.name.to_string(),
                    message: "connection refused".to_string(),
                    status_code: None,
                }),
                Step::Hang => {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Err(InferenceError::InvalidRequest("unreachable".to_string()))
                }
            }
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(60)
        }
    }

    fn fast_config() -> InferenceConfig {
        InferenceConfig {
            max_attempts: 3,
            retry_base_delay_ms: 1,
            timeout_ms: 5_000,
            cache_text_queries: false,
            ..InferenceConfig::default()
        }
    }

    fn client(providers: Vec<ScriptedProvider>, config: InferenceConfig) -> ResilientInferenceClient {
        let boxed = providers
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn InferenceProvider>)
            .collect();
        ResilientInferenceClient::new(boxed, config)
    }

    #[tokio::test]
    async fn test_rate_limited_then_fallback_scenario() {
        let a = ScriptedProvider::new("a", vec![Step::Http(429), Step::Http(429), Step::Http(429)]);
        let b = ScriptedProvider::new("b", vec![Step::Ok("OK")]);
        let (a_calls, b_calls) = (a.calls_handle(), b.calls_handle());

        let result = client(vec![a, b], fast_config())
            .submit("price this", None, false)
            .await
            .unwrap();

        assert_eq!(result.content, Content::Text("OK".to_string()));
        assert_eq!(result.provider, "b");
        assert_eq!(a_calls.load(Ordering::SeqCst), 3);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.attempts, 4);
    }

    #[tokio::test]
    async fn test_text_answer_is_trimmed() {
        let a = ScriptedProvider::new("a", vec![Step::Ok("  Sony WH-1000XM4 \n")]);
        let result = client(vec![a], fast_config())
            .submit("name it", None, false)
            .await
            .unwrap();
        assert_eq!(result.content.as_text(), Some("Sony WH-1000XM4"));
    }

    #[tokio::test]
    async fn test_last_provider_success_is_returned() {
        let providers = vec![
            ScriptedProvider::new("a", vec![Step::Http(401)]),
            ScriptedProvider::new("b", vec![Step::Transport]),
            ScriptedProvider::new("c", vec![Step::Ok("not json")]),
            ScriptedProvider::new("d", vec![Step::Ok("```json\n{\"a\":1,\"b\":\"x\"}\n```")]),
        ];
        let result = client(providers, fast_config())
            .submit("specs", None, true)
            .await
            .unwrap();
        assert_eq!(result.provider, "d");
        assert_eq!(result.content, Content::Json(json!({"a": 1, "b": "x"})));
    }

    #[tokio::test]
    async fn test_non_retryable_errors_get_zero_retries() {
        for code in [400u16, 401, 403, 404, 413, 500] {
            let a = ScriptedProvider::new("a", vec![Step::Http(code)]);
            let b = ScriptedProvider::new("b", vec![Step::Ok("fine")]);
            let a_calls = a.calls_handle();
            let result = client(vec![a, b], fast_config())
                .submit("hello", None, false)
                .await
                .unwrap();
            assert_eq!(result.provider, "b");
            assert_eq!(a_calls.load(Ordering::SeqCst), 1, "HTTP {code} was retried");
        }
    }

    #[tokio::test]
    async fn test_transport_error_gets_zero_retries() {
        let a = ScriptedProvider::new("a", vec![Step::Transport]);
        let a_calls = a.calls_handle();
        let b = ScriptedProvider::new("b", vec![Step::Ok("fine")]);
        client(vec![a, b], fast_config())
            .submit("hello", None, false)
            .await
            .unwrap();
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_recovers_on_same_provider() {
        let a = ScriptedProvider::new("a", vec![Step::Http(429), Step::Http(503), Step::Ok("third time")]);
        let b = ScriptedProvider::new("b", vec![Step::Ok("unused")]);
        let (a_calls, b_calls) = (a.calls_handle(), b.calls_handle());
        let result = client(vec![a, b], fast_config())
            .submit("hello", None, false)
            .await
            .unwrap();
        assert_eq!(result.content.as_text(), Some("third time"));
        assert_eq!(a_calls.load(Ordering::SeqCst), 3);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_cap_respected_for_any_cap() {
        for cap in 1..=5u32 {
            let a = ScriptedProvider::new("a", vec![Step::Http(429)]);
            let a_calls = a.calls_handle();
            let config = InferenceConfig {
                max_attempts: cap,
                ..fast_config()
            };
            let err = client(vec![a], config)
                .submit("hello", None, false)
                .await
                .unwrap_err();
            assert_eq!(a_calls.load(Ordering::SeqCst), cap);
            assert!(matches!(err, InferenceError::Exhausted { attempts, .. } if attempts == cap));
        }
    }

    #[tokio::test]
    async fn test_all_fail_returns_exhausted_with_last_error() {
        let providers = vec![
            ScriptedProvider::new("a", vec![Step::Http(429)]),
            ScriptedProvider::new("b", vec![Step::Http(401)]),
        ];
        let err = client(providers, fast_config())
            .submit("hello", None, false)
            .await
            .unwrap_err();
        match err {
            InferenceError::Exhausted {
                providers,
                attempts,
                last_error,
            } => {
                assert_eq!(providers, 2);
                assert_eq!(attempts, 4);
                assert!(last_error.contains("HTTP 401"), "got: {last_error}");
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_chain_returns_exhausted_with_message() {
        let err = client(vec![], fast_config())
            .submit("hello", None, false)
            .await
            .unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(err.to_string().contains("no inference providers configured"));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_calls() {
        let a = ScriptedProvider::new("a", vec![Step::Ok("x")]);
        let a_calls = a.calls_handle();
        let err = client(vec![a], fast_config())
            .submit("   ", None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::InvalidRequest(_)));
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout_advances_without_retry() {
        let a = ScriptedProvider::new("a", vec![Step::Hang]);
        let a_calls = a.calls_handle();
        let b = ScriptedProvider::new("b", vec![Step::Ok("quick")]);
        let config = InferenceConfig {
            timeout_ms: 50,
            ..fast_config()
        };
        let result = client(vec![a, b], config)
            .submit("hello", None, false)
            .await
            .unwrap();
        assert_eq!(result.provider, "b");
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pair {
        a: u32,
        b: String,
    }

    #[tokio::test]
    async fn test_submit_json_schema_mismatch_falls_back() {
        let providers = vec![
            ScriptedProvider::new("a", vec![Step::Ok("{\"unexpected\": true}")]),
            ScriptedProvider::new("b", vec![Step::Ok("```json\n{\"a\":1,\"b\":\"x\"}\n```")]),
        ];
        let result = client(providers, fast_config())
            .submit_json::<Pair>("pair", None)
            .await
            .unwrap();
        assert_eq!(result.content, Pair { a: 1, b: "x".to_string() });
        assert_eq!(result.provider, "b");
    }

    #[tokio::test]
    async fn test_image_is_passed_through() {
        let a = ScriptedProvider::new("a", vec![Step::Ok("seen")]);
        let seen = a.last_prompt_had_image.clone();
        let image = ImageInput::from_bytes(&[1, 2, 3], "jpeg");
        client(vec![a], fast_config())
            .submit("look", Some(image), false)
            .await
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn test_text_queries_are_memoized() {
        let a = ScriptedProvider::new("a", vec![Step::Ok("[\"iPhone 13\"]")]);
        let a_calls = a.calls_handle();
        let config = InferenceConfig {
            cache_text_queries: true,
            ..fast_config()
        };
        let client = client(vec![a], config);

        let first = client.submit("suggest iphone", None, true).await.unwrap();
        let second = client.submit("suggest iphone", None, true).await.unwrap();
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.content, second.content);
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);

        // Different mode is a different key.
        client.submit("suggest iphone", None, false).await.unwrap();
        assert_eq!(a_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_image_queries_are_never_memoized() {
        let a = ScriptedProvider::new("a", vec![Step::Ok("ok")]);
        let a_calls = a.calls_handle();
        let config = InferenceConfig {
            cache_text_queries: true,
            ..fast_config()
        };
        let client = client(vec![a], config);
        let image = ImageInput::from_bytes(&[9], "png");
        client.submit("look", Some(image.clone()), false).await.unwrap();
        client.submit("look", Some(image), false).await.unwrap();
        assert_eq!(a_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_memoized() {
        let a = ScriptedProvider::new("a", vec![Step::Http(401), Step::Ok("now ok")]);
        let config = InferenceConfig {
            cache_text_queries: true,
            ..fast_config()
        };
        let client = client(vec![a], config);
        assert!(client.submit("q", None, false).await.is_err());
        let ok = client.submit("q", None, false).await.unwrap();
        assert_eq!(ok.content.as_text(), Some("now ok"));
    }
}
