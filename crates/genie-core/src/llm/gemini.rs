//! Google Gemini provider using the `generateContent` REST API.
//!
//! Sends the prompt and an optional inline base64 photo as content parts.
//! JSON mode is requested through `generationConfig.responseMimeType`.

use super::provider::{InferenceProvider, InferenceRequest, InferenceResponse};
use crate::error::InferenceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Gemini provider for one model and API version.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// Create a provider for `{endpoint}/{api_version}/models/{model}:generateContent`.
    pub fn new(
        endpoint: &str,
        api_version: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Self {
        let url = format!(
            "{}/{}/models/{}:generateContent",
            endpoint.trim_end_matches('/'),
            api_version.trim_matches('/'),
            model
        );
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            url,
            timeout,
        }
    }

    /// Full URL requests are posted to (without the key).
    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_body(&self, request: &InferenceRequest) -> GenerateRequest {
        let mut parts = vec![Part::Text {
            text: request.prompt.clone(),
        }];
        if let Some(image) = &request.image {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type.clone(),
                    data: image.data.clone(),
                },
            });
        }

        GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: request
                    .expect_json
                    .then(|| "application/json".to_string()),
            },
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    total_token_count: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    status: Option<String>,
}

/// Pull `status: message` out of a Google API error body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => match env.error.status {
            Some(status) => format!("{status}: {}", env.error.message),
            None => env.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

impl GenerateResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<(String, Option<u32>, Option<String>), String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(format!("prompt blocked: {reason}"));
        }
        let tokens = self.usage_metadata.and_then(|u| u.total_token_count);
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err("no candidates returned".to_string());
        };
        let finish = candidate.finish_reason;
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(match finish {
                Some(reason) => format!("empty candidate (finish reason {reason})"),
                None => "empty candidate".to_string(),
            });
        }
        Ok((text, tokens, self.model_version))
    }
}

#[async_trait]
impl InferenceProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let start = Instant::now();
        let body = self.build_body(request);

        let resp = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| InferenceError::Provider {
                provider: "gemini".to_string(),
                // reqwest includes the URL in its error text; drop it so the key never leaks.
                message: format!("request failed: {}", e.without_url()),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Provider {
                provider: "gemini".to_string(),
                message: format!("HTTP {status}: {}", error_message(&text)),
                status_code: Some(status.as_u16()),
            });
        }

        let generate_resp: GenerateResponse =
            resp.json().await.map_err(|e| InferenceError::Parse {
                provider: "gemini".to_string(),
                message: format!("malformed generateContent response: {}", e.without_url()),
            })?;

        let (text, tokens_used, model_version) =
            generate_resp
                .into_text()
                .map_err(|message| InferenceError::Parse {
                    provider: "gemini".to_string(),
                    message,
                })?;

        Ok(InferenceResponse {
            text,
            model: model_version.unwrap_or_else(|| self.model.clone()),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
