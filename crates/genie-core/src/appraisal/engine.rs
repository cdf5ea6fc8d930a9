//! The appraiser: one method per question we ask the model.

use super::extract;
use super::prompts;
use super::types::{AppraisalRecord, AppraisalRequest, AppraisalResult};
use crate::config::Config;
use crate::error::{AppraisalError, InferenceError};
use crate::llm::{Completion, Content, ImageInput, ResilientInferenceClient};
use serde_json::Value;
use std::collections::BTreeMap;

/// Asks the provider chain appraisal questions and shapes the answers.
pub struct Appraiser {
    client: ResilientInferenceClient,
}

impl Appraiser {
    pub fn new(client: ResilientInferenceClient) -> Self {
        Self { client }
    }

    /// Build the provider chain from config.
    pub fn from_config(config: &Config) -> Result<Self, InferenceError> {
        Ok(Self::new(ResilientInferenceClient::from_config(config)?))
    }

    /// The underlying client.
    pub fn client(&self) -> &ResilientInferenceClient {
        &self.client
    }

    /// Suggest specific models for a vague item description.
    pub async fn suggest_models(&self, query: &str) -> Result<Vec<String>, AppraisalError> {
        let query = non_empty(query, "search query")?;
        let completion = self
            .client
            .submit(&prompts::suggest_models(query), None, true)
            .await?;
        let value = json_content(&completion)?;
        let suggestions = string_list(value).ok_or_else(|| unparseable("model suggestions", value))?;
        Ok(suggestions
            .into_iter()
            .take(prompts::SUGGESTION_COUNT)
            .collect())
    }

    /// Ask which attributes matter for an item and what options each has.
    pub async fn item_specs(
        &self,
        item: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, AppraisalError> {
        let item = non_empty(item, "item")?;
        let completion = self
            .client
            .submit(&prompts::item_specs(item), None, true)
            .await?;
        let value = json_content(&completion)?;
        let Value::Object(map) = value else {
            return Err(unparseable("item specs", value));
        };

        let specs: BTreeMap<String, Vec<String>> = map
            .iter()
            .filter_map(|(name, options)| {
                let options = string_list(options)?;
                (!options.is_empty()).then(|| (name.clone(), options))
            })
            .collect();
        if specs.is_empty() {
            return Err(unparseable("item specs", value));
        }
        Ok(specs)
    }

    /// Price the item and draft a listing.
    pub async fn appraise(
        &self,
        request: &AppraisalRequest,
    ) -> Result<AppraisalRecord, AppraisalError> {
        non_empty(request.item(), "item")?;
        let completion = self
            .client
            .submit_json::<AppraisalResult>(
                &prompts::appraise(request),
                request.photo().cloned(),
            )
            .await?;
        Ok(AppraisalRecord::new(
            request,
            completion.content,
            &completion.provider,
            &completion.model,
        ))
    }

    /// Demand score from 1 to 10.
    ///
    /// An answer without a usable number is an error, not a default score.
    pub async fn hype_score(&self, item: &str) -> Result<u8, AppraisalError> {
        let item = non_empty(item, "item")?;
        let completion = self
            .client
            .submit(&prompts::hype_score(item), None, false)
            .await?;
        let text = completion.content.as_text().unwrap_or_default();
        extract::hype_score(text).ok_or_else(|| AppraisalError::Unparseable {
            what: "hype score".to_string(),
            raw: text.to_string(),
        })
    }

    /// Read a phone's IMEI from a photo.
    pub async fn read_imei(&self, photo: ImageInput) -> Result<String, AppraisalError> {
        let completion = self
            .client
            .submit(&prompts::read_imei(), Some(photo), false)
            .await?;
        let text = completion.content.as_text().unwrap_or_default();
        extract::imei(text).ok_or_else(|| AppraisalError::Unparseable {
            what: "IMEI".to_string(),
            raw: text.to_string(),
        })
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, AppraisalError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppraisalError::InvalidInput(format!("{what} must not be empty")))
    } else {
        Ok(trimmed)
    }
}

fn json_content(completion: &Completion<Content>) -> Result<&Value, AppraisalError> {
    completion
        .content
        .as_json()
        .ok_or_else(|| AppraisalError::Unparseable {
            what: "JSON".to_string(),
            raw: completion.content.as_text().unwrap_or_default().to_string(),
        })
}

fn unparseable(what: &str, value: &Value) -> AppraisalError {
    AppraisalError::Unparseable {
        what: what.to_string(),
        raw: value.to_string(),
    }
}

/// A list of display strings from an array, or from an object wrapping one
/// array (`{"suggestions": [...]}`). Numbers and booleans are stringified.
fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Value::Object(map) if map.len() == 1 => map.values().next().and_then(string_list),
        _ => None,
    }
}
