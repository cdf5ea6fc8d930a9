//! Appraisal request and result types.

use crate::llm::ImageInput;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the seller describes the item's condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Still sealed in the box
    NewUnopened,
    /// Opened, no visible wear
    LikeNew,
    /// Visible wear from regular use
    Used,
}

impl Condition {
    /// All conditions in display order.
    pub const ALL: [Condition; 3] = [Condition::NewUnopened, Condition::LikeNew, Condition::Used];

    /// Label shown to the seller and sent to the model.
    pub fn label(&self) -> &'static str {
        match self {
            Condition::NewUnopened => "New Unopened",
            Condition::LikeNew => "Opened / Like New",
            Condition::Used => "Used / Well Loved",
        }
    }

    /// Parse a CLI-style name ("new", "like-new", "used", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "new" | "new-unopened" | "sealed" => Some(Condition::NewUnopened),
            "like-new" | "opened" | "open-box" => Some(Condition::LikeNew),
            "used" | "well-loved" => Some(Condition::Used),
            _ => None,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything the seller told us about one item.
///
/// Immutable once built; construct with `AppraisalRequest::new` and the
/// `with_*` builders, or through an `AppraisalSession`.
#[derive(Debug, Clone)]
pub struct AppraisalRequest {
    item: String,
    specs: BTreeMap<String, String>,
    condition: Option<Condition>,
    photo: Option<ImageInput>,
}

impl AppraisalRequest {
    /// Start a request for a free-form item description.
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into().trim().to_string(),
            specs: BTreeMap::new(),
            condition: None,
            photo: None,
        }
    }

    /// Add one chosen attribute (e.g. "Storage" = "256GB").
    pub fn with_spec(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.specs.insert(name.into(), value.into());
        self
    }

    /// Add all chosen attributes.
    pub fn with_specs(mut self, specs: BTreeMap<String, String>) -> Self {
        self.specs.extend(specs);
        self
    }

    /// Set the condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Attach a prepared photo.
    pub fn with_photo(mut self, photo: ImageInput) -> Self {
        self.photo = Some(photo);
        self
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn specs(&self) -> &BTreeMap<String, String> {
        &self.specs
    }

    pub fn condition(&self) -> Option<Condition> {
        self.condition
    }

    pub fn photo(&self) -> Option<&ImageInput> {
        self.photo.as_ref()
    }
}

/// The model's verdict: price range plus a listing draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalResult {
    /// Whether the photo matches the claimed item and condition
    #[serde(default)]
    pub verified: bool,

    /// Short note explaining the verification verdict
    #[serde(default)]
    pub note: String,

    /// Marketplace listing title
    pub title: String,

    /// Marketplace listing description
    pub description: String,

    /// Quick-sale price, e.g. "$40"
    #[serde(alias = "quick_price", deserialize_with = "price_string")]
    pub low_price: String,

    /// Patient-seller price, e.g. "$65"
    #[serde(alias = "max_price", deserialize_with = "price_string")]
    pub high_price: String,
}

/// Models sometimes answer prices as bare numbers; keep them as display strings.
fn price_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(format!("${n}")),
        other => Err(D::Error::custom(format!(
            "expected a price string, got {other}"
        ))),
    }
}

/// One appraisal as written to output: what was asked, what came back, and who answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppraisalRecord {
    pub item: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub specs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub condition: Option<Condition>,
    pub had_photo: bool,
    pub result: AppraisalResult,
    pub provider: String,
    pub model: String,
}

impl AppraisalRecord {
    pub fn new(request: &AppraisalRequest, result: AppraisalResult, provider: &str, model: &str) -> Self {
        Self {
            item: request.item().to_string(),
            specs: request.specs().clone(),
            condition: request.condition(),
            had_photo: request.photo().is_some(),
            result,
            provider: provider.to_string(),
            model: model.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_parse() {
        assert_eq!(Condition::parse("new"), Some(Condition::NewUnopened));
        assert_eq!(Condition::parse("Like New"), Some(Condition::LikeNew));
        assert_eq!(Condition::parse("like_new"), Some(Condition::LikeNew));
        assert_eq!(Condition::parse("USED"), Some(Condition::Used));
        assert_eq!(Condition::parse("mint"), None);
    }

    #[test]
    fn test_request_builder_trims_item() {
        let request = AppraisalRequest::new("  LG OLED TV ")
            .with_spec("Size", "55\"")
            .with_condition(Condition::Used);
        assert_eq!(request.item(), "LG OLED TV");
        assert_eq!(request.specs().get("Size").map(String::as_str), Some("55\""));
        assert_eq!(request.condition(), Some(Condition::Used));
        assert!(request.photo().is_none());
    }

    #[test]
    fn test_result_accepts_quick_and_max_price_keys() {
        let result: AppraisalResult = serde_json::from_value(json!({
            "verified": true,
            "note": "Matches the photo",
            "title": "iPhone 13 128GB Midnight",
            "description": "- Unlocked\n- Battery 89%",
            "quick_price": "$380",
            "max_price": "$450"
        }))
        .unwrap();
        assert!(result.verified);
        assert_eq!(result.low_price, "$380");
        assert_eq!(result.high_price, "$450");
    }

    #[test]
    fn test_result_numeric_prices_become_strings() {
        let result: AppraisalResult = serde_json::from_value(json!({
            "title": "Rug",
            "description": "Wool rug",
            "low_price": 40,
            "high_price": 65.5
        }))
        .unwrap();
        assert!(!result.verified);
        assert_eq!(result.low_price, "$40");
        assert_eq!(result.high_price, "$65.5");
    }

    #[test]
    fn test_result_missing_title_is_an_error() {
        let result = serde_json::from_value::<AppraisalResult>(json!({
            "description": "x", "low_price": "$1", "high_price": "$2"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_serializes_without_empty_specs() {
        let request = AppraisalRequest::new("Lamp");
        let result = AppraisalResult {
            verified: false,
            note: String::new(),
            title: "Lamp".to_string(),
            description: "Desk lamp".to_string(),
            low_price: "$5".to_string(),
            high_price: "$10".to_string(),
        };
        let record = AppraisalRecord::new(&request, result, "gemini", "gemini-2.5-flash");
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("specs").is_none());
        assert!(value.get("condition").is_none());
        assert_eq!(value["had_photo"], false);
        assert_eq!(value["result"]["low_price"], "$5");
    }
}
