//! Structured-output decoding.
//!
//! Models asked for JSON often wrap it in a markdown code fence anyway.

use serde::de::DeserializeOwned;

/// Strip an incidental markdown code fence around a model answer.
///
/// Handles "```json ... ```", bare "``` ... ```", and leading chatter before
/// the fence. Text without a fence is returned trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let after_open = &trimmed[open + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of the fence line.
    let body = match after_open.find('\n') {
        Some(newline) => {
            let info = after_open[..newline].trim();
            if info.chars().all(|c| c.is_ascii_alphanumeric()) {
                &after_open[newline + 1..]
            } else {
                after_open
            }
        }
        None => after_open.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };

    match body.rfind("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Decode a model answer into `T`, tolerating a surrounding code fence.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fences(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_plain_json_unchanged() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_fenced_json_with_language_tag() {
        let value: Value = parse_json("```json\n{\"a\":1,\"b\":\"x\"}\n```").unwrap();
        assert_eq!(value, json!({"a": 1, "b": "x"}));
    }

    #[test]
    fn test_fenced_json_without_language_tag() {
        let value: Value = parse_json("```\n[\"iPhone 13\", \"iPhone 13 Pro\"]\n```").unwrap();
        assert_eq!(value, json!(["iPhone 13", "iPhone 13 Pro"]));
    }

    #[test]
    fn test_fence_on_single_line() {
        let value: Value = parse_json("```json{\"a\":1}```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_leading_chatter_before_fence() {
        let text = "Sure! Here is the appraisal:\n```JSON\n{\"verified\": true}\n```\nGood luck!";
        let value: Value = parse_json(text).unwrap();
        assert_eq!(value, json!({"verified": true}));
    }

    #[test]
    fn test_unterminated_fence() {
        let value: Value = parse_json("```json\n{\"a\":1}").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_not_json_is_an_error() {
        assert!(parse_json::<Value>("I think it's worth about $40.").is_err());
    }
}
