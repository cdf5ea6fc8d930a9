//! Genie Core - marketplace appraisal over a resilient chain of vision LLMs.
//!
//! A seller describes an item (and optionally photographs it); Genie asks a
//! multimodal model to identify it, price it, and draft a listing. Calls go
//! through an ordered provider chain with rate-limit retry, so one provider
//! being throttled or down does not fail the appraisal.
//!
//! ```text
//! query → suggest_models → item_specs → condition → photo → appraise → record
//!                    ResilientInferenceClient (Gemini → Groq → Grok)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use genie_core::{AppraisalRequest, Appraiser, Condition, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let appraiser = Appraiser::from_config(&config)?;
//!
//!     let request = AppraisalRequest::new("iPhone 13")
//!         .with_spec("Storage", "128GB")
//!         .with_condition(Condition::Used);
//!     let record = appraiser.appraise(&request).await?;
//!     println!("{} - {}", record.result.low_price, record.result.high_price);
//!     Ok(())
//! }
//! ```

pub mod appraisal;
pub mod config;
pub mod error;
pub mod llm;
pub mod output;
pub mod photo;

pub use appraisal::{
    AppraisalRecord, AppraisalRequest, AppraisalResult, AppraisalSession, Appraiser, Condition,
    Step,
};
pub use config::Config;
pub use error::{
    AppraisalError, ConfigError, GenieError, InferenceError, PhotoError, Result, SessionError,
};
pub use llm::{Completion, Content, ImageInput, ResilientInferenceClient};
pub use output::{OutputFormat, OutputWriter};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_config_builds_chain_when_keys_present() {
        let mut config = Config::default();
        for provider in &mut config.providers {
            provider.api_key = "literal-test-key".to_string();
        }
        let client = ResilientInferenceClient::from_config(&config).unwrap();
        assert_eq!(client.provider_names(), vec!["gemini", "groq", "grok"]);
    }
}
