//! Error types for Genie.
//!
//! Errors are grouped by concern so callers can tell a bad config file from
//! an exhausted provider chain or an answer the model got wrong.

use thiserror::Error;

/// Top-level error type for Genie operations.
#[derive(Error, Debug)]
pub enum GenieError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inference (provider chain) errors
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Appraisal errors (bad input, unparseable model output)
    #[error("Appraisal error: {0}")]
    Appraisal(#[from] AppraisalError),

    /// Session step errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Photo preparation errors
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised while talking to inference providers.
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    /// The provider rejected the request or could not be reached.
    ///
    /// `status_code` is set for HTTP-level failures and `None` for
    /// transport errors (DNS, connection refused, TLS).
    #[error("{provider}: {message}")]
    Provider {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },

    /// The provider did not answer within the per-request timeout.
    #[error("{provider}: timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// The provider answered, but not with the structured output we asked for.
    #[error("{provider}: unparseable response: {message}")]
    Parse { provider: String, message: String },

    /// The request was rejected before any provider was called.
    #[error("Invalid inference request: {0}")]
    InvalidRequest(String),

    /// No provider in the configured chain is usable (disabled or missing credentials).
    #[error("No usable inference providers: {0}")]
    NoProviders(String),

    /// Every provider in the chain failed.
    #[error("All providers failed after {attempts} attempt(s) across {providers} provider(s). Last error: {last_error}")]
    Exhausted {
        providers: usize,
        attempts: u32,
        last_error: String,
    },
}

/// Appraisal-level errors.
#[derive(Error, Debug)]
pub enum AppraisalError {
    /// Caller input was empty or otherwise unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The model answered, but the value we need could not be extracted.
    #[error("Could not extract {what} from model output: {raw:?}")]
    Unparseable { what: String, raw: String },

    /// The provider chain failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Errors from driving the appraisal session out of order.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// An operation was called in the wrong step.
    #[error("'{operation}' is not allowed in the {actual} step (expected {expected})")]
    WrongStep {
        operation: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// A spec attribute that the item does not have.
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// A value not among the offered options for an attribute.
    #[error("'{value}' is not an option for {attribute}")]
    InvalidOption { attribute: String, value: String },
}

/// Photo preparation errors.
#[derive(Error, Debug)]
pub enum PhotoError {
    /// Nothing to send.
    #[error("Photo is empty")]
    Empty,

    /// Not an image any provider accepts, and it could not be decoded for conversion.
    #[error("Unsupported photo format: {0}")]
    Unsupported(String),

    /// Re-encoding a photo as JPEG failed.
    #[error("Failed to encode photo: {0}")]
    Encode(String),
}

/// Convenience type alias for Genie results.
pub type Result<T> = std::result::Result<T, GenieError>;

/// Convenience type alias for inference results.
pub type InferenceResult<T> = std::result::Result<T, InferenceError>;
