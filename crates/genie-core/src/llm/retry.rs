//! Retry utilities for rate-limited providers.
//!
//! Only "rate limited / overloaded" answers are retried against the same
//! provider. Everything else moves straight on to the next provider.

use crate::error::InferenceError;
use rand::Rng;
use std::time::Duration;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Retry limits for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum calls to a single provider (first try included)
    pub max_attempts: u32,
    /// Base backoff delay in milliseconds
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Determine whether an error means "slow down and try the same provider again".
///
/// Retryable: HTTP 429 and HTTP 503 (Gemini's "model is overloaded").
/// Non-retryable: auth failures, bad requests, transport errors, timeouts,
/// unparseable output.
pub fn is_rate_limited(error: &InferenceError) -> bool {
    match error {
        InferenceError::Provider {
            status_code: Some(code),
            ..
        } => *code == 429 || *code == 503,
        _ => false,
    }
}

/// Calculate exponential backoff for a given retry (0-based) before jitter.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(MAX_BACKOFF_MS))
}

/// Exponential backoff plus up to one base delay of random jitter.
pub fn jittered_backoff(attempt: u32, base_delay_ms: u64) -> Duration {
    let jitter = if base_delay_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..base_delay_ms)
    };
    let delay = backoff_duration(attempt, base_delay_ms) + Duration::from_millis(jitter);
    delay.min(Duration::from_millis(MAX_BACKOFF_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(code: u16) -> InferenceError {
        InferenceError::Provider {
            provider: "gemini".to_string(),
            message: format!("HTTP {code}"),
            status_code: Some(code),
        }
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        assert!(is_rate_limited(&http(429)));
    }

    #[test]
    fn test_overloaded_is_retryable() {
        assert!(is_rate_limited(&http(503)));
    }

    #[test]
    fn test_auth_error_not_retryable() {
        assert!(!is_rate_limited(&http(401)));
        assert!(!is_rate_limited(&http(403)));
    }

    #[test]
    fn test_bad_request_and_payload_too_large_not_retryable() {
        assert!(!is_rate_limited(&http(400)));
        assert!(!is_rate_limited(&http(413)));
    }

    #[test]
    fn test_internal_error_not_retryable() {
        assert!(!is_rate_limited(&http(500)));
    }

    #[test]
    fn test_transport_error_not_retryable() {
        let err = InferenceError::Provider {
            provider: "groq".to_string(),
            message: "connection refused".to_string(),
            status_code: None,
        };
        assert!(!is_rate_limited(&err));
    }

    #[test]
    fn test_timeout_and_parse_not_retryable() {
        let timeout = InferenceError::Timeout {
            provider: "grok".to_string(),
            timeout_ms: 100,
        };
        let parse = InferenceError::Parse {
            provider: "grok".to_string(),
            message: "expected value".to_string(),
        };
        assert!(!is_rate_limited(&timeout));
        assert!(!is_rate_limited(&parse));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(2, 1000), Duration::from_millis(4000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
        assert_eq!(jittered_backoff(10, 1000), Duration::from_millis(30_000));
    }

    #[test]
    fn test_jitter_stays_within_one_base_delay() {
        for _ in 0..50 {
            let delay = jittered_backoff(1, 100);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay < Duration::from_millis(300));
        }
    }

    #[test]
    fn test_zero_base_delay_has_no_jitter() {
        assert_eq!(jittered_backoff(3, 0), Duration::ZERO);
    }
}
