//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.inference.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "inference.max_attempts must be > 0".into(),
            ));
        }
        if self.inference.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "inference.timeout_ms must be > 0".into(),
            ));
        }
        if self.inference.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "inference.max_tokens must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.inference.temperature) {
            return Err(ConfigError::ValidationError(
                "inference.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.photo.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "photo.max_dimension must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.photo.jpeg_quality) {
            return Err(ConfigError::ValidationError(
                "photo.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.providers.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one [[providers]] entry is required".into(),
            ));
        }
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "providers[{i}].model must not be empty"
                )));
            }
            if provider.endpoint.as_deref().is_some_and(|e| e.trim().is_empty()) {
                return Err(ConfigError::ValidationError(format!(
                    "providers[{i}].endpoint must not be empty when set"
                )));
            }
        }
        Ok(())
    }
}
