//! Configuration management for Genie.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. All config structs implement `Default`, so a missing file (or a
//! partial one) still yields a working provider chain.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Genie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Retry, timeout and sampling settings for inference calls
    pub inference: InferenceConfig,

    /// Photo preparation settings
    pub photo: PhotoConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Ordered fallback chain. The first entry is tried first.
    pub providers: Vec<ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            photo: PhotoConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            providers: ProviderConfig::default_chain(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.genie.genie/config.toml
    /// - Linux: ~/.config/genie/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\genie\config\config.toml
    ///
    /// Falls back to ~/.genie/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "genie", "genie")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = shellexpand::tilde("~").into_owned();
                PathBuf::from(home).join(".genie").join("config.toml")
            })
    }

    /// Providers that are switched on, in fallback order.
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.inference.max_attempts, 3);
        assert_eq!(config.inference.retry_base_delay_ms, 1000);
        assert_eq!(config.photo.max_dimension, 1024);
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.providers[0].kind, ProviderKind::Gemini);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[inference]"));
        assert!(toml.contains("[photo]"));
        assert!(toml.contains("[[providers]]"));
    }

    #[test]
    fn test_config_toml_roundtrip_preserves_chain_order() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        let kinds: Vec<_> = parsed.providers.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![ProviderKind::Gemini, ProviderKind::Groq, ProviderKind::Grok]
        );
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config = Config::from_toml("[inference]\nmax_attempts = 5\n").unwrap();
        assert_eq!(config.inference.max_attempts, 5);
        assert_eq!(config.inference.timeout_ms, 60_000);
        assert_eq!(config.providers.len(), 3);
    }

    #[test]
    fn test_load_from_file_with_custom_chain() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[[providers]]
kind = "groq"
model = "llama-3.2-90b-vision-preview"
api_key = "gsk-test"

[[providers]]
kind = "gemini"
model = "gemini-2.0-flash"
api_version = "v1"
api_key = "${{GEMINI_API_KEY}}"
enabled = false
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].kind, ProviderKind::Groq);
        assert!(config.providers[0].enabled);
        assert_eq!(config.providers[1].api_version.as_deref(), Some("v1"));

        let enabled: Vec<_> = config.enabled_providers().collect();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].kind, ProviderKind::Groq);
    }

    #[test]
    fn test_load_from_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[inference\nmax_attempts = ").unwrap();
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
