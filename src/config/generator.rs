//! Content generator configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Upper bound on a single generator call.
pub const MAX_GENERATOR_TIMEOUT_SECS: u64 = 9;

const MAX_RETRIES: u32 = 10;

/// Content generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    /// Which backend produces comparison text and reports
    #[serde(default)]
    pub provider: GeneratorProvider,

    /// API key for the OpenAI-compatible backend
    pub api_key: Option<Secret<String>>,

    /// Chat-completions base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt
    #[serde(default = "default_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds; doubles per retry
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
}

/// Generator backend
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    #[default]
    OpenAI,
    Mock,
}

impl GeneratorConfig {
    /// Get per-call timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get initial retry backoff as Duration
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().trim().is_empty())
    }

    /// Validate generator configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_secs == 0 || self.timeout_secs > MAX_GENERATOR_TIMEOUT_SECS {
            return Err(ValidationError::InvalidGeneratorTimeout {
                max: MAX_GENERATOR_TIMEOUT_SECS,
            });
        }
        if self.max_retries > MAX_RETRIES {
            return Err(ValidationError::TooManyRetries { max: MAX_RETRIES });
        }

        if self.provider == GeneratorProvider::OpenAI {
            if !self.has_api_key() {
                return Err(ValidationError::MissingRequired("GENERATOR__API_KEY"));
            }
            if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
                return Err(ValidationError::InvalidGeneratorUrl);
            }
        }

        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: GeneratorProvider::default(),
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            initial_backoff_ms: default_initial_backoff(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    8
}

fn default_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    1000
}
