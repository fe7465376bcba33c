//! Application configuration module
//!
//! Configuration is read from environment variables with the `MAJOR_BRACKET`
//! prefix; nested values use double underscores as separators. Every section
//! has defaults, so an empty environment yields an in-memory server with the
//! OpenAI generator (which then fails validation for lack of an API key).
//!
//! # Example
//!
//! ```no_run
//! use major_bracket::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod bracket;
mod database;
mod error;
mod generator;
mod server;

pub use bracket::{BracketConfig, DEFAULT_CATEGORIES};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use generator::{GeneratorConfig, GeneratorProvider, MAX_GENERATOR_TIMEOUT_SECS};
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration; in-memory storage when no URL is set
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Content generator configuration
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Bracket rules (default categories, expansion table)
    #[serde(default)]
    pub bracket: BracketConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Loads `.env` if present, then reads `MAJOR_BRACKET__SECTION__KEY`
    /// variables, e.g. `MAJOR_BRACKET__SERVER__PORT=8080` sets `server.port`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("MAJOR_BRACKET")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.generator.validate()?;
        self.bracket.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "MAJOR_BRACKET__GENERATOR__API_KEY",
        "MAJOR_BRACKET__GENERATOR__PROVIDER",
        "MAJOR_BRACKET__SERVER__PORT",
        "MAJOR_BRACKET__SERVER__ENVIRONMENT",
        "MAJOR_BRACKET__BRACKET__DEFAULT_CATEGORIES",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("MAJOR_BRACKET__GENERATOR__API_KEY", "sk-test");
        env::set_var("MAJOR_BRACKET__SERVER__PORT", "3000");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.generator.has_api_key());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url(), None);
        assert_eq!(config.bracket.categories().unwrap().len(), 8);
    }

    #[test]
    fn test_mock_provider_validates_without_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("MAJOR_BRACKET__GENERATOR__PROVIDER", "mock");
        env::set_var("MAJOR_BRACKET__BRACKET__DEFAULT_CATEGORIES", "医学,文学,数学类");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.generator.provider, GeneratorProvider::Mock);
        assert_eq!(config.bracket.categories().unwrap().len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("MAJOR_BRACKET__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }
}
