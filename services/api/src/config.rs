//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use ear_trainer_core::ValidationMode;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub validation_mode: ValidationMode,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server and Database Settings ---
        let bind_address_str = match (lookup("BIND_ADDRESS"), lookup("PORT")) {
            (Some(address), _) => address,
            (None, Some(port)) => format!("0.0.0.0:{}", port),
            (None, None) => "0.0.0.0:3000".to_string(),
        };
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://database.db".to_string());

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Validation Settings ---
        let validation_mode = match lookup("STRICT_VALIDATION") {
            None => ValidationMode::Lenient,
            Some(value) => match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => ValidationMode::Strict,
                "0" | "false" | "no" | "" => ValidationMode::Lenient,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "STRICT_VALIDATION".to_string(),
                        format!("'{}' is not a boolean", value),
                    ))
                }
            },
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            validation_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.database_url, "sqlite://database.db");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.validation_mode, ValidationMode::Lenient);
    }

    #[test]
    fn port_is_used_when_bind_address_is_absent() {
        let config = load(&[("PORT", "8080")]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080".parse().unwrap());

        let config = load(&[("PORT", "8080"), ("BIND_ADDRESS", "127.0.0.1:9000")]).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn strict_validation_flag_is_parsed() {
        let config = load(&[("STRICT_VALIDATION", "TRUE")]).unwrap();
        assert_eq!(config.validation_mode, ValidationMode::Strict);

        let config = load(&[("STRICT_VALIDATION", "no")]).unwrap();
        assert_eq!(config.validation_mode, ValidationMode::Lenient);

        assert!(matches!(
            load(&[("STRICT_VALIDATION", "sometimes")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "STRICT_VALIDATION"
        ));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert!(matches!(
            load(&[("BIND_ADDRESS", "not-an-address")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "BIND_ADDRESS"
        ));
        assert!(matches!(
            load(&[("RUST_LOG", "loud")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "RUST_LOG"
        ));
    }
}
