use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_UPLOAD_MB: usize = 25;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read once at startup
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub gemini_api_key: String,
    pub model: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl ServiceConfig {
    /// Read settings from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let model = lookup("GEMINI_MODEL")
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let timeout_secs = parse_or(&lookup, "AI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let max_upload_mb = parse_or(&lookup, "MAX_UPLOAD_MB", DEFAULT_MAX_UPLOAD_MB)?;

        Ok(Self {
            gemini_api_key,
            model,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        assert_eq!(config_from(&[]).unwrap_err(), ConfigError::MissingApiKey);
        assert_eq!(
            config_from(&[("GEMINI_API_KEY", "  ")]).unwrap_err(),
            ConfigError::MissingApiKey
        );
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("GEMINI_API_KEY", "secret")]).unwrap();
        assert_eq!(config.gemini_api_key, "secret");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("PORT", "8080"),
            ("AI_TIMEOUT_SECS", "5"),
            ("MAX_UPLOAD_MB", "2"),
        ])
        .unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let err = config_from(&[("GEMINI_API_KEY", "secret"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );
    }
}
