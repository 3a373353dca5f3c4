//! Environment-driven configuration shared by every crate in the workspace.
//!
//! Each settings struct implements [`FromEnv`] using the `env_*` helpers below, so a
//! missing or malformed variable is reported by name.

pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable '{0}'")]
    MissingEnvVar(String),

    #[error("invalid value for '{key}': {details}")]
    ParseError { key: String, details: String },
}

/// Deployment environment, read from `APP_ENV`.
///
/// Anything other than `production` (any case) runs as development.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = std::convert::Infallible;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        })
    }
}

impl Environment {
    pub fn from_env() -> Self {
        env_optional("APP_ENV")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

pub fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

/// Blank values count as unset.
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env_optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse `key` into `T`; `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = env_optional(key) else {
        return Ok(default);
    };
    raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
        key: key.to_string(),
        details: format!("'{}' ({})", raw.trim(), e),
    })
}

/// Comma-separated list, empty entries dropped
pub fn env_list(key: &str) -> Vec<String> {
    let Some(raw) = env_optional(key) else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_env_selects_environment() {
        let cases = [
            (None, Environment::Development),
            (Some("production"), Environment::Production),
            (Some(" PROD "), Environment::Production),
            (Some("qa"), Environment::Development),
            (Some(""), Environment::Development),
        ];
        for (value, expected) in cases {
            temp_env::with_var("APP_ENV", value, || {
                assert_eq!(Environment::from_env(), expected, "APP_ENV={:?}", value);
            });
        }
    }

    #[test]
    fn test_only_production_reports_production() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::default().is_production());
    }

    #[test]
    fn test_blank_value_falls_back_to_default() {
        temp_env::with_var("OLLAMA_MODEL", Some(""), || {
            assert_eq!(env_or_default("OLLAMA_MODEL", "nomic-embed-text"), "nomic-embed-text");
        });
        temp_env::with_var("OLLAMA_MODEL", Some("all-minilm"), || {
            assert_eq!(env_or_default("OLLAMA_MODEL", "nomic-embed-text"), "all-minilm");
        });
    }

    #[test]
    fn test_required_variable_names_itself_when_absent() {
        for value in [None, Some("  ")] {
            temp_env::with_var("QDRANT_URL_REQUIRED", value, || {
                let err = env_required("QDRANT_URL_REQUIRED").unwrap_err();
                assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "QDRANT_URL_REQUIRED"));
            });
        }
    }

    #[test]
    fn test_parse_default_and_failure() {
        temp_env::with_var_unset("TIMEOUT_SECS", || {
            assert_eq!(env_parse("TIMEOUT_SECS", 30u64).unwrap(), 30);
        });
        temp_env::with_var("TIMEOUT_SECS", Some(" 7 "), || {
            assert_eq!(env_parse("TIMEOUT_SECS", 30u64).unwrap(), 7);
        });
        temp_env::with_var("TIMEOUT_SECS", Some("soon"), || {
            let message = env_parse::<u64>("TIMEOUT_SECS", 30).unwrap_err().to_string();
            assert!(message.contains("TIMEOUT_SECS"));
            assert!(message.contains("'soon'"));
        });
    }

    #[test]
    fn test_list_drops_empty_entries() {
        temp_env::with_var("IMAGE_LIST", Some(" dogs.jpeg, ,tiger.jpg,"), || {
            assert_eq!(env_list("IMAGE_LIST"), vec!["dogs.jpeg", "tiger.jpg"]);
        });
        temp_env::with_var_unset("IMAGE_LIST", || {
            assert!(env_list("IMAGE_LIST").is_empty());
        });
    }
}
