use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};

/// Qdrant connection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            api_key: None,
            timeout_secs: 30,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl FromEnv for QdrantConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = env_or_default("QDRANT_URL", "http://localhost:6334");
        let api_key = env_optional("QDRANT_API_KEY");
        let timeout_secs = env_parse("QDRANT_TIMEOUT_SECS", 30)?;

        Ok(Self {
            url,
            api_key,
            timeout_secs,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new("http://localhost:6334".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("QDRANT_URL", None::<&str>),
                ("QDRANT_API_KEY", None),
                ("QDRANT_TIMEOUT_SECS", None),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert_eq!(config.url, "http://localhost:6334");
                assert!(config.api_key.is_none());
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_from_env_rejects_bad_timeout() {
        temp_env::with_var("QDRANT_TIMEOUT_SECS", Some("thirty"), || {
            let err = QdrantConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("QDRANT_TIMEOUT_SECS"));
        });
    }
}
