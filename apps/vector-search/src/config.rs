//! Application configuration loaded from the environment

use std::time::Duration;

use core_config::{ConfigError, Environment, FromEnv, env_optional, env_or_default, env_parse};
use domain_vector_search::{
    AzureInferenceConfig, DEFAULT_CALL_TIMEOUT, ImageSourceConfig, OllamaConfig, QdrantConfig,
};

/// Where the HTTP server listens
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl HttpConfig {
    /// `host:port`, as accepted by `TcpListener::bind`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl FromEnv for HttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: env_or_default("HOST", &defaults.host),
            port: env_parse("PORT", defaults.port)?,
        })
    }
}

/// Which vector index backs the collections
#[derive(Debug, Clone, PartialEq)]
pub enum IndexBackend {
    Qdrant(QdrantConfig),
    Memory,
}

impl FromEnv for IndexBackend {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = env_or_default("INDEX_BACKEND", "qdrant");
        match backend.trim().to_ascii_lowercase().as_str() {
            "qdrant" => Ok(IndexBackend::Qdrant(QdrantConfig::from_env()?)),
            "memory" => Ok(IndexBackend::Memory),
            other => Err(ConfigError::ParseError {
                key: "INDEX_BACKEND".to_string(),
                details: format!("expected 'qdrant' or 'memory', got '{}'", other),
            }),
        }
    }
}

/// Settings for the images collection
#[derive(Debug, Clone, PartialEq)]
pub struct ImagesConfig {
    pub inference: AzureInferenceConfig,
    pub source: ImageSourceConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub http: HttpConfig,
    pub index: IndexBackend,
    pub ollama: OllamaConfig,
    /// `None` when no image-embedding endpoint is configured
    pub images: Option<ImagesConfig>,
    pub call_timeout: Duration,
}

impl FromEnv for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::from_env())
    }
}

impl AppConfig {
    /// Load the rest of the configuration for an already detected environment
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        // The images collection is opt-in: an endpoint switches it on, then the rest is required
        let images = match env_optional("AZURE_AI_INFERENCE_ENDPOINT") {
            Some(_) => Some(ImagesConfig {
                inference: AzureInferenceConfig::from_env()?,
                source: ImageSourceConfig::from_env()?,
            }),
            None => None,
        };

        let call_timeout = Duration::from_secs(env_parse(
            "EXTERNAL_CALL_TIMEOUT_SECS",
            DEFAULT_CALL_TIMEOUT.as_secs(),
        )?);

        Ok(Self {
            environment,
            http: HttpConfig::from_env()?,
            index: IndexBackend::from_env()?,
            ollama: OllamaConfig::from_env()?,
            images,
            call_timeout,
        })
    }
}
