//! Configuration module for loading environment variables and settings.

use crate::error::ConfigError;

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default upstream request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Expected prefix of an OpenAI API key.
pub const API_KEY_PREFIX: &str = "sk-";

/// Application configuration loaded from environment variables.
///
/// The API key is injected into the image handler at construction; nothing
/// reads the environment after startup.
#[derive(Clone)]
pub struct Config {
    /// OpenAI API key (required)
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API, without trailing slash
    pub base_url: String,
    /// Optional OpenAI organization ID sent as `OpenAI-Organization`
    pub organization: Option<String>,
    /// Upstream request timeout in seconds
    pub request_timeout_secs: u64,
    /// HTTP server port
    pub port: u16,
}

impl Config {
    /// Build a configuration with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            organization: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            port: 8080,
        }
    }

    /// Point the configuration at another API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load configuration from environment variables and .env file.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingEnvVar` if OPENAI_API_KEY is not set or blank,
    /// and `ConfigError::InvalidValue` if OPENAI_TIMEOUT_SECS is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::missing_env_var("OPENAI_API_KEY"))?;

        if !has_expected_key_shape(&api_key) {
            tracing::warn!(
                "OPENAI_API_KEY does not start with '{}'; requests will likely be rejected",
                API_KEY_PREFIX
            );
        }

        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let organization = std::env::var("OPENAI_ORGANIZATION")
            .ok()
            .filter(|org| !org.trim().is_empty());

        let request_timeout_secs = match std::env::var("OPENAI_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Ok(Self {
            organization,
            request_timeout_secs,
            port,
            ..Self::new(api_key).with_base_url(base_url)
        })
    }

    /// Endpoint for image generation requests.
    pub fn images_endpoint(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("port", &self.port)
            .finish()
    }
}

/// Whether the key looks like an OpenAI secret key.
pub fn has_expected_key_shape(api_key: &str) -> bool {
    api_key.starts_with(API_KEY_PREFIX) && api_key.len() > API_KEY_PREFIX.len()
}

/// Keep the key prefix for diagnostics and hide the rest.
pub fn redact(api_key: &str) -> String {
    let visible: String = api_key.chars().take(API_KEY_PREFIX.len()).collect();
    format!("{}***", visible)
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::invalid_value(
            "OPENAI_TIMEOUT_SECS",
            format!("expected a positive number of seconds, got '{}'", raw),
        )),
    }
}
