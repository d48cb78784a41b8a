//! Error types for the common library.
//!
//! This module provides a unified error hierarchy using `thiserror` so that the
//! protocol layer can turn any failure into an actionable message for the caller.
//!
//! # Error Categories
//!
//! - `ConfigError`: Missing or invalid configuration (fatal at startup)
//! - `Error::Validation`: Missing or empty tool arguments
//! - `Error::Upstream`: OpenAI API errors, classified by [`UpstreamErrorKind`]
//! - `Error::Filesystem`: The destination file could not be written
//! - `Error::Decode`: An inline image payload was not valid base64
//! - `Error::Timeout`: The upstream request did not finish in time

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the common library.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (missing env vars, invalid values)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upstream API errors with endpoint and HTTP status context.
    ///
    /// A `status_code` of 0 means no HTTP response was received.
    #[error("{kind} (HTTP {status_code} from {endpoint}): {message}")]
    Upstream {
        /// Classification of the failure
        kind: UpstreamErrorKind,
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API
        status_code: u16,
        /// Error message from the API or describing the failure
        message: String,
    },

    /// Writing an output file failed
    #[error("Failed to write image to {}: {source}", path.display())]
    Filesystem {
        /// Destination that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An inline image payload could not be decoded
    #[error("Invalid image payload: {0}")]
    Decode(String),

    /// Operation timeout errors
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

impl Error {
    /// Create an upstream error, classifying it from the HTTP status.
    ///
    /// The OpenAI error envelope (`{"error": {"message": ...}}`) is unwrapped
    /// when `message` holds one, so callers can pass a raw response body.
    ///
    /// # Example
    ///
    /// ```
    /// use openai_image_mcp_common::error::{Error, UpstreamErrorKind};
    ///
    /// let err = Error::api(
    ///     "https://api.openai.com/v1/images/generations",
    ///     401,
    ///     r#"{"error": {"message": "Incorrect API key provided"}}"#,
    /// );
    /// assert_eq!(err.upstream_kind(), Some(UpstreamErrorKind::Authentication));
    /// assert!(err.to_string().contains("Incorrect API key provided"));
    /// ```
    pub fn api(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        Error::Upstream {
            kind: UpstreamErrorKind::from_status(status_code),
            endpoint: endpoint.into(),
            status_code,
            message: extract_api_message(&message).unwrap_or(message),
        }
    }

    /// Create an upstream error for a request that never got a response.
    pub fn network(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Upstream {
            kind: UpstreamErrorKind::Network,
            endpoint: endpoint.into(),
            status_code: 0,
            message: message.into(),
        }
    }

    /// Create an upstream error for a response that could not be understood.
    pub fn invalid_response(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Error::Upstream {
            kind: UpstreamErrorKind::InvalidResponse,
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new validation error.
    ///
    /// # Example
    ///
    /// ```
    /// use openai_image_mcp_common::error::Error;
    ///
    /// let err = Error::validation("prompt is required");
    /// assert!(err.to_string().contains("prompt is required"));
    /// ```
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create a filesystem error for `path`.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Create a new decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode(message.into())
    }

    /// Create a new timeout error.
    pub fn timeout(seconds: u64) -> Self {
        Error::Timeout(seconds)
    }

    /// The upstream classification, if this is an upstream error.
    pub fn upstream_kind(&self) -> Option<UpstreamErrorKind> {
        match self {
            Error::Upstream { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Classification of upstream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    /// 401: the API key was rejected
    Authentication,
    /// 403: the key lacks access to the model or organization
    PermissionDenied,
    /// 404: unknown model or endpoint
    NotFound,
    /// 400/422: invalid parameter or parameter combination
    InvalidRequest,
    /// 429: rate limit or quota exhausted
    RateLimited,
    /// 5xx: the provider failed
    Server,
    /// The provider could not be reached
    Network,
    /// Unexpected status or a body that could not be parsed
    InvalidResponse,
}

impl UpstreamErrorKind {
    /// Classify an HTTP status code. `0` means the request never completed.
    pub fn from_status(status_code: u16) -> Self {
        match status_code {
            0 => UpstreamErrorKind::Network,
            400 | 422 => UpstreamErrorKind::InvalidRequest,
            401 => UpstreamErrorKind::Authentication,
            403 => UpstreamErrorKind::PermissionDenied,
            404 => UpstreamErrorKind::NotFound,
            429 => UpstreamErrorKind::RateLimited,
            500..=599 => UpstreamErrorKind::Server,
            _ => UpstreamErrorKind::InvalidResponse,
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UpstreamErrorKind::RateLimited | UpstreamErrorKind::Server | UpstreamErrorKind::Network
        )
    }
}

impl std::fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamErrorKind::Authentication => write!(
                f,
                "Authentication failed: the OpenAI API rejected the credentials (check OPENAI_API_KEY)"
            ),
            UpstreamErrorKind::PermissionDenied => write!(
                f,
                "Permission denied: the API key has no access to this model or organization"
            ),
            UpstreamErrorKind::NotFound => write!(f, "Not found: unknown model or endpoint"),
            UpstreamErrorKind::InvalidRequest => write!(
                f,
                "Invalid request: the API rejected the parameters for this model"
            ),
            UpstreamErrorKind::RateLimited => write!(
                f,
                "Rate limited: too many requests or quota exceeded, retry later"
            ),
            UpstreamErrorKind::Server => write!(f, "OpenAI server error, retry later"),
            UpstreamErrorKind::Network => write!(f, "Network error: could not reach the OpenAI API"),
            UpstreamErrorKind::InvalidResponse => write!(f, "Unexpected response from the OpenAI API"),
        }
    }
}

/// Pull `error.message` out of an OpenAI error body.
fn extract_api_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Configuration errors.
///
/// These errors occur when loading or validating configuration from
/// environment variables. They are fatal: the server exits before serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Required environment variable {0} is not set")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new missing environment variable error.
    pub fn missing_env_var(name: impl Into<String>) -> Self {
        ConfigError::MissingEnvVar(name.into())
    }

    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;
