use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for repo2resume
#[derive(Error, Debug)]
pub enum AppError {
    /// Upstream rejected our credential (invalid or expired token)
    #[error("{0}")]
    UpstreamAuth(String),

    /// Upstream throttled the request
    #[error("{0}")]
    UpstreamRateLimit(String),

    /// Unknown or inaccessible repository/resource
    #[error("{0}")]
    NotFound(String),

    /// Any other failure reported by GitHub or the language model
    #[error("{0}")]
    Upstream(String),

    /// Malformed input from the caller
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Transport-level HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// Result type alias for repo2resume operations
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new generic upstream error
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        Self::Upstream(msg.into())
    }

    /// HTTP status this error is reported with at the API boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamRateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamAuth(_) | Self::Upstream(_) | Self::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        } else {
            tracing::warn!(%status, error = %self, "request rejected");
        }

        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
