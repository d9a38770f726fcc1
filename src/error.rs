//! Error types for opennebula-exporter
//!
//! This module defines the error types used throughout the application.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Reasons a label rule is dropped from a render pass
#[derive(Error, Debug)]
pub enum RuleError {
    /// Name-regex rule whose pattern does not compile
    #[error("Invalid regex pattern '{pattern}' for label '{label}': {source}")]
    InvalidPattern {
        label: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Template-field rule without a field name
    #[error("Empty template field for label '{label}'")]
    EmptyTemplateField { label: String },
}

impl RuleError {
    /// Label key of the rule that was dropped
    pub fn label(&self) -> &str {
        match self {
            RuleError::InvalidPattern { label, .. } => label,
            RuleError::EmptyTemplateField { label } => label,
        }
    }
}

/// Inventory fetch errors
#[derive(Error, Debug)]
pub enum CollectorError {
    /// HTTP client construction failed
    #[error("Failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[source] reqwest::Error),

    /// Reading the HTTP response body failed
    #[error("Failed to read HTTP response: {0}")]
    HttpResponse(#[source] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    /// Authentication rejected by the control plane
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Body is not valid JSON or does not match the pool document
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Pool document parsed but carries an unusable value
    #[error("Malformed VM pool document: {0}")]
    MalformedPool(String),

    /// Request timed out
    #[error("Request timed out{}", .0.map(|ms| format!(" after {}ms", ms)).unwrap_or_default())]
    Timeout(Option<u64>),

    /// Connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

impl CollectorError {
    /// HTTP status code carried by the error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CollectorError::HttpStatus(code) => Some(*code),
            CollectorError::AuthenticationFailed => Some(401),
            _ => None,
        }
    }

    /// Create a Timeout error with known duration
    pub fn timeout_with_duration(ms: u64) -> Self {
        CollectorError::Timeout(Some(ms))
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured timeout here
            CollectorError::Timeout(None)
        } else if err.is_connect() {
            CollectorError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            CollectorError::HttpRequest(err)
        } else {
            CollectorError::HttpResponse(err)
        }
    }
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Inventory fetch error
    #[error("Collector error: {0}")]
    Collector(#[from] CollectorError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, public_message, log_message) = match self {
            AppError::Collector(e) => (StatusCode::BAD_GATEWAY, "Upstream error", e.to_string()),
        };

        tracing::error!(status = %status, error = %log_message, "Request failed");

        (status, public_message).into_response()
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
