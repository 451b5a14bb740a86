//! # Error Handling Module
//!
//! This module provides error handling for the authentication gateway using the
//! `thiserror` crate. It defines the configuration-time and transport-level error
//! types and their HTTP status code mappings.
//!
//! Request-time authentication failures (malformed header, wrong credential) are
//! deliberately NOT represented here: they are recovered locally by producing a
//! reject [`Decision`](crate::auth::validator::Decision) and never propagate as
//! process-level errors. Only the outcome and scheme are ever logged for those.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main result type used throughout the gateway
///
/// This is a type alias that makes error handling more ergonomic.
/// Instead of writing `Result<T, GatewayError>` everywhere, we can use `GatewayResult<T>`.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Error types for the authentication gateway
///
/// Each variant represents a different category of error that can occur.
/// The `#[error("...")]` attribute from `thiserror` automatically implements
/// the `Display` trait with the specified error message.
///
/// Credential errors carry only the offending key NAME. Secret values must
/// never appear in an error message or a log line.
#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    /// A required credential key was absent from the credential source
    #[error("Missing credential: required key '{key}' is not set")]
    MissingCredential { key: String },

    /// A supplied secret still carries its documented placeholder value
    #[error("Placeholder credential: key '{key}' still has its placeholder value, refusing to start")]
    PlaceholderCredential { key: String },

    /// A listener port has no configured authentication scheme
    #[error("Unknown port: no authentication scheme configured for port {port}")]
    UnknownPort { port: u16 },

    /// Configuration-related errors (invalid config, missing files, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// I/O errors (file operations, network errors, etc.)
    #[error("I/O error: {message}")]
    Io { message: String },

    /// YAML parsing errors for configuration files
    #[error("YAML error: {message}")]
    Yaml { message: String },

    /// HTTP client errors when forwarding upstream requests
    #[error("HTTP client error: {message}")]
    HttpClient { message: String },

    /// Internal server errors for unexpected failures
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Create a missing credential error for the given key name
    pub fn missing_credential<S: Into<String>>(key: S) -> Self {
        Self::MissingCredential { key: key.into() }
    }

    /// Create a placeholder credential error for the given key name
    pub fn placeholder_credential<S: Into<String>>(key: S) -> Self {
        Self::PlaceholderCredential { key: key.into() }
    }

    /// Create an unknown port error
    pub fn unknown_port(port: u16) -> Self {
        Self::UnknownPort { port }
    }

    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the appropriate HTTP status code for this error
    ///
    /// Configuration-time errors are only ever seen during startup, so their
    /// mapping is nominal; the one that matters at request time is the
    /// upstream client failure, which surfaces as a bad gateway.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCredential { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PlaceholderCredential { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnknownPort { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Yaml { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::HttpClient { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error is fatal at startup (the gateway must not serve traffic)
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. }
                | Self::PlaceholderCredential { .. }
                | Self::Configuration { .. }
                | Self::Yaml { .. }
        )
    }

    /// Get a string representation of the error type for log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::PlaceholderCredential { .. } => "placeholder_credential",
            Self::UnknownPort { .. } => "unknown_port",
            Self::Configuration { .. } => "configuration_error",
            Self::Io { .. } => "io_error",
            Self::Yaml { .. } => "yaml_error",
            Self::HttpClient { .. } => "http_client_error",
            Self::Internal { .. } => "internal_error",
        }
    }
}

/// Implement conversion from std::io::Error
impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Implement conversion from serde_yaml::Error
impl From<serde_yaml::Error> for GatewayError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml {
            message: err.to_string(),
        }
    }
}

/// Implement conversion from reqwest::Error
impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpClient {
            message: err.to_string(),
        }
    }
}

/// Implement `IntoResponse` so handlers can bubble errors with `?`
///
/// Unlike the rejection path, which intentionally carries no body, transport
/// errors respond with the plain error type name. Credential material never
/// reaches an error message, so nothing here can leak.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_response = json!({
            "error": {
                "code": status.as_u16(),
                "type": self.error_type(),
            }
        });

        (status, Json(error_response)).into_response()
    }
}
