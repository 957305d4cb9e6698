//! Client error types

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Bad request
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        body: Option<Value>,
    },

    /// Authentication failed
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        message: String,
        body: Option<Value>,
    },

    /// Forbidden
    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        body: Option<Value>,
    },

    /// Resource not found
    #[error("Resource not found: {message}")]
    NotFound {
        message: String,
        body: Option<Value>,
    },

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError {
        status: u16,
        message: String,
        body: Option<Value>,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Transport-level failure not raised by reqwest
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response interceptor failed while handling an error response
    #[error("{0}")]
    Interceptor(#[source] Arc<dyn std::error::Error + Send + Sync>),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String, body: Option<Value>) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest { message, body },
            401 => Self::AuthenticationFailed { message, body },
            403 => Self::Forbidden { message, body },
            404 => Self::NotFound { message, body },
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
                body,
            },
        }
    }

    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { .. } => Some(400),
            Self::AuthenticationFailed { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the server rejected the request's credentials
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Parsed JSON body of an error response
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::BadRequest { body, .. }
            | Self::AuthenticationFailed { body, .. }
            | Self::Forbidden { body, .. }
            | Self::NotFound { body, .. }
            | Self::ServerError { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}
