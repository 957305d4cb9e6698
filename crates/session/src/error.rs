//! Session error types

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tollgate_http::ClientError;

/// Standard result type for session operations
pub type Result<T, E = SessionError> = std::result::Result<T, E>;

/// Errors raised by session operations.
///
/// `Clone` so that one shared refresh outcome can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The HTTP collaborator failed
    #[error(transparent)]
    Client(Arc<ClientError>),

    /// A refresh was requested but no refresh token is held
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The token endpoint answered without the expected field
    #[error("Response did not contain a `{0}` token")]
    MissingToken(String),

    /// `install` was called without a required collaborator
    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// The session was looked up before the plugin was installed
    #[error("Auth plugin is not installed")]
    NotInstalled,

    /// The refresh task panicked or was aborted before producing a token
    #[error("Token refresh did not complete: {0}")]
    RefreshAborted(String),

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ClientError> for SessionError {
    fn from(err: ClientError) -> Self {
        Self::Client(Arc::new(err))
    }
}

impl From<config::ConfigError> for SessionError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl SessionError {
    /// Whether the underlying HTTP call was rejected with 401
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Client(err) if err.is_unauthorized())
    }

    /// JSON body of the failing response, if there was one
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Client(err) => err.body(),
            _ => None,
        }
    }

    /// Human-readable message taken from the response body's `detail` or
    /// `message` field, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.body()
            .and_then(|body| {
                ["detail", "message"]
                    .iter()
                    .find_map(|field| body.get(*field).and_then(Value::as_str))
            })
            .filter(|message| !message.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}
