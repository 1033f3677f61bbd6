//! Client error types

use serde_json::Value;
use shared::models::{Collection, RecordId};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend answered with a non-success status; `message` is its
    /// human-readable explanation, kept verbatim
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A row did not have the expected shape
    #[error("Invalid {collection} row: {message}")]
    Decode {
        collection: Collection,
        message: String,
    },

    /// Update addressed a row that does not exist
    #[error("{collection} {id} not found")]
    NotFound { collection: Collection, id: RecordId },

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Realtime transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Build a backend error from a failed response body
    ///
    /// Understands the REST error shape (`message`), both auth error shapes
    /// (`msg` / `error_description`) and falls back to the raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| {
                ["message", "msg", "error_description", "error"]
                    .iter()
                    .find_map(|key| v.get(key).and_then(Value::as_str))
            })
            .map(str::to_string)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {status}")
                } else {
                    body.trim().to_string()
                }
            });

        if status == 401 {
            tracing::debug!(message = %message, "Backend rejected credentials");
            return ClientError::Unauthorized;
        }
        ClientError::Backend { status, message }
    }

    /// Human-readable message to surface to the user
    pub fn backend_message(&self) -> String {
        match self {
            ClientError::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Network-level failure (backend unreachable or timed out)
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_connect() || e.is_timeout())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
