//! Error types for the farm API client.
//!
//! # Design
//! Errors are passed through exactly as the transport and server produce them.
//! Every non-2xx response lands in `Status` with the raw code and body; the
//! client never reinterprets a status into a domain error. A 401 is acted on
//! by the session-expiry middleware but still reaches the caller here.

use thiserror::Error;

/// Errors produced by the durable session store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors returned by `ApiClient::send` and every endpoint function.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    /// HTTP status of a server-side failure, if there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Human-readable message from a JSON error body (`message`, then `error`,
    /// then `detail`), for views that surface the server's own wording.
    pub fn server_message(&self) -> Option<String> {
        let ApiError::Status { body, .. } = self else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()))
            .map(str::to_string)
    }
}
