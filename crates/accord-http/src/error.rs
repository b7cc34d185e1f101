//! REST transport error types

/// Errors surfaced by the REST transport
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// 404 - the requested resource does not exist
    #[error("Resource not found: {body}")]
    NotFound { body: String },

    /// 401 or 403 - missing or insufficient authorization
    #[error("Forbidden: {body}")]
    Forbidden { body: String },

    /// Non-retriable failure, or retries exhausted on a transient one
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// Transport-level failure (DNS, TLS, connection) outside the retry window
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A request was attempted before `set_token` was called
    #[error("No authentication token configured")]
    MissingToken,
}

impl HttpError {
    /// Check if this is a client error (4xx) that callers caused
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Forbidden { .. })
    }

    /// The raw server response body, when one was captured
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::NotFound { body } | Self::Forbidden { body } | Self::RequestFailed { body, .. } => {
                Some(body)
            }
            _ => None,
        }
    }
}
