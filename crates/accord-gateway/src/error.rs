//! Gateway error types

use thiserror::Error;

/// Errors raised by the gateway connection
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("websocket error: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("frame decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("decompression error: {0}")]
    Compression(String),

    #[error("connection closed")]
    Closed,
}
