//! Client error types

use thiserror::Error;

/// Errors surfaced by the client facade
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] accord_http::HttpError),

    #[error(transparent)]
    Gateway(#[from] accord_gateway::GatewayError),

    #[error(transparent)]
    Config(#[from] accord_common::ConfigError),

    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no event matched within the wait window")]
    WaitTimeout,

    #[error("not logged in; call login first")]
    NotLoggedIn,

    #[error("response body was empty where an entity was expected")]
    EmptyResponse,
}
