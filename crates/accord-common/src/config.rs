//! Client configuration
//!
//! Loads configuration from environment variables, with sensible defaults
//! for every knob so a bare `ClientConfig::default()` talks to the public
//! platform endpoints.

use serde::Deserialize;
use std::env;

/// Main client configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub rest: RestConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RestConfig {
    /// Versioned HTTPS base URL for REST calls
    #[serde(default = "default_api_base")]
    pub base_url: String,
    /// Bounded attempt count for transient failures (429, 5xx, resets)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Gateway connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Protocol version appended to the gateway URL
    #[serde(default = "default_gateway_version")]
    pub version: u8,
    /// Request zlib-stream transport compression
    #[serde(default = "default_compress")]
    pub compress: bool,
    /// Quiet-period window for the ready quorum, in milliseconds
    #[serde(default = "default_ready_quorum_ms")]
    pub ready_quorum_ms: u64,
    /// Allowed heartbeat-ack drift beyond the interval before warning, in seconds
    #[serde(default = "default_drift_threshold_secs")]
    pub drift_threshold_secs: u64,
    /// Cap for the exponential reconnect backoff, in seconds
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
}

/// In-memory cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Hard capacity of the message cache; reaching it clears the whole map
    #[serde(default = "default_message_capacity")]
    pub message_capacity: usize,
}

// Default value functions
fn default_api_base() -> String {
    "https://discord.com/api/v9".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_gateway_version() -> u8 {
    9
}

fn default_compress() -> bool {
    true
}

fn default_ready_quorum_ms() -> u64 {
    5_000
}

fn default_drift_threshold_secs() -> u64 {
    5
}

fn default_max_backoff_secs() -> u64 {
    64
}

fn default_message_capacity() -> usize {
    1_000
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: default_gateway_version(),
            compress: default_compress(),
            ready_quorum_ms: default_ready_quorum_ms(),
            drift_threshold_secs: default_drift_threshold_secs(),
            max_backoff_secs: default_max_backoff_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            message_capacity: default_message_capacity(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            rest: RestConfig {
                base_url: env::var("ACCORD_API_BASE").unwrap_or_else(|_| default_api_base()),
                max_retries: parse_var("ACCORD_MAX_RETRIES", default_max_retries())?,
            },
            gateway: GatewayConfig {
                version: parse_var("ACCORD_GATEWAY_VERSION", default_gateway_version())?,
                compress: parse_var("ACCORD_GATEWAY_COMPRESS", default_compress())?,
                ready_quorum_ms: parse_var("ACCORD_READY_QUORUM_MS", default_ready_quorum_ms())?,
                drift_threshold_secs: parse_var(
                    "ACCORD_HEARTBEAT_DRIFT_SECS",
                    default_drift_threshold_secs(),
                )?,
                max_backoff_secs: parse_var("ACCORD_MAX_BACKOFF_SECS", default_max_backoff_secs())?,
            },
            cache: CacheConfig {
                message_capacity: parse_var(
                    "ACCORD_MESSAGE_CACHE_CAPACITY",
                    default_message_capacity(),
                )?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
