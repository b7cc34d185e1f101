//! Typed payload bodies for the gateway handshake

use serde::{Deserialize, Serialize};

/// Server Hello payload carrying the heartbeat cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Platform properties reported during identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionProperties {
    #[serde(rename = "$os")]
    pub os: String,
    #[serde(rename = "$browser")]
    pub browser: String,
    #[serde(rename = "$device")]
    pub device: String,
}

impl Default for ConnectionProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "accord".to_string(),
            device: "accord".to_string(),
        }
    }
}

/// Identify payload opening a fresh session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    pub token: String,
    pub intents: u64,
    pub properties: ConnectionProperties,
    pub compress: bool,
}

impl IdentifyPayload {
    #[must_use]
    pub fn new(token: impl Into<String>, intents: u64, compress: bool) -> Self {
        Self {
            token: token.into(),
            intents,
            properties: ConnectionProperties::default(),
            compress,
        }
    }
}

/// Resume payload reviving a dropped session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumePayload {
    pub token: String,
    pub session_id: String,
    pub seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_use_dollar_keys() {
        let props = ConnectionProperties::default();
        let value = serde_json::to_value(&props).unwrap();
        assert!(value.get("$os").is_some());
        assert!(value.get("$browser").is_some());
        assert!(value.get("$device").is_some());
        assert!(value.get("os").is_none());
    }

    #[test]
    fn test_identify_round_trip() {
        let identify = IdentifyPayload::new("token", 53_608_447, true);
        let value = serde_json::to_value(&identify).unwrap();
        assert_eq!(value["token"], "token");
        assert_eq!(value["intents"], 53_608_447);
        assert_eq!(value["compress"], true);
    }

    #[test]
    fn test_hello_parsing() {
        let hello: HelloPayload =
            serde_json::from_str(r#"{"heartbeat_interval": 41250}"#).unwrap();
        assert_eq!(hello.heartbeat_interval, 41_250);
    }
}
