//! Gateway message frame

use super::opcode::OpCode;
use super::payloads::{IdentifyPayload, ResumePayload};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single frame on the gateway connection.
///
/// Every frame carries an op code; dispatch frames additionally carry an
/// event name (`t`) and a sequence number (`s`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub op: OpCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayMessage {
    /// Heartbeat frame carrying the last observed sequence number
    #[must_use]
    pub fn heartbeat(sequence: Option<u64>) -> Self {
        Self {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: Some(sequence.map_or(Value::Null, |s| json!(s))),
        }
    }

    /// Identify frame opening a fresh session
    #[must_use]
    pub fn identify(payload: &IdentifyPayload) -> Self {
        Self {
            op: OpCode::Identify,
            t: None,
            s: None,
            d: serde_json::to_value(payload).ok(),
        }
    }

    /// Resume frame reviving a dropped session
    #[must_use]
    pub fn resume(payload: &ResumePayload) -> Self {
        Self {
            op: OpCode::Resume,
            t: None,
            s: None,
            d: serde_json::to_value(payload).ok(),
        }
    }

    /// Serialize to a JSON string for the wire
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a frame from wire JSON
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.t {
            Some(event) => write!(f, "{} [{event}]", self.op),
            None => write!(f, "{}", self.op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_frame() {
        let frame = GatewayMessage::heartbeat(Some(42));
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["op"], 1);
        assert_eq!(value["d"], 42);
        assert!(value.get("t").is_none());

        // No sequence yet - a null payload, not a missing one
        let fresh = GatewayMessage::heartbeat(None);
        let value = serde_json::to_value(&fresh).unwrap();
        assert!(value["d"].is_null());
    }

    #[test]
    fn test_dispatch_frame_parsing() {
        let raw = r#"{"op":0,"t":"MESSAGE_CREATE","s":7,"d":{"id":"1"}}"#;
        let frame = GatewayMessage::from_json(raw).unwrap();
        assert_eq!(frame.op, OpCode::Dispatch);
        assert_eq!(frame.t.as_deref(), Some("MESSAGE_CREATE"));
        assert_eq!(frame.s, Some(7));
        assert!(frame.d.is_some());
    }

    #[test]
    fn test_hello_frame_parsing() {
        let raw = r#"{"op":10,"d":{"heartbeat_interval":41250}}"#;
        let frame = GatewayMessage::from_json(raw).unwrap();
        assert_eq!(frame.op, OpCode::Hello);
        assert_eq!(frame.s, None);
    }

    #[test]
    fn test_malformed_frame_is_an_error() {
        assert!(GatewayMessage::from_json("not json").is_err());
        assert!(GatewayMessage::from_json(r#"{"op":99}"#).is_err());
    }
}
