//! Gateway wire protocol - op codes, message frame, and payloads

mod message;
mod opcode;
mod payloads;

pub use message::GatewayMessage;
pub use opcode::OpCode;
pub use payloads::{ConnectionProperties, HelloPayload, IdentifyPayload, ResumePayload};
