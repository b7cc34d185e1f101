//! # accord-gateway
//!
//! The persistent duplex event-stream connection: websocket handshake,
//! zlib-stream decompression, heartbeat liveness, and the reconnect/resume
//! state machine. Dispatch records are forwarded in arrival order to a
//! single consumer channel.

mod compression;
mod connection;
mod error;
mod heartbeat;
pub mod protocol;
mod session;

pub use compression::Inflater;
pub use connection::{ConnectionState, DispatchRecord, GatewayConnection};
pub use error::GatewayError;
pub use session::SessionState;
