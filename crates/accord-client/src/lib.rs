//! # accord-client
//!
//! The user-facing facade: login, gateway connection, listener registration,
//! and REST helpers that keep the cache synchronized with server responses.

mod client;
mod error;
pub mod listeners;
pub mod parser;

pub use client::Client;
pub use error::ClientError;
pub use listeners::{Callback, Listener, ListenerRegistry};
pub use parser::{EventParser, ReadyState};

// Re-export the pieces callers need to drive the client
pub use accord_common::ClientConfig;
pub use accord_core::{Event, EventKind, GatewayIntents, Snowflake};
pub use accord_http::{FileAttachment, RequestOptions};
