//! # accord-core
//!
//! Domain layer containing entity types, value objects, and the client event
//! enum. This crate has zero dependencies on infrastructure (HTTP, WebSocket,
//! async runtime, etc.).

pub mod entities;
pub mod events;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    ChannelType, DmChannel, Emoji, Guild, GuildChannel, GuildPayload, Member, Message, Role,
    ScheduledEvent, User,
};
pub use events::{Event, EventKind};
pub use value_objects::{GatewayIntents, Snowflake, SnowflakeParseError};
