//! Entity types built from decoded gateway and REST payloads
//!
//! Entities are created on first observation (gateway snapshot or REST
//! fetch) and mutated in place by subsequent partial events via their
//! `update_from` methods, preserving the cache mapping slot.

mod channel;
mod emoji;
mod guild;
mod member;
mod message;
mod role;
mod scheduled_event;
mod user;

pub use channel::{ChannelType, DmChannel, GuildChannel};
pub use emoji::Emoji;
pub use guild::{Guild, GuildPayload};
pub use member::Member;
pub use message::Message;
pub use role::Role;
pub use scheduled_event::ScheduledEvent;
pub use user::User;
