//! Client events emitted to registered listeners
//!
//! Every event carries the cache state relevant to it: update events carry a
//! before/after pair of value snapshots taken around the in-place cache
//! mutation, delete events carry the removed snapshot.

use crate::entities::{
    DmChannel, Emoji, Guild, GuildChannel, Member, Message, Role, ScheduledEvent, User,
};
use crate::value_objects::Snowflake;

/// An event dispatched to user listeners
#[derive(Debug, Clone)]
pub enum Event {
    /// Gateway handshake completed; the cache is not yet guaranteed populated
    Connect,
    /// Initial guild snapshots have settled; the client is fully initialized
    Ready,

    /// Full guild snapshot applied (initial catch-up or newly joined)
    GuildCreate(Guild),
    /// Guild became visible while the client was already ready
    GuildJoin(Guild),
    GuildUpdate { before: Guild, after: Guild },
    /// Guild removed after becoming unavailable (server outage)
    GuildDelete(Guild),
    /// The client was removed from the guild
    GuildLeave(Guild),
    /// Guild flagged unavailable ahead of its removal
    GuildAvailable(Guild),

    UserUpdate { before: User, after: User },

    RoleCreate { guild_id: Snowflake, role: Role },
    RoleUpdate { guild_id: Snowflake, before: Option<Role>, after: Role },
    RoleDelete { guild_id: Snowflake, role: Role },

    ChannelCreate { guild_id: Snowflake, channel: GuildChannel },
    ChannelUpdate { guild_id: Snowflake, before: Option<GuildChannel>, after: GuildChannel },
    ChannelDelete { guild_id: Snowflake, channel: GuildChannel },

    DmChannelCreate(DmChannel),

    MemberJoin { guild_id: Snowflake, member: Member },
    MemberUpdate { guild_id: Snowflake, before: Option<Member>, after: Member },
    MemberLeave { guild_id: Snowflake, member: Member },

    EmojisUpdate { guild_id: Snowflake, before: Vec<Emoji>, after: Vec<Emoji> },

    ScheduledEventCreate { guild_id: Snowflake, event: ScheduledEvent },
    ScheduledEventUpdate {
        guild_id: Snowflake,
        before: Option<ScheduledEvent>,
        after: ScheduledEvent,
    },
    ScheduledEventDelete { guild_id: Snowflake, event: ScheduledEvent },

    MessageCreate(Message),
    MessageUpdate { before: Message, after: Message },
    MessageDelete(Message),

    TypingStart { channel_id: Snowflake, user_id: Snowflake },
}

impl Event {
    /// The kind used as the listener registry key
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Connect => EventKind::Connect,
            Self::Ready => EventKind::Ready,
            Self::GuildCreate(_) => EventKind::GuildCreate,
            Self::GuildJoin(_) => EventKind::GuildJoin,
            Self::GuildUpdate { .. } => EventKind::GuildUpdate,
            Self::GuildDelete(_) => EventKind::GuildDelete,
            Self::GuildLeave(_) => EventKind::GuildLeave,
            Self::GuildAvailable(_) => EventKind::GuildAvailable,
            Self::UserUpdate { .. } => EventKind::UserUpdate,
            Self::RoleCreate { .. } => EventKind::RoleCreate,
            Self::RoleUpdate { .. } => EventKind::RoleUpdate,
            Self::RoleDelete { .. } => EventKind::RoleDelete,
            Self::ChannelCreate { .. } => EventKind::ChannelCreate,
            Self::ChannelUpdate { .. } => EventKind::ChannelUpdate,
            Self::ChannelDelete { .. } => EventKind::ChannelDelete,
            Self::DmChannelCreate(_) => EventKind::DmChannelCreate,
            Self::MemberJoin { .. } => EventKind::MemberJoin,
            Self::MemberUpdate { .. } => EventKind::MemberUpdate,
            Self::MemberLeave { .. } => EventKind::MemberLeave,
            Self::EmojisUpdate { .. } => EventKind::EmojisUpdate,
            Self::ScheduledEventCreate { .. } => EventKind::ScheduledEventCreate,
            Self::ScheduledEventUpdate { .. } => EventKind::ScheduledEventUpdate,
            Self::ScheduledEventDelete { .. } => EventKind::ScheduledEventDelete,
            Self::MessageCreate(_) => EventKind::MessageCreate,
            Self::MessageUpdate { .. } => EventKind::MessageUpdate,
            Self::MessageDelete(_) => EventKind::MessageDelete,
            Self::TypingStart { .. } => EventKind::TypingStart,
        }
    }
}

/// Registry key for listener registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Ready,
    GuildCreate,
    GuildJoin,
    GuildUpdate,
    GuildDelete,
    GuildLeave,
    GuildAvailable,
    UserUpdate,
    RoleCreate,
    RoleUpdate,
    RoleDelete,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    DmChannelCreate,
    MemberJoin,
    MemberUpdate,
    MemberLeave,
    EmojisUpdate,
    ScheduledEventCreate,
    ScheduledEventUpdate,
    ScheduledEventDelete,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    TypingStart,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_mapping() {
        assert_eq!(Event::Connect.kind(), EventKind::Connect);
        assert_eq!(Event::Ready.kind(), EventKind::Ready);
        assert_eq!(
            Event::TypingStart {
                channel_id: Snowflake::new(1),
                user_id: Snowflake::new(2)
            }
            .kind(),
            EventKind::TypingStart
        );
    }
}
