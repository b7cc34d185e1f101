//! Guild entity - a server with its nested collections
//!
//! A guild owns maps of channels, members, roles, emojis, and scheduled
//! events. These are only as complete as the last full snapshot (GUILD_CREATE)
//! plus incremental deltas applied since.

use std::collections::HashMap;

use crate::entities::{Emoji, GuildChannel, Member, Role, ScheduledEvent};
use crate::value_objects::Snowflake;
use serde::Deserialize;

/// The wire shape of a full guild snapshot or a scalar-only guild update
#[derive(Debug, Clone, Deserialize)]
pub struct GuildPayload {
    pub id: Snowflake,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Snowflake>,
    #[serde(default)]
    pub unavailable: Option<bool>,
    #[serde(default)]
    pub member_count: Option<u64>,
    #[serde(default)]
    pub channels: Vec<GuildChannel>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    #[serde(default)]
    pub guild_scheduled_events: Vec<ScheduledEvent>,
}

/// Guild (server) entity with its nested collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<Snowflake>,
    pub unavailable: bool,
    pub member_count: Option<u64>,
    pub channels: HashMap<Snowflake, GuildChannel>,
    pub members: HashMap<Snowflake, Member>,
    pub roles: HashMap<Snowflake, Role>,
    pub emojis: HashMap<Snowflake, Emoji>,
    pub scheduled_events: HashMap<Snowflake, ScheduledEvent>,
}

impl Guild {
    /// Build a guild from a full snapshot payload
    #[must_use]
    pub fn from_payload(payload: GuildPayload) -> Self {
        Self {
            id: payload.id,
            name: payload.name,
            icon: payload.icon,
            description: payload.description,
            owner_id: payload.owner_id,
            unavailable: payload.unavailable.unwrap_or(false),
            member_count: payload.member_count,
            channels: payload.channels.into_iter().map(|c| (c.id, c)).collect(),
            members: payload.members.into_iter().map(|m| (m.id(), m)).collect(),
            roles: payload.roles.into_iter().map(|r| (r.id, r)).collect(),
            emojis: payload.emojis.into_iter().map(|e| (e.id, e)).collect(),
            scheduled_events: payload
                .guild_scheduled_events
                .into_iter()
                .map(|e| (e.id, e))
                .collect(),
        }
    }

    /// Apply a scalar guild update in place.
    ///
    /// Update payloads never carry the nested collections, so only the
    /// scalar fields are replaced; channels/members/roles/emojis/events
    /// keep whatever the last snapshot plus deltas produced.
    pub fn update_from(&mut self, payload: GuildPayload) {
        self.name = payload.name;
        self.icon = payload.icon;
        self.description = payload.description;
        if payload.owner_id.is_some() {
            self.owner_id = payload.owner_id;
        }
        if let Some(unavailable) = payload.unavailable {
            self.unavailable = unavailable;
        }
        if payload.member_count.is_some() {
            self.member_count = payload.member_count;
        }
    }

    /// Check if a user is the guild owner
    #[inline]
    #[must_use]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == Some(user_id)
    }

    /// Look up a channel by ID
    #[must_use]
    pub fn channel(&self, id: Snowflake) -> Option<&GuildChannel> {
        self.channels.get(&id)
    }

    /// Look up a member by user ID
    #[must_use]
    pub fn member(&self, id: Snowflake) -> Option<&Member> {
        self.members.get(&id)
    }

    /// Look up a role by ID
    #[must_use]
    pub fn role(&self, id: Snowflake) -> Option<&Role> {
        self.roles.get(&id)
    }

    /// Look up an emoji by ID
    #[must_use]
    pub fn emoji(&self, id: Snowflake) -> Option<&Emoji> {
        self.emojis.get(&id)
    }

    /// Look up a scheduled event by ID
    #[must_use]
    pub fn scheduled_event(&self, id: Snowflake) -> Option<&ScheduledEvent> {
        self.scheduled_events.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_json() -> &'static str {
        r#"{
            "id": "100",
            "name": "Test Guild",
            "owner_id": "1",
            "roles": [{"id": "1", "name": "admin"}],
            "channels": [{"id": "5", "name": "general", "type": 0}],
            "members": [{"user": {"id": "3", "username": "dave"}}]
        }"#
    }

    #[test]
    fn test_guild_from_snapshot() {
        let payload: GuildPayload = serde_json::from_str(snapshot_json()).unwrap();
        let guild = Guild::from_payload(payload);

        assert_eq!(guild.id, Snowflake::new(100));
        assert_eq!(guild.name, "Test Guild");
        assert!(guild.is_owner(Snowflake::new(1)));
        assert_eq!(guild.role(Snowflake::new(1)).unwrap().name, "admin");
        assert_eq!(
            guild.channel(Snowflake::new(5)).unwrap().name.as_deref(),
            Some("general")
        );
        assert!(guild.member(Snowflake::new(3)).is_some());
    }

    #[test]
    fn test_guild_update_keeps_nested_collections() {
        let payload: GuildPayload = serde_json::from_str(snapshot_json()).unwrap();
        let mut guild = Guild::from_payload(payload);

        let update: GuildPayload =
            serde_json::from_str(r#"{"id": "100", "name": "Renamed Guild"}"#).unwrap();
        guild.update_from(update);

        assert_eq!(guild.name, "Renamed Guild");
        // Scalar update must not wipe the nested maps
        assert_eq!(guild.roles.len(), 1);
        assert_eq!(guild.channels.len(), 1);
        assert_eq!(guild.members.len(), 1);
        // owner_id was absent from the update and must survive
        assert!(guild.is_owner(Snowflake::new(1)));
    }
}
