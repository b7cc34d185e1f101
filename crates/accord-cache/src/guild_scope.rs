//! Guild-scoped cache operations
//!
//! Channels, members, roles, emojis, and scheduled events live inside their
//! parent guild. Deltas for an unknown parent return `None` so the caller
//! can log and drop them; updates for an unknown child are upserted,
//! treated as a missed create.

use crate::store::CacheStore;
use accord_core::{Emoji, GuildChannel, Member, Role, ScheduledEvent, Snowflake};

impl CacheStore {
    // === Roles ===

    /// Insert or overwrite a role under its guild.
    ///
    /// Returns `None` when the parent guild is unknown.
    pub fn add_role(&self, guild_id: Snowflake, role: Role) -> Option<Role> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        guild.roles.insert(role.id, role.clone());
        Some(role)
    }

    /// Apply a role update, returning the shallow before snapshot and the
    /// updated role. An unknown role is upserted (`before` is `None`).
    pub fn update_role(
        &self,
        guild_id: Snowflake,
        role: Role,
    ) -> Option<(Option<Role>, Role)> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        match guild.roles.get_mut(&role.id) {
            Some(existing) => {
                let before = existing.clone();
                existing.update_from(role);
                let after = existing.clone();
                Some((Some(before), after))
            }
            None => {
                guild.roles.insert(role.id, role.clone());
                Some((None, role))
            }
        }
    }

    pub fn remove_role(&self, guild_id: Snowflake, role_id: Snowflake) -> Option<Role> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        guild.roles.remove(&role_id)
    }

    // === Channels ===

    pub fn add_channel(&self, guild_id: Snowflake, channel: GuildChannel) -> Option<GuildChannel> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        guild.channels.insert(channel.id, channel.clone());
        Some(channel)
    }

    pub fn update_channel(
        &self,
        guild_id: Snowflake,
        channel: GuildChannel,
    ) -> Option<(Option<GuildChannel>, GuildChannel)> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        match guild.channels.get_mut(&channel.id) {
            Some(existing) => {
                let before = existing.clone();
                existing.update_from(channel);
                let after = existing.clone();
                Some((Some(before), after))
            }
            None => {
                guild.channels.insert(channel.id, channel.clone());
                Some((None, channel))
            }
        }
    }

    pub fn remove_channel(
        &self,
        guild_id: Snowflake,
        channel_id: Snowflake,
    ) -> Option<GuildChannel> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        guild.channels.remove(&channel_id)
    }

    // === Members ===

    pub fn add_member(&self, guild_id: Snowflake, member: Member) -> Option<Member> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        guild.members.insert(member.id(), member.clone());
        Some(member)
    }

    /// Apply a member update. Unknown members are upserted as new adds,
    /// since the server documents member updates arriving for members the
    /// client never saw join.
    pub fn update_member(
        &self,
        guild_id: Snowflake,
        member: Member,
    ) -> Option<(Option<Member>, Member)> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        match guild.members.get_mut(&member.id()) {
            Some(existing) => {
                let before = existing.clone();
                existing.update_from(member);
                let after = existing.clone();
                Some((Some(before), after))
            }
            None => {
                guild.members.insert(member.id(), member.clone());
                Some((None, member))
            }
        }
    }

    pub fn remove_member(&self, guild_id: Snowflake, user_id: Snowflake) -> Option<Member> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        guild.members.remove(&user_id)
    }

    // === Emojis ===

    /// Replace a guild's emoji set (the wire sends the full list), returning
    /// the (before, after) lists.
    pub fn set_emojis(
        &self,
        guild_id: Snowflake,
        emojis: Vec<Emoji>,
    ) -> Option<(Vec<Emoji>, Vec<Emoji>)> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        let before: Vec<Emoji> = guild.emojis.values().cloned().collect();
        guild.emojis = emojis.iter().map(|e| (e.id, e.clone())).collect();
        Some((before, emojis))
    }

    // === Scheduled events ===

    pub fn add_scheduled_event(
        &self,
        guild_id: Snowflake,
        event: ScheduledEvent,
    ) -> Option<ScheduledEvent> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        guild.scheduled_events.insert(event.id, event.clone());
        Some(event)
    }

    pub fn update_scheduled_event(
        &self,
        guild_id: Snowflake,
        event: ScheduledEvent,
    ) -> Option<(Option<ScheduledEvent>, ScheduledEvent)> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        match guild.scheduled_events.get_mut(&event.id) {
            Some(existing) => {
                let before = existing.clone();
                existing.update_from(event);
                let after = existing.clone();
                Some((Some(before), after))
            }
            None => {
                guild.scheduled_events.insert(event.id, event.clone());
                Some((None, event))
            }
        }
    }

    pub fn remove_scheduled_event(
        &self,
        guild_id: Snowflake,
        event_id: Snowflake,
    ) -> Option<ScheduledEvent> {
        let mut guild = self.guilds.get_mut(&guild_id)?;
        guild.scheduled_events.remove(&event_id)
    }
}
