//! Top-level entity store
//!
//! Per-kind mappings from snowflake ID to owned entity. Insertion is an
//! idempotent overwrite, removal returns the removed snapshot, and reads
//! clone the stored value so callers never hold map locks.

use accord_common::CacheConfig;
use accord_core::{DmChannel, Guild, GuildPayload, Message, Snowflake, User};
use dashmap::DashMap;
use parking_lot::RwLock;

/// The client's entity cache
pub struct CacheStore {
    message_capacity: usize,
    client_user: RwLock<Option<User>>,
    pub(crate) users: DashMap<Snowflake, User>,
    pub(crate) guilds: DashMap<Snowflake, Guild>,
    messages: DashMap<Snowflake, Message>,
    dm_channels: DashMap<Snowflake, DmChannel>,
    /// Secondary index: recipient user ID -> DM channel ID
    dm_by_recipient: DashMap<Snowflake, Snowflake>,
}

impl CacheStore {
    /// Create a store with the given cache configuration
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_message_capacity(config.message_capacity)
    }

    /// Create a store with an explicit message cache capacity
    #[must_use]
    pub fn with_message_capacity(message_capacity: usize) -> Self {
        Self {
            message_capacity,
            client_user: RwLock::new(None),
            users: DashMap::new(),
            guilds: DashMap::new(),
            messages: DashMap::new(),
            dm_channels: DashMap::new(),
            dm_by_recipient: DashMap::new(),
        }
    }

    /// Drop every cached entity
    pub fn clear(&self) {
        *self.client_user.write() = None;
        self.users.clear();
        self.guilds.clear();
        self.messages.clear();
        self.dm_channels.clear();
        self.dm_by_recipient.clear();
    }

    // === Client user ===

    /// The identity the client authenticated as, once known
    #[must_use]
    pub fn client_user(&self) -> Option<User> {
        self.client_user.read().clone()
    }

    pub fn set_client_user(&self, user: User) {
        *self.client_user.write() = Some(user);
    }

    // === Users ===

    /// Insert or overwrite a user, returning the stored snapshot
    pub fn add_user(&self, user: User) -> User {
        match self.users.get_mut(&user.id) {
            Some(mut existing) => {
                existing.update_from(user);
                existing.clone()
            }
            None => {
                self.users.insert(user.id, user.clone());
                user
            }
        }
    }

    /// Apply a user update, returning the (before, after) pair.
    ///
    /// Returns `None` when the user was never cached.
    pub fn update_user(&self, user: User) -> Option<(User, User)> {
        let mut existing = self.users.get_mut(&user.id)?;
        let before = existing.clone();
        existing.update_from(user);
        Some((before, existing.clone()))
    }

    #[must_use]
    pub fn get_user(&self, id: Snowflake) -> Option<User> {
        self.users.get(&id).map(|u| u.clone())
    }

    pub fn remove_user(&self, id: Snowflake) -> Option<User> {
        self.users.remove(&id).map(|(_, u)| u)
    }

    // === Guilds ===

    /// Apply a full guild snapshot, building or refreshing the guild and
    /// its nested collections, and return the stored snapshot.
    pub fn upsert_guild(&self, payload: GuildPayload) -> Guild {
        let guild = Guild::from_payload(payload);
        self.guilds.insert(guild.id, guild.clone());
        guild
    }

    /// Apply a scalar guild update in place, returning (before, after).
    ///
    /// Returns `None` when the guild was never cached.
    pub fn update_guild(&self, payload: GuildPayload) -> Option<(Guild, Guild)> {
        let mut existing = self.guilds.get_mut(&payload.id)?;
        let before = existing.clone();
        existing.update_from(payload);
        Some((before, existing.clone()))
    }

    #[must_use]
    pub fn get_guild(&self, id: Snowflake) -> Option<Guild> {
        self.guilds.get(&id).map(|g| g.clone())
    }

    pub fn remove_guild(&self, id: Snowflake) -> Option<Guild> {
        self.guilds.remove(&id).map(|(_, g)| g)
    }

    #[must_use]
    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }

    // === Messages ===

    /// Insert a message, enforcing the hard capacity inline.
    ///
    /// Reaching capacity clears the entire message map before inserting the
    /// new message. This is a deliberate full-reset policy, not an LRU: the
    /// cache briefly holds only the newest message after the flush.
    pub fn add_message(&self, message: Message) -> Message {
        if self.messages.len() >= self.message_capacity {
            tracing::debug!(
                capacity = self.message_capacity,
                "message cache full, clearing before insert"
            );
            self.messages.clear();
        }
        self.messages.insert(message.id, message.clone());
        message
    }

    /// Apply a message edit, returning (before, after).
    ///
    /// Returns `None` when the message is not cached (edits for unknown
    /// messages carry too little data to build a snapshot from).
    pub fn update_message(&self, message: Message) -> Option<(Message, Message)> {
        let mut existing = self.messages.get_mut(&message.id)?;
        let before = existing.clone();
        existing.update_from(message);
        Some((before, existing.clone()))
    }

    #[must_use]
    pub fn get_message(&self, id: Snowflake) -> Option<Message> {
        self.messages.get(&id).map(|m| m.clone())
    }

    pub fn remove_message(&self, id: Snowflake) -> Option<Message> {
        self.messages.remove(&id).map(|(_, m)| m)
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    // === Direct-message channels ===

    /// Insert or overwrite a DM channel, maintaining the recipient index
    pub fn add_dm_channel(&self, channel: DmChannel) -> DmChannel {
        if let Some(recipient) = channel.recipient() {
            self.dm_by_recipient.insert(recipient.id, channel.id);
        }
        self.dm_channels.insert(channel.id, channel.clone());
        channel
    }

    #[must_use]
    pub fn get_dm_channel(&self, id: Snowflake) -> Option<DmChannel> {
        self.dm_channels.get(&id).map(|c| c.clone())
    }

    /// Look up the DM channel shared with a given user
    #[must_use]
    pub fn dm_channel_with(&self, user_id: Snowflake) -> Option<DmChannel> {
        let channel_id = *self.dm_by_recipient.get(&user_id)?;
        self.get_dm_channel(channel_id)
    }

    pub fn remove_dm_channel(&self, id: Snowflake) -> Option<DmChannel> {
        let (_, channel) = self.dm_channels.remove(&id)?;
        if let Some(recipient) = channel.recipient() {
            self.dm_by_recipient.remove(&recipient.id);
        }
        Some(channel)
    }
}
