//! Dispatch record parser
//!
//! Translates raw gateway dispatch records into typed client events. Every
//! handler mutates the cache first and dispatches second, so listeners
//! always observe post-event cache state. Unknown event names and deltas
//! for unknown parent guilds are logged at debug and dropped.

use crate::listeners::ListenerRegistry;
use accord_cache::CacheStore;
use accord_common::GatewayConfig;
use accord_core::{
    DmChannel, Emoji, Event, GuildChannel, GuildPayload, Member, Message, Role, ScheduledEvent,
    Snowflake, User,
};
use accord_gateway::DispatchRecord;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Wire event names the parser recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventType {
    Ready,
    GuildCreate,
    GuildUpdate,
    GuildDelete,
    GuildRoleCreate,
    GuildRoleUpdate,
    GuildRoleDelete,
    ChannelCreate,
    ChannelUpdate,
    ChannelDelete,
    GuildMemberAdd,
    GuildMemberUpdate,
    GuildMemberRemove,
    GuildEmojisUpdate,
    GuildScheduledEventCreate,
    GuildScheduledEventUpdate,
    GuildScheduledEventDelete,
    MessageCreate,
    MessageUpdate,
    MessageDelete,
    UserUpdate,
    TypingStart,
}

impl EventType {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "READY" => Some(Self::Ready),
            "GUILD_CREATE" => Some(Self::GuildCreate),
            "GUILD_UPDATE" => Some(Self::GuildUpdate),
            "GUILD_DELETE" => Some(Self::GuildDelete),
            "GUILD_ROLE_CREATE" => Some(Self::GuildRoleCreate),
            "GUILD_ROLE_UPDATE" => Some(Self::GuildRoleUpdate),
            "GUILD_ROLE_DELETE" => Some(Self::GuildRoleDelete),
            "CHANNEL_CREATE" => Some(Self::ChannelCreate),
            "CHANNEL_UPDATE" => Some(Self::ChannelUpdate),
            "CHANNEL_DELETE" => Some(Self::ChannelDelete),
            "GUILD_MEMBER_ADD" => Some(Self::GuildMemberAdd),
            "GUILD_MEMBER_UPDATE" => Some(Self::GuildMemberUpdate),
            "GUILD_MEMBER_REMOVE" => Some(Self::GuildMemberRemove),
            "GUILD_EMOJIS_UPDATE" => Some(Self::GuildEmojisUpdate),
            "GUILD_SCHEDULED_EVENT_CREATE" => Some(Self::GuildScheduledEventCreate),
            "GUILD_SCHEDULED_EVENT_UPDATE" => Some(Self::GuildScheduledEventUpdate),
            "GUILD_SCHEDULED_EVENT_DELETE" => Some(Self::GuildScheduledEventDelete),
            "MESSAGE_CREATE" => Some(Self::MessageCreate),
            "MESSAGE_UPDATE" => Some(Self::MessageUpdate),
            "MESSAGE_DELETE" => Some(Self::MessageDelete),
            "USER_UPDATE" => Some(Self::UserUpdate),
            "TYPING_START" => Some(Self::TypingStart),
            _ => None,
        }
    }
}

/// Readiness flag shared with the client facade
#[derive(Default)]
pub struct ReadyState {
    flag: AtomicBool,
    notify: Notify,
}

impl ReadyState {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn mark_ready(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Wait until the initial guild snapshots have settled
    pub async fn wait(&self) {
        loop {
            if self.is_ready() {
                return;
            }
            let notified = self.notify.notified();
            if self.is_ready() {
                return;
            }
            notified.await;
        }
    }
}

/// Parser applying dispatch records to the cache and listener registry
pub struct EventParser {
    cache: Arc<CacheStore>,
    registry: Arc<ListenerRegistry>,
    ready: Arc<ReadyState>,
    /// Notified on each guild snapshot; the quorum task watches for quiet
    guild_signal: Arc<Notify>,
    quorum_window: Duration,
    quorum_started: AtomicBool,
}

impl EventParser {
    #[must_use]
    pub fn new(
        cache: Arc<CacheStore>,
        registry: Arc<ListenerRegistry>,
        config: &GatewayConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            cache,
            registry,
            ready: Arc::new(ReadyState::default()),
            guild_signal: Arc::new(Notify::new()),
            quorum_window: Duration::from_millis(config.ready_quorum_ms),
            quorum_started: AtomicBool::new(false),
        })
    }

    /// The shared readiness flag
    #[must_use]
    pub fn ready_state(&self) -> Arc<ReadyState> {
        Arc::clone(&self.ready)
    }

    /// Apply one dispatch record: mutate the cache, then dispatch the
    /// resulting typed events.
    pub fn apply(self: &Arc<Self>, record: &DispatchRecord) {
        let Some(event_type) = EventType::from_name(&record.event) else {
            tracing::debug!(event = %record.event, "dropping unrecognized event");
            return;
        };

        let events = match event_type {
            EventType::Ready => self.on_ready(&record.data),
            EventType::GuildCreate => self.on_guild_create(&record.data),
            EventType::GuildUpdate => self.on_guild_update(&record.data),
            EventType::GuildDelete => self.on_guild_delete(&record.data),
            EventType::GuildRoleCreate => self.on_role_create(&record.data),
            EventType::GuildRoleUpdate => self.on_role_update(&record.data),
            EventType::GuildRoleDelete => self.on_role_delete(&record.data),
            EventType::ChannelCreate => self.on_channel_create(&record.data),
            EventType::ChannelUpdate => self.on_channel_update(&record.data),
            EventType::ChannelDelete => self.on_channel_delete(&record.data),
            EventType::GuildMemberAdd => self.on_member_add(&record.data),
            EventType::GuildMemberUpdate => self.on_member_update(&record.data),
            EventType::GuildMemberRemove => self.on_member_remove(&record.data),
            EventType::GuildEmojisUpdate => self.on_emojis_update(&record.data),
            EventType::GuildScheduledEventCreate => self.on_scheduled_event_create(&record.data),
            EventType::GuildScheduledEventUpdate => self.on_scheduled_event_update(&record.data),
            EventType::GuildScheduledEventDelete => self.on_scheduled_event_delete(&record.data),
            EventType::MessageCreate => self.on_message_create(&record.data),
            EventType::MessageUpdate => self.on_message_update(&record.data),
            EventType::MessageDelete => self.on_message_delete(&record.data),
            EventType::UserUpdate => self.on_user_update(&record.data),
            EventType::TypingStart => self.on_typing_start(&record.data),
        };

        for event in events {
            self.registry.dispatch(&event);
        }
    }

    fn drop_malformed(&self, name: &str, err: &serde_json::Error) -> Vec<Event> {
        tracing::debug!(event = name, error = %err, "dropping malformed payload");
        Vec::new()
    }

    fn drop_unknown_guild(&self, name: &str, guild_id: Snowflake) -> Vec<Event> {
        tracing::debug!(event = name, %guild_id, "dropping delta for unknown guild");
        Vec::new()
    }

    // === Handshake ===

    fn on_ready(self: &Arc<Self>, data: &Value) -> Vec<Event> {
        if let Some(user_value) = data.get("user") {
            match serde_json::from_value::<User>(user_value.clone()) {
                Ok(user) => {
                    self.cache.add_user(user.clone());
                    self.cache.set_client_user(user);
                }
                Err(err) => tracing::debug!(error = %err, "malformed user in READY"),
            }
        }

        // Unavailable guild stubs; full snapshots stream in afterwards.
        if let Some(guilds) = data.get("guilds").and_then(Value::as_array) {
            for stub in guilds {
                if let Ok(payload) = serde_json::from_value::<GuildPayload>(stub.clone()) {
                    self.cache.upsert_guild(payload);
                }
            }
        }

        if !self.ready.is_ready() && !self.quorum_started.swap(true, Ordering::SeqCst) {
            self.spawn_ready_quorum();
        }

        vec![Event::Connect]
    }

    /// The client is ready once guild snapshots stop arriving for a full
    /// quiet window. Each snapshot restarts the window.
    fn spawn_ready_quorum(self: &Arc<Self>) {
        let ready = Arc::clone(&self.ready);
        let signal = Arc::clone(&self.guild_signal);
        let registry = Arc::clone(&self.registry);
        let window = self.quorum_window;

        tokio::spawn(async move {
            loop {
                match tokio::time::timeout(window, signal.notified()).await {
                    Ok(()) => {}
                    Err(_) => break,
                }
            }
            tracing::info!("initial guild snapshots settled, client ready");
            ready.mark_ready();
            registry.dispatch(&Event::Ready);
        });
    }

    // === Guilds ===

    fn on_guild_create(&self, data: &Value) -> Vec<Event> {
        let payload: GuildPayload = match serde_json::from_value(data.clone()) {
            Ok(payload) => payload,
            Err(err) => return self.drop_malformed("GUILD_CREATE", &err),
        };
        let guild = self.cache.upsert_guild(payload);
        self.guild_signal.notify_one();

        // A snapshot arriving after readiness is a newly joined guild; the
        // create event fires either way.
        let mut events = vec![Event::GuildCreate(guild.clone())];
        if self.ready.is_ready() {
            events.push(Event::GuildJoin(guild));
        }
        events
    }

    fn on_guild_update(&self, data: &Value) -> Vec<Event> {
        let payload: GuildPayload = match serde_json::from_value(data.clone()) {
            Ok(payload) => payload,
            Err(err) => return self.drop_malformed("GUILD_UPDATE", &err),
        };
        let guild_id = payload.id;
        match self.cache.update_guild(payload) {
            Some((before, after)) => vec![Event::GuildUpdate { before, after }],
            None => self.drop_unknown_guild("GUILD_UPDATE", guild_id),
        }
    }

    /// A delete with the `unavailable` marker is an outage, not a removal
    /// by the user: the guild is flagged unavailable before deletion.
    /// Without the marker the client left (or was removed from) the guild.
    /// The delete event fires on both paths, so delete listeners see every
    /// removal.
    fn on_guild_delete(&self, data: &Value) -> Vec<Event> {
        let Some(guild_id) = data.get("id").and_then(parse_snowflake) else {
            tracing::debug!("GUILD_DELETE without an id");
            return Vec::new();
        };
        let Some(mut guild) = self.cache.remove_guild(guild_id) else {
            return self.drop_unknown_guild("GUILD_DELETE", guild_id);
        };

        if data.get("unavailable").is_some() {
            guild.unavailable = true;
            vec![Event::GuildAvailable(guild.clone()), Event::GuildDelete(guild)]
        } else {
            vec![Event::GuildLeave(guild.clone()), Event::GuildDelete(guild)]
        }
    }

    // === Roles ===

    fn on_role_create(&self, data: &Value) -> Vec<Event> {
        let Some((guild_id, role)) = scoped_entity::<Role>(data, "role") else {
            return self.drop_malformed_scoped("GUILD_ROLE_CREATE");
        };
        match self.cache.add_role(guild_id, role) {
            Some(role) => vec![Event::RoleCreate { guild_id, role }],
            None => self.drop_unknown_guild("GUILD_ROLE_CREATE", guild_id),
        }
    }

    fn on_role_update(&self, data: &Value) -> Vec<Event> {
        let Some((guild_id, role)) = scoped_entity::<Role>(data, "role") else {
            return self.drop_malformed_scoped("GUILD_ROLE_UPDATE");
        };
        match self.cache.update_role(guild_id, role) {
            Some((before, after)) => vec![Event::RoleUpdate { guild_id, before, after }],
            None => self.drop_unknown_guild("GUILD_ROLE_UPDATE", guild_id),
        }
    }

    fn on_role_delete(&self, data: &Value) -> Vec<Event> {
        let (Some(guild_id), Some(role_id)) = (
            data.get("guild_id").and_then(parse_snowflake),
            data.get("role_id").and_then(parse_snowflake),
        ) else {
            return self.drop_malformed_scoped("GUILD_ROLE_DELETE");
        };
        match self.cache.remove_role(guild_id, role_id) {
            Some(role) => vec![Event::RoleDelete { guild_id, role }],
            None => self.drop_unknown_guild("GUILD_ROLE_DELETE", guild_id),
        }
    }

    // === Channels ===

    fn on_channel_create(&self, data: &Value) -> Vec<Event> {
        if is_dm_channel(data) {
            let channel: DmChannel = match serde_json::from_value(data.clone()) {
                Ok(channel) => channel,
                Err(err) => return self.drop_malformed("CHANNEL_CREATE", &err),
            };
            let channel = self.cache.add_dm_channel(channel);
            return vec![Event::DmChannelCreate(channel)];
        }

        let channel: GuildChannel = match serde_json::from_value(data.clone()) {
            Ok(channel) => channel,
            Err(err) => return self.drop_malformed("CHANNEL_CREATE", &err),
        };
        let Some(guild_id) = channel.guild_id else {
            tracing::debug!("CHANNEL_CREATE without a guild_id");
            return Vec::new();
        };
        match self.cache.add_channel(guild_id, channel) {
            Some(channel) => vec![Event::ChannelCreate { guild_id, channel }],
            None => self.drop_unknown_guild("CHANNEL_CREATE", guild_id),
        }
    }

    fn on_channel_update(&self, data: &Value) -> Vec<Event> {
        if is_dm_channel(data) {
            tracing::debug!("ignoring update for a direct-message channel");
            return Vec::new();
        }
        let channel: GuildChannel = match serde_json::from_value(data.clone()) {
            Ok(channel) => channel,
            Err(err) => return self.drop_malformed("CHANNEL_UPDATE", &err),
        };
        let Some(guild_id) = channel.guild_id else {
            tracing::debug!("CHANNEL_UPDATE without a guild_id");
            return Vec::new();
        };
        match self.cache.update_channel(guild_id, channel) {
            Some((before, after)) => vec![Event::ChannelUpdate { guild_id, before, after }],
            None => self.drop_unknown_guild("CHANNEL_UPDATE", guild_id),
        }
    }

    fn on_channel_delete(&self, data: &Value) -> Vec<Event> {
        if is_dm_channel(data) {
            if let Some(id) = data.get("id").and_then(parse_snowflake) {
                self.cache.remove_dm_channel(id);
            }
            return Vec::new();
        }
        let (Some(guild_id), Some(channel_id)) = (
            data.get("guild_id").and_then(parse_snowflake),
            data.get("id").and_then(parse_snowflake),
        ) else {
            return self.drop_malformed_scoped("CHANNEL_DELETE");
        };
        match self.cache.remove_channel(guild_id, channel_id) {
            Some(channel) => vec![Event::ChannelDelete { guild_id, channel }],
            None => self.drop_unknown_guild("CHANNEL_DELETE", guild_id),
        }
    }

    // === Members ===

    fn on_member_add(&self, data: &Value) -> Vec<Event> {
        let Some(guild_id) = data.get("guild_id").and_then(parse_snowflake) else {
            return self.drop_malformed_scoped("GUILD_MEMBER_ADD");
        };
        let member: Member = match serde_json::from_value(data.clone()) {
            Ok(member) => member,
            Err(err) => return self.drop_malformed("GUILD_MEMBER_ADD", &err),
        };
        self.cache.add_user(member.user.clone());
        match self.cache.add_member(guild_id, member) {
            Some(member) => vec![Event::MemberJoin { guild_id, member }],
            None => self.drop_unknown_guild("GUILD_MEMBER_ADD", guild_id),
        }
    }

    fn on_member_update(&self, data: &Value) -> Vec<Event> {
        let Some(guild_id) = data.get("guild_id").and_then(parse_snowflake) else {
            return self.drop_malformed_scoped("GUILD_MEMBER_UPDATE");
        };
        let member: Member = match serde_json::from_value(data.clone()) {
            Ok(member) => member,
            Err(err) => return self.drop_malformed("GUILD_MEMBER_UPDATE", &err),
        };
        self.cache.add_user(member.user.clone());
        match self.cache.update_member(guild_id, member) {
            Some((before, after)) => vec![Event::MemberUpdate { guild_id, before, after }],
            None => self.drop_unknown_guild("GUILD_MEMBER_UPDATE", guild_id),
        }
    }

    fn on_member_remove(&self, data: &Value) -> Vec<Event> {
        let Some(guild_id) = data.get("guild_id").and_then(parse_snowflake) else {
            return self.drop_malformed_scoped("GUILD_MEMBER_REMOVE");
        };
        let user: User = match data.get("user").cloned().map(serde_json::from_value) {
            Some(Ok(user)) => user,
            _ => return self.drop_malformed_scoped("GUILD_MEMBER_REMOVE"),
        };
        if self.cache.get_guild(guild_id).is_none() {
            return self.drop_unknown_guild("GUILD_MEMBER_REMOVE", guild_id);
        }

        // The leave may arrive for a member the client never cached; the
        // listener still gets a minimal membership built from the user.
        let member = self.cache.remove_member(guild_id, user.id).unwrap_or(Member {
            user,
            nick: None,
            roles: Vec::new(),
            joined_at: None,
            deaf: false,
            mute: false,
        });
        vec![Event::MemberLeave { guild_id, member }]
    }

    // === Emojis ===

    fn on_emojis_update(&self, data: &Value) -> Vec<Event> {
        let Some(guild_id) = data.get("guild_id").and_then(parse_snowflake) else {
            return self.drop_malformed_scoped("GUILD_EMOJIS_UPDATE");
        };
        let emojis: Vec<Emoji> = match data.get("emojis").cloned().map(serde_json::from_value) {
            Some(Ok(emojis)) => emojis,
            _ => return self.drop_malformed_scoped("GUILD_EMOJIS_UPDATE"),
        };
        match self.cache.set_emojis(guild_id, emojis) {
            Some((before, after)) => vec![Event::EmojisUpdate { guild_id, before, after }],
            None => self.drop_unknown_guild("GUILD_EMOJIS_UPDATE", guild_id),
        }
    }

    // === Scheduled events ===

    fn on_scheduled_event_create(&self, data: &Value) -> Vec<Event> {
        let event: ScheduledEvent = match serde_json::from_value(data.clone()) {
            Ok(event) => event,
            Err(err) => return self.drop_malformed("GUILD_SCHEDULED_EVENT_CREATE", &err),
        };
        let Some(guild_id) = event.guild_id else {
            return self.drop_malformed_scoped("GUILD_SCHEDULED_EVENT_CREATE");
        };
        match self.cache.add_scheduled_event(guild_id, event) {
            Some(event) => vec![Event::ScheduledEventCreate { guild_id, event }],
            None => self.drop_unknown_guild("GUILD_SCHEDULED_EVENT_CREATE", guild_id),
        }
    }

    fn on_scheduled_event_update(&self, data: &Value) -> Vec<Event> {
        let event: ScheduledEvent = match serde_json::from_value(data.clone()) {
            Ok(event) => event,
            Err(err) => return self.drop_malformed("GUILD_SCHEDULED_EVENT_UPDATE", &err),
        };
        let Some(guild_id) = event.guild_id else {
            return self.drop_malformed_scoped("GUILD_SCHEDULED_EVENT_UPDATE");
        };
        match self.cache.update_scheduled_event(guild_id, event) {
            Some((before, after)) => {
                vec![Event::ScheduledEventUpdate { guild_id, before, after }]
            }
            None => self.drop_unknown_guild("GUILD_SCHEDULED_EVENT_UPDATE", guild_id),
        }
    }

    fn on_scheduled_event_delete(&self, data: &Value) -> Vec<Event> {
        let (Some(guild_id), Some(event_id)) = (
            data.get("guild_id").and_then(parse_snowflake),
            data.get("id").and_then(parse_snowflake),
        ) else {
            return self.drop_malformed_scoped("GUILD_SCHEDULED_EVENT_DELETE");
        };
        match self.cache.remove_scheduled_event(guild_id, event_id) {
            Some(event) => vec![Event::ScheduledEventDelete { guild_id, event }],
            None => self.drop_unknown_guild("GUILD_SCHEDULED_EVENT_DELETE", guild_id),
        }
    }

    // === Messages ===

    fn on_message_create(&self, data: &Value) -> Vec<Event> {
        let message: Message = match serde_json::from_value(data.clone()) {
            Ok(message) => message,
            Err(err) => return self.drop_malformed("MESSAGE_CREATE", &err),
        };
        if let Some(author) = &message.author {
            self.cache.add_user(author.clone());
        }
        let message = self.cache.add_message(message);
        vec![Event::MessageCreate(message)]
    }

    fn on_message_update(&self, data: &Value) -> Vec<Event> {
        let message: Message = match serde_json::from_value(data.clone()) {
            Ok(message) => message,
            Err(err) => return self.drop_malformed("MESSAGE_UPDATE", &err),
        };
        match self.cache.update_message(message) {
            Some((before, after)) => vec![Event::MessageUpdate { before, after }],
            None => {
                tracing::debug!("dropping edit for uncached message");
                Vec::new()
            }
        }
    }

    fn on_message_delete(&self, data: &Value) -> Vec<Event> {
        let Some(message_id) = data.get("id").and_then(parse_snowflake) else {
            return self.drop_malformed_scoped("MESSAGE_DELETE");
        };
        match self.cache.remove_message(message_id) {
            Some(message) => vec![Event::MessageDelete(message)],
            None => {
                tracing::debug!(%message_id, "dropping delete for uncached message");
                Vec::new()
            }
        }
    }

    // === Users / typing ===

    fn on_user_update(&self, data: &Value) -> Vec<Event> {
        let user: User = match serde_json::from_value(data.clone()) {
            Ok(user) => user,
            Err(err) => return self.drop_malformed("USER_UPDATE", &err),
        };
        if self.cache.client_user().is_some_and(|me| me.id == user.id) {
            self.cache.set_client_user(user.clone());
        }
        match self.cache.update_user(user.clone()) {
            Some((before, after)) => vec![Event::UserUpdate { before, after }],
            None => {
                self.cache.add_user(user);
                Vec::new()
            }
        }
    }

    fn on_typing_start(&self, data: &Value) -> Vec<Event> {
        let (Some(channel_id), Some(user_id)) = (
            data.get("channel_id").and_then(parse_snowflake),
            data.get("user_id").and_then(parse_snowflake),
        ) else {
            return self.drop_malformed_scoped("TYPING_START");
        };
        vec![Event::TypingStart { channel_id, user_id }]
    }

    fn drop_malformed_scoped(&self, name: &str) -> Vec<Event> {
        tracing::debug!(event = name, "dropping payload missing required fields");
        Vec::new()
    }
}

/// Snowflakes arrive as strings on the wire but numbers are tolerated
fn parse_snowflake(value: &Value) -> Option<Snowflake> {
    serde_json::from_value(value.clone()).ok()
}

fn is_dm_channel(data: &Value) -> bool {
    data.get("type").and_then(Value::as_u64) == Some(1)
}

/// Pull a `{guild_id, <key>: entity}` pair out of a scoped payload
fn scoped_entity<T: serde::de::DeserializeOwned>(
    data: &Value,
    key: &str,
) -> Option<(Snowflake, T)> {
    let guild_id = data.get("guild_id").and_then(parse_snowflake)?;
    let entity = serde_json::from_value(data.get(key)?.clone()).ok()?;
    Some((guild_id, entity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn parser_with(window_ms: u64) -> (Arc<EventParser>, Arc<CacheStore>, Arc<ListenerRegistry>) {
        let cache = Arc::new(CacheStore::with_message_capacity(100));
        let registry = Arc::new(ListenerRegistry::new());
        let config = GatewayConfig {
            ready_quorum_ms: window_ms,
            ..GatewayConfig::default()
        };
        let parser = EventParser::new(Arc::clone(&cache), Arc::clone(&registry), &config);
        (parser, cache, registry)
    }

    fn record(event: &str, data: Value) -> DispatchRecord {
        DispatchRecord {
            event: event.to_string(),
            seq: Some(1),
            data,
        }
    }

    fn guild_snapshot(id: u64) -> Value {
        json!({
            "id": id.to_string(),
            "name": format!("guild-{id}"),
            "roles": [{"id": "1", "name": "admin"}]
        })
    }

    #[tokio::test]
    async fn test_ready_captures_client_user_and_dispatches_connect() {
        let (parser, cache, registry) = parser_with(50);
        let receiver = registry.add_waiter(accord_core::EventKind::Connect, |_| true);

        parser.apply(&record(
            "READY",
            json!({
                "session_id": "s1",
                "user": {"id": "42", "username": "me"},
                "guilds": [{"id": "100", "unavailable": true}]
            }),
        ));

        receiver.await.unwrap();
        assert_eq!(cache.client_user().unwrap().id, Snowflake::new(42));
        assert!(cache.get_guild(Snowflake::new(100)).is_some());
    }

    #[tokio::test]
    async fn test_ready_quorum_waits_for_quiet_window() {
        let (parser, _cache, registry) = parser_with(80);
        let receiver = registry.add_waiter(accord_core::EventKind::Ready, |_| true);

        parser.apply(&record("READY", json!({"user": {"id": "42", "username": "me"}})));
        assert!(!parser.ready_state().is_ready());

        // Snapshots arriving inside the window keep pushing readiness out
        for id in 1..=3u64 {
            tokio::time::sleep(Duration::from_millis(30)).await;
            parser.apply(&record("GUILD_CREATE", guild_snapshot(id)));
            assert!(!parser.ready_state().is_ready());
        }

        tokio::time::timeout(Duration::from_secs(2), receiver)
            .await
            .expect("ready should fire after the quiet window")
            .unwrap();
        assert!(parser.ready_state().is_ready());
    }

    #[tokio::test]
    async fn test_guild_create_also_joins_after_ready() {
        let (parser, _cache, registry) = parser_with(10);
        parser.apply(&record("READY", json!({"user": {"id": "42", "username": "me"}})));
        parser.ready_state().wait().await;

        let join = registry.add_waiter(accord_core::EventKind::GuildJoin, |_| true);
        let create = registry.add_waiter(accord_core::EventKind::GuildCreate, |_| true);
        parser.apply(&record("GUILD_CREATE", guild_snapshot(7)));
        create.await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_role_update_carries_before_and_after() {
        let (parser, cache, registry) = parser_with(1000);
        parser.apply(&record("GUILD_CREATE", guild_snapshot(100)));

        let receiver = registry.add_waiter(accord_core::EventKind::RoleUpdate, |_| true);
        parser.apply(&record(
            "GUILD_ROLE_UPDATE",
            json!({"guild_id": "100", "role": {"id": "1", "name": "mod"}}),
        ));

        let event = receiver.await.unwrap();
        let Event::RoleUpdate { before, after, .. } = event else {
            panic!("expected a role update");
        };
        assert_eq!(before.unwrap().name, "admin");
        assert_eq!(after.name, "mod");

        // Cache was mutated before dispatch
        let guild = cache.get_guild(Snowflake::new(100)).unwrap();
        assert_eq!(guild.role(Snowflake::new(1)).unwrap().name, "mod");
    }

    #[tokio::test]
    async fn test_delta_for_unknown_guild_is_dropped() {
        let (parser, cache, registry) = parser_with(1000);
        let mut receiver = registry.add_waiter(accord_core::EventKind::RoleCreate, |_| true);

        parser.apply(&record(
            "GUILD_ROLE_CREATE",
            json!({"guild_id": "999", "role": {"id": "5", "name": "ghost"}}),
        ));

        assert!(receiver.try_recv().is_err());
        assert_eq!(cache.guild_count(), 0);
    }

    #[tokio::test]
    async fn test_guild_delete_without_marker_is_a_leave() {
        let (parser, cache, registry) = parser_with(1000);
        parser.apply(&record("GUILD_CREATE", guild_snapshot(100)));

        let leave = registry.add_waiter(accord_core::EventKind::GuildLeave, |_| true);
        let deleted = registry.add_waiter(accord_core::EventKind::GuildDelete, |_| true);
        parser.apply(&record("GUILD_DELETE", json!({"id": "100"})));
        leave.await.unwrap();
        // The delete event fires for every removal, leaves included
        deleted.await.unwrap();
        assert!(cache.get_guild(Snowflake::new(100)).is_none());
    }

    #[tokio::test]
    async fn test_guild_delete_with_marker_is_outage() {
        let (parser, cache, registry) = parser_with(1000);
        parser.apply(&record("GUILD_CREATE", guild_snapshot(100)));

        let available = registry.add_waiter(accord_core::EventKind::GuildAvailable, |_| true);
        let deleted = registry.add_waiter(accord_core::EventKind::GuildDelete, |_| true);

        parser.apply(&record("GUILD_DELETE", json!({"id": "100", "unavailable": true})));

        let Event::GuildAvailable(guild) = available.await.unwrap() else {
            panic!("expected guild available");
        };
        assert!(guild.unavailable);
        deleted.await.unwrap();
        assert!(cache.get_guild(Snowflake::new(100)).is_none());
    }

    #[tokio::test]
    async fn test_message_create_caches_then_dispatches() {
        let (parser, cache, registry) = parser_with(1000);
        let receiver = registry.add_waiter(accord_core::EventKind::MessageCreate, |_| true);

        parser.apply(&record(
            "MESSAGE_CREATE",
            json!({
                "id": "10", "channel_id": "5", "content": "hi",
                "author": {"id": "3", "username": "dave"}
            }),
        ));

        receiver.await.unwrap();
        assert!(cache.get_message(Snowflake::new(10)).is_some());
        // The author was folded into the user cache as well
        assert!(cache.get_user(Snowflake::new(3)).is_some());
    }

    #[tokio::test]
    async fn test_unknown_event_name_is_dropped() {
        let (parser, _cache, _registry) = parser_with(1000);
        // Must not panic or dispatch anything
        parser.apply(&record("SOME_FUTURE_EVENT", json!({"id": "1"})));
    }

    #[tokio::test]
    async fn test_member_update_upserts_unknown_member() {
        let (parser, _cache, registry) = parser_with(1000);
        parser.apply(&record("GUILD_CREATE", guild_snapshot(100)));

        let receiver = registry.add_waiter(accord_core::EventKind::MemberUpdate, |_| true);
        parser.apply(&record(
            "GUILD_MEMBER_UPDATE",
            json!({
                "guild_id": "100",
                "user": {"id": "3", "username": "dave"},
                "nick": "d"
            }),
        ));

        let Event::MemberUpdate { before, after, .. } = receiver.await.unwrap() else {
            panic!("expected a member update");
        };
        assert!(before.is_none());
        assert_eq!(after.nick.as_deref(), Some("d"));
    }
}
