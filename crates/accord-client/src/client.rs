//! Client facade
//!
//! Ties the REST transport, gateway connection, cache, and listener
//! registry together behind one handle. Mutating REST calls fold the
//! response body back into the cache so reads after a successful call see
//! the authoritative server state.

use crate::error::ClientError;
use crate::listeners::{Callback, ListenerRegistry};
use crate::parser::{EventParser, ReadyState};
use accord_cache::CacheStore;
use accord_common::ClientConfig;
use accord_core::{
    DmChannel, Event, EventKind, GatewayIntents, Guild, GuildChannel, GuildPayload, Message,
    Snowflake, User,
};
use accord_gateway::GatewayConnection;
use accord_http::{routes, ApiResponse, RequestOptions, Rest};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The chat platform client
pub struct Client {
    config: ClientConfig,
    rest: Arc<Rest>,
    cache: Arc<CacheStore>,
    registry: Arc<ListenerRegistry>,
    parser: Arc<EventParser>,
    ready: Arc<ReadyState>,
    token: RwLock<Option<String>>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl Client {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let rest = Arc::new(Rest::new(&config.rest));
        let cache = Arc::new(CacheStore::new(&config.cache));
        let registry = Arc::new(ListenerRegistry::new());
        let parser = EventParser::new(Arc::clone(&cache), Arc::clone(&registry), &config.gateway);
        let ready = parser.ready_state();
        Self {
            config,
            rest,
            cache,
            registry,
            parser,
            ready,
            token: RwLock::new(None),
        }
    }

    /// The entity cache
    #[must_use]
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    // === Lifecycle ===

    /// Authenticate the REST transport and fetch the client's own identity
    pub async fn login(&self, token: &str) -> Result<User, ClientError> {
        self.rest.set_token(token);
        *self.token.write() = Some(token.trim().to_string());

        let user = self.fetch_current_user().await?;
        tracing::info!(user = %user.tag(), "logged in");
        Ok(user)
    }

    /// Open the gateway connection and pump events until it shuts down.
    ///
    /// Requires a prior `login`. Dispatch records flow through the parser
    /// inline, so cache mutations and listener dispatch preserve gateway
    /// arrival order.
    pub async fn connect(&self, intents: GatewayIntents) -> Result<(), ClientError> {
        let token = self.token.read().clone().ok_or(ClientError::NotLoggedIn)?;

        let response = self.rest.request(routes::get_gateway(), RequestOptions::new()).await?;
        let gateway_url = response
            .into_json()
            .and_then(|v| v.get("url").and_then(Value::as_str).map(String::from))
            .ok_or(ClientError::EmptyResponse)?;

        let (tx, mut rx) = mpsc::channel(256);
        let connection = GatewayConnection::new(
            self.config.gateway.clone(),
            token,
            intents,
            tx,
        );
        let gateway = tokio::spawn(async move { connection.run(&gateway_url).await });

        while let Some(record) = rx.recv().await {
            self.parser.apply(&record);
        }

        gateway.abort();
        Ok(())
    }

    /// `login` followed by `connect`
    pub async fn start(&self, token: &str, intents: GatewayIntents) -> Result<(), ClientError> {
        self.login(token).await?;
        self.connect(intents).await
    }

    // === Listeners ===

    /// Register a listener invoked for every event of `kind`
    pub fn on<F, Fut>(&self, kind: EventKind, callback: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry.on(kind, wrap(callback));
    }

    /// Register a listener removed after its first invocation
    pub fn once<F, Fut>(&self, kind: EventKind, callback: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.registry.once(kind, wrap(callback));
    }

    /// Hook invoked exactly once, when the first gateway handshake
    /// completes (before the initial guild snapshots settle)
    pub fn set_connect_hook<F, Fut>(&self, callback: F)
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.once(EventKind::Connect, callback);
    }

    /// Wait for the next event of `kind` that satisfies `predicate`
    pub async fn wait_for(
        &self,
        kind: EventKind,
        predicate: impl Fn(&Event) -> bool + Send + 'static,
        timeout: Duration,
    ) -> Result<Event, ClientError> {
        let receiver = self.registry.add_waiter(kind, predicate);
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(event)) => Ok(event),
            _ => Err(ClientError::WaitTimeout),
        }
    }

    /// Whether the initial guild snapshots have settled
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    /// Wait until the initial guild snapshots have settled
    pub async fn wait_until_ready(&self) {
        self.ready.wait().await;
    }

    // === Cache reads ===

    #[must_use]
    pub fn client_user(&self) -> Option<User> {
        self.cache.client_user()
    }

    #[must_use]
    pub fn get_user(&self, id: Snowflake) -> Option<User> {
        self.cache.get_user(id)
    }

    #[must_use]
    pub fn get_guild(&self, id: Snowflake) -> Option<Guild> {
        self.cache.get_guild(id)
    }

    #[must_use]
    pub fn get_message(&self, id: Snowflake) -> Option<Message> {
        self.cache.get_message(id)
    }

    #[must_use]
    pub fn get_dm_channel(&self, id: Snowflake) -> Option<DmChannel> {
        self.cache.get_dm_channel(id)
    }

    // === REST operations ===

    async fn fetch_current_user(&self) -> Result<User, ClientError> {
        let response = self
            .rest
            .request(routes::get_current_user(), RequestOptions::new())
            .await?;
        let user: User = entity(response)?;
        self.cache.add_user(user.clone());
        self.cache.set_client_user(user.clone());
        Ok(user)
    }

    /// Fetch a user from the API and refresh the cache
    pub async fn fetch_user(&self, user_id: Snowflake) -> Result<User, ClientError> {
        let response = self
            .rest
            .request(routes::get_user(user_id), RequestOptions::new())
            .await?;
        let user: User = entity(response)?;
        Ok(self.cache.add_user(user))
    }

    /// Fetch a guild snapshot from the API and refresh the cache
    pub async fn fetch_guild(&self, guild_id: Snowflake) -> Result<Guild, ClientError> {
        let response = self
            .rest
            .request(routes::get_guild(guild_id), RequestOptions::new())
            .await?;
        let payload: GuildPayload = entity(response)?;
        Ok(self.cache.upsert_guild(payload))
    }

    /// Fetch a guild channel from the API and refresh the cache
    pub async fn fetch_channel(&self, channel_id: Snowflake) -> Result<GuildChannel, ClientError> {
        let response = self
            .rest
            .request(routes::get_channel(channel_id), RequestOptions::new())
            .await?;
        let channel: GuildChannel = entity(response)?;
        if let Some(guild_id) = channel.guild_id {
            if let Some(stored) = self.cache.add_channel(guild_id, channel.clone()) {
                return Ok(stored);
            }
        }
        Ok(channel)
    }

    /// Open (or reuse) the DM channel with a user
    pub async fn create_dm(&self, user_id: Snowflake) -> Result<DmChannel, ClientError> {
        if let Some(existing) = self.cache.dm_channel_with(user_id) {
            return Ok(existing);
        }
        let response = self
            .rest
            .request(
                routes::create_dm(),
                RequestOptions::new().json(json!({ "recipient_id": user_id })),
            )
            .await?;
        let channel: DmChannel = entity(response)?;
        Ok(self.cache.add_dm_channel(channel))
    }

    /// Post a message to a channel
    pub async fn create_message(
        &self,
        channel_id: Snowflake,
        content: &str,
    ) -> Result<Message, ClientError> {
        self.create_message_with(
            channel_id,
            RequestOptions::new().json(json!({ "content": content })),
        )
        .await
    }

    /// Post a message with full request options (embeds, attachments, ...)
    pub async fn create_message_with(
        &self,
        channel_id: Snowflake,
        options: RequestOptions,
    ) -> Result<Message, ClientError> {
        let response = self
            .rest
            .request(routes::create_message(channel_id), options)
            .await?;
        let message: Message = entity(response)?;
        Ok(self.cache.add_message(message))
    }

    /// Edit a message's content
    pub async fn edit_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
        content: &str,
    ) -> Result<Message, ClientError> {
        let response = self
            .rest
            .request(
                routes::edit_message(channel_id, message_id),
                RequestOptions::new().json(json!({ "content": content })),
            )
            .await?;
        let message: Message = entity(response)?;
        match self.cache.update_message(message.clone()) {
            Some((_, after)) => Ok(after),
            None => Ok(self.cache.add_message(message)),
        }
    }

    /// Delete a message
    pub async fn delete_message(
        &self,
        channel_id: Snowflake,
        message_id: Snowflake,
    ) -> Result<(), ClientError> {
        self.rest
            .request(routes::delete_message(channel_id, message_id), RequestOptions::new())
            .await?;
        self.cache.remove_message(message_id);
        Ok(())
    }

    /// Modify guild settings; the returned snapshot refreshes the cache
    pub async fn modify_guild(
        &self,
        guild_id: Snowflake,
        body: Value,
        reason: Option<&str>,
    ) -> Result<Guild, ClientError> {
        let mut options = RequestOptions::new().json(body);
        if let Some(reason) = reason {
            options = options.reason(reason);
        }
        let response = self.rest.request(routes::modify_guild(guild_id), options).await?;
        let payload: GuildPayload = entity(response)?;
        match self.cache.update_guild(payload.clone()) {
            Some((_, after)) => Ok(after),
            None => Ok(self.cache.upsert_guild(payload)),
        }
    }

    /// Leave a guild
    pub async fn leave_guild(&self, guild_id: Snowflake) -> Result<(), ClientError> {
        self.rest
            .request(routes::leave_guild(guild_id), RequestOptions::new())
            .await?;
        self.cache.remove_guild(guild_id);
        Ok(())
    }

    /// Modify a guild channel; the returned snapshot refreshes the cache
    pub async fn modify_channel(
        &self,
        channel_id: Snowflake,
        body: Value,
        reason: Option<&str>,
    ) -> Result<GuildChannel, ClientError> {
        let mut options = RequestOptions::new().json(body);
        if let Some(reason) = reason {
            options = options.reason(reason);
        }
        let response = self.rest.request(routes::modify_channel(channel_id), options).await?;
        let channel: GuildChannel = entity(response)?;
        if let Some(guild_id) = channel.guild_id {
            if let Some((_, after)) = self.cache.update_channel(guild_id, channel.clone()) {
                return Ok(after);
            }
        }
        Ok(channel)
    }

    /// Delete a guild channel
    pub async fn delete_channel(&self, channel_id: Snowflake) -> Result<(), ClientError> {
        let response = self
            .rest
            .request(routes::delete_channel(channel_id), RequestOptions::new())
            .await?;
        if let Ok(channel) = entity::<GuildChannel>(response) {
            if let Some(guild_id) = channel.guild_id {
                self.cache.remove_channel(guild_id, channel.id);
            }
        }
        Ok(())
    }
}

fn wrap<F, Fut>(callback: F) -> Callback
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |event| Box::pin(callback(event)))
}

fn entity<T: serde::de::DeserializeOwned>(response: ApiResponse) -> Result<T, ClientError> {
    let value = response.into_json().ok_or(ClientError::EmptyResponse)?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_requires_login() {
        let client = Client::default();
        let result = client.connect(GatewayIntents::unprivileged()).await;
        assert!(matches!(result, Err(ClientError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_wait_for_times_out_distinctly() {
        let client = Client::default();
        let result = client
            .wait_for(EventKind::Ready, |_| true, Duration::from_millis(10))
            .await;
        assert!(matches!(result, Err(ClientError::WaitTimeout)));
    }

    #[test]
    fn test_client_starts_not_ready() {
        let client = Client::default();
        assert!(!client.is_ready());
        assert!(client.client_user().is_none());
    }

    #[test]
    fn test_entity_decoding() {
        let response = ApiResponse::Json(json!({"id": "1", "username": "alice"}));
        let user: User = entity(response).unwrap();
        assert_eq!(user.username, "alice");

        assert!(matches!(
            entity::<User>(ApiResponse::Empty),
            Err(ClientError::EmptyResponse)
        ));
    }
}
