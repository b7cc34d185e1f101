//! Route table for the endpoints the client exercises

use crate::route::Route;
use accord_core::Snowflake;
use reqwest::Method;

/// Gateway connection URL
#[must_use]
pub fn get_gateway() -> Route {
    Route::new(Method::GET, "/gateway", "/gateway".to_string())
}

// === Users ===

#[must_use]
pub fn get_current_user() -> Route {
    Route::new(Method::GET, "/users/@me", "/users/@me".to_string())
}

#[must_use]
pub fn get_user(user_id: Snowflake) -> Route {
    Route::new(Method::GET, "/users/{user_id}", format!("/users/{user_id}"))
}

#[must_use]
pub fn create_dm() -> Route {
    Route::new(Method::POST, "/users/@me/channels", "/users/@me/channels".to_string())
}

// === Guilds ===

#[must_use]
pub fn get_guild(guild_id: Snowflake) -> Route {
    Route::new(Method::GET, "/guilds/{guild_id}", format!("/guilds/{guild_id}"))
}

#[must_use]
pub fn modify_guild(guild_id: Snowflake) -> Route {
    Route::new(Method::PATCH, "/guilds/{guild_id}", format!("/guilds/{guild_id}"))
}

#[must_use]
pub fn leave_guild(guild_id: Snowflake) -> Route {
    Route::new(
        Method::DELETE,
        "/users/@me/guilds/{guild_id}",
        format!("/users/@me/guilds/{guild_id}"),
    )
}

// === Channels ===

#[must_use]
pub fn get_channel(channel_id: Snowflake) -> Route {
    Route::new(Method::GET, "/channels/{channel_id}", format!("/channels/{channel_id}"))
}

#[must_use]
pub fn modify_channel(channel_id: Snowflake) -> Route {
    Route::new(Method::PATCH, "/channels/{channel_id}", format!("/channels/{channel_id}"))
}

#[must_use]
pub fn delete_channel(channel_id: Snowflake) -> Route {
    Route::new(Method::DELETE, "/channels/{channel_id}", format!("/channels/{channel_id}"))
}

// === Messages ===

#[must_use]
pub fn create_message(channel_id: Snowflake) -> Route {
    Route::new(
        Method::POST,
        "/channels/{channel_id}/messages",
        format!("/channels/{channel_id}/messages"),
    )
}

#[must_use]
pub fn edit_message(channel_id: Snowflake, message_id: Snowflake) -> Route {
    Route::new(
        Method::PATCH,
        "/channels/{channel_id}/messages/{message_id}",
        format!("/channels/{channel_id}/messages/{message_id}"),
    )
}

#[must_use]
pub fn delete_message(channel_id: Snowflake, message_id: Snowflake) -> Route {
    Route::new(
        Method::DELETE,
        "/channels/{channel_id}/messages/{message_id}",
        format!("/channels/{channel_id}/messages/{message_id}"),
    )
}
