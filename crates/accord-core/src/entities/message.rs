//! Message entity

use crate::entities::User;
use crate::value_objects::Snowflake;
use serde::{Deserialize, Serialize};

/// A message posted to a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub edited_timestamp: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

impl Message {
    /// Replace this message's fields with those from a newer payload.
    ///
    /// Edit events omit immutable fields (author, creation timestamp), so
    /// those are only overwritten when present in the new payload.
    pub fn update_from(&mut self, other: Message) {
        self.content = other.content;
        self.edited_timestamp = other.edited_timestamp;
        self.pinned = other.pinned;
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.timestamp.is_some() {
            self.timestamp = other.timestamp;
        }
    }
}
