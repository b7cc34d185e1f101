//! Guild scheduled event entity

use crate::value_objects::Snowflake;
use serde::{Deserialize, Serialize};

/// An event scheduled within a guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scheduled_start_time: Option<String>,
    #[serde(default)]
    pub scheduled_end_time: Option<String>,
    #[serde(default)]
    pub channel_id: Option<Snowflake>,
}

impl ScheduledEvent {
    /// Replace this event's fields with those from a newer payload.
    pub fn update_from(&mut self, other: ScheduledEvent) {
        self.name = other.name;
        self.description = other.description;
        self.scheduled_start_time = other.scheduled_start_time;
        self.scheduled_end_time = other.scheduled_end_time;
        self.channel_id = other.channel_id;
        if other.guild_id.is_some() {
            self.guild_id = other.guild_id;
        }
    }
}
