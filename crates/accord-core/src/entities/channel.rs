//! Channel entities - guild channels and direct-message channels

use crate::entities::User;
use crate::value_objects::Snowflake;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Channel type discriminator from the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Text,
    Dm,
    Voice,
    Group,
    Category,
    News,
    Stage,
    /// Unrecognized type; kept verbatim for forward compatibility
    Unknown(u8),
}

impl ChannelType {
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Text,
            1 => Self::Dm,
            2 => Self::Voice,
            3 => Self::Group,
            4 => Self::Category,
            5 => Self::News,
            13 => Self::Stage,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Dm => 1,
            Self::Voice => 2,
            Self::Group => 3,
            Self::Category => 4,
            Self::News => 5,
            Self::Stage => 13,
            Self::Unknown(other) => other,
        }
    }
}

impl Default for ChannelType {
    fn default() -> Self {
        Self::Text
    }
}

impl Serialize for ChannelType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Ok(Self::from_u8(value))
    }
}

/// A channel belonging to a guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildChannel {
    pub id: Snowflake,
    #[serde(default)]
    pub guild_id: Option<Snowflake>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ChannelType,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub parent_id: Option<Snowflake>,
}

impl GuildChannel {
    /// Replace this channel's fields with those from a newer payload.
    pub fn update_from(&mut self, other: GuildChannel) {
        self.name = other.name;
        self.kind = other.kind;
        self.topic = other.topic;
        self.position = other.position;
        self.parent_id = other.parent_id;
        if other.guild_id.is_some() {
            self.guild_id = other.guild_id;
        }
    }
}

/// A direct-message channel between the client and one recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmChannel {
    pub id: Snowflake,
    #[serde(default)]
    pub recipients: Vec<User>,
}

impl DmChannel {
    /// The single recipient of this DM channel, if present in the payload
    #[must_use]
    pub fn recipient(&self) -> Option<&User> {
        self.recipients.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_type_roundtrip() {
        assert_eq!(ChannelType::from_u8(0), ChannelType::Text);
        assert_eq!(ChannelType::from_u8(1), ChannelType::Dm);
        assert_eq!(ChannelType::from_u8(13), ChannelType::Stage);
        assert_eq!(ChannelType::from_u8(99), ChannelType::Unknown(99));
        assert_eq!(ChannelType::Unknown(99).as_u8(), 99);
    }

    #[test]
    fn test_guild_channel_deserialize() {
        let channel: GuildChannel = serde_json::from_str(
            r#"{"id": "5", "guild_id": "1", "name": "general", "type": 0, "position": 2}"#,
        )
        .unwrap();
        assert_eq!(channel.id, Snowflake::new(5));
        assert_eq!(channel.kind, ChannelType::Text);
        assert_eq!(channel.name.as_deref(), Some("general"));
    }

    #[test]
    fn test_guild_channel_update_keeps_guild_id() {
        let mut channel: GuildChannel =
            serde_json::from_str(r#"{"id": "5", "guild_id": "1", "name": "general"}"#).unwrap();
        let newer: GuildChannel =
            serde_json::from_str(r#"{"id": "5", "name": "renamed"}"#).unwrap();

        channel.update_from(newer);
        assert_eq!(channel.name.as_deref(), Some("renamed"));
        assert_eq!(channel.guild_id, Some(Snowflake::new(1)));
    }

    #[test]
    fn test_dm_channel_recipient() {
        let dm: DmChannel = serde_json::from_str(
            r#"{"id": "9", "recipients": [{"id": "7", "username": "carol"}]}"#,
        )
        .unwrap();
        assert_eq!(dm.recipient().map(|u| u.id), Some(Snowflake::new(7)));
    }
}
