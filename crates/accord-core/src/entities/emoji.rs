//! Custom emoji entity

use crate::value_objects::Snowflake;
use serde::{Deserialize, Serialize};

/// A guild's custom emoji
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub available: bool,
}

impl Emoji {
    /// Replace this emoji's fields with those from a newer payload.
    pub fn update_from(&mut self, other: Emoji) {
        self.name = other.name;
        self.animated = other.animated;
        self.managed = other.managed;
        self.available = other.available;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emoji_deserialize() {
        let emoji: Emoji =
            serde_json::from_str(r#"{"id": "55", "name": "pog", "animated": true}"#).unwrap();
        assert_eq!(emoji.id, Snowflake::new(55));
        assert_eq!(emoji.name, "pog");
        assert!(emoji.animated);
    }
}
