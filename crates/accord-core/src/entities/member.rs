//! Guild member entity

use crate::entities::User;
use crate::value_objects::Snowflake;
use serde::{Deserialize, Serialize};

/// A user's membership in a guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: User,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<String>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
}

impl Member {
    /// The member's ID (same as the wrapped user's ID)
    #[inline]
    #[must_use]
    pub fn id(&self) -> Snowflake {
        self.user.id
    }

    /// Display name: nickname when set, username otherwise
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nick.as_deref().unwrap_or(&self.user.username)
    }

    /// Replace this member's fields with those from a newer payload.
    pub fn update_from(&mut self, other: Member) {
        self.user.update_from(other.user);
        self.nick = other.nick;
        self.roles = other.roles;
        self.deaf = other.deaf;
        self.mute = other.mute;
        if other.joined_at.is_some() {
            self.joined_at = other.joined_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_deserialize() {
        let member: Member = serde_json::from_str(
            r#"{"user": {"id": "3", "username": "dave"}, "nick": "d", "roles": ["1", "2"]}"#,
        )
        .unwrap();
        assert_eq!(member.id(), Snowflake::new(3));
        assert_eq!(member.display_name(), "d");
        assert_eq!(member.roles.len(), 2);
    }

    #[test]
    fn test_member_display_name_falls_back_to_username() {
        let member: Member =
            serde_json::from_str(r#"{"user": {"id": "3", "username": "dave"}}"#).unwrap();
        assert_eq!(member.display_name(), "dave");
    }

    #[test]
    fn test_member_update_from() {
        let mut member: Member = serde_json::from_str(
            r#"{"user": {"id": "3", "username": "dave"}, "nick": "old", "joined_at": "2021-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let newer: Member = serde_json::from_str(
            r#"{"user": {"id": "3", "username": "dave"}, "nick": "new"}"#,
        )
        .unwrap();

        member.update_from(newer);
        assert_eq!(member.nick.as_deref(), Some("new"));
        // joined_at is absent from partial updates and must survive
        assert!(member.joined_at.is_some());
    }
}
