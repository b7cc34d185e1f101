//! User entity

use crate::value_objects::Snowflake;
use serde::{Deserialize, Serialize};

/// A platform user, including the client's own identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// Replace this user's fields with those from a newer payload.
    ///
    /// The ID never changes; the cache slot identity is preserved.
    pub fn update_from(&mut self, other: User) {
        self.username = other.username;
        self.discriminator = other.discriminator;
        self.avatar = other.avatar;
        self.bot = other.bot;
    }

    /// Full username tag, e.g. `name#0001`
    #[must_use]
    pub fn tag(&self) -> String {
        match &self.discriminator {
            Some(d) => format!("{}#{}", self.username, d),
            None => self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserialize_wire_payload() {
        let user: User = serde_json::from_str(
            r#"{"id": "123", "username": "alice", "discriminator": "0001", "avatar": null}"#,
        )
        .unwrap();
        assert_eq!(user.id, Snowflake::new(123));
        assert_eq!(user.username, "alice");
        assert!(!user.bot);
    }

    #[test]
    fn test_user_update_from_keeps_id() {
        let mut user: User =
            serde_json::from_str(r#"{"id": "123", "username": "alice"}"#).unwrap();
        let newer: User = serde_json::from_str(r#"{"id": "123", "username": "alicia"}"#).unwrap();

        user.update_from(newer);
        assert_eq!(user.id, Snowflake::new(123));
        assert_eq!(user.username, "alicia");
    }

    #[test]
    fn test_user_tag() {
        let user: User =
            serde_json::from_str(r#"{"id": "1", "username": "bob", "discriminator": "0420"}"#)
                .unwrap();
        assert_eq!(user.tag(), "bob#0420");
    }
}
