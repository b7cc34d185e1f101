//! Role entity

use crate::value_objects::Snowflake;
use serde::{Deserialize, Serialize};

/// A guild role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub permissions: Option<String>,
    #[serde(default)]
    pub mentionable: bool,
}

impl Role {
    /// Replace this role's fields with those from a newer payload.
    pub fn update_from(&mut self, other: Role) {
        self.name = other.name;
        self.color = other.color;
        self.hoist = other.hoist;
        self.position = other.position;
        self.permissions = other.permissions;
        self.mentionable = other.mentionable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_deserialize() {
        let role: Role =
            serde_json::from_str(r#"{"id": "1", "name": "admin", "color": 16711680}"#).unwrap();
        assert_eq!(role.id, Snowflake::new(1));
        assert_eq!(role.name, "admin");
        assert_eq!(role.color, 16_711_680);
    }

    #[test]
    fn test_role_update_from() {
        let mut role: Role = serde_json::from_str(r#"{"id": "1", "name": "admin"}"#).unwrap();
        let newer: Role = serde_json::from_str(r#"{"id": "1", "name": "mod"}"#).unwrap();

        role.update_from(newer);
        assert_eq!(role.name, "mod");
        assert_eq!(role.id, Snowflake::new(1));
    }
}
