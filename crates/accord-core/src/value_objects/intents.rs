//! Gateway intents bitmask
//!
//! Declared at identify time to select which event categories the server
//! will send over the gateway connection.

use bitflags::bitflags;

bitflags! {
    /// Event categories requested from the gateway
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GatewayIntents: u64 {
        const GUILDS = 1 << 0;
        const GUILD_MEMBERS = 1 << 1;
        const GUILD_BANS = 1 << 2;
        const GUILD_EMOJIS = 1 << 3;
        const GUILD_INTEGRATIONS = 1 << 4;
        const GUILD_WEBHOOKS = 1 << 5;
        const GUILD_INVITES = 1 << 6;
        const GUILD_VOICE_STATES = 1 << 7;
        const GUILD_PRESENCES = 1 << 8;
        const GUILD_MESSAGES = 1 << 9;
        const GUILD_MESSAGE_REACTIONS = 1 << 10;
        const GUILD_MESSAGE_TYPING = 1 << 11;
        const DIRECT_MESSAGES = 1 << 12;
        const DIRECT_MESSAGE_REACTIONS = 1 << 13;
        const DIRECT_MESSAGE_TYPING = 1 << 14;
        const GUILD_SCHEDULED_EVENTS = 1 << 16;
    }
}

impl GatewayIntents {
    /// All intents that do not require privileged access.
    ///
    /// Members and presences must be enabled explicitly in the application
    /// settings, so they are excluded from the default set.
    #[must_use]
    pub fn unprivileged() -> Self {
        Self::all() - Self::GUILD_MEMBERS - Self::GUILD_PRESENCES
    }

    /// The raw bitmask value sent in the identify payload
    #[must_use]
    pub const fn value(self) -> u64 {
        self.bits()
    }
}

impl Default for GatewayIntents {
    fn default() -> Self {
        Self::unprivileged()
    }
}
