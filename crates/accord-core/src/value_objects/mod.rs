//! Value objects - small immutable types used across the domain

mod intents;
mod snowflake;

pub use intents::GatewayIntents;
pub use snowflake::{Snowflake, SnowflakeParseError};
