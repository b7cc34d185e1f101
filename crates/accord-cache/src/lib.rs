//! # accord-cache
//!
//! In-memory entity store: the single source of truth mutated by inbound
//! gateway events and REST-driven refreshes. All mappings are concurrent
//! maps so the store stays sound under a multi-threaded runtime; reads
//! hand out owned value snapshots.

mod guild_scope;
mod store;

pub use store::CacheStore;
