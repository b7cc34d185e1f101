//! Session bookkeeping shared between the read loop and the heartbeat task

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Mutable session state: id, sequence cursor, and heartbeat timing.
///
/// Shared behind an `Arc` between the connection read loop and the
/// heartbeat task.
#[derive(Debug, Default)]
pub struct SessionState {
    session_id: RwLock<Option<String>>,
    sequence: Mutex<Option<u64>>,
    heartbeat_interval_ms: AtomicU64,
    last_heartbeat: Mutex<Option<Instant>>,
    last_ack: Mutex<Option<Instant>>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the session id captured from the READY dispatch
    pub fn set_session_id(&self, id: impl Into<String>) {
        *self.session_id.write() = Some(id.into());
    }

    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.session_id.read().clone()
    }

    /// Advance the sequence cursor from a dispatch frame
    pub fn observe_sequence(&self, seq: u64) {
        *self.sequence.lock() = Some(seq);
    }

    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        *self.sequence.lock()
    }

    pub fn set_heartbeat_interval(&self, interval_ms: u64) {
        self.heartbeat_interval_ms
            .store(interval_ms, Ordering::Relaxed);
    }

    #[must_use]
    pub fn heartbeat_interval_ms(&self) -> u64 {
        self.heartbeat_interval_ms.load(Ordering::Relaxed)
    }

    pub fn record_heartbeat(&self) {
        *self.last_heartbeat.lock() = Some(Instant::now());
    }

    #[must_use]
    pub fn last_heartbeat(&self) -> Option<Instant> {
        *self.last_heartbeat.lock()
    }

    pub fn record_ack(&self) {
        *self.last_ack.lock() = Some(Instant::now());
    }

    #[must_use]
    pub fn last_ack(&self) -> Option<Instant> {
        *self.last_ack.lock()
    }

    /// Session id and sequence, when both survive for a resume attempt
    #[must_use]
    pub fn resume_data(&self) -> Option<(String, u64)> {
        let id = self.session_id.read().clone()?;
        let seq = (*self.sequence.lock())?;
        Some((id, seq))
    }

    /// Discard the session so the next connection identifies afresh
    pub fn clear(&self) {
        *self.session_id.write() = None;
        *self.sequence.lock() = None;
        *self.last_heartbeat.lock() = None;
        *self.last_ack.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_data_needs_both_parts() {
        let session = SessionState::new();
        assert!(session.resume_data().is_none());

        session.set_session_id("abc");
        assert!(session.resume_data().is_none());

        session.observe_sequence(12);
        assert_eq!(session.resume_data(), Some(("abc".to_string(), 12)));
    }

    #[test]
    fn test_clear_discards_session() {
        let session = SessionState::new();
        session.set_session_id("abc");
        session.observe_sequence(5);
        session.record_heartbeat();
        session.record_ack();

        session.clear();
        assert!(session.session_id().is_none());
        assert!(session.sequence().is_none());
        assert!(session.last_heartbeat().is_none());
        assert!(session.last_ack().is_none());
    }

    #[test]
    fn test_sequence_advances() {
        let session = SessionState::new();
        session.observe_sequence(1);
        session.observe_sequence(2);
        assert_eq!(session.sequence(), Some(2));
    }
}
