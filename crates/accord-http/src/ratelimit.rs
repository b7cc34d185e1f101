//! Global rate-limit gate
//!
//! When the server declares a global rate limit, every concurrent caller
//! must block before sending until the declared cooldown elapses. The gate
//! holds that single global flag; per-bucket limits are handled inline by
//! the request retry loop.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

/// Serializes outbound REST calls against a server-declared global cooldown
#[derive(Debug, Default)]
pub struct RateLimitGate {
    locked: Mutex<bool>,
    notify: Notify,
}

impl RateLimitGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the global flag is currently set
    #[must_use]
    pub fn is_locked(&self) -> bool {
        *self.locked.lock()
    }

    /// Wait until the global flag is clear.
    ///
    /// Returns immediately when no global cooldown is active.
    pub async fn acquire(&self) {
        loop {
            // Arm the wakeup before the check so a clear between the check
            // and the await cannot be missed.
            let notified = self.notify.notified();
            if !self.is_locked() {
                return;
            }
            notified.await;
        }
    }

    /// Set the global flag, sleep out the cooldown, then clear and wake
    /// every blocked caller.
    pub async fn lock_for(&self, cooldown: Duration) {
        *self.locked.lock() = true;
        tracing::warn!(cooldown_ms = cooldown.as_millis() as u64, "global rate limit hit");

        tokio::time::sleep(cooldown).await;

        *self.locked.lock() = false;
        self.notify.notify_waiters();
    }
}
