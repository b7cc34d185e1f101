//! Heartbeat task
//!
//! Sends a heartbeat frame at the server-declared cadence and watches the
//! ack clock. An ack older than the interval plus the drift threshold is
//! logged as a warning; the beat is sent regardless.

use crate::protocol::GatewayMessage;
use crate::session::SessionState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawn the heartbeat loop for one connection.
///
/// The task ends when the outbound channel closes, which happens when the
/// connection's writer goes away.
pub fn spawn_heartbeat(
    session: Arc<SessionState>,
    outbound: mpsc::Sender<GatewayMessage>,
    interval: Duration,
    drift_threshold: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            // A stale ack means the schedule drifted or the server went
            // quiet; observable, never a reason to drop the link here.
            if let Some(last_ack) = session.last_ack() {
                let gap = last_ack.elapsed();
                if gap > interval + drift_threshold {
                    tracing::warn!(
                        gap_ms = gap.as_millis() as u64,
                        interval_ms = interval.as_millis() as u64,
                        "heartbeat ack overdue"
                    );
                }
            }

            let frame = GatewayMessage::heartbeat(session.sequence());
            if outbound.send(frame).await.is_err() {
                tracing::debug!("outbound channel closed, stopping heartbeat");
                break;
            }
            session.record_heartbeat();
        }
    })
}
