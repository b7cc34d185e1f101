//! Gateway connection state machine
//!
//! One `GatewayConnection` owns the reconnect loop: each pass dials the
//! websocket, walks the Hello/Identify (or Resume) handshake, and pumps
//! dispatch frames to the consumer channel in arrival order. Dropped
//! connections are retried with capped exponential backoff; sessions that
//! survive are resumed rather than re-identified.

use crate::compression::Inflater;
use crate::error::GatewayError;
use crate::heartbeat::spawn_heartbeat;
use crate::protocol::{
    GatewayMessage, HelloPayload, IdentifyPayload, OpCode, ResumePayload,
};
use crate::session::SessionState;
use accord_common::GatewayConfig;
use accord_core::GatewayIntents;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Lifecycle of a gateway connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingHello,
    Identifying,
    Connected,
    Reconnecting,
}

/// A raw dispatch forwarded to the event consumer
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub event: String,
    pub seq: Option<u64>,
    pub data: Value,
}

/// How one connection pass ended
enum LoopEnd {
    /// The consumer dropped its receiver; shut down for good.
    ReceiverDropped,
    /// The link dropped or the server asked us to reconnect.
    Reconnect { resumable: bool },
}

/// The persistent gateway connection
pub struct GatewayConnection {
    config: GatewayConfig,
    token: String,
    intents: GatewayIntents,
    session: Arc<SessionState>,
    state: RwLock<ConnectionState>,
    events: mpsc::Sender<DispatchRecord>,
}

impl GatewayConnection {
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        token: impl Into<String>,
        intents: GatewayIntents,
        events: mpsc::Sender<DispatchRecord>,
    ) -> Self {
        Self {
            config,
            token: token.into(),
            intents,
            session: Arc::new(SessionState::new()),
            state: RwLock::new(ConnectionState::Disconnected),
            events,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    #[must_use]
    pub fn session(&self) -> Arc<SessionState> {
        Arc::clone(&self.session)
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
        tracing::debug!(state = ?state, "gateway state changed");
    }

    fn gateway_url(&self, base_url: &str) -> String {
        let mut url = format!(
            "{}/?v={}&encoding=json",
            base_url.trim_end_matches('/'),
            self.config.version
        );
        if self.config.compress {
            url.push_str("&compress=zlib-stream");
        }
        url
    }

    /// Run the connection until the event receiver is dropped.
    ///
    /// Reconnects on failure with exponential backoff capped at the
    /// configured maximum; the backoff resets once a handshake completes.
    pub async fn run(&self, base_url: &str) -> Result<(), GatewayError> {
        let url = self.gateway_url(base_url);
        let mut backoff_secs = 1u64;

        loop {
            self.set_state(ConnectionState::Connecting);

            let reached_connected = match self.run_once(&url).await {
                Ok((LoopEnd::ReceiverDropped, _)) => {
                    tracing::info!("event consumer gone, closing gateway");
                    self.set_state(ConnectionState::Disconnected);
                    return Ok(());
                }
                Ok((LoopEnd::Reconnect { resumable }, reached_connected)) => {
                    if !resumable {
                        self.session.clear();
                    }
                    tracing::info!(resumable, "gateway reconnecting");
                    reached_connected
                }
                Err(err) => {
                    tracing::warn!(error = %err, "gateway connection failed");
                    false
                }
            };

            self.set_state(ConnectionState::Reconnecting);
            let delay =
                reconnect_delay(&mut backoff_secs, reached_connected, self.config.max_backoff_secs);
            tokio::time::sleep(delay).await;
        }
    }

    async fn run_once(&self, url: &str) -> Result<(LoopEnd, bool), GatewayError> {
        tracing::debug!(url, "dialing gateway");
        let (socket, _) = connect_async(url).await?;
        let (mut sink, mut stream) = socket.split();
        self.set_state(ConnectionState::AwaitingHello);

        // Outbound frames (heartbeats and handshake) funnel through one
        // writer task so the sink has a single owner.
        let (outbound_tx, mut outbound_rx) = mpsc::channel::<GatewayMessage>(16);
        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let text = match frame.to_json() {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::error!(error = %err, "failed to encode outbound frame");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        });

        let mut inflater = Inflater::new();
        let mut heartbeat = None;
        let mut reached_connected = false;

        let end = loop {
            let Some(frame) = stream.next().await else {
                break LoopEnd::Reconnect { resumable: true };
            };

            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Binary(bytes)) => match inflater.extend(&bytes) {
                    Ok(Some(text)) => text,
                    Ok(None) => continue,
                    Err(err) => {
                        // The shared zlib context cannot recover from a bad
                        // frame; only a fresh connection can.
                        tracing::warn!(error = %err, "compression context corrupted, reconnecting");
                        break LoopEnd::Reconnect { resumable: true };
                    }
                },
                Ok(Message::Close(close)) => {
                    tracing::info!(frame = ?close, "server closed the connection");
                    break LoopEnd::Reconnect { resumable: true };
                }
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "websocket read error");
                    break LoopEnd::Reconnect { resumable: true };
                }
            };

            let message = match GatewayMessage::from_json(&text) {
                Ok(message) => message,
                Err(err) => {
                    // A single bad frame never drops the connection.
                    tracing::debug!(error = %err, "ignoring malformed frame");
                    continue;
                }
            };

            match message.op {
                OpCode::Hello => {
                    let hello: HelloPayload = message
                        .d
                        .map(serde_json::from_value)
                        .transpose()?
                        .unwrap_or(HelloPayload {
                            heartbeat_interval: 41_250,
                        });
                    self.session
                        .set_heartbeat_interval(hello.heartbeat_interval);
                    heartbeat = Some(spawn_heartbeat(
                        self.session(),
                        outbound_tx.clone(),
                        Duration::from_millis(hello.heartbeat_interval),
                        Duration::from_secs(self.config.drift_threshold_secs),
                    ));

                    self.set_state(ConnectionState::Identifying);
                    let frame = self.handshake_frame();
                    if outbound_tx.send(frame).await.is_err() {
                        break LoopEnd::Reconnect { resumable: true };
                    }
                }
                OpCode::Heartbeat => {
                    // Server-requested beat, answered out of cadence.
                    let frame = GatewayMessage::heartbeat(self.session.sequence());
                    if outbound_tx.send(frame).await.is_err() {
                        break LoopEnd::Reconnect { resumable: true };
                    }
                }
                OpCode::HeartbeatAck => {
                    self.session.record_ack();
                }
                OpCode::Reconnect => {
                    tracing::info!("server requested reconnect");
                    break LoopEnd::Reconnect { resumable: true };
                }
                OpCode::InvalidSession => {
                    let resumable = message
                        .d
                        .as_ref()
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    tracing::warn!(resumable, "session invalidated");
                    break LoopEnd::Reconnect { resumable };
                }
                OpCode::Dispatch => {
                    if let Some(seq) = message.s {
                        self.session.observe_sequence(seq);
                    }
                    let Some(event) = message.t else { continue };
                    let data = message.d.unwrap_or(Value::Null);

                    if event == "READY" {
                        if let Some(id) = data.get("session_id").and_then(Value::as_str) {
                            self.session.set_session_id(id);
                        }
                    }
                    if !reached_connected {
                        reached_connected = true;
                        self.set_state(ConnectionState::Connected);
                    }

                    let record = DispatchRecord {
                        event,
                        seq: message.s,
                        data,
                    };
                    if self.events.send(record).await.is_err() {
                        break LoopEnd::ReceiverDropped;
                    }
                }
                OpCode::Identify | OpCode::Resume | OpCode::RequestGuildMembers => {
                    tracing::debug!(op = %message.op, "ignoring client-only op from server");
                }
            }
        };

        if let Some(task) = heartbeat {
            task.abort();
        }
        writer.abort();
        Ok((end, reached_connected))
    }

    /// Resume when a session survives, otherwise identify afresh
    fn handshake_frame(&self) -> GatewayMessage {
        if let Some((session_id, seq)) = self.session.resume_data() {
            tracing::info!(seq, "resuming session");
            GatewayMessage::resume(&ResumePayload {
                token: self.token.clone(),
                session_id,
                seq,
            })
        } else {
            tracing::info!("identifying new session");
            GatewayMessage::identify(&IdentifyPayload::new(
                self.token.clone(),
                self.intents.value(),
                self.config.compress,
            ))
        }
    }
}

/// Next reconnect delay: a session that completed its handshake retries
/// quickly again; repeated failures escalate up to the cap.
fn reconnect_delay(backoff_secs: &mut u64, reached_connected: bool, max_secs: u64) -> Duration {
    if reached_connected {
        *backoff_secs = 1;
    }
    let delay = Duration::from_secs(*backoff_secs);
    *backoff_secs = (*backoff_secs * 2).min(max_secs);
    delay
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(compress: bool) -> GatewayConnection {
        let (tx, _rx) = mpsc::channel(1);
        let config = GatewayConfig {
            compress,
            ..GatewayConfig::default()
        };
        GatewayConnection::new(config, "token", GatewayIntents::unprivileged(), tx)
    }

    #[test]
    fn test_gateway_url_with_compression() {
        let conn = connection(true);
        assert_eq!(
            conn.gateway_url("wss://gateway.example.com"),
            "wss://gateway.example.com/?v=9&encoding=json&compress=zlib-stream"
        );
    }

    #[test]
    fn test_gateway_url_without_compression() {
        let conn = connection(false);
        assert_eq!(
            conn.gateway_url("wss://gateway.example.com/"),
            "wss://gateway.example.com/?v=9&encoding=json"
        );
    }

    #[test]
    fn test_handshake_prefers_resume() {
        let conn = connection(true);
        let frame = conn.handshake_frame();
        assert_eq!(frame.op, OpCode::Identify);

        conn.session.set_session_id("sess");
        conn.session.observe_sequence(41);
        let frame = conn.handshake_frame();
        assert_eq!(frame.op, OpCode::Resume);
        let data = frame.d.unwrap();
        assert_eq!(data["session_id"], "sess");
        assert_eq!(data["seq"], 41);
    }

    #[test]
    fn test_initial_state() {
        let conn = connection(true);
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_reconnect_backoff_escalates_and_caps() {
        let mut backoff = 1u64;
        assert_eq!(reconnect_delay(&mut backoff, false, 64), Duration::from_secs(1));
        assert_eq!(reconnect_delay(&mut backoff, false, 64), Duration::from_secs(2));
        assert_eq!(reconnect_delay(&mut backoff, false, 64), Duration::from_secs(4));

        let mut backoff = 64u64;
        assert_eq!(reconnect_delay(&mut backoff, false, 64), Duration::from_secs(64));
        assert_eq!(backoff, 64);
    }

    #[test]
    fn test_reconnect_backoff_resets_after_healthy_session() {
        let mut backoff = 1u64;
        for _ in 0..6 {
            reconnect_delay(&mut backoff, false, 64);
        }
        assert_eq!(backoff, 64);

        // A connection that reached the connected state starts over
        assert_eq!(reconnect_delay(&mut backoff, true, 64), Duration::from_secs(1));
        assert_eq!(reconnect_delay(&mut backoff, false, 64), Duration::from_secs(2));
    }
}
