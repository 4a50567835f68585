//! WebSocket support for real-time dashboard updates.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use cardsort_core::{CardRecord, RunStatus};

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_LAG_EVENTS, WS_MESSAGES_SENT};
use crate::state::AppState;

/// WebSocket message sent to clients for real-time updates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Periodic status snapshot. Never carries a notification.
    Status(RunStatus),
    /// A card was recorded.
    CardRecorded(CardRecord),
    /// A run was started or resumed.
    RunStarted {
        run_id: Uuid,
        label: String,
        start_slot: u32,
        homed: bool,
    },
    /// A stop was requested.
    StopRequested { emergency: bool },
}

impl WsMessage {
    fn kind(&self) -> &'static str {
        match self {
            WsMessage::Status(_) => "status",
            WsMessage::CardRecorded(_) => "card_recorded",
            WsMessage::RunStarted { .. } => "run_started",
            WsMessage::StopRequested { .. } => "stop_requested",
        }
    }
}

/// Broadcaster for WebSocket messages using tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct WsBroadcaster {
    sender: broadcast::Sender<WsMessage>,
}

impl WsBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Broadcast a message to all connected clients.
    pub fn broadcast(&self, msg: WsMessage) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.sender.send(msg);
    }

    /// Subscribe to receive messages.
    pub fn subscribe(&self) -> broadcast::Receiver<WsMessage> {
        self.sender.subscribe()
    }

    /// Number of connected clients.
    pub fn client_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn card_recorded(&self, record: &CardRecord) {
        self.broadcast(WsMessage::CardRecorded(record.clone()));
    }

    pub fn run_started(&self, run_id: Uuid, label: &str, start_slot: u32, homed: bool) {
        self.broadcast(WsMessage::RunStarted {
            run_id,
            label: label.to_string(),
            start_slot,
            homed,
        });
    }

    pub fn stop_requested(&self, emergency: bool) {
        self.broadcast(WsMessage::StopRequested { emergency });
    }
}

impl Default for WsBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Push a status snapshot every `interval` while at least one client is
/// connected.
pub fn spawn_status_pusher(state: Arc<AppState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let broadcaster = state.ws_broadcaster();
            if broadcaster.client_count() == 0 {
                continue;
            }
            broadcaster.broadcast(WsMessage::Status(state.supervisor().peek_status()));
        }
    })
}

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut rx = state.ws_broadcaster().subscribe();

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();

    info!("WebSocket client connected");

    // Forward broadcast messages to this client
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    WS_MESSAGES_SENT.with_label_values(&[msg.kind()]).inc();

                    match serde_json::to_string(&msg) {
                        Ok(json) => {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                debug!("WebSocket send failed, client disconnected");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize WsMessage: {}", e);
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged, skipped {} messages", n);
                    WS_LAG_EVENTS.inc();
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Broadcast channel closed");
                    break;
                }
            }
        }
    });

    // Clients only talk to us to close the connection
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Text(text)) => {
                debug!("Received text message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    WS_CONNECTIONS_ACTIVE.dec();
    info!("WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardsort_core::testing::fixtures::card_record;

    #[test]
    fn test_card_recorded_message_shape() {
        let json = serde_json::to_value(WsMessage::CardRecorded(card_record("A", 3))).unwrap();
        assert_eq!(json["type"], "card_recorded");
        assert_eq!(json["label"], "A");
        assert_eq!(json["slot"], 3);
    }

    #[test]
    fn test_stop_requested_message_shape() {
        let json = serde_json::to_value(WsMessage::StopRequested { emergency: true }).unwrap();
        assert_eq!(json["type"], "stop_requested");
        assert_eq!(json["emergency"], true);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let broadcaster = WsBroadcaster::new(8);
        assert_eq!(broadcaster.client_count(), 0);

        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.client_count(), 1);

        broadcaster.stop_requested(false);
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.kind(), "stop_requested");
    }
}
