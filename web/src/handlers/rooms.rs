//! WebSocket handler for per-expert rooms.
//!
//! # Message Protocol
//!
//! **Client → Server:**
//! ```json
//! { "type": "joinExpertRoom", "expertId": "…" }
//! { "type": "leaveExpertRoom", "expertId": "…" }
//! { "type": "ping" }
//! ```
//!
//! **Server → Client (acknowledgements):**
//! ```json
//! { "type": "joined", "expertId": "…" }
//! { "type": "left", "expertId": "…" }
//! { "type": "pong" }
//! { "type": "error", "message": "…" }
//! ```
//!
//! **Server → Client (slot events):**
//! ```json
//! { "type": "slotBooked", "expertId": "…", "date": "2024-06-01",
//!   "timeSlot": { "startTime": "09:00", "endTime": "10:00" } }
//! { "type": "slotStatusUpdated", …, "status": "Confirmed" }
//! ```
//!
//! # Connection Management
//!
//! - Connection cap from [`ExpertRooms`]; excess upgrades get `503`
//! - Protocol ping every `ping_interval`
//! - Closed after `idle_timeout` without client traffic

use crate::state::RealtimeState;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use expert_booking_core::{ExpertId, ExpertRooms, Subscriber, SubscriberId};
use futures::{SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

/// Messages sent by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Start receiving an expert's slot events
    JoinExpertRoom {
        /// Expert to watch
        expert_id: String,
    },
    /// Stop receiving an expert's slot events
    LeaveExpertRoom {
        /// Expert to stop watching
        expert_id: String,
    },
    /// Application-level keep-alive
    Ping,
}

/// Replies sent by the server.
///
/// Slot events are sent as [`SlotEvent`](expert_booking_core::SlotEvent) JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Room joined
    Joined {
        /// Expert watched
        expert_id: ExpertId,
    },
    /// Room left
    Left {
        /// Expert no longer watched
        expert_id: ExpertId,
    },
    /// Reply to [`ClientMessage::Ping`]
    Pong,
    /// Client message was not understood
    Error {
        /// What went wrong
        message: String,
    },
}

/// WebSocket endpoint for expert room subscriptions (`GET /ws`).
#[allow(clippy::unused_async)] // Axum handler signature requires async
pub async fn expert_rooms_socket(
    ws: WebSocketUpgrade,
    State(state): State<RealtimeState>,
) -> Response {
    // Check connection limit
    let Some(subscriber) = state.rooms.connect().await else {
        let current_connections = state.rooms.subscriber_count().await;
        warn!(current_connections, "WebSocket connection limit exceeded");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "Too many concurrent connections. Please try again later.",
        )
            .into_response();
    };

    let id = subscriber.id;
    let rooms = Arc::clone(&state.rooms);
    ws.on_failed_upgrade(move |error| {
        warn!(subscriber = %id, error = %error, "WebSocket upgrade failed");
        tokio::spawn(async move {
            rooms.disconnect(id).await;
        });
    })
    .on_upgrade(move |socket| handle_socket(socket, subscriber, state))
}

async fn handle_socket(socket: WebSocket, subscriber: Subscriber, state: RealtimeState) {
    let Subscriber { id, mut events } = subscriber;
    let rooms = Arc::clone(&state.rooms);
    let settings = state.settings;

    metrics::gauge!("booking_realtime_connections").increment(1.0);
    info!(subscriber = %id, "WebSocket connection established");

    let (mut sender, mut receiver) = socket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(16);

    // Spawn task to push events, replies and pings to the client
    let mut send_task = tokio::spawn(async move {
        let mut ping_interval = interval_at(
            Instant::now() + settings.ping_interval,
            settings.ping_interval,
        );
        loop {
            let message = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => encode(&event),
                    // Registry dropped this subscriber
                    None => break,
                },
                Some(reply) = reply_rx.recv() => encode(&reply),
                _ = ping_interval.tick() => Some(Message::Ping(Vec::new())),
            };
            let Some(message) = message else {
                continue;
            };
            if sender.send(message).await.is_err() {
                debug!("Client disconnected");
                break;
            }
        }
        debug!("WebSocket send task terminated");
    });

    // Spawn task to handle client commands
    let recv_rooms = Arc::clone(&rooms);
    let mut recv_task = tokio::spawn(async move {
        let timeout = tokio::time::sleep(settings.idle_timeout);
        tokio::pin!(timeout);

        loop {
            tokio::select! {
                msg = receiver.next() => {
                    let Some(Ok(msg)) = msg else {
                        break;
                    };
                    timeout.as_mut().reset(Instant::now() + settings.idle_timeout);
                    match msg {
                        Message::Text(text) => {
                            let reply = handle_client_message(&recv_rooms, id, &text).await;
                            if reply_tx.send(reply).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => {
                            info!("Client requested close");
                            break;
                        }
                        Message::Pong(_) | Message::Ping(_) => {
                            debug!("Keep-alive received");
                        }
                        Message::Binary(_) => {
                            warn!("Received unexpected binary message");
                        }
                    }
                }
                () = &mut timeout => {
                    warn!(subscriber = %id, "WebSocket idle timeout");
                    break;
                }
            }
        }
        debug!("WebSocket receive task terminated");
    });

    // Wait for either task to complete (connection closed)
    tokio::select! {
        _ = (&mut send_task) => {
            debug!("Send task completed, aborting receive task");
            recv_task.abort();
        },
        _ = (&mut recv_task) => {
            debug!("Receive task completed, aborting send task");
            send_task.abort();
        },
    }

    rooms.disconnect(id).await;
    metrics::gauge!("booking_realtime_connections").decrement(1.0);
    info!(subscriber = %id, "WebSocket connection closed");
}

async fn handle_client_message(rooms: &ExpertRooms, id: SubscriberId, text: &str) -> ServerMessage {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "Failed to parse WebSocket message");
            return ServerMessage::Error {
                message: "Unrecognized message".to_string(),
            };
        }
    };

    match message {
        ClientMessage::JoinExpertRoom { expert_id } => match expert_id.parse::<ExpertId>() {
            Ok(expert_id) => {
                rooms.join(id, expert_id).await;
                ServerMessage::Joined { expert_id }
            }
            Err(_) => invalid_expert(&expert_id),
        },
        ClientMessage::LeaveExpertRoom { expert_id } => match expert_id.parse::<ExpertId>() {
            Ok(expert_id) => {
                rooms.leave(id, expert_id).await;
                ServerMessage::Left { expert_id }
            }
            Err(_) => invalid_expert(&expert_id),
        },
        ClientMessage::Ping => ServerMessage::Pong,
    }
}

fn invalid_expert(raw: &str) -> ServerMessage {
    ServerMessage::Error {
        message: format!("Invalid expert id: {raw}"),
    }
}

fn encode<T: Serialize>(value: &T) -> Option<Message> {
    match serde_json::to_string(value) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize WebSocket message");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let parsed: ClientMessage =
            serde_json::from_str(r#"{"type":"joinExpertRoom","expertId":"abc"}"#).unwrap();
        assert_eq!(
            parsed,
            ClientMessage::JoinExpertRoom {
                expert_id: "abc".to_string()
            }
        );

        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, ClientMessage::Ping);
    }

    #[test]
    fn test_socket_handler_is_routable() {
        // Compiles only while the handler future stays Send
        let state = RealtimeState::new(
            Arc::new(ExpertRooms::default()),
            crate::state::RealtimeSettings::default(),
        );
        let _router: axum::Router = axum::Router::new()
            .route("/ws", axum::routing::get(expert_rooms_socket))
            .with_state(state);
    }

    #[test]
    fn test_server_message_wire_format() {
        let json = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);

        let expert_id = ExpertId::new();
        let json = serde_json::to_value(ServerMessage::Joined { expert_id }).unwrap();
        assert_eq!(json["type"], "joined");
        assert_eq!(json["expertId"], expert_id.to_string());
    }

    #[tokio::test]
    async fn test_join_with_invalid_id_is_an_error_reply() {
        let rooms = ExpertRooms::default();
        let sub = rooms.connect().await.unwrap();

        let reply = handle_client_message(
            &rooms,
            sub.id,
            r#"{"type":"joinExpertRoom","expertId":"not-a-uuid"}"#,
        )
        .await;
        assert!(matches!(reply, ServerMessage::Error { .. }));

        let expert_id = ExpertId::new();
        let reply = handle_client_message(
            &rooms,
            sub.id,
            &format!(r#"{{"type":"joinExpertRoom","expertId":"{expert_id}"}}"#),
        )
        .await;
        assert_eq!(reply, ServerMessage::Joined { expert_id });
        assert_eq!(rooms.room_size(expert_id).await, 1);
    }
}
