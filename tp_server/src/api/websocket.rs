//! WebSocket transport for room events.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws` and is assigned a connection id.
//! 2. Server spawns a send task pumping outbound events from the
//!    connection's channel to the socket.
//! 3. Inbound frames are parsed as [`ClientEvent`]s and routed to the room
//!    registry; replies and broadcasts arrive through the event channel.
//! 4. On disconnect the player is removed by connection identity and the
//!    send task is cleaned up.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use teen_patti::game::GameError;
use teen_patti::game::entities::{ConnectionId, PlayerProfile, RoomId};
use teen_patti::net::messages::{ClientEvent, ServerEvent};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::AppState;

/// Upgrade an HTTP connection to a WebSocket session.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive a single WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id: ConnectionId = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    info!("Client connected: {connection_id}");

    // Outbound pump: room actors and the registry push events into the
    // channel; this task serializes them onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize event: {e}");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => handle_client_event(event, connection_id, &tx, &state).await,
                Err(_) => {
                    let _ = tx.send(ServerEvent::Error {
                        message: GameError::MissingFields.to_string(),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }

    // Removal is keyed by connection identity, not user identity.
    state.rooms.disconnect(connection_id).await;
    send_task.abort();

    info!("Client disconnected: {connection_id}");
}

/// Route one parsed client event to the registry.
async fn handle_client_event(
    event: ClientEvent,
    connection_id: ConnectionId,
    tx: &mpsc::UnboundedSender<ServerEvent>,
    state: &AppState,
) {
    match event {
        ClientEvent::JoinRoom {
            user_id,
            username,
            avatar_url,
            balance,
            is_private,
        } => {
            if user_id.is_empty() || username.is_empty() || avatar_url.is_empty() {
                let _ = tx.send(ServerEvent::Error {
                    message: "Missing user info".to_string(),
                });
                return;
            }
            let profile = PlayerProfile {
                user_id,
                username,
                avatar_url,
                balance,
            };
            let result = if is_private {
                state
                    .rooms
                    .create_private_room(profile, connection_id, tx.clone())
                    .await
            } else {
                state
                    .rooms
                    .assign_public_room(profile, connection_id, tx.clone())
                    .await
            };
            // The room confirms with a joined-room event on success.
            if let Err(e) = result {
                let _ = tx.send(ServerEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        ClientEvent::JoinRoomById {
            user_id,
            username,
            avatar_url,
            balance,
            room_id,
        } => {
            if user_id.is_empty() || username.is_empty() || avatar_url.is_empty() {
                let _ = tx.send(ServerEvent::Error {
                    message: "Missing user info".to_string(),
                });
                return;
            }
            let Some(room_id) = parse_room_id(&room_id) else {
                let _ = tx.send(ServerEvent::RoomNotFound {
                    message: GameError::RoomNotFound.to_string(),
                });
                return;
            };
            let profile = PlayerProfile {
                user_id,
                username,
                avatar_url,
                balance,
            };
            match state
                .rooms
                .join_room_by_id(room_id, profile, connection_id, tx.clone())
                .await
            {
                Ok(_) => {}
                Err(e @ (GameError::RoomNotFound | GameError::RoomFull)) => {
                    let _ = tx.send(ServerEvent::RoomNotFound {
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    let _ = tx.send(ServerEvent::Error {
                        message: e.to_string(),
                    });
                }
            }
        }

        ClientEvent::LeaveGame { user_id, room_id } => {
            if let Some(room_id) = parse_room_id(&room_id) {
                let _ = state.rooms.leave(room_id, &user_id).await;
            }
        }

        ClientEvent::PlayerAction {
            room_id,
            user_id,
            action,
            amount,
        } => {
            let Some(room_id) = parse_room_id(&room_id) else {
                let _ = tx.send(ServerEvent::Error {
                    message: GameError::RoomNotFound.to_string(),
                });
                return;
            };
            if let Err(e) = state
                .rooms
                .player_action(room_id, &user_id, action, amount)
                .await
            {
                let _ = tx.send(ServerEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        ClientEvent::RequestShow { room_id, user_id } => {
            // Show requests against unknown rooms are dropped silently.
            if let Some(room_id) = parse_room_id(&room_id) {
                let _ = state.rooms.request_show(room_id, &user_id).await;
            }
        }

        ClientEvent::SendChat {
            room_id,
            username,
            avatar_url,
            content,
        } => {
            if username.is_empty() || content.is_empty() {
                let _ = tx.send(ServerEvent::Error {
                    message: "Missing chat parameters".to_string(),
                });
                return;
            }
            let Some(room_id) = parse_room_id(&room_id) else {
                let _ = tx.send(ServerEvent::Error {
                    message: GameError::RoomNotFound.to_string(),
                });
                return;
            };
            if let Err(e) = state
                .rooms
                .send_chat(room_id, connection_id, &username, &avatar_url, &content)
                .await
            {
                let _ = tx.send(ServerEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }
}

fn parse_room_id(raw: &str) -> Option<RoomId> {
    Uuid::parse_str(raw).ok()
}
