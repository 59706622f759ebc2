//! Room registry: process-wide mapping from room id to live room actors.
//!
//! Rooms are created on demand (first matching join, or an explicit private
//! request) and deleted synchronously once their last player leaves. The
//! registry also keeps user and connection indexes so duplicate joins are
//! idempotent and disconnects can be routed without a user id.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc, oneshot};
use uuid::Uuid;

use crate::game::GameError;
use crate::game::entities::{Chips, ConnectionId, PlayerProfile, RoomId, UserId};
use crate::game::state::RoomState;
use crate::net::messages::{ActionKind, ServerEvent};

use super::actor::{RoomActor, RoomHandle};
use super::config::RoomConfig;
use super::messages::{JoinReply, RemovalTarget, RemoveOutcome, RoomMessage};

struct RoomEntry {
    handle: RoomHandle,
    is_private: bool,
    /// Kept in sync on join/remove; avoids querying every actor when
    /// scanning for an open seat.
    player_count: usize,
}

/// Registry of all active rooms.
pub struct RoomManager {
    config: RoomConfig,
    rooms: RwLock<HashMap<RoomId, RoomEntry>>,
    /// User id to room id, for idempotent joins.
    memberships: RwLock<HashMap<UserId, RoomId>>,
    /// Connection id to room id, for removal-by-disconnect.
    connections: RwLock<HashMap<ConnectionId, RoomId>>,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// The room a user currently occupies, if any. Used to make joins
    /// idempotent against duplicate join requests from the same identity.
    pub async fn find_room_for_user(&self, user_id: &str) -> Option<RoomId> {
        self.memberships.read().await.get(user_id).copied()
    }

    /// Number of live rooms.
    pub async fn active_room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Seat a player in an existing open public room (first fit), creating
    /// a new one only when none has a spare seat. A user already seated
    /// somewhere is routed back to their room.
    pub async fn assign_public_room(
        &self,
        profile: PlayerProfile,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<JoinReply, GameError> {
        if let Some(room_id) = self.find_room_for_user(&profile.user_id).await {
            return self.join_room(room_id, profile, connection_id, sender).await;
        }

        let candidates: Vec<RoomId> = {
            let rooms = self.rooms.read().await;
            rooms
                .iter()
                .filter(|(_, entry)| {
                    !entry.is_private && entry.player_count < self.config.max_players
                })
                .map(|(room_id, _)| *room_id)
                .collect()
        };
        for room_id in candidates {
            match self
                .join_room(room_id, profile.clone(), connection_id, sender.clone())
                .await
            {
                // Filled up (or died) since the scan; try the next one.
                Err(GameError::RoomFull | GameError::RoomNotFound) => continue,
                result => return result,
            }
        }

        let room_id = self.create_room(false).await;
        self.join_room(room_id, profile, connection_id, sender).await
    }

    /// Create a fresh private room for the user, unless they are already
    /// seated somewhere.
    pub async fn create_private_room(
        &self,
        profile: PlayerProfile,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<JoinReply, GameError> {
        if let Some(room_id) = self.find_room_for_user(&profile.user_id).await {
            return self.join_room(room_id, profile, connection_id, sender).await;
        }
        let room_id = self.create_room(true).await;
        self.join_room(room_id, profile, connection_id, sender).await
    }

    /// Join a specific room by id. A user already seated somewhere is
    /// routed back to their room, keeping joins idempotent per identity.
    pub async fn join_room_by_id(
        &self,
        room_id: RoomId,
        profile: PlayerProfile,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<JoinReply, GameError> {
        if let Some(current) = self.find_room_for_user(&profile.user_id).await {
            return self.join_room(current, profile, connection_id, sender).await;
        }
        {
            let rooms = self.rooms.read().await;
            let entry = rooms.get(&room_id).ok_or(GameError::RoomNotFound)?;
            if entry.player_count >= self.config.max_players {
                return Err(GameError::RoomFull);
            }
        }
        self.join_room(room_id, profile, connection_id, sender).await
    }

    /// Explicit leave, keyed by user identity.
    pub async fn leave(&self, room_id: RoomId, user_id: &str) -> Result<(), GameError> {
        let handle = self.handle_of(room_id).await.ok_or(GameError::RoomNotFound)?;
        self.remove_from(room_id, handle, RemovalTarget::User(user_id.to_string()))
            .await;
        Ok(())
    }

    /// Transport disconnect, keyed by connection identity.
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let room_id = self.connections.write().await.remove(&connection_id);
        let Some(room_id) = room_id else {
            return;
        };
        let Some(handle) = self.handle_of(room_id).await else {
            return;
        };
        self.remove_from(room_id, handle, RemovalTarget::Connection(connection_id))
            .await;
    }

    /// Route a betting action to the owning room.
    pub async fn player_action(
        &self,
        room_id: RoomId,
        user_id: &str,
        action: ActionKind,
        amount: Chips,
    ) -> Result<(), GameError> {
        let handle = self.handle_of(room_id).await.ok_or(GameError::RoomNotFound)?;
        handle
            .send(RoomMessage::TakeAction {
                user_id: user_id.to_string(),
                action,
                amount,
            })
            .await
    }

    /// Route a heads-up showdown request to the owning room.
    pub async fn request_show(&self, room_id: RoomId, user_id: &str) -> Result<(), GameError> {
        let handle = self.handle_of(room_id).await.ok_or(GameError::RoomNotFound)?;
        handle
            .send(RoomMessage::RequestShow {
                user_id: user_id.to_string(),
            })
            .await
    }

    /// Relay a chat message; membership is enforced by the room against the
    /// sending connection.
    pub async fn send_chat(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        username: &str,
        avatar_url: &str,
        content: &str,
    ) -> Result<(), GameError> {
        let handle = self.handle_of(room_id).await.ok_or(GameError::RoomNotFound)?;
        handle
            .send(RoomMessage::SendChat {
                connection_id,
                username: username.to_string(),
                avatar_url: avatar_url.to_string(),
                content: content.to_string(),
            })
            .await
    }

    async fn create_room(&self, is_private: bool) -> RoomId {
        let room_id = Uuid::new_v4();
        let state = RoomState::new(room_id, self.config.clone(), is_private);
        let (actor, handle) = RoomActor::new(state);
        tokio::spawn(actor.run());

        let mut rooms = self.rooms.write().await;
        rooms.insert(
            room_id,
            RoomEntry {
                handle,
                is_private,
                player_count: 0,
            },
        );
        log::info!(
            "Room {room_id}: created ({})",
            if is_private { "private" } else { "public" }
        );
        room_id
    }

    async fn join_room(
        &self,
        room_id: RoomId,
        profile: PlayerProfile,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<JoinReply, GameError> {
        let handle = self.handle_of(room_id).await.ok_or(GameError::RoomNotFound)?;
        let user_id = profile.user_id.clone();

        let (tx, rx) = oneshot::channel();
        handle
            .send(RoomMessage::Join {
                profile,
                connection_id,
                sender,
                response: tx,
            })
            .await?;
        let reply = rx.await.map_err(|_| GameError::RoomNotFound)??;

        self.memberships.write().await.insert(user_id, room_id);
        self.connections.write().await.insert(connection_id, room_id);
        let mut rooms = self.rooms.write().await;
        if let Some(entry) = rooms.get_mut(&room_id) {
            entry.player_count = reply.players.len();
        }

        Ok(reply)
    }

    async fn remove_from(&self, room_id: RoomId, handle: RoomHandle, target: RemovalTarget) {
        let (tx, rx) = oneshot::channel();
        if handle
            .send(RoomMessage::Remove {
                target,
                response: tx,
            })
            .await
            .is_err()
        {
            // The actor is already gone; make the registry entry follow.
            self.purge_room(room_id).await;
            return;
        }
        let Ok(outcome) = rx.await else {
            self.purge_room(room_id).await;
            return;
        };

        if let Some(RemoveOutcome {
            user_id,
            connection_id,
            remaining,
        }) = outcome
        {
            self.memberships.write().await.remove(&user_id);
            self.connections.write().await.remove(&connection_id);
            if remaining == 0 {
                self.purge_room(room_id).await;
                log::info!("Room {room_id}: deleted, no players left");
            } else {
                let mut rooms = self.rooms.write().await;
                if let Some(entry) = rooms.get_mut(&room_id) {
                    entry.player_count = remaining;
                }
            }
        }
    }

    async fn purge_room(&self, room_id: RoomId) {
        self.rooms.write().await.remove(&room_id);
    }

    async fn handle_of(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.rooms
            .read()
            .await
            .get(&room_id)
            .map(|entry| entry.handle.clone())
    }
}
