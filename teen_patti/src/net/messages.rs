//! JSON wire protocol: inbound client events and outbound server events.
//!
//! Frames are adjacently tagged, `{"event": "...", "data": {...}}`, with
//! camelCase payload fields. Outbound events are addressed either room-wide
//! or to a single connection; the transport only forwards them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::entities::{Chips, UserId};

/// A player action within the current betting round.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fold,
    See,
    Blind,
    Chaal,
}

/// Events delivered by clients over the transport.
#[derive(Clone, Debug, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Join any open public room, or request a fresh private room.
    JoinRoom {
        user_id: UserId,
        username: String,
        avatar_url: String,
        balance: Chips,
        #[serde(default)]
        is_private: bool,
    },
    /// Join a specific room by its identifier.
    JoinRoomById {
        user_id: UserId,
        username: String,
        avatar_url: String,
        balance: Chips,
        room_id: String,
    },
    /// Explicit leave.
    LeaveGame { user_id: UserId, room_id: String },
    /// Fold / see / blind / chaal, routed to the betting engine.
    PlayerAction {
        room_id: String,
        user_id: UserId,
        action: ActionKind,
        #[serde(default)]
        amount: Chips,
    },
    /// Heads-up manual showdown request.
    RequestShow { room_id: String, user_id: UserId },
    /// Room chat message.
    SendChat {
        room_id: String,
        username: String,
        #[serde(default)]
        avatar_url: String,
        content: String,
    },
}

/// Events produced by the core for delivery to clients.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Unicast join confirmation with the current roster.
    JoinedRoom {
        room_id: String,
        players: Vec<PlayerSummary>,
    },
    /// Room-wide snapshot, sent after every state change.
    RoomUpdate(RoomView),
    GameStarted {
        first_turn_user_id: UserId,
    },
    TurnStarted {
        user_id: UserId,
        /// Milliseconds since the epoch.
        turn_start_time: i64,
        /// Turn duration in milliseconds.
        duration: u64,
    },
    PlayerFolded {
        user_id: UserId,
        is_auto: bool,
    },
    GameEnded {
        winner_user_id: UserId,
        winner_username: String,
        winnings: Chips,
        /// Revealed hands of every contender, as wire card codes.
        hands: HashMap<UserId, Vec<String>>,
        hand_type: String,
    },
    /// Unicast, non-fatal, advisory only.
    Error {
        message: String,
    },
    RoomNotFound {
        message: String,
    },
}

/// Roster entry included in join confirmations.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: String,
    pub balance: Chips,
}

/// Full room snapshot broadcast to all members.
///
/// A player's hand is included in full only once `seen` is set and the hand
/// is non-empty; a dealt but unseen hand is sent as three opaque
/// placeholders. The mask is recomputed identically for every viewer,
/// including the hand's owner.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_id: String,
    pub room_money: Chips,
    pub boot_amount: Chips,
    pub is_game_on: bool,
    pub chat: Vec<ChatView>,
    pub players: Vec<PlayerView>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: String,
    pub balance: Chips,
    pub playing: bool,
    pub hand: Vec<String>,
    pub turn: bool,
    pub turn_start_time: Option<i64>,
    pub seen: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    pub username: String,
    pub avatar_url: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_room_event_parses() {
        let raw = r#"{
            "event": "join-room",
            "data": {
                "userId": "u-1",
                "username": "alice",
                "avatarUrl": "https://avatars.test/alice.png",
                "balance": 10000,
                "isPrivate": true
            }
        }"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        match event {
            ClientEvent::JoinRoom {
                user_id,
                balance,
                is_private,
                ..
            } => {
                assert_eq!(user_id, "u-1");
                assert_eq!(balance, 10_000);
                assert!(is_private);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn player_action_amount_defaults_to_zero() {
        let raw = r#"{
            "event": "player-action",
            "data": {
                "roomId": "r-1",
                "userId": "u-1",
                "action": "fold"
            }
        }"#;
        let event: ClientEvent = serde_json::from_str(raw).unwrap();
        match event {
            ClientEvent::PlayerAction { action, amount, .. } => {
                assert_eq!(action, ActionKind::Fold);
                assert_eq!(amount, 0);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn server_events_use_kebab_case_tags() {
        let event = ServerEvent::GameStarted {
            first_turn_user_id: "u-1".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "game-started");
        assert_eq!(json["data"]["firstTurnUserId"], "u-1");
    }
}
