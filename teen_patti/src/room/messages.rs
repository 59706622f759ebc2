//! Room actor message types.

use tokio::sync::{mpsc, oneshot};

use crate::game::GameError;
use crate::game::entities::{Chips, ConnectionId, PlayerProfile, RoomId, UserId};
use crate::net::messages::{ActionKind, PlayerSummary, ServerEvent};

/// Messages that can be sent to a `RoomActor`.
///
/// Join and removal carry response channels because the registry keeps
/// indexes in sync with their outcome; gameplay messages are fire-and-forget
/// and reply, if at all, through the sender's event channel.
#[derive(Debug)]
pub enum RoomMessage {
    /// Seat a player and subscribe their connection to room events.
    Join {
        profile: PlayerProfile,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
        response: oneshot::Sender<Result<JoinReply, GameError>>,
    },

    /// Remove a player by user or connection identity.
    Remove {
        target: RemovalTarget,
        response: oneshot::Sender<Option<RemoveOutcome>>,
    },

    /// Player action (fold, see, blind, chaal).
    TakeAction {
        user_id: UserId,
        action: ActionKind,
        amount: Chips,
    },

    /// Heads-up manual showdown request.
    RequestShow { user_id: UserId },

    /// Append a chat message from a seated connection.
    SendChat {
        connection_id: ConnectionId,
        username: String,
        avatar_url: String,
        content: String,
    },

    /// Stop the actor.
    Close,
}

/// How the registry identifies the player to remove.
#[derive(Clone, Debug)]
pub enum RemovalTarget {
    /// Explicit leave.
    User(UserId),
    /// Transport disconnect.
    Connection(ConnectionId),
}

/// Successful join outcome: the room id plus the roster after seating.
#[derive(Clone, Debug)]
pub struct JoinReply {
    pub room_id: RoomId,
    pub players: Vec<PlayerSummary>,
}

/// Successful removal outcome, used by the registry to keep its indexes
/// and delete-on-empty lifecycle in sync.
#[derive(Clone, Debug)]
pub struct RemoveOutcome {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub remaining: usize,
}
