//! Game engine core: entities, hand ranking, and the room state machine.
//!
//! This module provides the foundational game implementation including:
//! - Room/player data model with explicit round-status states
//! - Betting validation (fold / see / blind / chaal)
//! - Three-card hand ranking
//! - Round lifecycle: deal, settlement, automatic restart

// Submodules
pub mod constants;
pub mod entities;
pub mod hand;
pub mod state;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during room operations.
///
/// Invalid action contexts (wrong turn, inactive round, unknown actor) are
/// deliberately not represented here: the betting engine ignores them
/// without reply. Insufficient funds are likewise never an error; they
/// degrade to an automatic fold.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("Room does not exist")]
    RoomNotFound,
    #[error("Room is Full")]
    RoomFull,
    #[error("You have already seen your cards.")]
    AlreadySeen,
    #[error("Seen players cannot play blind.")]
    BlindAfterSeen,
    #[error("Only seen players can request a show.")]
    ShowRequiresSeen,
    #[error("Show can only be requested when 2 players remain.")]
    ShowRequiresHeadsUp,
    #[error("You are not in this room")]
    NotInRoom,
    #[error("Message too long")]
    MessageTooLong,
    #[error("Missing required parameters")]
    MissingFields,
}
