//! Game-wide constants and round defaults.

use super::entities::Chips;

/// Maximum number of seats in a room.
pub const MAX_PLAYERS: usize = 5;

/// Mandatory ante collected from every dealt player at round start.
pub const BOOT_AMOUNT: Chips = 500;

/// Base betting unit and minimum blind stake.
pub const MIN_BET: Chips = 500;

/// Largest stake accepted for a single blind or chaal.
pub const MAX_BET: Chips = 5_000;

/// Pot size at which the round settles immediately.
pub const POT_LIMIT: Chips = 50_000;

/// Seconds a player may hold the turn before being auto-folded.
pub const TURN_DURATION_SECS: u64 = 60;

/// Cooldown between settlement and the next automatic round start.
pub const RESTART_DELAY_SECS: u64 = 5;

/// Room chat log capacity; the oldest message is evicted first.
pub const MAX_CHAT_MESSAGES: usize = 50;

/// Longest accepted chat message, in characters.
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 200;
