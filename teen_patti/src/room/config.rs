//! Room configuration models.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::game::constants;
use crate::game::entities::Chips;

/// Per-room settings. Every room created by one registry shares the same
/// configuration for the lifetime of the process.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoomConfig {
    /// Maximum seats per room.
    pub max_players: usize,

    /// Ante collected from every dealt player at round start.
    pub boot_amount: Chips,

    /// Base betting unit; minimum blind stake.
    pub min_bet: Chips,

    /// Largest stake accepted for a single bet.
    pub max_bet: Chips,

    /// Pot size that settles the round immediately.
    pub pot_limit: Chips,

    /// How long a player may hold the turn before being auto-folded.
    pub turn_duration: Duration,

    /// Cooldown between settlement and the automatic restart attempt.
    pub restart_delay: Duration,

    /// Chat log capacity.
    pub max_chat_messages: usize,

    /// Longest accepted chat message, in characters.
    pub max_chat_message_len: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_players: constants::MAX_PLAYERS,
            boot_amount: constants::BOOT_AMOUNT,
            min_bet: constants::MIN_BET,
            max_bet: constants::MAX_BET,
            pot_limit: constants::POT_LIMIT,
            turn_duration: Duration::from_secs(constants::TURN_DURATION_SECS),
            restart_delay: Duration::from_secs(constants::RESTART_DELAY_SECS),
            max_chat_messages: constants::MAX_CHAT_MESSAGES,
            max_chat_message_len: constants::MAX_CHAT_MESSAGE_LENGTH,
        }
    }
}

impl RoomConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_players < 2 || self.max_players > constants::MAX_PLAYERS {
            return Err(format!(
                "Max players must be between 2 and {}",
                constants::MAX_PLAYERS
            ));
        }

        if self.min_bet == 0 {
            return Err("Minimum bet must be positive".to_string());
        }

        // The seen tier doubles the minimum, so the cap must leave room.
        if self.max_bet < self.min_bet * 2 {
            return Err("Maximum bet must be at least double the minimum bet".to_string());
        }

        if self.boot_amount == 0 || self.boot_amount > self.max_bet {
            return Err("Boot must be positive and no larger than the maximum bet".to_string());
        }

        if self.pot_limit <= self.max_bet {
            return Err("Pot limit must exceed the maximum bet".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RoomConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_cap_below_seen_minimum() {
        let config = RoomConfig {
            min_bet: 500,
            max_bet: 600,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
