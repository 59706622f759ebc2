//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated
//! configuration.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use teen_patti::RoomConfig;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("invalid room configuration: {0}")]
    InvalidRoomConfig(String),
}

/// Complete server configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Server bind address.
    pub bind: SocketAddr,
    /// Settings applied to every room the registry creates.
    pub room: RoomConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// `bind_override` (from CLI args) wins over `SERVER_BIND`, which wins
    /// over the `PORT` shorthand.
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => match std::env::var("SERVER_BIND") {
                Ok(raw) => {
                    SocketAddr::from_str(&raw).map_err(|_| ConfigError::InvalidValue {
                        var: "SERVER_BIND".to_string(),
                        value: raw,
                    })?
                }
                Err(_) => match std::env::var("PORT") {
                    Ok(port) => {
                        let raw = format!("0.0.0.0:{port}");
                        SocketAddr::from_str(&raw).map_err(|_| ConfigError::InvalidValue {
                            var: "PORT".to_string(),
                            value: port,
                        })?
                    }
                    Err(_) => "127.0.0.1:7171"
                        .parse()
                        .expect("Default bind address is valid"),
                },
            },
        };

        let defaults = RoomConfig::default();
        let room = RoomConfig {
            max_players: parse_env_or("ROOM_MAX_PLAYERS", defaults.max_players)?,
            boot_amount: parse_env_or("ROOM_BOOT_AMOUNT", defaults.boot_amount)?,
            min_bet: parse_env_or("ROOM_MIN_BET", defaults.min_bet)?,
            max_bet: parse_env_or("ROOM_MAX_BET", defaults.max_bet)?,
            pot_limit: parse_env_or("ROOM_POT_LIMIT", defaults.pot_limit)?,
            turn_duration: Duration::from_secs(parse_env_or(
                "ROOM_TURN_DURATION_SECS",
                defaults.turn_duration.as_secs(),
            )?),
            restart_delay: Duration::from_secs(parse_env_or(
                "ROOM_RESTART_DELAY_SECS",
                defaults.restart_delay.as_secs(),
            )?),
            max_chat_messages: defaults.max_chat_messages,
            max_chat_message_len: defaults.max_chat_message_len,
        };
        room.validate().map_err(ConfigError::InvalidRoomConfig)?;

        Ok(Self { bind, room })
    }
}

fn parse_env_or<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}
