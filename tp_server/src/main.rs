//! Multi-room Teen Patti server using an async actor model.
//!
//! Every room runs as an independent actor task owned by the process-wide
//! registry; this binary wires the registry to an axum WebSocket transport.

mod api;
mod config;

use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use teen_patti::RoomManager;

use config::ServerConfig;

const HELP: &str = "\
Run a multi-room Teen Patti game server

USAGE:
  tp_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:7171]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  PORT                     Port shorthand; binds 0.0.0.0:PORT
  ROOM_BOOT_AMOUNT         Ante collected from every dealt player
  ROOM_MIN_BET             Base betting unit
  ROOM_MAX_BET             Largest accepted stake
  ROOM_POT_LIMIT           Pot size that settles a round immediately
  ROOM_TURN_DURATION_SECS  Seconds before the turn holder is auto-folded
  ROOM_RESTART_DELAY_SECS  Cooldown before rounds restart automatically
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override = pargs.opt_value_from_str("--bind")?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(bind_override)?;
    info!("Starting Teen Patti server at {}", config.bind);

    let rooms = Arc::new(RoomManager::new(config.room.clone()));
    let app = api::create_router(api::AppState { rooms });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
