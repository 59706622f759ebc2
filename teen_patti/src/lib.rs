//! # Teen Patti
//!
//! An authoritative engine for a multiplayer three-card betting game played
//! in concurrent rooms.
//!
//! ## Architecture
//!
//! Every room runs as an independent actor task owning a
//! [`game::state::RoomState`]: the synchronous state machine covering
//! seating, turn scheduling with timeout-driven auto-fold, betting
//! validation, hand ranking, and pot settlement. External events and timer
//! firings are processed on the same single-consumer inbox, so within one
//! room there are no interleavings to reason about.
//!
//! The process-wide [`room::RoomManager`] maps room ids to live actors,
//! creating rooms on demand (first-fit for public joins) and deleting them
//! when the last player leaves.
//!
//! ## Core Modules
//!
//! - [`game`]: entities, hand evaluator, and the room state machine
//! - [`room`]: room actor, registry, and configuration
//! - [`net`]: JSON wire protocol (client and server events)
//!
//! ## Example
//!
//! ```
//! use teen_patti::{RoomConfig, RoomManager};
//!
//! // Create a registry with default room settings
//! let rooms = RoomManager::new(RoomConfig::default());
//! ```

/// Core game logic, entities, and the room state machine.
pub mod game;
pub use game::{
    GameError,
    constants::{self, MAX_PLAYERS},
    entities,
    hand::{HandCategory, HandScore, rank_hand},
    state::RoomState,
};

/// Wire protocol shared by the server transport and clients.
pub mod net;
pub use net::messages::{ActionKind, ClientEvent, ServerEvent};

/// Room actor, registry, and configuration.
pub mod room;
pub use room::{RoomConfig, RoomManager};
