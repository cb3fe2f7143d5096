//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::state::GameState;

/// Steering/throttle controls on the shared bike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Left,
    Right,
    Forward,
    Back,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Join the session with a display name
    Join {
        name: String,
    },

    /// Start the ride once at least one player has joined
    RequestStart,

    /// Mark the sender as ready on the lobby screen
    Ready,

    /// Press or release one of the shared bike controls
    MoveInput {
        direction: MoveDirection,
        pressed: bool,
    },

    /// Report the outcome of the operation mini-game
    MinigameFinished {
        player_id: Uuid,
        score: u32,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Welcome message after a successful join
    Welcome {
        player_id: Uuid,
        server_time: u64,
    },

    /// Full game state snapshot
    State {
        state: GameState,
    },

    /// The ride has started
    SessionStarted,

    /// The ride is over
    SessionEnded {
        final_score: u32,
    },
}
