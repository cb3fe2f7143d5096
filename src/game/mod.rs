//! Game simulation modules

pub mod collision;
pub mod physics;
pub mod progression;
pub mod roster;
pub mod session;
pub mod snapshot;
pub mod spawner;
pub mod state;

pub use session::{ConnectionRegistry, GameSession, SessionEvent, SessionHandle};

use uuid::Uuid;

use crate::ws::protocol::ClientMsg;

/// Player input received from a WebSocket connection
#[derive(Debug, Clone)]
pub struct PlayerInput {
    pub player_id: Uuid,
    pub msg: ClientMsg,
    pub received_at: u64,
}
