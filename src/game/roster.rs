//! Player roster and the player-location state machine
//!
//! Every player is in exactly one location: on the shared bike, or inside the
//! operation mini-game. The mini-game holds at most one player at a time, and
//! the only way out is an explicit completion report.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a player currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerLocation {
    Bike,
    OperationMinigame,
}

/// A connected player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub is_ready: bool,
    pub location: PlayerLocation,
}

impl Player {
    /// Joining players always start on the bike
    pub fn new(id: Uuid, name: String) -> Self {
        Self {
            id,
            name,
            is_ready: false,
            location: PlayerLocation::Bike,
        }
    }
}

/// True while someone occupies the operation mini-game slot
pub fn minigame_occupied(players: &[Player]) -> bool {
    players
        .iter()
        .any(|p| p.location == PlayerLocation::OperationMinigame)
}

/// Move one uniformly-random bike rider into the operation mini-game.
///
/// The transition guard lives here: the slot must be free, and only players
/// currently on the bike are candidates (a player already in a mini-game is
/// never pulled into another). Returns the relocated player, if any.
pub fn relocate_random_rider<'a>(
    players: &'a mut [Player],
    rng: &mut impl Rng,
) -> Option<&'a Player> {
    if minigame_occupied(players) {
        return None;
    }

    let riders: Vec<usize> = players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.location == PlayerLocation::Bike)
        .map(|(idx, _)| idx)
        .collect();

    if riders.is_empty() {
        return None;
    }

    let chosen = riders[rng.gen_range(0..riders.len())];
    players[chosen].location = PlayerLocation::OperationMinigame;
    Some(&players[chosen])
}

/// Return a player from the mini-game to the bike.
///
/// This is the only exit from the mini-game. A report for a player who is not
/// actually in the slot is a no-op; returns whether a transition happened.
pub fn finish_minigame(players: &mut [Player], player_id: Uuid) -> bool {
    match players
        .iter_mut()
        .find(|p| p.id == player_id && p.location == PlayerLocation::OperationMinigame)
    {
        Some(player) => {
            player.location = PlayerLocation::Bike;
            true
        }
        None => false,
    }
}

/// Mark a player as ready on the lobby screen
pub fn mark_ready(players: &mut [Player], player_id: Uuid) {
    if let Some(player) = players.iter_mut().find(|p| p.id == player_id) {
        player.is_ready = true;
    }
}

/// Remove a player regardless of location; location is an attribute, not an
/// owned resource, so no unwind is needed
pub fn remove_player(players: &mut Vec<Player>, player_id: Uuid) {
    players.retain(|p| p.id != player_id);
}
