//! The authoritative world model for one ride session

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::game::roster::Player;
use crate::util::time::unix_millis;

/// Road width in world units; lateral positions are expressed against this
pub const ROAD_WIDTH: f32 = 100.0;
/// Road length in world units; objects spawn at the far end and scroll down
pub const ROAD_LENGTH: f32 = 2000.0;
/// The bike sits at a fixed fraction of the road length
pub const BIKE_ROAD_FRACTION: f32 = 0.2;
/// Lives at the start of a session
pub const STARTING_LIVES: u32 = 5;
/// Scroll speed at level 1, in units per second
pub const BASE_SCROLL_SPEED: f32 = 60.0;

/// The shared bike all players steer together
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BikeState {
    /// Lateral position, clamped to the road (may hang half a bike off each edge)
    pub x: f32,
    /// Longitudinal position; fixed, the road scrolls under the bike
    pub z: f32,
    pub width: f32,
    pub height: f32,
    /// Current longitudinal speed from pedal input
    pub speed: f32,
    pub max_speed: f32,
    pub turn_speed: f32,
    /// True only for ticks in which a collision effect fired
    pub is_colliding: bool,
    /// Press counters: a control is held while its count is > 0, so the same
    /// control can be held by several players at once
    pub left_press_count: u32,
    pub right_press_count: u32,
    pub up_press_count: u32,
    pub down_press_count: u32,
}

impl BikeState {
    pub fn new() -> Self {
        Self {
            x: 50.0,
            z: ROAD_LENGTH * BIKE_ROAD_FRACTION,
            width: 20.0,
            height: 15.0,
            speed: 0.0,
            max_speed: 100.0,
            turn_speed: 2.0,
            is_colliding: false,
            left_press_count: 0,
            right_press_count: 0,
            up_press_count: 0,
            down_press_count: 0,
        }
    }

    /// Lateral bounds: the bike may hang half its width off either road edge
    pub fn min_x(&self) -> f32 {
        -self.width / 2.0
    }

    pub fn max_x(&self) -> f32 {
        ROAD_WIDTH - self.width / 2.0
    }
}

impl Default for BikeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Road geometry and scroll distance accounting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Road {
    pub width: f32,
    pub length: f32,
    /// Cumulative distance scrolled this session
    pub distance_moved: f32,
    /// Distance at the previous milestone check
    pub last_distance: f32,
}

impl Road {
    pub fn new() -> Self {
        Self {
            width: ROAD_WIDTH,
            length: ROAD_LENGTH,
            distance_moved: 0.0,
            last_distance: 0.0,
        }
    }
}

impl Default for Road {
    fn default() -> Self {
        Self::new()
    }
}

/// Patrol direction for mobile road objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatrolDirection {
    Left,
    Right,
    Idle,
}

/// Lateral movement state for mobile road objects
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Patrol {
    pub direction: PatrolDirection,
    /// Seconds left before the dog re-rolls its walk; unused by pedestrians
    pub time_remaining: f32,
    /// Lateral speed in units per second
    pub speed: f32,
}

/// What a spawned road object is, with per-kind payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoadObjectKind {
    Pothole,
    Pedestrian { patrol: Patrol },
    Dog { patrol: Patrol },
    Restaurant { name: String },
    DogStore,
}

/// A spawned, collidable entity on (or beside) the road
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadObject {
    pub id: Uuid,
    pub x: f32,
    pub z: f32,
    pub width: f32,
    pub height: f32,
    #[serde(flatten)]
    pub kind: RoadObjectKind,
}

impl RoadObject {
    /// Buildings stay visible after their collision effect has fired
    pub fn is_building(&self) -> bool {
        matches!(
            self.kind,
            RoadObjectKind::Restaurant { .. } | RoadObjectKind::DogStore
        )
    }
}

/// A restaurant the riders have already visited; dedup is by name, so a
/// different instance with the same generated name counts as a repeat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitedRestaurant {
    pub id: Uuid,
    pub name: String,
}

/// Session counters surfaced to clients
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStats {
    pub restaurants_visited: Vec<VisitedRestaurant>,
    pub treats_collected: u32,
    pub pedestrians_hit: u32,
    pub potholes_hit: u32,
}

/// Last user-facing toast; newer messages supersede older ones
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMessage {
    pub text: String,
    pub timestamp: u64,
}

/// The single authoritative world state of a ride session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub bike: BikeState,
    pub road: Road,
    pub road_objects: Vec<RoadObject>,
    pub stats: GameStats,
    /// Ids whose collision effect has already been applied; an id leaves this
    /// set only when the object itself is retired
    pub collided_road_object_ids: HashSet<Uuid>,
    pub players: Vec<Player>,
    pub is_game_started: bool,
    pub lives: u32,
    pub score: u32,
    pub message: Option<GameMessage>,
    /// Distance scrolled since the spawner last fired
    pub distance_since_last_spawn: f32,
    /// Current scroll speed in units per second
    pub speed: f32,
    /// Current level (1-5)
    pub level: u8,
    /// Unix millis stamped on broadcast
    pub last_update_time: u64,
}

impl GameState {
    /// Build the initial state for a fresh session
    pub fn new() -> Self {
        Self {
            bike: BikeState::new(),
            road: Road::new(),
            road_objects: Vec::new(),
            stats: GameStats::default(),
            collided_road_object_ids: HashSet::new(),
            players: Vec::new(),
            is_game_started: false,
            lives: STARTING_LIVES,
            score: 0,
            message: None,
            distance_since_last_spawn: 0.0,
            speed: BASE_SCROLL_SPEED,
            level: 1,
            last_update_time: unix_millis(),
        }
    }

    /// Replace the current toast
    pub fn set_message(&mut self, text: String) {
        self.message = Some(GameMessage {
            text,
            timestamp: unix_millis(),
        });
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_satisfies_invariants() {
        let state = GameState::new();
        assert!(state.bike.x >= state.bike.min_x() && state.bike.x <= state.bike.max_x());
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.score, 0);
        assert_eq!(state.level, 1);
        assert!((state.speed - BASE_SCROLL_SPEED).abs() < f32::EPSILON);
        assert!(state.road_objects.is_empty());
        assert!(state.collided_road_object_ids.is_empty());
        assert!(!state.is_game_started);
    }

    #[test]
    fn bike_sits_at_fixed_road_fraction() {
        let bike = BikeState::new();
        assert!((bike.z - ROAD_LENGTH * BIKE_ROAD_FRACTION).abs() < f32::EPSILON);
    }

    #[test]
    fn set_message_supersedes_previous() {
        let mut state = GameState::new();
        state.set_message("first".to_string());
        state.set_message("second".to_string());
        assert_eq!(state.message.as_ref().unwrap().text, "second");
    }

    #[test]
    fn road_object_kind_serializes_with_tag() {
        let obj = RoadObject {
            id: Uuid::new_v4(),
            x: 10.0,
            z: 2000.0,
            width: 60.0,
            height: 80.0,
            kind: RoadObjectKind::Restaurant {
                name: "Hungry Diner".to_string(),
            },
        };
        let json = serde_json::to_string(&obj).unwrap();
        assert!(json.contains(r#""kind":"restaurant""#));
        assert!(json.contains(r#""name":"Hungry Diner""#));
    }
}
