//! Procedural road object spawning, movement, and retirement

use rand::Rng;
use uuid::Uuid;

use crate::game::state::{
    GameState, Patrol, PatrolDirection, RoadObject, RoadObjectKind, ROAD_WIDTH,
};

/// Objects this far behind the bike are retired unconditionally
pub const DESPAWN_Z: f32 = -100.0;

/// Word lists for generated restaurant names; duplicate visits are detected
/// by name equality, so the small pool makes repeats a real hazard
pub const RESTAURANT_ADJECTIVES: [&str; 6] =
    ["Hungry", "Sleepy", "Happy", "Dancing", "Flying", "Magical"];
pub const RESTAURANT_TYPES: [&str; 4] = ["Diner", "Cafe", "Bistro", "Kitchen"];

// Per-opportunity spawn chances; hazard/character chances scale with level
const POTHOLE_CHANCE: f32 = 0.10;
const PEDESTRIAN_CHANCE: f32 = 0.05;
const DOG_CHANCE: f32 = 0.02;
const RESTAURANT_CHANCE: f32 = 0.03;
const DOG_STORE_CHANCE: f32 = 0.02;

// Pedestrians cross the road from off one edge to off the other
const PEDESTRIAN_MIN_X: f32 = -20.0;
const PEDESTRIAN_MAX_X: f32 = 120.0;
// Dogs random-walk within the road with a margin
const DOG_MIN_X: f32 = 10.0;
const DOG_MAX_X: f32 = 90.0;

/// Scroll every object toward the viewer and advance mobile patrols.
/// Objects that have passed behind the bike are retired, releasing their
/// collided-id bookkeeping so a recycled id slot could never be skipped.
pub fn advance_objects(state: &mut GameState, rng: &mut impl Rng, delta_time: f32) {
    let road_length = state.road.length;
    let scroll_speed = state.speed;

    for obj in &mut state.road_objects {
        // Nearer objects scroll faster, approximating road perspective
        let speed_scale = 1.0 + (1.0 - obj.z / road_length) * 2.0;
        obj.z -= speed_scale * delta_time * scroll_speed;

        match &mut obj.kind {
            RoadObjectKind::Pedestrian { patrol } => {
                advance_pedestrian(&mut obj.x, patrol, delta_time);
            }
            RoadObjectKind::Dog { patrol } => {
                advance_dog(&mut obj.x, patrol, rng, delta_time);
            }
            _ => {}
        }
    }

    let retired: Vec<Uuid> = state
        .road_objects
        .iter()
        .filter(|obj| obj.z <= DESPAWN_Z)
        .map(|obj| obj.id)
        .collect();

    if !retired.is_empty() {
        state.road_objects.retain(|obj| obj.z > DESPAWN_Z);
        for id in retired {
            state.collided_road_object_ids.remove(&id);
        }
    }
}

/// Pedestrians walk continuously across the road, reversing just off-road
fn advance_pedestrian(x: &mut f32, patrol: &mut Patrol, delta_time: f32) {
    match patrol.direction {
        PatrolDirection::Left => {
            *x -= patrol.speed * delta_time;
            if *x < PEDESTRIAN_MIN_X {
                patrol.direction = PatrolDirection::Right;
            }
        }
        _ => {
            *x += patrol.speed * delta_time;
            if *x > PEDESTRIAN_MAX_X {
                patrol.direction = PatrolDirection::Left;
            }
        }
    }
}

/// Dogs do a bounded random walk: short bursts of movement with idle pauses
fn advance_dog(x: &mut f32, patrol: &mut Patrol, rng: &mut impl Rng, delta_time: f32) {
    if patrol.time_remaining > 0.0 {
        patrol.time_remaining -= delta_time;
    }

    if patrol.time_remaining <= 0.0 {
        if rng.gen::<f32>() < 0.3 {
            patrol.direction = if rng.gen_bool(0.5) {
                PatrolDirection::Left
            } else {
                PatrolDirection::Right
            };
            patrol.time_remaining = 0.5 + rng.gen::<f32>() * 1.5;
        } else {
            patrol.direction = PatrolDirection::Idle;
            patrol.time_remaining = 0.2 + rng.gen::<f32>() * 0.3;
        }
    }

    match patrol.direction {
        PatrolDirection::Left => *x = (*x - patrol.speed * delta_time).max(DOG_MIN_X),
        PatrolDirection::Right => *x = (*x + patrol.speed * delta_time).min(DOG_MAX_X),
        PatrolDirection::Idle => {}
    }
}

/// Distance the road must scroll between spawn opportunities; shrinks as the
/// level rises so higher levels are denser
fn spawn_interval(level: u8) -> f32 {
    (35.0 - level as f32 * 5.0).max(5.0)
}

/// Spawn new objects at the far end of the road, gated by scrolled distance
/// so spawn density is speed-invariant
pub fn try_spawn(state: &mut GameState, rng: &mut impl Rng) {
    if state.distance_since_last_spawn <= spawn_interval(state.level) {
        return;
    }
    state.distance_since_last_spawn = 0.0;

    let spawn_z = state.road.length;
    let level_multiplier = 1.0 + (state.level - 1) as f32 * 0.2;

    if rng.gen::<f32>() < POTHOLE_CHANCE * level_multiplier {
        state.road_objects.push(RoadObject {
            id: Uuid::new_v4(),
            x: rng.gen::<f32>() * ROAD_WIDTH,
            z: spawn_z,
            width: 15.0,
            height: 15.0,
            kind: RoadObjectKind::Pothole,
        });
    }

    if rng.gen::<f32>() < PEDESTRIAN_CHANCE * level_multiplier {
        let starts_on_left = rng.gen_bool(0.5);
        state.road_objects.push(RoadObject {
            id: Uuid::new_v4(),
            x: if starts_on_left {
                PEDESTRIAN_MIN_X
            } else {
                PEDESTRIAN_MAX_X
            },
            z: spawn_z,
            width: 20.0,
            height: 40.0,
            kind: RoadObjectKind::Pedestrian {
                patrol: Patrol {
                    direction: if starts_on_left {
                        PatrolDirection::Right
                    } else {
                        PatrolDirection::Left
                    },
                    time_remaining: 0.0,
                    speed: 30.0 + rng.gen::<f32>() * 20.0,
                },
            },
        });
    }

    if rng.gen::<f32>() < DOG_CHANCE * level_multiplier {
        state.road_objects.push(RoadObject {
            id: Uuid::new_v4(),
            x: rng.gen::<f32>() * ROAD_WIDTH,
            z: spawn_z,
            width: 25.0,
            height: 20.0,
            kind: RoadObjectKind::Dog {
                patrol: Patrol {
                    direction: PatrolDirection::Idle,
                    time_remaining: 0.0,
                    speed: 20.0,
                },
            },
        });
    }

    if rng.gen::<f32>() < RESTAURANT_CHANCE {
        let on_left = rng.gen_bool(0.5);
        state.road_objects.push(RoadObject {
            id: Uuid::new_v4(),
            // Buildings sit just off either road edge
            x: if on_left { -60.0 } else { 100.0 },
            z: spawn_z,
            width: 60.0,
            height: 80.0,
            kind: RoadObjectKind::Restaurant {
                name: generate_restaurant_name(rng),
            },
        });
    }

    if rng.gen::<f32>() < DOG_STORE_CHANCE {
        let on_left = rng.gen_bool(0.5);
        state.road_objects.push(RoadObject {
            id: Uuid::new_v4(),
            x: if on_left { -60.0 } else { 160.0 },
            z: spawn_z,
            width: 60.0,
            height: 80.0,
            kind: RoadObjectKind::DogStore,
        });
    }
}

/// Draw a display name from the adjective and type word lists
pub fn generate_restaurant_name(rng: &mut impl Rng) -> String {
    let adjective = RESTAURANT_ADJECTIVES[rng.gen_range(0..RESTAURANT_ADJECTIVES.len())];
    let kind = RESTAURANT_TYPES[rng.gen_range(0..RESTAURANT_TYPES.len())];
    format!("{adjective} {kind}")
}
