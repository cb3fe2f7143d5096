//! Collision detection and at-most-once effect application

use rand::Rng;
use tracing::debug;

use crate::game::roster;
use crate::game::state::{BikeState, GameState, RoadObject, RoadObjectKind};

/// Buffer added to the half-extent sums on both axes so objects register
/// slightly before exact geometric touch
const HITBOX_TOLERANCE: f32 = 2.0;

/// Points for a new restaurant visit, a found dog, or a collected treat
const VISIT_POINTS: u32 = 10;

/// Center-distance bounding-box overlap test on both axes
pub fn bike_intersects(bike: &BikeState, obj: &RoadObject) -> bool {
    let bike_x_center = bike.x + bike.width / 2.0;
    let obj_x_center = obj.x + obj.width / 2.0;
    let bike_z_center = bike.z + bike.height / 2.0;
    let obj_z_center = obj.z + obj.height / 2.0;

    let x_overlap = (bike_x_center - obj_x_center).abs()
        < bike.width / 2.0 + obj.width / 2.0 + HITBOX_TOLERANCE;
    let z_overlap = (bike_z_center - obj_z_center).abs()
        < bike.height / 2.0 + obj.height / 2.0 + HITBOX_TOLERANCE;

    x_overlap && z_overlap
}

/// Detect overlaps between the bike and active objects and apply each
/// object's effect at most once per instance. Hazards and characters that
/// have fired disappear from the active list; buildings stay visible so a
/// repeat approach can be seen (and penalized). Returns true if any effect
/// fired this tick.
pub fn detect_and_resolve(state: &mut GameState, rng: &mut impl Rng) -> bool {
    let bike = state.bike.clone();

    let hits: Vec<RoadObject> = state
        .road_objects
        .iter()
        .filter(|obj| !state.collided_road_object_ids.contains(&obj.id))
        .filter(|obj| bike_intersects(&bike, obj))
        .cloned()
        .collect();

    for obj in &hits {
        state.collided_road_object_ids.insert(obj.id);
        debug!(object_id = %obj.id, "Collision effect");

        match &obj.kind {
            RoadObjectKind::Pothole => {
                state.stats.potholes_hit += 1;
                state.lives = state.lives.saturating_sub(1);
                state.set_message("Hit a pothole! (-1 life)".to_string());
            }
            RoadObjectKind::Pedestrian { .. } => hit_pedestrian(state, rng),
            RoadObjectKind::Dog { .. } => {
                state.score += VISIT_POINTS;
                state.set_message(format!("Found Luna (+{VISIT_POINTS} points)"));
            }
            RoadObjectKind::Restaurant { name } => hit_restaurant(state, obj, name),
            RoadObjectKind::DogStore => {
                state.score += VISIT_POINTS;
                state.stats.treats_collected += 1;
                state.set_message(format!("Got a treat (+{VISIT_POINTS} points)"));
            }
        }
    }

    let any_hit = !hits.is_empty();
    if any_hit {
        // Used hazards and characters disappear; buildings remain
        let collided = &state.collided_road_object_ids;
        state
            .road_objects
            .retain(|obj| obj.is_building() || !collided.contains(&obj.id));
    }
    state.bike.is_colliding = any_hit;

    any_hit
}

/// Hitting a pedestrian costs a life and, if the operation slot is free,
/// sends one random bike rider off to operate
fn hit_pedestrian(state: &mut GameState, rng: &mut impl Rng) {
    state.stats.pedestrians_hit += 1;
    state.lives = state.lives.saturating_sub(1);

    let relocated =
        roster::relocate_random_rider(&mut state.players, rng).map(|p| p.name.clone());
    match relocated {
        Some(name) => {
            state.set_message(format!("Hit a pedestrian! {name} must operate! (-1 life)"));
        }
        None => {
            state.set_message("Hit a pedestrian! (-1 life)".to_string());
        }
    }
}

/// First visit to a restaurant name scores; a repeat of the same name (even
/// on a different instance) costs a life
fn hit_restaurant(state: &mut GameState, obj: &RoadObject, name: &str) {
    let already_visited = state
        .stats
        .restaurants_visited
        .iter()
        .any(|visited| visited.name == name);

    let total_restaurants = state
        .road_objects
        .iter()
        .filter(|o| matches!(o.kind, RoadObjectKind::Restaurant { .. }))
        .count();
    let visited_count = if already_visited {
        state.stats.restaurants_visited.len()
    } else {
        state.stats.restaurants_visited.len() + 1
    };

    if already_visited {
        state.lives = state.lives.saturating_sub(1);
        state.set_message(format!(
            "Went to same restaurant: {name} (-1 life) [{visited_count}/{total_restaurants} visited]"
        ));
    } else {
        state.score += VISIT_POINTS;
        state
            .stats
            .restaurants_visited
            .push(crate::game::state::VisitedRestaurant {
                id: obj.id,
                name: name.to_string(),
            });
        state.set_message(format!(
            "Went to {name} (+{VISIT_POINTS} points) [{visited_count}/{total_restaurants} visited]"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::roster::{Player, PlayerLocation};
    use crate::game::state::{Patrol, PatrolDirection, VisitedRestaurant};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn object_on_bike(state: &GameState, kind: RoadObjectKind) -> RoadObject {
        RoadObject {
            id: Uuid::new_v4(),
            x: state.bike.x,
            z: state.bike.z,
            width: 15.0,
            height: 15.0,
            kind,
        }
    }

    fn pothole_on_bike(state: &GameState) -> RoadObject {
        object_on_bike(state, RoadObjectKind::Pothole)
    }

    fn restaurant_on_bike(state: &GameState, name: &str) -> RoadObject {
        object_on_bike(
            state,
            RoadObjectKind::Restaurant {
                name: name.to_string(),
            },
        )
    }

    #[test]
    fn overlap_feels_collision_slightly_early() {
        let state = GameState::new();
        let mut obj = pothole_on_bike(&state);

        let bike_center = state.bike.x + state.bike.width / 2.0;
        let half_sum = state.bike.width / 2.0 + obj.width / 2.0;

        // Centers just beyond geometric touch on x, but within the tolerance
        obj.x = bike_center + half_sum + HITBOX_TOLERANCE / 2.0 - obj.width / 2.0;
        assert!(bike_intersects(&state.bike, &obj));

        // Centers separated beyond the tolerance: no collision
        obj.x = bike_center + half_sum + HITBOX_TOLERANCE * 2.0 - obj.width / 2.0;
        assert!(!bike_intersects(&state.bike, &obj));
    }

    #[test]
    fn effect_fires_at_most_once_per_instance() {
        let mut state = GameState::new();
        let mut rng = rng();

        let restaurant = restaurant_on_bike(&state, "Hungry Diner");
        state.road_objects.push(restaurant);

        // Buildings stay in the active list, so overlap repeats every tick
        for _ in 0..10 {
            detect_and_resolve(&mut state, &mut rng);
        }

        assert_eq!(state.score, VISIT_POINTS);
        assert_eq!(state.stats.restaurants_visited.len(), 1);
        assert_eq!(state.road_objects.len(), 1);
    }

    #[test]
    fn two_potholes_in_one_tick_cost_two_lives() {
        let mut state = GameState::new();
        let mut rng = rng();

        state.road_objects.push(pothole_on_bike(&state));
        state.road_objects.push(pothole_on_bike(&state));

        detect_and_resolve(&mut state, &mut rng);

        assert_eq!(state.lives, crate::game::state::STARTING_LIVES - 2);
        assert_eq!(state.stats.potholes_hit, 2);
        assert_eq!(state.collided_road_object_ids.len(), 2);
        // Both hazards disappear from the active list
        assert!(state.road_objects.is_empty());
    }

    #[test]
    fn duplicate_restaurant_name_costs_a_life_on_second_visit() {
        let mut state = GameState::new();
        let mut rng = rng();

        let first = restaurant_on_bike(&state, "Hungry Diner");
        state.road_objects.push(first);
        detect_and_resolve(&mut state, &mut rng);

        let score_after_first = state.score;
        let lives_after_first = state.lives;
        assert_eq!(score_after_first, VISIT_POINTS);
        assert_eq!(lives_after_first, crate::game::state::STARTING_LIVES);

        // A different instance with the same generated name
        let second = restaurant_on_bike(&state, "Hungry Diner");
        state.road_objects.push(second);
        detect_and_resolve(&mut state, &mut rng);

        assert_eq!(state.score, score_after_first);
        assert_eq!(state.lives, lives_after_first - 1);
        // The name is not recorded twice
        assert_eq!(state.stats.restaurants_visited.len(), 1);
    }

    #[test]
    fn pedestrian_hit_relocates_a_rider_when_slot_free() {
        let mut state = GameState::new();
        let mut rng = rng();
        state.players.push(Player::new(Uuid::new_v4(), "Ada".to_string()));
        state.players.push(Player::new(Uuid::new_v4(), "Grace".to_string()));

        let pedestrian = object_on_bike(
            &state,
            RoadObjectKind::Pedestrian {
                patrol: Patrol {
                    direction: PatrolDirection::Right,
                    time_remaining: 0.0,
                    speed: 30.0,
                },
            },
        );
        state.road_objects.push(pedestrian);

        detect_and_resolve(&mut state, &mut rng);

        assert_eq!(state.stats.pedestrians_hit, 1);
        assert_eq!(state.lives, crate::game::state::STARTING_LIVES - 1);
        let in_minigame = state
            .players
            .iter()
            .filter(|p| p.location == PlayerLocation::OperationMinigame)
            .count();
        assert_eq!(in_minigame, 1);
        // The character disappears after its effect
        assert!(state.road_objects.is_empty());
    }

    #[test]
    fn pedestrian_hit_with_occupied_slot_only_updates_counters() {
        let mut state = GameState::new();
        let mut rng = rng();
        let mut occupant = Player::new(Uuid::new_v4(), "Ada".to_string());
        occupant.location = PlayerLocation::OperationMinigame;
        state.players.push(occupant);
        state.players.push(Player::new(Uuid::new_v4(), "Grace".to_string()));

        let pedestrian = object_on_bike(
            &state,
            RoadObjectKind::Pedestrian {
                patrol: Patrol {
                    direction: PatrolDirection::Right,
                    time_remaining: 0.0,
                    speed: 30.0,
                },
            },
        );
        state.road_objects.push(pedestrian);

        detect_and_resolve(&mut state, &mut rng);

        assert_eq!(state.stats.pedestrians_hit, 1);
        let in_minigame = state
            .players
            .iter()
            .filter(|p| p.location == PlayerLocation::OperationMinigame)
            .count();
        assert_eq!(in_minigame, 1);
        // Grace stays on the bike
        assert_eq!(state.players[1].location, PlayerLocation::Bike);
    }

    #[test]
    fn dog_store_awards_points_and_a_treat() {
        let mut state = GameState::new();
        let mut rng = rng();

        state
            .road_objects
            .push(object_on_bike(&state, RoadObjectKind::DogStore));
        detect_and_resolve(&mut state, &mut rng);

        assert_eq!(state.score, VISIT_POINTS);
        assert_eq!(state.stats.treats_collected, 1);
        // Buildings survive their collision
        assert_eq!(state.road_objects.len(), 1);
    }

    #[test]
    fn colliding_flag_pulses_for_one_tick() {
        let mut state = GameState::new();
        let mut rng = rng();

        state.road_objects.push(pothole_on_bike(&state));
        assert!(detect_and_resolve(&mut state, &mut rng));
        assert!(state.bike.is_colliding);

        // Next tick: nothing new to collide with
        assert!(!detect_and_resolve(&mut state, &mut rng));
        assert!(!state.bike.is_colliding);
    }

    #[test]
    fn score_never_decreases_across_mixed_effects() {
        let mut state = GameState::new();
        let mut rng = rng();
        state
            .stats
            .restaurants_visited
            .push(VisitedRestaurant {
                id: Uuid::new_v4(),
                name: "Hungry Diner".to_string(),
            });

        let mut last_score = state.score;
        // Duplicate restaurant, pothole, dog store: only gains or holds
        for kind in [
            RoadObjectKind::Restaurant {
                name: "Hungry Diner".to_string(),
            },
            RoadObjectKind::Pothole,
            RoadObjectKind::DogStore,
        ] {
            state.road_objects.push(object_on_bike(&state, kind));
            detect_and_resolve(&mut state, &mut rng);
            assert!(state.score >= last_score);
            last_score = state.score;
        }
    }
}
