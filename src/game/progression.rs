//! Distance accounting and level/speed progression

use crate::game::state::{GameState, BASE_SCROLL_SPEED};

/// Cumulative distance thresholds at which the level rises
pub const LEVEL_THRESHOLDS: [f32; 5] = [2000.0, 4000.0, 6000.0, 8000.0, 10000.0];
/// Level cap
pub const MAX_LEVEL: u8 = 5;
/// Scroll speed gained per level
const SPEED_PER_LEVEL: f32 = 10.0;
/// Distance between score milestones
const MILESTONE_DISTANCE: f32 = 100.0;
/// Points per milestone crossed
const MILESTONE_POINTS: u32 = 10;

/// The level implied by a cumulative distance: 1-based index of the first
/// threshold above it, capped at the maximum
pub fn level_for_distance(distance: f32) -> u8 {
    LEVEL_THRESHOLDS
        .iter()
        .position(|&threshold| distance < threshold)
        .map(|idx| idx as u8 + 1)
        .unwrap_or(MAX_LEVEL)
}

/// Scroll speed at a given level
pub fn speed_for_level(level: u8) -> f32 {
    BASE_SCROLL_SPEED + (level.saturating_sub(1)) as f32 * SPEED_PER_LEVEL
}

/// Advance scrolled distance, award milestone points, and check level
/// progression. Level only ever rises. Returns true on a level-up so the
/// caller can force a broadcast for the one-time message.
pub fn advance(state: &mut GameState, delta_time: f32) -> bool {
    let increment = state.speed * delta_time;
    let new_distance = state.road.distance_moved + increment;

    let last_milestone = (state.road.last_distance / MILESTONE_DISTANCE).floor();
    let new_milestone = (new_distance / MILESTONE_DISTANCE).floor();
    if new_milestone > last_milestone {
        state.score += MILESTONE_POINTS;
    }

    state.road.distance_moved = new_distance;
    state.road.last_distance = new_distance;
    state.distance_since_last_spawn += increment;

    let new_level = level_for_distance(new_distance);
    if new_level > state.level {
        state.level = new_level;
        state.speed = speed_for_level(new_level);
        state.set_message(format!("Level {new_level}! Speed increased!"));
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_fixed_thresholds() {
        assert_eq!(level_for_distance(0.0), 1);
        assert_eq!(level_for_distance(1999.9), 1);
        assert_eq!(level_for_distance(2000.0), 2);
        assert_eq!(level_for_distance(7999.9), 4);
        assert_eq!(level_for_distance(8000.0), 5);
        // Beyond the last threshold the cap holds
        assert_eq!(level_for_distance(12000.0), MAX_LEVEL);
    }

    #[test]
    fn speed_rises_ten_per_level() {
        assert_eq!(speed_for_level(1), 60.0);
        assert_eq!(speed_for_level(3), 80.0);
        assert_eq!(speed_for_level(5), 100.0);
    }

    #[test]
    fn progression_is_deterministic_for_a_fixed_tick_sequence() {
        let mut a = GameState::new();
        let mut b = GameState::new();

        for _ in 0..2000 {
            advance(&mut a, 1.0 / 30.0);
            advance(&mut b, 1.0 / 30.0);
        }

        assert_eq!(a.level, b.level);
        assert_eq!(a.score, b.score);
        assert_eq!(a.road.distance_moved, b.road.distance_moved);
    }

    #[test]
    fn milestones_award_ten_points_per_hundred_units() {
        let mut state = GameState::new();
        // One whole second at level-1 speed covers 60 units
        advance(&mut state, 1.0);
        assert_eq!(state.score, 0);
        advance(&mut state, 1.0);
        // 120 units: one milestone crossed
        assert_eq!(state.score, MILESTONE_POINTS);
    }

    #[test]
    fn level_up_bumps_speed_and_messages_once() {
        let mut state = GameState::new();
        state.road.distance_moved = 1999.0;
        state.road.last_distance = 1999.0;

        // Crossing 2000 units lifts the level
        let leveled = advance(&mut state, 1.0);
        assert!(leveled);
        assert_eq!(state.level, 2);
        assert_eq!(state.speed, speed_for_level(2));
        let text = state.message.as_ref().unwrap().text.clone();
        assert!(text.contains("Level 2"));

        // The next tick does not re-announce
        assert!(!advance(&mut state, 1.0 / 30.0));
    }

    #[test]
    fn level_never_goes_down() {
        let mut state = GameState::new();
        state.level = 5;
        state.speed = speed_for_level(5);
        state.road.distance_moved = 11000.0;
        state.road.last_distance = 11000.0;

        advance(&mut state, 1.0 / 30.0);
        assert_eq!(state.level, 5);
    }
}
