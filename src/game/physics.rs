//! Bike physics integration
//!
//! Rates are tuned as per-tick amounts at the nominal 30 Hz tick and scaled by
//! the measured delta, so behavior is frame-rate independent.

use crate::game::state::{GameState, BIKE_ROAD_FRACTION};

/// Per-tick rate scale at the nominal tick rate
const TICK_SCALE: f32 = 30.0;
/// Forward/backward acceleration while a pedal control is held
const ACCELERATION: f32 = 5.0;
/// Speed bleed toward zero when neither pedal control is held
const DECELERATION: f32 = 3.0;
/// Reverse speed is capped at this fraction of max speed
const REVERSE_SPEED_FACTOR: f32 = 0.5;

/// Advance the bike's lateral position and speed from accumulated input
/// pressure. Pure state transform; position is clamped to the road bounds
/// every step (clamp, not bounce).
pub fn integrate(state: &mut GameState, delta_time: f32) {
    let road_length = state.road.length;
    let bike = &mut state.bike;

    if bike.left_press_count > 0 || bike.right_press_count > 0 {
        let base_speed = bike.turn_speed;
        let left_speed = bike.left_press_count as f32 * base_speed * delta_time * TICK_SCALE;
        let right_speed = bike.right_press_count as f32 * base_speed * delta_time * TICK_SCALE;
        let net_movement = right_speed - left_speed;

        bike.x = (bike.x + net_movement).clamp(bike.min_x(), bike.max_x());
    }

    let accel_step = ACCELERATION * delta_time * TICK_SCALE;
    if bike.up_press_count > 0 {
        bike.speed = (bike.speed + accel_step).min(bike.max_speed);
    } else if bike.down_press_count > 0 {
        bike.speed = (bike.speed - accel_step).max(-bike.max_speed * REVERSE_SPEED_FACTOR);
    } else {
        // Bleed toward zero; snap when the step would cross it
        let decel_step = DECELERATION * delta_time * TICK_SCALE;
        if bike.speed.abs() < decel_step {
            bike.speed = 0.0;
        } else {
            bike.speed -= bike.speed.signum() * decel_step;
        }
    }

    // The bike does not travel the road; the road scrolls under it
    bike.z = road_length * BIKE_ROAD_FRACTION;
}

/// Apply a press/release to the matching counter. Counters saturate at zero
/// so an unmatched release can never go negative.
pub fn apply_move_input(
    state: &mut GameState,
    direction: crate::ws::protocol::MoveDirection,
    pressed: bool,
) {
    use crate::ws::protocol::MoveDirection;

    let bike = &mut state.bike;
    let counter = match direction {
        MoveDirection::Left => &mut bike.left_press_count,
        MoveDirection::Right => &mut bike.right_press_count,
        MoveDirection::Forward => &mut bike.up_press_count,
        MoveDirection::Back => &mut bike.down_press_count,
    };

    *counter = if pressed {
        counter.saturating_add(1)
    } else {
        counter.saturating_sub(1)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::GameState;
    use crate::util::time::tick_delta;
    use crate::ws::protocol::MoveDirection;

    #[test]
    fn one_left_press_moves_two_units_per_tick() {
        let mut state = GameState::new();
        state.bike.x = 50.0;
        state.bike.left_press_count = 1;

        integrate(&mut state, tick_delta());

        // turn_speed 2 * (1/30) * 30 = 2 units
        assert!((state.bike.x - 48.0).abs() < 1e-4);
    }

    #[test]
    fn opposing_presses_cancel_out() {
        let mut state = GameState::new();
        state.bike.x = 50.0;
        state.bike.left_press_count = 2;
        state.bike.right_press_count = 2;

        integrate(&mut state, tick_delta());

        assert!((state.bike.x - 50.0).abs() < 1e-4);
    }

    #[test]
    fn lateral_position_stays_in_bounds_under_any_input() {
        let mut state = GameState::new();
        let min_x = state.bike.min_x();
        let max_x = state.bike.max_x();

        // Hammer left for many ticks, then right
        state.bike.left_press_count = 5;
        for _ in 0..300 {
            integrate(&mut state, tick_delta());
            assert!(state.bike.x >= min_x && state.bike.x <= max_x);
        }
        assert!((state.bike.x - min_x).abs() < 1e-4);

        state.bike.left_press_count = 0;
        state.bike.right_press_count = 7;
        for _ in 0..300 {
            integrate(&mut state, tick_delta());
            assert!(state.bike.x >= min_x && state.bike.x <= max_x);
        }
        assert!((state.bike.x - max_x).abs() < 1e-4);
    }

    #[test]
    fn speed_accelerates_to_max_and_no_further() {
        let mut state = GameState::new();
        state.bike.up_press_count = 1;

        for _ in 0..60 {
            integrate(&mut state, tick_delta());
            assert!(state.bike.speed <= state.bike.max_speed);
        }
        assert!((state.bike.speed - state.bike.max_speed).abs() < 1e-4);
    }

    #[test]
    fn reverse_speed_is_capped_at_half_max() {
        let mut state = GameState::new();
        state.bike.down_press_count = 1;

        for _ in 0..60 {
            integrate(&mut state, tick_delta());
        }
        assert!((state.bike.speed + state.bike.max_speed / 2.0).abs() < 1e-4);
    }

    #[test]
    fn decay_snaps_to_zero_without_overshoot() {
        let mut state = GameState::new();
        state.bike.speed = 1.0;

        for _ in 0..20 {
            integrate(&mut state, tick_delta());
            assert!(state.bike.speed >= 0.0);
        }
        assert_eq!(state.bike.speed, 0.0);
    }

    #[test]
    fn release_never_drives_counters_negative() {
        let mut state = GameState::new();
        apply_move_input(&mut state, MoveDirection::Left, false);
        assert_eq!(state.bike.left_press_count, 0);

        apply_move_input(&mut state, MoveDirection::Left, true);
        apply_move_input(&mut state, MoveDirection::Left, true);
        assert_eq!(state.bike.left_press_count, 2);

        apply_move_input(&mut state, MoveDirection::Left, false);
        assert_eq!(state.bike.left_press_count, 1);
    }
}
