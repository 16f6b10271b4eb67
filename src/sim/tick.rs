//! Fixed timestep simulation tick
//!
//! Core game loop that advances the run deterministically, one 60 Hz tick per
//! call. `now_ms` only feeds the input-cadence clock of replayed intents.

use super::motion::StepSource;
use super::state::{DelayedAction, GameEvent, GamePhase, GameState};
use crate::consts::*;

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, now_ms: f64) {
    state.time_ticks += 1;

    // Coins keep flying to the HUD whatever the phase
    state.update_magnet_coins();

    for action in state.scheduler.take_due(state.time_ticks) {
        match action {
            DelayedAction::MonsterImpact => {
                state.enter_game_over();
            }
            DelayedAction::GameOverNotice => state.emit(GameEvent::GameOverNoticeDue),
        }
    }

    match state.phase {
        GamePhase::Ready => {
            state.effects.update_ambient(false, state.theme.bg.h, 0);
        }
        GamePhase::Falling => tick_falling(state),
        GamePhase::GameOver => tick_game_over(state),
        GamePhase::Playing => tick_playing(state, now_ms),
    }
}

fn tick_playing(state: &mut GameState, now_ms: f64) {
    // Fever
    if state.powerups.fever_active() {
        state.powerups.fever_ticks -= 1;
        state.energy = (state.energy + FEVER_ENERGY_REGEN).min(MAX_ENERGY);
        if state.time_ticks % 5 == 0 {
            let feet = state.player.pos + glam::Vec2::new(0.0, PLAYER_FOOT_OFFSET);
            state.effects.step_particles(feet, 2);
        }
    }

    // Rocket auto-steps
    if state.powerups.rocket_active() && state.time_ticks % ROCKET_STEP_INTERVAL_TICKS == 0 {
        state.request_step(now_ms, StepSource::Rocket);
        state.powerups.rocket_steps -= 1;
    }

    // Energy
    let drain = state.energy_model.tick_drain(
        state.powerups.fever_active(),
        state.powerups.rocket_active(),
    );
    state.energy = (state.energy - drain).min(MAX_ENERGY);
    if state.energy <= 0.0 {
        state.energy = 0.0;
        state.enter_game_over();
        return;
    }

    // Combo window
    if state.combo_timer > 0 {
        state.combo_timer -= 1;
        if state.combo_timer == 0 {
            state.combo = 0;
        }
    }

    // Momentum decays smoothly between inputs
    if state.player.momentum > 0.0 {
        state.player.momentum *= MOMENTUM_DECAY;
        if state.player.momentum < MOMENTUM_FLOOR {
            state.player.momentum = 0.0;
        }
        state.player.apply_momentum();
    }

    state.advance_motion(now_ms);

    // Camera speeds up with the player
    state.camera.target_y = state.player.pos.y - state.viewport.height * CAMERA_LEAD;
    let speed = if state.player.move_speed > BASE_MOVE_SPEED {
        CAMERA_SMOOTHING + (state.player.move_speed - BASE_MOVE_SPEED) * CAMERA_SPEED_GAIN
    } else {
        CAMERA_SMOOTHING
    };
    state.camera.y += (state.camera.target_y - state.camera.y) * speed;

    // Keep stairs generated ahead of the camera
    let needs_more = state
        .stairs
        .last()
        .is_some_and(|last| last.pos.y > state.camera.y - GENERATION_WATERMARK);
    if needs_more {
        let target = state.stairs.len();
        state.ensure_stairs(target);
    }

    let viewport = state.viewport;
    state.effects.update_particles();
    state
        .effects
        .update_weather(viewport, state.theme.bg_type, state.time_ticks);
    state.effects.update_floating_texts();

    let intense = state.powerups.auto_facing();
    state.camera.target_zoom = if intense { FEVER_ZOOM } else { 1.0 };
    state.camera.zoom += (state.camera.target_zoom - state.camera.zoom) * 0.05;
    state
        .effects
        .update_ambient(state.powerups.fever_active(), state.theme.bg.h, state.score);
}

fn tick_falling(state: &mut GameState) {
    let fell_far_enough = state.advance_fall();

    state.camera.target_y = state.player.pos.y - state.viewport.height * CAMERA_LEAD;
    state.camera.y += (state.camera.target_y - state.camera.y) * FALL_CAMERA_SMOOTHING;

    state.effects.update_fire(state.viewport, true);
    state.effects.update_particles();
    state.effects.update_floating_texts();
    state.effects.shake_at_least(2.0);

    if fell_far_enough {
        state.enter_game_over();
    }
}

fn tick_game_over(state: &mut GameState) {
    state.effects.update_fire(state.viewport, false);
    state.effects.update_particles();
    state.effects.update_floating_texts();
    state
        .effects
        .update_ambient(false, state.theme.bg.h, state.score);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characters::Theme;
    use crate::sim::state::{Motion, StartOptions, Viewport};

    fn running(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Viewport::default(), Theme::default());
        state.begin_run(seed, StartOptions::default());
        state.drain_events();
        state
    }

    #[test]
    fn test_ready_phase_is_inert() {
        let mut state = GameState::new(1, Viewport::default(), Theme::default());
        for _ in 0..30 {
            tick(&mut state, 0.0);
        }
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.energy, MAX_ENERGY);
    }

    #[test]
    fn test_energy_zero_ends_run_same_tick() {
        let mut state = running(2);
        state.energy = state.energy_model.decay_rate * 0.5;
        tick(&mut state, 0.0);
        assert_eq!(state.energy, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert!(state.drain_events().contains(&GameEvent::RunEnded));
    }

    #[test]
    fn test_energy_stays_in_range() {
        let mut state = running(3);
        state.powerups.fever_ticks = 10;
        for _ in 0..600 {
            tick(&mut state, 0.0);
            assert!((0.0..=MAX_ENERGY).contains(&state.energy));
        }
    }

    #[test]
    fn test_fever_counts_down_one_per_tick() {
        let mut state = running(4);
        state.powerups.fever_ticks = FEVER_DURATION_TICKS;
        state.face_expected_direction();
        state.request_step(0.0, StepSource::Player);
        assert_eq!(state.score, FEVER_SCORE_PER_STEP);

        tick(&mut state, 16.0);
        assert_eq!(state.powerups.fever_ticks, FEVER_DURATION_TICKS - 1);
    }

    #[test]
    fn test_rocket_steps_every_third_tick() {
        let mut state = running(5);
        state.start_rocket();
        for _ in 0..(ROCKET_STEPS as u64 * ROCKET_STEP_INTERVAL_TICKS) {
            tick(&mut state, 0.0);
        }
        assert_eq!(state.powerups.rocket_steps, 0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.score > 0);
        // No decay while rocketing; only the final tick drains
        assert!(state.energy > MAX_ENERGY - 1.0);
    }

    #[test]
    fn test_combo_expires() {
        let mut state = running(6);
        state.auto_direction = true;
        state.request_step(0.0, StepSource::Player);
        assert_eq!(state.combo, 1);
        for _ in 0..COMBO_TIMEOUT_TICKS {
            tick(&mut state, 0.0);
        }
        assert_eq!(state.combo, 0);
    }

    #[test]
    fn test_monster_impact_ends_run_after_delay() {
        let mut state = running(7);
        state.player.motion = Motion::MonsterImpact;
        state.scheduler.schedule(
            state.time_ticks,
            MONSTER_IMPACT_DELAY_TICKS,
            DelayedAction::MonsterImpact,
        );
        for _ in 0..MONSTER_IMPACT_DELAY_TICKS - 1 {
            tick(&mut state, 0.0);
        }
        assert_eq!(state.phase, GamePhase::Playing);
        tick(&mut state, 0.0);
        assert_eq!(state.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_fall_then_single_notice() {
        let mut state = running(8);
        state.player.facing = state.wrong_direction();
        state.request_step(0.0, StepSource::Player);
        assert_eq!(state.phase, GamePhase::Falling);

        let mut notices = 0;
        for _ in 0..400 {
            tick(&mut state, 0.0);
            notices += state
                .drain_events()
                .iter()
                .filter(|e| **e == GameEvent::GameOverNoticeDue)
                .count();
        }
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(notices, 1);
    }

    #[test]
    fn test_generation_stays_ahead_of_camera() {
        let mut state = running(9);
        state.auto_direction = true;
        for i in 0..3_000u64 {
            if !state.player.is_moving() {
                state.request_step(i as f64 * 16.0, StepSource::Player);
            }
            state.energy = MAX_ENERGY;
            tick(&mut state, i as f64 * 16.0);
            let last = state.stairs.last().unwrap();
            assert!(last.pos.y <= state.camera.y - GENERATION_WATERMARK);
        }
        assert!(state.stairs.len() > INITIAL_STAIR_COUNT);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_determinism() {
        let run = |seed: u64| {
            let mut state = running(seed);
            state.auto_direction = true;
            for i in 0..600u64 {
                if i % 7 == 0 {
                    state.request_step(i as f64 * 16.0, StepSource::Player);
                }
                tick(&mut state, i as f64 * 16.0);
            }
            (state.score, state.player.stair_index, state.energy, state.stairs.len())
        };
        assert_eq!(run(42), run(42));
    }
}
