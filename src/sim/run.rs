//! Run lifecycle: start, game over and revive

use glam::Vec2;

use super::difficulty::EnergyModel;
use super::state::{DelayedAction, GameEvent, GamePhase, GameState, Motion, Player, StartOptions};
use crate::consts::*;

impl GameState {
    /// Reset the session and start playing on a fresh path
    pub fn begin_run(&mut self, seed: u64, options: StartOptions) {
        self.seed = seed;
        self.generator.reseed(seed);
        self.generator.set_item_spawn_multiplier(if options.item_luck {
            ITEM_LUCK_MULTIPLIER
        } else {
            1.0
        });

        self.phase = GamePhase::Playing;
        self.time_ticks = 0;
        self.score = 0;
        self.energy = MAX_ENERGY;
        self.energy_model = EnergyModel::with_multipliers(
            if options.energy_master {
                ENERGY_MASTER_DECAY_FACTOR
            } else {
                1.0
            },
            if options.recovery_boost {
                RECOVERY_BOOST_FACTOR
            } else {
                1.0
            },
        );
        self.combo = 0;
        self.combo_timer = 0;
        self.powerups = Default::default();
        self.powerups.shield = options.start_shield;
        self.magnet_coins.clear();
        self.session_coins = 0;
        self.coin_multiplier = if options.coin_booster {
            COIN_BOOSTER_MULTIPLIER
        } else {
            1
        };
        self.fall = None;
        self.revives_used = 0;
        self.scheduler.cancel_all();
        self.player = Player::default();

        self.regenerate_path();
        self.camera.y = self.player.pos.y - self.viewport.height * CAMERA_LEAD;
        self.camera.target_y = self.camera.y;
        self.camera.zoom = 1.0;
        self.camera.target_zoom = 1.0;
        self.effects.reset(&self.theme);

        if options.fever_start {
            self.start_fever(FEVER_START_TICKS);
        }

        self.events.clear();
        self.emit(GameEvent::RunStarted);
        log::info!("Run started (seed {}, options {:?})", seed, options);
    }

    /// Freeze the run. Returns false (and does nothing) if it already ended.
    pub fn enter_game_over(&mut self) -> bool {
        if self.phase == GamePhase::GameOver {
            log::warn!("Game over requested twice; ignoring");
            return false;
        }

        self.phase = GamePhase::GameOver;
        self.player.motion = Motion::Idle;
        self.player.queue.clear();
        self.effects.shake(8.0);
        self.effects.death_particles(self.player.pos, self.body_color);

        self.settle_magnet_coins();
        self.high_score = self.high_score.max(self.score);

        self.scheduler.cancel_all();
        self.scheduler.schedule(
            self.time_ticks,
            GAME_OVER_NOTICE_DELAY_TICKS,
            DelayedAction::GameOverNotice,
        );
        self.emit(GameEvent::RunEnded);
        log::info!(
            "Game over at floor {} ({} coins collected)",
            self.score,
            self.session_coins
        );
        true
    }

    /// Whether `revive` would be accepted right now
    pub fn can_revive(&self) -> bool {
        matches!(self.phase, GamePhase::Falling | GamePhase::GameOver)
            && self.revives_used < MAX_REVIVES_PER_RUN
    }

    /// Put the player back on their last stair with full energy.
    ///
    /// Coins of a run that already ended were credited at game over, so the
    /// session counter restarts from zero in that case.
    pub fn revive(&mut self) -> bool {
        if !self.can_revive() {
            return false;
        }

        if self.phase == GamePhase::GameOver {
            self.magnet_coins.clear();
            self.session_coins = 0;
        }

        self.phase = GamePhase::Playing;
        self.energy = MAX_ENERGY;
        self.player.motion = Motion::Idle;
        self.player.queue.clear();
        self.player.armed_branch = None;
        self.powerups.fever_ticks = 0;
        self.powerups.rocket_steps = 0;
        self.fall = None;
        self.scheduler.cancel_all();
        self.effects.fire.clear();
        self.effects.fire_intensity = 0.0;
        self.effects.hud_coin_scale = 1.0;

        self.position_player_on_stair(self.player.stair_index);
        self.face_expected_direction();
        self.revives_used += 1;

        self.effects.float_text(
            "REVIVED!",
            self.player.pos - Vec2::new(0.0, 40.0),
            super::effects::GOLD,
            1.5,
        );
        self.emit(GameEvent::Revived);
        log::info!("Revived at floor {}", self.score);
        true
    }
}
