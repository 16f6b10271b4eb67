//! Player motion state machine
//!
//! A step request either gets buffered (an animation is in flight) or is
//! resolved immediately against the stair the player stands on: armed lure,
//! branch, main path or a miss.

use glam::Vec2;

use super::items::coin_burst_size;
use super::state::{
    DelayedAction, Direction, FallState, GameEvent, GamePhase, GameState, Intent, Motion,
    standing_point,
};
use crate::consts::*;

/// Who asked for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepSource {
    /// Direct player input
    Player,
    /// A buffered intent being replayed
    Queue,
    /// Rocket auto-step
    Rocket,
}

/// Hop interpolation: ease-in-out horizontally with a sine jump arc
pub fn hop_position(from: Vec2, to: Vec2, t: f32) -> Vec2 {
    let ease = if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    };
    let lift = (t * std::f32::consts::PI).sin() * JUMP_HEIGHT;
    Vec2::new(
        from.x + (to.x - from.x) * ease,
        from.y + (to.y - from.y) * ease - lift,
    )
}

/// Shield save: leap toward the void, then get reeled back to `to`
pub fn shield_arc_position(from: Vec2, to: Vec2, dir: f32, t: f32) -> Vec2 {
    if t < SHIELD_LEAP_FRACTION {
        let sub = t / SHIELD_LEAP_FRACTION;
        Vec2::new(
            from.x + dir * SHIELD_LEAP_DISTANCE * sub,
            from.y - (sub * std::f32::consts::PI).sin() * SHIELD_LEAP_RISE
                + sub * sub * SHIELD_LEAP_DROP,
        )
    } else {
        let sub = (t - SHIELD_LEAP_FRACTION) / (1.0 - SHIELD_LEAP_FRACTION);
        let ease = 1.0 - (1.0 - sub).powi(3);
        let deepest = Vec2::new(from.x + dir * SHIELD_LEAP_DISTANCE, from.y + SHIELD_LEAP_DROP);
        deepest + (to - deepest) * ease
    }
}

impl GameState {
    /// Request one step up. Returns false when the request was ignored or
    /// dropped from a full queue.
    pub fn request_step(&mut self, now_ms: f64, source: StepSource) -> bool {
        if !self.is_playing() {
            return false;
        }
        if source == StepSource::Player && self.powerups.rocket_active() {
            return false;
        }
        if self.player.motion == Motion::MonsterImpact {
            return false;
        }

        self.register_cadence(now_ms);

        if self.player.is_moving() {
            return self.player.queue.push(Intent::Step);
        }

        self.resolve_step();
        true
    }

    /// Flip facing and step; buffered while an animation is in flight
    pub fn request_direction_change(&mut self, now_ms: f64) -> bool {
        if !self.is_playing() || self.powerups.rocket_active() {
            return false;
        }
        if self.player.motion == Motion::MonsterImpact {
            return false;
        }
        if self.player.is_moving() {
            return self.player.queue.push(Intent::Direction);
        }

        self.flip_facing();
        self.request_step(now_ms, StepSource::Player)
    }

    fn flip_facing(&mut self) {
        self.player.facing = self.player.facing.flipped();
        self.emit(GameEvent::DirectionChanged);
        let feet = self.player.pos + Vec2::new(0.0, PLAYER_FOOT_OFFSET);
        self.effects.step_particles(feet, 3);
    }

    /// Replay one buffered intent (called when an animation completes)
    pub(crate) fn process_queue(&mut self, now_ms: f64) {
        let Some(intent) = self.player.queue.pop() else {
            return;
        };
        if intent == Intent::Direction {
            self.flip_facing();
        }
        self.request_step(now_ms, StepSource::Queue);
    }

    /// Fast inputs build momentum, which speeds up the hop
    fn register_cadence(&mut self, now_ms: f64) {
        if let Some(last) = self.player.last_input_ms {
            let interval = now_ms - last;
            if interval < MOMENTUM_WINDOW_MS {
                let closeness = ((MOMENTUM_WINDOW_MS - interval).max(0.0) / MOMENTUM_WINDOW_MS) as f32;
                let boost = closeness.powf(MOMENTUM_BOOST_EXPONENT) * MOMENTUM_BOOST_SCALE;
                self.player.momentum = (self.player.momentum + boost).min(1.0);
            }
        }
        self.player.last_input_ms = Some(now_ms);
        self.player.apply_momentum();
    }

    fn resolve_step(&mut self) {
        let index = self.player.stair_index;
        self.ensure_stairs(index + 1);

        let expected = self.expected_direction(index);
        if self.powerups.auto_facing() || self.auto_direction {
            self.player.facing = expected;
        }

        // Standing on a lure: any step walks into its monster
        if let Some(lure) = self.player.armed_branch.take()
            && let Some(monster) = lure.next
        {
            self.begin_move(standing_point(monster.pos), true);
            return;
        }

        if let Some(branch) = &self.stairs[index].branch
            && branch.direction == self.player.facing
        {
            let target = standing_point(branch.pos);
            if branch.is_two_step() {
                self.player.armed_branch = Some(branch.clone());
                self.begin_move(target, false);
            } else {
                self.begin_move(target, true);
            }
            return;
        }

        if self.player.facing == expected {
            self.advance_main_path(index + 1);
        } else if self.powerups.shield {
            self.start_shield_recovery();
        } else {
            self.start_falling();
        }
    }

    fn begin_move(&mut self, to: Vec2, toward_monster: bool) {
        self.player.motion = Motion::Moving {
            from: self.player.pos,
            to,
            progress: 0.0,
            toward_monster,
        };
    }

    /// Correct step onto the next main-path stair
    fn advance_main_path(&mut self, next: usize) {
        let start = self.player.pos;
        self.begin_move(self.stairs[next].standing_point(), false);

        self.stairs[next].visited = true;
        if let Some(item) = self.stairs[next].item.take() {
            self.apply_pickup(item);
        }

        self.player.stair_index = next;
        self.score += if self.powerups.fever_active() {
            FEVER_SCORE_PER_STEP
        } else {
            1
        };
        self.energy = (self.energy + self.energy_model.recover_amount).min(MAX_ENERGY);

        self.combo += 1;
        self.combo_timer = COMBO_TIMEOUT_TICKS;
        if self.combo % COMBO_COIN_INTERVAL == 0 {
            self.spawn_magnet_coins(coin_burst_size(self.combo));
        }

        self.emit(GameEvent::Stepped { floor: self.score });

        if self.combo % COMBO_ANNOUNCE_INTERVAL == 0 {
            self.effects.announce(
                format!("{} COMBO!", self.combo),
                super::effects::GOLD,
                super::effects::COMBO_ANNOUNCE_TICKS,
            );
            self.emit(GameEvent::ComboMilestone { combo: self.combo });
        }

        self.effects
            .step_particles(start + Vec2::new(0.0, PLAYER_FOOT_OFFSET), 6);

        if self.score > 0 && self.score % SCORE_MILESTONE_INTERVAL == 0 {
            self.effects.flash_milestone();
            self.effects.announce(
                format!("🎉 {} FLOORS!", self.score),
                super::effects::GOLD,
                super::effects::MILESTONE_ANNOUNCE_TICKS,
            );
            let center = Vec2::new(
                self.viewport.width / 2.0,
                self.camera.y + self.viewport.height / 2.0,
            );
            self.effects.milestone_burst(center);
            self.emit(GameEvent::ScoreMilestone { score: self.score });
        }

        self.energy_model.recompute(self.score);
        self.high_score = self.high_score.max(self.score);
    }

    /// Spend the shield on a missed step and arc back onto the current stair
    fn start_shield_recovery(&mut self) {
        self.powerups.shield = false;
        let from = self.player.pos;
        self.player.motion = Motion::ShieldRecovery {
            from,
            to: self.current_stair().standing_point(),
            progress: 0.0,
        };
        self.effects
            .float_text("SHIELD SAVED!", from - Vec2::new(0.0, 50.0), 0x44BBFF, 1.2);
        self.emit(GameEvent::ShieldSaved);
    }

    /// Jump into the void
    pub fn start_falling(&mut self) {
        self.phase = GamePhase::Falling;
        self.player.motion = Motion::Idle;
        self.player.queue.clear();
        self.fall = Some(FallState {
            velocity: Vec2::new(self.player.facing.sign() * FALL_SPEED_X, FALL_LAUNCH_Y),
            start_y: self.player.pos.y,
        });
        self.emit(GameEvent::FallStarted);
    }

    /// Advance the in-flight animation by one tick
    pub(crate) fn advance_motion(&mut self, now_ms: f64) {
        match self.player.motion {
            Motion::ShieldRecovery { from, to, progress } => {
                let progress = progress + SHIELD_ANIM_STEP;
                self.effects.shake(2.0);
                if progress >= 1.0 {
                    self.player.pos = to;
                    self.player.motion = Motion::Idle;
                    self.process_queue(now_ms);
                } else {
                    let dir = self.player.facing.sign();
                    self.player.pos = shield_arc_position(from, to, dir, progress);
                    self.player.motion = Motion::ShieldRecovery { from, to, progress };
                }
            }
            Motion::Moving {
                from,
                to,
                progress,
                toward_monster,
            } => {
                let progress = progress + self.player.move_speed;
                if progress >= 1.0 {
                    self.player.pos = to;
                    if toward_monster {
                        self.arrive_at_monster();
                    } else {
                        self.player.motion = Motion::Idle;
                        self.process_queue(now_ms);
                    }
                } else {
                    self.player.pos = hop_position(from, to, progress);
                    self.player.motion = Motion::Moving {
                        from,
                        to,
                        progress,
                        toward_monster,
                    };
                }
            }
            Motion::Idle | Motion::MonsterImpact => {}
        }
    }

    fn arrive_at_monster(&mut self) {
        self.player.motion = Motion::MonsterImpact;
        self.player.queue.clear();
        self.effects.float_text(
            "GGGRRRRR!!",
            self.player.pos - Vec2::new(0.0, 50.0),
            0xFF0000,
            1.5,
        );
        self.effects.shake(15.0);
        self.scheduler.schedule(
            self.time_ticks,
            MONSTER_IMPACT_DELAY_TICKS,
            DelayedAction::MonsterImpact,
        );
        self.emit(GameEvent::MonsterHit);
    }

    /// Advance the ballistic fall; true once it has dropped far enough
    pub(crate) fn advance_fall(&mut self) -> bool {
        let Some(fall) = &mut self.fall else {
            return true;
        };
        fall.velocity.y += FALL_GRAVITY;
        self.player.pos += fall.velocity;
        self.player.pos.y > fall.start_y + FALL_DISTANCE
    }

    /// Face whichever way the path continues from the current stair
    pub fn face_expected_direction(&mut self) {
        let index = self.player.stair_index;
        self.ensure_stairs(index + 1);
        self.player.facing = self.expected_direction(index);
    }

    /// Facing that would be a miss from the current stair
    pub fn wrong_direction(&mut self) -> Direction {
        let index = self.player.stair_index;
        self.ensure_stairs(index + 1);
        self.expected_direction(index).flipped()
    }
}
