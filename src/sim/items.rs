//! Item pickups, power-ups and magnet coins

use glam::Vec2;

use super::state::{CoinPhase, GameEvent, GameState, ItemDescriptor, ItemKind, MagnetCoin};
use crate::consts::*;

/// Coins granted by a combo milestone: `2^(combo/10)`, capped
pub fn coin_burst_size(combo: u32) -> u32 {
    let exponent = combo / COMBO_COIN_INTERVAL;
    1u32.checked_shl(exponent)
        .unwrap_or(u32::MAX)
        .min(MAX_COIN_BURST)
}

impl GameState {
    /// Apply an item picked up on arrival
    pub(crate) fn apply_pickup(&mut self, item: ItemDescriptor) {
        self.emit(GameEvent::ItemPicked(item.kind));
        if item.kind != ItemKind::Coin {
            let at = self.player.pos - Vec2::new(0.0, 40.0);
            self.effects
                .float_text(format!("{} GET!", item.glyph), at, item.color, 1.2);
        }

        match item.kind {
            ItemKind::Coin => self.spawn_magnet_coins(COIN_ITEM_BURST),
            ItemKind::Shield => self.powerups.shield = true,
            ItemKind::Fever => self.start_fever(FEVER_DURATION_TICKS),
            ItemKind::Rocket => self.start_rocket(),
        }
    }

    /// Remove items from the next `count` stairs ahead of the player
    pub fn clear_upcoming_items(&mut self, count: usize) {
        let start = self.player.stair_index + 1;
        let end = (start + count).min(self.stairs.len());
        for stair in self.stairs.iter_mut().take(end).skip(start) {
            stair.item = None;
        }
    }

    pub fn start_fever(&mut self, ticks: u32) {
        self.powerups.fever_ticks = ticks;
        self.effects.shake(10.0);
        self.clear_upcoming_items(FEVER_ITEM_CLEAR_WINDOW);
    }

    pub fn start_rocket(&mut self) {
        self.powerups.rocket_steps = ROCKET_STEPS;
        self.clear_upcoming_items(ROCKET_ITEM_CLEAR_WINDOW);
        let center = Vec2::new(self.viewport.width / 2.0, self.viewport.height / 2.0);
        self.effects.float_text("🚀 ROCKET JUMP!", center, 0xFF8800, 1.5);
    }

    /// Grant a shield charge; false if not playing or already shielded
    pub fn activate_shield(&mut self) -> bool {
        if !self.is_playing() || self.powerups.shield {
            return false;
        }
        self.powerups.shield = true;
        true
    }

    /// Start a short fever; false if not playing or already in fever
    pub fn activate_fever(&mut self) -> bool {
        if !self.is_playing() || self.powerups.fever_active() {
            return false;
        }
        self.start_fever(FEVER_START_TICKS);
        true
    }

    /// Start a rocket; false if not playing or already rocketing
    pub fn activate_rocket(&mut self) -> bool {
        if !self.is_playing() || self.powerups.rocket_active() {
            return false;
        }
        self.start_rocket();
        true
    }

    /// Burst `count` coins out of the player toward the HUD counter
    pub fn spawn_magnet_coins(&mut self, count: u32) {
        let origin = Vec2::new(self.player.pos.x, self.player.pos.y - self.camera.y);
        for i in 0..count {
            let vx = (self.effects.unit() - 0.5) * COIN_EXPLODE_SPEED;
            let vy = (self.effects.unit() - 1.0) * COIN_EXPLODE_SPEED;
            self.magnet_coins.push(MagnetCoin {
                pos: origin,
                vel: Vec2::new(vx, vy),
                life: 0,
                phase: CoinPhase::Exploding,
                delay: i as f32 * COIN_STAGGER_TICKS,
            });
        }
        self.emit(GameEvent::CoinBurst { count });
    }

    /// Advance every in-flight coin; collected coins go into `session_coins`
    pub(crate) fn update_magnet_coins(&mut self) {
        let anchor = Vec2::from(HUD_COIN_ANCHOR);
        let mut collected = 0u64;

        self.magnet_coins.retain_mut(|coin| {
            if coin.delay > 0.0 {
                coin.delay -= 1.0;
                return true;
            }
            coin.life += 1;

            match coin.phase {
                CoinPhase::Exploding => {
                    coin.pos += coin.vel;
                    coin.vel *= COIN_DRAG;
                    coin.vel.y += COIN_GRAVITY;
                    if coin.life > COIN_EXPLODE_TICKS {
                        coin.phase = CoinPhase::Magnetizing;
                    }
                    true
                }
                CoinPhase::Magnetizing => {
                    let delta = anchor - coin.pos;
                    let dist = delta.length();
                    if dist < COIN_COLLECT_RADIUS {
                        collected += 1;
                        return false;
                    }
                    let speed = (dist * COIN_MAGNET_GAIN).min(COIN_MAX_SPEED);
                    coin.pos += delta / dist * speed;
                    true
                }
            }
        });

        if collected > 0 {
            self.session_coins += collected;
            self.effects.pulse_hud_coin(HUD_COIN_PULSE);
            for _ in 0..collected {
                self.emit(GameEvent::CoinCollected);
            }
        }
    }

    /// Credit coins still in flight (run is ending)
    pub(crate) fn settle_magnet_coins(&mut self) {
        self.session_coins += self.magnet_coins.len() as u64;
        self.magnet_coins.clear();
    }
}
