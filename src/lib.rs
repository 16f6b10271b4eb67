//! Infinite Stairs - An endless zig-zag stair climbing arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (stairs, motion, items, energy)
//! - `engine`: Orchestrator owning the simulation and its collaborators
//! - `renderer`: Draw-command frames, tessellation and the WebGPU pipeline
//! - `platform`: Browser/native platform abstraction (clocks)
//! - `persistence`: Key-value progress store
//! - `shop`: Coin economy (upgrades, consumables, revives)

pub mod audio;
pub mod characters;
pub mod engine;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod shop;
pub mod sim;

pub use characters::{CharacterDescriptor, Theme};
pub use engine::{GameEngine, GameOverReport};
pub use settings::{QualityPreset, Settings};
pub use sim::{GamePhase, StartOptions};

/// Game configuration constants
///
/// These are empirically tuned; small changes are very noticeable in play.
pub mod consts {
    /// Simulation rate; all per-tick quantities below assume this
    pub const TICK_HZ: f32 = 60.0;
    /// Milliseconds per simulation tick
    pub const TICK_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;

    /// Logical viewport width the game is designed for
    pub const BASE_WIDTH: f32 = 360.0;
    /// Default logical viewport height
    pub const BASE_HEIGHT: f32 = 640.0;

    /// Stair geometry
    pub const STAIR_WIDTH: f32 = 55.0;
    pub const STAIR_HEIGHT: f32 = 18.0;
    /// Vertical distance between consecutive stairs
    pub const STAIR_RISE: f32 = STAIR_HEIGHT + 20.0;
    /// Horizontal distance between consecutive stairs
    pub const STAIR_RUN: f32 = STAIR_WIDTH * 0.7;
    /// Player stands this far above a stair's top edge
    pub const PLAYER_FOOT_OFFSET: f32 = 16.0;
    /// First stair sits this far above the bottom of the viewport
    pub const FIRST_STAIR_BOTTOM_OFFSET: f32 = 100.0;

    /// Main path must keep this distance from either edge
    pub const SAFE_MARGIN: f32 = 80.0;
    /// First branch stair margin
    pub const BRANCH_MARGIN: f32 = 60.0;
    /// Second (monster) stair of a two-step branch margin
    pub const BRANCH_TAIL_MARGIN: f32 = 40.0;

    /// Generation batches
    pub const INITIAL_STAIR_COUNT: usize = 200;
    pub const STAIR_BATCH_SIZE: usize = 50;
    /// Regenerate when the last stair is within this distance of the camera top
    pub const GENERATION_WATERMARK: f32 = 200.0;
    /// Chance that the path flips direction on each stair
    pub const DIRECTION_FLIP_CHANCE: f32 = 0.4;

    /// Items never spawn at or below this stair index
    pub const ITEM_SAFE_ZONE: usize = 10;
    /// Base chance that an eligible stair carries an item
    pub const ITEM_SPAWN_CHANCE: f32 = 0.2;
    pub const ITEM_COOLDOWN: u32 = 10;
    pub const ROCKET_ITEM_COOLDOWN: u32 = 20;

    /// Monsters never branch off at or below this stair index
    pub const MONSTER_SAFE_ZONE: usize = 30;
    pub const MONSTER_BASE_CHANCE: f32 = 0.03;
    pub const MONSTER_CHANCE_STEP: f32 = 0.01;
    /// Stairs of height per chance step
    pub const MONSTER_CHANCE_INTERVAL: usize = 50;
    pub const MONSTER_MAX_CHANCE: f32 = 0.15;
    pub const TWO_STEP_BRANCH_CHANCE: f32 = 0.4;
    pub const ONE_STEP_MONSTER_COOLDOWN: u32 = 10;
    pub const TWO_STEP_MONSTER_COOLDOWN: u32 = 15;

    /// Energy economy
    pub const MAX_ENERGY: f32 = 100.0;
    pub const BASE_DECAY_RATE: f32 = 0.15;
    pub const DECAY_PER_POINT: f32 = 0.001;
    pub const MAX_DECAY_RATE: f32 = 0.6;
    pub const BASE_RECOVER_AMOUNT: f32 = 8.0;
    pub const RECOVER_LOSS_PER_POINT: f32 = 0.005;
    pub const MIN_RECOVER_AMOUNT: f32 = 3.0;
    /// Fever multiplies the nominal decay by this
    pub const FEVER_DECAY_FACTOR: f32 = 0.2;
    /// Energy regained each fever tick
    pub const FEVER_ENERGY_REGEN: f32 = 0.2;

    /// Movement
    pub const BASE_MOVE_SPEED: f32 = 0.12;
    pub const MAX_MOVE_SPEED: f32 = 0.45;
    /// Inputs closer together than this build momentum
    pub const MOMENTUM_WINDOW_MS: f64 = 500.0;
    pub const MOMENTUM_BOOST_SCALE: f32 = 0.35;
    pub const MOMENTUM_BOOST_EXPONENT: f32 = 1.5;
    /// Per-tick momentum decay factor
    pub const MOMENTUM_DECAY: f32 = 0.97;
    pub const MOMENTUM_FLOOR: f32 = 0.01;
    /// Peak height of the hop between stairs
    pub const JUMP_HEIGHT: f32 = 25.0;
    pub const INPUT_QUEUE_CAPACITY: usize = 3;

    /// Shield recovery arc
    pub const SHIELD_ANIM_STEP: f32 = 0.04;
    /// Fraction of the arc spent leaping into the void
    pub const SHIELD_LEAP_FRACTION: f32 = 0.4;
    pub const SHIELD_LEAP_DISTANCE: f32 = 40.0;
    pub const SHIELD_LEAP_RISE: f32 = 30.0;
    pub const SHIELD_LEAP_DROP: f32 = 40.0;

    /// Falling
    pub const FALL_SPEED_X: f32 = 3.0;
    pub const FALL_LAUNCH_Y: f32 = -8.0;
    pub const FALL_GRAVITY: f32 = 0.5;
    /// Game over once the player drops this far below the fall start
    pub const FALL_DISTANCE: f32 = 200.0;

    /// Delays (in ticks)
    pub const MONSTER_IMPACT_DELAY_TICKS: u64 = 30;
    pub const GAME_OVER_NOTICE_DELAY_TICKS: u64 = 72;

    /// Combo and scoring
    pub const COMBO_TIMEOUT_TICKS: u32 = 60;
    pub const COMBO_COIN_INTERVAL: u32 = 10;
    pub const COMBO_ANNOUNCE_INTERVAL: u32 = 20;
    pub const MAX_COIN_BURST: u32 = 256;
    pub const SCORE_MILESTONE_INTERVAL: u64 = 100;
    pub const FEVER_SCORE_PER_STEP: u64 = 2;

    /// Power-ups
    pub const FEVER_DURATION_TICKS: u32 = 300;
    pub const FEVER_START_TICKS: u32 = 180;
    pub const FEVER_ITEM_CLEAR_WINDOW: usize = 60;
    pub const ROCKET_STEPS: u32 = 20;
    pub const ROCKET_STEP_INTERVAL_TICKS: u64 = 3;
    pub const ROCKET_ITEM_CLEAR_WINDOW: usize = 25;
    pub const COIN_ITEM_BURST: u32 = 10;

    /// Magnet coins
    pub const HUD_COIN_ANCHOR: (f32, f32) = (140.0, 37.0);
    pub const COIN_STAGGER_TICKS: f32 = 0.4;
    pub const COIN_EXPLODE_TICKS: u32 = 10;
    pub const COIN_EXPLODE_SPEED: f32 = 15.0;
    pub const COIN_DRAG: f32 = 0.92;
    pub const COIN_GRAVITY: f32 = 0.2;
    pub const COIN_MAGNET_GAIN: f32 = 0.25;
    pub const COIN_MAX_SPEED: f32 = 30.0;
    pub const COIN_COLLECT_RADIUS: f32 = 10.0;
    pub const HUD_COIN_PULSE: f32 = 1.6;

    /// Camera
    pub const CAMERA_SMOOTHING: f32 = 0.08;
    pub const CAMERA_SPEED_GAIN: f32 = 0.4;
    pub const FALL_CAMERA_SMOOTHING: f32 = 0.04;
    /// Player is kept this fraction of the viewport height below the camera top
    pub const CAMERA_LEAD: f32 = 0.55;
    pub const FEVER_ZOOM: f32 = 1.15;

    /// Upgrade modifiers
    pub const ENERGY_MASTER_DECAY_FACTOR: f32 = 0.8;
    pub const RECOVERY_BOOST_FACTOR: f32 = 1.3;
    pub const COIN_BOOSTER_MULTIPLIER: u64 = 2;
    pub const ITEM_LUCK_MULTIPLIER: f32 = 1.5;

    /// Economy
    pub const REVIVE_COST: u64 = 50;
    pub const MAX_REVIVES_PER_RUN: u32 = 1;
}

/// Sign of a horizontal offset as ±1, with `fallback` for zero
#[inline]
pub fn sign_or(dx: f32, fallback: f32) -> f32 {
    if dx > 0.0 {
        1.0
    } else if dx < 0.0 {
        -1.0
    } else {
        fallback
    }
}

/// Convert an HSL triple (h in degrees, s/l in percent) to linear-ish RGBA
pub fn hsl_to_rgba(h: f32, s: f32, l: f32, alpha: f32) -> [f32; 4] {
    let h = h.rem_euclid(360.0) / 360.0;
    let s = (s / 100.0).clamp(0.0, 1.0);
    let l = (l / 100.0).clamp(0.0, 1.0);

    if s == 0.0 {
        return [l, l, l, alpha];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    [
        channel(h + 1.0 / 3.0),
        channel(h),
        channel(h - 1.0 / 3.0),
        alpha,
    ]
}

/// Convert a packed 0xRRGGBB color to RGBA floats
#[inline]
pub fn hex_to_rgba(hex: u32, alpha: f32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
        alpha,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_or() {
        assert_eq!(sign_or(3.0, 1.0), 1.0);
        assert_eq!(sign_or(-0.5, 1.0), -1.0);
        assert_eq!(sign_or(0.0, -1.0), -1.0);
    }

    #[test]
    fn test_hex_to_rgba() {
        let c = hex_to_rgba(0xFF8000, 0.5);
        assert!((c[0] - 1.0).abs() < 1e-6);
        assert!((c[1] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c[2], 0.0);
        assert_eq!(c[3], 0.5);
    }

    #[test]
    fn test_hsl_grey_and_primary() {
        let grey = hsl_to_rgba(123.0, 0.0, 50.0, 1.0);
        assert_eq!(grey, [0.5, 0.5, 0.5, 1.0]);

        let red = hsl_to_rgba(0.0, 100.0, 50.0, 1.0);
        assert!((red[0] - 1.0).abs() < 1e-5);
        assert!(red[1].abs() < 1e-5);
        assert!(red[2].abs() < 1e-5);
    }
}
