//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (cosmetics run on their own stream)
//! - Delays counted in ticks, never wall-clock timers
//! - No rendering, audio or storage dependencies

pub mod difficulty;
pub mod effects;
pub mod items;
pub mod motion;
pub mod run;
pub mod stairs;
pub mod state;
pub mod tick;

pub use difficulty::{EnergyModel, energy_decay_rate, energy_recover_amount};
pub use effects::Effects;
pub use items::coin_burst_size;
pub use motion::StepSource;
pub use stairs::{StairGenerator, monster_spawn_chance};
pub use state::{
    BranchStair, Camera, Direction, GameEvent, GamePhase, GameState, ITEM_TABLE, ItemDescriptor,
    ItemKind, MonsterKind, Motion, Player, Stair, StartOptions, Viewport,
};
pub use tick::tick;
