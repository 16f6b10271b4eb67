//! Game state and core simulation types
//!
//! Everything the tick and the step resolver mutate lives here. Visual-only
//! bookkeeping is kept apart in [`super::effects::Effects`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::difficulty::EnergyModel;
use super::effects::Effects;
use super::stairs::StairGenerator;
use crate::characters::Theme;
use crate::consts::*;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Engine created, no run started yet
    Ready,
    /// Active gameplay
    Playing,
    /// Wrong step: ballistic fall toward game over
    Falling,
    /// Run ended (revivable)
    GameOver,
}

/// Horizontal direction along the staircase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// -1.0 for left, 1.0 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Direction of a horizontal offset; `fallback` when the offset is zero
    pub fn from_offset(dx: f32, fallback: Direction) -> Self {
        if dx > 0.0 {
            Direction::Right
        } else if dx < 0.0 {
            Direction::Left
        } else {
            fallback
        }
    }
}

/// The closed set of item kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Coin,
    Shield,
    Fever,
    Rocket,
}

/// Immutable item template; stairs carry a copy until it is picked up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub kind: ItemKind,
    /// Visual label
    pub glyph: char,
    /// Packed 0xRRGGBB
    pub color: u32,
    /// Relative spawn weight
    pub chance: f32,
}

/// Item spawn table (weights are normalized at draw time)
pub const ITEM_TABLE: [ItemDescriptor; 4] = [
    ItemDescriptor {
        kind: ItemKind::Coin,
        glyph: '💰',
        color: 0xFFD700,
        chance: 0.12,
    },
    ItemDescriptor {
        kind: ItemKind::Shield,
        glyph: '🛡',
        color: 0x44BBFF,
        chance: 0.04,
    },
    ItemDescriptor {
        kind: ItemKind::Fever,
        glyph: '🔥',
        color: 0xFF4444,
        chance: 0.03,
    },
    ItemDescriptor {
        kind: ItemKind::Rocket,
        glyph: '🚀',
        color: 0xFF8800,
        chance: 0.02,
    },
];

impl ItemKind {
    pub fn descriptor(self) -> ItemDescriptor {
        match self {
            ItemKind::Coin => ITEM_TABLE[0],
            ItemKind::Shield => ITEM_TABLE[1],
            ItemKind::Fever => ITEM_TABLE[2],
            ItemKind::Rocket => ITEM_TABLE[3],
        }
    }
}

/// Monster flavors waiting at the end of a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterKind {
    Invader,
    Ogre,
    Ghost,
    Skull,
}

impl MonsterKind {
    pub const ALL: [MonsterKind; 4] = [
        MonsterKind::Invader,
        MonsterKind::Ogre,
        MonsterKind::Ghost,
        MonsterKind::Skull,
    ];

    pub fn glyph(self) -> char {
        match self {
            MonsterKind::Invader => '👾',
            MonsterKind::Ogre => '👹',
            MonsterKind::Ghost => '👻',
            MonsterKind::Skull => '💀',
        }
    }
}

/// A stair off the main path, reachable only by stepping the "wrong" way
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchStair {
    pub pos: Vec2,
    pub direction: Direction,
    pub width: f32,
    /// Set on the stair that holds the monster
    pub monster: Option<MonsterKind>,
    /// Second stair of a two-step lure
    pub next: Option<Box<BranchStair>>,
}

impl BranchStair {
    #[inline]
    pub fn is_monster(&self) -> bool {
        self.monster.is_some()
    }

    /// A lure stair that leads one more step to the monster
    #[inline]
    pub fn is_two_step(&self) -> bool {
        self.next.is_some()
    }
}

/// One stair of the main path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stair {
    /// Center of the stair's top edge (world units, y grows downward)
    pub pos: Vec2,
    /// Sign of the horizontal offset from the previous stair
    pub direction: Direction,
    pub width: f32,
    pub visited: bool,
    pub item: Option<ItemDescriptor>,
    pub branch: Option<BranchStair>,
}

impl Stair {
    /// Where the player's anchor sits when resting on this stair
    #[inline]
    pub fn standing_point(&self) -> Vec2 {
        standing_point(self.pos)
    }
}

/// Player anchor for a stair top at `pos`
#[inline]
pub fn standing_point(pos: Vec2) -> Vec2 {
    Vec2::new(pos.x, pos.y - PLAYER_FOOT_OFFSET)
}

/// A buffered input received while an animation was in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Step,
    Direction,
}

/// Bounded FIFO of pending intents; overflow is dropped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputQueue {
    items: std::collections::VecDeque<Intent>,
}

impl InputQueue {
    /// Enqueue an intent; returns false when the queue is full and it was dropped
    pub fn push(&mut self, intent: Intent) -> bool {
        if self.items.len() >= INPUT_QUEUE_CAPACITY {
            return false;
        }
        self.items.push_back(intent);
        true
    }

    pub fn pop(&mut self) -> Option<Intent> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Player motion sub-state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Resting on a stair
    Idle,
    /// Hopping toward a stair
    Moving {
        from: Vec2,
        to: Vec2,
        progress: f32,
        /// Arrival means a monster encounter
        toward_monster: bool,
    },
    /// Shield save: leap into the void, then get pulled back
    ShieldRecovery { from: Vec2, to: Vec2, progress: f32 },
    /// Standing on a monster stair, waiting for the delayed game over
    MonsterImpact,
}

/// The climbing character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Authoritative progress marker on the main path
    pub stair_index: usize,
    /// Interpolated position
    pub pos: Vec2,
    pub facing: Direction,
    pub motion: Motion,
    pub queue: InputQueue,
    /// Input cadence momentum (0-1)
    pub momentum: f32,
    /// Move progress gained per tick
    pub move_speed: f32,
    /// Timestamp of the previous accepted step request
    pub last_input_ms: Option<f64>,
    /// Two-step lure the player is standing on
    pub armed_branch: Option<BranchStair>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            stair_index: 0,
            pos: Vec2::ZERO,
            facing: Direction::Right,
            motion: Motion::Idle,
            queue: InputQueue::default(),
            momentum: 0.0,
            move_speed: BASE_MOVE_SPEED,
            last_input_ms: None,
            armed_branch: None,
        }
    }
}

impl Player {
    /// An animation is in flight and new intents must be buffered
    pub fn is_moving(&self) -> bool {
        matches!(
            self.motion,
            Motion::Moving { .. } | Motion::ShieldRecovery { .. }
        )
    }

    /// Progress of the current animation (0 when idle)
    pub fn move_progress(&self) -> f32 {
        match self.motion {
            Motion::Moving { progress, .. } | Motion::ShieldRecovery { progress, .. } => progress,
            Motion::Idle | Motion::MonsterImpact => 0.0,
        }
    }

    /// Recompute move speed from momentum with an ease-in curve
    pub fn apply_momentum(&mut self) {
        let eased = self.momentum * self.momentum;
        self.move_speed = BASE_MOVE_SPEED + (MAX_MOVE_SPEED - BASE_MOVE_SPEED) * eased;
    }
}

/// Ballistic fall after a wrong step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallState {
    pub velocity: Vec2,
    pub start_y: f32,
}

/// Transient power-up state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUps {
    /// Single shield charge
    pub shield: bool,
    pub fever_ticks: u32,
    pub rocket_steps: u32,
}

impl PowerUps {
    #[inline]
    pub fn fever_active(&self) -> bool {
        self.fever_ticks > 0
    }

    #[inline]
    pub fn rocket_active(&self) -> bool {
        self.rocket_steps > 0
    }

    /// Modes that auto-face the expected direction
    #[inline]
    pub fn auto_facing(&self) -> bool {
        self.fever_active() || self.rocket_active()
    }
}

/// Magnet coin sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinPhase {
    Exploding,
    Magnetizing,
}

/// A coin flying from the player to the HUD counter (screen space)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagnetCoin {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Ticks since the coin became active
    pub life: u32,
    pub phase: CoinPhase,
    /// Ticks left before the coin starts moving
    pub delay: f32,
}

/// Vertical camera with zoom
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Camera {
    /// World y of the top of the viewport
    pub y: f32,
    pub target_y: f32,
    pub zoom: f32,
    pub target_zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            y: 0.0,
            target_y: 0.0,
            zoom: 1.0,
            target_zoom: 1.0,
        }
    }
}

/// Logical viewport (width is fixed, height follows the aspect ratio)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Physical pixels per logical unit
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: BASE_WIDTH,
            height: BASE_HEIGHT,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Fit the fixed logical width into a physical canvas
    pub fn fit(physical_width: f32, physical_height: f32) -> Self {
        let scale = if physical_width > 0.0 {
            physical_width / BASE_WIDTH
        } else {
            1.0
        };
        let height = if physical_height > 0.0 {
            physical_height / scale
        } else {
            BASE_HEIGHT
        };
        Self {
            width: BASE_WIDTH,
            height,
            scale,
        }
    }
}

/// Notable things that happened during a tick or input call
///
/// The engine drains these to drive audio and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RunStarted,
    Stepped { floor: u64 },
    DirectionChanged,
    ItemPicked(ItemKind),
    ShieldSaved,
    FallStarted,
    MonsterHit,
    ScoreMilestone { score: u64 },
    ComboMilestone { combo: u32 },
    CoinBurst { count: u32 },
    CoinCollected,
    /// Entered game over on this tick
    RunEnded,
    /// The presentation delay after game over elapsed
    GameOverNoticeDue,
    Revived,
}

/// Deferred action owned by the simulation clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelayedAction {
    /// End the run after standing on a monster
    MonsterImpact,
    /// Tell the host the run is over
    GameOverNotice,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Scheduled {
    due_tick: u64,
    action: DelayedAction,
}

/// Tick-based delayed actions (deterministic, no wall-clock timers)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    pending: Vec<Scheduled>,
}

impl Scheduler {
    pub fn schedule(&mut self, now_tick: u64, delay_ticks: u64, action: DelayedAction) {
        self.pending.push(Scheduled {
            due_tick: now_tick + delay_ticks,
            action,
        });
    }

    /// Remove and return every action due at or before `now_tick`, in schedule order
    pub fn take_due(&mut self, now_tick: u64) -> Vec<DelayedAction> {
        let mut due = Vec::new();
        self.pending.retain(|s| {
            if s.due_tick <= now_tick {
                due.push(s.action);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn is_pending(&self, action: DelayedAction) -> bool {
        self.pending.iter().any(|s| s.action == action)
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Persistent-upgrade and consumable modifiers for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartOptions {
    /// Energy decays 20% slower
    pub energy_master: bool,
    /// Energy recovery per step is 30% higher
    pub recovery_boost: bool,
    /// Earned coins are doubled
    pub coin_booster: bool,
    /// Items spawn 50% more often
    pub item_luck: bool,
    /// Begin with a shield charge
    pub start_shield: bool,
    /// Begin with a short fever
    pub fever_start: bool,
}

/// Complete run state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Main path (never shrinks during a run)
    pub stairs: Vec<Stair>,
    pub generator: StairGenerator,
    pub player: Player,
    pub score: u64,
    /// Best score known to this session (persisted by the engine)
    pub high_score: u64,
    pub energy: f32,
    pub energy_model: EnergyModel,
    pub combo: u32,
    pub combo_timer: u32,
    pub powerups: PowerUps,
    pub magnet_coins: Vec<MagnetCoin>,
    /// Coins collected this run
    pub session_coins: u64,
    pub coin_multiplier: u64,
    pub fall: Option<FallState>,
    pub camera: Camera,
    pub viewport: Viewport,
    pub theme: Theme,
    /// Character body color (death debris)
    pub body_color: u32,
    /// Test mode: always face the expected direction
    pub auto_direction: bool,
    pub revives_used: u32,
    pub scheduler: Scheduler,
    /// Visual-only state
    pub effects: Effects,
    /// Events since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle state with an initial staircase already generated
    pub fn new(seed: u64, viewport: Viewport, theme: Theme) -> Self {
        let mut state = Self {
            seed,
            phase: GamePhase::Ready,
            time_ticks: 0,
            stairs: Vec::new(),
            generator: StairGenerator::new(seed, viewport.width),
            player: Player::default(),
            score: 0,
            high_score: 0,
            energy: MAX_ENERGY,
            energy_model: EnergyModel::default(),
            combo: 0,
            combo_timer: 0,
            powerups: PowerUps::default(),
            magnet_coins: Vec::new(),
            session_coins: 0,
            coin_multiplier: 1,
            fall: None,
            camera: Camera::default(),
            viewport,
            effects: Effects::new(seed, viewport, &theme),
            theme,
            body_color: 0x4A90D9,
            auto_direction: false,
            revives_used: 0,
            scheduler: Scheduler::default(),
            events: Vec::new(),
        };
        state.regenerate_path();
        state
    }

    /// Throw away the path and build a fresh initial staircase
    pub fn regenerate_path(&mut self) {
        let origin = Vec2::new(
            self.viewport.width / 2.0,
            self.viewport.height - FIRST_STAIR_BOTTOM_OFFSET,
        );
        self.stairs = self.generator.initial(origin, INITIAL_STAIR_COUNT);
        self.position_player_on_stair(0);
    }

    /// Snap the player onto a main-path stair
    pub fn position_player_on_stair(&mut self, index: usize) {
        self.ensure_stairs(index);
        self.player.pos = self.stairs[index].standing_point();
        self.player.stair_index = index;
    }

    /// Make sure `index` is a generated stair
    pub fn ensure_stairs(&mut self, index: usize) {
        let suppress_items = self.powerups.auto_facing();
        while self.stairs.len() <= index {
            self.generator
                .extend(&mut self.stairs, STAIR_BATCH_SIZE, suppress_items);
        }
    }

    /// Direction the main path takes out of `index`
    pub fn expected_direction(&self, index: usize) -> Direction {
        let current = &self.stairs[index];
        let next = &self.stairs[index + 1];
        Direction::from_offset(next.pos.x - current.pos.x, self.player.facing)
    }

    #[inline]
    pub fn current_stair(&self) -> &Stair {
        &self.stairs[self.player.stair_index]
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_helpers() {
        assert_eq!(Direction::Left.sign(), -1.0);
        assert_eq!(Direction::Left.flipped(), Direction::Right);
        assert_eq!(Direction::from_offset(2.0, Direction::Left), Direction::Right);
        assert_eq!(Direction::from_offset(0.0, Direction::Left), Direction::Left);
    }

    #[test]
    fn test_input_queue_drops_overflow() {
        let mut queue = InputQueue::default();
        assert!(queue.push(Intent::Step));
        assert!(queue.push(Intent::Direction));
        assert!(queue.push(Intent::Step));
        assert!(!queue.push(Intent::Step));
        assert_eq!(queue.len(), INPUT_QUEUE_CAPACITY);
        assert_eq!(queue.pop(), Some(Intent::Step));
        assert_eq!(queue.pop(), Some(Intent::Direction));
    }

    #[test]
    fn test_scheduler_fires_once_in_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule(10, 5, DelayedAction::GameOverNotice);
        scheduler.schedule(10, 2, DelayedAction::MonsterImpact);

        assert!(scheduler.take_due(11).is_empty());
        assert_eq!(scheduler.take_due(12), vec![DelayedAction::MonsterImpact]);
        assert!(scheduler.is_pending(DelayedAction::GameOverNotice));
        assert_eq!(scheduler.take_due(20), vec![DelayedAction::GameOverNotice]);
        assert!(scheduler.take_due(30).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_start_options_camel_case() {
        let json = r#"{ "energyMaster": true, "feverStart": true }"#;
        let options: StartOptions = serde_json::from_str(json).unwrap();
        assert!(options.energy_master);
        assert!(options.fever_start);
        assert!(!options.coin_booster);
    }

    #[test]
    fn test_viewport_fit_keeps_logical_width() {
        let vp = Viewport::fit(720.0, 1280.0);
        assert_eq!(vp.width, BASE_WIDTH);
        assert!((vp.scale - 2.0).abs() < 1e-6);
        assert!((vp.height - 640.0).abs() < 1e-3);
    }

    #[test]
    fn test_new_state_stands_on_first_stair() {
        let state = GameState::new(7, Viewport::default(), Theme::default());
        assert_eq!(state.phase, GamePhase::Ready);
        assert_eq!(state.player.stair_index, 0);
        assert_eq!(state.player.pos, state.stairs[0].standing_point());
        assert!(state.stairs[0].visited);
        assert_eq!(state.stairs.len(), INITIAL_STAIR_COUNT);
    }
}
