//! Procedural staircase generation
//!
//! The path zig-zags upward forever. Every stair keeps the previous direction
//! unless a coin flip, a pinned lure direction or the side margins say
//! otherwise. Items and monster branches are sprinkled on with independent
//! cooldowns.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{BranchStair, Direction, ITEM_TABLE, ItemDescriptor, ItemKind, MonsterKind, Stair};
use crate::consts::*;

/// Chance that the stair at `height` grows a monster branch
pub fn monster_spawn_chance(height: usize) -> f32 {
    let steps = (height / MONSTER_CHANCE_INTERVAL) as f32;
    (MONSTER_BASE_CHANCE + steps * MONSTER_CHANCE_STEP).min(MONSTER_MAX_CHANCE)
}

/// Seeded, stateful staircase generator
///
/// Cooldowns and the pinned lure direction survive across batches, so a
/// two-step branch generated at the end of one batch still constrains the
/// first stair of the next.
#[derive(Debug, Clone)]
pub struct StairGenerator {
    rng: Pcg32,
    /// Logical viewport width the path must fit in
    width: f32,
    item_cooldown: u32,
    monster_cooldown: u32,
    /// Direction the next stair must take to keep a lure symmetric
    pending_forced_direction: Option<Direction>,
    item_spawn_multiplier: f32,
}

impl StairGenerator {
    pub fn new(seed: u64, width: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            width,
            item_cooldown: 0,
            monster_cooldown: 0,
            pending_forced_direction: None,
            item_spawn_multiplier: 1.0,
        }
    }

    /// Restart the random stream (new run)
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
    }

    pub fn set_item_spawn_multiplier(&mut self, multiplier: f32) {
        self.item_spawn_multiplier = multiplier.max(0.0);
    }

    pub fn item_spawn_multiplier(&self) -> f32 {
        self.item_spawn_multiplier
    }

    pub fn pending_forced_direction(&self) -> Option<Direction> {
        self.pending_forced_direction
    }

    /// Build a fresh path of `count` stairs starting at `origin`
    ///
    /// Stair 0 is pre-visited and never carries an item or a branch.
    pub fn initial(&mut self, origin: Vec2, count: usize) -> Vec<Stair> {
        self.item_cooldown = 0;
        self.monster_cooldown = 0;
        self.pending_forced_direction = None;

        let mut stairs = Vec::with_capacity(count.max(1));
        stairs.push(Stair {
            pos: origin,
            direction: Direction::Right,
            width: STAIR_WIDTH,
            visited: true,
            item: None,
            branch: None,
        });
        self.extend(&mut stairs, count.saturating_sub(1), false);
        stairs
    }

    /// Append `count` stairs to a path that already holds at least one stair
    pub fn extend(&mut self, stairs: &mut Vec<Stair>, count: usize, suppress_items: bool) {
        for _ in 0..count {
            self.push_next(stairs, suppress_items);
        }
        log::debug!(
            "Generated {} stairs (total {}, items suppressed: {})",
            count,
            stairs.len(),
            suppress_items
        );
    }

    fn push_next(&mut self, stairs: &mut Vec<Stair>, suppress_items: bool) {
        // Paths are always seeded by `initial`
        let prev_index = stairs.len() - 1;
        let prev_pos = stairs[prev_index].pos;
        let prev_dir = stairs[prev_index].direction;

        let mut dir = self.next_direction(prev_dir);
        let mut x = prev_pos.x + dir.sign() * STAIR_RUN;
        if x < SAFE_MARGIN {
            dir = Direction::Right;
            x = prev_pos.x + STAIR_RUN;
        }
        if x > self.width - SAFE_MARGIN {
            dir = Direction::Left;
            x = prev_pos.x - STAIR_RUN;
        }
        let y = prev_pos.y - STAIR_RISE;
        let index = prev_index + 1;

        let item = if !suppress_items && index > ITEM_SAFE_ZONE {
            self.roll_item()
        } else {
            None
        };
        if self.item_cooldown > 0 {
            self.item_cooldown -= 1;
        }

        // The branch hangs off the previous stair and mirrors this step
        if prev_index > MONSTER_SAFE_ZONE {
            self.maybe_branch(&mut stairs[prev_index], dir, y, index);
        }
        if self.monster_cooldown > 0 {
            self.monster_cooldown -= 1;
        }

        stairs.push(Stair {
            pos: Vec2::new(x, y),
            direction: dir,
            width: STAIR_WIDTH,
            visited: false,
            item,
            branch: None,
        });
    }

    fn next_direction(&mut self, prev: Direction) -> Direction {
        if let Some(forced) = self.pending_forced_direction.take() {
            forced
        } else if self.rng.random::<f32>() < DIRECTION_FLIP_CHANCE {
            prev.flipped()
        } else {
            prev
        }
    }

    /// Weighted draw over the item table
    fn roll_item(&mut self) -> Option<ItemDescriptor> {
        if self.item_cooldown > 0 {
            return None;
        }
        if self.rng.random::<f32>() >= ITEM_SPAWN_CHANCE * self.item_spawn_multiplier {
            return None;
        }

        let total: f32 = ITEM_TABLE.iter().map(|t| t.chance).sum();
        let roll = self.rng.random::<f32>() * total;
        let mut cumulative = 0.0;
        let picked = ITEM_TABLE
            .iter()
            .find(|t| {
                cumulative += t.chance;
                roll < cumulative
            })
            .or(ITEM_TABLE.last())
            .copied()?;

        self.item_cooldown = if picked.kind == ItemKind::Rocket {
            ROCKET_ITEM_COOLDOWN
        } else {
            ITEM_COOLDOWN
        };
        Some(picked)
    }

    fn maybe_branch(&mut self, prev: &mut Stair, main_dir: Direction, main_y: f32, height: usize) {
        if prev.item.is_some() || prev.branch.is_some() || self.monster_cooldown > 0 {
            return;
        }
        if self.rng.random::<f32>() >= monster_spawn_chance(height) {
            return;
        }

        let branch_dir = main_dir.flipped();
        let first_x = prev.pos.x + branch_dir.sign() * STAIR_RUN;
        let two_step = self.rng.random::<f32>() < TWO_STEP_BRANCH_CHANCE;

        if first_x <= BRANCH_MARGIN || first_x >= self.width - BRANCH_MARGIN {
            return;
        }

        if two_step {
            let tail_x = first_x + branch_dir.sign() * STAIR_RUN;
            if tail_x <= BRANCH_TAIL_MARGIN || tail_x >= self.width - BRANCH_TAIL_MARGIN {
                return;
            }
            let tail = BranchStair {
                pos: Vec2::new(tail_x, main_y - STAIR_RISE),
                direction: branch_dir,
                width: STAIR_WIDTH,
                monster: Some(self.roll_monster()),
                next: None,
            };
            prev.branch = Some(BranchStair {
                pos: Vec2::new(first_x, main_y),
                direction: branch_dir,
                width: STAIR_WIDTH,
                monster: None,
                next: Some(Box::new(tail)),
            });
            self.monster_cooldown = TWO_STEP_MONSTER_COOLDOWN;
            // Keep the real path going straight so both routes look alike
            self.pending_forced_direction = Some(main_dir);
        } else {
            prev.branch = Some(BranchStair {
                pos: Vec2::new(first_x, main_y),
                direction: branch_dir,
                width: STAIR_WIDTH,
                monster: Some(self.roll_monster()),
                next: None,
            });
            self.monster_cooldown = ONE_STEP_MONSTER_COOLDOWN;
        }
    }

    fn roll_monster(&mut self) -> MonsterKind {
        MonsterKind::ALL[self.rng.random_range(0..MonsterKind::ALL.len())]
    }
}
