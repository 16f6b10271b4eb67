//! Draw-command frame built from the game state
//!
//! `build_frame` is pure: it reads the state and produces commands in logical
//! screen coordinates (origin top-left, `viewport.width` units across). All
//! animation counters are advanced by the tick, never here.

use glam::Vec2;

use super::shapes;
use super::vertex::Vertex;
use crate::characters::{CharacterDescriptor, StairType};
use crate::consts::*;
use crate::sim::{GamePhase, GameState, Viewport};
use crate::{hex_to_rgba, hsl_to_rgba};

/// One drawing instruction
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Axis-aligned rectangle from its top-left corner
    Rect { pos: Vec2, size: Vec2, color: [f32; 4] },
    Circle { center: Vec2, radius: f32, color: [f32; 4] },
    Ring {
        center: Vec2,
        inner: f32,
        outer: f32,
        color: [f32; 4],
    },
    /// Emoji glyph (items, monsters); drawn by the host overlay
    Glyph {
        glyph: char,
        center: Vec2,
        size: f32,
        alpha: f32,
    },
    /// Label (floating texts, announcements); drawn by the host overlay
    Text {
        text: String,
        center: Vec2,
        size: f32,
        color: [f32; 4],
    },
}

impl DrawCmd {
    /// Commands the GPU path can't draw
    pub fn is_overlay(&self) -> bool {
        matches!(self, DrawCmd::Glyph { .. } | DrawCmd::Text { .. })
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub clear_color: [f32; 4],
    pub viewport: Viewport,
    pub commands: Vec<DrawCmd>,
}

impl Frame {
    /// Triangles for the geometric commands, in logical screen coordinates
    pub fn tessellate(&self) -> Vec<Vertex> {
        shapes::tessellate(&self.commands)
    }

    pub fn overlay(&self) -> impl Iterator<Item = &DrawCmd> {
        self.commands.iter().filter(|c| c.is_overlay())
    }

    fn rect(&mut self, pos: Vec2, size: Vec2, color: [f32; 4]) {
        self.commands.push(DrawCmd::Rect { pos, size, color });
    }

    fn circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        self.commands.push(DrawCmd::Circle {
            center,
            radius,
            color,
        });
    }
}

/// World to screen mapping for one frame (camera, zoom, shake)
#[derive(Debug, Clone, Copy)]
struct View {
    camera_y: f32,
    zoom: f32,
    half: Vec2,
    shake: Vec2,
}

impl View {
    fn new(state: &GameState) -> Self {
        let vp = state.viewport;
        let amount = state.effects.screen_shake;
        // Deterministic jitter so rendering stays a pure function of state
        let t = state.time_ticks as f32;
        let shake = if amount > 0.0 {
            Vec2::new((t * 12.9898).sin(), (t * 78.233).cos()) * amount
        } else {
            Vec2::ZERO
        };
        Self {
            camera_y: state.camera.y,
            zoom: state.camera.zoom,
            half: Vec2::new(vp.width, vp.height) / 2.0,
            shake,
        }
    }

    fn to_screen(&self, world: Vec2) -> Vec2 {
        let local = Vec2::new(world.x, world.y - self.camera_y);
        (local - self.half) * self.zoom + self.half + self.shake
    }

    fn scale(&self, len: f32) -> f32 {
        len * self.zoom
    }
}

fn with_alpha(mut color: [f32; 4], alpha: f32) -> [f32; 4] {
    color[3] = alpha.clamp(0.0, 1.0);
    color
}

/// Build the draw commands for the current state
pub fn build_frame(state: &GameState, character: &CharacterDescriptor) -> Frame {
    let vp = state.viewport;
    let theme = &state.theme;
    let mut frame = Frame {
        clear_color: hsl_to_rgba(state.effects.bg_hue, theme.bg.s, theme.bg.l, 1.0),
        viewport: vp,
        commands: Vec::new(),
    };
    let view = View::new(state);

    draw_backdrop(&mut frame, state);
    draw_stairs(&mut frame, state, &view);
    draw_player(&mut frame, state, character, &view);
    draw_particles(&mut frame, state, &view);
    draw_screen_effects(&mut frame, state);
    frame
}

fn draw_backdrop(frame: &mut Frame, state: &GameState) {
    let vp = state.viewport;
    let fx = &state.effects;

    for star in &fx.stars {
        // Slow parallax against the camera
        let y = (star.pos.y - state.camera.y * 0.1).rem_euclid(vp.height);
        let alpha = 0.3 + 0.7 * (star.twinkle.sin() * 0.5 + 0.5);
        frame.circle(Vec2::new(star.pos.x, y), star.size, [1.0, 1.0, 1.0, alpha]);
    }

    for p in &fx.weather {
        let color = hex_to_rgba(p.color, 0.7);
        if p.length > 0.0 {
            frame.rect(
                Vec2::new(p.pos.x - p.size / 2.0, p.pos.y - p.length),
                Vec2::new(p.size, p.length),
                color,
            );
        } else {
            frame.circle(p.pos, p.size, color);
        }
    }
}

fn draw_stairs(frame: &mut Frame, state: &GameState, view: &View) {
    let theme = &state.theme;
    let vp = state.viewport;
    let index = state.player.stair_index;
    let first = index.saturating_sub(40);
    let last = (index + 60).min(state.stairs.len());

    let alpha = match theme.stair_type {
        StairType::Glass => 0.55,
        StairType::TransparentWithFlag => 0.3,
        StairType::Default | StairType::Neon => 1.0,
    };

    let visible = |y: f32| y > -60.0 && y < vp.height + 60.0;

    for (i, stair) in state.stairs[first..last].iter().enumerate() {
        let i = first + i;
        let top = view.to_screen(stair.pos);
        if !visible(top.y) {
            continue;
        }

        let hex = if stair.visited {
            theme.stair_visited
        } else if i == index + 1 {
            theme.stair_next
        } else {
            theme.stair
        };
        let width = view.scale(stair.width);
        let height = view.scale(STAIR_HEIGHT);
        let pos = Vec2::new(top.x - width / 2.0, top.y);

        if theme.stair_type.is_bright() {
            let glow = view.scale(3.0);
            frame.rect(
                pos - Vec2::splat(glow),
                Vec2::new(width, height) + Vec2::splat(glow * 2.0),
                hex_to_rgba(hex, 0.3),
            );
        }
        frame.rect(pos, Vec2::new(width, height), hex_to_rgba(hex, alpha));
        if theme.stair_type == StairType::TransparentWithFlag {
            let pole = Vec2::new(top.x - view.scale(1.0), top.y - view.scale(18.0));
            frame.rect(pole, Vec2::new(view.scale(2.0), view.scale(18.0)), [0.9, 0.9, 0.9, 1.0]);
            frame.rect(
                pole + Vec2::new(view.scale(2.0), 0.0),
                Vec2::new(view.scale(10.0), view.scale(7.0)),
                hex_to_rgba(0xE53E3E, 1.0),
            );
        }

        if let Some(item) = &stair.item {
            frame.commands.push(DrawCmd::Glyph {
                glyph: item.glyph,
                center: top - Vec2::new(0.0, view.scale(20.0)),
                size: view.scale(22.0),
                alpha: 1.0,
            });
        }

        let mut branch = stair.branch.as_ref();
        while let Some(b) = branch {
            let btop = view.to_screen(b.pos);
            let bwidth = view.scale(b.width);
            frame.rect(
                Vec2::new(btop.x - bwidth / 2.0, btop.y),
                Vec2::new(bwidth, height),
                hex_to_rgba(theme.stair, alpha),
            );
            if let Some(monster) = b.monster {
                frame.commands.push(DrawCmd::Glyph {
                    glyph: monster.glyph(),
                    center: btop - Vec2::new(0.0, view.scale(22.0)),
                    size: view.scale(28.0),
                    alpha: 1.0,
                });
            }
            branch = b.next.as_deref();
        }
    }
}

fn draw_player(frame: &mut Frame, state: &GameState, character: &CharacterDescriptor, view: &View) {
    let colors = &character.colors;
    let center = view.to_screen(state.player.pos);
    let s = |v: f32| view.scale(v);
    let facing = state.player.facing.sign();

    // Feet
    for side in [-1.0, 1.0] {
        frame.rect(
            center + Vec2::new(side * s(6.0) - s(3.0), s(11.0)),
            Vec2::new(s(6.0), s(5.0)),
            hex_to_rgba(colors.feet, 1.0),
        );
    }
    // Body with a darker belly stripe
    frame.rect(
        center + Vec2::new(-s(10.0), -s(8.0)),
        Vec2::new(s(20.0), s(20.0)),
        hex_to_rgba(colors.body, 1.0),
    );
    frame.rect(
        center + Vec2::new(-s(10.0), s(6.0)),
        Vec2::new(s(20.0), s(6.0)),
        hex_to_rgba(colors.body_dark, 1.0),
    );
    // Head
    let head = center - Vec2::new(0.0, s(17.0));
    frame.circle(head, s(11.0), hex_to_rgba(colors.head_outline, 1.0));
    frame.circle(head, s(10.0), hex_to_rgba(colors.head, 1.0));
    if let Some(hat) = colors.hat {
        frame.rect(
            head - Vec2::new(s(10.0), s(12.0)),
            Vec2::new(s(20.0), s(5.0)),
            hex_to_rgba(hat, 1.0),
        );
    }
    // Eyes look the way the player faces
    for offset in [-3.5, 3.5] {
        let eye = head + Vec2::new(s(offset + facing * 2.0), -s(1.0));
        frame.circle(eye, s(2.6), hex_to_rgba(colors.eye_white, 1.0));
        frame.circle(eye + Vec2::new(facing * s(0.8), 0.0), s(1.4), hex_to_rgba(colors.eye, 1.0));
    }

    if state.powerups.shield {
        frame.commands.push(DrawCmd::Ring {
            center: center - Vec2::new(0.0, s(6.0)),
            inner: s(24.0),
            outer: s(27.0),
            color: hex_to_rgba(0x44BBFF, 0.6),
        });
    }
    if state.powerups.rocket_active() {
        frame.commands.push(DrawCmd::Glyph {
            glyph: '🚀',
            center: center + Vec2::new(0.0, s(26.0)),
            size: s(20.0),
            alpha: 1.0,
        });
    }
}

fn draw_particles(frame: &mut Frame, state: &GameState, view: &View) {
    let fx = &state.effects;

    for p in &fx.particles {
        let alpha = if p.max_life > 0.0 {
            p.life / p.max_life
        } else {
            0.0
        };
        frame.circle(
            view.to_screen(p.pos),
            view.scale(p.size),
            with_alpha(p.color, p.color[3] * alpha),
        );
    }

    for text in &fx.floating_texts {
        let alpha = text.life as f32 / text.max_life.max(1) as f32;
        frame.commands.push(DrawCmd::Text {
            text: text.text.clone(),
            center: view.to_screen(text.pos),
            size: view.scale(16.0 * text.scale),
            color: hex_to_rgba(text.color, alpha),
        });
    }
}

/// Screen-space layers: fire, tints, coins, energy bar, banners
fn draw_screen_effects(frame: &mut Frame, state: &GameState) {
    let vp = state.viewport;
    let fx = &state.effects;
    let full = Vec2::new(vp.width, vp.height);

    for p in &fx.fire {
        let alpha = (p.life / p.max_life).clamp(0.0, 1.0) * 0.8;
        frame.circle(p.pos, p.size, hsl_to_rgba(p.hue, 100.0, 55.0, alpha));
    }

    if fx.overlay_alpha > 0.0 {
        frame.rect(Vec2::ZERO, full, [1.0, 0.3, 0.1, fx.overlay_alpha]);
    }
    if fx.milestone_flash > 0 {
        let alpha = fx.milestone_flash as f32 / 60.0 * 0.3;
        frame.rect(Vec2::ZERO, full, [1.0, 1.0, 1.0, alpha]);
    }

    let gold = hex_to_rgba(0xFFD700, 1.0);
    for coin in state.magnet_coins.iter().filter(|c| c.delay <= 0.0) {
        frame.circle(coin.pos, 6.0, gold);
        frame.circle(coin.pos, 3.5, hex_to_rgba(0xFFF3A0, 1.0));
    }
    let (hud_x, hud_y) = HUD_COIN_ANCHOR;
    frame.circle(Vec2::new(hud_x, hud_y), 8.0 * fx.hud_coin_scale, gold);

    if state.phase != GamePhase::Ready {
        let bar = Vec2::new(vp.width - 40.0, 8.0);
        let origin = Vec2::new(20.0, 58.0);
        let ratio = (state.energy / MAX_ENERGY).clamp(0.0, 1.0);
        frame.rect(origin, bar, [0.0, 0.0, 0.0, 0.4]);
        frame.rect(
            origin,
            Vec2::new(bar.x * ratio, bar.y),
            hsl_to_rgba(ratio * 120.0, 80.0, 50.0, 1.0),
        );
    }

    if let Some(announcement) = &fx.announcement {
        let alpha = (announcement.timer as f32 / 20.0).min(1.0);
        frame.commands.push(DrawCmd::Text {
            text: announcement.text.clone(),
            center: Vec2::new(vp.width / 2.0, vp.height * 0.3),
            size: 28.0,
            color: hex_to_rgba(announcement.color, alpha),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characters::Theme;
    use crate::sim::{ItemKind, StartOptions};

    fn playing() -> GameState {
        let mut state = GameState::new(5, Viewport::default(), Theme::default());
        state.begin_run(5, StartOptions::default());
        state
    }

    fn glyphs(frame: &Frame) -> Vec<char> {
        frame
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Glyph { glyph, .. } => Some(*glyph),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frame_is_pure() {
        let state = playing();
        let character = CharacterDescriptor::default();
        assert_eq!(build_frame(&state, &character), build_frame(&state, &character));
    }

    #[test]
    fn test_current_stair_is_on_screen() {
        let state = playing();
        let view = View::new(&state);
        let top = view.to_screen(state.current_stair().pos);
        assert!(top.x > 0.0 && top.x < state.viewport.width);
        assert!(top.y > 0.0 && top.y < state.viewport.height);
    }

    #[test]
    fn test_items_and_shield_drawn() {
        let mut state = playing();
        state.stairs[2].item = Some(ItemKind::Rocket.descriptor());
        state.powerups.shield = true;

        let frame = build_frame(&state, &CharacterDescriptor::default());
        assert!(glyphs(&frame).contains(&'🚀'));
        assert!(frame.commands.iter().any(|c| matches!(c, DrawCmd::Ring { .. })));
    }

    #[test]
    fn test_fever_tint_layer() {
        let mut state = playing();
        let base = build_frame(&state, &CharacterDescriptor::default()).commands.len();
        state.effects.overlay_alpha = 0.2;
        let tinted = build_frame(&state, &CharacterDescriptor::default());
        assert_eq!(tinted.commands.len(), base + 1);
    }

    #[test]
    fn test_overlay_split() {
        let mut state = playing();
        state.effects.announce("TEST", 0xFFFFFF, 30);
        let frame = build_frame(&state, &CharacterDescriptor::default());
        assert!(frame.overlay().any(|c| matches!(c, DrawCmd::Text { text, .. } if text == "TEST")));
        assert!(!frame.tessellate().is_empty());
    }
}
