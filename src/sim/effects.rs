//! Visual-only bookkeeping
//!
//! Particles, floating texts, screen shake and friends. Nothing in here feeds
//! back into gameplay, so it runs on its own RNG stream and the run stays
//! reproducible from the seed regardless of how many particles spawned.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::Viewport;
use crate::characters::{BackgroundType, Theme, WeatherKind};
use crate::{hex_to_rgba, hsl_to_rgba};

/// Maximum particles (default quality)
pub const MAX_PARTICLES: usize = 256;
/// Weather particles alive at once
pub const MAX_WEATHER: usize = 40;
/// Background stars
pub const STAR_COUNT: usize = 50;
/// Floating text lifetime in ticks
pub const FLOATING_TEXT_TICKS: u32 = 80;
/// Announcement lifetimes
pub const COMBO_ANNOUNCE_TICKS: u32 = 90;
pub const MILESTONE_ANNOUNCE_TICKS: u32 = 120;
pub const MILESTONE_FLASH_TICKS: u32 = 60;

/// Gold used by most celebratory texts
pub const GOLD: u32 = 0xFFD700;

/// World-space spark
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: [f32; 4],
    /// Ticks left
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
}

/// Screen-space flame licking up from the bottom edge
#[derive(Debug, Clone)]
pub struct FireParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    /// 0 = red, 40 = yellow
    pub hue: f32,
}

/// Screen-space ambient particle
#[derive(Debug, Clone)]
pub struct WeatherParticle {
    pub kind: WeatherKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub rotation: f32,
    pub spin: f32,
    /// Trail length (digits only)
    pub length: f32,
    pub color: u32,
}

/// Rising world-space label
#[derive(Debug, Clone)]
pub struct FloatingText {
    pub text: String,
    pub pos: Vec2,
    pub color: u32,
    pub scale: f32,
    pub life: u32,
    pub max_life: u32,
    pub vy: f32,
}

/// Centered banner
#[derive(Debug, Clone)]
pub struct Announcement {
    pub text: String,
    pub color: u32,
    pub timer: u32,
}

#[derive(Debug, Clone)]
pub struct Star {
    pub pos: Vec2,
    pub size: f32,
    pub twinkle: f32,
    pub speed: f32,
}

/// All cosmetic state
#[derive(Debug, Clone)]
pub struct Effects {
    rng: Pcg32,
    pub particles: Vec<Particle>,
    pub fire: Vec<FireParticle>,
    pub fire_intensity: f32,
    pub weather: Vec<WeatherParticle>,
    pub floating_texts: Vec<FloatingText>,
    pub announcement: Option<Announcement>,
    pub stars: Vec<Star>,
    pub screen_shake: f32,
    pub milestone_flash: u32,
    /// Fever tint strength (0-0.3)
    pub overlay_alpha: f32,
    pub bg_hue: f32,
    pub target_bg_hue: f32,
    /// HUD coin counter pulse (1 = rest)
    pub hud_coin_scale: f32,
    pub max_particles: usize,
    pub weather_enabled: bool,
    pub shake_enabled: bool,
}

impl Effects {
    pub fn new(seed: u64, viewport: Viewport, theme: &Theme) -> Self {
        let mut effects = Self {
            rng: Pcg32::seed_from_u64(seed ^ 0x5EED_F00D),
            particles: Vec::new(),
            fire: Vec::new(),
            fire_intensity: 0.0,
            weather: Vec::new(),
            floating_texts: Vec::new(),
            announcement: None,
            stars: Vec::new(),
            screen_shake: 0.0,
            milestone_flash: 0,
            overlay_alpha: 0.0,
            bg_hue: theme.bg.h,
            target_bg_hue: theme.bg.h,
            hud_coin_scale: 1.0,
            max_particles: MAX_PARTICLES,
            weather_enabled: true,
            shake_enabled: true,
        };
        effects.rebuild_stars(viewport);
        effects
    }

    /// Clear everything transient for a new run
    pub fn reset(&mut self, theme: &Theme) {
        self.particles.clear();
        self.fire.clear();
        self.fire_intensity = 0.0;
        self.floating_texts.clear();
        self.announcement = None;
        self.screen_shake = 0.0;
        self.milestone_flash = 0;
        self.overlay_alpha = 0.0;
        self.bg_hue = theme.bg.h;
        self.target_bg_hue = theme.bg.h;
        self.hud_coin_scale = 1.0;
    }

    /// Scatter stars over three screens of height and drop the weather
    pub fn rebuild_stars(&mut self, viewport: Viewport) {
        self.stars = (0..STAR_COUNT)
            .map(|_| Star {
                pos: Vec2::new(
                    self.rng.random::<f32>() * viewport.width,
                    self.rng.random::<f32>() * viewport.height * 3.0,
                ),
                size: self.rng.random::<f32>() * 2.0 + 0.5,
                twinkle: self.rng.random::<f32>() * std::f32::consts::TAU,
                speed: self.rng.random::<f32>() * 0.02 + 0.01,
            })
            .collect();
        self.weather.clear();
    }

    /// Uniform sample in [0, 1) from the cosmetic stream
    pub(crate) fn unit(&mut self) -> f32 {
        self.rng.random()
    }

    fn push_particle(&mut self, particle: Particle) {
        if self.max_particles == 0 {
            return;
        }
        if self.particles.len() >= self.max_particles {
            // Remove oldest to make room
            self.particles.remove(0);
        }
        self.particles.push(particle);
    }

    /// Warm sparks kicked up under the feet
    pub fn step_particles(&mut self, at: Vec2, count: usize) {
        for _ in 0..count {
            let rng = &mut self.rng;
            let particle = Particle {
                pos: Vec2::new(at.x + (rng.random::<f32>() - 0.5) * 20.0, at.y),
                vel: Vec2::new(
                    (rng.random::<f32>() - 0.5) * 4.0,
                    -rng.random::<f32>() * 3.0 - 1.0,
                ),
                color: hsl_to_rgba(40.0 + rng.random::<f32>() * 20.0, 70.0, 70.0, 1.0),
                life: 20.0 + rng.random::<f32>() * 15.0,
                max_life: 35.0,
                size: rng.random::<f32>() * 3.0 + 1.0,
            };
            self.push_particle(particle);
        }
    }

    /// Rainbow explosion for a score milestone
    pub fn milestone_burst(&mut self, center: Vec2) {
        for _ in 0..30 {
            let rng = &mut self.rng;
            let particle = Particle {
                pos: center,
                vel: Vec2::new(
                    (rng.random::<f32>() - 0.5) * 12.0,
                    (rng.random::<f32>() - 0.5) * 12.0,
                ),
                color: hsl_to_rgba(rng.random::<f32>() * 360.0, 80.0, 60.0, 1.0),
                life: 60.0 + rng.random::<f32>() * 40.0,
                max_life: 100.0,
                size: rng.random::<f32>() * 5.0 + 2.0,
            };
            self.push_particle(particle);
        }
    }

    /// Body-colored debris when the run ends
    pub fn death_particles(&mut self, at: Vec2, body_color: u32) {
        let color = hex_to_rgba(body_color, 1.0);
        for _ in 0..20 {
            let rng = &mut self.rng;
            let particle = Particle {
                pos: at,
                vel: Vec2::new(
                    (rng.random::<f32>() - 0.5) * 8.0,
                    (rng.random::<f32>() - 1.0) * 6.0,
                ),
                color,
                life: 40.0 + rng.random::<f32>() * 30.0,
                max_life: 70.0,
                size: rng.random::<f32>() * 4.0 + 2.0,
            };
            self.push_particle(particle);
        }
    }

    pub fn float_text(&mut self, text: impl Into<String>, at: Vec2, color: u32, scale: f32) {
        self.floating_texts.push(FloatingText {
            text: text.into(),
            pos: at,
            color,
            scale,
            life: FLOATING_TEXT_TICKS,
            max_life: FLOATING_TEXT_TICKS,
            vy: -1.5,
        });
    }

    /// Replace the current banner
    pub fn announce(&mut self, text: impl Into<String>, color: u32, ticks: u32) {
        self.announcement = Some(Announcement {
            text: text.into(),
            color,
            timer: ticks,
        });
    }

    /// Set the shake amplitude (suppressed when shake is disabled)
    pub fn shake(&mut self, amount: f32) {
        if self.shake_enabled {
            self.screen_shake = amount;
        }
    }

    /// Raise the shake amplitude to at least `amount`
    pub fn shake_at_least(&mut self, amount: f32) {
        if self.shake_enabled && self.screen_shake < amount {
            self.screen_shake = amount;
        }
    }

    pub fn flash_milestone(&mut self) {
        self.milestone_flash = MILESTONE_FLASH_TICKS;
    }

    pub fn pulse_hud_coin(&mut self, scale: f32) {
        self.hud_coin_scale = scale;
    }

    pub fn update_particles(&mut self) {
        for p in self.particles.iter_mut() {
            p.pos += p.vel;
            p.vel.y += 0.1;
            p.life -= 1.0;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn update_floating_texts(&mut self) {
        for text in self.floating_texts.iter_mut() {
            text.pos.y += text.vy;
            text.life = text.life.saturating_sub(1);
        }
        self.floating_texts.retain(|t| t.life > 0);
    }

    /// Fire while falling ramps up; after game over it only keeps burning
    /// if it was already lit.
    pub fn update_fire(&mut self, viewport: Viewport, falling: bool) {
        let spawn = if falling {
            self.fire_intensity = (self.fire_intensity + 0.03).min(1.0);
            (3.0 + self.fire_intensity * 5.0) as usize
        } else if !self.fire.is_empty() {
            4
        } else {
            0
        };

        for _ in 0..spawn {
            let rng = &mut self.rng;
            let rise = if falling {
                2.0 + rng.random::<f32>() * 4.0 + self.fire_intensity * 3.0
            } else {
                2.0 + rng.random::<f32>() * 5.0
            };
            self.fire.push(FireParticle {
                pos: Vec2::new(
                    rng.random::<f32>() * viewport.width,
                    viewport.height + rng.random::<f32>() * 20.0,
                ),
                vel: Vec2::new((rng.random::<f32>() - 0.5) * 2.0, -rise),
                life: 30.0 + rng.random::<f32>() * 30.0,
                max_life: 60.0,
                size: 8.0 + rng.random::<f32>() * 15.0,
                hue: rng.random::<f32>() * 40.0,
            });
        }

        for i in 0..self.fire.len() {
            let wobble = (self.rng.random::<f32>() - 0.5) * 0.5;
            let p = &mut self.fire[i];
            p.pos += p.vel;
            p.vel.x += wobble;
            p.size *= 0.97;
            p.life -= 1.0;
        }
        self.fire.retain(|p| p.life > 0.0 && p.size >= 1.0);
    }

    /// Spawn (every third tick) and advance the theme's weather
    pub fn update_weather(&mut self, viewport: Viewport, bg_type: BackgroundType, frame: u64) {
        let kind = if self.weather_enabled {
            bg_type.weather()
        } else {
            None
        };

        if let Some(kind) = kind
            && self.weather.len() < MAX_WEATHER
            && frame % 3 == 0
        {
            let particle = self.spawn_weather(kind, bg_type, viewport.width);
            self.weather.push(particle);
        }

        for p in self.weather.iter_mut() {
            p.pos += p.vel;
            p.rotation += p.spin;
        }
        let floor = viewport.height + 50.0;
        self.weather.retain(|p| p.pos.y <= floor);
    }

    fn spawn_weather(&mut self, kind: WeatherKind, bg_type: BackgroundType, width: f32) -> WeatherParticle {
        let rng = &mut self.rng;
        let pos = Vec2::new(rng.random::<f32>() * width, -20.0);
        let mut particle = WeatherParticle {
            kind,
            pos,
            vel: Vec2::ZERO,
            size: 1.0,
            rotation: 0.0,
            spin: 0.0,
            length: 0.0,
            color: 0xFFFFFF,
        };
        match kind {
            WeatherKind::Snow => {
                particle.vel = Vec2::new((rng.random::<f32>() - 0.5) * 1.5, rng.random::<f32>() * 3.0 + 2.0);
                particle.size = rng.random::<f32>() * 2.0 + 1.0;
            }
            WeatherKind::Leaf => {
                particle.vel = Vec2::new(rng.random::<f32>() + 1.0, rng.random::<f32>() * 1.5 + 1.5);
                particle.size = rng.random::<f32>() * 4.0 + 3.0;
                particle.rotation = rng.random::<f32>() * std::f32::consts::TAU;
                particle.spin = (rng.random::<f32>() - 0.5) * 0.1;
                particle.color = if bg_type == BackgroundType::Dojo {
                    0x4A7C44
                } else {
                    0xF6AD55
                };
            }
            WeatherKind::Digit => {
                particle.vel = Vec2::new(0.0, rng.random::<f32>() * 8.0 + 8.0);
                particle.size = rng.random::<f32>() + 1.0;
                particle.length = rng.random::<f32>() * 20.0 + 10.0;
                particle.color = 0x22D3EE;
            }
            WeatherKind::Dust => {
                particle.vel = Vec2::new((rng.random::<f32>() - 0.5) * 0.5, rng.random::<f32>() + 1.0);
                particle.size = rng.random::<f32>() * 2.0 + 2.0;
                particle.color = if bg_type == BackgroundType::Palace {
                    0xFAD02E
                } else {
                    0xA0A0B0
                };
            }
        }
        particle
    }

    /// Per-tick decay of timers, tints and pulses
    pub fn update_ambient(&mut self, fever: bool, theme_hue: f32, score: u64) {
        for star in self.stars.iter_mut() {
            star.twinkle += star.speed;
        }

        self.target_bg_hue = theme_hue + ((score / 500) * 10 % 40) as f32;
        self.bg_hue += (self.target_bg_hue - self.bg_hue) * 0.02;

        self.overlay_alpha = if fever {
            (self.overlay_alpha + 0.02).min(0.3)
        } else {
            (self.overlay_alpha - 0.02).max(0.0)
        };

        if self.screen_shake > 0.0 {
            self.screen_shake *= 0.9;
            if self.screen_shake < 0.01 {
                self.screen_shake = 0.0;
            }
        }

        self.milestone_flash = self.milestone_flash.saturating_sub(1);

        if let Some(announcement) = &mut self.announcement {
            announcement.timer = announcement.timer.saturating_sub(1);
            if announcement.timer == 0 {
                self.announcement = None;
            }
        }

        self.hud_coin_scale += (1.0 - self.hud_coin_scale) * 0.15;
        if (self.hud_coin_scale - 1.0).abs() < 0.001 {
            self.hud_coin_scale = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effects() -> Effects {
        Effects::new(3, Viewport::default(), &Theme::default())
    }

    #[test]
    fn test_particle_cap_evicts_oldest() {
        let mut fx = effects();
        fx.max_particles = 10;
        fx.step_particles(Vec2::ZERO, 6);
        fx.step_particles(Vec2::new(100.0, 0.0), 6);
        assert_eq!(fx.particles.len(), 10);
        // The newest batch survives intact
        assert!(fx.particles.iter().rev().take(6).all(|p| p.pos.x > 50.0));
    }

    #[test]
    fn test_particles_expire() {
        let mut fx = effects();
        fx.step_particles(Vec2::ZERO, 6);
        for _ in 0..40 {
            fx.update_particles();
        }
        assert!(fx.particles.is_empty());
    }

    #[test]
    fn test_weather_gated_by_background() {
        let mut fx = effects();
        let vp = Viewport::default();
        for frame in 0..30 {
            fx.update_weather(vp, BackgroundType::Default, frame);
        }
        assert!(fx.weather.is_empty());

        for frame in 0..30 {
            fx.update_weather(vp, BackgroundType::Night, frame);
        }
        assert_eq!(fx.weather.len(), 10);
        assert!(fx.weather.iter().all(|p| p.kind == WeatherKind::Snow));

        fx.weather_enabled = false;
        fx.weather.clear();
        fx.update_weather(vp, BackgroundType::Cyber, 0);
        assert!(fx.weather.is_empty());
    }

    #[test]
    fn test_weather_capped() {
        let mut fx = effects();
        let vp = Viewport {
            height: 100_000.0,
            ..Viewport::default()
        };
        for frame in 0..1_000 {
            fx.update_weather(vp, BackgroundType::Palace, frame);
        }
        assert_eq!(fx.weather.len(), MAX_WEATHER);
    }

    #[test]
    fn test_fire_only_continues_when_lit() {
        let mut fx = effects();
        let vp = Viewport::default();
        fx.update_fire(vp, false);
        assert!(fx.fire.is_empty());

        fx.update_fire(vp, true);
        assert!(!fx.fire.is_empty());
        assert!(fx.fire_intensity > 0.0);
        let lit = fx.fire.len();
        fx.update_fire(vp, false);
        assert!(fx.fire.len() >= lit);
    }

    #[test]
    fn test_ambient_decay() {
        let mut fx = effects();
        fx.shake(8.0);
        fx.flash_milestone();
        fx.announce("20 COMBO!", GOLD, 2);
        fx.pulse_hud_coin(1.6);

        fx.update_ambient(true, 220.0, 0);
        assert!(fx.screen_shake < 8.0);
        assert_eq!(fx.milestone_flash, MILESTONE_FLASH_TICKS - 1);
        assert!(fx.announcement.is_some());
        assert!((fx.overlay_alpha - 0.02).abs() < 1e-6);
        assert!(fx.hud_coin_scale < 1.6);

        fx.update_ambient(false, 220.0, 0);
        assert!(fx.announcement.is_none());
        assert_eq!(fx.overlay_alpha, 0.0);
    }

    #[test]
    fn test_bg_hue_drifts_with_score() {
        let mut fx = effects();
        fx.update_ambient(false, 220.0, 1_000);
        assert_eq!(fx.target_bg_hue, 240.0);
        fx.update_ambient(false, 220.0, 2_000);
        // (4 * 10) % 40 wraps back
        assert_eq!(fx.target_bg_hue, 220.0);
    }

    #[test]
    fn test_shake_respects_setting() {
        let mut fx = effects();
        fx.shake_enabled = false;
        fx.shake(15.0);
        fx.shake_at_least(2.0);
        assert_eq!(fx.screen_shake, 0.0);
    }
}
