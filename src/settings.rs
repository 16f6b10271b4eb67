//! Game settings and preferences
//!
//! Persisted as JSON next to the progress keys.

use serde::{Deserialize, Serialize};

use crate::persistence::{ProgressStore, keys, write_or_warn};
use crate::sim::Effects;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 64,
            QualityPreset::Medium => 256,
            QualityPreset::High => 512,
        }
    }

    /// Whether to render the twinkling star layer
    pub fn starfield_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }

    /// Whether themes get their snow/leaves/digits/dust
    pub fn weather_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Screen shake on falls and monster hits
    pub screen_shake: bool,
    /// Particle effects (steps, bursts, fire)
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (minimize shake, flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            screen_shake: true,
            particles: true,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Push the visual preferences into the effect system
    pub fn apply_to(&self, effects: &mut Effects) {
        effects.max_particles = self.max_particles();
        effects.shake_enabled = self.effective_screen_shake();
        effects.weather_enabled = self.quality.weather_enabled() && !self.reduced_motion;
        if !effects.shake_enabled {
            effects.screen_shake = 0.0;
        }
        if !self.quality.starfield_enabled() {
            effects.stars.clear();
        }
    }

    /// Load settings, falling back to defaults
    pub fn load(store: &dyn ProgressStore) -> Self {
        if let Some(json) = store.get(keys::SETTINGS) {
            match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring malformed settings: {}", e),
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, store: &mut dyn ProgressStore) {
        match serde_json::to_string(self) {
            Ok(json) => {
                write_or_warn(store, keys::SETTINGS, &json);
                log::info!("Settings saved");
            }
            Err(e) => log::warn!("Failed to encode settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characters::Theme;
    use crate::persistence::MemoryStore;
    use crate::sim::Viewport;

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }

    #[test]
    fn test_reduced_motion_disables_shake() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_screen_shake());

        let mut fx = Effects::new(1, Viewport::default(), &Theme::default());
        fx.screen_shake = 5.0;
        settings.apply_to(&mut fx);
        assert_eq!(fx.screen_shake, 0.0);
        assert!(!fx.weather_enabled);
    }

    #[test]
    fn test_low_quality_trims_effects() {
        let mut fx = Effects::new(1, Viewport::default(), &Theme::default());
        Settings::from_preset(QualityPreset::Low).apply_to(&mut fx);
        assert_eq!(fx.max_particles, 64);
        assert!(fx.stars.is_empty());

        let no_particles = Settings {
            particles: false,
            ..Settings::default()
        };
        assert_eq!(no_particles.max_particles(), 0);
    }

    #[test]
    fn test_store_roundtrip_and_partial_json() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            muted: true,
            quality: QualityPreset::High,
            ..Settings::default()
        };
        settings.save(&mut store);
        assert_eq!(Settings::load(&store), settings);

        store.set(keys::SETTINGS, r#"{"muted": true}"#).unwrap();
        let partial = Settings::load(&store);
        assert!(partial.muted);
        assert_eq!(partial.quality, QualityPreset::Medium);
    }
}
