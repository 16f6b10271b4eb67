//! Character descriptors and the built-in roster
//!
//! The simulation only reads `unlock_score`, `theme.bg_type` and
//! `theme.stair_type`; everything else is for the renderer.

use serde::{Deserialize, Serialize};

/// Background scene family; decides which weather particles spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundType {
    #[default]
    Default,
    Space,
    Night,
    Castle,
    Dojo,
    Kitchen,
    Cyber,
    Palace,
    City,
}

/// Kinds of weather particle a background produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherKind {
    Snow,
    Leaf,
    Digit,
    Dust,
}

impl BackgroundType {
    /// Weather for this background, if any
    pub fn weather(self) -> Option<WeatherKind> {
        match self {
            BackgroundType::Default | BackgroundType::Space => None,
            BackgroundType::Night | BackgroundType::Castle => Some(WeatherKind::Snow),
            BackgroundType::Dojo | BackgroundType::Kitchen => Some(WeatherKind::Leaf),
            BackgroundType::Cyber => Some(WeatherKind::Digit),
            BackgroundType::Palace | BackgroundType::City => Some(WeatherKind::Dust),
        }
    }
}

/// Stair body style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StairType {
    #[default]
    Default,
    Neon,
    Glass,
    /// Invisible stairs marked only by a flag
    TransparentWithFlag,
}

impl StairType {
    /// Solid stairs get a drop shadow and highlight
    pub fn is_solid(self) -> bool {
        matches!(self, StairType::Default)
    }

    /// Light-on-dark styles need light labels
    pub fn is_bright(self) -> bool {
        !self.is_solid()
    }
}

/// HSL background color (h in degrees, s/l in percent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

/// Per-character look of the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub bg_type: BackgroundType,
    pub stair_type: StairType,
    pub bg: Hsl,
    pub stair: u32,
    pub stair_next: u32,
    pub stair_visited: u32,
    pub bg_image: Option<String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg_type: BackgroundType::Default,
            stair_type: StairType::Default,
            bg: Hsl {
                h: 220.0,
                s: 30.0,
                l: 15.0,
            },
            stair: 0x7B8FA0,
            stair_next: 0x9AB0C4,
            stair_visited: 0x5A90D0,
            bg_image: None,
        }
    }
}

/// Character palette (packed 0xRRGGBB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterColors {
    pub body: u32,
    pub body_dark: u32,
    pub head: u32,
    pub head_outline: u32,
    pub eye: u32,
    pub eye_white: u32,
    pub feet: u32,
    pub hat: Option<u32>,
    pub accent: u32,
}

/// A playable character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDescriptor {
    pub id: String,
    pub name: String,
    /// High score that unlocks this character for free
    pub unlock_score: u64,
    pub colors: CharacterColors,
    #[serde(default)]
    pub theme: Theme,
}

impl CharacterDescriptor {
    /// Unlocked by score or bought with coins
    pub fn is_unlocked(&self, high_score: u64, purchased: &[String]) -> bool {
        high_score >= self.unlock_score || purchased.iter().any(|id| id == &self.id)
    }
}

impl Default for CharacterDescriptor {
    fn default() -> Self {
        roster().swap_remove(0)
    }
}

/// The built-in characters, ordered by unlock score
pub fn roster() -> Vec<CharacterDescriptor> {
    vec![
        CharacterDescriptor {
            id: "default".into(),
            name: "Blue".into(),
            unlock_score: 0,
            colors: CharacterColors {
                body: 0x4A90D9,
                body_dark: 0x3570B0,
                head: 0xFFD5A0,
                head_outline: 0xE0B080,
                eye: 0x333333,
                eye_white: 0xFFFFFF,
                feet: 0x333333,
                hat: None,
                accent: 0x5BA0E9,
            },
            theme: Theme::default(),
        },
        CharacterDescriptor {
            id: "ninja".into(),
            name: "Ninja".into(),
            unlock_score: 100,
            colors: CharacterColors {
                body: 0x2D2D2D,
                body_dark: 0x1A1A1A,
                head: 0xFFD5A0,
                head_outline: 0xE0B080,
                eye: 0xFF3333,
                eye_white: 0xFFFFFF,
                feet: 0x2D2D2D,
                hat: Some(0xC00000),
                accent: 0xFF4444,
            },
            theme: Theme {
                bg_type: BackgroundType::Dojo,
                bg: Hsl {
                    h: 20.0,
                    s: 25.0,
                    l: 12.0,
                },
                stair: 0x8B6B4A,
                stair_next: 0xA88763,
                stair_visited: 0x6B4F35,
                ..Theme::default()
            },
        },
        CharacterDescriptor {
            id: "princess".into(),
            name: "Princess".into(),
            unlock_score: 300,
            colors: CharacterColors {
                body: 0xFF69B4,
                body_dark: 0xE0509A,
                head: 0xFFD5A0,
                head_outline: 0xE0B080,
                eye: 0x6633CC,
                eye_white: 0xFFFFFF,
                feet: 0xFFD700,
                hat: Some(0xFFD700),
                accent: 0xFF85C8,
            },
            theme: Theme {
                bg_type: BackgroundType::Palace,
                stair_type: StairType::Glass,
                bg: Hsl {
                    h: 320.0,
                    s: 35.0,
                    l: 14.0,
                },
                stair: 0xF3C4DE,
                stair_next: 0xFFE0F0,
                stair_visited: 0xE08CBF,
                bg_image: None,
            },
        },
        CharacterDescriptor {
            id: "robot".into(),
            name: "Robot".into(),
            unlock_score: 500,
            colors: CharacterColors {
                body: 0xA0A0B0,
                body_dark: 0x808090,
                head: 0xC0C0D0,
                head_outline: 0x909098,
                eye: 0x00FF88,
                eye_white: 0x003322,
                feet: 0x606070,
                hat: Some(0xFF6600),
                accent: 0xB0B0C0,
            },
            theme: Theme {
                bg_type: BackgroundType::Cyber,
                stair_type: StairType::Neon,
                bg: Hsl {
                    h: 190.0,
                    s: 45.0,
                    l: 8.0,
                },
                stair: 0x22D3EE,
                stair_next: 0x67E8F9,
                stair_visited: 0x0E7490,
                bg_image: None,
            },
        },
    ]
}

/// Look a character up by id
pub fn find<'a>(roster: &'a [CharacterDescriptor], id: &str) -> Option<&'a CharacterDescriptor> {
    roster.iter().find(|c| c.id == id)
}

/// Characters whose unlock threshold lies in `(previous_high, new_high]`
pub fn newly_unlocked(
    roster: &[CharacterDescriptor],
    previous_high: u64,
    new_high: u64,
) -> Vec<CharacterDescriptor> {
    roster
        .iter()
        .filter(|c| c.unlock_score > previous_high && c.unlock_score <= new_high)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_sorted_by_unlock() {
        let roster = roster();
        assert_eq!(roster[0].id, "default");
        assert!(roster.windows(2).all(|w| w[0].unlock_score <= w[1].unlock_score));
    }

    #[test]
    fn test_newly_unlocked_is_half_open() {
        let roster = roster();
        let ids = |v: Vec<CharacterDescriptor>| v.into_iter().map(|c| c.id).collect::<Vec<_>>();

        assert_eq!(ids(newly_unlocked(&roster, 0, 99)), Vec::<String>::new());
        assert_eq!(ids(newly_unlocked(&roster, 0, 100)), vec!["ninja"]);
        assert_eq!(ids(newly_unlocked(&roster, 100, 500)), vec!["princess", "robot"]);
        assert!(newly_unlocked(&roster, 500, 500).is_empty());
    }

    #[test]
    fn test_unlocked_by_purchase() {
        let robot = find(&roster(), "robot").cloned().unwrap();
        assert!(!robot.is_unlocked(10, &[]));
        assert!(robot.is_unlocked(10, &["robot".to_string()]));
        assert!(robot.is_unlocked(500, &[]));
    }

    #[test]
    fn test_descriptor_json_contract() {
        let json = r#"{
            "id": "viking",
            "name": "Viking",
            "unlockScore": 800,
            "colors": {
                "body": 1, "bodyDark": 2, "head": 3, "headOutline": 4,
                "eye": 5, "eyeWhite": 6, "feet": 7, "hat": null, "accent": 8
            },
            "theme": { "bgType": "castle", "stairType": "transparent_with_flag" }
        }"#;
        let viking: CharacterDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(viking.unlock_score, 800);
        assert_eq!(viking.theme.stair_type, StairType::TransparentWithFlag);
        assert_eq!(viking.theme.bg_type.weather(), Some(WeatherKind::Snow));
        // Missing theme fields fall back to defaults
        assert_eq!(viking.theme.stair, Theme::default().stair);
    }
}
