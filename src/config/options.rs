//! Type-safe engine options.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Environment variable consulted by
/// [`EngineConfigBuilder::engine_path_from_env`](super::EngineConfigBuilder::engine_path_from_env).
pub const ENV_ENGINE_PATH: &str = "UCI_ENGINE_PATH";

/// Playing strength presets, each mapped to an approximate Elo rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrengthLevel {
    #[serde(rename = "LEVEL_1")]
    Level1,
    #[serde(rename = "LEVEL_2")]
    Level2,
    #[serde(rename = "LEVEL_3")]
    Level3,
    #[serde(rename = "LEVEL_4")]
    Level4,
    #[serde(rename = "LEVEL_5")]
    Level5,
}

impl StrengthLevel {
    pub const ALL: [StrengthLevel; 5] = [
        StrengthLevel::Level1,
        StrengthLevel::Level2,
        StrengthLevel::Level3,
        StrengthLevel::Level4,
        StrengthLevel::Level5,
    ];

    /// Map a 1-based level number to a preset.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1..=5 => Some(Self::ALL[usize::from(level - 1)]),
            _ => None,
        }
    }

    /// The 1-based level number.
    pub fn level(self) -> u8 {
        match self {
            StrengthLevel::Level1 => 1,
            StrengthLevel::Level2 => 2,
            StrengthLevel::Level3 => 3,
            StrengthLevel::Level4 => 4,
            StrengthLevel::Level5 => 5,
        }
    }

    /// Elo rating passed as `UCI_Elo`.
    pub fn rating(self) -> u32 {
        match self {
            StrengthLevel::Level1 => 600,
            StrengthLevel::Level2 => 800,
            StrengthLevel::Level3 => 1200,
            StrengthLevel::Level4 => 1700,
            StrengthLevel::Level5 => 2000,
        }
    }

    /// `setoption` lines that limit the engine to this strength.
    pub fn option_lines(self) -> [String; 2] {
        [
            "setoption name UCI_LimitStrength value true".to_string(),
            format!("setoption name UCI_Elo value {}", self.rating()),
        ]
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {} ({} Elo)", self.level(), self.rating())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_level_bounds() {
        assert_eq!(StrengthLevel::from_level(0), None);
        assert_eq!(StrengthLevel::from_level(1), Some(StrengthLevel::Level1));
        assert_eq!(StrengthLevel::from_level(5), Some(StrengthLevel::Level5));
        assert_eq!(StrengthLevel::from_level(6), None);
    }

    #[test]
    fn ratings_increase_with_level() {
        let ratings: Vec<u32> = StrengthLevel::ALL.iter().map(|l| l.rating()).collect();
        assert_eq!(ratings, vec![600, 800, 1200, 1700, 2000]);
        for level in StrengthLevel::ALL {
            assert_eq!(StrengthLevel::from_level(level.level()), Some(level));
        }
    }

    #[test]
    fn option_lines_carry_rating() {
        let [limit, elo] = StrengthLevel::Level3.option_lines();
        assert_eq!(limit, "setoption name UCI_LimitStrength value true");
        assert_eq!(elo, "setoption name UCI_Elo value 1200");
    }

    #[test]
    fn serde_names() {
        let json = serde_json::to_string(&StrengthLevel::Level4).unwrap();
        assert_eq!(json, "\"LEVEL_4\"");
        let parsed: StrengthLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StrengthLevel::Level4);
    }

    #[test]
    fn display() {
        assert_eq!(StrengthLevel::Level2.to_string(), "level 2 (800 Elo)");
    }
}
