//! Game catalog and rank table configuration

use serde::{Deserialize, Serialize};

/// A game seeded into the store at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Whether accounts for this game resolve ranks through the rank table
    #[serde(default = "default_true")]
    pub rank_lookup: bool,
}

fn default_true() -> bool {
    true
}

impl GameSettings {
    pub fn defaults() -> Vec<GameSettings> {
        vec![GameSettings {
            name: "Rainbow Six Siege".to_string(),
            description: "Tactical team shooter".to_string(),
            rank_lookup: true,
        }]
    }
}

/// Known ranks for one player tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankEntry {
    pub game: String,
    pub tag: String,
    pub casual: String,
    pub competitive: String,
}
