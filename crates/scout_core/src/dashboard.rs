use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Aggregated per-company entry of the dashboard heatmap.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyTile {
    pub name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heat {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSize {
    Large,
    Medium,
    Small,
}

impl CompanyTile {
    pub fn heat(&self) -> Heat {
        if self.score >= 8.0 {
            Heat::High
        } else if self.score >= 4.0 {
            Heat::Medium
        } else {
            Heat::Low
        }
    }

    pub fn tile_size(&self) -> TileSize {
        if self.score >= 12.0 {
            TileSize::Large
        } else if self.score >= 7.0 {
            TileSize::Medium
        } else {
            TileSize::Small
        }
    }
}
