//! LevelConfig - size, placement, tile set and scoring of a level

use std::path::Path;

use anyhow::Context;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::grid::{CellSize, Geometry, Point, TileType};
use crate::layout::{Layout, MAX_TILE_TYPES};
use crate::scoring::ScoringPolicy;

/// Level configuration, loadable from JSON. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Cells per row
    pub width: usize,
    /// Cells per column
    pub height: usize,
    /// Number of distinct tile types
    pub tile_types: TileType,
    pub cell_size: CellSize,
    /// Bottom-left corner of the grid; `None` centres the grid on the world origin
    pub origin: Option<Point>,
    /// Seed for the random tile assignment
    pub seed: u64,
    pub scoring: ScoringPolicy,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            width: 15,
            height: 15,
            tile_types: 5,
            cell_size: CellSize::new(1.2, 1.2),
            origin: None,
            seed: 0,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl LevelConfig {
    /// Check sizes, tile set and scoring rules
    pub fn validate(&self) -> Result<(), GridError> {
        if self.width == 0 || self.height == 0 {
            return Err(GridError::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.tile_types == 0 || self.tile_types > MAX_TILE_TYPES {
            return Err(GridError::InvalidConfig(format!(
                "tile types must be in 1..={}, got {}",
                MAX_TILE_TYPES, self.tile_types
            )));
        }
        if !self.cell_size.is_valid() {
            return Err(GridError::InvalidConfig(format!(
                "cell size must be positive, got {}x{}",
                self.cell_size.width, self.cell_size.height
            )));
        }
        self.scoring.validate()
    }

    /// World placement of the grid
    pub fn geometry(&self) -> Geometry {
        match self.origin {
            Some(origin) => Geometry::new(origin, self.cell_size),
            None => Geometry::centered(self.width, self.height, self.cell_size),
        }
    }

    /// Random, completely filled layout for this config's seed
    pub fn generate_layout(&self) -> Layout {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        Layout::random(self.width, self.height, self.tile_types, &mut rng)
    }

    /// Same config with another seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Load from JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read level config: {}", path.display()))?;
        let config: LevelConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse level config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::PenaltyCurve;

    #[test]
    fn test_default_matches_classic_board() {
        let config = LevelConfig::default();
        assert!(config.validate().is_ok());
        let geometry = config.geometry();
        assert!((geometry.origin.x + 9.0).abs() < 1e-5);
        assert!((geometry.origin.y + 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = LevelConfig::default();
        assert!(LevelConfig { width: 0, ..base.clone() }.validate().is_err());
        assert!(LevelConfig { tile_types: 0, ..base.clone() }.validate().is_err());
        assert!(LevelConfig { tile_types: 27, ..base.clone() }.validate().is_err());
        assert!(LevelConfig { cell_size: CellSize::new(-1.0, 1.0), ..base }.validate().is_err());
    }

    #[test]
    fn test_explicit_origin() {
        let config = LevelConfig {
            origin: Some(Point::new(2.0, 3.0)),
            ..LevelConfig::default()
        };
        assert_eq!(config.geometry().origin, Point::new(2.0, 3.0));
    }

    #[test]
    fn test_generate_layout_is_seeded() {
        let config = LevelConfig { width: 8, height: 6, tile_types: 3, ..LevelConfig::default() };
        assert_eq!(config.generate_layout(), config.generate_layout());
        assert_ne!(config.generate_layout(), config.clone().with_seed(1).generate_layout());
        assert_eq!(config.generate_layout().occupied(), 48);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LevelConfig =
            serde_json::from_str(r#"{"width": 5, "scoring": {"loss_penalty": "quadratic"}}"#).unwrap();
        assert_eq!(config.width, 5);
        assert_eq!(config.height, 15);
        assert_eq!(config.scoring.loss_penalty, PenaltyCurve::Quadratic);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("samegame-config-{}.json", std::process::id()));
        let config = LevelConfig { seed: 99, width: 4, ..LevelConfig::default() };
        config.save(&path).unwrap();
        let loaded = LevelConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
