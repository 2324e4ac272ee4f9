//! # Overworld Generation
//!
//! Stamps the 128×128 overworld from fixed tables: continental land fills,
//! sampled terrain features, a single beach pass, landmarks, and finally the
//! southern peninsula. The order of the passes matters; later passes
//! overwrite earlier ones.

use super::{GenerationConfig, Generator, Landmark, Rect};
use crate::{DraponError, DraponResult, Position, RandomSource, TileGrid, TileType};
use log::debug;

/// A terrain patch applied to non-Sea cells where
/// `(row + col * 7) % frequency == 0`. Frequency 1 is a solid fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFill {
    pub area: Rect,
    pub tile: TileType,
    pub frequency: i32,
}

impl FeatureFill {
    pub const fn new(area: Rect, tile: TileType, frequency: i32) -> Self {
        Self {
            area,
            tile,
            frequency,
        }
    }

    /// Whether the sampling rule selects a cell.
    pub fn selects(&self, pos: Position) -> bool {
        self.frequency <= 1 || (pos.row + pos.col * 7) % self.frequency == 0
    }

    /// Applies the feature to `grid`, leaving Sea untouched.
    pub fn apply(&self, grid: &mut TileGrid) {
        for pos in self.area.positions() {
            if grid.contains(pos.row, pos.col) && grid.at(pos) != TileType::Sea && self.selects(pos)
            {
                grid.set(pos.row, pos.col, self.tile);
            }
        }
    }
}

/// Continental silhouette, applied in order.
pub const LAND_FILLS: [Rect; 8] = [
    Rect::new(10, 10, 110, 45),
    Rect::new(10, 10, 35, 70),
    Rect::new(80, 10, 110, 60),
    Rect::new(40, 40, 70, 56),
    Rect::new(15, 80, 50, 120),
    Rect::new(50, 90, 80, 115),
    Rect::new(81, 85, 115, 120),
    Rect::new(60, 60, 72, 72),
];

/// Terrain features, applied in order after the land fills.
pub const FEATURE_FILLS: [FeatureFill; 9] = [
    FeatureFill::new(Rect::new(12, 12, 25, 30), TileType::Mountain, 2),
    FeatureFill::new(Rect::new(15, 50, 25, 65), TileType::Mountain, 2),
    FeatureFill::new(Rect::new(85, 15, 105, 40), TileType::Sand, 1),
    FeatureFill::new(Rect::new(20, 90, 40, 110), TileType::Mountain, 3),
    FeatureFill::new(Rect::new(25, 105, 35, 115), TileType::Forest, 2),
    FeatureFill::new(Rect::new(55, 45, 65, 55), TileType::Forest, 3),
    FeatureFill::new(Rect::new(45, 110, 50, 118), TileType::Swamp, 1),
    FeatureFill::new(Rect::new(62, 62, 70, 70), TileType::Swamp, 1),
    FeatureFill::new(Rect::new(30, 12, 80, 40), TileType::Steppe, 4),
];

/// Settlements, castles and cave mouths.
pub const LANDMARKS: [Landmark; 10] = [
    Landmark::new(50, 48, TileType::Castle),
    Landmark::new(52, 48, TileType::Town),
    Landmark::new(28, 24, TileType::Town),
    Landmark::new(24, 108, TileType::Town),
    Landmark::new(100, 100, TileType::Town),
    Landmark::new(32, 60, TileType::Town),
    Landmark::new(66, 66, TileType::Castle),
    Landmark::new(88, 40, TileType::Cave),
    Landmark::new(104, 28, TileType::Cave),
    Landmark::new(48, 88, TileType::Cave),
];

/// Bridge spans joining the landmasses.
pub const BRIDGES: [Rect; 3] = [
    Rect::new(25, 70, 26, 80),
    Rect::new(80, 95, 81, 96),
    Rect::new(66, 56, 67, 60),
];

/// Southern peninsula, stamped after the landmarks.
pub const PENINSULA: Rect = Rect::new(108, 44, 122, 64);

/// Swamp sprinkled over the peninsula.
pub const PENINSULA_SWAMP: FeatureFill =
    FeatureFill::new(Rect::new(112, 48, 120, 60), TileType::Swamp, 3);

/// Recolours Sea next to land (8-neighbourhood) as Sand, in a single pass.
///
/// Neighbours are read from the grid as it was before the pass, so new sand
/// never spreads further.
pub fn beach_pass(grid: &mut TileGrid) {
    let before = grid.clone();
    for pos in before.positions() {
        if before.at(pos) != TileType::Sea {
            continue;
        }
        let near_land = pos
            .adjacent_positions()
            .into_iter()
            .any(|next| before.at(next).is_land());
        if near_land {
            grid.set(pos.row, pos.col, TileType::Sand);
        }
    }
}

/// Stamps landmarks and bridges.
pub fn stamp_landmarks(grid: &mut TileGrid) {
    for landmark in &LANDMARKS {
        landmark.stamp(grid);
    }
    for bridge in &BRIDGES {
        bridge.fill(grid, TileType::Bridge);
    }
}

/// Builds the overworld. The layout is fixed, so the random source is unused.
#[derive(Debug, Clone, Default)]
pub struct OverworldGenerator;

impl OverworldGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Runs every pass and returns the finished grid.
    pub fn build(&self) -> TileGrid {
        let mut grid = TileGrid::overworld();

        for land in &LAND_FILLS {
            land.fill(&mut grid, TileType::Plains);
        }
        for feature in &FEATURE_FILLS {
            feature.apply(&mut grid);
        }
        beach_pass(&mut grid);
        stamp_landmarks(&mut grid);

        PENINSULA.fill(&mut grid, TileType::Plains);
        PENINSULA_SWAMP.apply(&mut grid);
        // The peninsula may cover landmark cells; put them back.
        stamp_landmarks(&mut grid);

        debug!(
            "Overworld built: {} land cells, {} sea cells",
            grid.count(TileType::Plains),
            grid.count(TileType::Sea)
        );
        grid
    }
}

impl Generator<TileGrid> for OverworldGenerator {
    fn generate(&self, _config: &GenerationConfig, _rng: &mut dyn RandomSource) -> TileGrid {
        self.build()
    }

    fn validate(&self, grid: &TileGrid, _config: &GenerationConfig) -> DraponResult<()> {
        if grid.size() != crate::config::OVERWORLD_SIZE {
            return Err(DraponError::GenerationFailed(format!(
                "overworld is {} wide",
                grid.size()
            )));
        }
        for landmark in &LANDMARKS {
            if grid.at(landmark.position()) != landmark.tile {
                return Err(DraponError::GenerationFailed(format!(
                    "landmark at {:?} was overwritten",
                    landmark.position()
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "Overworld"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedRandom;

    #[test]
    fn test_feature_sampling_rule() {
        let solid = FeatureFill::new(Rect::new(0, 0, 4, 4), TileType::Sand, 1);
        assert!(solid.selects(Position::new(3, 2)));

        let sparse = FeatureFill::new(Rect::new(0, 0, 4, 4), TileType::Forest, 3);
        assert!(sparse.selects(Position::new(1, 2))); // 1 + 14 = 15
        assert!(!sparse.selects(Position::new(1, 1))); // 1 + 7 = 8
    }

    #[test]
    fn test_feature_skips_sea() {
        let mut grid = TileGrid::new(4, TileType::Sea, TileType::Sea);
        grid.set(0, 0, TileType::Plains);
        FeatureFill::new(Rect::new(0, 0, 4, 4), TileType::Mountain, 1).apply(&mut grid);
        assert_eq!(grid.get(0, 0), TileType::Mountain);
        assert_eq!(grid.count(TileType::Mountain), 1);
    }

    #[test]
    fn test_beach_pass_is_single() {
        let mut grid = TileGrid::new(7, TileType::Sea, TileType::Sea);
        grid.set(3, 3, TileType::Plains);
        beach_pass(&mut grid);
        assert_eq!(grid.count(TileType::Sand), 8);
        assert_eq!(grid.get(1, 3), TileType::Sea);
    }

    #[test]
    fn test_beach_ignores_non_land_neighbours() {
        let mut grid = TileGrid::new(3, TileType::Sea, TileType::Sea);
        grid.set(1, 1, TileType::Swamp);
        beach_pass(&mut grid);
        assert_eq!(grid.count(TileType::Sand), 0);
    }

    #[test]
    fn test_landmarks_survive_all_passes() {
        let generator = OverworldGenerator::new();
        let config = GenerationConfig::for_testing(1);
        let grid = generator.generate(&config, &mut ScriptedRandom::default());
        assert!(generator.validate(&grid, &config).is_ok());
        assert_eq!(grid.get(28, 24), TileType::Town);
        assert_eq!(grid.get(66, 57), TileType::Bridge);
        assert_eq!(grid.get(0, 0), TileType::Sea);
    }

    #[test]
    fn test_start_area_is_walkable() {
        let grid = OverworldGenerator::new().build();
        for row in 24..28 {
            assert!(grid.get(row, 24).is_walkable(), "row {} blocked", row);
        }
    }

    #[test]
    fn test_peninsula_exists() {
        let grid = OverworldGenerator::new().build();
        assert_ne!(grid.get(120, 50), TileType::Sea);
        assert_ne!(grid.get(121, 63), TileType::Sea);
    }
}
