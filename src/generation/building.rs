//! # Building Generation
//!
//! The 16×16 building interior: a walled hall with a two-cell gap at the
//! bottom centre, two small rooms along the top and a shop counter in the
//! right-hand room.

use super::{GenerationConfig, Generator};
use crate::config::{ENTRANCE_COLS, ENTRANCE_ROW, INTERIOR_SIZE};
use crate::utils::is_fully_connected;
use crate::{DraponError, DraponResult, Position, RandomSource, TileGrid, TileType};

/// Cell holding the shop counter.
pub const SHOP_CELL: Position = Position { row: 5, col: 10 };

/// Openings in the bottom walls of the two rooms.
pub const ROOM_DOORWAYS: [Position; 2] = [Position { row: 7, col: 4 }, Position { row: 7, col: 10 }];

/// Left edges of the two rooms; each room spans four columns.
const ROOM_LEFT_COLS: [i32; 2] = [3, 9];

/// Builds the fixed building layout.
#[derive(Debug, Clone, Default)]
pub struct BuildingGenerator;

impl BuildingGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self) -> TileGrid {
        let mut grid = TileGrid::interior();
        let last = INTERIOR_SIZE - 1;

        for i in 0..INTERIOR_SIZE {
            grid.set(0, i, TileType::Wall);
            grid.set(last, i, TileType::Wall);
            grid.set(i, 0, TileType::Wall);
            grid.set(i, last, TileType::Wall);
        }
        for col in ENTRANCE_COLS {
            grid.set(ENTRANCE_ROW, col, TileType::Floor);
        }

        for left in ROOM_LEFT_COLS {
            grid.fill_rect(3, left, 4, left + 4, TileType::Wall);
            grid.fill_rect(7, left, 8, left + 4, TileType::Wall);
            grid.fill_rect(4, left, 7, left + 1, TileType::Wall);
            grid.fill_rect(4, left + 3, 7, left + 4, TileType::Wall);
        }
        for doorway in ROOM_DOORWAYS {
            grid.set(doorway.row, doorway.col, TileType::Floor);
        }
        grid.set(SHOP_CELL.row, SHOP_CELL.col, TileType::Shop);
        grid
    }
}

impl Generator<TileGrid> for BuildingGenerator {
    fn generate(&self, _config: &GenerationConfig, _rng: &mut dyn RandomSource) -> TileGrid {
        self.build()
    }

    fn validate(&self, grid: &TileGrid, _config: &GenerationConfig) -> DraponResult<()> {
        if grid.count(TileType::Shop) != 1 {
            return Err(DraponError::GenerationFailed(
                "building must hold exactly one shop".to_string(),
            ));
        }
        let entrance = Position::new(ENTRANCE_ROW, ENTRANCE_COLS[0]);
        if !is_fully_connected(grid, entrance) {
            return Err(DraponError::GenerationFailed(
                "building has unreachable floor".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "Building"
    }
}
