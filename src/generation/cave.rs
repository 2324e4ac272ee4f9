//! # Cave Generation
//!
//! Maze carving by recursive backtracking over the odd cells of a 16×16
//! grid, followed by entrance fix-ups and chest placement at the farthest
//! dead end.

use super::{GenerationConfig, Generator};
use crate::config::{ENTRANCE_COLS, ENTRANCE_ROW, INTERIOR_SIZE};
use crate::utils::{is_fully_connected, walkable_degree};
use crate::{DraponError, DraponResult, Direction, Position, RandomSource, TileGrid, TileType};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Chest cell used when the maze has no dead end.
pub const FALLBACK_CHEST: Position = Position { row: 13, col: 7 };

/// Highest odd coordinate a maze cell may use.
const MAX_CELL: i32 = INTERIOR_SIZE - 3;

/// A carved cave and the chosen chest cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaveLayout {
    pub grid: TileGrid,
    pub chest: Position,
    /// Whether no dead end existed and the fallback cell was used
    pub used_fallback: bool,
}

/// Recursive-backtracking cave builder.
#[derive(Debug, Clone)]
pub struct CaveGenerator {
    /// Maze start cell (odd coordinates)
    pub start: Position,
}

impl Default for CaveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CaveGenerator {
    pub fn new() -> Self {
        Self {
            start: Position::new(1, 1),
        }
    }

    /// Carves the maze into an all-Wall grid.
    pub fn carve(&self, rng: &mut dyn RandomSource) -> TileGrid {
        let mut grid = TileGrid::new(INTERIOR_SIZE, TileType::Wall, TileType::Wall);
        grid.set(self.start.row, self.start.col, TileType::Floor);
        let mut stack = vec![self.start];

        while let Some(&current) = stack.last() {
            let candidates: Vec<Direction> = Direction::all()
                .into_iter()
                .filter(|&direction| {
                    let next = two_steps(current, direction);
                    is_maze_cell(next) && grid.at(next) == TileType::Wall
                })
                .collect();

            if candidates.is_empty() {
                stack.pop();
                continue;
            }

            let direction = candidates[rng.below(candidates.len())];
            let between = current.step(direction);
            let next = two_steps(current, direction);
            grid.set(between.row, between.col, TileType::Floor);
            grid.set(next.row, next.col, TileType::Floor);
            stack.push(next);
        }
        grid
    }

    /// Opens the entrance and links it to the maze if carving left it cut off.
    pub fn open_entrance(grid: &mut TileGrid) {
        for col in ENTRANCE_COLS {
            grid.set(ENTRANCE_ROW, col, TileType::Floor);
            grid.set(ENTRANCE_ROW - 1, col, TileType::Floor);
        }
        let above = ENTRANCE_ROW - 2;
        let linked = ENTRANCE_COLS
            .iter()
            .any(|&col| grid.get(above, col) == TileType::Floor);
        if !linked {
            grid.set(FALLBACK_CHEST.row, FALLBACK_CHEST.col, TileType::Floor);
        }
    }

    /// Picks the dead end farthest (Euclidean) from the entrance.
    ///
    /// Ties keep the first cell in row-major order. Returns `None` when the
    /// grid has no dead end.
    pub fn farthest_dead_end(grid: &TileGrid) -> Option<Position> {
        let entrance = Position::new(ENTRANCE_ROW, ENTRANCE_COLS[0]);
        let mut best: Option<(Position, f64)> = None;
        for pos in grid.positions() {
            if grid.at(pos) != TileType::Floor || walkable_degree(grid, pos) != 1 {
                continue;
            }
            let distance = pos.euclidean_distance(entrance);
            if best.map_or(true, |(_, farthest)| distance > farthest) {
                best = Some((pos, distance));
            }
        }
        best.map(|(pos, _)| pos)
    }

    /// Carves, opens the entrance and places the chest.
    pub fn build(&self, rng: &mut dyn RandomSource) -> CaveLayout {
        let mut grid = self.carve(rng);
        Self::open_entrance(&mut grid);

        let (chest, used_fallback) = match Self::farthest_dead_end(&grid) {
            Some(pos) => (pos, false),
            None => {
                warn!("Cave has no dead end; chest falls back to {:?}", FALLBACK_CHEST);
                (FALLBACK_CHEST, true)
            }
        };
        grid.set(chest.row, chest.col, TileType::Chest);
        debug!(
            "Cave carved with {} floor cells, chest at {:?}",
            grid.count(TileType::Floor),
            chest
        );
        CaveLayout {
            grid,
            chest,
            used_fallback,
        }
    }
}

fn two_steps(pos: Position, direction: Direction) -> Position {
    pos.step(direction).step(direction)
}

fn is_maze_cell(pos: Position) -> bool {
    (1..=MAX_CELL).contains(&pos.row) && (1..=MAX_CELL).contains(&pos.col)
}

impl Generator<CaveLayout> for CaveGenerator {
    fn generate(&self, _config: &GenerationConfig, rng: &mut dyn RandomSource) -> CaveLayout {
        self.build(rng)
    }

    fn validate(&self, layout: &CaveLayout, _config: &GenerationConfig) -> DraponResult<()> {
        let grid = &layout.grid;
        if grid.count(TileType::Chest) != 1 || grid.at(layout.chest) != TileType::Chest {
            return Err(DraponError::GenerationFailed(
                "cave must hold exactly one chest".to_string(),
            ));
        }
        if !layout.used_fallback && walkable_degree(grid, layout.chest) != 1 {
            return Err(DraponError::GenerationFailed(format!(
                "chest at {:?} is not a dead end",
                layout.chest
            )));
        }
        let entrance = Position::new(ENTRANCE_ROW, ENTRANCE_COLS[0]);
        if !is_fully_connected(grid, entrance) {
            return Err(DraponError::GenerationFailed(
                "cave floor is not connected to the entrance".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "Cave"
    }
}
