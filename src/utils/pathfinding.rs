//! # Reachability
//!
//! Grid connectivity queries used by generator validation and tests.

use crate::{Position, TileGrid};
use ::pathfinding::prelude::{bfs, bfs_reach};
use std::collections::HashSet;

/// Orthogonal neighbours of `pos` the player could stand on.
pub fn walkable_neighbours(grid: &TileGrid, pos: Position) -> Vec<Position> {
    pos.cardinal_adjacent_positions()
        .into_iter()
        .filter(|next| grid.contains(next.row, next.col) && grid.at(*next).is_walkable())
        .collect()
}

/// Number of walkable orthogonal neighbours; 1 marks a dead end.
pub fn walkable_degree(grid: &TileGrid, pos: Position) -> usize {
    walkable_neighbours(grid, pos).len()
}

/// Every walkable cell reachable from `start` by orthogonal steps.
///
/// Returns an empty set when `start` itself is not walkable.
pub fn reachable_cells(grid: &TileGrid, start: Position) -> HashSet<Position> {
    if !grid.contains(start.row, start.col) || !grid.at(start).is_walkable() {
        return HashSet::new();
    }
    bfs_reach(start, |&pos| walkable_neighbours(grid, pos)).collect()
}

/// Whether every walkable cell of the grid is reachable from `start`.
pub fn is_fully_connected(grid: &TileGrid, start: Position) -> bool {
    let reached = reachable_cells(grid, start);
    grid.positions()
        .filter(|pos| grid.at(*pos).is_walkable())
        .all(|pos| reached.contains(&pos))
}

/// Number of steps on the shortest walkable path between two cells.
pub fn path_length(grid: &TileGrid, from: Position, to: Position) -> Option<usize> {
    bfs(&from, |&pos| walkable_neighbours(grid, pos), |&pos| pos == to)
        .map(|path| path.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TileType;

    fn corridor() -> TileGrid {
        let mut grid = TileGrid::new(5, TileType::Wall, TileType::Wall);
        grid.fill_rect(2, 0, 3, 5, TileType::Floor);
        grid
    }

    #[test]
    fn test_reachable_cells_follow_floor() {
        let grid = corridor();
        let reached = reachable_cells(&grid, Position::new(2, 0));
        assert_eq!(reached.len(), 5);
        assert!(is_fully_connected(&grid, Position::new(2, 0)));
        assert!(reachable_cells(&grid, Position::new(0, 0)).is_empty());
    }

    #[test]
    fn test_disconnected_pocket_detected() {
        let mut grid = corridor();
        grid.set(0, 0, TileType::Floor);
        assert!(!is_fully_connected(&grid, Position::new(2, 0)));
    }

    #[test]
    fn test_degree_and_path_length() {
        let grid = corridor();
        assert_eq!(walkable_degree(&grid, Position::new(2, 0)), 1);
        assert_eq!(walkable_degree(&grid, Position::new(2, 2)), 2);
        assert_eq!(
            path_length(&grid, Position::new(2, 0), Position::new(2, 4)),
            Some(4)
        );
        assert_eq!(
            path_length(&grid, Position::new(2, 0), Position::new(0, 0)),
            None
        );
    }
}
