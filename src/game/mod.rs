//! # Game Module
//!
//! Core game state, map layers and the rules that mutate them.
//!
//! This module contains the fundamental building blocks of the core:
//! - Tile grids for the three map layers and the generated world
//! - Player, NPC, monster and item records
//! - The navigation controller and the battle state machine
//! - The mode machine, message channel and scheduled continuations

pub mod battle;
pub mod entities;
pub mod items;
pub mod messages;
pub mod navigation;
pub mod save;
pub mod scheduler;
pub mod state;
pub mod world;

pub use battle::*;
pub use entities::*;
pub use items::*;
pub use messages::*;
pub use navigation::*;
pub use save::*;
pub use scheduler::*;
pub use state::*;
pub use world::*;

use serde::{Deserialize, Serialize};

/// A cell coordinate on a map layer.
///
/// # Examples
///
/// ```
/// use drapon::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.row, 10);
/// assert_eq!(pos.col, 5);
///
/// let adjacent = pos.adjacent_positions();
/// assert_eq!(adjacent.len(), 8); // All 8 surrounding positions
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Returns the origin position (0, 0).
    pub fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Calculates the Manhattan distance to another position.
    ///
    /// # Examples
    ///
    /// ```
    /// use drapon::Position;
    ///
    /// let pos1 = Position::new(0, 0);
    /// let pos2 = Position::new(3, 4);
    /// assert_eq!(pos1.manhattan_distance(pos2), 7);
    /// ```
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.row - other.row).abs() + (self.col - other.col).abs()) as u32
    }

    /// Calculates the Euclidean distance to another position.
    pub fn euclidean_distance(self, other: Position) -> f64 {
        let dr = (self.row - other.row) as f64;
        let dc = (self.col - other.col) as f64;
        (dr * dr + dc * dc).sqrt()
    }

    /// Returns the neighbouring position one step in `direction`.
    pub fn step(self, direction: Direction) -> Position {
        self + direction.to_delta()
    }

    /// Returns all 8 adjacent positions (including diagonals).
    pub fn adjacent_positions(self) -> Vec<Position> {
        let mut positions = Vec::with_capacity(8);
        for dr in -1..=1 {
            for dc in -1..=1 {
                if dr != 0 || dc != 0 {
                    positions.push(Position::new(self.row + dr, self.col + dc));
                }
            }
        }
        positions
    }

    /// Returns the 4 orthogonal neighbours in scan order: up, down, left, right.
    pub fn cardinal_adjacent_positions(self) -> Vec<Position> {
        Direction::all()
            .into_iter()
            .map(|direction| self.step(direction))
            .collect()
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.row + other.row, self.col + other.col)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.row - other.row, self.col - other.col)
    }
}

/// Orthogonal movement and facing directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Converts a direction to a position delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use drapon::{Direction, Position};
    ///
    /// assert_eq!(Direction::Up.to_delta(), Position::new(-1, 0));
    /// assert_eq!(Direction::Right.to_delta(), Position::new(0, 1));
    /// ```
    pub fn to_delta(self) -> Position {
        match self {
            Direction::Up => Position::new(-1, 0),
            Direction::Down => Position::new(1, 0),
            Direction::Left => Position::new(0, -1),
            Direction::Right => Position::new(0, 1),
        }
    }

    /// Converts a position delta to a direction.
    ///
    /// Returns None if the delta is not a single orthogonal step.
    pub fn from_delta(delta: Position) -> Option<Direction> {
        match (delta.row, delta.col) {
            (-1, 0) => Some(Direction::Up),
            (1, 0) => Some(Direction::Down),
            (0, -1) => Some(Direction::Left),
            (0, 1) => Some(Direction::Right),
            _ => None,
        }
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// All four directions in NPC scan priority order.
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }
}

/// One of the three map spaces, each with its own grid and coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Overworld,
    Building,
    Cave,
}

impl Layer {
    /// Stable numeric code used by the save record.
    pub fn code(self) -> i64 {
        match self {
            Layer::Overworld => 0,
            Layer::Building => 1,
            Layer::Cave => 2,
        }
    }

    /// Inverse of [`Layer::code`].
    pub fn from_code(code: i64) -> Option<Layer> {
        match code {
            0 => Some(Layer::Overworld),
            1 => Some(Layer::Building),
            2 => Some(Layer::Cave),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(5, 10);
        assert_eq!(pos.row, 5);
        assert_eq!(pos.col, 10);
    }

    #[test]
    fn test_position_distances() {
        let pos1 = Position::new(0, 0);
        let pos2 = Position::new(3, 4);
        assert_eq!(pos1.manhattan_distance(pos2), 7);
        assert_eq!(pos1.euclidean_distance(pos2), 5.0);
    }

    #[test]
    fn test_position_adjacent() {
        let pos = Position::new(5, 5);
        let adjacent = pos.adjacent_positions();
        assert_eq!(adjacent.len(), 8);
        assert!(adjacent.contains(&Position::new(4, 4)));
        assert!(adjacent.contains(&Position::new(6, 6)));
        assert!(!adjacent.contains(&pos));
    }

    #[test]
    fn test_cardinal_order_is_up_down_left_right() {
        let pos = Position::new(5, 5);
        assert_eq!(
            pos.cardinal_adjacent_positions(),
            vec![
                Position::new(4, 5),
                Position::new(6, 5),
                Position::new(5, 4),
                Position::new(5, 6),
            ]
        );
    }

    #[test]
    fn test_position_arithmetic() {
        let pos1 = Position::new(5, 10);
        let pos2 = Position::new(3, 2);
        assert_eq!(pos1 + pos2, Position::new(8, 12));
        assert_eq!(pos1 - pos2, Position::new(2, 8));
    }

    #[test]
    fn test_direction_round_trip() {
        for direction in Direction::all() {
            assert_eq!(Direction::from_delta(direction.to_delta()), Some(direction));
            assert_eq!(direction.opposite().opposite(), direction);
        }
        assert_eq!(Direction::from_delta(Position::new(1, 1)), None);
    }

    #[test]
    fn test_layer_codes() {
        for layer in [Layer::Overworld, Layer::Building, Layer::Cave] {
            assert_eq!(Layer::from_code(layer.code()), Some(layer));
        }
        assert_eq!(Layer::from_code(9), None);
    }
}
