//! # World Representation
//!
//! Tile types, fixed-size tile grids and the generated three-layer world.

use crate::config::{INTERIOR_SIZE, OVERWORLD_SIZE};
use crate::{DraponError, DraponResult, Layer, Position};
use serde::{Deserialize, Serialize};

/// The closed set of tile kinds a grid cell can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    Sea,
    Sand,
    Steppe,
    Forest,
    Shop,
    Plains,
    Mountain,
    Town,
    Castle,
    Bridge,
    Swamp,
    Wall,
    Floor,
    Cave,
    Chest,
}

impl TileType {
    /// Whether the player may stand on this tile.
    ///
    /// # Examples
    ///
    /// ```
    /// use drapon::TileType;
    ///
    /// assert!(TileType::Plains.is_walkable());
    /// assert!(!TileType::Sea.is_walkable());
    /// assert!(!TileType::Wall.is_walkable());
    /// ```
    pub fn is_walkable(self) -> bool {
        match self {
            TileType::Sea | TileType::Wall => false,
            TileType::Sand
            | TileType::Steppe
            | TileType::Forest
            | TileType::Shop
            | TileType::Plains
            | TileType::Mountain
            | TileType::Town
            | TileType::Castle
            | TileType::Bridge
            | TileType::Swamp
            | TileType::Floor
            | TileType::Cave
            | TileType::Chest => true,
        }
    }

    /// Land tiles that turn neighbouring sea into beach.
    pub fn is_land(self) -> bool {
        matches!(
            self,
            TileType::Plains | TileType::Steppe | TileType::Mountain | TileType::Forest
        )
    }

    /// The layer an overworld tile leads into, if any.
    pub fn entrance_to(self) -> Option<Layer> {
        match self {
            TileType::Town | TileType::Castle => Some(Layer::Building),
            TileType::Cave => Some(Layer::Cave),
            _ => None,
        }
    }

    /// Single-character glyph used by the text viewport.
    pub fn glyph(self) -> char {
        match self {
            TileType::Sea => '~',
            TileType::Sand => ':',
            TileType::Steppe => ',',
            TileType::Forest => 'T',
            TileType::Shop => '$',
            TileType::Plains => '.',
            TileType::Mountain => '^',
            TileType::Town => 'o',
            TileType::Castle => 'K',
            TileType::Bridge => '=',
            TileType::Swamp => '%',
            TileType::Wall => '#',
            TileType::Floor => '_',
            TileType::Cave => 'C',
            TileType::Chest => '*',
        }
    }
}

/// A fixed-size square grid of tiles for one layer.
///
/// Reads outside the grid return the grid's boundary tile instead of failing.
///
/// # Examples
///
/// ```
/// use drapon::{TileGrid, TileType};
///
/// let mut grid = TileGrid::new(4, TileType::Floor, TileType::Wall);
/// grid.set(1, 2, TileType::Chest);
/// assert_eq!(grid.get(1, 2), TileType::Chest);
/// assert_eq!(grid.get(-1, 0), TileType::Wall);
/// assert_eq!(grid.get(0, 4), TileType::Wall);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    size: i32,
    boundary: TileType,
    cells: Vec<TileType>,
}

impl TileGrid {
    /// Creates a `size`×`size` grid filled with `fill`.
    pub fn new(size: i32, fill: TileType, boundary: TileType) -> Self {
        assert!(size > 0, "tile grid must have a positive size");
        Self {
            size,
            boundary,
            cells: vec![fill; (size * size) as usize],
        }
    }

    /// Empty overworld grid: all Sea, Sea outside.
    pub fn overworld() -> Self {
        Self::new(OVERWORLD_SIZE, TileType::Sea, TileType::Sea)
    }

    /// Empty interior grid: all Floor, Wall outside.
    pub fn interior() -> Self {
        Self::new(INTERIOR_SIZE, TileType::Floor, TileType::Wall)
    }

    /// Edge length of the grid.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Tile returned for out-of-bounds reads.
    pub fn boundary(&self) -> TileType {
        self.boundary
    }

    /// Checks whether a cell lies inside the grid.
    pub fn contains(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && row < self.size && col < self.size
    }

    /// Reads a cell, returning the boundary tile when out of bounds.
    pub fn get(&self, row: i32, col: i32) -> TileType {
        if self.contains(row, col) {
            self.cells[(row * self.size + col) as usize]
        } else {
            self.boundary
        }
    }

    /// Reads a cell by position.
    pub fn at(&self, pos: Position) -> TileType {
        self.get(pos.row, pos.col)
    }

    /// Writes a cell. Out-of-bounds writes are ignored.
    pub fn set(&mut self, row: i32, col: i32, tile: TileType) {
        if self.contains(row, col) {
            self.cells[(row * self.size + col) as usize] = tile;
        }
    }

    /// Fills the half-open rectangle `[top, bottom) × [left, right)`.
    pub fn fill_rect(&mut self, top: i32, left: i32, bottom: i32, right: i32, tile: TileType) {
        for row in top..bottom {
            for col in left..right {
                self.set(row, col, tile);
            }
        }
    }

    /// Iterates over every in-bounds position in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| Position::new(row, col)))
    }

    /// Checks that the grid is `expected`×`expected` and fully backed.
    ///
    /// Grids built through [`TileGrid::new`] always pass; deserialized ones
    /// may not.
    pub fn validate(&self, expected: i32) -> DraponResult<()> {
        if self.size != expected {
            return Err(DraponError::InvalidState(format!(
                "grid size {} is not {}",
                self.size, expected
            )));
        }
        let cells = (self.size as usize).pow(2);
        if self.cells.len() != cells {
            return Err(DraponError::InvalidState(format!(
                "grid holds {} cells, expected {}",
                self.cells.len(),
                cells
            )));
        }
        Ok(())
    }

    /// Counts cells holding `tile`.
    pub fn count(&self, tile: TileType) -> usize {
        self.cells.iter().filter(|&&cell| cell == tile).count()
    }
}

/// The three generated layers plus the chest placed in the cave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// 128×128 overworld
    pub overworld: TileGrid,
    /// 16×16 building interior
    pub building: TileGrid,
    /// 16×16 maze cave
    pub cave: TileGrid,
    /// Cave cell holding the chest
    pub chest_location: Position,
}

impl World {
    /// Grid backing a layer.
    pub fn grid(&self, layer: Layer) -> &TileGrid {
        match layer {
            Layer::Overworld => &self.overworld,
            Layer::Building => &self.building,
            Layer::Cave => &self.cave,
        }
    }

    /// Bounds-safe tile query; never fails.
    ///
    /// Out-of-bounds reads return Sea on the overworld and Wall indoors.
    pub fn tile_at(&self, layer: Layer, row: i32, col: i32) -> TileType {
        self.grid(layer).get(row, col)
    }

    /// Checks every layer's shape and that the chest lies inside the cave.
    pub fn validate(&self) -> DraponResult<()> {
        self.overworld.validate(OVERWORLD_SIZE)?;
        self.building.validate(INTERIOR_SIZE)?;
        self.cave.validate(INTERIOR_SIZE)?;
        let chest = self.chest_location;
        if !self.cave.contains(chest.row, chest.col) {
            return Err(DraponError::InvalidState(format!(
                "chest at {:?} lies outside the cave",
                chest
            )));
        }
        Ok(())
    }

    /// Whether the player could stand on a cell.
    pub fn is_walkable(&self, layer: Layer, pos: Position) -> bool {
        self.grid(layer).at(pos).is_walkable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkability_excludes_only_sea_and_wall() {
        assert!(!TileType::Sea.is_walkable());
        assert!(!TileType::Wall.is_walkable());
        assert!(TileType::Chest.is_walkable());
        assert!(TileType::Bridge.is_walkable());
        assert!(TileType::Mountain.is_walkable());
    }

    #[test]
    fn test_entrances() {
        assert_eq!(TileType::Town.entrance_to(), Some(Layer::Building));
        assert_eq!(TileType::Castle.entrance_to(), Some(Layer::Building));
        assert_eq!(TileType::Cave.entrance_to(), Some(Layer::Cave));
        assert_eq!(TileType::Plains.entrance_to(), None);
    }

    #[test]
    fn test_grid_out_of_bounds_defaults() {
        let overworld = TileGrid::overworld();
        assert_eq!(overworld.get(-1, 5), TileType::Sea);
        assert_eq!(overworld.get(5, 128), TileType::Sea);

        let interior = TileGrid::interior();
        assert_eq!(interior.get(16, 0), TileType::Wall);
        assert_eq!(interior.get(0, -3), TileType::Wall);
        assert_eq!(interior.get(3, 3), TileType::Floor);
    }

    #[test]
    fn test_fill_rect_is_half_open() {
        let mut grid = TileGrid::new(8, TileType::Sea, TileType::Sea);
        grid.fill_rect(1, 1, 3, 4, TileType::Plains);
        assert_eq!(grid.count(TileType::Plains), 6);
        assert_eq!(grid.get(3, 1), TileType::Sea);
        assert_eq!(grid.get(1, 4), TileType::Sea);

        // Clipped rather than panicking
        grid.fill_rect(-5, -5, 2, 2, TileType::Sand);
        assert_eq!(grid.get(0, 0), TileType::Sand);
    }

    #[test]
    fn test_validate_rejects_short_grid() {
        let mut grid = TileGrid::interior();
        assert!(grid.validate(INTERIOR_SIZE).is_ok());
        assert!(matches!(
            grid.validate(OVERWORLD_SIZE),
            Err(DraponError::InvalidState(_))
        ));

        grid.cells.truncate(10);
        assert!(matches!(
            grid.validate(INTERIOR_SIZE),
            Err(DraponError::InvalidState(_))
        ));
    }

    #[test]
    fn test_positions_row_major() {
        let grid = TileGrid::new(3, TileType::Floor, TileType::Wall);
        let positions: Vec<_> = grid.positions().collect();
        assert_eq!(positions.len(), 9);
        assert_eq!(positions[0], Position::new(0, 0));
        assert_eq!(positions[1], Position::new(0, 1));
        assert_eq!(positions[8], Position::new(2, 2));
    }
}
