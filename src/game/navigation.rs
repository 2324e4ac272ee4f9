//! # Navigation
//!
//! Player position across the three layers and the rules for moving between
//! cells and layers.
//!
//! The player's logical position is a scroll offset: the top-left corner of
//! the 16×16 viewport. The player always stands at the viewport centre, so
//! the occupied cell is `scroll + (VIEW_CENTER, VIEW_CENTER)`.

use crate::config::{
    ENTRANCE_COLS, ENTRANCE_ROW, INTERIOR_SIZE, OVERWORLD_SIZE, VIEWPORT_SIZE, VIEW_CENTER,
};
use crate::{Direction, GameConfig, Layer, Npc, Position, RandomSource, World};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Inclusive scroll range `(min, max)` for both axes of a layer.
///
/// The overworld keeps the whole viewport inside the map; interiors let the
/// viewport hang over the edge so the centre can reach every cell.
pub fn scroll_bounds(layer: Layer) -> (i32, i32) {
    match layer {
        Layer::Overworld => (0, OVERWORLD_SIZE - VIEWPORT_SIZE),
        Layer::Building | Layer::Cave => (-VIEW_CENTER, INTERIOR_SIZE - 1 - VIEW_CENTER),
    }
}

/// Clamps a scroll offset into the layer's range.
pub fn clamp_scroll(layer: Layer, scroll: Position) -> Position {
    let (min, max) = scroll_bounds(layer);
    Position::new(scroll.row.clamp(min, max), scroll.col.clamp(min, max))
}

/// Cell the player stands on for a given scroll offset.
pub fn player_cell(scroll: Position) -> Position {
    scroll + Position::new(VIEW_CENTER, VIEW_CENTER)
}

/// Scroll offset that puts the player on `cell`.
pub fn scroll_for_cell(cell: Position) -> Position {
    cell - Position::new(VIEW_CENTER, VIEW_CENTER)
}

/// Entrance cell of the building and the cave (left half of the gap).
pub fn entrance_cell() -> Position {
    Position::new(ENTRANCE_ROW, ENTRANCE_COLS[0])
}

/// Per-step encounter probability on a layer.
pub fn encounter_rate(layer: Layer, config: &GameConfig) -> f64 {
    match layer {
        Layer::Overworld => config.overworld_encounter_rate,
        Layer::Cave => config.cave_encounter_rate,
        Layer::Building => 0.0,
    }
}

/// Rolls for a random encounter after a step on `layer`.
pub fn roll_encounter(layer: Layer, config: &GameConfig, rng: &mut dyn RandomSource) -> bool {
    let rate = encounter_rate(layer, config);
    if rate <= 0.0 {
        return false;
    }
    let hit = rng.chance(rate);
    debug!("Encounter roll on {:?} at {:.2}: {}", layer, rate, hit);
    hit
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    /// Target outside the grid or the scroll range
    OutOfRange,
    /// A visible NPC stands there
    Occupied,
    /// Sea or Wall
    NotWalkable,
}

/// Result of a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Nothing changed
    Blocked(BlockReason),
    /// Stepped to a new cell on the same layer
    Moved { from: Position, to: Position },
    /// Stepped onto an entrance and switched into an interior layer
    Entered(Layer),
    /// Walked out of an interior back onto the overworld
    Exited { from: Layer },
}

impl MoveOutcome {
    /// Whether the position changed.
    pub fn is_success(self) -> bool {
        !matches!(self, MoveOutcome::Blocked(_))
    }

    /// Whether the move switched layers.
    pub fn changed_layer(self) -> bool {
        matches!(self, MoveOutcome::Entered(_) | MoveOutcome::Exited { .. })
    }
}

/// Where the player is and how they got there.
///
/// # Examples
///
/// ```
/// use drapon::{Layer, PlayerPosition, Position};
///
/// let position = PlayerPosition::new(Position::new(16, 16));
/// assert_eq!(position.layer, Layer::Overworld);
/// assert_eq!(position.cell(), Position::new(24, 24));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPosition {
    pub layer: Layer,
    /// Viewport origin; the player stands at its centre
    pub scroll: Position,
    pub facing: Direction,
    /// Overworld offset to restore when leaving an interior
    pub saved_overworld: Option<Position>,
}

impl PlayerPosition {
    /// Places the player on the overworld at a scroll offset.
    pub fn new(scroll: Position) -> Self {
        Self {
            layer: Layer::Overworld,
            scroll: clamp_scroll(Layer::Overworld, scroll),
            facing: Direction::Down,
            saved_overworld: None,
        }
    }

    /// The occupied cell on the current layer.
    pub fn cell(&self) -> Position {
        player_cell(self.scroll)
    }

    /// Cell directly in front of the player.
    pub fn facing_cell(&self) -> Position {
        self.cell().step(self.facing)
    }

    /// Applies the movement rules for one step.
    ///
    /// Refused moves leave everything but the facing direction unchanged.
    pub fn step(&mut self, direction: Direction, world: &World, npcs: &[Npc]) -> MoveOutcome {
        self.facing = direction;

        if self.layer != Layer::Overworld
            && direction == Direction::Down
            && self.cell().row == ENTRANCE_ROW
        {
            return self.exit_to_overworld();
        }

        let grid = world.grid(self.layer);
        let from = self.cell();
        let target = from.step(direction);
        let target_scroll = self.scroll + direction.to_delta();

        if !grid.contains(target.row, target.col)
            || clamp_scroll(self.layer, target_scroll) != target_scroll
        {
            return MoveOutcome::Blocked(BlockReason::OutOfRange);
        }
        if npcs.iter().any(|npc| npc.occupies(self.layer, target)) {
            return MoveOutcome::Blocked(BlockReason::Occupied);
        }
        let tile = grid.at(target);
        if !tile.is_walkable() {
            return MoveOutcome::Blocked(BlockReason::NotWalkable);
        }

        self.scroll = clamp_scroll(self.layer, target_scroll);

        if self.layer == Layer::Overworld {
            if let Some(interior) = tile.entrance_to() {
                self.saved_overworld = Some(self.scroll);
                self.layer = interior;
                self.scroll = scroll_for_cell(entrance_cell());
                self.facing = Direction::Up;
                info!("Entered {:?} from overworld cell {:?}", interior, target);
                return MoveOutcome::Entered(interior);
            }
        }

        debug!("Moved {:?} on {:?} to {:?}", direction, self.layer, target);
        MoveOutcome::Moved { from, to: target }
    }

    fn exit_to_overworld(&mut self) -> MoveOutcome {
        let from = self.layer;
        let restored = self
            .saved_overworld
            .take()
            .unwrap_or_else(|| Position::new(0, 0));
        self.layer = Layer::Overworld;
        self.scroll = clamp_scroll(Layer::Overworld, restored);
        self.facing = Direction::Down;
        info!("Left {:?} for overworld offset {:?}", from, self.scroll);
        MoveOutcome::Exited { from }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NpcKind, TileGrid, TileType};

    fn open_world() -> World {
        let mut overworld = TileGrid::overworld();
        overworld.fill_rect(0, 0, 128, 128, TileType::Plains);
        overworld.set(25, 24, TileType::Town);
        overworld.set(24, 23, TileType::Sea);

        let mut building = TileGrid::interior();
        building.fill_rect(0, 0, 16, 1, TileType::Wall);
        World {
            overworld,
            building,
            cave: TileGrid::interior(),
            chest_location: Position::new(1, 1),
        }
    }

    #[test]
    fn test_scroll_bounds() {
        assert_eq!(scroll_bounds(Layer::Overworld), (0, 112));
        assert_eq!(scroll_bounds(Layer::Cave), (-8, 7));
        assert_eq!(
            clamp_scroll(Layer::Building, Position::new(-20, 30)),
            Position::new(-8, 7)
        );
    }

    #[test]
    fn test_move_and_block() {
        let world = open_world();
        let mut position = PlayerPosition::new(Position::new(16, 16));

        let outcome = position.step(Direction::Left, &world, &[]);
        assert_eq!(outcome, MoveOutcome::Blocked(BlockReason::NotWalkable));
        assert_eq!(position.cell(), Position::new(24, 24));
        assert_eq!(position.facing, Direction::Left);

        let outcome = position.step(Direction::Up, &world, &[]);
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                from: Position::new(24, 24),
                to: Position::new(23, 24)
            }
        );
    }

    #[test]
    fn test_npc_blocks() {
        let world = open_world();
        let npcs = vec![Npc::new(
            1,
            Layer::Overworld,
            Position::new(24, 25),
            NpcKind::Wanderer,
            5,
        )];
        let mut position = PlayerPosition::new(Position::new(16, 16));
        assert_eq!(
            position.step(Direction::Right, &world, &npcs),
            MoveOutcome::Blocked(BlockReason::Occupied)
        );
    }

    #[test]
    fn test_overworld_edge_is_idempotent() {
        let world = open_world();
        let mut position = PlayerPosition::new(Position::new(0, 0));
        for _ in 0..3 {
            assert_eq!(
                position.step(Direction::Up, &world, &[]),
                MoveOutcome::Blocked(BlockReason::OutOfRange)
            );
            assert_eq!(position.scroll, Position::new(0, 0));
        }
    }

    #[test]
    fn test_enter_and_exit_restores_offset() {
        let world = open_world();
        let mut position = PlayerPosition::new(Position::new(16, 16));

        assert_eq!(
            position.step(Direction::Down, &world, &[]),
            MoveOutcome::Entered(Layer::Building)
        );
        assert_eq!(position.layer, Layer::Building);
        assert_eq!(position.cell(), Position::new(15, 7));
        assert_eq!(position.saved_overworld, Some(Position::new(17, 16)));

        assert_eq!(
            position.step(Direction::Down, &world, &[]),
            MoveOutcome::Exited {
                from: Layer::Building
            }
        );
        assert_eq!(position.layer, Layer::Overworld);
        assert_eq!(position.scroll, Position::new(17, 16));
        assert_eq!(position.saved_overworld, None);
    }

    #[test]
    fn test_interior_walls_block() {
        let world = open_world();
        let mut position = PlayerPosition::new(Position::new(16, 16));
        position.layer = Layer::Building;
        position.scroll = scroll_for_cell(Position::new(5, 1));
        assert_eq!(
            position.step(Direction::Left, &world, &[]),
            MoveOutcome::Blocked(BlockReason::NotWalkable)
        );
    }

    #[test]
    fn test_encounter_rates_by_layer() {
        let config = GameConfig::default();
        assert_eq!(encounter_rate(Layer::Overworld, &config), 0.03);
        assert_eq!(encounter_rate(Layer::Cave, &config), 0.08);
        assert_eq!(encounter_rate(Layer::Building, &config), 0.0);

        let mut rng = crate::ScriptedRandom::new([crate::Scripted::Chance(true)]);
        assert!(!roll_encounter(Layer::Building, &config, &mut rng));
        assert_eq!(rng.remaining(), 1);
        assert!(roll_encounter(Layer::Cave, &config, &mut rng));
    }
}
