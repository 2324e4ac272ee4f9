//! # NPC Placement
//!
//! Fixed NPCs stand at known cells; villagers are scattered through the
//! building hall by rejection sampling over walkable, unoccupied cells.

use super::{GenerationConfig, Generator, Rect, SHOP_CELL};
use crate::{
    DraponError, DraponResult, Layer, Npc, NpcKind, Position, RandomSource, TileType, World,
};
use log::{debug, warn};

/// Open hall rows/cols villagers may be placed in.
pub const VILLAGER_AREA: Rect = Rect::new(9, 1, 13, 15);

/// Dialogue script each kind of NPC speaks.
pub fn script_for(kind: NpcKind) -> usize {
    match kind {
        NpcKind::Villager => 1,
        NpcKind::Guard => 2,
        NpcKind::Merchant => 3,
        NpcKind::King => 4,
        NpcKind::Wanderer => 5,
    }
}

/// NPCs with a fixed home cell.
pub const FIXED_NPCS: [(Layer, Position, NpcKind); 4] = [
    (Layer::Overworld, Position { row: 24, col: 26 }, NpcKind::Wanderer),
    (Layer::Building, Position { row: 4, col: 4 }, NpcKind::King),
    (Layer::Building, Position { row: 4, col: 10 }, NpcKind::Merchant),
    (Layer::Building, Position { row: 13, col: 5 }, NpcKind::Guard),
];

/// Places every NPC into a generated world.
#[derive(Debug, Clone)]
pub struct NpcPlacer<'a> {
    pub world: &'a World,
}

impl<'a> NpcPlacer<'a> {
    pub fn new(world: &'a World) -> Self {
        Self { world }
    }

    fn is_free(&self, npcs: &[Npc], layer: Layer, pos: Position) -> bool {
        let tile = self.world.tile_at(layer, pos.row, pos.col);
        tile.is_walkable()
            && tile != TileType::Shop
            && !npcs.iter().any(|npc| npc.layer == layer && npc.position == pos)
    }

    /// Samples a free cell in `area`, falling back to the first free cell in
    /// row-major order when sampling keeps missing.
    fn sample_cell(
        &self,
        npcs: &[Npc],
        layer: Layer,
        area: Rect,
        attempts: u32,
        rng: &mut dyn RandomSource,
    ) -> Option<Position> {
        let height = (area.bottom - area.top).max(1) as usize;
        let width = (area.right - area.left).max(1) as usize;
        for _ in 0..attempts {
            let pos = Position::new(
                area.top + rng.below(height) as i32,
                area.left + rng.below(width) as i32,
            );
            if self.is_free(npcs, layer, pos) {
                return Some(pos);
            }
        }
        area.positions().find(|&pos| self.is_free(npcs, layer, pos))
    }
}

impl Generator<Vec<Npc>> for NpcPlacer<'_> {
    fn generate(&self, config: &GenerationConfig, rng: &mut dyn RandomSource) -> Vec<Npc> {
        let mut npcs: Vec<Npc> = Vec::new();
        let mut next_id = 1;

        for (layer, position, kind) in FIXED_NPCS {
            npcs.push(Npc::new(next_id, layer, position, kind, script_for(kind)));
            next_id += 1;
        }

        for _ in 0..config.villager_count {
            match self.sample_cell(
                &npcs,
                Layer::Building,
                VILLAGER_AREA,
                config.max_placement_attempts,
                rng,
            ) {
                Some(position) => {
                    let kind = NpcKind::Villager;
                    npcs.push(Npc::new(next_id, Layer::Building, position, kind, script_for(kind)));
                    next_id += 1;
                }
                None => warn!("No free cell left for a villager"),
            }
        }
        debug!("Placed {} NPCs", npcs.len());
        npcs
    }

    fn validate(&self, npcs: &Vec<Npc>, _config: &GenerationConfig) -> DraponResult<()> {
        for (index, npc) in npcs.iter().enumerate() {
            if !self
                .world
                .tile_at(npc.layer, npc.position.row, npc.position.col)
                .is_walkable()
            {
                return Err(DraponError::GenerationFailed(format!(
                    "NPC {} stands on an unwalkable tile",
                    npc.id
                )));
            }
            if npc.layer == Layer::Building && npc.position == SHOP_CELL {
                return Err(DraponError::GenerationFailed(format!(
                    "NPC {} blocks the shop counter",
                    npc.id
                )));
            }
            let clash = npcs[index + 1..]
                .iter()
                .any(|other| other.layer == npc.layer && other.position == npc.position);
            if clash {
                return Err(DraponError::GenerationFailed(format!(
                    "NPC {} shares a cell",
                    npc.id
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "NpcPlacer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate_world, Scripted, ScriptedRandom};

    #[test]
    fn test_fixed_npcs_present() {
        let generated = generate_world(11);
        let kinds: Vec<NpcKind> = generated.npcs.iter().map(|npc| npc.kind).collect();
        assert!(kinds.contains(&NpcKind::King));
        assert!(kinds.contains(&NpcKind::Merchant));
        assert!(kinds.contains(&NpcKind::Wanderer));
    }

    #[test]
    fn test_rejection_sampling_retries_occupied_cells() {
        let generated = generate_world(11);
        let placer = NpcPlacer::new(&generated.world);
        let config = GenerationConfig {
            villager_count: 2,
            ..GenerationConfig::for_testing(0)
        };
        // Both villagers roll the same cell first; the second must re-roll.
        let mut rng = ScriptedRandom::new([
            Scripted::Index(1),
            Scripted::Index(2),
            Scripted::Index(1),
            Scripted::Index(2),
            Scripted::Index(2),
            Scripted::Index(6),
        ]);
        let npcs = placer.generate(&config, &mut rng);
        let villagers: Vec<Position> = npcs
            .iter()
            .filter(|npc| npc.kind == NpcKind::Villager)
            .map(|npc| npc.position)
            .collect();
        assert_eq!(villagers, vec![Position::new(10, 3), Position::new(11, 7)]);
        assert!(placer.validate(&npcs, &config).is_ok());
    }

    #[test]
    fn test_exhausted_sampling_falls_back_to_scan() {
        let generated = generate_world(11);
        let placer = NpcPlacer::new(&generated.world);
        let config = GenerationConfig {
            villager_count: 1,
            max_placement_attempts: 0,
            ..GenerationConfig::for_testing(0)
        };
        let npcs = placer.generate(&config, &mut ScriptedRandom::default());
        let villager = npcs.iter().find(|npc| npc.kind == NpcKind::Villager);
        assert_eq!(villager.map(|npc| npc.position), Some(Position::new(9, 1)));
    }
}
