//! # World Generation
//!
//! Runs the layer builders in order and assembles the finished [`World`].

use super::{
    BuildingGenerator, CaveGenerator, GenerationConfig, Generator, NpcPlacer, OverworldGenerator,
};
use crate::{DraponResult, Npc, RandomSource, World};
use log::info;
use serde::{Deserialize, Serialize};

/// A generated world and the NPCs placed in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedWorld {
    pub world: World,
    pub npcs: Vec<Npc>,
}

/// One-shot builder for all three layers plus NPCs.
///
/// # Examples
///
/// ```
/// use drapon::{create_rng, GenerationConfig, Generator, Layer, TileType, WorldGenerator};
///
/// let config = GenerationConfig::new(3);
/// let generated = WorldGenerator::new().generate(&config, &mut create_rng(&config));
/// assert_eq!(generated.world.tile_at(Layer::Overworld, -1, -1), TileType::Sea);
/// assert_eq!(generated.world.tile_at(Layer::Cave, 99, 0), TileType::Wall);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorldGenerator {
    pub overworld: OverworldGenerator,
    pub building: BuildingGenerator,
    pub cave: CaveGenerator,
}

impl WorldGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Generator<GeneratedWorld> for WorldGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut dyn RandomSource) -> GeneratedWorld {
        let overworld = self.overworld.generate(config, rng);
        let building = self.building.generate(config, rng);
        let cave = self.cave.generate(config, rng);

        let world = World {
            overworld,
            building,
            cave: cave.grid,
            chest_location: cave.chest,
        };
        let npcs = NpcPlacer::new(&world).generate(config, rng);
        info!(
            "Generated world for seed {}: chest at {:?}, {} NPCs",
            config.seed,
            world.chest_location,
            npcs.len()
        );
        GeneratedWorld { world, npcs }
    }

    fn validate(&self, content: &GeneratedWorld, config: &GenerationConfig) -> DraponResult<()> {
        self.overworld.validate(&content.world.overworld, config)?;
        self.building.validate(&content.world.building, config)?;
        let cave = crate::CaveLayout {
            grid: content.world.cave.clone(),
            chest: content.world.chest_location,
            used_fallback: content.world.chest_location == crate::FALLBACK_CHEST,
        };
        self.cave.validate(&cave, config)?;
        NpcPlacer::new(&content.world).validate(&content.npcs, config)
    }

    fn generator_type(&self) -> &'static str {
        "World"
    }
}

/// Generates a complete world from a seed.
pub fn generate_world(seed: u64) -> GeneratedWorld {
    let config = GenerationConfig::new(seed);
    let mut rng = super::create_rng(&config);
    WorldGenerator::new().generate(&config, &mut rng)
}
