use anyhow::Result;

use crate::{
    cells::{HeightLevel, HumidityLevel, TerrainFace, TerrainType},
    pipeline::{MapState, Stage, StageContext},
    rng::StageRng,
};

pub fn resolve_face(
    terrain: TerrainType,
    humidity: HumidityLevel,
    height: HeightLevel,
) -> TerrainFace {
    match terrain {
        // no sea biome yet
        TerrainType::Ocean => TerrainFace::Grassland,
        TerrainType::Plain => match humidity {
            HumidityLevel::High => TerrainFace::Forest,
            HumidityLevel::Low => TerrainFace::Desert,
            _ => TerrainFace::Grassland,
        },
        TerrainType::Hill if humidity == HumidityLevel::High => TerrainFace::Forest,
        TerrainType::Hill => TerrainFace::Grassland,
        TerrainType::Mountain if height == HeightLevel::Level4 => TerrainFace::Volcano,
        TerrainType::Mountain => TerrainFace::Tundra,
        TerrainType::HighMountain => TerrainFace::Snow,
        TerrainType::Lake => TerrainFace::Swamp,
    }
}

pub struct BiomeStage;

impl BiomeStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BiomeStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for BiomeStage {
    fn name(&self) -> &str {
        "biomes"
    }

    fn run(
        &mut self,
        _ctx: &StageContext,
        state: &mut MapState,
        _rng: &mut StageRng<'_>,
    ) -> Result<()> {
        for cell in state.cells.all_mut() {
            cell.terrain_face = resolve_face(cell.terrain, cell.humidity_level, cell.height_level);
        }
        Ok(())
    }
}
