use anyhow::Result;
use rand::{Rng, RngCore};

use crate::{
    cells::{HeightLevel, TerrainType},
    pipeline::{MapState, Stage, StageContext},
    rng::StageRng,
};

/// Terrain for a height level. Boundary levels are split at random between
/// the two neighbouring terrain kinds.
pub fn classify(level: HeightLevel, rng: &mut impl RngCore) -> TerrainType {
    match level {
        HeightLevel::None => TerrainType::Ocean,
        HeightLevel::Level1 => TerrainType::Plain,
        HeightLevel::Level2 => {
            if rng.gen_bool(0.5) {
                TerrainType::Hill
            } else {
                TerrainType::Plain
            }
        }
        HeightLevel::Level3 => {
            if rng.gen_bool(0.5) {
                TerrainType::Mountain
            } else {
                TerrainType::Hill
            }
        }
        HeightLevel::Level4 => {
            if rng.gen_bool(0.8) {
                TerrainType::HighMountain
            } else {
                TerrainType::Mountain
            }
        }
    }
}

pub struct TerrainStage;

impl TerrainStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerrainStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for TerrainStage {
    fn name(&self) -> &str {
        "terrain"
    }

    fn run(
        &mut self,
        _ctx: &StageContext,
        state: &mut MapState,
        rng: &mut StageRng<'_>,
    ) -> Result<()> {
        let fixed = &state.fixed_terrain;
        for cell in state.cells.all_mut() {
            if fixed.contains(&cell.coord()) {
                continue;
            }
            cell.terrain = classify(cell.height_level, rng);
        }
        Ok(())
    }
}
