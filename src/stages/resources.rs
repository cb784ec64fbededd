use anyhow::Result;
use rand::{Rng, RngCore};

use crate::{
    cells::{ResourceType, TerrainFace},
    pipeline::{MapState, Stage, StageContext},
    rng::StageRng,
};

/// At most one resource per cell, drawn from the cell's biome.
pub fn roll_resource(face: TerrainFace, rng: &mut impl RngCore) -> Option<ResourceType> {
    match face {
        TerrainFace::Forest => Some(ResourceType::Forest),
        TerrainFace::Desert => rng.gen_bool(0.1).then_some(ResourceType::Mineral),
        TerrainFace::Grassland => rng.gen_bool(0.2).then_some(ResourceType::Agriculture),
        TerrainFace::Swamp => rng.gen_bool(0.3).then_some(ResourceType::Fish),
        _ => None,
    }
}

pub struct ResourceStage;

impl ResourceStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResourceStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for ResourceStage {
    fn name(&self) -> &str {
        "resources"
    }

    fn run(
        &mut self,
        _ctx: &StageContext,
        state: &mut MapState,
        rng: &mut StageRng<'_>,
    ) -> Result<()> {
        for cell in state.cells.all_mut() {
            cell.resource = roll_resource(cell.terrain_face, rng);
        }
        Ok(())
    }
}
