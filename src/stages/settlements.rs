use anyhow::Result;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    cells::{BuildType, TerrainType},
    hex::HexCoord,
    pipeline::{MapState, Stage, StageContext},
    rng::StageRng,
};

pub const SECONDARY_CITY_CHANCE: f64 = 0.3;
pub const ROAD_CHANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub coord: HexCoord,
    pub build: BuildType,
    /// Neighbors that received a road when this city was placed.
    pub roads: Vec<HexCoord>,
}

/// Places cities on river plains and sprinkles roads around them.
pub struct SettlementStage;

impl SettlementStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SettlementStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for SettlementStage {
    fn name(&self) -> &str {
        "settlements"
    }

    fn run(
        &mut self,
        ctx: &StageContext,
        state: &mut MapState,
        rng: &mut StageRng<'_>,
    ) -> Result<()> {
        let mut pool: Vec<HexCoord> = state
            .cells
            .all()
            .filter(|cell| cell.terrain == TerrainType::Plain && cell.has_river())
            .map(|cell| cell.coord())
            .collect();
        if pool.is_empty() {
            warn!(run = ctx.run_name, "no plain river cells, skipping settlements");
            return Ok(());
        }

        let span = ctx.map.max_cities.saturating_sub(ctx.map.min_cities) as f64 + 1.0;
        let drawn = ctx.map.min_cities as usize + (rng.gen::<f64>() * span).floor() as usize;
        let city_count = drawn.min(pool.len());
        info!(candidates = pool.len(), city_count, "placing settlements");

        for placed in 0..city_count {
            let coord = pool.remove(rng.gen_range(0..pool.len()));
            let build = if placed == 0 {
                BuildType::PrimaryCity
            } else if rng.gen_bool(SECONDARY_CITY_CHANCE) {
                BuildType::SecondaryCity
            } else {
                BuildType::TertiaryCity
            };
            if let Some(cell) = state.cells.get_mut(coord) {
                cell.build = Some(build);
            }

            let mut roads = Vec::new();
            for neighbor in coord.neighbors() {
                let Some(cell) = state.cells.get_mut(neighbor) else {
                    continue;
                };
                if cell.terrain == TerrainType::Ocean || !rng.gen_bool(ROAD_CHANCE) {
                    continue;
                }
                cell.is_road = true;
                if cell.has_river() {
                    cell.is_bridge = true;
                }
                roads.push(neighbor);
            }
            state.settlements.push(Settlement { coord, build, roads });
        }
        Ok(())
    }
}
