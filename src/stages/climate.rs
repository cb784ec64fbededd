use anyhow::Result;

use crate::{
    cells::HumidityLevel,
    pipeline::{MapState, Stage, StageContext},
    rng::StageRng,
};

pub const LATITUDE_BANDS: usize = 5;

/// How much of a water neighbor's humidity carries over.
const WATER_CARRY: f32 = 0.8;

/// Humidity before water influence: wet in the first latitude band, dry in
/// the last, temperate in between.
pub fn base_humidity(r: i32, map_height: i32) -> f32 {
    let latitude = r.unsigned_abs() as f32 / map_height.max(1) as f32;
    let band = ((latitude * LATITUDE_BANDS as f32).floor() as usize).min(LATITUDE_BANDS - 1);
    match band {
        0 => 0.8,
        b if b == LATITUDE_BANDS - 1 => 0.2,
        _ => 0.5,
    }
}

/// Single pass in store order. Water neighbors contribute whatever humidity
/// they hold when the cell is visited, so cells later in the order see
/// updated values and earlier ones do not.
pub struct ClimateStage;

impl ClimateStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClimateStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for ClimateStage {
    fn name(&self) -> &str {
        "climate"
    }

    fn run(
        &mut self,
        ctx: &StageContext,
        state: &mut MapState,
        _rng: &mut StageRng<'_>,
    ) -> Result<()> {
        for coord in state.cells.coords() {
            let base = base_humidity(coord.r, ctx.map.height);
            let humidity = state
                .cells
                .neighbors_of(coord)
                .into_iter()
                .filter(|neighbor| neighbor.terrain.is_water())
                .fold(base, |acc, water| acc.max(water.humidity * WATER_CARRY))
                .clamp(0.0, 1.0);
            if let Some(cell) = state.cells.get_mut(coord) {
                cell.set_humidity(humidity, HumidityLevel::from_humidity(humidity));
            }
        }
        Ok(())
    }
}
