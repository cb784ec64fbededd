use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::{
    cells::HeightLevel,
    pipeline::{MapState, Stage, StageContext},
    rng::StageRng,
};

/// Height cut points derived from the run's own height distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct HeightThresholds {
    pub height1: f32,
    pub height2: f32,
    pub height3: f32,
    pub height4: f32,
}

impl HeightThresholds {
    /// `height1` sits at the `ocean_ratio` percentile and `height4` at
    /// `1 - mountain_ratio`; the middle two split the gap at 33% and 66%.
    pub fn from_heights(mut heights: Vec<f32>, ocean_ratio: f64, mountain_ratio: f64) -> Self {
        if heights.is_empty() {
            return Self::default();
        }
        heights.sort_by(|a, b| a.total_cmp(b));
        let n = heights.len();
        let at = |ratio: f64| {
            let index = (n as f64 * ratio).floor().max(0.0) as usize;
            heights[index.min(n - 1)]
        };
        let height1 = at(ocean_ratio);
        let height4 = at(1.0 - mountain_ratio);
        let span = height4 - height1;
        Self {
            height1,
            height2: height1 + span * 0.33,
            height3: height1 + span * 0.66,
            height4,
        }
    }

    pub fn level_for(&self, height: f32) -> HeightLevel {
        if height < self.height1 {
            HeightLevel::None
        } else if height < self.height2 {
            HeightLevel::Level1
        } else if height < self.height3 {
            HeightLevel::Level2
        } else if height < self.height4 {
            HeightLevel::Level3
        } else {
            HeightLevel::Level4
        }
    }
}

pub struct ThresholdStage;

impl ThresholdStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThresholdStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for ThresholdStage {
    fn name(&self) -> &str {
        "thresholds"
    }

    fn run(
        &mut self,
        ctx: &StageContext,
        state: &mut MapState,
        _rng: &mut StageRng<'_>,
    ) -> Result<()> {
        let heights = state.cells.all().map(|cell| cell.height).collect();
        state.thresholds =
            HeightThresholds::from_heights(heights, ctx.map.ocean_ratio, ctx.map.mountain_ratio);
        debug!(thresholds = ?state.thresholds, "height thresholds computed");
        Ok(())
    }
}

pub struct HeightLevelStage;

impl HeightLevelStage {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeightLevelStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for HeightLevelStage {
    fn name(&self) -> &str {
        "height_levels"
    }

    fn run(
        &mut self,
        _ctx: &StageContext,
        state: &mut MapState,
        _rng: &mut StageRng<'_>,
    ) -> Result<()> {
        let thresholds = state.thresholds;
        let fixed = &state.fixed_terrain;
        for cell in state.cells.all_mut() {
            if fixed.contains(&cell.coord()) {
                continue;
            }
            cell.height_level = thresholds.level_for(cell.height);
        }
        Ok(())
    }
}
