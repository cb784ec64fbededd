//! Ordered stage driver.
//!
//! Stages run strictly in registration order over a shared [`MapState`]. Each
//! stage draws from its own named random stream, so adding randomness to one
//! stage does not perturb the others. Timing and logging live here; stage
//! code only transforms cells.

use std::{collections::HashSet, time::Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    cells::CellStore,
    config::MapInfo,
    hex::HexCoord,
    rng::{RngManager, StageRng},
    stages::{
        BiomeStage, ClimateStage, HeightLevelStage, HeightThresholds, ResourceStage, RiverStage,
        RiverWalk, Settlement, SettlementStage, TerrainStage, ThresholdStage,
    },
};

/// Working state for one generation run.
#[derive(Debug, Default)]
pub struct MapState {
    pub cells: CellStore,
    pub thresholds: HeightThresholds,
    /// Cells whose terrain came from the height source.
    pub fixed_terrain: HashSet<HexCoord>,
    pub rivers: Vec<RiverWalk>,
    pub settlements: Vec<Settlement>,
}

impl MapState {
    pub fn new(cells: CellStore, fixed_terrain: HashSet<HexCoord>) -> Self {
        Self {
            cells,
            fixed_terrain,
            ..Self::default()
        }
    }

    pub fn is_fixed(&self, coord: HexCoord) -> bool {
        self.fixed_terrain.contains(&coord)
    }
}

pub struct StageContext<'a> {
    pub run_name: &'a str,
    pub map: &'a MapInfo,
}

pub trait Stage {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &StageContext,
        state: &mut MapState,
        rng: &mut StageRng<'_>,
    ) -> Result<()>;
}

#[derive(Clone, Debug, Serialize)]
pub struct StageReport {
    pub name: String,
    pub duration_ms: f64,
}

pub struct PipelineBuilder {
    seed: u64,
    stages: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stages: Vec::new(),
        }
    }

    /// The full eight-stage map generation sequence.
    pub fn standard(seed: u64) -> Self {
        Self::new(seed)
            .with_stage(ThresholdStage::new())
            .with_stage(HeightLevelStage::new())
            .with_stage(TerrainStage::new())
            .with_stage(RiverStage::new())
            .with_stage(ClimateStage::new())
            .with_stage(BiomeStage::new())
            .with_stage(ResourceStage::new())
            .with_stage(SettlementStage::new())
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn push_stage(&mut self, stage: impl Stage + 'static) {
        self.stages.push(Box::new(stage));
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            rng: RngManager::new(self.seed),
            stages: self.stages,
        }
    }
}

pub struct Pipeline {
    rng: RngManager,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(&mut self, ctx: &StageContext, state: &mut MapState) -> Result<Vec<StageReport>> {
        self.run_with_hook(ctx, state, |_| {})
    }

    /// Runs every stage once, calling `hook` after each one finishes.
    pub fn run_with_hook<F>(
        &mut self,
        ctx: &StageContext,
        state: &mut MapState,
        mut hook: F,
    ) -> Result<Vec<StageReport>>
    where
        F: FnMut(&StageReport),
    {
        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &mut self.stages {
            debug!(run = ctx.run_name, stage = stage.name(), "stage starting");
            let start = Instant::now();
            let mut rng_stream = self.rng.stream(stage.name());
            stage
                .run(ctx, state, &mut rng_stream)
                .with_context(|| format!("stage '{}' failed", stage.name()))?;
            debug!(
                stream = rng_stream.name(),
                words_drawn = %rng_stream.word_pos(),
                "stage rng usage"
            );
            let report = StageReport {
                name: stage.name().to_string(),
                duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
            };
            info!(
                run = ctx.run_name,
                stage = %report.name,
                duration_ms = report.duration_ms,
                "stage finished"
            );
            hook(&report);
            reports.push(report);
        }
        Ok(reports)
    }
}
