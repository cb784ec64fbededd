//! Run orchestration.
//!
//! A [`Generator`] owns one map request. Every call to `generate` builds a new
//! grid, a new [`MapState`] and a new pipeline, so runs never see each other's
//! cells or random state. The published result is replaced only when a run
//! completes.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::{
    cells::{CellRecord, CellStore},
    config::{MapInfo, RunConfig},
    export::ExportRecord,
    height::HeightSource,
    hex::generate_grid,
    pipeline::{MapState, PipelineBuilder, StageContext, StageReport},
    stages::{HeightThresholds, RiverWalk, Settlement},
};

/// Plain-data result of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedMap {
    pub name: String,
    pub seed: u64,
    pub map: MapInfo,
    pub cells: Vec<CellRecord>,
    pub thresholds: HeightThresholds,
    pub rivers: Vec<RiverWalk>,
    pub settlements: Vec<Settlement>,
    pub stage_reports: Vec<StageReport>,
}

impl GeneratedMap {
    pub fn city_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.build.is_some_and(|b| b.is_city()))
            .count()
    }

    /// The reloadable `{x, y, terrain}` form, in cell order.
    pub fn export_records(&self) -> Vec<ExportRecord> {
        self.cells.iter().map(ExportRecord::from).collect()
    }
}

pub struct Generator {
    name: String,
    seed: u64,
    map: MapInfo,
    latest: Option<GeneratedMap>,
}

impl Generator {
    pub fn new(name: impl Into<String>, seed: u64, map: MapInfo) -> Result<Self> {
        map.validate().context("invalid map request")?;
        Ok(Self {
            name: name.into(),
            seed,
            map,
            latest: None,
        })
    }

    pub fn from_config(config: &RunConfig) -> Result<Self> {
        Self::new(config.name.clone(), config.seed, config.map.clone())
    }

    pub fn map(&self) -> &MapInfo {
        &self.map
    }

    pub fn generate(&mut self, heights: &HeightSource) -> Result<&GeneratedMap> {
        self.generate_with_hook(heights, |_| {})
    }

    /// Runs the full pipeline over a fresh grid. `hook` is called after each
    /// stage. On error the previously published map, if any, stays in place.
    pub fn generate_with_hook<F>(&mut self, heights: &HeightSource, hook: F) -> Result<&GeneratedMap>
    where
        F: FnMut(&StageReport),
    {
        let mut cells = CellStore::from_coords(generate_grid(self.map.width, self.map.height));
        let fixed = heights.apply(&self.map, &mut cells);
        let mut state = MapState::new(cells, fixed);

        let ctx = StageContext {
            run_name: &self.name,
            map: &self.map,
        };
        let mut pipeline = PipelineBuilder::standard(self.seed).build();
        let stage_reports = pipeline
            .run_with_hook(&ctx, &mut state, hook)
            .with_context(|| format!("map generation '{}' failed", self.name))?;

        let MapState {
            cells,
            thresholds,
            rivers,
            settlements,
            ..
        } = state;
        let result = GeneratedMap {
            name: self.name.clone(),
            seed: self.seed,
            map: self.map.clone(),
            cells: cells.export(),
            thresholds,
            rivers,
            settlements,
            stage_reports,
        };
        info!(
            run = %result.name,
            cells = result.cells.len(),
            rivers = result.rivers.len(),
            cities = result.city_count(),
            "map generated"
        );
        Ok(self.latest.insert(result))
    }

    pub fn latest(&self) -> Option<&GeneratedMap> {
        self.latest.as_ref()
    }

    pub fn clear(&mut self) {
        self.latest = None;
    }
}

/// Loads the configured height source and runs one generation.
pub async fn generate_from_config(config: &RunConfig) -> Result<GeneratedMap> {
    let mut generator = Generator::from_config(config)?;
    let heights = HeightSource::load(&config.heights, &config.map, config.seed)
        .await
        .with_context(|| format!("failed to load heights for '{}'", config.name))?;
    let map = generator.generate(&heights)?.clone();
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height::SampleField;

    fn flat_source() -> HeightSource {
        HeightSource::Noise(SampleField::new(1, 1, vec![0.5]).unwrap())
    }

    #[test]
    fn rejects_invalid_request() {
        let map = MapInfo {
            ocean_ratio: 1.5,
            ..MapInfo::new(4, 4)
        };
        assert!(Generator::new("bad", 1, map).is_err());
    }

    #[test]
    fn publishes_result_with_every_cell() {
        let mut generator = Generator::new("flat", 3, MapInfo::new(5, 4)).unwrap();
        assert!(generator.latest().is_none());
        let map = generator.generate(&flat_source()).unwrap();
        assert_eq!(map.cells.len(), 20);
        assert_eq!(map.stage_reports.len(), 8);
        assert_eq!(generator.latest().unwrap().cells.len(), 20);

        generator.clear();
        assert!(generator.latest().is_none());
    }

    #[test]
    fn empty_map_is_not_an_error() {
        let mut generator = Generator::new("empty", 3, MapInfo::new(0, 0)).unwrap();
        let map = generator.generate(&flat_source()).unwrap();
        assert!(map.cells.is_empty());
        assert!(map.rivers.is_empty());
        assert!(map.settlements.is_empty());
    }

    #[test]
    fn export_records_follow_cell_order() {
        let mut generator = Generator::new("order", 3, MapInfo::new(3, 2)).unwrap();
        let map = generator.generate(&flat_source()).unwrap();
        let records = map.export_records();
        assert_eq!(records.len(), map.cells.len());
        for (record, cell) in records.iter().zip(&map.cells) {
            assert_eq!((record.x, record.y), (cell.q, cell.r));
            assert_eq!(record.terrain, cell.terrain.ordinal());
        }
    }
}
