//! Summary statistics over a finished map.
//!
//! Every collector reads the exported cell sequence and returns entries under
//! its own key prefix (`terrain/`, `rivers/`, ...). The coordinator merges
//! them into a single flat [`Report`].

mod collectors;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cells::CellRecord;

pub use collectors::{
    CityCollector, ClimateCollector, FeatureCollector, InfrastructureCollector, LevelCollector,
    RangeCollector, ResourceCollector, RiverCollector, TerrainCollector,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Scalar(f64),
    Map(BTreeMap<String, f64>),
}

impl StatValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            StatValue::Scalar(value) => Some(*value),
            StatValue::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            StatValue::Map(map) => Some(map),
            StatValue::Scalar(_) => None,
        }
    }
}

pub type Report = BTreeMap<String, StatValue>;

pub trait Collector: Send {
    fn name(&self) -> &str;
    fn collect(&self, cells: &[CellRecord]) -> Report;
}

#[derive(Default)]
pub struct StatisticsCoordinator {
    collectors: Vec<Box<dyn Collector>>,
}

impl StatisticsCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_collectors() -> Self {
        Self::new()
            .with_collector(TerrainCollector)
            .with_collector(ResourceCollector)
            .with_collector(RiverCollector)
            .with_collector(ClimateCollector)
            .with_collector(LevelCollector)
            .with_collector(CityCollector)
            .with_collector(InfrastructureCollector)
            .with_collector(FeatureCollector)
            .with_collector(RangeCollector)
    }

    pub fn with_collector(mut self, collector: impl Collector + 'static) -> Self {
        self.collectors.push(Box::new(collector));
        self
    }

    pub fn collector_names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Runs every collector and merges the results. Collectors own disjoint
    /// prefixes, so the merge order does not change the report.
    pub fn generate(&self, cells: &[CellRecord]) -> Report {
        let mut report = Report::new();
        for collector in &self.collectors {
            report.extend(collector.collect(cells));
        }
        report
    }
}

pub fn log_report(report: &Report) {
    for (key, value) in report {
        match value {
            StatValue::Scalar(v) => info!(stat = %key, value = v, "map statistic"),
            StatValue::Map(entries) => {
                let rendered = entries
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                info!(stat = %key, value = %rendered, "map statistic");
            }
        }
    }
}

/// Share of `count` in `total`; 0 for an empty map.
pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cells::{CellStore, TerrainType},
        hex::generate_grid,
    };

    fn sample_cells() -> Vec<CellRecord> {
        let mut store = CellStore::from_coords(generate_grid(4, 4));
        for (i, cell) in store.all_mut().enumerate() {
            cell.terrain = TerrainType::ALL[i % TerrainType::ALL.len()];
            cell.height = i as f32 / 16.0;
            cell.humidity = 0.5;
            cell.river_level = u8::from(i % 3 == 0);
        }
        store.export()
    }

    #[test]
    fn default_collectors_cover_every_namespace() {
        let report = StatisticsCoordinator::with_default_collectors().generate(&sample_cells());
        for key in [
            "terrain/counts",
            "terrain/proportions",
            "resources/counts",
            "resources/terrain_distribution",
            "rivers/count",
            "rivers/proportion",
            "rivers/adjacent_count",
            "climate/zones",
            "height/counts",
            "humidity/counts",
            "cities/counts",
            "cities/terrain_distribution",
            "infrastructure/roads",
            "infrastructure/bridges",
            "features/volcanoes",
            "features/snow",
            "ranges/min_height",
            "ranges/max_height",
            "ranges/avg_humidity",
        ] {
            assert!(report.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn collectors_register_in_order() {
        let coordinator = StatisticsCoordinator::with_default_collectors();
        assert_eq!(
            coordinator.collector_names(),
            vec![
                "terrain",
                "resources",
                "rivers",
                "climate",
                "levels",
                "cities",
                "infrastructure",
                "features",
                "ranges"
            ]
        );
        assert!(StatisticsCoordinator::new().collector_names().is_empty());
    }

    #[test]
    fn merge_order_does_not_matter() {
        let cells = sample_cells();
        let forward = StatisticsCoordinator::new()
            .with_collector(TerrainCollector)
            .with_collector(RiverCollector)
            .with_collector(RangeCollector)
            .generate(&cells);
        let backward = StatisticsCoordinator::new()
            .with_collector(RangeCollector)
            .with_collector(RiverCollector)
            .with_collector(TerrainCollector)
            .generate(&cells);
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_map_has_no_nan() {
        let report = StatisticsCoordinator::with_default_collectors().generate(&[]);
        for (key, value) in &report {
            match value {
                StatValue::Scalar(v) => assert!(v.is_finite(), "{key}"),
                StatValue::Map(entries) => {
                    assert!(entries.values().all(|v| v.is_finite()), "{key}")
                }
            }
        }
    }

    #[test]
    fn report_serializes_flat() {
        let mut report = Report::new();
        report.insert("rivers/count".into(), StatValue::Scalar(3.0));
        report.insert(
            "terrain/counts".into(),
            StatValue::Map(BTreeMap::from([("Ocean".to_string(), 2.0)])),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["rivers/count"], 3.0);
        assert_eq!(json["terrain/counts"]["Ocean"], 2.0);
    }
}
