use std::collections::{BTreeMap, HashSet};

use crate::{
    cells::{BuildType, CellRecord, HeightLevel, HumidityLevel, ResourceType, TerrainFace, TerrainType},
    hex::HexCoord,
};

use super::{ratio, Collector, Report, StatValue};

fn zeroed<T: ToString>(keys: impl IntoIterator<Item = T>) -> BTreeMap<String, f64> {
    keys.into_iter().map(|k| (k.to_string(), 0.0)).collect()
}

fn bump(map: &mut BTreeMap<String, f64>, key: impl Into<String>) {
    *map.entry(key.into()).or_insert(0.0) += 1.0;
}

fn count_where(cells: &[CellRecord], pred: impl Fn(&CellRecord) -> bool) -> f64 {
    cells.iter().filter(|cell| pred(cell)).count() as f64
}

pub struct TerrainCollector;

impl Collector for TerrainCollector {
    fn name(&self) -> &str {
        "terrain"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        let mut counts = zeroed(TerrainType::ALL);
        for cell in cells {
            bump(&mut counts, cell.terrain.as_str());
        }
        let proportions = counts
            .iter()
            .map(|(k, v)| (k.clone(), ratio(*v as usize, cells.len())))
            .collect();
        Report::from([
            ("terrain/counts".into(), StatValue::Map(counts)),
            ("terrain/proportions".into(), StatValue::Map(proportions)),
        ])
    }
}

pub struct ResourceCollector;

impl Collector for ResourceCollector {
    fn name(&self) -> &str {
        "resources"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        let mut counts = zeroed(ResourceType::ALL);
        let mut by_terrain = BTreeMap::new();
        for cell in cells {
            if let Some(resource) = cell.resource {
                bump(&mut counts, resource.as_str());
                bump(&mut by_terrain, format!("{}/{}", cell.terrain, resource));
            }
        }
        Report::from([
            ("resources/counts".into(), StatValue::Map(counts)),
            ("resources/terrain_distribution".into(), StatValue::Map(by_terrain)),
        ])
    }
}

pub struct RiverCollector;

impl Collector for RiverCollector {
    fn name(&self) -> &str {
        "rivers"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        let river: HashSet<HexCoord> = cells
            .iter()
            .filter(|cell| cell.has_river())
            .map(CellRecord::coord)
            .collect();
        // non-river cells with at least one river neighbor
        let adjacent = cells
            .iter()
            .filter(|cell| !cell.has_river())
            .filter(|cell| cell.coord().neighbors().iter().any(|n| river.contains(n)))
            .count();
        Report::from([
            ("rivers/count".into(), StatValue::Scalar(river.len() as f64)),
            (
                "rivers/proportion".into(),
                StatValue::Scalar(ratio(river.len(), cells.len())),
            ),
            ("rivers/adjacent_count".into(), StatValue::Scalar(adjacent as f64)),
        ])
    }
}

pub struct ClimateCollector;

impl Collector for ClimateCollector {
    fn name(&self) -> &str {
        "climate"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        let mut zones = BTreeMap::new();
        for cell in cells {
            bump(&mut zones, format!("{}-{}", cell.height_level, cell.humidity_level));
        }
        Report::from([("climate/zones".into(), StatValue::Map(zones))])
    }
}

/// Height and humidity level histograms.
pub struct LevelCollector;

impl Collector for LevelCollector {
    fn name(&self) -> &str {
        "levels"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        let mut heights = zeroed(HeightLevel::ALL);
        let mut humidity = zeroed(HumidityLevel::ALL);
        for cell in cells {
            bump(&mut heights, cell.height_level.as_str());
            bump(&mut humidity, cell.humidity_level.as_str());
        }
        Report::from([
            ("height/counts".into(), StatValue::Map(heights)),
            ("humidity/counts".into(), StatValue::Map(humidity)),
        ])
    }
}

pub struct CityCollector;

impl Collector for CityCollector {
    fn name(&self) -> &str {
        "cities"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        let mut counts = zeroed([
            BuildType::PrimaryCity,
            BuildType::SecondaryCity,
            BuildType::TertiaryCity,
        ]);
        let mut by_terrain = BTreeMap::new();
        for cell in cells {
            if let Some(build) = cell.build.filter(|b| b.is_city()) {
                bump(&mut counts, build.as_str());
                bump(&mut by_terrain, cell.terrain.as_str());
            }
        }
        Report::from([
            ("cities/counts".into(), StatValue::Map(counts)),
            ("cities/terrain_distribution".into(), StatValue::Map(by_terrain)),
        ])
    }
}

pub struct InfrastructureCollector;

impl Collector for InfrastructureCollector {
    fn name(&self) -> &str {
        "infrastructure"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        Report::from([
            (
                "infrastructure/roads".into(),
                StatValue::Scalar(count_where(cells, |c| c.is_road)),
            ),
            (
                "infrastructure/bridges".into(),
                StatValue::Scalar(count_where(cells, |c| c.is_bridge)),
            ),
        ])
    }
}

pub struct FeatureCollector;

impl Collector for FeatureCollector {
    fn name(&self) -> &str {
        "features"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        Report::from([
            (
                "features/volcanoes".into(),
                StatValue::Scalar(count_where(cells, |c| c.terrain_face == TerrainFace::Volcano)),
            ),
            (
                "features/snow".into(),
                StatValue::Scalar(count_where(cells, |c| c.terrain_face == TerrainFace::Snow)),
            ),
        ])
    }
}

pub struct RangeCollector;

impl Collector for RangeCollector {
    fn name(&self) -> &str {
        "ranges"
    }

    fn collect(&self, cells: &[CellRecord]) -> Report {
        let (min, max, humidity_sum) = cells.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY, 0.0),
            |(min, max, sum), cell| {
                let h = f64::from(cell.height);
                (min.min(h), max.max(h), sum + f64::from(cell.humidity))
            },
        );
        let (min, max, avg) = if cells.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (min, max, humidity_sum / cells.len() as f64)
        };
        Report::from([
            ("ranges/min_height".into(), StatValue::Scalar(min)),
            ("ranges/max_height".into(), StatValue::Scalar(max)),
            ("ranges/avg_humidity".into(), StatValue::Scalar(avg)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(q: i32, r: i32, terrain: TerrainType) -> CellRecord {
        let mut cell = CellRecord::new(HexCoord::new(q, r));
        cell.terrain = terrain;
        cell
    }

    fn scalar(report: &Report, key: &str) -> f64 {
        report[key].as_scalar().unwrap()
    }

    fn map<'a>(report: &'a Report, key: &str) -> &'a BTreeMap<String, f64> {
        report[key].as_map().unwrap()
    }

    #[test]
    fn terrain_counts_sum_to_cell_count() {
        let cells = vec![
            cell(0, 0, TerrainType::Ocean),
            cell(1, 0, TerrainType::Ocean),
            cell(2, 0, TerrainType::Plain),
            cell(3, 0, TerrainType::Lake),
        ];
        let report = TerrainCollector.collect(&cells);
        let counts = map(&report, "terrain/counts");
        assert_eq!(counts.len(), TerrainType::ALL.len());
        assert_eq!(counts.values().sum::<f64>(), 4.0);
        assert_eq!(counts["Hill"], 0.0);
        let proportions = map(&report, "terrain/proportions");
        assert!((proportions.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(proportions["Ocean"], 0.5);
    }

    #[test]
    fn resources_keyed_by_terrain() {
        let mut forest = cell(0, 0, TerrainType::Hill);
        forest.resource = Some(ResourceType::Forest);
        let mut fish = cell(1, 0, TerrainType::Lake);
        fish.resource = Some(ResourceType::Fish);
        let report = ResourceCollector.collect(&[forest, fish, cell(2, 0, TerrainType::Plain)]);
        assert_eq!(map(&report, "resources/counts")["Forest"], 1.0);
        assert_eq!(map(&report, "resources/counts")["Mineral"], 0.0);
        let dist = map(&report, "resources/terrain_distribution");
        assert_eq!(dist["Hill/Forest"], 1.0);
        assert_eq!(dist["Lake/Fish"], 1.0);
    }

    #[test]
    fn river_adjacency_counts_dry_neighbors_once() {
        let mut river = cell(0, 0, TerrainType::Plain);
        river.river_level = 1;
        let cells = vec![
            river,
            cell(1, 0, TerrainType::Plain),
            cell(0, 1, TerrainType::Plain),
            cell(3, 3, TerrainType::Plain),
        ];
        let report = RiverCollector.collect(&cells);
        assert_eq!(scalar(&report, "rivers/count"), 1.0);
        assert_eq!(scalar(&report, "rivers/proportion"), 0.25);
        assert_eq!(scalar(&report, "rivers/adjacent_count"), 2.0);
    }

    #[test]
    fn climate_zones_use_level_names() {
        let mut c = cell(0, 0, TerrainType::Plain);
        c.height_level = HeightLevel::Level2;
        c.humidity_level = HumidityLevel::Low;
        let report = ClimateCollector.collect(&[c]);
        assert_eq!(map(&report, "climate/zones")["Level2-Low"], 1.0);
    }

    #[test]
    fn cities_roads_and_features() {
        let mut capital = cell(0, 0, TerrainType::Plain);
        capital.build = Some(BuildType::PrimaryCity);
        let mut bridge = cell(1, 0, TerrainType::Plain);
        bridge.is_road = true;
        bridge.is_bridge = true;
        let mut volcano = cell(2, 0, TerrainType::Mountain);
        volcano.terrain_face = TerrainFace::Volcano;
        volcano.build = Some(BuildType::Fortress);
        let cells = [capital, bridge, volcano];

        let cities = CityCollector.collect(&cells);
        assert_eq!(map(&cities, "cities/counts")["PrimaryCity"], 1.0);
        assert_eq!(map(&cities, "cities/counts").values().sum::<f64>(), 1.0);
        assert_eq!(map(&cities, "cities/terrain_distribution")["Plain"], 1.0);

        let infra = InfrastructureCollector.collect(&cells);
        assert_eq!(scalar(&infra, "infrastructure/roads"), 1.0);
        assert_eq!(scalar(&infra, "infrastructure/bridges"), 1.0);

        let features = FeatureCollector.collect(&cells);
        assert_eq!(scalar(&features, "features/volcanoes"), 1.0);
        assert_eq!(scalar(&features, "features/snow"), 0.0);
    }

    #[test]
    fn ranges_track_extremes() {
        let mut low = cell(0, 0, TerrainType::Ocean);
        low.height = 0.25;
        low.humidity = 0.5;
        let mut high = cell(1, 0, TerrainType::Hill);
        high.height = 0.75;
        high.humidity = 1.0;
        let report = RangeCollector.collect(&[low, high]);
        assert_eq!(scalar(&report, "ranges/min_height"), 0.25);
        assert_eq!(scalar(&report, "ranges/max_height"), 0.75);
        assert_eq!(scalar(&report, "ranges/avg_humidity"), 0.75);

        let empty = RangeCollector.collect(&[]);
        assert_eq!(scalar(&empty, "ranges/min_height"), 0.0);
    }
}
