use std::collections::HashSet;

use hexworld::{
    cells::{BuildType, TerrainType},
    config::{ConfigLoader, RunConfig},
    generate_from_config,
    height::HeightSource,
    stages::MAX_RIVER_STEPS,
    stats::StatisticsCoordinator,
    GeneratedMap, Generator, HexCoord,
};

fn archipelago() -> RunConfig {
    ConfigLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/archipelago.yaml")
        .expect("archipelago config should load")
}

async fn generate(config: &RunConfig) -> GeneratedMap {
    generate_from_config(config).await.expect("generation succeeds")
}

#[tokio::test]
async fn same_seed_same_map() {
    let config = archipelago();
    let first = generate(&config).await;
    let second = generate(&config).await;

    assert_eq!(first.cells, second.cells);
    assert_eq!(first.thresholds, second.thresholds);
    assert_eq!(first.rivers, second.rivers);
    assert_eq!(first.settlements, second.settlements);
}

#[tokio::test]
async fn different_seed_different_map() {
    let config = archipelago();
    let mut other = config.clone();
    other.seed += 1;
    let first = generate(&config).await;
    let second = generate(&other).await;
    assert_ne!(first.cells, second.cells);
}

#[tokio::test]
async fn every_grid_cell_is_present_once() {
    let config = archipelago();
    let map = generate(&config).await;
    assert_eq!(map.cells.len(), config.map.cell_count());
    let unique: HashSet<HexCoord> = map.cells.iter().map(|c| c.coord()).collect();
    assert_eq!(unique.len(), map.cells.len());
    assert!(map
        .cells
        .iter()
        .all(|c| (0.0..=1.0).contains(&c.height) && (0.0..=1.0).contains(&c.humidity)));
}

#[tokio::test]
async fn height_levels_match_thresholds() {
    let map = generate(&archipelago()).await;
    let t = map.thresholds;
    assert!(t.height1 <= t.height2 && t.height2 <= t.height3 && t.height3 <= t.height4);
    for cell in &map.cells {
        assert_eq!(cell.height_level, t.level_for(cell.height), "cell {}", cell.coord());
    }
}

#[tokio::test]
async fn rivers_follow_recorded_walks() {
    let map = generate(&archipelago()).await;
    let on_walk: HashSet<HexCoord> = map
        .rivers
        .iter()
        .flat_map(|walk| walk.path.iter().copied())
        .collect();

    for walk in &map.rivers {
        assert!(walk.steps() <= MAX_RIVER_STEPS);
        assert_eq!(walk.path.first(), Some(&walk.source));
    }
    for cell in map.cells.iter().filter(|c| c.has_river()) {
        assert!(on_walk.contains(&cell.coord()), "stray river at {}", cell.coord());
        assert_ne!(cell.terrain, TerrainType::Ocean);
    }
}

#[tokio::test]
async fn cities_respect_bounds() {
    let config = archipelago();
    let map = generate(&config).await;
    let pool = map
        .cells
        .iter()
        .filter(|c| c.terrain == TerrainType::Plain && c.has_river())
        .count();
    let cities = map.city_count();

    assert_eq!(cities, map.settlements.len());
    assert!(cities <= (config.map.max_cities as usize).min(pool));
    assert!(cities >= (config.map.min_cities as usize).min(pool));
    if let Some(first) = map.settlements.first() {
        assert_eq!(first.build, BuildType::PrimaryCity);
    }
    for cell in map.cells.iter().filter(|c| c.build.is_some()) {
        assert_eq!(cell.terrain, TerrainType::Plain);
        assert!(cell.has_river());
    }
    for cell in map.cells.iter().filter(|c| c.is_bridge) {
        assert!(cell.is_road && cell.has_river());
    }
}

#[tokio::test]
async fn statistics_add_up() {
    let map = generate(&archipelago()).await;
    let report = StatisticsCoordinator::with_default_collectors().generate(&map.cells);

    let counts = report["terrain/counts"].as_map().unwrap();
    assert_eq!(counts.values().sum::<f64>(), map.cells.len() as f64);
    let proportions = report["terrain/proportions"].as_map().unwrap();
    assert!((proportions.values().sum::<f64>() - 1.0).abs() < 1e-9);

    let cities = report["cities/counts"].as_map().unwrap();
    assert_eq!(cities.values().sum::<f64>(), map.city_count() as f64);
    let rivers = report["rivers/count"].as_scalar().unwrap();
    assert_eq!(
        rivers,
        map.cells.iter().filter(|c| c.has_river()).count() as f64
    );
}

#[tokio::test]
async fn hook_reports_every_stage() {
    let config = archipelago();
    let heights = HeightSource::load(&config.heights, &config.map, config.seed)
        .await
        .unwrap();
    let mut generator = Generator::from_config(&config).unwrap();
    let mut names = Vec::new();
    generator
        .generate_with_hook(&heights, |report| names.push(report.name.clone()))
        .unwrap();
    assert_eq!(
        names,
        [
            "thresholds",
            "height_levels",
            "terrain",
            "rivers",
            "climate",
            "biomes",
            "resources",
            "settlements"
        ]
    );
    assert!(generator.latest().is_some());
}
