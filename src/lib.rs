pub mod cells;
pub mod config;
pub mod export;
pub mod generator;
pub mod height;
pub mod hex;
pub mod pipeline;
pub mod rng;
pub mod stages;
pub mod stats;
pub mod telemetry;
pub mod web;

pub use cells::{CellRecord, CellStore, TerrainType};
pub use config::{ConfigLoader, MapInfo, RunConfig};
pub use generator::{generate_from_config, GeneratedMap, Generator};
pub use hex::HexCoord;
pub use stats::{Report, StatisticsCoordinator};
