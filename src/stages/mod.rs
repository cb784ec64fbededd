mod biomes;
mod climate;
mod resources;
mod rivers;
mod settlements;
mod terrain;
mod thresholds;

pub use biomes::{resolve_face, BiomeStage};
pub use climate::{base_humidity, ClimateStage, LATITUDE_BANDS};
pub use resources::{roll_resource, ResourceStage};
pub use rivers::{trace_river, RiverStage, RiverTerminus, RiverWalk, MAX_RIVER_STEPS};
pub use settlements::{Settlement, SettlementStage};
pub use terrain::{classify, TerrainStage};
pub use thresholds::{HeightLevelStage, HeightThresholds, ThresholdStage};
