use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hex::HexCoord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    Ocean,
    Plain,
    Hill,
    Mountain,
    HighMountain,
    Lake,
}

impl TerrainType {
    pub const ALL: [TerrainType; 6] = [
        TerrainType::Ocean,
        TerrainType::Plain,
        TerrainType::Hill,
        TerrainType::Mountain,
        TerrainType::HighMountain,
        TerrainType::Lake,
    ];

    /// Integer code used by the structured height and export files.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn is_water(self) -> bool {
        matches!(self, TerrainType::Ocean | TerrainType::Lake)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TerrainType::Ocean => "Ocean",
            TerrainType::Plain => "Plain",
            TerrainType::Hill => "Hill",
            TerrainType::Mountain => "Mountain",
            TerrainType::HighMountain => "HighMountain",
            TerrainType::Lake => "Lake",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TerrainFace {
    Grassland,
    Forest,
    Swamp,
    Rainforest,
    Desert,
    Oasis,
    Snow,
    Tundra,
    Volcano,
}

impl TerrainFace {
    pub fn as_str(self) -> &'static str {
        match self {
            TerrainFace::Grassland => "Grassland",
            TerrainFace::Forest => "Forest",
            TerrainFace::Swamp => "Swamp",
            TerrainFace::Rainforest => "Rainforest",
            TerrainFace::Desert => "Desert",
            TerrainFace::Oasis => "Oasis",
            TerrainFace::Snow => "Snow",
            TerrainFace::Tundra => "Tundra",
            TerrainFace::Volcano => "Volcano",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeightLevel {
    None,
    Level1,
    Level2,
    Level3,
    Level4,
}

impl HeightLevel {
    pub const ALL: [HeightLevel; 5] = [
        HeightLevel::None,
        HeightLevel::Level1,
        HeightLevel::Level2,
        HeightLevel::Level3,
        HeightLevel::Level4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HeightLevel::None => "None",
            HeightLevel::Level1 => "Level1",
            HeightLevel::Level2 => "Level2",
            HeightLevel::Level3 => "Level3",
            HeightLevel::Level4 => "Level4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HumidityLevel {
    None,
    Low,
    Medium,
    High,
    Full,
}

impl HumidityLevel {
    pub const ALL: [HumidityLevel; 5] = [
        HumidityLevel::None,
        HumidityLevel::Low,
        HumidityLevel::Medium,
        HumidityLevel::High,
        HumidityLevel::Full,
    ];

    pub fn from_humidity(humidity: f32) -> Self {
        if humidity < 0.3 {
            HumidityLevel::Low
        } else if humidity < 0.6 {
            HumidityLevel::Medium
        } else if humidity < 0.9 {
            HumidityLevel::High
        } else {
            HumidityLevel::Full
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HumidityLevel::None => "None",
            HumidityLevel::Low => "Low",
            HumidityLevel::Medium => "Medium",
            HumidityLevel::High => "High",
            HumidityLevel::Full => "Full",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Mineral,
    Forest,
    Fish,
    Agriculture,
}

impl ResourceType {
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Mineral,
        ResourceType::Forest,
        ResourceType::Fish,
        ResourceType::Agriculture,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Mineral => "Mineral",
            ResourceType::Forest => "Forest",
            ResourceType::Fish => "Fish",
            ResourceType::Agriculture => "Agriculture",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildType {
    PrimaryCity,
    SecondaryCity,
    TertiaryCity,
    HeavyFactory,
    Airport,
    Fortress,
}

impl BuildType {
    pub fn is_city(self) -> bool {
        matches!(
            self,
            BuildType::PrimaryCity | BuildType::SecondaryCity | BuildType::TertiaryCity
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildType::PrimaryCity => "PrimaryCity",
            BuildType::SecondaryCity => "SecondaryCity",
            BuildType::TertiaryCity => "TertiaryCity",
            BuildType::HeavyFactory => "HeavyFactory",
            BuildType::Airport => "Airport",
            BuildType::Fortress => "Fortress",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(TerrainType, TerrainFace, HeightLevel, HumidityLevel, ResourceType, BuildType);

/// Everything the generator knows about one hex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub q: i32,
    pub r: i32,
    pub height: f32,
    pub height_level: HeightLevel,
    pub humidity: f32,
    pub humidity_level: HumidityLevel,
    pub terrain: TerrainType,
    pub terrain_face: TerrainFace,
    pub resource: Option<ResourceType>,
    pub build: Option<BuildType>,
    pub river_level: u8,
    pub is_bridge: bool,
    pub is_road: bool,
}

impl CellRecord {
    pub fn new(coord: HexCoord) -> Self {
        Self {
            q: coord.q,
            r: coord.r,
            height: 0.0,
            height_level: HeightLevel::None,
            humidity: 0.0,
            humidity_level: HumidityLevel::None,
            terrain: TerrainType::Plain,
            terrain_face: TerrainFace::Grassland,
            resource: None,
            build: None,
            river_level: 0,
            is_bridge: false,
            is_road: false,
        }
    }

    pub fn coord(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }

    pub fn has_river(&self) -> bool {
        self.river_level > 0
    }

    pub fn set_humidity(&mut self, humidity: f32, level: HumidityLevel) {
        self.humidity = humidity.clamp(0.0, 1.0);
        self.humidity_level = level;
    }

    /// Copies every field except the identity.
    fn assign_from(&mut self, data: &CellRecord) {
        self.height = data.height;
        self.height_level = data.height_level;
        self.set_humidity(data.humidity, data.humidity_level);
        self.terrain = data.terrain;
        self.terrain_face = data.terrain_face;
        self.resource = data.resource;
        self.build = data.build;
        self.river_level = data.river_level;
        self.is_bridge = data.is_bridge;
        self.is_road = data.is_road;
    }
}

/// Insertion-ordered coordinate -> cell map.
#[derive(Debug, Default, Clone)]
pub struct CellStore {
    cells: Vec<CellRecord>,
    index: HashMap<HexCoord, usize>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_coords(coords: impl IntoIterator<Item = HexCoord>) -> Self {
        let mut store = Self::new();
        for coord in coords {
            store.upsert(coord, None);
        }
        store
    }

    pub fn upsert(&mut self, coord: HexCoord, data: Option<&CellRecord>) -> &mut CellRecord {
        let slot = match self.index.get(&coord) {
            Some(&slot) => slot,
            None => {
                self.cells.push(CellRecord::new(coord));
                let slot = self.cells.len() - 1;
                self.index.insert(coord, slot);
                slot
            }
        };
        let cell = &mut self.cells[slot];
        if let Some(data) = data {
            cell.assign_from(data);
        }
        cell
    }

    pub fn get(&self, coord: HexCoord) -> Option<&CellRecord> {
        self.index.get(&coord).map(|&slot| &self.cells[slot])
    }

    pub fn get_mut(&mut self, coord: HexCoord) -> Option<&mut CellRecord> {
        match self.index.get(&coord) {
            Some(&slot) => Some(&mut self.cells[slot]),
            None => None,
        }
    }

    pub fn contains(&self, coord: HexCoord) -> bool {
        self.index.contains_key(&coord)
    }

    /// Neighbors that exist in the store; off-grid ones are dropped.
    pub fn neighbors_of(&self, coord: HexCoord) -> Vec<&CellRecord> {
        coord
            .neighbors()
            .into_iter()
            .filter_map(|neighbor| self.get(neighbor))
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &CellRecord> {
        self.cells.iter()
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut CellRecord> {
        self.cells.iter_mut()
    }

    pub fn coords(&self) -> Vec<HexCoord> {
        self.cells.iter().map(CellRecord::coord).collect()
    }

    pub fn cells_by_terrain(&self, types: &[TerrainType]) -> Vec<&CellRecord> {
        self.cells
            .iter()
            .filter(|cell| types.contains(&cell.terrain))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.index.clear();
    }

    /// Owned copy of every record in insertion order.
    pub fn export(&self) -> Vec<CellRecord> {
        self.cells.clone()
    }
}
