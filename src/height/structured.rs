use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    cells::{CellStore, TerrainType},
    hex::HexCoord,
};

/// One entry of a structured height table. `(x, y)` is the axial `(q, r)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightRecord {
    pub x: i32,
    pub y: i32,
    /// Terrain ordinal. Any integer parses; codes that name no terrain are
    /// skipped when the table is applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrain: Option<i64>,
    #[serde(default)]
    pub height: f32,
}

impl HeightRecord {
    pub fn terrain_type(&self) -> Option<TerrainType> {
        self.terrain.and_then(terrain_from_code)
    }
}

fn terrain_from_code(code: i64) -> Option<TerrainType> {
    u8::try_from(code).ok().and_then(TerrainType::from_ordinal)
}

/// Writes record heights onto matching cells and returns the coordinates whose
/// terrain was fixed by the table.
pub(super) fn apply_records(records: &[HeightRecord], cells: &mut CellStore) -> HashSet<HexCoord> {
    let mut fixed = HashSet::new();
    let mut skipped = 0usize;
    for record in records {
        let coord = HexCoord::new(record.x, record.y);
        let Some(cell) = cells.get_mut(coord) else {
            warn!(%coord, "structured height record outside the grid, skipping");
            skipped += 1;
            continue;
        };
        cell.height = record.height.clamp(0.0, 1.0);
        if let Some(code) = record.terrain {
            match terrain_from_code(code) {
                Some(terrain) => {
                    cell.terrain = terrain;
                    fixed.insert(coord);
                }
                None => warn!(%coord, code, "unknown terrain code, classifying from height"),
            }
        }
    }
    if skipped > 0 {
        warn!(skipped, total = records.len(), "structured records did not match the grid");
    }
    fixed
}
