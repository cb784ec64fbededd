use std::collections::HashSet;

use anyhow::Result;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    cells::{CellRecord, CellStore, TerrainType},
    hex::HexCoord,
    pipeline::{MapState, Stage, StageContext},
    rng::StageRng,
};

pub const RIVER_SOURCE_CHANCE: f64 = 0.2;
pub const MAX_RIVER_STEPS: usize = 100;

/// Why a river walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiverTerminus {
    ReachedOcean,
    LocalMinimum,
    CycleDetected,
    MaxStepsExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiverWalk {
    pub source: HexCoord,
    /// Cells marked as river, in walking order.
    pub path: Vec<HexCoord>,
    pub terminus: RiverTerminus,
}

impl RiverWalk {
    /// Number of moves taken from the source.
    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Steepest descent from `source`, marking every land cell it crosses.
///
/// The next cell is the neighbor with the strictly lowest height, earlier
/// neighbors winning ties. The walk ends on reaching ocean, when no neighbor
/// is lower, when it would revisit a cell, or after `max_steps` moves.
pub fn trace_river(cells: &mut CellStore, source: HexCoord, max_steps: usize) -> RiverWalk {
    let mut path = Vec::new();
    let mut visited = HashSet::from([source]);
    let mut current = source;
    let mut steps = 0;

    let terminus = loop {
        let current_height = match cells.get_mut(current) {
            Some(cell) if cell.terrain == TerrainType::Ocean => break RiverTerminus::ReachedOcean,
            Some(cell) => {
                cell.river_level = 1;
                cell.height
            }
            None => break RiverTerminus::LocalMinimum,
        };
        path.push(current);

        if steps >= max_steps {
            break RiverTerminus::MaxStepsExceeded;
        }

        let lowest = cells
            .neighbors_of(current)
            .into_iter()
            .fold(None::<&CellRecord>, |best, candidate| match best {
                Some(best) if candidate.height >= best.height => Some(best),
                _ => Some(candidate),
            });
        let next = match lowest {
            Some(next) if next.height < current_height => next.coord(),
            _ => break RiverTerminus::LocalMinimum,
        };
        if !visited.insert(next) {
            break RiverTerminus::CycleDetected;
        }
        current = next;
        steps += 1;
    };

    RiverWalk {
        source,
        path,
        terminus,
    }
}

pub struct RiverStage {
    max_steps: usize,
}

impl RiverStage {
    pub fn new() -> Self {
        Self {
            max_steps: MAX_RIVER_STEPS,
        }
    }
}

impl Default for RiverStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for RiverStage {
    fn name(&self) -> &str {
        "rivers"
    }

    fn run(
        &mut self,
        _ctx: &StageContext,
        state: &mut MapState,
        rng: &mut StageRng<'_>,
    ) -> Result<()> {
        let sources: Vec<HexCoord> = state
            .cells
            .cells_by_terrain(&[TerrainType::HighMountain])
            .into_iter()
            .map(CellRecord::coord)
            .collect();

        for source in sources {
            if !rng.gen_bool(RIVER_SOURCE_CHANCE) {
                continue;
            }
            let walk = trace_river(&mut state.cells, source, self.max_steps);
            if walk.terminus == RiverTerminus::MaxStepsExceeded {
                warn!(
                    %source,
                    max_steps = self.max_steps,
                    "river walk hit the step limit, keeping partial river"
                );
            }
            debug!(%source, length = walk.path.len(), terminus = ?walk.terminus, "river traced");
            state.rivers.push(walk);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::generate_grid;

    fn store_with(heights: &[(HexCoord, f32, TerrainType)], width: i32, height: i32) -> CellStore {
        let mut cells = CellStore::from_coords(generate_grid(width, height));
        for cell in cells.all_mut() {
            cell.height = 0.9;
        }
        for &(coord, h, terrain) in heights {
            let cell = cells.upsert(coord, None);
            cell.height = h;
            cell.terrain = terrain;
        }
        cells
    }

    #[test]
    fn descends_to_the_ocean() {
        // Row r = 0 along q slopes down into ocean at q = 3.
        let mut cells = CellStore::new();
        for (q, h) in [(0, 0.9), (1, 0.6), (2, 0.3), (3, 0.1)] {
            let cell = cells.upsert(HexCoord::new(q, 0), None);
            cell.height = h;
        }
        cells.get_mut(HexCoord::new(3, 0)).unwrap().terrain = TerrainType::Ocean;

        let walk = trace_river(&mut cells, HexCoord::new(0, 0), MAX_RIVER_STEPS);
        assert_eq!(walk.terminus, RiverTerminus::ReachedOcean);
        assert_eq!(
            walk.path,
            vec![HexCoord::new(0, 0), HexCoord::new(1, 0), HexCoord::new(2, 0)]
        );
        assert_eq!(cells.get(HexCoord::new(3, 0)).unwrap().river_level, 0);
        assert!(walk.path.iter().all(|c| cells.get(*c).unwrap().river_level == 1));
    }

    #[test]
    fn stops_in_a_basin() {
        let center = HexCoord::new(2, 1);
        let mut cells = store_with(&[(center, 0.5, TerrainType::HighMountain)], 5, 4);
        let walk = trace_river(&mut cells, center, MAX_RIVER_STEPS);
        assert_eq!(walk.terminus, RiverTerminus::LocalMinimum);
        assert_eq!(walk.path, vec![center]);
    }

    #[test]
    fn equal_height_neighbor_is_not_an_outlet() {
        let mut cells = CellStore::new();
        cells.upsert(HexCoord::new(0, 0), None).height = 0.4;
        cells.upsert(HexCoord::new(1, 0), None).height = 0.4;
        let walk = trace_river(&mut cells, HexCoord::new(0, 0), MAX_RIVER_STEPS);
        assert_eq!(walk.terminus, RiverTerminus::LocalMinimum);
        assert_eq!(walk.steps(), 0);
    }

    #[test]
    fn ties_follow_neighbor_order() {
        // (1,-1) precedes (0,1) in enumeration order.
        let mut cells = CellStore::new();
        cells.upsert(HexCoord::new(0, 0), None).height = 0.8;
        cells.upsert(HexCoord::new(0, 1), None).height = 0.2;
        cells.upsert(HexCoord::new(1, -1), None).height = 0.2;
        let walk = trace_river(&mut cells, HexCoord::new(0, 0), MAX_RIVER_STEPS);
        assert_eq!(walk.path[1], HexCoord::new(1, -1));
    }

    #[test]
    fn step_limit_bounds_long_slopes() {
        let mut cells = CellStore::new();
        for q in 0..50 {
            cells.upsert(HexCoord::new(q, 0), None).height = 1.0 - q as f32 * 0.01;
        }
        let walk = trace_river(&mut cells, HexCoord::new(0, 0), 10);
        assert_eq!(walk.terminus, RiverTerminus::MaxStepsExceeded);
        assert_eq!(walk.steps(), 10);
        assert_eq!(walk.path.len(), 11);
        assert_eq!(cells.get(HexCoord::new(11, 0)).unwrap().river_level, 0);
    }
}
