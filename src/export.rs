//! Writes finished maps to disk.
//!
//! Each run gets its own directory `<dir>/<name>/` holding:
//! - `terrain.json`: `{x, y, terrain}` records, reloadable as structured heights
//! - `cells.json`: every cell record
//! - `stats.json`: the statistics report with run metadata

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{cells::CellRecord, generator::GeneratedMap, stats::Report};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {file}: {source}")]
    Serialize {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub x: i32,
    pub y: i32,
    pub terrain: u8,
}

impl From<&CellRecord> for ExportRecord {
    fn from(cell: &CellRecord) -> Self {
        Self {
            x: cell.q,
            y: cell.r,
            terrain: cell.terrain.ordinal(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsDocument {
    pub name: String,
    pub seed: u64,
    pub generated_at: DateTime<Utc>,
    pub cell_count: usize,
    pub stats: Report,
}

pub struct ExportWriter {
    dir: PathBuf,
}

impl ExportWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Writes all three files and returns the run directory.
    pub fn write(&self, map: &GeneratedMap, report: &Report) -> Result<PathBuf, ExportError> {
        let run_dir = self.dir.join(&map.name);
        fs::create_dir_all(&run_dir).map_err(|source| ExportError::Io {
            path: run_dir.clone(),
            source,
        })?;

        write_json(&run_dir, "terrain.json", &map.export_records())?;
        write_json(&run_dir, "cells.json", &map.cells)?;
        let document = StatsDocument {
            name: map.name.clone(),
            seed: map.seed,
            generated_at: Utc::now(),
            cell_count: map.cells.len(),
            stats: report.clone(),
        };
        write_json(&run_dir, "stats.json", &document)?;

        info!(dir = %run_dir.display(), "exported map");
        Ok(run_dir)
    }
}

fn write_json<T: Serialize + ?Sized>(
    dir: &Path,
    file: &'static str,
    value: &T,
) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| ExportError::Serialize { file, source })?;
    let path = dir.join(file);
    fs::write(&path, json).map_err(|source| ExportError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MapInfo,
        generator::Generator,
        height::{HeightSource, SampleField},
        stats::StatisticsCoordinator,
    };

    fn small_map() -> GeneratedMap {
        let field = SampleField::new(2, 2, vec![0.0, 0.4, 0.6, 1.0]).unwrap();
        let mut generator = Generator::new("export-test", 21, MapInfo::new(6, 5)).unwrap();
        generator
            .generate(&HeightSource::Noise(field))
            .unwrap()
            .clone()
    }

    #[test]
    fn writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let map = small_map();
        let report = StatisticsCoordinator::with_default_collectors().generate(&map.cells);
        let run_dir = ExportWriter::new(dir.path()).write(&map, &report).unwrap();

        assert_eq!(run_dir, dir.path().join("export-test"));
        for file in ["terrain.json", "cells.json", "stats.json"] {
            assert!(run_dir.join(file).exists(), "{file}");
        }
        let stats: StatsDocument =
            serde_json::from_str(&fs::read_to_string(run_dir.join("stats.json")).unwrap()).unwrap();
        assert_eq!(stats.cell_count, 30);
        assert_eq!(stats.stats, report);
    }

    #[test]
    fn terrain_export_reloads_as_structured_heights() {
        let dir = tempfile::tempdir().unwrap();
        let map = small_map();
        let report = StatisticsCoordinator::new().generate(&map.cells);
        let run_dir = ExportWriter::new(dir.path()).write(&map, &report).unwrap();

        let text = fs::read_to_string(run_dir.join("terrain.json")).unwrap();
        let records = HeightSource::parse_structured(&text).unwrap();
        assert_eq!(records.len(), map.cells.len());
        for (record, cell) in records.iter().zip(&map.cells) {
            assert_eq!((record.x, record.y), (cell.q, cell.r));
            assert_eq!(record.terrain_type(), Some(cell.terrain));
            assert_eq!(record.height, 0.0);
        }
    }

    #[test]
    fn unwritable_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a dir").unwrap();
        let map = small_map();
        let err = ExportWriter::new(&blocker)
            .write(&map, &Report::new())
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
