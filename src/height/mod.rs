//! Elevation providers.
//!
//! A [`HeightSource`] is loaded once per run (the only async step in the
//! crate) and then applied to a freshly built [`CellStore`]. Noise mode samples
//! a grayscale field with bilinear interpolation; structured mode copies
//! heights, and optionally terrain, from a JSON table.

mod field;
mod structured;

use std::{collections::HashSet, path::PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    cells::CellStore,
    config::{ConfigError, HeightConfig, HeightMode, MapInfo},
    hex::HexCoord,
};

pub use field::SampleField;
pub use structured::HeightRecord;

#[derive(Debug, Error)]
pub enum HeightSourceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read height source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode height image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("height image {0} has no pixels")]
    EmptyImage(PathBuf),
    #[error("failed to parse structured heights {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub enum HeightSource {
    Noise(SampleField),
    Structured(Vec<HeightRecord>),
}

impl HeightSource {
    /// Loads the source named by `config`. Failures are returned to the caller
    /// and never replaced by another source.
    pub async fn load(
        config: &HeightConfig,
        map: &MapInfo,
        seed: u64,
    ) -> Result<Self, HeightSourceError> {
        match config.mode()? {
            HeightMode::Noise => match &config.image {
                Some(path) => Self::load_image(path.clone()).await,
                None => {
                    let width = config
                        .noise
                        .field_width
                        .map(|w| w as usize)
                        .unwrap_or(map.width.max(1) as usize);
                    let height = config
                        .noise
                        .field_height
                        .map(|h| h as usize)
                        .unwrap_or(map.height.max(1) as usize);
                    debug!(width, height, seed, "synthesizing noise height field");
                    Ok(HeightSource::Noise(SampleField::synthesize(
                        width,
                        height,
                        seed,
                        &config.noise,
                    )))
                }
            },
            HeightMode::Structured => {
                let path = config
                    .structured
                    .clone()
                    .ok_or(ConfigError::MissingStructuredPath)?;
                Self::load_structured(path).await
            }
        }
    }

    async fn load_image(path: PathBuf) -> Result<Self, HeightSourceError> {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| HeightSourceError::Io {
                path: path.clone(),
                source,
            })?;
        let image = image::load_from_memory(&bytes).map_err(|source| HeightSourceError::Image {
            path: path.clone(),
            source,
        })?;
        let field =
            SampleField::from_image(&image).ok_or_else(|| HeightSourceError::EmptyImage(path.clone()))?;
        info!(
            path = %path.display(),
            width = field.width(),
            height = field.height(),
            "loaded height image"
        );
        Ok(HeightSource::Noise(field))
    }

    async fn load_structured(path: PathBuf) -> Result<Self, HeightSourceError> {
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| HeightSourceError::Io {
                path: path.clone(),
                source,
            })?;
        let records = Self::parse_structured(&text).map_err(|source| HeightSourceError::Json {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), records = records.len(), "loaded structured heights");
        Ok(HeightSource::Structured(records))
    }

    pub fn parse_structured(text: &str) -> Result<Vec<HeightRecord>, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Sets `height` on every cell of the store. Returns the coordinates whose
    /// terrain the source fixed; those skip level assignment and
    /// classification.
    pub fn apply(&self, map: &MapInfo, cells: &mut CellStore) -> HashSet<HexCoord> {
        match self {
            HeightSource::Noise(field) => {
                for cell in cells.all_mut() {
                    let (x, y) = cell.coord().to_offset();
                    cell.height = field.sample_grid(x, y, map.width, map.height);
                }
                HashSet::new()
            }
            HeightSource::Structured(records) => structured::apply_records(records, cells),
        }
    }
}
