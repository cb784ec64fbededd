use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid height mode '{0}', expected 'noise' or 'structured'")]
    InvalidMode(String),
    #[error("structured height mode requires a `structured` file path")]
    MissingStructuredPath,
    #[error("invalid map request: {0}")]
    Validation(String),
}

fn default_width() -> i32 {
    64
}

fn default_height() -> i32 {
    48
}

fn default_ocean_ratio() -> f64 {
    0.3
}

fn default_mountain_ratio() -> f64 {
    0.1
}

fn default_forest_ratio() -> f64 {
    0.3
}

fn default_desert_ratio() -> f64 {
    0.1
}

fn default_snow_ratio() -> f64 {
    0.05
}

fn default_min_cities() -> u32 {
    3
}

fn default_max_cities() -> u32 {
    8
}

/// A generation request. Immutable for the duration of a run.
///
/// `forest_ratio`, `desert_ratio` and `snow_ratio` are validated and carried
/// through to the result but no stage reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default = "default_ocean_ratio")]
    pub ocean_ratio: f64,
    #[serde(default = "default_mountain_ratio")]
    pub mountain_ratio: f64,
    #[serde(default = "default_forest_ratio")]
    pub forest_ratio: f64,
    #[serde(default = "default_desert_ratio")]
    pub desert_ratio: f64,
    #[serde(default = "default_snow_ratio")]
    pub snow_ratio: f64,
    #[serde(default = "default_min_cities")]
    pub min_cities: u32,
    #[serde(default = "default_max_cities")]
    pub max_cities: u32,
}

impl Default for MapInfo {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            ocean_ratio: default_ocean_ratio(),
            mountain_ratio: default_mountain_ratio(),
            forest_ratio: default_forest_ratio(),
            desert_ratio: default_desert_ratio(),
            snow_ratio: default_snow_ratio(),
            min_cities: default_min_cities(),
            max_cities: default_max_cities(),
        }
    }
}

impl MapInfo {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn cell_count(&self) -> usize {
        if self.width <= 0 || self.height <= 0 {
            0
        } else {
            self.width as usize * self.height as usize
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratios = [
            ("ocean_ratio", self.ocean_ratio),
            ("mountain_ratio", self.mountain_ratio),
            ("forest_ratio", self.forest_ratio),
            ("desert_ratio", self.desert_ratio),
            ("snow_ratio", self.snow_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.min_cities > self.max_cities {
            return Err(ConfigError::Validation(format!(
                "min_cities ({}) exceeds max_cities ({})",
                self.min_cities, self.max_cities
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightMode {
    Noise,
    Structured,
}

impl FromStr for HeightMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "noise" => Ok(HeightMode::Noise),
            "structured" => Ok(HeightMode::Structured),
            _ => Err(ConfigError::InvalidMode(value.to_string())),
        }
    }
}

fn default_mode() -> String {
    "noise".to_string()
}

fn default_noise_scale() -> f64 {
    4.0
}

fn default_octaves() -> u32 {
    6
}

fn default_persistence() -> f64 {
    0.5
}

fn default_lacunarity() -> f64 {
    2.0
}

/// Fractal noise parameters for synthesized height fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseSettings {
    #[serde(default = "default_noise_scale")]
    pub scale: f64,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_persistence")]
    pub persistence: f64,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f64,
    /// Sample field size; the map extents are used when unset.
    #[serde(default)]
    pub field_width: Option<u32>,
    #[serde(default)]
    pub field_height: Option<u32>,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: default_noise_scale(),
            octaves: default_octaves(),
            persistence: default_persistence(),
            lacunarity: default_lacunarity(),
            field_width: None,
            field_height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightConfig {
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Grayscale image for noise mode. Synthesized noise is used when absent.
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// JSON height table for structured mode.
    #[serde(default)]
    pub structured: Option<PathBuf>,
    #[serde(default)]
    pub noise: NoiseSettings,
}

impl Default for HeightConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            image: None,
            structured: None,
            noise: NoiseSettings::default(),
        }
    }
}

impl HeightConfig {
    pub fn mode(&self) -> Result<HeightMode, ConfigError> {
        self.mode.parse()
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        for path in [&mut self.image, &mut self.structured].into_iter().flatten() {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One generation run as described by a YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub map: MapInfo,
    #[serde(default)]
    pub heights: HeightConfig,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RunConfig {
    pub fn new(name: impl Into<String>, seed: u64, map: MapInfo) -> Self {
        Self {
            name: name.into(),
            description: None,
            seed,
            map,
            heights: HeightConfig::default(),
            export: ExportSettings::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.map.validate()?;
        if self.heights.mode()? == HeightMode::Structured && self.heights.structured.is_none() {
            return Err(ConfigError::MissingStructuredPath);
        }
        Ok(())
    }
}

pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Reads and validates a run config. Relative height file paths are
    /// resolved against the config file's directory.
    pub fn load(&self, file: impl AsRef<Path>) -> Result<RunConfig> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read run config {}", path.display()))?;
        let mut config: RunConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        let config_dir = path.parent().unwrap_or(&self.base_dir);
        config.heights.resolve_paths(config_dir);
        config
            .validate()
            .with_context(|| format!("Invalid run config {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_uses_defaults() {
        let config: RunConfig = serde_yaml::from_str("name: tiny\nseed: 9\n").unwrap();
        assert_eq!(config.map, MapInfo::default());
        assert_eq!(config.heights.mode().unwrap(), HeightMode::Noise);
        assert_eq!(config.logging.level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = "bitmap".parse::<HeightMode>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMode(ref mode) if mode == "bitmap"));
        assert_eq!(" Structured ".parse::<HeightMode>().unwrap(), HeightMode::Structured);
    }

    #[test]
    fn ratios_outside_unit_interval_fail_validation() {
        let map = MapInfo {
            ocean_ratio: 1.2,
            ..MapInfo::default()
        };
        assert!(matches!(map.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn inverted_city_bounds_fail_validation() {
        let map = MapInfo {
            min_cities: 5,
            max_cities: 2,
            ..MapInfo::default()
        };
        assert!(map.validate().is_err());
    }

    #[test]
    fn structured_mode_needs_a_file() {
        let mut config = RunConfig::new("s", 1, MapInfo::new(4, 4));
        config.heights.mode = "structured".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingStructuredPath)
        ));
    }

    #[test]
    fn relative_height_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("maps");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            nested.join("run.yaml"),
            "name: rel\nseed: 1\nheights:\n  mode: structured\n  structured: table.json\n",
        )
        .unwrap();

        let config = ConfigLoader::new(dir.path()).load("maps/run.yaml").unwrap();
        assert_eq!(config.heights.structured, Some(nested.join("table.json")));
    }
}
