//! Configuration management for the mlswarp command line tool

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::deform::MlsDeformer;
use crate::weights::DEFAULT_ALPHA;

/// A 2D point in image pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Move the image content found at `from` to `to`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ControlPair {
    pub from: Point,
    pub to: Point,
}

impl ControlPair {
    pub fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }
}

/// Interpolation grid settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    /// Distance weighting exponent; larger values keep deformations local
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 32,
            cols: 32,
            alpha: DEFAULT_ALPHA,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub controls: Vec<ControlPair>,
}

impl Config {
    /// Load configuration from a file, or create default if it doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            tracing::info!("Created default configuration at {:?}", path);
            Ok(config)
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Build a deformer for a `width x height` image that maps each output
    /// pixel back to the source pixel it should be sampled from.
    ///
    /// Control points are anchored at `to` with their distorted location at
    /// `from`, so resampling through the result moves content from `from` to `to`.
    pub fn build_deformer(&self, width: u32, height: u32) -> Result<MlsDeformer> {
        let mut mls = MlsDeformer::new();
        mls.configure(width, height, self.grid.rows, self.grid.cols)?;
        mls.set_alpha(self.grid.alpha)?;

        for pair in &self.controls {
            let index = mls.add_control(pair.to.x, pair.to.y)?;
            mls.set_distorted(index, pair.from.x, pair.from.y)?;
        }

        mls.fixate_undistorted()?;
        mls.fixate_distorted()?;
        Ok(mls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.grid.rows, 32);
        assert_eq!(config.grid.cols, 32);
        assert_eq!(config.grid.alpha, 1.5);
        assert!(config.controls.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let content = r#"
            [grid]
            rows = 8
            cols = 16

            [[controls]]
            from = { x = 10.0, y = 20.0 }
            to = { x = 12.0, y = 25.0 }
        "#;
        let config: Config = toml::from_str(content).unwrap();

        assert_eq!(config.grid.rows, 8);
        assert_eq!(config.grid.cols, 16);
        assert_eq!(config.grid.alpha, 1.5);
        assert_eq!(
            config.controls,
            vec![ControlPair::new(Point::new(10.0, 20.0), Point::new(12.0, 25.0))]
        );
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.grid.alpha = 2.0;
        config.controls.push(ControlPair::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0)));

        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_build_deformer_maps_to_back_to_from() {
        let mut config = Config::default();
        config.grid.rows = 8;
        config.grid.cols = 8;
        config
            .controls
            .push(ControlPair::new(Point::new(40.0, 40.0), Point::new(50.0, 50.0)));

        let mls = config.build_deformer(100, 100).unwrap();
        assert_eq!(mls.control_count(), 1);

        let p = mls.compute(50.0, 50.0);
        assert!((p.x - 40.0).abs() < 1e-6);
        assert!((p.y - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_build_deformer_rejects_bad_input() {
        let mut config = Config::default();
        // No control points
        assert!(config.build_deformer(100, 100).is_err());

        config
            .controls
            .push(ControlPair::new(Point::new(1.0, 1.0), Point::new(2.0, 2.0)));
        config.grid.rows = 0;
        assert!(config.build_deformer(100, 100).is_err());
    }
}
