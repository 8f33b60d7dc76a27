use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, TAU};
use std::fs;
use std::path::{Path, PathBuf};

use orb_core::polar::Polar;
use orb_core::time::DEFAULT_MAX_STEP_MS;

use crate::floor::{load_stage_from_path, Floor, FloorRegistry};
use crate::physics::PhysicsConfig;

pub const DEFAULT_FLOOR_BOTTOM: f64 = 100.0;
pub const DEFAULT_FLOOR_THICKNESS: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Longest slice of time a single tick may simulate.
    pub max_step_ms: f64,
    pub physics: PhysicsConfig,
    /// Stage file; the default ring is used when absent.
    pub stage: Option<PathBuf>,
    /// Directory sprite sheet image ids resolve against.
    pub resource_root: PathBuf,
    pub spawn_angle: f64,
    pub spawn_radius: f64,
    /// Also place a Kappler on the stage.
    pub spawn_kappler: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_step_ms: DEFAULT_MAX_STEP_MS,
            physics: PhysicsConfig::default(),
            stage: None,
            resource_root: PathBuf::from("."),
            spawn_angle: -FRAC_PI_2,
            spawn_radius: DEFAULT_FLOOR_BOTTOM + 50.0,
            spawn_kappler: false,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.max_step_ms.is_finite() || self.max_step_ms <= 0.0 {
            return Err("Config validation failed: max_step_ms must be > 0".to_string());
        }
        let bad_radius = self.spawn_radius.is_nan() || self.spawn_radius < 0.0;
        if !self.spawn_angle.is_finite() || bad_radius {
            return Err(
                "Config validation failed: spawn position must be finite with radius >= 0"
                    .to_string(),
            );
        }
        self.physics.validate()
    }

    pub fn spawn_position(&self) -> Polar {
        Polar::new(self.spawn_angle, self.spawn_radius)
    }

    /// Load the configured stage, or build the single default ring.
    pub fn load_stage(&self) -> Result<FloorRegistry, String> {
        match &self.stage {
            Some(path) => load_stage_from_path(path),
            None => Ok(default_stage()),
        }
    }
}

pub fn default_stage() -> FloorRegistry {
    FloorRegistry::new(
        "default",
        vec![Floor::new(
            DEFAULT_FLOOR_BOTTOM,
            DEFAULT_FLOOR_BOTTOM + DEFAULT_FLOOR_THICKNESS,
            0.0,
            TAU,
        )],
    )
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    config.validate()?;
    Ok(config)
}
