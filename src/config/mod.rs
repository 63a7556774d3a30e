//! Simulation configuration
//!
//! - [`SimConfig`]: seed, tick rate, physics coefficients, water, logging
//! - Loaded from RON or JSON; missing fields take their defaults
//! - [`SimConfig::validate`] rejects values the simulation cannot honour
//! - [`watch`]: file watcher for reloading physics settings at runtime

pub mod watch;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::constants::BREADCRUMB_CAPACITY;
use crate::error::{CoreError, CoreResult};
use crate::logging::LogConfig;
use crate::mesh::WaterSurface;

/// Environment coefficients applied every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration per tick (negative is down)
    pub gravity: f32,
    /// Horizontal velocity kept per tick in air
    pub air_friction: f32,
    /// Velocity kept per tick in water
    pub water_friction: f32,
    /// Floor friction on SLIPPY tiles (1.0 = none)
    pub slippy_friction: f32,
    /// Floor friction everywhere else
    pub noslip_friction: f32,
    /// Divides traction on slippy slopes
    pub hillslide: f32,
    /// How strongly a platform drags its riders
    pub platstick: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -1.0,
            air_friction: 0.9868,
            water_friction: 0.80,
            slippy_friction: 1.0,
            noslip_friction: 0.91,
            hillslide: 1.0,
            platstick: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    /// Simulation ticks per second requested from the host
    pub tick_rate: u32,
    pub physics: PhysicsConfig,
    pub water: WaterSurface,
    pub breadcrumb_capacity: usize,
    pub logging: LogConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_rate: 50,
            physics: PhysicsConfig::default(),
            water: WaterSurface::default(),
            breadcrumb_capacity: BREADCRUMB_CAPACITY,
            logging: LogConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn from_ron_str(text: &str) -> CoreResult<Self> {
        let config: SimConfig =
            ron::from_str(text).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> CoreResult<Self> {
        let config: SimConfig =
            serde_json::from_str(text).map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load by extension: `.json` is JSON, anything else RON.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::InvalidConfig(format!("{}: {e}", path.display())))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_ron_str(&text),
        }
    }

    /// Wall-clock time one tick should take at `tick_rate`.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }

    pub fn to_ron_string(&self) -> CoreResult<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> CoreResult<()> {
        let p = &self.physics;
        let fractions = [
            ("air_friction", p.air_friction),
            ("water_friction", p.water_friction),
            ("slippy_friction", p.slippy_friction),
            ("noslip_friction", p.noslip_friction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::InvalidConfig(format!(
                    "{name} must be within 0..=1, got {value}"
                )));
            }
        }
        if !p.gravity.is_finite() || p.gravity > 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "gravity must be finite and point down, got {}",
                p.gravity
            )));
        }
        if p.hillslide <= 0.0 {
            return Err(CoreError::InvalidConfig("hillslide must be positive".into()));
        }
        if self.breadcrumb_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "breadcrumb_capacity must be at least 1".into(),
            ));
        }
        if self.tick_rate == 0 {
            return Err(CoreError::InvalidConfig("tick_rate must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tick_period_follows_rate() {
        assert_eq!(SimConfig::default().tick_period(), Duration::from_millis(20));
        let config = SimConfig::from_ron_str("(tick_rate: 25)").unwrap();
        assert_eq!(config.tick_period(), Duration::from_millis(40));
        assert!(SimConfig::from_ron_str("(tick_rate: 0)").is_err());
    }

    #[test]
    fn test_partial_ron_fills_defaults() {
        let config = SimConfig::from_ron_str("(seed: 7, physics: (gravity: -2.0))").unwrap();
        assert_eq!(config.seed, 7);
        assert!((config.physics.gravity + 2.0).abs() < f32::EPSILON);
        assert!((config.physics.air_friction - 0.9868).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejects_upward_gravity() {
        let err = SimConfig::from_json_str(r#"{"physics": {"gravity": 3.0}}"#).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_ron_roundtrip_through_file() {
        let config = SimConfig {
            seed: 99,
            ..SimConfig::default()
        };
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", config.to_ron_string().unwrap()).unwrap();
        let loaded = SimConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
