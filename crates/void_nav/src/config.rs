//! Navigation settings
//!
//! Per-agent and per-call configuration. Every struct deserializes with
//! defaults for omitted keys, so a TOML file only needs the values it changes:
//!
//! ```toml
//! [pathfinding]
//! agent_can_jump = false
//!
//! [computation]
//! time_between_compute_ms = 100
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{NavError, NavResult};

/// Default pause between follow-loop cycles
pub const DEFAULT_TIME_BETWEEN_COMPUTE_MS: u64 = 70;

/// Per-call movement settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveSettings {
    /// Suppress error reporting when no path exists
    pub ignore_no_path_error: bool,
    /// Emit a transient marker at each waypoint (side effect only)
    pub visualize_path: bool,
}

impl MoveSettings {
    /// Settings that stay quiet when the target is unreachable
    pub fn quiet() -> Self {
        Self {
            ignore_no_path_error: true,
            ..Default::default()
        }
    }

    /// Enable waypoint markers
    pub fn with_visualization(mut self) -> Self {
        self.visualize_path = true;
        self
    }
}

/// Per-agent computation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputationSettings {
    /// Minimum pause between successive recompute cycles (ms)
    pub time_between_compute_ms: u64,
}

impl Default for ComputationSettings {
    fn default() -> Self {
        Self {
            time_between_compute_ms: DEFAULT_TIME_BETWEEN_COMPUTE_MS,
        }
    }
}

impl ComputationSettings {
    /// Pause between recompute cycles
    pub fn time_between_compute(&self) -> Duration {
        Duration::from_millis(self.time_between_compute_ms)
    }
}

/// Per-agent pathfinding parameters, handed to the path service when the
/// agent's query is created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingParams {
    /// Agent radius
    pub agent_radius: f32,
    /// Agent height; areas with less clearance are skipped
    pub agent_height: f32,
    /// Whether routes may include jumps
    pub agent_can_jump: bool,
}

impl Default for PathfindingParams {
    fn default() -> Self {
        Self {
            agent_radius: 2.0,
            agent_height: 5.0,
            agent_can_jump: true,
        }
    }
}

/// Full navigation config document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub pathfinding: PathfindingParams,
    pub computation: ComputationSettings,
    pub movement: MoveSettings,
}

impl NavConfig {
    /// Parse from TOML
    pub fn from_toml_str(source: &str) -> NavResult<Self> {
        toml::from_str(source).map_err(|e| NavError::Config(e.to_string()))
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> NavResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        log::debug!("Loaded nav config from {}", path.display());
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> NavResult<String> {
        toml::to_string(self).map_err(|e| NavError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NavConfig::default();
        assert_eq!(config.computation.time_between_compute(), Duration::from_millis(70));
        assert!(!config.movement.ignore_no_path_error);
        assert!(!config.movement.visualize_path);
        assert!(config.pathfinding.agent_can_jump);
    }

    #[test]
    fn test_partial_toml() {
        let config = NavConfig::from_toml_str(
            r#"
            [pathfinding]
            agent_can_jump = false

            [computation]
            time_between_compute_ms = 100
            "#,
        )
        .unwrap();

        assert!(!config.pathfinding.agent_can_jump);
        assert_eq!(config.pathfinding.agent_height, 5.0);
        assert_eq!(config.computation.time_between_compute_ms, 100);
        assert_eq!(config.movement, MoveSettings::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = NavConfig::default();
        config.movement = MoveSettings::quiet().with_visualization();
        let text = config.to_toml_string().unwrap();
        assert_eq!(NavConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_bad_toml() {
        let err = NavConfig::from_toml_str("[computation]\ntime_between_compute_ms = \"soon\"");
        assert!(matches!(err, Err(NavError::Config(_))));
    }

    #[test]
    fn test_move_settings_json_names() {
        let json = serde_json::to_value(MoveSettings::quiet()).unwrap();
        assert_eq!(json["ignore_no_path_error"], true);
        assert_eq!(json["visualize_path"], false);
    }
}
