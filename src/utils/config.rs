use crate::core::{
    GeoPosition, DEFAULT_PROCESS_NOISE_MPS, DEFAULT_VISIBILITY_RANGE_M,
    MAX_CONSECUTIVE_LOCATION_FAILURES, MIN_HORIZONTAL_ACCURACY_M,
};
use crate::processing::heading::DEFAULT_HEADING_SMOOTHING;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Engine-wide configuration parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Location and heading fusion
    pub tracking: TrackingConfig,
    /// Projection and per-frame placement
    pub placement: PlacementConfig,
    /// Focus and click picking
    pub interaction: InteractionConfig,
}

/// Location fusion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Apply the Kalman filter (layers may still disable it)
    pub kalman_enabled: bool,
    /// Process noise (meters per second)
    pub process_noise_mps: f64,
    /// Accuracy floor for incoming samples (meters)
    pub min_accuracy_m: f64,
    /// Fraction of the heading difference applied per frame
    pub heading_smoothing: f64,
    /// Fixed device position for demo and test mode
    pub fixed_position: Option<GeoPosition>,
    /// Sensor polling interval (milliseconds)
    pub poll_interval_ms: u64,
    /// Minimum time between filter updates, 0 updates on every changed reading
    pub position_update_interval_ms: u64,
    /// Consecutive failures before the location error becomes persistent
    pub max_consecutive_failures: u32,
    /// Time allowed for the location service to come up (milliseconds)
    pub init_timeout_ms: u64,
}

/// Placement settings for projected objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Position interpolation per frame is `position_lerp_rate / fps`
    pub position_lerp_rate: f64,
    /// Scale interpolation per frame is `scale_lerp_rate / fps`
    pub scale_lerp_rate: f64,
    /// Fraction of an area dimension beyond which objects snap
    pub snap_fraction: f64,
    /// Objects closer than this to the area border shrink (meters)
    pub edge_scale_distance_m: f64,
    /// Scale forced on snapped objects that were shrunk at the border
    pub jump_scale: f64,
    /// Multiplier applied to per-POI visibility ranges
    pub visibility_tolerance: f64,
    /// Layer visibility range when the layer does not set one (meters)
    pub default_visibility_range_m: f64,
}

/// Picking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Maximum focus/click ray length (meters)
    pub raycast_max_distance_m: f64,
    /// Bounding sphere radius of content nodes before world scaling (meters)
    pub pick_radius_m: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            kalman_enabled: true,
            process_noise_mps: DEFAULT_PROCESS_NOISE_MPS,
            min_accuracy_m: MIN_HORIZONTAL_ACCURACY_M,
            heading_smoothing: DEFAULT_HEADING_SMOOTHING,
            fixed_position: None,
            poll_interval_ms: 10,
            position_update_interval_ms: 0,
            max_consecutive_failures: MAX_CONSECUTIVE_LOCATION_FAILURES,
            init_timeout_ms: 30_000,
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            position_lerp_rate: 0.5,
            scale_lerp_rate: 1.0,
            snap_fraction: 0.75,
            edge_scale_distance_m: 1.0,
            jump_scale: 0.01,
            visibility_tolerance: 1.25,
            default_visibility_range_m: DEFAULT_VISIBILITY_RANGE_M,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            raycast_max_distance_m: 1500.0,
            pick_radius_m: 0.5,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    /// Configuration file I/O error
    #[error("I/O error: {message}")]
    IoError { message: String },
    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Whether configuration is valid
    pub is_valid: bool,
    /// Validation errors
    pub errors: Vec<ConfigError>,
    /// Validation warnings
    pub warnings: Vec<String>,
}

impl ValidationResult {
    fn invalid(&mut self, parameter: &str, value: impl ToString, reason: &str) {
        self.errors.push(ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        });
    }
}

impl EngineConfig {
    /// Check every parameter, collecting all problems rather than stopping at the first
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();
        let t = &self.tracking;
        let p = &self.placement;
        let i = &self.interaction;

        if !(t.process_noise_mps > 0.0) {
            result.invalid("tracking.process_noise_mps", t.process_noise_mps, "must be positive");
        }
        if !(t.min_accuracy_m > 0.0) {
            result.invalid("tracking.min_accuracy_m", t.min_accuracy_m, "must be positive");
        }
        if !(t.heading_smoothing > 0.0 && t.heading_smoothing <= 1.0) {
            result.invalid("tracking.heading_smoothing", t.heading_smoothing, "must be in (0, 1]");
        }
        if t.poll_interval_ms == 0 {
            result.invalid("tracking.poll_interval_ms", t.poll_interval_ms, "polling must sleep between samples");
        }
        if t.max_consecutive_failures == 0 {
            result.invalid("tracking.max_consecutive_failures", t.max_consecutive_failures, "must be at least 1");
        }
        if let Some(fixed) = t.fixed_position {
            if fixed.latitude.abs() > 90.0 || fixed.longitude.abs() > 180.0 {
                result.invalid(
                    "tracking.fixed_position",
                    format!("{},{}", fixed.latitude, fixed.longitude),
                    "outside valid latitude/longitude range",
                );
            }
            result
                .warnings
                .push("Fixed position configured, sensor readings will be ignored".to_string());
        }
        if t.poll_interval_ms > 1000 {
            result
                .warnings
                .push(format!("Polling every {}ms will make placement sluggish", t.poll_interval_ms));
        }

        if !(p.position_lerp_rate > 0.0) {
            result.invalid("placement.position_lerp_rate", p.position_lerp_rate, "must be positive");
        }
        if !(p.scale_lerp_rate > 0.0) {
            result.invalid("placement.scale_lerp_rate", p.scale_lerp_rate, "must be positive");
        }
        if !(p.snap_fraction > 0.5 && p.snap_fraction <= 1.0) {
            // At or below half a dimension every wrapped move would snap
            result.invalid("placement.snap_fraction", p.snap_fraction, "must be in (0.5, 1]");
        }
        if !(p.edge_scale_distance_m >= 0.0) {
            result.invalid("placement.edge_scale_distance_m", p.edge_scale_distance_m, "must not be negative");
        }
        if !(p.jump_scale > 0.0 && p.jump_scale <= 1.0) {
            result.invalid("placement.jump_scale", p.jump_scale, "must be in (0, 1]");
        }
        if !(p.visibility_tolerance >= 1.0) {
            result.invalid("placement.visibility_tolerance", p.visibility_tolerance, "must be at least 1");
        }
        if !(p.default_visibility_range_m > 0.0) {
            result.invalid("placement.default_visibility_range_m", p.default_visibility_range_m, "must be positive");
        }

        if !(i.raycast_max_distance_m > 0.0) {
            result.invalid("interaction.raycast_max_distance_m", i.raycast_max_distance_m, "must be positive");
        }
        if !(i.pick_radius_m > 0.0) {
            result.invalid("interaction.pick_radius_m", i.pick_radius_m, "must be positive");
        }

        result.is_valid = result.errors.is_empty();
        result
    }
}

/// Loads, validates and persists the engine configuration
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: EngineConfig,
    config_file_path: Option<String>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a new configuration manager with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the configuration after validation
    pub fn update_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        let validation = config.validate();
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error);
        }
        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: EngineConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        let validation = config.validate();
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error);
        }
        for warning in &validation.warnings {
            debug!(path = %path_str, warning = %warning, "Configuration warning");
        }

        info!(path = %path_str, "Loaded engine configuration");
        self.config = config;
        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| {
            ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            }
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path_str);
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::IoError {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    /// Check if configuration has been modified since last save
    pub fn is_modified(&self) -> bool {
        self.is_modified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        let result = config.validate();
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(config.tracking.max_consecutive_failures, 10);
        assert_eq!(config.placement.snap_fraction, 0.75);
        assert_eq!(config.tracking.process_noise_mps, 3.0);
    }

    #[test]
    fn test_invalid_config_collects_all_errors() {
        let mut config = EngineConfig::default();
        config.tracking.heading_smoothing = 0.0;
        config.placement.snap_fraction = 0.3;
        config.interaction.pick_radius_m = -1.0;

        let result = config.validate();
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_fixed_position_warns() {
        let mut config = EngineConfig::default();
        config.tracking.fixed_position = Some(GeoPosition::new(48.158526, 11.578670));
        let result = config.validate();
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_config_serialization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");

        let mut manager = ConfigurationManager::new();
        let mut config = EngineConfig::default();
        config.placement.snap_fraction = 0.8;
        manager.update_config(config).unwrap();
        assert!(manager.is_modified());

        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.config().placement.snap_fraction, 0.8);
        assert_eq!(loaded.config(), manager.config());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{ "tracking": { "kalman_enabled": false } }"#).unwrap();

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert!(!loaded.config().tracking.kalman_enabled);
        assert_eq!(loaded.config().tracking.poll_interval_ms, 10);
        assert_eq!(loaded.config().interaction.raycast_max_distance_m, 1500.0);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "placement": { "snap_fraction": 2.0 } }"#).unwrap();
        assert!(matches!(
            ConfigurationManager::from_file(&path),
            Err(ConfigError::InvalidParameter { .. })
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            ConfigurationManager::from_file(&path),
            Err(ConfigError::SerializationError { .. })
        ));
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut manager = ConfigurationManager::new();
        assert!(matches!(manager.save(), Err(ConfigError::IoError { .. })));
    }
}
