//! Common API types and data structures

use crate::core::{GeoPosition, Ticks};
use crate::scene::graph::NodeId;
use crate::scene::object::ObjectId;
use crate::sensors::SensorError;
use crate::utils::config::ConfigError;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub use crate::scene::graph::Ray;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error types
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// POI transform carries a zero scale
    #[error("Could not set scale for object {id}: scale must be non-zero")]
    InvalidScale { id: i64 },
    /// POI cannot be placed
    #[error("Invalid POI {id}: {reason}")]
    InvalidPoi { id: i64, reason: String },
    #[error("Unknown scene object {0}")]
    UnknownObject(ObjectId),
    /// Layer document could not be parsed
    #[error("Layer parse error: {0}")]
    LayerParse(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),
    /// Persistent location error, placement is suspended
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
    /// The registry mutex was poisoned by a panicking holder
    #[error("Scene registry lock poisoned")]
    LockPoisoned,
}

/// Pose supplied by a platform tracking subsystem for anchored objects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPose {
    /// Scene position of the anchor (meters)
    pub position: Vector3<f64>,
    /// Rotation about the vertical axis (degrees)
    pub yaw_deg: f64,
}

impl AnchorPose {
    pub fn new(position: Vector3<f64>, yaw_deg: f64) -> Self {
        Self { position, yaw_deg }
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No layer delivered yet
    #[default]
    WaitingForLayer,
    /// Layer delivered, no location fix yet
    WaitingForLocation,
    Running,
    /// Location service failed for good
    LocationError,
}

/// Per-frame input from the render host
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    /// Frame clock in 100 ns ticks
    pub now_ticks: Ticks,
    pub camera_position: Option<Vector3<f64>>,
    /// Ray from the view center
    pub focus_ray: Option<Ray>,
    /// Ray from the pointer, only on the frame of a press
    pub click_ray: Option<Ray>,
}

impl FrameInput {
    pub fn at(now_ticks: Ticks) -> Self {
        Self {
            now_ticks,
            ..Self::default()
        }
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub state: SessionState,
    /// Fused device position used for placement
    pub device: Option<GeoPosition>,
    /// Smoothed heading (degrees)
    pub heading: f64,
    pub fps: u32,
    pub created: Vec<ObjectId>,
    pub destroyed: Vec<ObjectId>,
    /// Objects whose placement target moved
    pub moved: Vec<ObjectId>,
    /// Duplicates enqueued for the next frame
    pub duplicated: Vec<ObjectId>,
    pub focused: Option<NodeId>,
    /// A click landed on an object with click animations
    pub clicked: bool,
    /// Information message with placeholders substituted
    pub information: Option<String>,
    /// Persistent location error shown to the user
    pub location_error: Option<String>,
}
