//! Geolocated AR scene engine
//!
//! Places points of interest from layer documents into an augmented-reality
//! scene and drives their animations: location samples are fused into a
//! stable device position, geodesic coordinates are projected onto a local
//! plane (optionally wrapped into a bounded area), and per-object animation
//! state machines run on top of the placed transforms.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod scene;
pub mod animation;
pub mod layer;
pub mod sensors;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{GeoPosition, GeoSample, Ticks, TICKS_PER_SECOND};
pub use algorithms::projection::{project, wrap_offset, AreaBounds};
pub use processing::{KalmanState, LocationKalmanFilter, PositionTracker, SharedPose};
pub use scene::{ObjectId, SceneGraph, SceneObject, SceneObjectRegistry};
pub use animation::{AnimationEngine, AnimationInstance, AnimationKind, Interpolation, TriggerBucket};
pub use layer::{Layer, LayerFeed, LayerSettings, Poi};
pub use sensors::{LocationPoller, LocationSource, MockLocationSource, SensorError};
pub use utils::config::{ConfigError, ConfigurationManager, EngineConfig};
pub use api::{
    AnchorPose, ArSession, EngineError, EngineResult, ExternalActions, FrameInput, FrameReport,
    NoopActions, SessionHandle, SessionState,
};
