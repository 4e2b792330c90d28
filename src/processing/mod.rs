//! Sensor fusion: location filtering, heading smoothing and pose publication

pub mod kalman;
pub mod heading;
pub mod tracker;

pub use kalman::{KalmanState, LocationKalmanFilter};
pub use heading::HeadingSmoother;
pub use tracker::{PositionTracker, SharedPose};
