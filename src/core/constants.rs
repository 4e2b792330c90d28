//! Physical constants and system parameters

/// Mean Earth radius used by the haversine distance (kilometers)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Animation clock resolution: 100 ns ticks
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Layer documents carry coordinates as integer micro-degrees
pub const MICRO_DEGREE_SCALE: f64 = 1_000_000.0;

/// Default Kalman process noise (meters per second)
pub const DEFAULT_PROCESS_NOISE_MPS: f64 = 3.0;

/// Horizontal accuracy below this is clamped before filtering (meters)
pub const MIN_HORIZONTAL_ACCURACY_M: f64 = 1.0;

/// Default layer visibility range (meters)
pub const DEFAULT_VISIBILITY_RANGE_M: f64 = 1500.0;

/// Consecutive location failures tolerated before the error becomes persistent
pub const MAX_CONSECUTIVE_LOCATION_FAILURES: u32 = 10;
