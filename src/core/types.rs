//! Core data types for the positioning and placement pipeline

use crate::core::constants::{MICRO_DEGREE_SCALE, TICKS_PER_SECOND};
use serde::{Deserialize, Serialize};

/// Animation and frame clock value in 100 ns ticks
pub type Ticks = i64;

/// Convert seconds to clock ticks
pub fn seconds_to_ticks(seconds: f64) -> Ticks {
    (TICKS_PER_SECOND as f64 * seconds) as Ticks
}

/// Geodetic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Build from integer micro-degrees as carried by layer documents
    pub fn from_micro_degrees(lat: i64, lon: i64) -> Self {
        Self {
            latitude: lat as f64 / MICRO_DEGREE_SCALE,
            longitude: lon as f64 / MICRO_DEGREE_SCALE,
        }
    }
}

/// Raw device location reading, produced by the sensor collaborator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius (meters)
    pub horizontal_accuracy_m: f64,
    /// Reading timestamp (milliseconds)
    pub timestamp_ms: i64,
}

impl GeoSample {
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy_m: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy_m,
            timestamp_ms,
        }
    }

    pub fn position(&self) -> GeoPosition {
        GeoPosition::new(self.latitude, self.longitude)
    }
}
