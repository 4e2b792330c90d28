//! Device position tracking
//!
//! `PositionTracker` is owned by the producing side (sensor poller or
//! platform callback). It publishes into a [`SharedPose`], which the render
//! loop reads without locking: the producer is the only writer of the
//! coordinates and heading, and each value is an independent atomic scalar.

use crate::core::{GeoPosition, GeoSample};
use crate::processing::kalman::LocationKalmanFilter;
use crate::utils::config::TrackingConfig;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Lock-free publication point between the tracker and the render loop
#[derive(Debug)]
pub struct SharedPose {
    latitude_bits: AtomicU64,
    longitude_bits: AtomicU64,
    raw_heading_bits: AtomicU64,
    has_fix: AtomicBool,
    kalman_enabled: AtomicBool,
    /// Persistent, user-visible location error
    error: Mutex<Option<String>>,
}

impl SharedPose {
    pub fn new(kalman_enabled: bool) -> Self {
        Self {
            latitude_bits: AtomicU64::new(0f64.to_bits()),
            longitude_bits: AtomicU64::new(0f64.to_bits()),
            raw_heading_bits: AtomicU64::new(0f64.to_bits()),
            has_fix: AtomicBool::new(false),
            kalman_enabled: AtomicBool::new(kalman_enabled),
            error: Mutex::new(None),
        }
    }

    /// Fused (or overridden) device position, `None` before the first fix
    pub fn position(&self) -> Option<GeoPosition> {
        if !self.has_fix.load(Ordering::Acquire) {
            return None;
        }
        Some(GeoPosition::new(
            f64::from_bits(self.latitude_bits.load(Ordering::Relaxed)),
            f64::from_bits(self.longitude_bits.load(Ordering::Relaxed)),
        ))
    }

    /// Latest raw compass heading (degrees)
    pub fn raw_heading(&self) -> f64 {
        f64::from_bits(self.raw_heading_bits.load(Ordering::Relaxed))
    }

    pub fn kalman_enabled(&self) -> bool {
        self.kalman_enabled.load(Ordering::Relaxed)
    }

    /// Toggle filtering; layers may switch it off
    pub fn set_kalman_enabled(&self, enabled: bool) {
        self.kalman_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|e| e.clone())
    }

    pub fn set_error(&self, message: impl Into<String>) {
        if let Ok(mut error) = self.error.lock() {
            *error = Some(message.into());
        }
    }

    pub fn clear_error(&self) {
        if let Ok(mut error) = self.error.lock() {
            *error = None;
        }
    }

    fn publish_position(&self, position: GeoPosition) {
        self.latitude_bits
            .store(position.latitude.to_bits(), Ordering::Relaxed);
        self.longitude_bits
            .store(position.longitude.to_bits(), Ordering::Relaxed);
        self.has_fix.store(true, Ordering::Release);
    }

    fn publish_heading(&self, heading: f64) {
        self.raw_heading_bits
            .store(heading.to_bits(), Ordering::Relaxed);
    }
}

/// Fuses raw location samples and compass readings into a stable estimate
pub struct PositionTracker {
    filter: LocationKalmanFilter,
    /// Latest fused (or pass-through) position
    fused: Option<GeoPosition>,
    /// Fixed position for device-independent demo or test mode
    fixed_position: Option<GeoPosition>,
    last_sample: Option<GeoSample>,
    pose: Arc<SharedPose>,
}

impl PositionTracker {
    pub fn new(config: &TrackingConfig) -> Self {
        let pose = Arc::new(SharedPose::new(config.kalman_enabled));
        Self::with_pose(config, pose)
    }

    /// Create a tracker publishing into an existing pose
    pub fn with_pose(config: &TrackingConfig, pose: Arc<SharedPose>) -> Self {
        let mut tracker = Self {
            filter: LocationKalmanFilter::with_noise_parameters(
                config.process_noise_mps,
                config.min_accuracy_m,
            ),
            fused: None,
            fixed_position: None,
            last_sample: None,
            pose,
        };
        tracker.set_fixed_position(config.fixed_position);
        tracker
    }

    /// Handle for the render side
    pub fn pose(&self) -> Arc<SharedPose> {
        Arc::clone(&self.pose)
    }

    /// Ingest a raw location sample
    pub fn ingest(&mut self, sample: GeoSample) -> GeoPosition {
        if !sample.latitude.is_finite() || !sample.longitude.is_finite() {
            warn!(?sample, "Ignoring non-finite location sample");
            return self.current_position().unwrap_or_default();
        }

        let fused = if self.pose.kalman_enabled() {
            self.filter.update(&sample)
        } else {
            // Keep the filter in step so re-enabling starts from the latest reading
            self.filter.initialize(&sample);
            sample.position()
        };

        debug!(
            latitude = fused.latitude,
            longitude = fused.longitude,
            accuracy = sample.horizontal_accuracy_m,
            "Fused location sample"
        );

        self.fused = Some(fused);
        self.last_sample = Some(sample);
        if self.fixed_position.is_none() {
            self.pose.publish_position(fused);
        }
        fused
    }

    /// Ingest a sample only if it differs from the previous reading
    pub fn ingest_if_changed(&mut self, sample: GeoSample) -> bool {
        if self.last_sample == Some(sample) {
            return false;
        }
        self.ingest(sample);
        true
    }

    /// Publish a raw compass heading (degrees); smoothing happens per frame
    /// on the render side
    pub fn ingest_heading(&mut self, heading: f64) {
        if heading.is_finite() {
            self.pose.publish_heading(heading);
        }
    }

    /// Fused position, or the fixed override when configured
    pub fn current_position(&self) -> Option<GeoPosition> {
        self.fixed_position.or(self.fused)
    }

    /// Override the device position, `None` returns to sensor input
    pub fn set_fixed_position(&mut self, position: Option<GeoPosition>) {
        self.fixed_position = position;
        if let Some(position) = self.current_position() {
            self.pose.publish_position(position);
        }
    }

    pub fn filter(&self) -> &LocationKalmanFilter {
        &self.filter
    }
}
