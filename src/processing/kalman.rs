use crate::core::{GeoPosition, GeoSample, DEFAULT_PROCESS_NOISE_MPS, MIN_HORIZONTAL_ACCURACY_M};

/// Filter state for the fused device location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanState {
    pub filtered_latitude: f64,
    pub filtered_longitude: f64,
    /// Position variance (m²), always > 0 once initialized
    pub variance_m2: f64,
    pub last_timestamp_ms: i64,
}

/// Scalar Kalman filter for latitude/longitude smoothing
///
/// The same variance is shared by both coordinates. The gain is
/// dimensionless, so it does not matter that the variance is in meters
/// while the filtered values are in degrees.
#[derive(Debug, Clone)]
pub struct LocationKalmanFilter {
    /// Current state estimate, `None` until the first sample
    pub state: Option<KalmanState>,
    /// Process noise (meters per second)
    pub process_noise_mps: f64,
    /// Accuracy floor applied to every sample (meters)
    pub min_accuracy_m: f64,
}

impl Default for LocationKalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationKalmanFilter {
    /// Create new filter with default parameters
    pub fn new() -> Self {
        Self {
            state: None,
            process_noise_mps: DEFAULT_PROCESS_NOISE_MPS,
            min_accuracy_m: MIN_HORIZONTAL_ACCURACY_M,
        }
    }

    /// Create filter with custom noise parameters
    pub fn with_noise_parameters(process_noise_mps: f64, min_accuracy_m: f64) -> Self {
        Self {
            state: None,
            process_noise_mps,
            min_accuracy_m: min_accuracy_m.max(f64::MIN_POSITIVE),
        }
    }

    /// Initialize filter directly from a reading
    pub fn initialize(&mut self, sample: &GeoSample) {
        let accuracy = self.clamp_accuracy(sample.horizontal_accuracy_m);
        self.state = Some(KalmanState {
            filtered_latitude: sample.latitude,
            filtered_longitude: sample.longitude,
            variance_m2: accuracy * accuracy,
            last_timestamp_ms: sample.timestamp_ms,
        });
    }

    /// Grow the variance for the time elapsed since the last sample
    pub fn predict(&mut self, timestamp_ms: i64) {
        let q = self.process_noise_mps;
        if let Some(state) = self.state.as_mut() {
            let elapsed_ms = timestamp_ms - state.last_timestamp_ms;
            if elapsed_ms > 0 {
                state.variance_m2 += elapsed_ms as f64 * q * q / 1000.0;
                state.last_timestamp_ms = timestamp_ms;
            }
        }
    }

    /// Update filter with a new reading and return the fused position
    pub fn update(&mut self, sample: &GeoSample) -> GeoPosition {
        if self.state.is_none() {
            self.initialize(sample);
            return sample.position();
        }

        self.predict(sample.timestamp_ms);

        let accuracy = self.clamp_accuracy(sample.horizontal_accuracy_m);
        let measurement_variance = accuracy * accuracy;

        match self.state.as_mut() {
            Some(state) => {
                let k = state.variance_m2 / (state.variance_m2 + measurement_variance);
                state.filtered_latitude += k * (sample.latitude - state.filtered_latitude);
                state.filtered_longitude += k * (sample.longitude - state.filtered_longitude);
                state.variance_m2 *= 1.0 - k;
                GeoPosition::new(state.filtered_latitude, state.filtered_longitude)
            }
            None => sample.position(),
        }
    }

    /// Gain the next sample of the given accuracy would receive, without updating
    pub fn gain_for(&self, horizontal_accuracy_m: f64, timestamp_ms: i64) -> Option<f64> {
        let state = self.state?;
        let elapsed_ms = (timestamp_ms - state.last_timestamp_ms).max(0);
        let variance = state.variance_m2
            + elapsed_ms as f64 * self.process_noise_mps * self.process_noise_mps / 1000.0;
        let accuracy = self.clamp_accuracy(horizontal_accuracy_m);
        Some(variance / (variance + accuracy * accuracy))
    }

    /// Get current position estimate
    pub fn get_position(&self) -> Option<GeoPosition> {
        self.state
            .map(|s| GeoPosition::new(s.filtered_latitude, s.filtered_longitude))
    }

    /// Get position uncertainty (standard deviation in meters)
    pub fn get_position_uncertainty(&self) -> Option<f64> {
        self.state.map(|s| s.variance_m2.sqrt())
    }

    /// Check if filter is initialized
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.state = None;
    }

    fn clamp_accuracy(&self, accuracy: f64) -> f64 {
        // NaN fails the comparison and is clamped as well
        if accuracy >= self.min_accuracy_m {
            accuracy
        } else {
            self.min_accuracy_m
        }
    }
}
