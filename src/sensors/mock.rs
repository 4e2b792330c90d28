//! Scripted location source for testing and development

use crate::core::GeoSample;
use crate::sensors::{LocationSource, SensorError, SensorResult};
use std::collections::VecDeque;

/// Replays queued readings; once the queue is drained the last reading repeats
#[derive(Debug, Default)]
pub struct MockLocationSource {
    samples: VecDeque<SensorResult<GeoSample>>,
    headings: VecDeque<f64>,
    last_sample: Option<GeoSample>,
    last_heading: Option<f64>,
    start_error: Option<SensorError>,
    started: bool,
    start_count: u32,
    read_count: u32,
}

impl MockLocationSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source that stays at one position
    pub fn stationary(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        let mut source = Self::new();
        source.push_sample(GeoSample::new(latitude, longitude, accuracy_m, 0));
        source
    }

    pub fn push_sample(&mut self, sample: GeoSample) {
        self.samples.push_back(Ok(sample));
    }

    /// Queue a failed reading
    pub fn push_failure(&mut self, error: SensorError) {
        self.samples.push_back(Err(error));
    }

    pub fn push_heading(&mut self, heading: f64) {
        self.headings.push_back(heading);
    }

    /// Make `start` fail with the given error
    pub fn fail_start(&mut self, error: SensorError) {
        self.start_error = Some(error);
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn start_count(&self) -> u32 {
        self.start_count
    }

    pub fn read_count(&self) -> u32 {
        self.read_count
    }
}

impl LocationSource for MockLocationSource {
    fn start(&mut self, _timeout_ms: u64) -> SensorResult<()> {
        self.start_count += 1;
        if let Some(error) = self.start_error.clone() {
            return Err(error);
        }
        self.started = true;
        Ok(())
    }

    fn read_sample(&mut self) -> SensorResult<Option<GeoSample>> {
        if !self.started {
            return Err(SensorError::ReadFailed {
                details: "source not started".to_string(),
            });
        }
        self.read_count += 1;
        match self.samples.pop_front() {
            Some(Ok(sample)) => {
                self.last_sample = Some(sample);
                Ok(Some(sample))
            }
            Some(Err(error)) => Err(error),
            None => Ok(self.last_sample),
        }
    }

    fn read_heading(&mut self) -> SensorResult<Option<f64>> {
        if let Some(heading) = self.headings.pop_front() {
            self.last_heading = Some(heading);
        }
        Ok(self.last_heading)
    }

    fn stop(&mut self) {
        self.started = false;
    }
}
