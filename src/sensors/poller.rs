//! Background location polling
//!
//! The poller owns the [`PositionTracker`] and is the only writer of the
//! [`SharedPose`] coordinates. Readings are fed to the filter only when they
//! differ from the previous one and, when an update interval is configured,
//! no more often than that interval. Failures are counted; once the count
//! passes the configured limit the pose carries a persistent error and the
//! poller stops.

use crate::processing::tracker::{PositionTracker, SharedPose};
use crate::sensors::{LocationSource, RecoveryStrategy, SensorError, SensorResult};
use crate::utils::config::TrackingConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Result of a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// New reading fed to the tracker
    Updated,
    /// Reading identical to the previous one
    Unchanged,
    /// Reading dropped by the update interval
    Throttled,
    /// Source had nothing yet
    NoReading,
    /// Reading failed, will retry
    Failed,
}

pub struct LocationPoller<S: LocationSource> {
    source: S,
    tracker: PositionTracker,
    config: TrackingConfig,
    consecutive_failures: u32,
    last_update: Option<Instant>,
}

impl<S: LocationSource> LocationPoller<S> {
    pub fn new(source: S, config: &TrackingConfig) -> Self {
        Self::with_tracker(source, PositionTracker::new(config), config)
    }

    /// Poll into an existing tracker
    pub fn with_tracker(source: S, tracker: PositionTracker, config: &TrackingConfig) -> Self {
        Self {
            source,
            tracker,
            config: config.clone(),
            consecutive_failures: 0,
            last_update: None,
        }
    }

    pub fn pose(&self) -> Arc<SharedPose> {
        self.tracker.pose()
    }

    pub fn tracker(&self) -> &PositionTracker {
        &self.tracker
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Bring the source up; failure is terminal for the session
    pub fn start(&mut self) -> SensorResult<()> {
        match self.source.start(self.config.init_timeout_ms) {
            Ok(()) => {
                info!("Location service started");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Location service failed to start");
                self.tracker.pose().set_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Read one location sample and heading
    ///
    /// Only terminal errors are returned; recoverable ones are counted.
    pub fn poll_once(&mut self) -> SensorResult<PollOutcome> {
        match self.source.read_heading() {
            Ok(Some(heading)) => self.tracker.ingest_heading(heading),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Compass reading failed"),
        }

        let sample = match self.source.read_sample() {
            Ok(sample) => sample,
            Err(e) => return self.handle_failure(e).map(|_| PollOutcome::Failed),
        };
        self.consecutive_failures = 0;

        let Some(sample) = sample else {
            return Ok(PollOutcome::NoReading);
        };

        if let Some(last) = self.last_update {
            let interval = Duration::from_millis(self.config.position_update_interval_ms);
            if last.elapsed() < interval {
                return Ok(PollOutcome::Throttled);
            }
        }

        if self.tracker.ingest_if_changed(sample) {
            self.last_update = Some(Instant::now());
            Ok(PollOutcome::Updated)
        } else {
            Ok(PollOutcome::Unchanged)
        }
    }

    fn handle_failure(&mut self, e: SensorError) -> SensorResult<()> {
        self.consecutive_failures += 1;
        warn!(
            error = %e,
            failures = self.consecutive_failures,
            "Location reading failed"
        );

        let escalated = if self.consecutive_failures > self.config.max_consecutive_failures {
            SensorError::TooManyFailures {
                failures: self.consecutive_failures,
            }
        } else {
            match e.recovery_strategy() {
                RecoveryStrategy::RetryNextPoll => return Ok(()),
                RecoveryStrategy::Restart => match self.source.restart() {
                    Ok(()) => {
                        info!("Location service restarted");
                        return Ok(());
                    }
                    Err(restart_error) if !restart_error.is_terminal() => return Ok(()),
                    Err(restart_error) => restart_error,
                },
                RecoveryStrategy::Fail => e,
            }
        };

        error!(error = %escalated, "Location tracking stopped");
        self.tracker.pose().set_error(escalated.to_string());
        Err(escalated)
    }

    /// Run the poll loop until `stop` is set or a terminal error occurs
    pub fn run(&mut self, stop: &AtomicBool) {
        if self.start().is_err() {
            return;
        }
        let interval = Duration::from_millis(self.config.poll_interval_ms.max(1));
        while !stop.load(Ordering::Relaxed) {
            if self.poll_once().is_err() {
                break;
            }
            thread::sleep(interval);
        }
        self.source.stop();
        debug!("Location poller finished");
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: LocationSource + 'static> LocationPoller<S> {
    /// Move the poller onto its own thread
    pub fn spawn(mut self) -> std::io::Result<PollerHandle<S>> {
        let stop = Arc::new(AtomicBool::new(false));
        let pose = self.pose();
        let thread_stop = Arc::clone(&stop);
        let thread = thread::Builder::new()
            .name("geoar-location".to_string())
            .spawn(move || {
                self.run(&thread_stop);
                self.into_source()
            })?;
        Ok(PollerHandle {
            stop,
            pose,
            thread: Some(thread),
        })
    }
}

/// Owner side of a spawned poller
pub struct PollerHandle<S: LocationSource> {
    stop: Arc<AtomicBool>,
    pose: Arc<SharedPose>,
    thread: Option<JoinHandle<S>>,
}

impl<S: LocationSource> PollerHandle<S> {
    pub fn pose(&self) -> Arc<SharedPose> {
        Arc::clone(&self.pose)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Stop polling and hand the source back
    pub fn stop(mut self) -> Option<S> {
        self.stop.store(true, Ordering::Relaxed);
        self.thread.take().and_then(|t| t.join().ok())
    }
}

impl<S: LocationSource> Drop for PollerHandle<S> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeoSample;
    use crate::sensors::MockLocationSource;

    fn config() -> TrackingConfig {
        TrackingConfig {
            poll_interval_ms: 1,
            max_consecutive_failures: 2,
            ..TrackingConfig::default()
        }
    }

    fn started(source: MockLocationSource) -> LocationPoller<MockLocationSource> {
        let mut poller = LocationPoller::new(source, &config());
        poller.start().unwrap();
        poller
    }

    #[test]
    fn test_feeds_only_changed_readings() {
        let mut poller = started(MockLocationSource::stationary(48.0, 11.0, 5.0));
        assert_eq!(poller.poll_once().unwrap(), PollOutcome::Updated);
        assert_eq!(poller.poll_once().unwrap(), PollOutcome::Unchanged);
        assert!(poller.pose().position().is_some());
    }

    #[test]
    fn test_update_interval_throttles() {
        let mut source = MockLocationSource::stationary(48.0, 11.0, 5.0);
        source.push_sample(GeoSample::new(48.1, 11.0, 5.0, 1));
        let cfg = TrackingConfig {
            position_update_interval_ms: 60_000,
            ..config()
        };
        let mut poller = LocationPoller::new(source, &cfg);
        poller.start().unwrap();

        assert_eq!(poller.poll_once().unwrap(), PollOutcome::Updated);
        assert_eq!(poller.poll_once().unwrap(), PollOutcome::Throttled);
    }

    #[test]
    fn test_failures_escalate_to_persistent_error() {
        let mut source = MockLocationSource::new();
        for _ in 0..3 {
            source.push_failure(SensorError::ReadFailed { details: "no fix".into() });
        }
        let mut poller = started(source);

        assert_eq!(poller.poll_once().unwrap(), PollOutcome::Failed);
        assert_eq!(poller.poll_once().unwrap(), PollOutcome::Failed);
        assert!(poller.pose().error().is_none());

        let err = poller.poll_once().unwrap_err();
        assert_eq!(err, SensorError::TooManyFailures { failures: 3 });
        assert!(poller.pose().error().unwrap().contains("3 consecutive"));
    }

    #[test]
    fn test_success_resets_failure_count() {
        let mut source = MockLocationSource::new();
        source.push_failure(SensorError::ReadFailed { details: "gap".into() });
        source.push_sample(GeoSample::new(48.0, 11.0, 5.0, 0));
        let mut poller = started(source);

        poller.poll_once().unwrap();
        assert_eq!(poller.consecutive_failures(), 1);
        poller.poll_once().unwrap();
        assert_eq!(poller.consecutive_failures(), 0);
    }

    #[test]
    fn test_service_failure_restarts_source() {
        let mut source = MockLocationSource::new();
        source.push_failure(SensorError::ServiceFailed { details: "reset".into() });
        let mut poller = started(source);

        assert_eq!(poller.poll_once().unwrap(), PollOutcome::Failed);
        assert_eq!(poller.into_source().start_count(), 2);
    }

    #[test]
    fn test_start_failure_sets_error() {
        let mut source = MockLocationSource::new();
        source.fail_start(SensorError::ServiceDisabled);
        let mut poller = LocationPoller::new(source, &config());

        assert!(poller.start().is_err());
        assert_eq!(poller.pose().error().unwrap(), "Location service is disabled");
    }

    #[test]
    fn test_spawned_poller_publishes_and_stops() {
        let poller = LocationPoller::new(MockLocationSource::stationary(48.0, 11.0, 5.0), &config());
        let handle = poller.spawn().unwrap();
        let pose = handle.pose();

        let deadline = Instant::now() + Duration::from_secs(5);
        while pose.position().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(pose.position().is_some());

        let source = handle.stop().unwrap();
        assert!(!source.is_started());
    }
}
