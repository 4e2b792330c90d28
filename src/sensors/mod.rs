//! Location and compass sources
//!
//! This module defines the interface the background poller reads from. A
//! platform integration implements [`LocationSource`] over its location and
//! compass services; [`MockLocationSource`] replays scripted readings for
//! tests and the demo.

pub mod error;
pub mod mock;
pub mod poller;

pub use error::{RecoveryStrategy, SensorError, SensorResult};
pub use mock::MockLocationSource;
pub use poller::{LocationPoller, PollOutcome, PollerHandle};

use crate::core::GeoSample;

/// Location and compass service interface
pub trait LocationSource: Send {
    /// Bring the service up, waiting at most `timeout_ms`
    fn start(&mut self, timeout_ms: u64) -> SensorResult<()>;

    /// Latest location reading, `None` when nothing is available yet
    fn read_sample(&mut self) -> SensorResult<Option<GeoSample>>;

    /// Latest compass heading in degrees
    fn read_heading(&mut self) -> SensorResult<Option<f64>>;

    /// Restart after a recoverable service failure
    fn restart(&mut self) -> SensorResult<()> {
        self.stop();
        self.start(0)
    }

    fn stop(&mut self);
}
