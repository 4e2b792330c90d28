//! Layer delivery bookkeeping shared with the network collaborator
//!
//! Selecting a layer bumps a generation counter. Fetches carry the ticket
//! they were started with, and a delivery whose ticket is older than the
//! current generation is discarded instead of applied.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Generation a fetch was started under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerTicket(u64);

impl LayerTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct LayerFeed {
    generation: AtomicU64,
    refresh_requested: AtomicBool,
    consecutive_failures: AtomicU32,
    selected: Mutex<Option<String>>,
    last_error: Mutex<Option<String>>,
}

impl LayerFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to a new layer, invalidating every fetch in flight
    pub fn select_layer(&self, name: &str) -> LayerTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        if let Ok(mut selected) = self.selected.lock() {
            *selected = Some(name.to_string());
        }
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.clear_error();
        debug!(layer = name, generation, "Selected layer");
        LayerTicket(generation)
    }

    pub fn selected_layer(&self) -> Option<String> {
        self.selected.lock().ok().and_then(|s| s.clone())
    }

    /// Ticket for a fetch of the current layer
    pub fn ticket(&self) -> LayerTicket {
        LayerTicket(self.generation.load(Ordering::Acquire))
    }

    pub fn is_current(&self, ticket: LayerTicket) -> bool {
        ticket.0 == self.generation.load(Ordering::Acquire)
    }

    /// Ask the collaborator to refetch the current layer
    pub fn request_refresh(&self) {
        self.refresh_requested.store(true, Ordering::Release);
    }

    /// Consume a pending refresh request
    pub fn take_refresh_request(&self) -> bool {
        self.refresh_requested.swap(false, Ordering::AcqRel)
    }

    /// Record a failed fetch, returns the number of consecutive failures
    ///
    /// Failures of stale fetches are ignored and report 0.
    pub fn record_failure(&self, ticket: LayerTicket, message: &str) -> u32 {
        if !self.is_current(ticket) {
            debug!(generation = ticket.0, "Ignoring failure of stale layer fetch");
            return 0;
        }
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        warn!(failures, error = message, "Layer fetch failed, will retry");
        if let Ok(mut error) = self.last_error.lock() {
            *error = Some(message.to_string());
        }
        failures
    }

    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.clear_error();
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Last fetch error, cleared by a successful delivery
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }

    fn clear_error(&self) {
        if let Ok(mut error) = self.last_error.lock() {
            *error = None;
        }
    }
}
