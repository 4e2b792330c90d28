//! Host-side actions triggered by animations

use crate::scene::object::ObjectId;
use tracing::info;

/// Actions the engine asks its host to perform
pub trait ExternalActions: Send {
    /// Open a link outside the AR view
    fn open_url(&mut self, url: &str);

    /// Play the audio cue attached to an object
    fn play_audio(&mut self, owner: ObjectId, cue: &str);

    /// A follow-chain asked for fresh layer data
    fn refresh_requested(&mut self) {}
}

/// Logs actions without performing them
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopActions;

impl ExternalActions for NoopActions {
    fn open_url(&mut self, url: &str) {
        info!(url, "Open URL requested");
    }

    fn play_audio(&mut self, owner: ObjectId, cue: &str) {
        info!(owner = owner.0, cue, "Audio cue requested");
    }
}

/// Records every requested action
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordedActions {
    pub urls: Vec<String>,
    pub audio: Vec<(ObjectId, String)>,
    pub refreshes: u32,
}

impl ExternalActions for RecordedActions {
    fn open_url(&mut self, url: &str) {
        self.urls.push(url.to_string());
    }

    fn play_audio(&mut self, owner: ObjectId, cue: &str) {
        self.audio.push((owner, cue.to_string()));
    }

    fn refresh_requested(&mut self) {
        self.refreshes += 1;
    }
}
