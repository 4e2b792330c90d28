//! Collaborator-facing API
//!
//! The render host drives an [`ArSession`] once per frame; producers reach it
//! through a [`SessionHandle`]. Animations reach back out to the host through
//! [`ExternalActions`].

pub mod actions;
pub mod session;
pub mod status;
pub mod types;

pub use actions::{ExternalActions, NoopActions, RecordedActions};
pub use session::{ArSession, SessionHandle};
pub use status::{render_information, StatusSnapshot};
pub use types::{
    AnchorPose, EngineError, EngineResult, FrameInput, FrameReport, Ray, SessionState,
};
