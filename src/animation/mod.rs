//! Trigger-bucketed animation state machines

pub mod conventions;
pub mod engine;
pub mod instance;
pub mod types;

pub use conventions::NameAction;
pub use engine::{AnimationEngine, AnimationFrame, AnimationReport, Billboard};
pub use instance::{AnimationEffect, AnimationInstance};
pub use types::{AnimationKind, Interpolation, TriggerBucket};
