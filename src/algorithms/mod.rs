//! Projection and placement algorithms

pub mod placement;
pub mod projection;

pub use placement::{FrameCounter, Placer};
pub use projection::{distance_between, haversine_distance_m, project, wrap_offset, AreaBounds};
