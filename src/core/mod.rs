//! Core types and constants for the geolocated scene engine

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
