//! Layer documents, merged layer settings and delivery bookkeeping

pub mod feed;
pub mod model;
pub mod settings;

pub use feed::{LayerFeed, LayerTicket};
pub use model::{Layer, Poi, PoiAnimation, PoiAnimations, PoiObject, PoiTransform, PoiVector3};
pub use settings::LayerSettings;
