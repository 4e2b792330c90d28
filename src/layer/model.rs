//! Layer document model
//!
//! Mirrors the JSON layer documents delivered by the layer service. Every
//! field is optional on the wire and falls back to the service defaults.

use crate::core::GeoPosition;
use serde::{Deserialize, Serialize};

/// Action label reserved for the position update interval
pub const POSITION_UPDATE_INTERVAL_LABEL: &str = "PositionUpdateInterval";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoiVector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoiTransform {
    /// Billboard: keep facing the viewer
    pub rel: bool,
    /// Rotation about the vertical axis (degrees)
    pub angle: f64,
    /// Uniform scale, must be non-zero
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoiAction {
    pub uri: String,
    pub label: String,
    pub content_type: String,
    pub activity_type: i32,
    pub show_activity: bool,
    pub activity_message: String,
}

impl Default for PoiAction {
    fn default() -> Self {
        Self {
            uri: String::new(),
            label: String::new(),
            content_type: String::new(),
            activity_type: 0,
            show_activity: true,
            activity_message: String::new(),
        }
    }
}

/// One authored animation entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoiAnimation {
    pub name: String,
    /// Kind keyword, matched case-insensitively
    #[serde(rename = "type")]
    pub kind: String,
    /// Seconds
    pub length: f64,
    /// Seconds
    pub delay: f64,
    pub interpolation: String,
    pub persist: bool,
    pub repeat: bool,
    pub from: f64,
    pub to: f64,
    pub axis: Option<PoiVector3>,
    /// Comma-separated names
    pub followed_by: String,
}

impl PoiAnimation {
    /// Trimmed, non-empty follow names in authored order
    pub fn followed_by_names(&self) -> Vec<String> {
        self.followed_by
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Animations keyed by trigger bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoiAnimations {
    pub on_create: Vec<PoiAnimation>,
    pub on_follow: Vec<PoiAnimation>,
    pub on_focus: Vec<PoiAnimation>,
    pub in_focus: Vec<PoiAnimation>,
    pub on_click: Vec<PoiAnimation>,
}

impl PoiAnimations {
    pub fn count(&self) -> usize {
        self.on_create.len()
            + self.on_follow.len()
            + self.on_focus.len()
            + self.in_focus.len()
            + self.on_click.len()
    }
}

/// Content description of a POI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoiObject {
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Content name
    pub full: String,
    /// Inner layer instantiated as child objects
    pub poi_layer_name: String,
    /// "x,y,z" offset in meters, places the object relative to the device or parent
    pub relative_location: String,
    #[serde(rename = "triggerImageURL")]
    pub trigger_image_url: String,
}

impl PoiObject {
    /// Parse the relative offset; missing or malformed parts read as 0
    pub fn relative_offset(&self) -> [f64; 3] {
        let mut offset = [0.0; 3];
        for (slot, part) in offset.iter_mut().zip(self.relative_location.split(',')) {
            *slot = part.trim().parse().unwrap_or(0.0);
        }
        offset
    }

    pub fn set_relative_offset(&mut self, offset: [f64; 3]) {
        self.relative_location = format!("{},{},{}", offset[0], offset[1], offset[2]);
    }
}

/// A point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Poi {
    pub id: i64,
    pub dimension: i32,
    pub is_visible: bool,
    pub title: String,
    pub transform: Option<PoiTransform>,
    #[serde(rename = "object")]
    pub poi_object: Option<PoiObject>,
    pub actions: Vec<PoiAction>,
    pub animations: Option<PoiAnimations>,
    #[serde(alias = "relativeAltitude")]
    pub relative_alt: f64,
    /// Micro-degrees
    pub lat: i64,
    /// Micro-degrees
    pub lon: i64,
    /// Meters, 0 disables the per-POI range check
    pub visibility_range: f64,
}

impl Default for Poi {
    fn default() -> Self {
        Self {
            id: 0,
            dimension: 0,
            is_visible: true,
            title: String::new(),
            transform: None,
            poi_object: None,
            actions: Vec::new(),
            animations: None,
            relative_alt: 0.0,
            lat: 0,
            lon: 0,
            visibility_range: 0.0,
        }
    }
}

impl Poi {
    pub fn latitude(&self) -> f64 {
        self.position().latitude
    }

    pub fn longitude(&self) -> f64 {
        self.position().longitude
    }

    pub fn position(&self) -> GeoPosition {
        GeoPosition::from_micro_degrees(self.lat, self.lon)
    }

    pub fn content_name(&self) -> &str {
        self.poi_object.as_ref().map(|o| o.full.trim()).unwrap_or("")
    }

    pub fn base_url(&self) -> &str {
        self.poi_object.as_ref().map(|o| o.base_url.trim()).unwrap_or("")
    }

    pub fn inner_layer_name(&self) -> &str {
        self.poi_object
            .as_ref()
            .map(|o| o.poi_layer_name.trim())
            .unwrap_or("")
    }

    pub fn trigger_image_url(&self) -> &str {
        self.poi_object
            .as_ref()
            .map(|o| o.trigger_image_url.trim())
            .unwrap_or("")
    }

    /// Placed relative to the device instead of by coordinates
    pub fn has_relative_location(&self) -> bool {
        self.poi_object
            .as_ref()
            .map_or(false, |o| !o.relative_location.trim().is_empty())
    }

    pub fn relative_offset(&self) -> [f64; 3] {
        self.poi_object
            .as_ref()
            .map(PoiObject::relative_offset)
            .unwrap_or([0.0; 3])
    }

    /// Eligible for instantiation: visible and naming some content
    pub fn is_placeable(&self) -> bool {
        self.is_visible && !self.content_name().is_empty()
    }
}

/// A layer document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layer {
    pub layer: String,
    pub layer_title: String,
    pub hotspots: Vec<Poi>,
    /// Seconds, values below 1 are ignored
    pub refresh_interval: f64,
    /// Area depth (meters)
    pub area_size: i32,
    pub area_width: i32,
    /// Meters
    pub visibility_range: i32,
    pub apply_kalman_filter: bool,
    pub actions: Vec<PoiAction>,
}

impl Default for Layer {
    fn default() -> Self {
        Self {
            layer: String::new(),
            layer_title: String::new(),
            hotspots: Vec::new(),
            refresh_interval: 0.0,
            area_size: 0,
            area_width: 0,
            visibility_range: 1500,
            apply_kalman_filter: true,
            actions: Vec::new(),
        }
    }
}

impl Layer {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// First shown, non-empty activity message not bound to a reserved label
    pub fn information_message(&self) -> Option<&str> {
        self.actions
            .iter()
            .filter(|a| a.show_activity && a.label.trim() != POSITION_UPDATE_INTERVAL_LABEL)
            .map(|a| a.activity_message.as_str())
            .find(|m| !m.trim().is_empty())
    }

    /// Position update interval (seconds) carried as a layer action, 0 when absent
    pub fn position_update_interval(&self) -> f64 {
        self.actions
            .iter()
            .find(|a| {
                a.show_activity
                    && a.label.trim() == POSITION_UPDATE_INTERVAL_LABEL
                    && !a.activity_message.trim().is_empty()
            })
            .and_then(|a| a.activity_message.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0)
    }
}
