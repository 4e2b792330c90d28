//! Information message templating
//!
//! Layers may carry a message with placeholders that the host shows as a
//! status line. Supported placeholders:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{F}` | frames per second |
//! | `{N}` | live object count |
//! | `{A}` | animation count |
//! | `{H}` | displayed heading (whole degrees) |
//! | `{C}` | raw compass heading (whole degrees) |
//! | `{LAT}` `{LON}` | device position, 6 decimals |
//! | `{LAT1}` `{LON1}` | first object position, 6 decimals |
//! | `{D1}` `{DNS1}` `{DEW1}` | distance to the first object, total / north-south / east-west, 1 decimal |

use crate::algorithms::projection::haversine_distance_m;
use crate::core::GeoPosition;

/// Values available to the information message
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    pub fps: u32,
    pub object_count: usize,
    pub animation_count: usize,
    pub displayed_heading: f64,
    pub raw_heading: f64,
    pub device: GeoPosition,
    pub first_object: Option<GeoPosition>,
}

/// Substitute every known placeholder in `template`
pub fn render_information(template: &str, status: &StatusSnapshot) -> String {
    let device = status.device;
    let first = status.first_object;
    let distance = |lat: f64, lon: f64| haversine_distance_m(device.latitude, device.longitude, lat, lon);
    let (d1, dns1, dew1) = match first {
        Some(p) => (
            distance(p.latitude, p.longitude),
            distance(p.latitude, device.longitude),
            distance(device.latitude, p.longitude),
        ),
        None => (0.0, 0.0, 0.0),
    };
    let first = first.unwrap_or_default();

    // Longer keys sharing a prefix go first
    let replacements = [
        ("{LAT1}", format!("{:.6}", first.latitude)),
        ("{LON1}", format!("{:.6}", first.longitude)),
        ("{DNS1}", format!("{:.1}", dns1)),
        ("{DEW1}", format!("{:.1}", dew1)),
        ("{D1}", format!("{:.1}", d1)),
        ("{LAT}", format!("{:.6}", device.latitude)),
        ("{LON}", format!("{:.6}", device.longitude)),
        ("{F}", status.fps.to_string()),
        ("{N}", status.object_count.to_string()),
        ("{A}", status.animation_count.to_string()),
        ("{H}", (status.displayed_heading as i64).to_string()),
        ("{C}", (status.raw_heading as i64).to_string()),
    ];

    replacements
        .iter()
        .fold(template.to_string(), |message, (key, value)| message.replace(key, value))
}
