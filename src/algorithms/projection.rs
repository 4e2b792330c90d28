//! Geodesic to local planar projection
//!
//! Objects are placed on a local plane centered on the device: +X points
//! east and +Z points north. Each axis is measured as a great-circle
//! distance so the result stays accurate over the few kilometers a layer
//! covers. When a bounded area is configured the plane wraps around like a
//! torus and objects shrink as they approach the seam.

use crate::core::{GeoPosition, EARTH_RADIUS_KM};
use serde::{Deserialize, Serialize};

/// Great-circle distance between two positions (meters)
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_KM * c * 1000.0
}

/// Distance between two positions (meters)
pub fn distance_between(a: GeoPosition, b: GeoPosition) -> f64 {
    haversine_distance_m(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Project an object position onto the device-centered plane
///
/// Returns `(x, z)` in meters: the east-west distance and the north-south
/// distance, each isolated by measuring against an auxiliary point that
/// shares the other coordinate with the object.
pub fn project(object_lat: f64, object_lon: f64, device_lat: f64, device_lon: f64) -> (f64, f64) {
    let mut z = haversine_distance_m(object_lat, object_lon, device_lat, object_lon);
    if object_lat < device_lat {
        z = -z;
    }

    let mut x = haversine_distance_m(object_lat, object_lon, object_lat, device_lon);
    if object_lon < device_lon {
        x = -x;
    }

    (x, z)
}

/// Wrap an offset into `[-dimension/2, dimension/2]`
///
/// A non-positive dimension disables wrapping.
pub fn wrap_offset(offset: f64, dimension: f64) -> f64 {
    if !(dimension > 0.0) || !offset.is_finite() {
        return offset;
    }
    let half = dimension / 2.0;
    let mut wrapped = offset;
    if wrapped.abs() > half {
        // Skip whole laps first, objects can be kilometers outside a small area
        wrapped -= (wrapped / dimension).trunc() * dimension;
    }
    while wrapped < -half {
        wrapped += dimension;
    }
    while wrapped > half {
        wrapped -= dimension;
    }
    wrapped
}

/// Toroidal placement area (meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    /// Extent along X (east-west)
    pub width: f64,
    /// Extent along Z (north-south)
    pub depth: f64,
}

impl AreaBounds {
    /// Build bounds from layer values; a single positive value makes a square
    pub fn normalized(width: f64, depth: f64) -> Self {
        let mut bounds = Self { width, depth };
        if bounds.depth <= 0.0 && bounds.width > 0.0 {
            bounds.depth = bounds.width;
        }
        if bounds.width <= 0.0 && bounds.depth > 0.0 {
            bounds.width = bounds.depth;
        }
        bounds
    }

    /// Wrapping only applies when both dimensions are positive
    pub fn is_active(&self) -> bool {
        self.width > 0.0 && self.depth > 0.0
    }

    /// Wrap an `(x, z)` offset into the area
    pub fn wrap(&self, x: f64, z: f64) -> (f64, f64) {
        if !self.is_active() {
            return (x, z);
        }
        (wrap_offset(x, self.width), wrap_offset(z, self.depth))
    }

    /// Distance from a wrapped offset to the nearest area border
    pub fn distance_to_border(&self, x: f64, z: f64) -> f64 {
        let dx = (self.width / 2.0 - x.abs()).abs();
        let dz = (self.depth / 2.0 - z.abs()).abs();
        dx.min(dz)
    }

    /// Render scale for a wrapped offset: shrinks to zero at the seam
    pub fn edge_scale(&self, x: f64, z: f64, edge_distance_m: f64) -> f64 {
        if !self.is_active() {
            return 1.0;
        }
        let distance = self.distance_to_border(x, z);
        if distance < edge_distance_m {
            distance
        } else {
            1.0
        }
    }

    /// Whether a move from `current` to `target` crosses far enough to be a wrap jump
    pub fn is_jump(&self, current: (f64, f64), target: (f64, f64), snap_fraction: f64) -> bool {
        if !self.is_active() {
            return false;
        }
        (current.0 - target.0).abs() > self.width * snap_fraction
            || (current.1 - target.1).abs() > self.depth * snap_fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_haversine_known_distance() {
        // One thousandth of a degree of latitude is ~111.2 m everywhere
        let d = haversine_distance_m(48.0, 11.0, 48.001, 11.0);
        assert!((d - 111.19).abs() < 0.1, "distance was {}", d);

        assert_eq!(haversine_distance_m(48.0, 11.0, 48.0, 11.0), 0.0);
    }

    #[test]
    fn test_projection_signs() {
        let (x, z) = project(48.001, 11.0, 48.0, 11.0);
        assert!(x.abs() < 1e-9);
        assert!(z > 111.0);

        let (x, z) = project(48.0, 10.999, 48.0, 11.0);
        assert!(x < -74.0 && x > -75.0, "x was {}", x);
        assert!(z.abs() < 1e-9);

        let (x, z) = project(47.999, 11.001, 48.0, 11.0);
        assert!(x > 0.0);
        assert!(z < 0.0);
    }

    #[test]
    fn test_wrap_offset() {
        assert!((wrap_offset(19.9, 20.0) - (-0.1)).abs() < 1e-9);
        assert!((wrap_offset(-15.0, 20.0) - 5.0).abs() < 1e-9);
        assert!((wrap_offset(1005.0, 20.0) - 5.0).abs() < 1e-9);
        assert_eq!(wrap_offset(7.0, 20.0), 7.0);
        assert_eq!(wrap_offset(70.0, 0.0), 70.0);
    }

    #[test]
    fn test_area_normalization() {
        let area = AreaBounds::normalized(20.0, 0.0);
        assert_eq!(area, AreaBounds { width: 20.0, depth: 20.0 });
        assert!(area.is_active());

        let area = AreaBounds::normalized(0.0, 30.0);
        assert_eq!(area.width, 30.0);

        assert!(!AreaBounds::normalized(0.0, 0.0).is_active());
        assert!(!AreaBounds::normalized(-1.0, -1.0).is_active());
    }

    #[test]
    fn test_edge_scale() {
        let area = AreaBounds::normalized(20.0, 20.0);
        assert_eq!(area.edge_scale(0.0, 0.0, 1.0), 1.0);
        assert!((area.edge_scale(9.5, 0.0, 1.0) - 0.5).abs() < 1e-9);
        assert!((area.edge_scale(0.0, -9.9, 1.0) - 0.1).abs() < 1e-9);
        assert_eq!(AreaBounds::default().edge_scale(9.9, 0.0, 1.0), 1.0);
    }

    #[test]
    fn test_jump_detection() {
        let area = AreaBounds::normalized(20.0, 20.0);
        assert!(area.is_jump((-9.0, 0.0), (9.5, 0.0), 0.75));
        assert!(!area.is_jump((-9.0, 0.0), (-0.1, 0.0), 0.75));
        assert!(!AreaBounds::default().is_jump((-900.0, 0.0), (900.0, 0.0), 0.75));
    }

    proptest! {
        #[test]
        fn wrapped_offset_stays_in_area(offset in -1.0e6f64..1.0e6, width in 0.5f64..5000.0) {
            let wrapped = wrap_offset(offset, width);
            prop_assert!(wrapped >= -width / 2.0 - 1e-9);
            prop_assert!(wrapped <= width / 2.0 + 1e-9);
        }
    }
}
