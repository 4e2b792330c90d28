use crate::api::types::AnchorPose;
use crate::layer::model::Poi;
use crate::scene::graph::NodeId;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a scene object, unique among live objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub i64);

impl ObjectId {
    /// Id of a child object instantiated from a parent's inner layer
    pub fn child_of(parent: ObjectId, child_poi_id: i64) -> Self {
        // Layer ids are untrusted, wrap on overflow
        Self(parent.0.wrapping_mul(-1_000_000).wrapping_sub(child_poi_id))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectState {
    Live,
    /// Removal requested, applied at the next synchronization
    PendingDeletion,
    /// Terminal
    Destroyed,
}

/// Where an object came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectOrigin {
    /// Instantiated from a delivered layer, reconciled on refresh
    Layer,
    /// Placed by a platform tracking subsystem, exempt from reconciliation
    Anchored,
    /// Cloned by a duplicate animation, exempt from reconciliation
    Duplicate,
}

/// A placed point of interest
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    /// POI the object was built from
    pub poi: Poi,
    pub latitude: f64,
    pub longitude: f64,
    pub relative_altitude: f64,
    /// Placed relative to the device, anchor or parent rather than projected
    pub is_relative: bool,
    pub current_scale: f64,
    pub target_local_position: Vector3<f64>,
    /// Outermost node, moved by placement
    pub wrapper: NodeId,
    /// Content nodes
    pub render_handles: Vec<NodeId>,
    /// Innermost wrapper, where child objects attach
    pub attach_point: NodeId,
    /// Tracking pose the object was placed against
    pub anchor: Option<AnchorPose>,
    pub child_objects: Vec<ObjectId>,
    pub parent: Option<ObjectId>,
    pub state: ObjectState,
    pub origin: ObjectOrigin,
    /// Coordinates changed since the last placement pass
    pub position_dirty: bool,
}

impl SceneObject {
    pub fn content_name(&self) -> &str {
        self.poi.content_name()
    }

    pub fn base_url(&self) -> &str {
        self.poi.base_url()
    }

    pub fn is_live(&self) -> bool {
        self.state == ObjectState::Live
    }

    /// Whether a refreshed POI still describes this object
    ///
    /// An empty base URL on the refreshed POI matches any.
    pub fn matches(&self, poi: &Poi) -> bool {
        self.id.0 == poi.id
            && self.content_name() == poi.content_name()
            && (poi.base_url().is_empty() || self.base_url() == poi.base_url())
    }

    /// Adopt refreshed coordinates, returns whether they changed
    pub fn update_coordinates(&mut self, poi: &Poi) -> bool {
        let (latitude, longitude) = (poi.latitude(), poi.longitude());
        let changed = latitude != self.latitude || longitude != self.longitude;
        if changed {
            self.latitude = latitude;
            self.longitude = longitude;
            self.position_dirty = true;
        }
        self.poi = poi.clone();
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::model::PoiObject;
    use crate::scene::graph::SceneGraph;

    fn poi(id: i64, name: &str, url: &str) -> Poi {
        Poi {
            id,
            lat: 48_000_000,
            lon: 11_000_000,
            poi_object: Some(PoiObject {
                full: name.to_string(),
                base_url: url.to_string(),
                ..PoiObject::default()
            }),
            ..Poi::default()
        }
    }

    fn object(poi: Poi) -> SceneObject {
        let graph = SceneGraph::new();
        SceneObject {
            id: ObjectId(poi.id),
            latitude: poi.latitude(),
            longitude: poi.longitude(),
            relative_altitude: 0.0,
            is_relative: false,
            current_scale: 1.0,
            target_local_position: Vector3::zeros(),
            wrapper: graph.root(),
            render_handles: Vec::new(),
            attach_point: graph.root(),
            anchor: None,
            child_objects: Vec::new(),
            parent: None,
            state: ObjectState::Live,
            origin: ObjectOrigin::Layer,
            position_dirty: false,
            poi,
        }
    }

    #[test]
    fn test_child_ids() {
        assert_eq!(ObjectId::child_of(ObjectId(3), 7), ObjectId(-3_000_007));
    }

    #[test]
    fn test_child_ids_of_huge_parent_wrap() {
        let id = ObjectId::child_of(ObjectId(10_000_000_000_000), 1);
        assert_eq!(id, ObjectId(10_000_000_000_000i64.wrapping_mul(-1_000_000) - 1));
        let id = ObjectId::child_of(ObjectId(i64::MIN), i64::MAX);
        assert_eq!(id.0, i64::MIN.wrapping_mul(-1_000_000).wrapping_sub(i64::MAX));
    }

    #[test]
    fn test_matching_refreshed_poi() {
        let obj = object(poi(1, "Cube", "https://a"));
        assert!(obj.matches(&poi(1, "Cube", "https://a")));
        assert!(obj.matches(&poi(1, "Cube", "")));
        assert!(!obj.matches(&poi(1, "Cube", "https://b")));
        assert!(!obj.matches(&poi(1, "Sphere", "https://a")));
        assert!(!obj.matches(&poi(2, "Cube", "https://a")));
    }

    #[test]
    fn test_update_coordinates_marks_dirty() {
        let mut obj = object(poi(1, "Cube", ""));
        assert!(!obj.update_coordinates(&poi(1, "Cube", "")));
        assert!(!obj.position_dirty);

        let mut moved = poi(1, "Cube", "");
        moved.lat += 10;
        assert!(obj.update_coordinates(&moved));
        assert!(obj.position_dirty);
        assert!((obj.latitude - 48.00001).abs() < 1e-9);
    }
}
