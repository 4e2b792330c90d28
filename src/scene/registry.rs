//! Scene object registry
//!
//! Structural changes cross from the producing side to the render loop
//! through a [`RegistryInbox`]: the producer appends layer updates, POIs and
//! deletion requests under the inbox mutex and raises the dirty flag. The
//! render loop calls [`SceneObjectRegistry::synchronize`] once per frame;
//! when the flag is set it holds the same mutex while it destroys pending
//! objects, reconciles and instantiates, recomputes the set of objects to
//! place and clears the flag. Everything outside that call (placement,
//! animation) is render-side only and takes no lock.

use crate::algorithms::projection::{distance_between, project};
use crate::animation::engine::AnimationEngine;
use crate::api::types::{AnchorPose, EngineError, EngineResult};
use crate::core::GeoPosition;
use crate::layer::model::{Layer, Poi};
use crate::layer::settings::LayerSettings;
use crate::scene::builder::build_object;
use crate::scene::graph::{NodeId, SceneGraph};
use crate::scene::object::{ObjectId, ObjectOrigin, ObjectState, SceneObject};
use crate::utils::config::EngineConfig;
use nalgebra::{Rotation3, Vector3};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// A full set of delivered layers
#[derive(Debug, Clone, Default)]
pub struct LayerUpdate {
    pub layers: Vec<Layer>,
    /// Layers referenced by POIs as inner layers, keyed by layer name
    pub inner_layers: HashMap<String, Layer>,
}

#[derive(Debug, Clone)]
struct PendingPoi {
    poi: Poi,
    origin: ObjectOrigin,
    anchor: Option<AnchorPose>,
    /// Layer visibility range (meters), 0 disables the check
    visibility_range: f64,
}

#[derive(Debug, Default)]
struct PendingChanges {
    layers: Option<LayerUpdate>,
    pois: Vec<PendingPoi>,
    deletions: Vec<ObjectId>,
}

/// Producer-facing half of the registry
#[derive(Debug, Default)]
pub struct RegistryInbox {
    pending: Mutex<PendingChanges>,
    dirty: AtomicBool,
}

impl RegistryInbox {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, PendingChanges>> {
        self.pending.lock().map_err(|_| EngineError::LockPoisoned)
    }

    /// Replace the pending layer set; the latest delivery wins
    pub fn submit_layers(&self, update: LayerUpdate) -> EngineResult<()> {
        let mut pending = self.lock()?;
        pending.layers = Some(update);
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Queue a POI placed outside the layer flow
    pub fn submit_poi(&self, poi: Poi, anchor: Option<AnchorPose>) -> EngineResult<()> {
        let mut pending = self.lock()?;
        pending.pois.push(PendingPoi {
            poi,
            origin: ObjectOrigin::Anchored,
            anchor,
            visibility_range: 0.0,
        });
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    /// Queue a copy produced by a duplicate animation, placed against the
    /// source object's anchor when it has one
    pub fn submit_duplicate(&self, poi: Poi, anchor: Option<AnchorPose>) -> EngineResult<()> {
        let mut pending = self.lock()?;
        pending.pois.push(PendingPoi {
            poi,
            origin: ObjectOrigin::Duplicate,
            anchor,
            visibility_range: 0.0,
        });
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    pub fn request_deletion(&self, id: ObjectId) -> EngineResult<()> {
        let mut pending = self.lock()?;
        if !pending.deletions.contains(&id) {
            pending.deletions.push(id);
        }
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

/// Outcome of one synchronization pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub created: Vec<ObjectId>,
    pub destroyed: Vec<ObjectId>,
    /// Live objects whose coordinates a refresh changed
    pub updated: Vec<ObjectId>,
    /// POIs that could not be instantiated, with the reason
    pub rejected: Vec<(ObjectId, String)>,
    /// Merged settings when a layer update was applied
    pub settings: Option<LayerSettings>,
}

impl SyncReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.destroyed.is_empty()
            && self.updated.is_empty()
            && self.rejected.is_empty()
            && self.settings.is_none()
    }
}

/// Render-side owner of the live objects
pub struct SceneObjectRegistry {
    objects: BTreeMap<ObjectId, SceneObject>,
    objects_to_place: Vec<ObjectId>,
    settings: LayerSettings,
    inner_layers: HashMap<String, Layer>,
    next_duplicate_id: i64,
}

impl Default for SceneObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneObjectRegistry {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            objects_to_place: Vec::new(),
            settings: LayerSettings::default(),
            inner_layers: HashMap::new(),
            next_duplicate_id: -1,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values()
    }

    /// Non-relative objects positioned by the projector
    pub fn objects_to_place(&self) -> &[ObjectId] {
        &self.objects_to_place
    }

    pub fn settings(&self) -> &LayerSettings {
        &self.settings
    }

    /// Object owning a content node
    pub fn owner_of(&self, node: NodeId) -> Option<ObjectId> {
        self.objects
            .values()
            .find(|o| o.render_handles.contains(&node))
            .map(|o| o.id)
    }

    /// Flag a live object for removal at the next synchronization
    ///
    /// Returns `false` when the object is unknown or already leaving.
    pub fn mark_pending_deletion(&mut self, id: ObjectId) -> bool {
        match self.objects.get_mut(&id) {
            Some(object) if object.state == ObjectState::Live => {
                object.state = ObjectState::PendingDeletion;
                true
            }
            _ => false,
        }
    }

    /// Fresh negative id for a duplicated object
    pub fn next_duplicate_id(&mut self) -> ObjectId {
        loop {
            let id = ObjectId(self.next_duplicate_id);
            self.next_duplicate_id -= 1;
            if !self.objects.contains_key(&id) {
                return id;
            }
        }
    }

    /// Apply pending structural changes when the inbox is dirty
    pub fn synchronize(
        &mut self,
        inbox: &RegistryInbox,
        graph: &mut SceneGraph,
        engine: &mut AnimationEngine,
        device: Option<GeoPosition>,
        config: &EngineConfig,
    ) -> EngineResult<SyncReport> {
        let mut report = SyncReport::default();
        if !inbox.is_dirty() {
            return Ok(report);
        }

        let mut pending = inbox.lock()?;

        for id in std::mem::take(&mut pending.deletions) {
            self.destroy(id, graph, engine, &mut report.destroyed);
        }

        let mut to_create = Vec::new();
        if let Some(update) = pending.layers.take() {
            self.settings = LayerSettings::merge(&update.layers);
            self.inner_layers = update.inner_layers;
            to_create = self.reconcile(&update.layers, graph, engine, config, &mut report);
            report.settings = Some(self.settings.clone());
        }
        to_create.append(&mut pending.pois);

        for item in to_create {
            self.instantiate(item, graph, engine, device, config, &mut report);
        }

        self.recompute_objects_to_place();
        inbox.dirty.store(false, Ordering::Release);
        drop(pending);

        if !report.is_empty() {
            info!(
                created = report.created.len(),
                destroyed = report.destroyed.len(),
                updated = report.updated.len(),
                rejected = report.rejected.len(),
                objects = self.objects.len(),
                "Synchronized scene objects"
            );
        }
        Ok(report)
    }

    /// Diff a refreshed layer set against live layer objects
    fn reconcile(
        &mut self,
        layers: &[Layer],
        graph: &mut SceneGraph,
        engine: &mut AnimationEngine,
        config: &EngineConfig,
        report: &mut SyncReport,
    ) -> Vec<PendingPoi> {
        let incoming: Vec<(&Poi, f64)> = layers
            .iter()
            .flat_map(|layer| {
                let range = if layer.visibility_range > 0 {
                    layer.visibility_range as f64
                } else {
                    config.placement.default_visibility_range_m
                };
                layer.hotspots.iter().map(move |poi| (poi, range))
            })
            .collect();

        let stale: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|o| o.origin == ObjectOrigin::Layer && o.parent.is_none())
            .filter(|o| !incoming.iter().any(|(poi, _)| o.matches(poi)))
            .map(|o| o.id)
            .collect();
        for id in stale {
            if let Some(object) = self.objects.get_mut(&id) {
                object.state = ObjectState::PendingDeletion;
            }
            self.destroy(id, graph, engine, &mut report.destroyed);
        }

        let mut seen = HashSet::new();
        let mut to_create = Vec::new();
        for (poi, range) in incoming {
            if !seen.insert(poi.id) {
                debug!(id = poi.id, "Skipping duplicate POI id in layer set");
                continue;
            }
            match self.objects.get_mut(&ObjectId(poi.id)) {
                Some(object) if object.origin == ObjectOrigin::Layer && object.matches(poi) => {
                    if object.update_coordinates(poi) {
                        report.updated.push(object.id);
                    }
                }
                Some(_) => {}
                None => to_create.push(PendingPoi {
                    poi: poi.clone(),
                    origin: ObjectOrigin::Layer,
                    anchor: None,
                    visibility_range: range,
                }),
            }
        }
        to_create
    }

    fn instantiate(
        &mut self,
        item: PendingPoi,
        graph: &mut SceneGraph,
        engine: &mut AnimationEngine,
        device: Option<GeoPosition>,
        config: &EngineConfig,
        report: &mut SyncReport,
    ) {
        let id = ObjectId(item.poi.id);
        if !item.poi.is_placeable() || self.objects.contains_key(&id) {
            return;
        }

        let is_relative = item.poi.has_relative_location() || item.anchor.is_some();
        if let (false, true, Some(device)) = (is_relative, item.visibility_range > 0.0, device) {
            let distance = distance_between(device, item.poi.position());
            if distance > item.visibility_range {
                debug!(id = id.0, distance, range = item.visibility_range, "POI out of range");
                return;
            }
        }

        let mut local = self.initial_position(&item.poi, is_relative, device);
        let mut yaw = 0.0;
        if let Some(anchor) = item.anchor {
            let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), anchor.yaw_deg.to_radians());
            local = anchor.position + rotation * local;
            yaw = anchor.yaw_deg;
        }

        let root = graph.root();
        let created = self.create(
            id,
            &item.poi,
            item.origin,
            is_relative,
            root,
            local,
            graph,
            engine,
            config,
            report,
        );
        let Some(wrapper) = created else {
            return;
        };
        if let Some(object) = self.objects.get_mut(&id) {
            object.anchor = item.anchor;
        }
        if yaw != 0.0 {
            if let Some(t) = graph.transform_mut(wrapper) {
                t.rotation_euler_deg.y = yaw;
            }
        }

        self.instantiate_children(id, graph, engine, config, report);
    }

    fn instantiate_children(
        &mut self,
        parent_id: ObjectId,
        graph: &mut SceneGraph,
        engine: &mut AnimationEngine,
        config: &EngineConfig,
        report: &mut SyncReport,
    ) {
        let Some(parent) = self.objects.get(&parent_id) else {
            return;
        };
        let inner_name = parent.poi.inner_layer_name();
        if inner_name.is_empty() {
            return;
        }
        let Some(inner) = self.inner_layers.get(inner_name) else {
            debug!(id = parent_id.0, layer = inner_name, "Inner layer not delivered");
            return;
        };
        let children: Vec<Poi> = inner.hotspots.iter().filter(|p| p.is_placeable()).cloned().collect();
        let attach = parent.attach_point;

        for child_poi in children {
            let child_id = ObjectId::child_of(parent_id, child_poi.id);
            if self.objects.contains_key(&child_id) {
                continue;
            }
            let local = self.initial_position(&child_poi, true, None);
            let created = self.create(
                child_id,
                &child_poi,
                ObjectOrigin::Layer,
                true,
                attach,
                local,
                graph,
                engine,
                config,
                report,
            );
            if created.is_some() {
                if let Some(child) = self.objects.get_mut(&child_id) {
                    child.parent = Some(parent_id);
                }
                if let Some(parent) = self.objects.get_mut(&parent_id) {
                    parent.child_objects.push(child_id);
                }
            }
        }
    }

    fn initial_position(&self, poi: &Poi, is_relative: bool, device: Option<GeoPosition>) -> Vector3<f64> {
        if is_relative {
            let [x, y, z] = poi.relative_offset();
            return Vector3::new(x, poi.relative_alt + y, z);
        }
        match device {
            Some(device) => {
                let (x, z) = project(poi.latitude(), poi.longitude(), device.latitude, device.longitude);
                let (x, z) = self.settings.area.wrap(x, z);
                Vector3::new(x, poi.relative_alt, z)
            }
            None => Vector3::new(0.0, poi.relative_alt, 0.0),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn create(
        &mut self,
        id: ObjectId,
        poi: &Poi,
        origin: ObjectOrigin,
        is_relative: bool,
        parent: NodeId,
        local: Vector3<f64>,
        graph: &mut SceneGraph,
        engine: &mut AnimationEngine,
        config: &EngineConfig,
        report: &mut SyncReport,
    ) -> Option<NodeId> {
        let built = match build_object(graph, id, poi, parent, local, config.interaction.pick_radius_m) {
            Ok(built) => built,
            Err(e) => {
                warn!(id = id.0, error = %e, "Could not instantiate POI");
                report.rejected.push((id, e.to_string()));
                return None;
            }
        };

        let animation_count = built.instances.len();
        for instance in built.instances {
            engine.add(instance);
        }
        if let Some(billboard) = built.billboard {
            engine.add_billboard(billboard);
        }

        self.objects.insert(
            id,
            SceneObject {
                id,
                latitude: poi.latitude(),
                longitude: poi.longitude(),
                relative_altitude: poi.relative_alt,
                is_relative,
                current_scale: 1.0,
                target_local_position: local,
                wrapper: built.wrapper,
                render_handles: vec![built.content],
                attach_point: built.innermost,
                anchor: None,
                child_objects: Vec::new(),
                parent: None,
                state: ObjectState::Live,
                origin,
                position_dirty: !is_relative,
                poi: poi.clone(),
            },
        );
        debug!(id = id.0, content = poi.content_name(), animations = animation_count, "Instantiated object");
        report.created.push(id);
        Some(built.wrapper)
    }

    /// Remove an object, its children and every animation they own
    fn destroy(
        &mut self,
        id: ObjectId,
        graph: &mut SceneGraph,
        engine: &mut AnimationEngine,
        destroyed: &mut Vec<ObjectId>,
    ) {
        let mut stack = vec![id];
        let mut roots = Vec::new();
        while let Some(current) = stack.pop() {
            let Some(mut object) = self.objects.remove(&current) else {
                continue;
            };
            stack.extend(object.child_objects.iter().copied());
            engine.remove_owner(current);
            object.state = ObjectState::Destroyed;
            if current == id {
                roots.push(object.wrapper);
            }
            debug!(id = current.0, "Destroyed object");
            destroyed.push(current);
        }

        if let Some(parent) = self
            .objects
            .values_mut()
            .find(|o| o.child_objects.contains(&id))
        {
            parent.child_objects.retain(|c| *c != id);
        }
        for wrapper in roots {
            graph.remove_subtree(wrapper);
        }
    }

    /// Every non-relative root object plus its non-relative descendants
    fn recompute_objects_to_place(&mut self) {
        let mut result = Vec::new();
        let mut stack: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|o| o.parent.is_none())
            .map(|o| o.id)
            .collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            let Some(object) = self.objects.get(&id) else {
                continue;
            };
            if !object.is_relative {
                result.push(id);
            }
            stack.extend(object.child_objects.iter().rev().copied());
        }
        self.objects_to_place = result;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::types::TriggerBucket;
    use crate::layer::model::{PoiAnimation, PoiAnimations, PoiObject};

    struct Fixture {
        inbox: RegistryInbox,
        registry: SceneObjectRegistry,
        graph: SceneGraph,
        engine: AnimationEngine,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                inbox: RegistryInbox::new(),
                registry: SceneObjectRegistry::new(),
                graph: SceneGraph::new(),
                engine: AnimationEngine::new(),
                config: EngineConfig::default(),
            }
        }

        fn sync(&mut self, device: Option<GeoPosition>) -> SyncReport {
            self.registry
                .synchronize(&self.inbox, &mut self.graph, &mut self.engine, device, &self.config)
                .unwrap()
        }
    }

    fn poi(id: i64, lat: i64, lon: i64) -> Poi {
        Poi {
            id,
            lat,
            lon,
            poi_object: Some(PoiObject {
                full: "Cube".to_string(),
                ..PoiObject::default()
            }),
            animations: Some(PoiAnimations {
                on_click: vec![PoiAnimation {
                    name: "spin".to_string(),
                    kind: "rotate".to_string(),
                    length: 1.0,
                    ..PoiAnimation::default()
                }],
                ..PoiAnimations::default()
            }),
            ..Poi::default()
        }
    }

    fn layer(pois: Vec<Poi>) -> LayerUpdate {
        LayerUpdate {
            layers: vec![Layer {
                hotspots: pois,
                ..Layer::default()
            }],
            inner_layers: HashMap::new(),
        }
    }

    const DEVICE: GeoPosition = GeoPosition {
        latitude: 48.0,
        longitude: 11.0,
    };

    #[test]
    fn test_clean_inbox_is_a_no_op() {
        let mut f = Fixture::new();
        assert!(!f.inbox.is_dirty());
        assert!(f.sync(Some(DEVICE)).is_empty());
    }

    #[test]
    fn test_layer_instantiates_and_clears_dirty() {
        let mut f = Fixture::new();
        f.inbox.submit_layers(layer(vec![poi(1, 48_000_100, 11_000_000)])).unwrap();
        assert!(f.inbox.is_dirty());

        let report = f.sync(Some(DEVICE));
        assert_eq!(report.created, vec![ObjectId(1)]);
        assert!(!f.inbox.is_dirty());
        assert_eq!(f.registry.objects_to_place(), &[ObjectId(1)]);
        assert_eq!(f.engine.bucket(TriggerBucket::OnClick).len(), 1);

        let object = f.registry.object(ObjectId(1)).unwrap();
        assert!(object.is_live());
        let position = f.graph.transform(object.wrapper).unwrap().position;
        assert!((position.z - 11.1).abs() < 0.1);
    }

    #[test]
    fn test_refresh_reconciles() {
        let mut f = Fixture::new();
        f.inbox
            .submit_layers(layer(vec![poi(1, 48_000_100, 11_000_000), poi(2, 48_000_200, 11_000_000)]))
            .unwrap();
        f.sync(Some(DEVICE));

        let mut moved = poi(1, 48_000_150, 11_000_000);
        moved.poi_object.as_mut().unwrap().base_url = String::new();
        f.inbox
            .submit_layers(layer(vec![moved, poi(3, 48_000_300, 11_000_000)]))
            .unwrap();
        let report = f.sync(Some(DEVICE));

        assert_eq!(report.destroyed, vec![ObjectId(2)]);
        assert_eq!(report.updated, vec![ObjectId(1)]);
        assert_eq!(report.created, vec![ObjectId(3)]);
        assert!(f.registry.object(ObjectId(1)).unwrap().position_dirty);
        assert_eq!(f.engine.instances_of(ObjectId(2)).count(), 0);
    }

    #[test]
    fn test_anchored_objects_survive_refresh() {
        let mut f = Fixture::new();
        let mut anchored = poi(7, 0, 0);
        anchored.poi_object.as_mut().unwrap().relative_location = "1,0,2".to_string();
        let anchor = AnchorPose {
            position: Vector3::new(10.0, 0.0, 0.0),
            yaw_deg: 0.0,
        };
        f.inbox.submit_poi(anchored, Some(anchor)).unwrap();
        f.sync(Some(DEVICE));

        f.inbox.submit_layers(layer(vec![])).unwrap();
        f.sync(Some(DEVICE));

        let object = f.registry.object(ObjectId(7)).unwrap();
        assert!(object.is_relative);
        assert!(f.registry.objects_to_place().is_empty());
        assert_eq!(f.graph.transform(object.wrapper).unwrap().position, Vector3::new(11.0, 0.0, 2.0));
    }

    #[test]
    fn test_visibility_range_filters_instantiation() {
        let mut f = Fixture::new();
        let mut update = layer(vec![poi(1, 48_000_100, 11_000_000), poi(2, 48_100_000, 11_000_000)]);
        update.layers[0].visibility_range = 500;
        f.inbox.submit_layers(update).unwrap();

        let report = f.sync(Some(DEVICE));
        assert_eq!(report.created, vec![ObjectId(1)]);
    }

    #[test]
    fn test_children_are_relative_and_cascade() {
        let mut f = Fixture::new();
        let mut parent = poi(3, 48_000_100, 11_000_000);
        parent.poi_object.as_mut().unwrap().poi_layer_name = "inner".to_string();
        let mut child = poi(7, 0, 0);
        child.poi_object.as_mut().unwrap().relative_location = "0,1,0".to_string();
        let mut update = layer(vec![parent]);
        update.inner_layers.insert(
            "inner".to_string(),
            Layer {
                hotspots: vec![child],
                ..Layer::default()
            },
        );
        f.inbox.submit_layers(update).unwrap();
        f.sync(Some(DEVICE));

        let child_id = ObjectId(-3_000_007);
        let child = f.registry.object(child_id).unwrap();
        assert_eq!(child.parent, Some(ObjectId(3)));
        assert!(child.is_relative);
        let parent = f.registry.object(ObjectId(3)).unwrap();
        assert_eq!(parent.child_objects, vec![child_id]);
        assert_eq!(f.graph.node(child.wrapper).unwrap().parent(), Some(parent.attach_point));
        assert_eq!(f.registry.objects_to_place(), &[ObjectId(3)]);

        f.inbox.request_deletion(ObjectId(3)).unwrap();
        let report = f.sync(Some(DEVICE));
        assert_eq!(report.destroyed.len(), 2);
        assert!(f.registry.is_empty());
        assert!(f.engine.is_empty());
        assert_eq!(f.graph.node_count(), 1);
    }

    #[test]
    fn test_zero_scale_is_rejected() {
        let mut f = Fixture::new();
        let mut bad = poi(4, 48_000_100, 11_000_000);
        bad.transform = Some(Default::default());
        f.inbox.submit_layers(layer(vec![bad, poi(5, 48_000_100, 11_000_000)])).unwrap();

        let report = f.sync(Some(DEVICE));
        assert_eq!(report.created, vec![ObjectId(5)]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, ObjectId(4));
    }

    #[test]
    fn test_duplicate_ids_skip_live_objects() {
        let mut f = Fixture::new();
        f.inbox.submit_duplicate(poi(-1, 48_000_100, 11_000_000), None).unwrap();
        f.sync(Some(DEVICE));
        assert_eq!(f.registry.next_duplicate_id(), ObjectId(-2));
        assert_eq!(f.registry.next_duplicate_id(), ObjectId(-3));
    }

    #[test]
    fn test_pending_deletion_marks_once() {
        let mut f = Fixture::new();
        f.inbox.submit_layers(layer(vec![poi(1, 48_000_100, 11_000_000)])).unwrap();
        f.sync(Some(DEVICE));

        assert!(f.registry.mark_pending_deletion(ObjectId(1)));
        assert!(!f.registry.mark_pending_deletion(ObjectId(1)));
        assert!(!f.registry.mark_pending_deletion(ObjectId(9)));
    }
}
