//! Per-frame placement of projected objects
//!
//! Targets are recomputed only when the fused position changed or an object
//! was marked position-dirty. Rendered positions then chase their targets:
//! a move that crosses most of a wrapped area snaps, anything else is
//! interpolated at a frame-rate independent speed.

use crate::algorithms::projection::{distance_between, project, AreaBounds};
use crate::core::{GeoPosition, Ticks, TICKS_PER_SECOND};
use crate::scene::graph::SceneGraph;
use crate::scene::object::ObjectId;
use crate::scene::registry::SceneObjectRegistry;
use crate::utils::config::PlacementConfig;
use nalgebra::Vector3;
use tracing::trace;

/// Frames per second measured in whole-second buckets
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    current_second: i64,
    frames_in_second: u32,
    fps: u32,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a frame; returns the rate used for this frame
    pub fn tick(&mut self, now: Ticks) -> u32 {
        let second = now / TICKS_PER_SECOND;
        if second == self.current_second {
            self.frames_in_second += 1;
        } else {
            self.fps = if second == self.current_second + 1 {
                self.frames_in_second
            } else {
                1
            };
            self.current_second = second;
            self.frames_in_second = 1;
        }
        self.fps()
    }

    /// Frames counted in the previous second, at least 1
    pub fn fps(&self) -> u32 {
        self.fps.max(1)
    }
}

/// Placement state carried between frames
#[derive(Debug, Clone, Default)]
pub struct Placer {
    frames: FrameCounter,
    last_device: Option<GeoPosition>,
}

impl Placer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &FrameCounter {
        &self.frames
    }

    pub fn tick(&mut self, now: Ticks) -> u32 {
        self.frames.tick(now)
    }

    /// Force a full target recomputation on the next frame
    pub fn invalidate(&mut self) {
        self.last_device = None;
    }

    /// Recompute targets; returns the objects whose target moved
    pub fn update_targets(
        &mut self,
        registry: &mut SceneObjectRegistry,
        graph: &mut SceneGraph,
        device: GeoPosition,
        area: AreaBounds,
        config: &PlacementConfig,
    ) -> Vec<ObjectId> {
        let ids = registry.objects_to_place().to_vec();
        let any_dirty = ids
            .iter()
            .any(|id| registry.object(*id).map_or(false, |o| o.position_dirty));
        if self.last_device == Some(device) && !any_dirty {
            return Vec::new();
        }
        self.last_device = Some(device);

        let mut moved = Vec::new();
        for id in ids {
            let Some(object) = registry.object_mut(id) else {
                continue;
            };
            let (x, z) = project(object.latitude, object.longitude, device.latitude, device.longitude);
            let (x, z) = area.wrap(x, z);
            let target = Vector3::new(x, object.relative_altitude, z);

            object.current_scale = area.edge_scale(x, z, config.edge_scale_distance_m);
            object.position_dirty = false;
            if target != object.target_local_position {
                object.target_local_position = target;
                moved.push(id);
            }

            let range = object.poi.visibility_range;
            if range > 0.0 {
                let position = GeoPosition::new(object.latitude, object.longitude);
                let visible = distance_between(device, position) <= range * config.visibility_tolerance;
                graph.set_active(object.wrapper, visible);
            }
        }
        trace!(moved = moved.len(), "Recomputed placement targets");
        moved
    }

    /// Move rendered transforms toward their targets
    pub fn apply_frame(
        &self,
        registry: &SceneObjectRegistry,
        graph: &mut SceneGraph,
        area: AreaBounds,
        config: &PlacementConfig,
    ) {
        let fps = self.frames.fps() as f64;
        let position_rate = (config.position_lerp_rate / fps).min(1.0);
        let scale_rate = (config.scale_lerp_rate / fps).min(1.0);

        for id in registry.objects_to_place() {
            let Some(object) = registry.object(*id) else {
                continue;
            };
            let Some(transform) = graph.transform_mut(object.wrapper) else {
                continue;
            };
            let current = transform.position;
            let target = object.target_local_position;

            let jump = area.is_jump((current.x, current.z), (target.x, target.z), config.snap_fraction);
            transform.position = if jump {
                target
            } else {
                current.lerp(&target, position_rate)
            };

            if area.is_active() {
                let scale = if object.current_scale < 0.0 { 1.0 } else { object.current_scale };
                if jump {
                    let snapped = if scale < 1.0 { config.jump_scale } else { scale };
                    transform.scale = Vector3::repeat(snapped);
                } else {
                    let wanted = Vector3::repeat(scale);
                    transform.scale = transform.scale.lerp(&wanted, scale_rate);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::model::{Layer, Poi, PoiObject};
    use crate::animation::engine::AnimationEngine;
    use crate::scene::registry::{LayerUpdate, RegistryInbox};
    use crate::utils::config::EngineConfig;

    const DEVICE: GeoPosition = GeoPosition {
        latitude: 48.0,
        longitude: 11.0,
    };

    struct World {
        registry: SceneObjectRegistry,
        graph: SceneGraph,
        config: EngineConfig,
    }

    fn world(pois: Vec<Poi>, area_size: i32) -> World {
        let inbox = RegistryInbox::new();
        let mut registry = SceneObjectRegistry::new();
        let mut graph = SceneGraph::new();
        let mut engine = AnimationEngine::new();
        let config = EngineConfig::default();
        inbox
            .submit_layers(LayerUpdate {
                layers: vec![Layer {
                    hotspots: pois,
                    area_size,
                    ..Layer::default()
                }],
                ..LayerUpdate::default()
            })
            .unwrap();
        registry
            .synchronize(&inbox, &mut graph, &mut engine, Some(DEVICE), &config)
            .unwrap();
        World { registry, graph, config }
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
            ..Poi::default()
        }
    }

    #[test]
    fn test_frame_counter_buckets() {
        let mut counter = FrameCounter::new();
        let second = TICKS_PER_SECOND;
        for i in 0..30 {
            counter.tick(10 * second + i);
        }
        assert_eq!(counter.tick(11 * second), 30);
        // A gap of more than a second resets the rate
        assert_eq!(counter.tick(13 * second), 1);
    }

    #[test]
    fn test_targets_skip_when_nothing_changed() {
        let mut w = world(vec![poi(1, 48_000_100, 11_000_000)], 0);
        let mut placer = Placer::new();
        let area = w.registry.settings().area;

        placer.update_targets(&mut w.registry, &mut w.graph, DEVICE, area, &w.config.placement);
        assert!(!w.registry.object(ObjectId(1)).unwrap().position_dirty);

        let moved_device = GeoPosition::new(48.00001, 11.0);
        let moved = placer.update_targets(&mut w.registry, &mut w.graph, moved_device, area, &w.config.placement);
        assert_eq!(moved, vec![ObjectId(1)]);
        assert!(placer
            .update_targets(&mut w.registry, &mut w.graph, moved_device, area, &w.config.placement)
            .is_empty());
    }

    #[test]
    fn test_wrap_seam_snaps() {
        let mut w = world(vec![poi(1, 48_000_000, 11_000_000)], 20);
        let placer = Placer::new();
        let area = w.registry.settings().area;
        assert_eq!(area, AreaBounds { width: 20.0, depth: 20.0 });

        let wrapper = w.registry.object(ObjectId(1)).unwrap().wrapper;
        w.graph.transform_mut(wrapper).unwrap().position = Vector3::new(-9.0, 0.0, 0.0);
        let object = w.registry.object_mut(ObjectId(1)).unwrap();
        object.target_local_position = Vector3::new(9.5, 0.0, 0.0);
        object.current_scale = 0.5;

        placer.apply_frame(&w.registry, &mut w.graph, area, &w.config.placement);
        let transform = w.graph.transform(wrapper).unwrap();
        assert_eq!(transform.position, Vector3::new(9.5, 0.0, 0.0));
        assert_eq!(transform.scale, Vector3::repeat(0.01));
    }

    #[test]
    fn test_jump_restores_full_scale() {
        let mut w = world(vec![poi(1, 48_000_000, 11_000_000)], 20);
        let placer = Placer::new();
        let area = w.registry.settings().area;

        let wrapper = w.registry.object(ObjectId(1)).unwrap().wrapper;
        let transform = w.graph.transform_mut(wrapper).unwrap();
        transform.position = Vector3::new(-9.0, 0.0, 0.0);
        transform.scale = Vector3::repeat(0.2);
        w.registry.object_mut(ObjectId(1)).unwrap().target_local_position = Vector3::new(9.5, 0.0, 0.0);

        placer.apply_frame(&w.registry, &mut w.graph, area, &w.config.placement);
        assert_eq!(w.graph.transform(wrapper).unwrap().scale, Vector3::repeat(1.0));
    }

    #[test]
    fn test_raw_offset_past_seam_is_wrapped_before_snap_check() {
        // A raw offset of 19.9 m in a 20 m area wraps to -0.1 m, so an object
        // rendered at -9 m glides toward it instead of snapping
        let mut w = world(vec![poi(1, 48_000_000, 11_000_000)], 20);
        let placer = Placer::new();
        let area = w.registry.settings().area;
        let target = crate::algorithms::projection::wrap_offset(19.9, area.width);
        assert!((target + 0.1).abs() < 1e-9);

        let wrapper = w.registry.object(ObjectId(1)).unwrap().wrapper;
        w.graph.transform_mut(wrapper).unwrap().position = Vector3::new(-9.0, 0.0, 0.0);
        w.registry.object_mut(ObjectId(1)).unwrap().target_local_position = Vector3::new(target, 0.0, 0.0);

        placer.apply_frame(&w.registry, &mut w.graph, area, &w.config.placement);
        let position = w.graph.transform(wrapper).unwrap().position;
        assert!((position.x - (-9.0 + target) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_moves_interpolate() {
        let mut w = world(vec![poi(1, 48_000_000, 11_000_000)], 20);
        let placer = Placer::new();
        let area = w.registry.settings().area;

        let wrapper = w.registry.object(ObjectId(1)).unwrap().wrapper;
        w.graph.transform_mut(wrapper).unwrap().position = Vector3::new(-2.0, 0.0, 0.0);
        w.registry.object_mut(ObjectId(1)).unwrap().target_local_position = Vector3::new(2.0, 0.0, 0.0);

        placer.apply_frame(&w.registry, &mut w.graph, area, &w.config.placement);
        // fps is 1 before any frame was counted, so the rate is 0.5
        let position = w.graph.transform(wrapper).unwrap().position;
        assert!((position.x - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_edge_scale_from_targets() {
        let mut w = world(vec![poi(1, 48_000_085, 11_000_000)], 20);
        let mut placer = Placer::new();
        let area = w.registry.settings().area;

        placer.update_targets(&mut w.registry, &mut w.graph, DEVICE, area, &w.config.placement);
        let object = w.registry.object(ObjectId(1)).unwrap();
        // ~9.45 m north, ~0.55 m from the seam
        assert!(object.current_scale > 0.4 && object.current_scale < 0.7);
    }

    #[test]
    fn test_per_poi_visibility_toggles_wrapper() {
        let mut far = poi(1, 48_000_100, 11_000_000);
        far.visibility_range = 5.0;
        let mut w = world(vec![far], 0);
        let mut placer = Placer::new();
        let area = w.registry.settings().area;

        placer.update_targets(&mut w.registry, &mut w.graph, DEVICE, area, &w.config.placement);
        let wrapper = w.registry.object(ObjectId(1)).unwrap().wrapper;
        assert!(!w.graph.is_active(wrapper));

        placer.update_targets(
            &mut w.registry,
            &mut w.graph,
            GeoPosition::new(48.0001, 11.0),
            area,
            &w.config.placement,
        );
        assert!(w.graph.is_active(wrapper));
    }
}
