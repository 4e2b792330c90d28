//! Builds the render-node chain and animation instances for one POI
//!
//! ```text
//! TransformWrapper        placed by the projector
//!   ScaleWrapper          transform.scale
//!     BillboardWrapper    only when transform.rel
//!       RotationWrapper   only when transform.angle != 0
//!         <anim>Wrapper   one per animation, shared by name prefix
//!           content       render handle
//! ```

use crate::animation::engine::Billboard;
use crate::animation::instance::AnimationInstance;
use crate::animation::types::TriggerBucket;
use crate::api::types::{EngineError, EngineResult};
use crate::layer::model::{Poi, PoiAnimation};
use crate::scene::graph::{NodeId, SceneGraph};
use crate::scene::object::ObjectId;
use nalgebra::{Vector3, Vector4};
use std::collections::HashMap;

/// Nodes and animations created for one object
#[derive(Debug)]
pub struct BuiltObject {
    pub wrapper: NodeId,
    pub content: NodeId,
    /// Innermost wrapper, where child objects attach
    pub innermost: NodeId,
    pub instances: Vec<AnimationInstance>,
    pub billboard: Option<Billboard>,
}

fn authored_in(poi: &Poi, bucket: TriggerBucket) -> &[PoiAnimation] {
    let Some(animations) = poi.animations.as_ref() else {
        return &[];
    };
    match bucket {
        TriggerBucket::OnCreate => &animations.on_create,
        TriggerBucket::OnFollow => &animations.on_follow,
        TriggerBucket::OnFocus => &animations.on_focus,
        TriggerBucket::InFocus => &animations.in_focus,
        TriggerBucket::OnClick => &animations.on_click,
    }
}

/// Wrapper sharing key: the name up to and including the first `/`
fn shared_prefix(name: &str) -> Option<&str> {
    name.find('/').map(|i| &name[..=i])
}

/// Build the node chain for `poi` below `parent`
///
/// Fails without touching the graph when the POI carries a zero scale.
pub fn build_object(
    graph: &mut SceneGraph,
    id: ObjectId,
    poi: &Poi,
    parent: NodeId,
    local_position: Vector3<f64>,
    pick_radius: f64,
) -> EngineResult<BuiltObject> {
    let transform = poi.transform.unwrap_or_default();
    let scale = if poi.transform.is_some() { transform.scale } else { 1.0 };
    if scale == 0.0 {
        return Err(EngineError::InvalidScale { id: id.0 });
    }

    let wrapper = graph.create_node("TransformWrapper", parent);
    if let Some(t) = graph.transform_mut(wrapper) {
        t.position = local_position;
    }

    let mut innermost = graph.create_node("ScaleWrapper", wrapper);
    if let Some(t) = graph.transform_mut(innermost) {
        t.scale = Vector3::repeat(scale);
    }

    let mut billboard = None;
    if transform.rel {
        innermost = graph.create_node("BillboardWrapper", innermost);
        billboard = Some(Billboard {
            owner: id,
            wrapper: innermost,
        });
    }

    if transform.angle != 0.0 {
        innermost = graph.create_node("RotationWrapper", innermost);
        if let Some(t) = graph.transform_mut(innermost) {
            t.rotation_euler_deg = Vector3::new(0.0, transform.angle, 0.0);
        }
    }

    let mut shared: HashMap<String, NodeId> = HashMap::new();
    let mut pending: Vec<(TriggerBucket, NodeId, &PoiAnimation)> = Vec::new();
    for bucket in TriggerBucket::ALL {
        for authored in authored_in(poi, bucket) {
            let name = authored.name.trim();
            let existing = shared_prefix(name).and_then(|p| shared.get(p).copied());
            let anim_wrapper = match existing {
                Some(node) => node,
                None => {
                    let node_name = if name.is_empty() {
                        bucket.wrapper_name().to_string()
                    } else {
                        format!("{}Wrapper", name)
                    };
                    innermost = graph.create_node(&node_name, innermost);
                    if let Some(prefix) = shared_prefix(name) {
                        shared.insert(prefix.to_string(), innermost);
                    }
                    innermost
                }
            };
            pending.push((bucket, anim_wrapper, authored));
        }
    }

    let content_name = if poi.content_name().is_empty() {
        "Content"
    } else {
        poi.content_name()
    };
    let content = graph.create_node(content_name, innermost);
    let material = graph.create_material(Vector4::new(1.0, 1.0, 1.0, 1.0));
    if let Some(node) = graph.node_mut(content) {
        node.pick_radius = Some(pick_radius);
        node.material = Some(material);
    }

    let instances = pending
        .into_iter()
        .map(|(bucket, anim_wrapper, authored)| {
            AnimationInstance::new(id, anim_wrapper, content, bucket, authored)
        })
        .collect();

    Ok(BuiltObject {
        wrapper,
        content,
        innermost,
        instances,
        billboard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::model::{PoiAnimations, PoiObject, PoiTransform};

    fn animation(name: &str, kind: &str) -> PoiAnimation {
        PoiAnimation {
            name: name.to_string(),
            kind: kind.to_string(),
            length: 1.0,
            ..PoiAnimation::default()
        }
    }

    fn poi(transform: Option<PoiTransform>, animations: PoiAnimations) -> Poi {
        Poi {
            id: 5,
            transform,
            poi_object: Some(PoiObject {
                full: "Cube".to_string(),
                ..PoiObject::default()
            }),
            animations: Some(animations),
            ..Poi::default()
        }
    }

    fn names_to_root(graph: &SceneGraph, mut id: NodeId) -> Vec<String> {
        let mut names = Vec::new();
        while let Some(node) = graph.node(id) {
            names.push(node.name.clone());
            match node.parent() {
                Some(parent) => id = parent,
                None => break,
            }
        }
        names.reverse();
        names
    }

    #[test]
    fn test_zero_scale_is_rejected_before_building() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let transform = PoiTransform { scale: 0.0, ..PoiTransform::default() };
        let result = build_object(
            &mut graph,
            ObjectId(5),
            &poi(Some(transform), PoiAnimations::default()),
            root,
            Vector3::zeros(),
            0.5,
        );
        assert!(matches!(result, Err(EngineError::InvalidScale { id: 5 })));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_chain_order() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let transform = PoiTransform { rel: true, angle: 45.0, scale: 2.0 };
        let animations = PoiAnimations {
            on_click: vec![animation("Spin", "rotate")],
            on_create: vec![animation("Grow", "scale")],
            ..PoiAnimations::default()
        };
        let built = build_object(
            &mut graph,
            ObjectId(5),
            &poi(Some(transform), animations),
            root,
            Vector3::new(1.0, 2.0, 3.0),
            0.5,
        )
        .unwrap();

        assert_eq!(
            names_to_root(&graph, built.content),
            vec![
                "SceneRoot",
                "TransformWrapper",
                "ScaleWrapper",
                "BillboardWrapper",
                "RotationWrapper",
                "GrowWrapper",
                "SpinWrapper",
                "Cube"
            ]
        );
        assert_eq!(graph.transform(built.wrapper).unwrap().position, Vector3::new(1.0, 2.0, 3.0));
        assert!(built.billboard.is_some());
        assert_eq!(built.innermost, graph.node(built.content).unwrap().parent().unwrap());
        assert_eq!(built.instances.len(), 2);
        assert!(built.instances[0].is_active());
        assert!(!built.instances[1].is_active());
    }

    #[test]
    fn test_prefixed_names_share_a_wrapper() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let animations = PoiAnimations {
            on_create: vec![animation("door/open", "rotate")],
            on_click: vec![animation("door/close", "rotate"), animation("bounce", "transform")],
            ..PoiAnimations::default()
        };
        let built = build_object(&mut graph, ObjectId(5), &poi(None, animations), root, Vector3::zeros(), 0.5)
            .unwrap();

        assert_eq!(built.instances[0].wrapper, built.instances[1].wrapper);
        assert_ne!(built.instances[0].wrapper, built.instances[2].wrapper);
        assert!(built.billboard.is_none());
        // root, transform, scale, door/, bounce, content
        assert_eq!(graph.node_count(), 6);
    }

    #[test]
    fn test_content_is_pickable_with_material() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let built = build_object(
            &mut graph,
            ObjectId(1),
            &poi(None, PoiAnimations::default()),
            root,
            Vector3::zeros(),
            0.75,
        )
        .unwrap();

        let content = graph.node(built.content).unwrap();
        assert_eq!(content.pick_radius, Some(0.75));
        assert_eq!(graph.shallow_materials(built.content).len(), 1);
    }
}
