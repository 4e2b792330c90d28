//! Render node arena
//!
//! Nodes and materials are stored in flat slot arenas and addressed by
//! generational ids, so a handle kept by an animation after its object was
//! destroyed simply stops resolving instead of pointing at a reused slot.

use nalgebra::{Matrix4, Point3, Rotation3, Vector3, Vector4};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlotKey {
    index: u32,
    generation: u32,
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Arena<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    fn insert(&mut self, value: T) -> SlotKey {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.value = Some(value);
            return SlotKey {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SlotKey {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn get(&self, key: SlotKey) -> Option<&T> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    fn get_mut(&mut self, key: SlotKey) -> Option<&mut T> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    fn remove(&mut self, key: SlotKey) -> Option<T> {
        let slot = self.slots.get_mut(key.index as usize)?;
        if slot.generation != key.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(key.index);
        self.len -= 1;
        Some(value)
    }

    fn keys(&self) -> impl Iterator<Item = SlotKey> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|_| SlotKey {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }
}

/// Handle to a render node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(SlotKey);

/// Handle to a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(SlotKey);

/// Local transform of a node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f64>,
    /// Euler angles in degrees, applied Z then X then Y
    pub rotation_euler_deg: Vector3<f64>,
    pub scale: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation_euler_deg: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn rotation(&self) -> Rotation3<f64> {
        let r = self.rotation_euler_deg.map(f64::to_radians);
        Rotation3::from_axis_angle(&Vector3::y_axis(), r.y)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), r.x)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), r.z)
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.position)
            * self.rotation().to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

/// Surface color, RGBA in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Vector4<f64>,
}

impl Material {
    pub fn alpha(&self) -> f64 {
        self.color.w
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.color.w = alpha;
    }
}

/// Opaque per-object growth callback, receives progress 0..1
pub type GrowthHook = Box<dyn FnMut(f64) + Send>;

/// Ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vector3<f64>,
    /// Unit direction
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Build a ray; the direction is normalized
    pub fn new(origin: Vector3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::z),
        }
    }
}

/// Nearest pickable node along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub node: NodeId,
    pub distance: f64,
}

pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub active: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pub material: Option<MaterialId>,
    pub audio_cue: Option<String>,
    /// Bounding sphere radius before world scaling, `None` is not pickable
    pub pick_radius: Option<f64>,
    growth: Option<GrowthHook>,
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("active", &self.active)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("material", &self.material)
            .field("audio_cue", &self.audio_cue)
            .field("pick_radius", &self.pick_radius)
            .field("growth", &self.growth.is_some())
            .finish()
    }
}

impl SceneNode {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::default(),
            active: true,
            parent,
            children: Vec::new(),
            material: None,
            audio_cue: None,
            pick_radius: None,
            growth: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Scene hierarchy consumed by the platform renderer
pub struct SceneGraph {
    nodes: Arena<SceneNode>,
    materials: Arena<Material>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = Arena::new();
        let root = NodeId(nodes.insert(SceneNode::new("SceneRoot", None)));
        Self {
            nodes,
            materials: Arena::new(),
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some()
    }

    /// Create a node below `parent`; a stale parent attaches to the root
    pub fn create_node(&mut self, name: &str, parent: NodeId) -> NodeId {
        let parent = if self.contains(parent) { parent } else { self.root };
        let id = NodeId(self.nodes.insert(SceneNode::new(name, Some(parent))));
        if let Some(p) = self.nodes.get_mut(parent.0) {
            p.children.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.node(id).map(|n| &n.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.node_mut(id).map(|n| &mut n.transform)
    }

    pub fn set_active(&mut self, id: NodeId, active: bool) {
        if let Some(node) = self.node_mut(id) {
            node.active = active;
        }
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        self.node(id).map(|n| n.active).unwrap_or(false)
    }

    /// Active itself and all of its ancestors
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.node(node_id) {
                Some(node) if node.active => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn create_material(&mut self, color: Vector4<f64>) -> MaterialId {
        MaterialId(self.materials.insert(Material { color }))
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    pub fn material_mut(&mut self, id: MaterialId) -> Option<&mut Material> {
        self.materials.get_mut(id.0)
    }

    /// Materials on a node and its immediate children
    pub fn shallow_materials(&self, id: NodeId) -> Vec<MaterialId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        node.material
            .into_iter()
            .chain(
                node.children
                    .iter()
                    .filter_map(|child| self.node(*child).and_then(|c| c.material)),
            )
            .collect()
    }

    pub fn set_growth_hook(&mut self, id: NodeId, hook: GrowthHook) {
        if let Some(node) = self.node_mut(id) {
            node.growth = Some(hook);
        }
    }

    /// Forward growth progress to the node's hook, if any
    pub fn grow(&mut self, id: NodeId, progress: f64) -> bool {
        match self.node_mut(id).and_then(|n| n.growth.as_mut()) {
            Some(hook) => {
                hook(progress);
                true
            }
            None => false,
        }
    }

    pub fn audio_cue(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|n| n.audio_cue.as_deref())
    }

    pub fn world_matrix(&self, id: NodeId) -> Matrix4<f64> {
        let mut matrix = Matrix4::identity();
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.node(node_id) {
                Some(node) => {
                    matrix = node.transform.to_matrix() * matrix;
                    current = node.parent;
                }
                None => break,
            }
        }
        matrix
    }

    pub fn world_position(&self, id: NodeId) -> Vector3<f64> {
        translation_of(&self.world_matrix(id))
    }

    /// Nearest active pickable node hit by `ray` within `max_distance`
    pub fn raycast(&self, ray: &Ray, max_distance: f64) -> Option<RayHit> {
        let mut nearest: Option<RayHit> = None;
        for key in self.nodes.keys() {
            let id = NodeId(key);
            let Some(radius) = self.node(id).and_then(|n| n.pick_radius) else {
                continue;
            };
            if !self.is_active_in_hierarchy(id) {
                continue;
            }

            let world = self.world_matrix(id);
            let world_scale = (0..3)
                .map(|c| world.fixed_view::<3, 1>(0, c).norm())
                .fold(0.0, f64::max);
            let Some(distance) = intersect_sphere(ray, &translation_of(&world), radius * world_scale)
            else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            if nearest.map_or(true, |hit| distance < hit.distance) {
                nearest = Some(RayHit { node: id, distance });
            }
        }
        nearest
    }

    /// Rotate a node so its +Z axis points at a world-space target
    pub fn look_at(&mut self, id: NodeId, target: &Vector3<f64>) {
        let Some(node) = self.node(id) else {
            return;
        };
        let parent_world = node
            .parent
            .map(|p| self.world_matrix(p))
            .unwrap_or_else(Matrix4::identity);
        let Some(parent_inverse) = parent_world.try_inverse() else {
            return;
        };
        let local_target = parent_inverse.transform_point(&Point3::from(*target)).coords;
        let direction = local_target - node.transform.position;
        if direction.norm() < f64::EPSILON {
            return;
        }

        let yaw = direction.x.atan2(direction.z);
        let pitch = (-direction.y).atan2(direction.x.hypot(direction.z));
        if let Some(transform) = self.transform_mut(id) {
            transform.rotation_euler_deg = Vector3::new(pitch.to_degrees(), yaw.to_degrees(), 0.0);
        }
    }

    /// Remove a node and everything below it, returns the number of nodes removed
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        if id == self.root || !self.contains(id) {
            return 0;
        }
        if let Some(parent) = self.node(id).and_then(|n| n.parent) {
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current.0) {
                if let Some(material) = node.material {
                    self.materials.remove(material.0);
                }
                stack.extend(node.children);
                removed += 1;
            }
        }
        removed
    }
}

fn translation_of(matrix: &Matrix4<f64>) -> Vector3<f64> {
    Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}

fn intersect_sphere(ray: &Ray, center: &Vector3<f64>, radius: f64) -> Option<f64> {
    let oc = ray.origin - center;
    let b = oc.dot(&ray.direction);
    let c = oc.dot(&oc) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let near = -b - root;
    if near >= 0.0 {
        return Some(near);
    }
    // Origin inside the sphere
    let far = -b + root;
    (far >= 0.0).then_some(far)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_ids_do_not_resolve() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.create_node("a", root);
        assert_eq!(graph.remove_subtree(a), 1);
        assert!(!graph.contains(a));

        // Slot is reused with a new generation
        let b = graph.create_node("b", root);
        assert!(graph.contains(b));
        assert!(!graph.contains(a));
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_subtree_frees_descendants_and_materials() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let wrapper = graph.create_node("wrapper", root);
        let inner = graph.create_node("inner", wrapper);
        let content = graph.create_node("content", inner);
        let material = graph.create_material(Vector4::new(1.0, 1.0, 1.0, 1.0));
        graph.node_mut(content).unwrap().material = Some(material);

        assert_eq!(graph.remove_subtree(wrapper), 3);
        assert!(!graph.contains(content));
        assert!(graph.material(material).is_none());
        assert!(graph.node(root).unwrap().children().is_empty());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_world_position_composes_parents() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.create_node("parent", root);
        let child = graph.create_node("child", parent);
        {
            let t = graph.transform_mut(parent).unwrap();
            t.position = Vector3::new(10.0, 0.0, 0.0);
            t.scale = Vector3::new(2.0, 2.0, 2.0);
        }
        graph.transform_mut(child).unwrap().position = Vector3::new(0.0, 0.0, 1.0);

        let p = graph.world_position(child);
        assert!((p - Vector3::new(10.0, 0.0, 2.0)).norm() < 1e-9);
    }

    #[test]
    fn test_yaw_rotates_forward_axis() {
        let t = Transform {
            rotation_euler_deg: Vector3::new(0.0, 90.0, 0.0),
            ..Transform::default()
        };
        let forward = t.rotation() * Vector3::z();
        assert!((forward - Vector3::x()).norm() < 1e-9);
    }

    #[test]
    fn test_raycast_picks_nearest_active_node() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let near = graph.create_node("near", root);
        let far = graph.create_node("far", root);
        for (id, z) in [(near, 5.0), (far, 10.0)] {
            graph.transform_mut(id).unwrap().position = Vector3::new(0.0, 0.0, z);
            graph.node_mut(id).unwrap().pick_radius = Some(0.5);
        }

        let ray = Ray::new(Vector3::zeros(), Vector3::new(0.0, 0.0, 2.0));
        let hit = graph.raycast(&ray, 1500.0).unwrap();
        assert_eq!(hit.node, near);
        assert!((hit.distance - 4.5).abs() < 1e-9);

        graph.set_active(near, false);
        assert_eq!(graph.raycast(&ray, 1500.0).unwrap().node, far);
        assert!(graph.raycast(&ray, 5.0).is_none());

        let miss = Ray::new(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        assert!(graph.raycast(&miss, 1500.0).is_none());
    }

    #[test]
    fn test_raycast_uses_world_scale() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let scaled = graph.create_node("scaled", root);
        let content = graph.create_node("content", scaled);
        graph.transform_mut(scaled).unwrap().scale = Vector3::new(4.0, 4.0, 4.0);
        graph.transform_mut(scaled).unwrap().position = Vector3::new(1.5, 0.0, 10.0);
        graph.node_mut(content).unwrap().pick_radius = Some(0.5);

        // Unscaled radius 0.5 would miss at x offset 1.5, world radius 2.0 hits
        let ray = Ray::new(Vector3::zeros(), Vector3::z());
        assert_eq!(graph.raycast(&ray, 1500.0).unwrap().node, content);
    }

    #[test]
    fn test_look_at_points_forward_axis_at_target() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let parent = graph.create_node("parent", root);
        let billboard = graph.create_node("billboard", parent);
        {
            let t = graph.transform_mut(parent).unwrap();
            t.position = Vector3::new(3.0, 1.0, -4.0);
            t.rotation_euler_deg = Vector3::new(0.0, 30.0, 0.0);
        }

        let camera = Vector3::new(-2.0, 1.6, 5.0);
        graph.look_at(billboard, &camera);

        let world = graph.world_matrix(billboard);
        let forward = world.transform_vector(&Vector3::z()).normalize();
        let expected = (camera - graph.world_position(billboard)).normalize();
        assert!((forward - expected).norm() < 1e-9);
    }

    #[test]
    fn test_growth_hook_receives_progress() {
        use std::sync::{Arc, Mutex};

        let mut graph = SceneGraph::new();
        let root = graph.root();
        let creature = graph.create_node("creature", root);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        graph.set_growth_hook(creature, Box::new(move |p| sink.lock().unwrap().push(p)));

        assert!(graph.grow(creature, 0.25));
        assert!(!graph.grow(root, 0.5));
        assert_eq!(*seen.lock().unwrap(), vec![0.25]);
    }
}
