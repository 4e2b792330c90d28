//! Scene graph, scene objects and the object registry

pub mod builder;
pub mod graph;
pub mod object;
pub mod registry;

pub use graph::{MaterialId, NodeId, Ray, RayHit, SceneGraph, SceneNode, Transform};
pub use object::{ObjectId, ObjectOrigin, ObjectState, SceneObject};
pub use registry::{LayerUpdate, RegistryInbox, SceneObjectRegistry, SyncReport};
