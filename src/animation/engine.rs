//! Per-frame animation evaluation across trigger buckets

use crate::animation::conventions::NameAction;
use crate::animation::instance::{AnimationEffect, AnimationInstance};
use crate::animation::types::TriggerBucket;
use crate::core::Ticks;
use crate::scene::graph::{NodeId, Ray, SceneGraph};
use crate::scene::object::ObjectId;
use nalgebra::Vector3;
use std::collections::HashSet;
use tracing::debug;

/// Wrapper kept facing the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    pub owner: ObjectId,
    pub wrapper: NodeId,
}

/// Inputs for one evaluation pass
#[derive(Debug, Clone, Copy)]
pub struct AnimationFrame {
    /// Session (layer) start, gates delays
    pub session_start: Ticks,
    pub now: Ticks,
    pub camera_position: Option<Vector3<f64>>,
    /// Ray from the view center
    pub focus_ray: Option<Ray>,
    /// Ray from the pointer, present only on the frame of a press
    pub click_ray: Option<Ray>,
    pub max_ray_distance: f64,
}

/// Outcome of one evaluation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationReport {
    /// A click landed on a node with on-click animations
    pub clicked: bool,
    /// Node under the view center
    pub focused: Option<NodeId>,
    /// Owners whose destroy animation is running
    pub to_destroy: Vec<ObjectId>,
}

struct FollowRequest {
    owner: ObjectId,
    render_handle: NodeId,
    names: Vec<String>,
}

#[derive(Debug, Default)]
pub struct AnimationEngine {
    /// Indexed by `bucket_index`
    buckets: [Vec<AnimationInstance>; 5],
    billboards: Vec<Billboard>,
}

fn bucket_index(bucket: TriggerBucket) -> usize {
    match bucket {
        TriggerBucket::OnCreate => 0,
        TriggerBucket::OnFollow => 1,
        TriggerBucket::OnFocus => 2,
        TriggerBucket::InFocus => 3,
        TriggerBucket::OnClick => 4,
    }
}

impl AnimationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, instance: AnimationInstance) {
        self.buckets[bucket_index(instance.bucket)].push(instance);
    }

    pub fn add_billboard(&mut self, billboard: Billboard) {
        self.billboards.push(billboard);
    }

    pub fn bucket(&self, bucket: TriggerBucket) -> &[AnimationInstance] {
        &self.buckets[bucket_index(bucket)]
    }

    pub fn billboards(&self) -> &[Billboard] {
        &self.billboards
    }

    /// Timed instances across all buckets
    pub fn instances(&self) -> impl Iterator<Item = &AnimationInstance> {
        self.buckets.iter().flatten()
    }

    pub fn instances_of(&self, owner: ObjectId) -> impl Iterator<Item = &AnimationInstance> {
        self.instances().filter(move |i| i.owner == owner)
    }

    /// Number of timed instances, billboards excluded
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every instance and billboard owned by `owner`
    pub fn remove_owner(&mut self, owner: ObjectId) -> usize {
        let before = self.len() + self.billboards.len();
        for bucket in self.buckets.iter_mut() {
            bucket.retain(|i| i.owner != owner);
        }
        self.billboards.retain(|b| b.owner != owner);
        before - self.len() - self.billboards.len()
    }

    /// Evaluate one frame: billboards, focus and click triggers, the timed
    /// sweep, follow-chains, then destruction reconciliation
    pub fn handle_animations(
        &mut self,
        graph: &mut SceneGraph,
        frame: &AnimationFrame,
        effects: &mut Vec<AnimationEffect>,
    ) -> AnimationReport {
        let mut report = AnimationReport::default();
        let (start, now) = (frame.session_start, frame.now);

        if let Some(camera) = frame.camera_position {
            for billboard in &self.billboards {
                graph.look_at(billboard.wrapper, &camera);
            }
        }

        let in_focus = bucket_index(TriggerBucket::InFocus);
        let mut lost_focus: Vec<bool> = self.buckets[in_focus].iter().map(|i| i.is_active()).collect();

        let wants_focus = !self.bucket(TriggerBucket::OnFocus).is_empty()
            || !self.bucket(TriggerBucket::InFocus).is_empty();
        if let (true, Some(ray)) = (wants_focus, frame.focus_ray) {
            if let Some(hit) = graph.raycast(&ray, frame.max_ray_distance) {
                report.focused = Some(hit.node);
                for instance in self.buckets[bucket_index(TriggerBucket::OnFocus)]
                    .iter_mut()
                    .filter(|i| i.render_handle == hit.node)
                {
                    if !instance.is_active() {
                        instance.activate(start, now, graph, effects);
                    }
                }
                for (index, instance) in self.buckets[in_focus].iter_mut().enumerate() {
                    if instance.render_handle != hit.node {
                        continue;
                    }
                    if !instance.is_active() {
                        instance.activate(start, now, graph, effects);
                    }
                    lost_focus[index] = false;
                }
            }
        }

        let on_click = bucket_index(TriggerBucket::OnClick);
        if let (false, Some(ray)) = (self.buckets[on_click].is_empty(), frame.click_ray) {
            if let Some(hit) = graph.raycast(&ray, frame.max_ray_distance) {
                for instance in self.buckets[on_click]
                    .iter_mut()
                    .filter(|i| i.render_handle == hit.node)
                {
                    report.clicked = true;
                    if !instance.is_active() {
                        instance.activate(start, now, graph, effects);
                    }
                }
            }
        }

        let mut follow_requests = Vec::new();
        for (slot, bucket) in self.buckets.iter_mut().enumerate() {
            for (index, instance) in bucket.iter_mut().enumerate() {
                if slot == in_focus && lost_focus[index] {
                    instance.force_stop(start, now, graph);
                } else {
                    instance.animate(start, now, graph, effects);
                }
                if instance.stopped_naturally() && !instance.followed_by.is_empty() {
                    follow_requests.push(FollowRequest {
                        owner: instance.owner,
                        render_handle: instance.render_handle,
                        names: instance.followed_by.clone(),
                    });
                }
            }
        }

        for request in follow_requests {
            self.follow(&request, graph, start, now, effects);
        }

        let mut seen = HashSet::new();
        report.to_destroy = self
            .instances()
            .filter(|i| i.is_to_be_destroyed())
            .map(|i| i.owner)
            .filter(|owner| seen.insert(*owner))
            .collect();
        report
    }

    fn follow(
        &mut self,
        request: &FollowRequest,
        graph: &mut SceneGraph,
        start: Ticks,
        now: Ticks,
        effects: &mut Vec<AnimationEffect>,
    ) {
        for name in &request.names {
            match NameAction::parse(name) {
                Some(NameAction::ReloadLayer) => {
                    debug!(owner = request.owner.0, "Follow-chain requests layer refresh");
                    effects.push(AnimationEffect::RequestRefresh);
                }
                Some(NameAction::OpenUrl(url)) => effects.push(AnimationEffect::OpenUrl(url)),
                Some(NameAction::SetActive(show)) => graph.set_active(request.render_handle, show),
                None => {
                    for instance in self
                        .buckets
                        .iter_mut()
                        .flatten()
                        .filter(|i| i.owner == request.owner && i.name == *name)
                    {
                        if !instance.is_active() {
                            debug!(owner = request.owner.0, name = %name, "Follow-chain activation");
                            instance.activate(start, now, graph, effects);
                        }
                    }
                }
            }
        }
    }

    /// Activate the on-follow instances of objects whose placement moved
    pub fn activate_on_follow(
        &mut self,
        moved: &[ObjectId],
        graph: &mut SceneGraph,
        start: Ticks,
        now: Ticks,
        effects: &mut Vec<AnimationEffect>,
    ) {
        if moved.is_empty() {
            return;
        }
        for instance in self.buckets[bucket_index(TriggerBucket::OnFollow)]
            .iter_mut()
            .filter(|i| moved.contains(&i.owner))
        {
            if !instance.is_active() {
                instance.activate(start, now, graph, effects);
            }
        }
    }

    /// Owners with a pending duplication request, each listed once
    pub fn take_duplicates(&mut self) -> Vec<ObjectId> {
        let mut owners = Vec::new();
        for instance in self.buckets.iter_mut().flatten() {
            if instance.take_duplicate_request() && !owners.contains(&instance.owner) {
                owners.push(instance.owner);
            }
        }
        owners
    }
}
