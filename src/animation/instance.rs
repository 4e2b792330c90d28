//! Per-object animation state machine
//!
//! An instance is `Inactive` until a trigger activates it, `Active` while
//! evaluated every frame, and stopped either naturally (its phase ran out)
//! or by force (an in-focus instance losing focus). Stopped instances can be
//! activated again by their trigger. A persisting instance keeps its
//! transform when stopped and, when force-stopped mid-phase, resumes from the
//! elapsed time on the next activation.

use crate::animation::conventions::NameAction;
use crate::animation::types::{AnimationKind, Interpolation, TriggerBucket};
use crate::core::{seconds_to_ticks, Ticks};
use crate::layer::model::PoiAnimation;
use crate::scene::graph::{MaterialId, NodeId, SceneGraph};
use crate::scene::object::ObjectId;
use nalgebra::Vector3;
use tracing::debug;

/// Side effect an animation asks its host to perform
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationEffect {
    OpenUrl(String),
    PlayAudio { owner: ObjectId, cue: String },
    RequestRefresh,
}

enum Step {
    Running(f64),
    Finished(Ticks),
}

#[derive(Debug, Clone)]
pub struct AnimationInstance {
    pub owner: ObjectId,
    /// Content node the animation belongs to
    pub render_handle: NodeId,
    /// Node the transform kinds write to
    pub wrapper: NodeId,
    pub bucket: TriggerBucket,
    pub kind: AnimationKind,
    pub interpolation: Interpolation,
    pub length_ticks: Ticks,
    pub delay_ticks: Ticks,
    pub persist: bool,
    pub repeat: bool,
    pub from: f64,
    pub to: f64,
    pub axis: Vector3<f64>,
    pub name: String,
    pub followed_by: Vec<String>,
    name_action: Option<NameAction>,

    is_active: bool,
    /// 0 until latched by the first evaluation after activation
    start_ticks: Ticks,
    just_activated: bool,
    just_stopped: bool,
    stopped_naturally: bool,
    resumed: bool,
    paused_elapsed: Option<Ticks>,
    to_be_destroyed: bool,
    to_be_duplicated: bool,

    fade_materials: Option<Vec<MaterialId>>,
    initial_alpha: Option<f64>,
}

impl AnimationInstance {
    pub fn new(
        owner: ObjectId,
        wrapper: NodeId,
        render_handle: NodeId,
        bucket: TriggerBucket,
        authored: &PoiAnimation,
    ) -> Self {
        let name = authored.name.trim().to_string();
        let axis = authored
            .axis
            .map(|a| Vector3::new(a.x, a.y, a.z))
            .unwrap_or_else(Vector3::zeros);
        let mut instance = Self {
            owner,
            render_handle,
            wrapper,
            bucket,
            kind: AnimationKind::parse(&authored.kind),
            interpolation: Interpolation::parse(&authored.interpolation),
            length_ticks: seconds_to_ticks(authored.length),
            delay_ticks: seconds_to_ticks(authored.delay),
            persist: authored.persist,
            repeat: authored.repeat,
            from: authored.from,
            to: authored.to,
            axis,
            name_action: NameAction::parse(&name),
            name,
            followed_by: authored.followed_by_names(),
            is_active: false,
            start_ticks: 0,
            just_activated: false,
            just_stopped: false,
            stopped_naturally: false,
            resumed: false,
            paused_elapsed: None,
            to_be_destroyed: false,
            to_be_duplicated: false,
            fade_materials: None,
            initial_alpha: None,
        };
        instance.is_active = bucket.starts_active() && !instance.is_inert();
        instance
    }

    /// Zero length or negative delay: never runs
    pub fn is_inert(&self) -> bool {
        self.length_ticks < 1 || self.delay_ticks < 0
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn just_activated(&self) -> bool {
        self.just_activated
    }

    pub fn just_stopped(&self) -> bool {
        self.just_stopped
    }

    /// Stopped this frame because the phase ran out
    pub fn stopped_naturally(&self) -> bool {
        self.just_stopped && self.stopped_naturally
    }

    pub fn is_to_be_destroyed(&self) -> bool {
        self.to_be_destroyed
    }

    pub fn is_to_be_duplicated(&self) -> bool {
        self.to_be_duplicated
    }

    /// Consume a pending duplication request
    pub fn take_duplicate_request(&mut self) -> bool {
        std::mem::take(&mut self.to_be_duplicated)
    }

    /// Start the instance; a persisting instance resumes its paused phase
    pub fn activate(
        &mut self,
        session_start: Ticks,
        now: Ticks,
        graph: &mut SceneGraph,
        effects: &mut Vec<AnimationEffect>,
    ) {
        if self.is_inert() {
            return;
        }
        self.is_active = true;
        self.start_ticks = 0;
        if let Some(elapsed) = self.paused_elapsed.take() {
            if self.persist {
                self.start_ticks = (now - elapsed).max(1);
                self.resumed = true;
            }
        }
        debug!(owner = self.owner.0, name = %self.name, kind = %self.kind, "Activating animation");
        self.animate(session_start, now, graph, effects);
    }

    /// Evaluate one frame
    pub fn animate(
        &mut self,
        session_start: Ticks,
        now: Ticks,
        graph: &mut SceneGraph,
        effects: &mut Vec<AnimationEffect>,
    ) {
        self.just_activated = false;
        self.just_stopped = false;
        if !self.can_run(session_start, now) {
            return;
        }

        let phase = match self.advance(now) {
            Step::Running(phase) => phase,
            Step::Finished(end) => {
                self.stop_at(session_start, end, true, graph);
                return;
            }
        };
        if std::mem::take(&mut self.resumed) {
            self.just_activated = true;
        }

        self.apply(phase, graph);

        if self.just_activated {
            self.fire_activation_effects(graph, effects);
        }
    }

    /// Stop immediately, settling the current frame first
    pub fn force_stop(&mut self, session_start: Ticks, now: Ticks, graph: &mut SceneGraph) {
        self.just_activated = false;
        self.stop_at(session_start, now, false, graph);
    }

    /// Current shaped value, `None` until latched
    pub fn value_at(&self, now: Ticks) -> Option<f64> {
        if self.start_ticks == 0 || self.length_ticks < 1 {
            return None;
        }
        let elapsed = now - self.start_ticks;
        let phase = if self.repeat {
            elapsed.rem_euclid(self.length_ticks) as f64 / self.length_ticks as f64
        } else {
            (elapsed as f64 / self.length_ticks as f64).clamp(0.0, 1.0)
        };
        Some(self.interpolation.value(phase, self.from, self.to))
    }

    fn can_run(&self, session_start: Ticks, now: Ticks) -> bool {
        if session_start <= 0 || !self.is_active || self.is_inert() {
            return false;
        }
        !(self.delay_ticks > 0 && session_start + self.delay_ticks > now)
    }

    fn advance(&mut self, now: Ticks) -> Step {
        if self.start_ticks == 0 {
            self.start_ticks = now;
            self.just_activated = true;
            return Step::Running(0.0);
        }

        let length = self.length_ticks;
        let end = self.start_ticks + length;
        if end < now {
            if !self.repeat {
                return Step::Finished(end);
            }
            // Keep the phase when frames were missed
            self.start_ticks += (now - self.start_ticks) / length * length;
            self.just_activated = true;
        }
        Step::Running((now - self.start_ticks) as f64 / length as f64)
    }

    fn stop_at(&mut self, session_start: Ticks, at: Ticks, natural: bool, graph: &mut SceneGraph) {
        if self.start_ticks != 0 && self.can_run(session_start, at) {
            if let Some(value) = self.value_at(at) {
                self.apply_value(value, graph);
            }
        }

        self.paused_elapsed = if !natural && self.persist && self.start_ticks != 0 {
            Some(at - self.start_ticks)
        } else {
            None
        };
        self.just_stopped = true;
        self.stopped_naturally = natural;
        self.is_active = false;
        self.start_ticks = 0;
        debug!(owner = self.owner.0, name = %self.name, natural, "Stopped animation");

        if !self.persist {
            if let Some(show) = self.name_action.as_ref().and_then(|a| a.visibility_on(false)) {
                graph.set_active(self.render_handle, show);
            }
            self.reset(graph);
        }
    }

    fn apply(&mut self, phase: f64, graph: &mut SceneGraph) {
        let value = self.interpolation.value(phase, self.from, self.to);
        self.apply_value(value, graph);
    }

    /// Handler table for the closed set of kinds
    fn apply_value(&mut self, value: f64, graph: &mut SceneGraph) {
        match self.kind {
            AnimationKind::Rotate => {
                if let Some(t) = graph.transform_mut(self.wrapper) {
                    t.rotation_euler_deg = self.axis * value;
                }
            }
            AnimationKind::Scale => {
                if let Some(t) = graph.transform_mut(self.wrapper) {
                    t.scale = self
                        .axis
                        .map(|a| if a == 0.0 { 1.0 } else { a * value });
                }
            }
            AnimationKind::Transform => {
                if let Some(t) = graph.transform_mut(self.wrapper) {
                    t.position = self.axis * value;
                }
            }
            AnimationKind::Fade => self.fade(value, graph),
            AnimationKind::Grow => {
                graph.grow(self.render_handle, value);
            }
            AnimationKind::Destroy => self.to_be_destroyed = true,
            AnimationKind::Duplicate => {
                if self.just_activated {
                    self.to_be_duplicated = true;
                }
            }
        }
    }

    fn fade(&mut self, alpha: f64, graph: &mut SceneGraph) {
        let materials = self
            .fade_materials
            .get_or_insert_with(|| graph.shallow_materials(self.render_handle));
        for id in materials.iter() {
            if let Some(material) = graph.material_mut(*id) {
                if self.initial_alpha.is_none() {
                    self.initial_alpha = Some(material.alpha());
                }
                material.set_alpha(alpha);
            }
        }
    }

    fn reset(&mut self, graph: &mut SceneGraph) {
        match self.kind {
            AnimationKind::Rotate => {
                if let Some(t) = graph.transform_mut(self.wrapper) {
                    t.rotation_euler_deg = Vector3::zeros();
                }
            }
            AnimationKind::Scale => {
                if let Some(t) = graph.transform_mut(self.wrapper) {
                    t.scale = Vector3::new(1.0, 1.0, 1.0);
                }
            }
            AnimationKind::Transform => {
                if let Some(t) = graph.transform_mut(self.wrapper) {
                    t.position = Vector3::zeros();
                }
            }
            AnimationKind::Fade => {
                if let Some(alpha) = self.initial_alpha {
                    self.fade(alpha, graph);
                }
            }
            AnimationKind::Grow | AnimationKind::Destroy | AnimationKind::Duplicate => {}
        }
    }

    fn fire_activation_effects(&self, graph: &mut SceneGraph, effects: &mut Vec<AnimationEffect>) {
        match &self.name_action {
            Some(NameAction::OpenUrl(url)) => effects.push(AnimationEffect::OpenUrl(url.clone())),
            Some(action) => {
                if let Some(show) = action.visibility_on(true) {
                    graph.set_active(self.render_handle, show);
                }
            }
            None => {}
        }
        if let Some(cue) = graph.audio_cue(self.render_handle) {
            effects.push(AnimationEffect::PlayAudio {
                owner: self.owner,
                cue: cue.to_string(),
            });
        }
    }
}
