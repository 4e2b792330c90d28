//! AR session: the render-loop facade and its producer-side handle
//!
//! [`ArSession`] runs on the render thread and owns the scene graph, the
//! object registry, the animation engine and the placement state. Producers
//! (network collaborator, platform tracking, sensor poller) talk to it
//! through a cloneable [`SessionHandle`] and the shared pose; the only lock
//! between the two sides is the registry inbox.

use crate::algorithms::placement::Placer;
use crate::animation::engine::{AnimationEngine, AnimationFrame};
use crate::animation::instance::AnimationEffect;
use crate::api::actions::{ExternalActions, NoopActions};
use crate::api::status::{render_information, StatusSnapshot};
use crate::api::types::{AnchorPose, EngineError, EngineResult, FrameInput, FrameReport, SessionState};
use crate::core::{seconds_to_ticks, GeoPosition, Ticks};
use crate::layer::feed::{LayerFeed, LayerTicket};
use crate::layer::model::{Layer, Poi};
use crate::processing::heading::HeadingSmoother;
use crate::processing::tracker::{PositionTracker, SharedPose};
use crate::scene::graph::SceneGraph;
use crate::scene::object::ObjectId;
use crate::scene::registry::{LayerUpdate, RegistryInbox, SceneObjectRegistry};
use crate::sensors::{LocationPoller, LocationSource, PollerHandle};
use crate::utils::config::EngineConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Producer-side handle, cheap to clone and safe to send across threads
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inbox: Arc<RegistryInbox>,
    feed: Arc<LayerFeed>,
    pose: Arc<SharedPose>,
}

impl SessionHandle {
    /// Hand a complete layer set to the render loop
    pub fn ingest_layer(&self, update: LayerUpdate) -> EngineResult<()> {
        info!(
            layers = update.layers.len(),
            pois = update.layers.iter().map(|l| l.hotspots.len()).sum::<usize>(),
            "Ingesting layer data"
        );
        self.feed.record_success();
        self.inbox.submit_layers(update)
    }

    /// Parse and ingest a single layer document
    pub fn ingest_layer_json(&self, json: &str) -> EngineResult<()> {
        let layer = Layer::from_json(json)?;
        self.ingest_layer(LayerUpdate {
            layers: vec![layer],
            ..LayerUpdate::default()
        })
    }

    /// Ingest a fetch result unless a newer layer was selected meanwhile
    pub fn deliver_layer(&self, ticket: LayerTicket, update: LayerUpdate) -> EngineResult<bool> {
        if !self.feed.is_current(ticket) {
            warn!(
                generation = ticket.generation(),
                current = self.feed.ticket().generation(),
                "Discarding stale layer delivery"
            );
            return Ok(false);
        }
        self.ingest_layer(update)?;
        Ok(true)
    }

    /// Place an object at a pose supplied by a platform tracking subsystem
    pub fn create_scene_object(&self, poi: Poi, anchor: AnchorPose) -> EngineResult<()> {
        if !poi.is_placeable() {
            return Err(EngineError::InvalidPoi {
                id: poi.id,
                reason: "not visible or without content".to_string(),
            });
        }
        debug!(id = poi.id, "Queueing anchored object");
        self.inbox.submit_poi(poi, Some(anchor))
    }

    pub fn request_deletion(&self, id: ObjectId) -> EngineResult<()> {
        self.inbox.request_deletion(id)
    }

    /// Ask the network collaborator for fresh layer data
    pub fn request_refresh(&self) {
        self.feed.request_refresh();
    }

    pub fn feed(&self) -> &LayerFeed {
        &self.feed
    }

    pub fn pose(&self) -> Arc<SharedPose> {
        Arc::clone(&self.pose)
    }
}

/// Render-side session
pub struct ArSession<A: ExternalActions = NoopActions> {
    config: EngineConfig,
    handle: SessionHandle,
    graph: SceneGraph,
    registry: SceneObjectRegistry,
    engine: AnimationEngine,
    placer: Placer,
    heading: HeadingSmoother,
    actions: A,
    rng: StdRng,
    /// Set when the first objects arrive, gates animation delays
    session_start: Ticks,
    last_refresh: Ticks,
    has_layer: bool,
}

impl ArSession<NoopActions> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_actions(config, NoopActions)
    }
}

impl<A: ExternalActions> ArSession<A> {
    pub fn with_actions(config: EngineConfig, actions: A) -> Self {
        let pose = Arc::new(SharedPose::new(config.tracking.kalman_enabled));
        let heading = HeadingSmoother::new(config.tracking.heading_smoothing);
        Self {
            handle: SessionHandle {
                inbox: Arc::new(RegistryInbox::new()),
                feed: Arc::new(LayerFeed::new()),
                pose,
            },
            config,
            graph: SceneGraph::new(),
            registry: SceneObjectRegistry::new(),
            engine: AnimationEngine::new(),
            placer: Placer::new(),
            heading,
            actions,
            rng: StdRng::from_entropy(),
            session_start: 0,
            last_refresh: 0,
            has_layer: false,
        }
    }

    /// Reseed the duplication jitter
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Tracker publishing into this session's pose
    pub fn position_tracker(&self) -> PositionTracker {
        PositionTracker::with_pose(&self.config.tracking, self.handle.pose())
    }

    /// Poll `source` on a background thread, feeding this session's pose
    pub fn spawn_location_poller<S: LocationSource + 'static>(
        &self,
        source: S,
    ) -> std::io::Result<PollerHandle<S>> {
        LocationPoller::with_tracker(source, self.position_tracker(), &self.config.tracking).spawn()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable access for the host, e.g. to attach audio cues or growth hooks
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    pub fn registry(&self) -> &SceneObjectRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &AnimationEngine {
        &self.engine
    }

    pub fn actions(&self) -> &A {
        &self.actions
    }

    pub fn displayed_heading(&self) -> f64 {
        self.heading.shown()
    }

    /// Advance one frame
    pub fn update(&mut self, input: FrameInput) -> EngineResult<FrameReport> {
        let now = input.now_ticks;
        let mut report = FrameReport {
            fps: self.placer.tick(now),
            ..FrameReport::default()
        };

        let pose = self.handle.pose();
        let device = pose.position();
        report.device = device;
        report.location_error = pose.error();

        self.synchronize(now, device, &mut report)?;
        self.request_periodic_refresh(now);

        let mut effects = Vec::new();
        match (device, report.location_error.is_some()) {
            (Some(device), false) => {
                let area = self.registry.settings().area;
                report.moved = self.placer.update_targets(
                    &mut self.registry,
                    &mut self.graph,
                    device,
                    area,
                    &self.config.placement,
                );
                self.placer
                    .apply_frame(&self.registry, &mut self.graph, area, &self.config.placement);
                self.engine.activate_on_follow(
                    &report.moved,
                    &mut self.graph,
                    self.session_start,
                    now,
                    &mut effects,
                );
            }
            (_, true) => debug!("Placement suspended by location error"),
            (None, false) => {}
        }

        let frame = AnimationFrame {
            session_start: self.session_start,
            now,
            camera_position: input.camera_position,
            focus_ray: input.focus_ray,
            click_ray: input.click_ray,
            max_ray_distance: self.config.interaction.raycast_max_distance_m,
        };
        let animations = self.engine.handle_animations(&mut self.graph, &frame, &mut effects);
        report.focused = animations.focused;
        report.clicked = animations.clicked;
        self.dispatch(effects);

        for owner in animations.to_destroy {
            if self.registry.mark_pending_deletion(owner) {
                debug!(id = owner.0, "Destroy animation requested removal");
                self.handle.inbox.request_deletion(owner)?;
            }
        }
        for owner in self.engine.take_duplicates() {
            if let Some(id) = self.duplicate(owner)? {
                report.duplicated.push(id);
            }
        }

        report.heading = self.heading.update(pose.raw_heading());
        report.information = self.information(&report, pose.raw_heading());
        report.state = match (&report.location_error, device) {
            (Some(_), _) => SessionState::LocationError,
            (None, _) if !self.has_layer && self.registry.is_empty() => SessionState::WaitingForLayer,
            (None, None) => SessionState::WaitingForLocation,
            (None, Some(_)) => SessionState::Running,
        };
        Ok(report)
    }

    fn synchronize(&mut self, now: Ticks, device: Option<GeoPosition>, report: &mut FrameReport) -> EngineResult<()> {
        let inbox = Arc::clone(&self.handle.inbox);
        if !inbox.is_dirty() {
            return Ok(());
        }
        let sync = self
            .registry
            .synchronize(&inbox, &mut self.graph, &mut self.engine, device, &self.config)?;

        if let Some(settings) = &sync.settings {
            self.has_layer = true;
            self.last_refresh = now;
            self.handle
                .pose
                .set_kalman_enabled(self.config.tracking.kalman_enabled && settings.apply_kalman_filter);
            self.placer.invalidate();
        }
        if self.session_start == 0 && !self.registry.is_empty() {
            self.session_start = now.max(1);
        }
        report.created = sync.created;
        report.destroyed = sync.destroyed;
        Ok(())
    }

    fn request_periodic_refresh(&mut self, now: Ticks) {
        let Some(interval) = self.registry.settings().refresh_interval_s else {
            return;
        };
        if self.has_layer && now - self.last_refresh >= seconds_to_ticks(interval) {
            debug!(interval, "Refresh interval elapsed");
            self.last_refresh = now;
            self.handle.feed.request_refresh();
        }
    }

    fn dispatch(&mut self, effects: Vec<AnimationEffect>) {
        for effect in effects {
            match effect {
                AnimationEffect::OpenUrl(url) => self.actions.open_url(&url),
                AnimationEffect::PlayAudio { owner, cue } => self.actions.play_audio(owner, &cue),
                AnimationEffect::RequestRefresh => {
                    self.handle.feed.request_refresh();
                    self.actions.refresh_requested();
                }
            }
        }
    }

    /// Queue a jittered copy of `owner`
    fn duplicate(&mut self, owner: ObjectId) -> EngineResult<Option<ObjectId>> {
        let Some(object) = self.registry.object(owner) else {
            return Ok(None);
        };
        let mut poi = object.poi.clone();
        let (is_relative, anchor) = (object.is_relative, object.anchor);
        let id = self.registry.next_duplicate_id();
        poi.id = id.0;

        match poi.poi_object.as_mut() {
            Some(content) if is_relative => {
                let mut offset = content.relative_offset();
                offset[0] += self.rng.gen_range(-1000..=1000) as f64 / 100.0;
                offset[2] += self.rng.gen_range(-1000..=1000) as f64 / 100.0;
                content.set_relative_offset(offset);
            }
            _ => {
                poi.lat += self.rng.gen_range(-100..=100);
                poi.lon += self.rng.gen_range(-100..=100);
            }
        }

        debug!(source = owner.0, id = id.0, "Duplicating object");
        self.handle.inbox.submit_duplicate(poi, anchor)?;
        Ok(Some(id))
    }

    fn information(&self, report: &FrameReport, raw_heading: f64) -> Option<String> {
        let template = self.registry.settings().information_message.as_deref()?;
        let first_object = self
            .registry
            .objects_to_place()
            .first()
            .and_then(|id| self.registry.object(*id))
            .map(|o| GeoPosition::new(o.latitude, o.longitude));
        let status = StatusSnapshot {
            fps: report.fps,
            object_count: self.registry.len(),
            animation_count: self.engine.len(),
            displayed_heading: report.heading,
            raw_heading,
            device: report.device.unwrap_or_default(),
            first_object,
        };
        Some(render_information(template, &status))
    }
}
