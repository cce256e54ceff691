//! Location scene: marker registry, refresh scheduling, and per-frame
//! anchor management.
//!
//! # Data flow
//!
//! ```text
//! SensorSender ──► inbox ─┐
//! on_location_changed ────┤
//! on_bearing_changed ─────┼──► SceneState ──► RefreshScheduler
//!                         │                        │ (coalesced request)
//! on_frame_update ────────┘                        ▼
//!      │                               anchors::evaluate ──► ArHost
//!      └────────────────► frame::update_node (every frame) ──► ArHost
//! ```
//!
//! All mutation happens on the thread that owns the scene. Sensor readings
//! from other threads go through [`SensorSender`].
//!
//! # Example
//!
//! ```
//! use arlocation::geodesy::GeoPoint;
//! use arlocation::host::{HeadlessHost, Pose, RenderableId, TrackingState};
//! use arlocation::marker::Marker;
//! use arlocation::scene::{FrameInput, LocationScene};
//!
//! let mut scene = LocationScene::new(HeadlessHost::new());
//! let id = scene
//!     .add_marker(Marker::new(GeoPoint::new(48.0001, 2.0), RenderableId(1)))
//!     .unwrap();
//!
//! scene.on_location_changed(GeoPoint::new(48.0, 2.0));
//! scene.on_bearing_changed(0.0);
//! let report = scene
//!     .on_frame_update(FrameInput::new(TrackingState::Tracking, Pose::IDENTITY))
//!     .unwrap();
//!
//! assert!(report.refreshed);
//! assert!(scene.is_rendered(id));
//! ```

mod anchors;
mod frame;
mod scheduler;
mod state;

pub use anchors::{horizon_adjustment, AnchorPlan};
pub use frame::{FrameInput, FrameReport, MarkerFrame};
pub use scheduler::{RefreshReason, RefreshRequest, RefreshScheduler, RefreshTimer};
pub use state::MarkerStatus;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{ConfigResult, OverlapConfig, SceneConfig};
use crate::error::{SceneError, SceneResult};
use crate::geodesy::GeoPoint;
use crate::host::{ArHost, Pose, TrackingState};
use crate::marker::{Marker, MarkerId, PlacementType};
use crate::sensor::{SensorEvent, SensorInbox, SensorSender};
use crate::telemetry::{SceneMetrics, TelemetrySnapshot};

use anchors::{Evaluation, PlacementContext};
use frame::ResolveContext;
use state::{MarkerEntry, SceneState};

/// Geo-anchored marker scene driven by a host AR runtime.
pub struct LocationScene<H: ArHost> {
    host: H,
    config: SceneConfig,
    state: SceneState,
    markers: Vec<MarkerEntry<H::Anchor>>,
    next_id: u64,
    scheduler: RefreshScheduler,
    inbox: SensorInbox,
    metrics: Arc<SceneMetrics>,
}

impl<H: ArHost> LocationScene<H> {
    /// Scene with default configuration.
    pub fn new(host: H) -> Self {
        Self::build(host, SceneConfig::default())
    }

    /// Scene with custom settings. Fails if `config` does not validate.
    pub fn with_config(host: H, config: SceneConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::build(host, config))
    }

    fn build(host: H, config: SceneConfig) -> Self {
        let scheduler =
            RefreshScheduler::new(config.location_update_threshold_m, config.refresh_interval);
        Self {
            host,
            config,
            state: SceneState::default(),
            markers: Vec::new(),
            next_id: 1,
            scheduler,
            inbox: SensorInbox::new(),
            metrics: Arc::new(SceneMetrics::new()),
        }
    }

    // =========================================================================
    // Marker registry
    // =========================================================================

    /// Register a marker. It is placed on the next ready frame.
    pub fn add_marker(&mut self, marker: Marker) -> SceneResult<MarkerId> {
        marker.validate()?;
        let id = MarkerId::from_raw(self.next_id);
        self.next_id += 1;
        debug!(marker = %id, position = %marker.position, "Marker added");
        self.markers.push(MarkerEntry::new(id, marker));
        self.scheduler.request_marker(id);
        Ok(id)
    }

    /// Unregister a marker and release its anchor.
    ///
    /// Unknown ids are ignored with a warning.
    pub fn remove_marker(&mut self, id: MarkerId) -> Option<Marker> {
        let Some(index) = self.index_of(id) else {
            warn!(marker = %id, "Cannot remove unknown marker");
            return None;
        };
        let mut entry = self.markers.remove(index);
        anchors::detach(&mut self.host, &mut entry, &self.metrics);
        self.scheduler.forget_marker(id);
        debug!(marker = %id, "Marker removed");
        Some(entry.marker)
    }

    /// Unregister every marker and release all anchors.
    pub fn clear_markers(&mut self) {
        let count = self.markers.len();
        for mut entry in self.markers.drain(..) {
            anchors::detach(&mut self.host, &mut entry, &self.metrics);
            self.scheduler.forget_marker(entry.id);
        }
        if count > 0 {
            info!(count, "Cleared markers");
        }
    }

    /// Edit a marker in place. Its anchor is rebuilt on the next ready frame.
    ///
    /// The edit is rejected, leaving the marker untouched, if the result
    /// does not validate.
    pub fn update_marker<F>(&mut self, id: MarkerId, edit: F) -> SceneResult<()>
    where
        F: FnOnce(&mut Marker),
    {
        let index = self
            .index_of(id)
            .ok_or(SceneError::UnregisteredMarker(id))?;
        let mut updated = self.markers[index].marker.clone();
        edit(&mut updated);
        updated.validate()?;

        let entry = &mut self.markers[index];
        entry.marker = updated;
        anchors::detach(&mut self.host, entry, &self.metrics);
        self.scheduler.request_marker(id);
        Ok(())
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.entry(id).map(|e| &e.marker)
    }

    pub fn marker_status(&self, id: MarkerId) -> Option<MarkerStatus> {
        self.entry(id).map(MarkerEntry::status)
    }

    pub fn is_rendered(&self, id: MarkerId) -> bool {
        self.marker_status(id) == Some(MarkerStatus::Rendered)
    }

    /// Registered markers in insertion order.
    pub fn markers(&self) -> impl Iterator<Item = (MarkerId, &Marker)> {
        self.markers.iter().map(|e| (e.id, &e.marker))
    }

    /// Markers currently holding an anchor.
    pub fn rendered_markers(&self) -> impl Iterator<Item = MarkerId> + '_ {
        self.markers
            .iter()
            .filter(|e| e.node().is_some())
            .map(|e| e.id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    // =========================================================================
    // Refresh requests
    // =========================================================================

    /// Re-evaluate every marker on the next ready frame, including static
    /// markers that are already anchored.
    pub fn refresh_scene(&mut self) {
        self.scheduler.request_all(RefreshReason::Manual, true);
    }

    /// Re-anchor one marker on the next ready frame.
    pub fn refresh_marker(&mut self, id: MarkerId) -> SceneResult<()> {
        if self.index_of(id).is_none() {
            return Err(SceneError::UnregisteredMarker(id));
        }
        self.scheduler.request_marker(id);
        Ok(())
    }

    /// Whether a refresh is waiting for a ready frame.
    pub fn refresh_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    // =========================================================================
    // Sensor input
    // =========================================================================

    /// Handle for feeding sensor readings from other threads.
    pub fn sensor_sender(&self) -> SensorSender {
        self.inbox.sender()
    }

    /// Record a new observer position. Non-finite or out-of-range
    /// positions are dropped.
    pub fn on_location_changed(&mut self, location: GeoPoint) {
        if !location.is_valid() {
            warn!(?location, "Ignoring malformed location reading");
            return;
        }
        let previous = self.state.location.push(location);
        self.scheduler
            .on_location(previous, location, self.config.geodesic_model);
    }

    pub fn on_bearing_changed(&mut self, bearing_deg: f32) {
        if !bearing_deg.is_finite() {
            warn!(bearing_deg, "Ignoring non-finite bearing reading");
            return;
        }
        let previous = self.state.bearing.push(bearing_deg);
        self.scheduler.on_bearing(previous);
    }

    fn apply_sensor_event(&mut self, event: SensorEvent) {
        self.metrics.sensor_event_received();
        match event {
            SensorEvent::Location(location) => self.on_location_changed(location),
            SensorEvent::Bearing(bearing) => self.on_bearing_changed(bearing),
        }
    }

    // =========================================================================
    // Frame loop
    // =========================================================================

    /// Process one rendered frame.
    ///
    /// Drains queued sensor readings, runs any due refresh, re-anchors
    /// dynamic markers, and rewrites scale/rotation of every anchored node.
    pub fn on_frame_update(&mut self, frame: FrameInput) -> SceneResult<FrameReport> {
        self.metrics.frame_processed();

        for event in self.inbox.drain() {
            self.apply_sensor_event(event);
        }

        let previous = self.state.tracking.push(frame.tracking_state);
        self.scheduler.on_tracking(previous, frame.tracking_state);
        self.scheduler.poll_timer(frame.timestamp);

        let mut report = FrameReport {
            tracking_state: frame.tracking_state,
            ready: self.state.is_ready(),
            refreshed: false,
            anchors_placed: 0,
            markers: Vec::with_capacity(self.markers.len()),
        };

        let (Some(observer), Some(heading_deg)) =
            (self.state.location.current(), self.state.bearing.current())
        else {
            report.markers = self.idle_frames(None);
            return Ok(report);
        };

        if !report.ready {
            report.markers = self.idle_frames(Some(observer));
            return Ok(report);
        }

        let ctx = PlacementContext {
            observer,
            heading_deg,
            camera_pose: frame.camera_pose,
            display_height_offset: frame.display_height_offset,
            config: &self.config,
        };

        let mut placed: HashSet<MarkerId> = HashSet::new();

        if let Some(request) = self.scheduler.take() {
            self.metrics.refresh_executed();
            report.refreshed = true;
            for entry in &mut self.markers {
                let Some(force) = request.covers(entry.id) else {
                    continue;
                };
                match anchors::evaluate(&mut self.host, entry, &ctx, force, &self.metrics) {
                    Evaluation::Placed => {
                        placed.insert(entry.id);
                    }
                    Evaluation::Failed(_) => self.scheduler.request_marker(entry.id),
                    Evaluation::Kept | Evaluation::OutOfRange => {}
                }
            }
        }

        if self.config.reanchor_dynamic_every_frame {
            for entry in &mut self.markers {
                if entry.marker.placement != PlacementType::Dynamic || placed.contains(&entry.id) {
                    continue;
                }
                match anchors::evaluate(&mut self.host, entry, &ctx, false, &self.metrics) {
                    Evaluation::Placed => {
                        placed.insert(entry.id);
                    }
                    Evaluation::Failed(_) => self.scheduler.request_marker(entry.id),
                    Evaluation::Kept | Evaluation::OutOfRange => {}
                }
            }
        }
        report.anchors_placed = placed.len();

        let resolve = ResolveContext {
            camera_pose: frame.camera_pose,
            config: &self.config,
        };
        for entry in &mut self.markers {
            let distance_m = self
                .config
                .geodesic_model
                .geodesic(observer, entry.marker.position)
                .distance_m;
            let applied = if !self.config.minimal_refreshing || placed.contains(&entry.id) {
                frame::update_node(&mut self.host, entry, &resolve, distance_m)?
            } else {
                None
            };
            report.markers.push(frame::marker_frame(
                &self.host,
                entry,
                Some(distance_m),
                applied,
                true,
            ));
        }

        Ok(report)
    }

    /// Marker views for a frame that could not run placement.
    fn idle_frames(&self, observer: Option<GeoPoint>) -> Vec<MarkerFrame> {
        self.markers
            .iter()
            .map(|entry| {
                let distance_m = observer.map(|o| {
                    self.config
                        .geodesic_model
                        .geodesic(o, entry.marker.position)
                        .distance_m
                });
                frame::marker_frame(&self.host, entry, distance_m, None, false)
            })
            .collect()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn current_location(&self) -> Option<GeoPoint> {
        self.state.location.current()
    }

    /// Location reading replaced by the latest one.
    pub fn previous_location(&self) -> Option<GeoPoint> {
        self.state.location.previous()
    }

    pub fn current_bearing(&self) -> Option<f32> {
        self.state.bearing.current()
    }

    pub fn previous_bearing(&self) -> Option<f32> {
        self.state.bearing.previous()
    }

    pub fn tracking_state(&self) -> Option<TrackingState> {
        self.state.tracking.current()
    }

    /// Where `id` would be anchored given the current location and bearing,
    /// for a camera at `camera_pose`.
    pub fn anchor_plan(
        &self,
        id: MarkerId,
        camera_pose: Pose,
    ) -> SceneResult<Option<AnchorPlan>> {
        let entry = self.entry(id).ok_or(SceneError::UnregisteredMarker(id))?;
        let (Some(observer), Some(heading_deg)) =
            (self.state.location.current(), self.state.bearing.current())
        else {
            return Ok(None);
        };
        let ctx = PlacementContext {
            observer,
            heading_deg,
            camera_pose,
            display_height_offset: 0.0,
            config: &self.config,
        };
        Ok(Some(anchors::plan(&entry.marker, &ctx)))
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Shared telemetry counters.
    pub fn metrics(&self) -> Arc<SceneMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Point-in-time copy of the telemetry counters.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.metrics.snapshot()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    // =========================================================================
    // Runtime settings
    // =========================================================================

    /// Change the compass calibration. Re-anchors every marker.
    pub fn set_bearing_adjustment(&mut self, degrees: f32) -> ConfigResult<()> {
        if self.config.bearing_adjustment_deg == degrees {
            return Ok(());
        }
        self.reconfigure(|c| c.bearing_adjustment_deg = degrees)?;
        info!(degrees, "Bearing adjustment changed");
        self.scheduler.request_all(RefreshReason::Calibration, true);
        Ok(())
    }

    pub fn set_refresh_interval(&mut self, interval: Option<Duration>) {
        self.config.refresh_interval = interval;
        self.scheduler.set_interval(interval);
    }

    pub fn set_location_update_threshold(&mut self, threshold_m: f64) -> ConfigResult<()> {
        self.reconfigure(|c| c.location_update_threshold_m = threshold_m)?;
        self.scheduler.set_threshold(threshold_m);
        Ok(())
    }

    /// Change the dynamic render distance. Re-anchors every marker.
    pub fn set_max_render_distance(&mut self, distance_m: f64) -> ConfigResult<()> {
        self.reconfigure(|c| c.max_render_distance_m = distance_m)?;
        self.scheduler.request_all(RefreshReason::Manual, true);
        Ok(())
    }

    pub fn set_minimal_refreshing(&mut self, enabled: bool) {
        self.config.minimal_refreshing = enabled;
    }

    pub fn set_overlap(&mut self, overlap: OverlapConfig) -> ConfigResult<()> {
        self.reconfigure(|c| c.overlap = overlap)
    }

    /// Apply `edit` to a copy of the settings and keep it only if it
    /// validates.
    fn reconfigure<F>(&mut self, edit: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut SceneConfig),
    {
        let mut updated = self.config.clone();
        edit(&mut updated);
        updated.validate()?;
        self.config = updated;
        Ok(())
    }

    fn index_of(&self, id: MarkerId) -> Option<usize> {
        self.markers.iter().position(|e| e.id == id)
    }

    fn entry(&self, id: MarkerId) -> Option<&MarkerEntry<H::Anchor>> {
        self.markers.iter().find(|e| e.id == id)
    }
}

impl<H: ArHost> Drop for LocationScene<H> {
    fn drop(&mut self) {
        for entry in &mut self.markers {
            anchors::detach(&mut self.host, entry, &self.metrics);
        }
    }
}
