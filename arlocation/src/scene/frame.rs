//! Per-frame node updates and frame reports.
//!
//! Every tracked frame, each anchored node gets its pinned height, scale,
//! and rotation rewritten from the current camera position. Optional
//! overlap handling raises colliding nodes or hides nodes that sit behind a
//! nearer marker.

use std::time::Instant;

use glam::{Quat, Vec3};
use serde::Serialize;
use tracing::trace;

use crate::config::SceneConfig;
use crate::error::SceneResult;
use crate::host::{ArHost, NodeTransform, Pose, Ray, RenderableId, TrackingState};
use crate::marker::{MarkerId, PlacementType};
use crate::scaling::{resolve_rotation, resolve_scale, ScaleInputs};

use super::state::{MarkerEntry, MarkerStatus, Slot};

/// Camera state delivered by the host once per rendered frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub tracking_state: TrackingState,
    /// Display-oriented camera pose in scene space.
    pub camera_pose: Pose,
    /// Vertical offset of the display relative to `camera_pose`, added to
    /// dynamic anchors.
    pub display_height_offset: f32,
    /// Frame clock, used for the refresh timer.
    pub timestamp: Instant,
}

impl FrameInput {
    /// Frame stamped with the current time.
    pub fn new(tracking_state: TrackingState, camera_pose: Pose) -> Self {
        Self {
            tracking_state,
            camera_pose,
            display_height_offset: 0.0,
            timestamp: Instant::now(),
        }
    }

    pub fn with_display_height_offset(mut self, offset: f32) -> Self {
        self.display_height_offset = offset;
        self
    }

    pub fn at(mut self, timestamp: Instant) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// What happened to one marker this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerFrame {
    pub id: MarkerId,
    pub status: MarkerStatus,
    /// Geodesic distance, when the observer location is known.
    pub distance_m: Option<f64>,
    /// Node world position, when rendered.
    pub position: Option<Vec3>,
    pub scale: Option<f32>,
    pub rotation: Option<Quat>,
    pub placement: PlacementType,
    /// Visible (rendered, tracked, and not hidden by overlap removal).
    pub visible: bool,
}

/// Summary of one [`LocationScene::on_frame_update`](super::LocationScene::on_frame_update).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub tracking_state: TrackingState,
    /// Location, bearing, and tracking were all available.
    pub ready: bool,
    /// A scheduled refresh ran this frame.
    pub refreshed: bool,
    /// Anchors created this frame.
    pub anchors_placed: usize,
    pub markers: Vec<MarkerFrame>,
}

impl FrameReport {
    /// Markers visible this frame.
    pub fn visible(&self) -> impl Iterator<Item = &MarkerFrame> {
        self.markers.iter().filter(|m| m.visible)
    }

    pub fn marker(&self, id: MarkerId) -> Option<&MarkerFrame> {
        self.markers.iter().find(|m| m.id == id)
    }
}

/// Inputs shared by every node update in a frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolveContext<'a> {
    pub(crate) camera_pose: Pose,
    pub(crate) config: &'a SceneConfig,
}

/// Rewrite height, scale, and rotation of one anchored node.
///
/// `real_distance_m` is the geodesic distance from the observer to the
/// marker, already computed by the caller for the frame report.
/// Returns `(scale, rotation)` as applied.
pub(crate) fn update_node<H: ArHost>(
    host: &mut H,
    entry: &mut MarkerEntry<H::Anchor>,
    ctx: &ResolveContext<'_>,
    real_distance_m: f64,
) -> SceneResult<Option<(Option<f32>, Option<Quat>)>> {
    let MarkerEntry { id, marker, slot } = entry;
    let Slot::Rendered(node) = slot else {
        return Ok(None);
    };
    let config = ctx.config;

    if config.overlap.offset_overlapping && host.overlaps_other(&node.anchor) {
        node.pinned_height += config.overlap.raise_step_m;
        trace!(marker = %id, height = node.pinned_height, "Raised overlapping node");
    }

    let camera = ctx.camera_pose.translation;
    let mut node_position = host.node_world_position(&node.anchor);
    node_position.y = node.pinned_height;
    let direction = camera - node_position;

    let inputs = ScaleInputs {
        direction,
        real_distance_m,
        render_distance_m: real_distance_m.min(config.max_render_distance_m),
        max_render_distance_m: config.max_render_distance_m,
    };
    let scale = resolve_scale(marker, &inputs, &config.scaling)?;
    let rotation = resolve_rotation(marker.rotation, direction);

    host.apply_node_transform(
        &node.anchor,
        NodeTransform {
            height: node.pinned_height,
            scale,
            rotation,
        },
    );

    if config.overlap.remove_overlapping {
        let enabled = !is_occluded(
            host,
            marker.renderable,
            &ctx.camera_pose,
            node_position,
            config.overlap.side_ray_angle_rad,
        );
        if enabled != node.enabled {
            trace!(marker = %id, enabled, "Node visibility changed by overlap");
            host.set_node_enabled(&node.anchor, enabled);
            node.enabled = enabled;
        }
    }

    Ok(Some((scale, rotation)))
}

/// Whether a nearer marker covers `renderable` along any of three hit-test
/// rays: through the node and to either side of it along camera-left.
fn is_occluded<H: ArHost>(
    host: &H,
    renderable: RenderableId,
    camera: &Pose,
    node_position: Vec3,
    side_ray_angle_rad: f32,
) -> bool {
    let distance = (node_position - camera.translation).length();
    let lateral = camera.left().normalize_or_zero() * distance * side_ray_angle_rad.sin();
    let targets = [
        node_position + lateral,
        node_position,
        node_position - lateral,
    ];

    targets.iter().any(|target| {
        let Some(ray) = Ray::through(camera.translation, *target) else {
            return false;
        };
        host.hit_test_all(&ray)
            .into_iter()
            .find(|hit| hit.renderable == Some(renderable) || (hit.enabled && hit.renderable.is_some()))
            .is_some_and(|hit| hit.renderable != Some(renderable))
    })
}

/// Build the public view of one marker.
pub(crate) fn marker_frame<H: ArHost>(
    host: &H,
    entry: &MarkerEntry<H::Anchor>,
    distance_m: Option<f64>,
    applied: Option<(Option<f32>, Option<Quat>)>,
    tracking: bool,
) -> MarkerFrame {
    let node = entry.node();
    let (scale, rotation) = applied.unwrap_or((None, None));
    MarkerFrame {
        id: entry.id,
        status: entry.status(),
        distance_m,
        position: node.map(|n| {
            let mut p = host.node_world_position(&n.anchor);
            p.y = n.pinned_height;
            p
        }),
        scale,
        rotation,
        placement: entry.marker.placement,
        visible: tracking && node.is_some_and(|n| n.enabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::GeoPoint;
    use crate::host::HeadlessHost;
    use crate::marker::{Marker, RotationMode, ScalingMode};
    use crate::scene::state::AnchorNode;
    use std::sync::{Arc, Mutex};

    const OBSERVER: GeoPoint = GeoPoint::new(48.0, 2.0);

    fn rendered_entry(
        host: &mut HeadlessHost,
        raw_id: u64,
        marker: Marker,
        position: Vec3,
    ) -> MarkerEntry<crate::host::HeadlessAnchor> {
        let anchor = host.create_anchor(Pose::from_translation(position)).unwrap();
        host.attach_child(&anchor, marker.renderable);
        let mut entry = MarkerEntry::new(MarkerId::from_raw(raw_id), marker);
        entry.slot = Slot::Rendered(AnchorNode {
            anchor,
            placement: PlacementType::Static,
            pinned_height: position.y,
            enabled: true,
        });
        entry
    }

    fn marker_at(renderable: u64, meters_north: f64) -> Marker {
        Marker::new(
            crate::geodesy::destination(OBSERVER, 0.0, meters_north),
            RenderableId(renderable),
        )
    }

    #[test]
    fn test_fixed_size_scale_tracks_scene_distance() {
        let config = SceneConfig::default();
        let mut host = HeadlessHost::new();
        let marker = marker_at(1, 8.0)
            .with_scaling(ScalingMode::FixedSize)
            .with_rotation(RotationMode::FaceUser);
        let mut entry = rendered_entry(&mut host, 1, marker, Vec3::new(0.0, 0.0, -8.0));
        let ctx = ResolveContext {
            camera_pose: Pose::IDENTITY,
            config: &config,
        };

        let (scale, rotation) = update_node(&mut host, &mut entry, &ctx, 8.0).unwrap().unwrap();
        assert!((scale.unwrap() - 8.0).abs() < 1e-4);
        let forward = rotation.unwrap() * Vec3::NEG_Z;
        assert!((forward - Vec3::Z).length() < 1e-4);

        let anchor = entry.node().unwrap().anchor;
        let applied = host.anchor(&anchor).unwrap().transform.unwrap();
        assert_eq!(applied.height, 0.0);
    }

    #[test]
    fn test_scale_uses_supplied_distance() {
        let config = SceneConfig::default();
        let mut host = HeadlessHost::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&seen);
        let marker = marker_at(1, 8.0).with_custom_scale(move |d| {
            recorded.lock().unwrap().push(d);
            1.0
        });
        let mut entry = rendered_entry(&mut host, 1, marker, Vec3::new(0.0, 0.0, -8.0));
        let ctx = ResolveContext {
            camera_pose: Pose::IDENTITY,
            config: &config,
        };

        update_node(&mut host, &mut entry, &ctx, 123.0).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![123.0]);
    }

    #[test]
    fn test_pinned_height_on_level_ground() {
        let config = SceneConfig::default();
        let mut host = HeadlessHost::new();
        let mut marker = marker_at(1, 8.0);
        marker.height_m = 2.0;
        let mut entry = rendered_entry(&mut host, 1, marker, Vec3::new(0.0, 2.0, -8.0));
        let ctx = ResolveContext {
            camera_pose: Pose::IDENTITY,
            config: &config,
        };

        for _ in 0..3 {
            update_node(&mut host, &mut entry, &ctx, 8.0).unwrap();
        }
        assert_eq!(entry.node().unwrap().pinned_height, 2.0);
        let anchor = entry.node().unwrap().anchor;
        assert_eq!(host.anchor(&anchor).unwrap().transform.unwrap().height, 2.0);
        let frame = marker_frame(&host, &entry, Some(8.0), None, true);
        assert_eq!(frame.position, Some(Vec3::new(0.0, 2.0, -8.0)));
    }

    #[test]
    fn test_offset_overlapping_raises_node() {
        let mut config = SceneConfig::default();
        config.overlap.offset_overlapping = true;
        let mut host = HeadlessHost::new();
        let mut a = rendered_entry(&mut host, 1, marker_at(1, 8.0), Vec3::new(0.0, 0.0, -8.0));
        let _b = rendered_entry(&mut host, 2, marker_at(2, 8.0), Vec3::new(0.3, 0.0, -8.0));
        let ctx = ResolveContext {
            camera_pose: Pose::IDENTITY,
            config: &config,
        };

        update_node(&mut host, &mut a, &ctx, 8.0).unwrap();
        assert!((a.node().unwrap().pinned_height - 1.2).abs() < 1e-6);
        // Raised clear of the other node; no further rise.
        update_node(&mut host, &mut a, &ctx, 8.0).unwrap();
        assert!((a.node().unwrap().pinned_height - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_remove_overlapping_hides_farther_node() {
        let mut config = SceneConfig::default();
        config.overlap.remove_overlapping = true;
        let mut host = HeadlessHost::new();
        let mut near = rendered_entry(&mut host, 1, marker_at(1, 5.0), Vec3::new(0.0, 0.0, -5.0));
        let mut far = rendered_entry(&mut host, 2, marker_at(2, 20.0), Vec3::new(0.0, 0.0, -20.0));
        let ctx = ResolveContext {
            camera_pose: Pose::IDENTITY,
            config: &config,
        };

        update_node(&mut host, &mut near, &ctx, 5.0).unwrap();
        update_node(&mut host, &mut far, &ctx, 20.0).unwrap();
        assert!(near.node().unwrap().enabled);
        assert!(!far.node().unwrap().enabled);
        let far_anchor = far.node().unwrap().anchor;
        assert!(!host.anchor(&far_anchor).unwrap().enabled);
    }

    #[test]
    fn test_marker_frame_hidden_when_not_tracking() {
        let mut host = HeadlessHost::new();
        let entry = rendered_entry(&mut host, 1, marker_at(1, 5.0), Vec3::new(0.0, 0.0, -5.0));
        let frame = marker_frame(&host, &entry, Some(5.0), None, false);
        assert_eq!(frame.status, MarkerStatus::Rendered);
        assert!(!frame.visible);
        assert_eq!(frame.position, Some(Vec3::new(0.0, 0.0, -5.0)));
    }
}
