//! Anchor placement for static and dynamic markers.
//!
//! Static markers are anchored once at their true projected distance and
//! kept while in range. Dynamic markers are re-anchored around the live
//! camera at a capped distance, with a small rise so far markers sit
//! towards the horizon instead of on the render-distance sphere.

use tracing::{debug, trace, warn};

use crate::config::SceneConfig;
use crate::geodesy::{GeoPoint, GeodesicResult};
use crate::host::{ArHost, HostError, Pose};
use crate::marker::{Marker, PlacementType};
use crate::projection::{project, project_geodesic, relative_azimuth};
use crate::telemetry::SceneMetrics;

use super::state::{AnchorNode, MarkerEntry, Slot};

/// Observer and camera state a placement is computed from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlacementContext<'a> {
    pub(crate) observer: GeoPoint,
    pub(crate) heading_deg: f32,
    pub(crate) camera_pose: Pose,
    pub(crate) display_height_offset: f32,
    pub(crate) config: &'a SceneConfig,
}

/// Where an anchor would be created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPlan {
    pub pose: Pose,
    /// Geodesic distance to the marker.
    pub distance_m: f64,
    /// Distance the anchor is actually placed at.
    pub render_distance_m: f64,
    pub height_adjustment_m: f64,
}

/// Outcome of evaluating one marker.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Evaluation {
    /// Static marker already anchored; left alone.
    Kept,
    Placed,
    OutOfRange,
    /// Anchor creation failed; retried on the next eligible tick.
    Failed(HostError),
}

/// Upward offset for a dynamic marker clamped from `distance_m` to
/// `render_distance_m`.
pub fn horizon_adjustment(
    distance_m: f64,
    render_distance_m: f64,
    rise_per_m: f64,
    cap_m: f64,
) -> f64 {
    if render_distance_m >= distance_m {
        return 0.0;
    }
    rise_per_m * (distance_m.min(cap_m) - render_distance_m).max(0.0)
}

/// Anchor at the true projected offset, `height_m` above the camera.
///
/// Only the camera's heading is used; pitch and roll are ignored.
pub(crate) fn plan_static(
    geodesic: &GeodesicResult,
    marker: &Marker,
    ctx: &PlacementContext<'_>,
) -> AnchorPlan {
    let offset = project_geodesic(geodesic, ctx.heading_deg, ctx.config.bearing_adjustment_deg);
    let local = Pose::from_translation(offset.to_scene(marker.height_m));
    AnchorPlan {
        pose: ctx.camera_pose.yaw_only().compose(&local).translation_only(),
        distance_m: geodesic.distance_m,
        render_distance_m: geodesic.distance_m,
        height_adjustment_m: 0.0,
    }
}

/// Anchor at a capped offset from the live camera pose.
pub(crate) fn plan_dynamic(
    geodesic: &GeodesicResult,
    marker: &Marker,
    ctx: &PlacementContext<'_>,
) -> AnchorPlan {
    let config = ctx.config;
    let render_distance_m = geodesic.distance_m.min(config.max_render_distance_m);
    let height_adjustment_m = horizon_adjustment(
        geodesic.distance_m,
        render_distance_m,
        config.horizon_rise_per_m,
        config.horizon_cap_m,
    );

    let azimuth = relative_azimuth(
        geodesic.azimuth_deg,
        ctx.heading_deg,
        config.bearing_adjustment_deg,
    );
    let offset = project(render_distance_m, azimuth);
    let height = ctx.display_height_offset + marker.height_m + height_adjustment_m as f32;
    let local = Pose::from_translation(offset.to_scene(height));

    AnchorPlan {
        pose: ctx.camera_pose.yaw_only().compose(&local).translation_only(),
        distance_m: geodesic.distance_m,
        render_distance_m,
        height_adjustment_m,
    }
}

/// Plan for `marker` as seen from `ctx`, regardless of its current state.
pub(crate) fn plan(marker: &Marker, ctx: &PlacementContext<'_>) -> AnchorPlan {
    let geodesic = ctx
        .config
        .geodesic_model
        .geodesic(ctx.observer, marker.position);
    match marker.placement {
        PlacementType::Static => plan_static(&geodesic, marker, ctx),
        PlacementType::Dynamic => plan_dynamic(&geodesic, marker, ctx),
    }
}

/// Release the anchor of `entry`, if any.
pub(crate) fn detach<H: ArHost>(
    host: &mut H,
    entry: &mut MarkerEntry<H::Anchor>,
    metrics: &SceneMetrics,
) {
    if let Some(node) = entry.take_node() {
        host.detach(node.anchor);
        metrics.anchor_detached();
    }
}

/// Attach, detach, or keep the anchor for one marker.
///
/// `force` re-anchors static markers that are already rendered.
pub(crate) fn evaluate<H: ArHost>(
    host: &mut H,
    entry: &mut MarkerEntry<H::Anchor>,
    ctx: &PlacementContext<'_>,
    force: bool,
    metrics: &SceneMetrics,
) -> Evaluation {
    metrics.marker_evaluated();

    let geodesic = ctx
        .config
        .geodesic_model
        .geodesic(ctx.observer, entry.marker.position);

    if !entry.marker.in_range(geodesic.distance_m) {
        detach(host, entry, metrics);
        if !matches!(entry.slot, Slot::OutOfRange) {
            debug!(
                marker = %entry.id,
                distance_m = geodesic.distance_m,
                range_m = entry.marker.max_render_range_m,
                "Marker out of range"
            );
        }
        entry.slot = Slot::OutOfRange;
        metrics.marker_out_of_range();
        return Evaluation::OutOfRange;
    }

    let placement = entry.marker.placement;
    if placement == PlacementType::Static && !force && entry.node().is_some() {
        return Evaluation::Kept;
    }

    detach(host, entry, metrics);

    let plan = match placement {
        PlacementType::Static => plan_static(&geodesic, &entry.marker, ctx),
        PlacementType::Dynamic => plan_dynamic(&geodesic, &entry.marker, ctx),
    };

    match host.create_anchor(plan.pose) {
        Ok(anchor) => {
            host.attach_child(&anchor, entry.marker.renderable);
            metrics.anchor_created();
            match placement {
                PlacementType::Static => debug!(
                    marker = %entry.id,
                    distance_m = plan.distance_m,
                    position = %plan.pose.translation,
                    "Static anchor placed"
                ),
                PlacementType::Dynamic => trace!(
                    marker = %entry.id,
                    distance_m = plan.distance_m,
                    render_distance_m = plan.render_distance_m,
                    "Dynamic anchor placed"
                ),
            }
            entry.slot = Slot::Rendered(AnchorNode {
                anchor,
                placement,
                pinned_height: plan.pose.translation.y,
                enabled: true,
            });
            Evaluation::Placed
        }
        Err(e) => {
            warn!(marker = %entry.id, error = %e, "Anchor creation failed, retrying next tick");
            metrics.anchor_failed();
            Evaluation::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, RenderableId};
    use crate::marker::MarkerId;
    use glam::{Quat, Vec3};
    use std::f32::consts::FRAC_PI_2;

    const OBSERVER: GeoPoint = GeoPoint::new(48.0, 2.0);

    fn ctx(config: &SceneConfig, heading_deg: f32, camera_pose: Pose) -> PlacementContext<'_> {
        PlacementContext {
            observer: OBSERVER,
            heading_deg,
            camera_pose,
            display_height_offset: 0.0,
            config,
        }
    }

    fn north_of_observer(meters: f64) -> GeoPoint {
        crate::geodesy::destination(OBSERVER, 0.0, meters)
    }

    fn entry(marker: Marker) -> MarkerEntry<crate::host::HeadlessAnchor> {
        MarkerEntry::new(MarkerId::from_raw(1), marker)
    }

    fn approx(a: Vec3, b: Vec3, tol: f32) -> bool {
        (a - b).length() < tol
    }

    #[test]
    fn test_horizon_adjustment() {
        assert_eq!(horizon_adjustment(20.0, 20.0, 0.005, 500.0), 0.0);
        assert!((horizon_adjustment(130.0, 30.0, 0.005, 500.0) - 0.5).abs() < 1e-9);
        // Capped at 500 m
        assert!((horizon_adjustment(10_000.0, 30.0, 0.005, 500.0) - 2.35).abs() < 1e-9);
    }

    #[test]
    fn test_static_plan_straight_ahead() {
        let config = SceneConfig::default();
        let marker = Marker::new(north_of_observer(10.0), RenderableId(1)).with_height(2.0);
        let camera = Pose::from_translation(Vec3::new(0.0, 1.5, 0.0));
        let plan = plan(&marker, &ctx(&config, 0.0, camera));
        assert!(approx(plan.pose.translation, Vec3::new(0.0, 3.5, -10.0), 0.01));
        assert_eq!(plan.pose.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_static_plan_follows_camera_yaw() {
        let config = SceneConfig::default();
        let marker = Marker::new(north_of_observer(10.0), RenderableId(1));
        // Camera turned to face scene -X; compass says the camera faces north.
        let camera = Pose::new(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2));
        let plan = plan(&marker, &ctx(&config, 0.0, camera));
        assert!(approx(plan.pose.translation, Vec3::new(-10.0, 0.0, 0.0), 0.01));
    }

    #[test]
    fn test_static_plan_applies_bearing_adjustment() {
        let config = SceneConfig {
            bearing_adjustment_deg: 90.0,
            ..Default::default()
        };
        let marker = Marker::new(north_of_observer(10.0), RenderableId(1));
        let plan = plan(&marker, &ctx(&config, 0.0, Pose::IDENTITY));
        assert!(approx(plan.pose.translation, Vec3::new(10.0, 0.0, 0.0), 0.01));
    }

    #[test]
    fn test_dynamic_plan_clamps_and_rises() {
        let config = SceneConfig::default();
        let marker = Marker::new(north_of_observer(130.0), RenderableId(1))
            .with_placement(PlacementType::Dynamic)
            .with_height(1.0);
        let plan = plan(&marker, &ctx(&config, 0.0, Pose::IDENTITY));
        assert!((plan.render_distance_m - 30.0).abs() < 1e-9);
        assert!((plan.height_adjustment_m - 0.5).abs() < 0.01);
        assert!(approx(plan.pose.translation, Vec3::new(0.0, 1.5, -30.0), 0.02));
    }

    #[test]
    fn test_evaluate_places_then_keeps_static() {
        let config = SceneConfig::default();
        let metrics = SceneMetrics::new();
        let mut host = HeadlessHost::new();
        let mut entry = entry(Marker::new(north_of_observer(10.0), RenderableId(7)));
        let ctx = ctx(&config, 0.0, Pose::IDENTITY);

        assert_eq!(evaluate(&mut host, &mut entry, &ctx, false, &metrics), Evaluation::Placed);
        assert_eq!(evaluate(&mut host, &mut entry, &ctx, false, &metrics), Evaluation::Kept);
        assert_eq!(host.created_count(), 1);
        assert!(host.anchor_for(RenderableId(7)).is_some());

        assert_eq!(evaluate(&mut host, &mut entry, &ctx, true, &metrics), Evaluation::Placed);
        assert_eq!(host.created_count(), 2);
        assert_eq!(host.live_anchor_count(), 1);
    }

    #[test]
    fn test_evaluate_dynamic_always_reanchors() {
        let config = SceneConfig::default();
        let metrics = SceneMetrics::new();
        let mut host = HeadlessHost::new();
        let marker = Marker::new(north_of_observer(10.0), RenderableId(7))
            .with_placement(PlacementType::Dynamic);
        let mut entry = entry(marker);
        let ctx = ctx(&config, 0.0, Pose::IDENTITY);

        for _ in 0..3 {
            assert_eq!(evaluate(&mut host, &mut entry, &ctx, false, &metrics), Evaluation::Placed);
        }
        assert_eq!(host.created_count(), 3);
        assert_eq!(host.live_anchor_count(), 1);
    }

    #[test]
    fn test_evaluate_out_of_range_detaches() {
        let config = SceneConfig::default();
        let metrics = SceneMetrics::new();
        let mut host = HeadlessHost::new();
        let mut entry = entry(Marker::new(north_of_observer(10.0), RenderableId(7)));
        let ctx = ctx(&config, 0.0, Pose::IDENTITY);
        evaluate(&mut host, &mut entry, &ctx, false, &metrics);

        entry.marker.max_render_range_m = 5.0;
        assert_eq!(
            evaluate(&mut host, &mut entry, &ctx, false, &metrics),
            Evaluation::OutOfRange
        );
        assert_eq!(host.live_anchor_count(), 0);
        assert_eq!(metrics.snapshot().anchors_detached, 1);
    }

    #[test]
    fn test_evaluate_failure_leaves_pending() {
        let config = SceneConfig::default();
        let metrics = SceneMetrics::new();
        let mut host = HeadlessHost::new();
        host.fail_next_anchors(1);
        let mut entry = entry(Marker::new(north_of_observer(10.0), RenderableId(7)));
        let ctx = ctx(&config, 0.0, Pose::IDENTITY);

        assert!(matches!(
            evaluate(&mut host, &mut entry, &ctx, false, &metrics),
            Evaluation::Failed(_)
        ));
        assert!(entry.node().is_none());
        assert_eq!(evaluate(&mut host, &mut entry, &ctx, false, &metrics), Evaluation::Placed);
        assert_eq!(metrics.snapshot().anchor_failures, 1);
    }
}
