//! Per-frame scale and rotation laws.
//!
//! All laws take the *real-world* distance to the marker (from the geodesic),
//! except [`ScalingMode::FixedSize`] which compensates the *scene* distance
//! between camera and node.

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::marker::{Marker, RotationMode, ScaleRange, ScalingMode};

/// Breakpoints of the gradual scale law.
///
/// Factor is `1.0` up to `min_distance_m`, `min_scale` from `max_distance_m`
/// on, and linear in between.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradualScaling {
    pub min_scale: f64,
    pub min_distance_m: f64,
    pub max_distance_m: f64,
}

impl Default for GradualScaling {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            min_distance_m: 5.0,
            max_distance_m: 100.0,
        }
    }
}

impl GradualScaling {
    /// Scale factor at `distance_m`.
    pub fn factor(&self, distance_m: f64) -> f64 {
        if distance_m <= self.min_distance_m {
            return 1.0;
        }
        if distance_m >= self.max_distance_m {
            return self.min_scale;
        }
        let span = self.max_distance_m - self.min_distance_m;
        let t = (distance_m - self.min_distance_m) / span;
        1.0 + t * (self.min_scale - 1.0)
    }
}

/// Gradual scale factor with the default breakpoints (5 m, 100 m, 0.2).
pub fn scale_factor_for_distance(distance_m: f64) -> f64 {
    GradualScaling::default().factor(distance_m)
}

/// Fixed-size factor attenuated over the render distance, floored at
/// `range.min_scale`.
///
/// A non-positive render distance yields `range.min_scale`.
pub fn gradual_fixed_size_factor(distance_m: f64, render_distance_m: f64, range: ScaleRange) -> f64 {
    let min = f64::from(range.min_scale);
    let max = f64::from(range.max_scale);
    if render_distance_m <= 0.0 {
        return min;
    }
    (max - (max - min) / render_distance_m * distance_m).max(min)
}

/// Factor that shrinks from `range.max_scale` at distance 0 to
/// `range.min_scale` at `max_render_distance_m`, multiplied by the render
/// distance so it also compensates perspective.
pub fn gradual_to_max_render_distance(
    distance_m: f64,
    render_distance_m: f64,
    max_render_distance_m: f64,
    range: ScaleRange,
) -> f64 {
    let min = f64::from(range.min_scale);
    let max = f64::from(range.max_scale);
    if max_render_distance_m <= 0.0 {
        return min * render_distance_m;
    }
    let clamped = distance_m.min(max_render_distance_m);
    let factor = min + (max_render_distance_m - clamped) * (max - min) / max_render_distance_m;
    factor * render_distance_m
}

/// Distances feeding [`resolve_scale`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleInputs {
    /// `camera - node` in scene space.
    pub direction: Vec3,
    /// Geodesic distance from observer to marker.
    pub real_distance_m: f64,
    /// Real distance capped at the scene's max render distance.
    pub render_distance_m: f64,
    pub max_render_distance_m: f64,
}

/// Scale for `marker` this frame. `None` leaves the host's scale alone.
pub fn resolve_scale(
    marker: &Marker,
    inputs: &ScaleInputs,
    gradual: &GradualScaling,
) -> SceneResult<Option<f32>> {
    let fixed_size = f64::from(inputs.direction.length());
    let scale = match marker.scaling {
        ScalingMode::Default => return Ok(None),
        ScalingMode::FixedSize => fixed_size,
        ScalingMode::Gradual => fixed_size * gradual.factor(inputs.real_distance_m),
        ScalingMode::Custom => {
            let f = marker
                .custom_scale
                .as_ref()
                .ok_or(SceneError::MissingCustomScale {
                    renderable: marker.renderable,
                })?;
            fixed_size * f(inputs.real_distance_m)
        }
        ScalingMode::GradualFixedSize => {
            fixed_size
                * gradual_fixed_size_factor(
                    inputs.real_distance_m,
                    inputs.render_distance_m,
                    marker.scale_range,
                )
        }
        ScalingMode::GradualToMaxRenderDistance => gradual_to_max_render_distance(
            inputs.real_distance_m,
            inputs.render_distance_m,
            inputs.max_render_distance_m,
            marker.scale_range,
        ),
    };
    Ok(Some(scale as f32 * marker.scale_modifier))
}

/// Rotation for `mode` given `direction = camera - node`.
pub fn resolve_rotation(mode: RotationMode, direction: Vec3) -> Option<Quat> {
    match mode {
        RotationMode::Default => None,
        RotationMode::FaceUser => face_user_rotation(direction),
    }
}

/// Billboard rotation turning a node's forward axis (-Z) along `direction`,
/// with world +Y as the reference up.
///
/// `None` when `direction` is zero or vertical.
pub fn face_user_rotation(direction: Vec3) -> Option<Quat> {
    let forward = direction.try_normalize()?;
    let right = forward.cross(Vec3::Y).try_normalize()?;
    let up = right.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::GeoPoint;
    use crate::host::RenderableId;

    fn marker(scaling: ScalingMode) -> Marker {
        Marker::new(GeoPoint::new(0.0, 0.0), RenderableId(1)).with_scaling(scaling)
    }

    fn inputs(direction_len: f32, real: f64) -> ScaleInputs {
        ScaleInputs {
            direction: Vec3::new(0.0, 0.0, direction_len),
            real_distance_m: real,
            render_distance_m: real.min(30.0),
            max_render_distance_m: 30.0,
        }
    }

    #[test]
    fn test_scale_factor_breakpoints() {
        assert_eq!(scale_factor_for_distance(0.0), 1.0);
        assert_eq!(scale_factor_for_distance(5.0), 1.0);
        assert_eq!(scale_factor_for_distance(100.0), 0.2);
        assert_eq!(scale_factor_for_distance(10_000.0), 0.2);
    }

    #[test]
    fn test_scale_factor_midpoint() {
        let f = scale_factor_for_distance(47.5);
        assert!((f - 0.7).abs() < 0.1, "Got {}", f);
        assert!((scale_factor_for_distance(52.5) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_default_scaling_leaves_host_scale() {
        let scale = resolve_scale(
            &marker(ScalingMode::Default),
            &inputs(4.0, 4.0),
            &GradualScaling::default(),
        )
        .unwrap();
        assert_eq!(scale, None);
    }

    #[test]
    fn test_fixed_size_is_scene_distance() {
        let scale = resolve_scale(
            &marker(ScalingMode::FixedSize),
            &inputs(4.0, 400.0),
            &GradualScaling::default(),
        )
        .unwrap();
        assert_eq!(scale, Some(4.0));
    }

    #[test]
    fn test_gradual_applies_factor() {
        let scale = resolve_scale(
            &marker(ScalingMode::Gradual),
            &inputs(10.0, 200.0),
            &GradualScaling::default(),
        )
        .unwrap()
        .unwrap();
        assert!((scale - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_custom_uses_function_and_modifier() {
        let m = marker(ScalingMode::Default)
            .with_custom_scale(|d| d / 100.0)
            .with_scale_modifier(2.0);
        let scale = resolve_scale(&m, &inputs(3.0, 50.0), &GradualScaling::default())
            .unwrap()
            .unwrap();
        assert!((scale - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_custom_without_function_fails() {
        let result = resolve_scale(
            &marker(ScalingMode::Custom),
            &inputs(3.0, 50.0),
            &GradualScaling::default(),
        );
        assert!(matches!(result, Err(SceneError::MissingCustomScale { .. })));
    }

    #[test]
    fn test_gradual_fixed_size_clamps_to_min() {
        let range = ScaleRange::default();
        assert!((gradual_fixed_size_factor(0.0, 30.0, range) - 1.4).abs() < 1e-6);
        assert!((gradual_fixed_size_factor(15.0, 30.0, range) - 1.1).abs() < 1e-6);
        assert!((gradual_fixed_size_factor(500.0, 30.0, range) - 0.8).abs() < 1e-6);
        assert!((gradual_fixed_size_factor(10.0, 0.0, range) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_gradual_to_max_render_distance() {
        let range = ScaleRange::default();
        // At the limit the factor bottoms out at min_scale.
        let at_limit = gradual_to_max_render_distance(30.0, 30.0, 30.0, range);
        assert!((at_limit - 0.8 * 30.0).abs() < 1e-5);
        let close = gradual_to_max_render_distance(0.0, 2.0, 30.0, range);
        assert!((close - 1.4 * 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_face_user_points_forward_at_camera() {
        let direction = Vec3::new(3.0, 0.0, 4.0);
        let rotation = face_user_rotation(direction).unwrap();
        let forward = rotation * Vec3::NEG_Z;
        assert!((forward - direction.normalize()).length() < 1e-5);
        let up = rotation * Vec3::Y;
        assert!((up - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_face_user_degenerate_directions() {
        assert!(face_user_rotation(Vec3::ZERO).is_none());
        assert!(face_user_rotation(Vec3::new(0.0, 2.0, 0.0)).is_none());
        assert!(resolve_rotation(RotationMode::Default, Vec3::X).is_none());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_scale_factor_non_increasing(a in 0.0f64..1_000.0, b in 0.0f64..1_000.0) {
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(scale_factor_for_distance(near) >= scale_factor_for_distance(far));
        }

        #[test]
        fn prop_scale_factor_bounded(d in 0.0f64..100_000.0) {
            let f = scale_factor_for_distance(d);
            prop_assert!((0.2..=1.0).contains(&f));
        }

        #[test]
        fn prop_face_user_is_unit(x in -50.0f32..50.0, z in -50.0f32..50.0, y in -5.0f32..5.0) {
            prop_assume!(x.abs() > 0.01 || z.abs() > 0.01);
            let rotation = face_user_rotation(Vec3::new(x, y, z)).unwrap();
            prop_assert!((rotation.length() - 1.0).abs() < 1e-4);
        }
    }
}
