//! Polar-to-Cartesian projection of geodesics into camera-relative offsets.
//!
//! The projector is engine-agnostic: it produces a 2D offset where `x` is
//! lateral (positive = right of the observer's heading) and `y` is forward
//! (positive = ahead). Mapping onto a host's scene axes happens when an
//! anchor pose is composed (see [`CartesianOffset::to_scene`]).
//!
//! ```text
//!            y (ahead, azimuth 0°)
//!            ^
//!            |
//!            |
//!  ----------+----------> x (right, azimuth 90°)
//!         observer
//! ```

use glam::Vec3;

use crate::geodesy::{normalize_azimuth, GeodesicResult};

/// Camera-relative offset in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianOffset {
    /// Lateral offset, positive to the right.
    pub x: f64,
    /// Forward offset, positive ahead.
    pub y: f64,
}

impl CartesianOffset {
    /// Map into scene coordinates with the given vertical component.
    ///
    /// Scene space is right-handed with +Y up and the camera looking down
    /// -Z, so forward distance becomes negative Z.
    pub fn to_scene(&self, height: f32) -> Vec3 {
        Vec3::new(self.x as f32, height, -(self.y as f32))
    }

    /// Horizontal length of the offset.
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Convert a distance and a heading-relative azimuth into a Cartesian offset.
///
/// `relative_azimuth_deg` is `bearing_to_target - observer_heading`; it does
/// not need to be normalized.
#[inline]
pub fn project(distance_m: f64, relative_azimuth_deg: f32) -> CartesianOffset {
    // Rotating the polar frame by 90° puts azimuth 0 on the forward axis.
    let theta = (90.0 - f64::from(relative_azimuth_deg)).to_radians();
    CartesianOffset {
        x: distance_m * theta.cos(),
        y: distance_m * theta.sin(),
    }
}

/// Heading-relative azimuth of a target, wrapped into `[0, 360)`.
///
/// `adjustment_deg` is a calibration offset added on top of the raw
/// difference, for compasses that do not point at true north.
#[inline]
pub fn relative_azimuth(bearing_to_target_deg: f64, heading_deg: f32, adjustment_deg: f32) -> f32 {
    normalize_azimuth(bearing_to_target_deg - f64::from(heading_deg) + f64::from(adjustment_deg))
        as f32
}

/// Project a geodesic as seen by an observer facing `heading_deg`.
pub fn project_geodesic(
    geodesic: &GeodesicResult,
    heading_deg: f32,
    adjustment_deg: f32,
) -> CartesianOffset {
    project(
        geodesic.distance_m,
        relative_azimuth(geodesic.azimuth_deg, heading_deg, adjustment_deg),
    )
}
