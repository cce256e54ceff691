//! Rigid transforms in host scene space.
//!
//! Scene space is right-handed, +Y up, and a pose with identity rotation
//! looks down -Z.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Translation plus rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// `self ∘ other`: apply `other` in this pose's local frame.
    pub fn compose(&self, other: &Pose) -> Pose {
        Pose {
            translation: self.translate_point(other.translation),
            rotation: (self.rotation * other.rotation).normalize(),
        }
    }

    /// Map a point from this pose's local frame into world space.
    pub fn translate_point(&self, local: Vec3) -> Vec3 {
        self.translation + self.rotation * local
    }

    /// Same translation, rotation dropped.
    pub fn translation_only(&self) -> Pose {
        Pose::from_translation(self.translation)
    }

    /// Same translation, rotation reduced to its heading about +Y.
    ///
    /// Pitch and roll of a handheld camera must not tilt ground-level
    /// offsets into or out of the floor.
    pub fn yaw_only(&self) -> Pose {
        let (yaw, _, _) = self.rotation.to_euler(EulerRot::YXZ);
        Pose {
            translation: self.translation,
            rotation: Quat::from_rotation_y(yaw),
        }
    }

    /// Viewing direction.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Unit vector to the camera's left.
    pub fn left(&self) -> Vec3 {
        self.rotation * Vec3::NEG_X
    }
}

/// Half-line used for hit tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Ray from `origin` through `target`. `None` when the two coincide.
    pub fn through(origin: Vec3, target: Vec3) -> Option<Ray> {
        (target - origin)
            .try_normalize()
            .map(|direction| Ray { origin, direction })
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_compose_applies_local_offset_in_rotated_frame() {
        // Camera turned 90° left (facing -X).
        let camera = Pose::new(Vec3::new(1.0, 1.5, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let offset = Pose::from_translation(Vec3::new(0.0, 0.0, -2.0));
        let world = camera.compose(&offset).translation_only();
        assert!(approx(world.translation, Vec3::new(-1.0, 1.5, 0.0)));
        assert_eq!(world.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_yaw_only_drops_pitch() {
        let pitched = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.4);
        let pose = Pose::new(Vec3::ZERO, pitched).yaw_only();
        let forward = pose.forward();
        assert!(forward.y.abs() < 1e-5);
        let expected = Quat::from_rotation_y(0.7) * Vec3::NEG_Z;
        assert!(approx(forward, expected));
    }

    #[test]
    fn test_left_of_identity() {
        assert!(approx(Pose::IDENTITY.left(), Vec3::NEG_X));
        assert!(approx(Pose::IDENTITY.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn test_ray_through() {
        let ray = Ray::through(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0)).unwrap();
        assert!(approx(ray.at(2.0), Vec3::new(0.0, 0.0, -2.0)));
        assert!(Ray::through(Vec3::ONE, Vec3::ONE).is_none());
    }
}
