//! Scene configuration.
//!
//! Settings are plain structs with `Default`s matching field-tested values.
//! They can be loaded from and saved to an INI file; keys are addressable as
//! `section.key` for the CLI.
//!
//! # Example Configuration (INI)
//!
//! ```ini
//! [scene]
//! location_update_threshold_m = 5
//! max_render_distance_m = 30
//! refresh_interval_ms = 5000
//! bearing_adjustment_deg = 0
//! geodesic_model = ellipsoidal
//! minimal_refreshing = false
//! reanchor_dynamic_every_frame = true
//! horizon_rise_per_m = 0.005
//! horizon_cap_m = 500
//!
//! [scaling]
//! min_scale = 0.2
//! min_distance_m = 5
//! max_distance_m = 100
//!
//! [overlap]
//! offset_overlapping = false
//! remove_overlapping = false
//! raise_step_m = 1.2
//! ```

mod file;
mod keys;

pub use file::{config_file_path, ConfigError, ConfigResult};
pub use keys::ConfigKey;

use std::time::Duration;

use crate::geodesy::GeodesicModel;
use crate::scaling::GradualScaling;

/// Everything that tunes a [`LocationScene`](crate::scene::LocationScene).
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    /// Observer movement (meters) that triggers a refresh.
    pub location_update_threshold_m: f64,

    /// Distance dynamic markers are clamped to in scene space.
    ///
    /// Also the breakpoint for the render-distance based scaling modes.
    pub max_render_distance_m: f64,

    /// Safety-net refresh interval. `None` disables the timer.
    pub refresh_interval: Option<Duration>,

    /// Compass calibration offset added to every relative azimuth.
    pub bearing_adjustment_deg: f32,

    /// Geodesic model used for every distance and bearing in the scene.
    pub geodesic_model: GeodesicModel,

    /// Resolve scale and rotation only when a marker is (re)anchored rather
    /// than every frame.
    pub minimal_refreshing: bool,

    /// Re-anchor dynamic markers on every tracked frame, not only on
    /// scheduled refreshes.
    pub reanchor_dynamic_every_frame: bool,

    /// Upward offset per meter of clamped distance for dynamic markers.
    pub horizon_rise_per_m: f64,

    /// Real distance beyond which the horizon offset stops growing.
    pub horizon_cap_m: f64,

    /// Gradual scaling breakpoints.
    pub scaling: GradualScaling,

    /// Overlap handling.
    pub overlap: OverlapConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            location_update_threshold_m: 5.0,
            max_render_distance_m: 30.0,
            refresh_interval: Some(Duration::from_secs(5)),
            bearing_adjustment_deg: 0.0,
            geodesic_model: GeodesicModel::default(),
            minimal_refreshing: false,
            reanchor_dynamic_every_frame: true,
            horizon_rise_per_m: 0.005,
            horizon_cap_m: 500.0,
            scaling: GradualScaling::default(),
            overlap: OverlapConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        fn non_negative(key: &str, value: f64) -> ConfigResult<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    reason: "must be a non-negative number".to_string(),
                })
            }
        }

        non_negative(
            "scene.location_update_threshold_m",
            self.location_update_threshold_m,
        )?;
        non_negative("scene.max_render_distance_m", self.max_render_distance_m)?;
        non_negative("scene.horizon_rise_per_m", self.horizon_rise_per_m)?;
        non_negative("scene.horizon_cap_m", self.horizon_cap_m)?;
        non_negative("scaling.min_scale", self.scaling.min_scale)?;
        non_negative("scaling.min_distance_m", self.scaling.min_distance_m)?;
        non_negative("overlap.raise_step_m", f64::from(self.overlap.raise_step_m))?;

        if self.scaling.max_distance_m <= self.scaling.min_distance_m {
            return Err(ConfigError::InvalidValue {
                key: "scaling.max_distance_m".to_string(),
                value: self.scaling.max_distance_m.to_string(),
                reason: format!(
                    "must be greater than scaling.min_distance_m ({})",
                    self.scaling.min_distance_m
                ),
            });
        }
        if !self.bearing_adjustment_deg.is_finite() {
            return Err(ConfigError::InvalidValue {
                key: "scene.bearing_adjustment_deg".to_string(),
                value: self.bearing_adjustment_deg.to_string(),
                reason: "must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// How markers that visually collide are handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapConfig {
    /// Raise a node by `raise_step_m` on every frame it overlaps another.
    pub offset_overlapping: bool,

    /// Hide nodes hidden behind a nearer marker.
    pub remove_overlapping: bool,

    pub raise_step_m: f32,

    /// Angular spread of the side rays used for occlusion, in radians.
    pub side_ray_angle_rad: f32,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            offset_overlapping: false,
            remove_overlapping: false,
            raise_step_m: 1.2,
            // 12°
            side_ray_angle_rad: std::f32::consts::PI / 15.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SceneConfig::default();
        assert_eq!(config.location_update_threshold_m, 5.0);
        assert_eq!(config.max_render_distance_m, 30.0);
        assert_eq!(config.refresh_interval, Some(Duration::from_secs(5)));
        assert_eq!(config.geodesic_model, GeodesicModel::Ellipsoidal);
        assert!(config.reanchor_dynamic_every_frame);
        assert!(!config.minimal_refreshing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let config = SceneConfig {
            location_update_threshold_m: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "scene.location_update_threshold_m"
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_breakpoints() {
        let mut config = SceneConfig::default();
        config.scaling.max_distance_m = 3.0;
        assert!(config.validate().is_err());
    }
}
