//! Geo-positioned markers and their rendering options.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::geodesy::GeoPoint;
use crate::host::RenderableId;

/// Scene-assigned marker identifier. Stable for the marker's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(u64);

impl MarkerId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a marker's anchor is placed in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementType {
    /// Anchored once at the true projected distance, then left alone.
    #[default]
    Static,
    /// Re-anchored near the user, clamped to the render distance.
    Dynamic,
}

/// Per-frame scaling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    /// Leave the node's scale untouched.
    #[default]
    Default,
    /// Constant on-screen size: scale grows with scene distance.
    FixedSize,
    /// Shrink linearly with real distance.
    Gradual,
    /// Caller-supplied function of real distance.
    Custom,
    /// Fixed size attenuated by real distance over the render distance.
    GradualFixedSize,
    /// Shrink towards the maximum render distance.
    GradualToMaxRenderDistance,
}

impl ScalingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalingMode::Default => "default",
            ScalingMode::FixedSize => "fixed_size",
            ScalingMode::Gradual => "gradual",
            ScalingMode::Custom => "custom",
            ScalingMode::GradualFixedSize => "gradual_fixed_size",
            ScalingMode::GradualToMaxRenderDistance => "gradual_to_max_render_distance",
        }
    }
}

impl fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "default" | "none" => Ok(ScalingMode::Default),
            "fixed_size" | "fixed" => Ok(ScalingMode::FixedSize),
            "gradual" => Ok(ScalingMode::Gradual),
            "custom" => Ok(ScalingMode::Custom),
            "gradual_fixed_size" => Ok(ScalingMode::GradualFixedSize),
            "gradual_to_max_render_distance" => Ok(ScalingMode::GradualToMaxRenderDistance),
            _ => Err(format!(
                "Unknown scaling mode '{}'. Valid: default, fixed_size, gradual, custom, \
                 gradual_fixed_size, gradual_to_max_render_distance",
                s
            )),
        }
    }
}

/// Per-frame rotation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Leave the node's rotation untouched.
    #[default]
    Default,
    /// Turn the node to face the camera.
    FaceUser,
}

/// Caller-supplied scale as a function of real distance in meters.
pub type CustomScaleFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Clamp range used by [`ScalingMode::GradualFixedSize`] and
/// [`ScalingMode::GradualToMaxRenderDistance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleRange {
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            min_scale: 0.8,
            max_scale: 1.4,
        }
    }
}

/// A renderable pinned to a geographic position.
///
/// Built with [`Marker::new`] and the `with_*` methods, then handed to
/// [`LocationScene::add_marker`](crate::scene::LocationScene::add_marker).
#[derive(Clone)]
pub struct Marker {
    pub position: GeoPoint,
    pub renderable: RenderableId,
    /// Meters above the camera plane.
    pub height_m: f32,
    /// Real-world distance beyond which the marker is not rendered.
    pub max_render_range_m: f64,
    pub placement: PlacementType,
    pub scaling: ScalingMode,
    pub rotation: RotationMode,
    pub custom_scale: Option<CustomScaleFn>,
    /// Multiplier applied on top of the resolved scale.
    pub scale_modifier: f32,
    pub scale_range: ScaleRange,
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Marker")
            .field("position", &self.position)
            .field("renderable", &self.renderable)
            .field("height_m", &self.height_m)
            .field("max_render_range_m", &self.max_render_range_m)
            .field("placement", &self.placement)
            .field("scaling", &self.scaling)
            .field("rotation", &self.rotation)
            .field("custom_scale", &self.custom_scale.as_ref().map(|_| "<fn>"))
            .field("scale_modifier", &self.scale_modifier)
            .field("scale_range", &self.scale_range)
            .finish()
    }
}

impl Marker {
    pub fn new(position: GeoPoint, renderable: RenderableId) -> Self {
        Self {
            position,
            renderable,
            height_m: 0.0,
            max_render_range_m: f64::INFINITY,
            placement: PlacementType::default(),
            scaling: ScalingMode::default(),
            rotation: RotationMode::default(),
            custom_scale: None,
            scale_modifier: 1.0,
            scale_range: ScaleRange::default(),
        }
    }

    pub fn with_height(mut self, height_m: f32) -> Self {
        self.height_m = height_m;
        self
    }

    pub fn with_max_render_range(mut self, range_m: f64) -> Self {
        self.max_render_range_m = range_m;
        self
    }

    pub fn with_placement(mut self, placement: PlacementType) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingMode) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationMode) -> Self {
        self.rotation = rotation;
        self
    }

    /// Use `f(real_distance_m)` as the scale. Also selects [`ScalingMode::Custom`].
    pub fn with_custom_scale<F>(mut self, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        self.custom_scale = Some(Arc::new(f));
        self.scaling = ScalingMode::Custom;
        self
    }

    pub fn with_scale_modifier(mut self, modifier: f32) -> Self {
        self.scale_modifier = modifier;
        self
    }

    pub fn with_scale_range(mut self, min_scale: f32, max_scale: f32) -> Self {
        self.scale_range = ScaleRange {
            min_scale,
            max_scale,
        };
        self
    }

    /// Whether the marker is in range at `distance_m`. The range is inclusive.
    pub fn in_range(&self, distance_m: f64) -> bool {
        distance_m <= self.max_render_range_m
    }

    /// Reject configurations that can never render correctly.
    pub fn validate(&self) -> SceneResult<()> {
        if !self.position.is_valid() {
            return Err(SceneError::InvalidPosition(self.position));
        }
        if self.scaling == ScalingMode::Custom && self.custom_scale.is_none() {
            return Err(SceneError::MissingCustomScale {
                renderable: self.renderable,
            });
        }
        if !self.height_m.is_finite() {
            return Err(SceneError::InvalidMarker {
                field: "height_m",
                reason: format!("must be finite, got {}", self.height_m),
            });
        }
        if self.max_render_range_m.is_nan() || self.max_render_range_m < 0.0 {
            return Err(SceneError::InvalidMarker {
                field: "max_render_range_m",
                reason: format!("must be non-negative, got {}", self.max_render_range_m),
            });
        }
        if !self.scale_modifier.is_finite() {
            return Err(SceneError::InvalidMarker {
                field: "scale_modifier",
                reason: format!("must be finite, got {}", self.scale_modifier),
            });
        }
        Ok(())
    }
}
