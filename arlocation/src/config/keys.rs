//! `section.key` addressing for configuration values.

use std::fmt;
use std::str::FromStr;

use super::file::{parse_interval, parse_value, ConfigError, ConfigResult};
use super::SceneConfig;

/// A single configuration value addressable as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    LocationUpdateThreshold,
    MaxRenderDistance,
    RefreshInterval,
    BearingAdjustment,
    GeodesicModel,
    MinimalRefreshing,
    ReanchorDynamicEveryFrame,
    HorizonRisePerMeter,
    HorizonCap,
    ScalingMinScale,
    ScalingMinDistance,
    ScalingMaxDistance,
    OverlapOffset,
    OverlapRemove,
    OverlapRaiseStep,
}

impl ConfigKey {
    /// Every key, in file order.
    pub const ALL: [ConfigKey; 15] = [
        ConfigKey::LocationUpdateThreshold,
        ConfigKey::MaxRenderDistance,
        ConfigKey::RefreshInterval,
        ConfigKey::BearingAdjustment,
        ConfigKey::GeodesicModel,
        ConfigKey::MinimalRefreshing,
        ConfigKey::ReanchorDynamicEveryFrame,
        ConfigKey::HorizonRisePerMeter,
        ConfigKey::HorizonCap,
        ConfigKey::ScalingMinScale,
        ConfigKey::ScalingMinDistance,
        ConfigKey::ScalingMaxDistance,
        ConfigKey::OverlapOffset,
        ConfigKey::OverlapRemove,
        ConfigKey::OverlapRaiseStep,
    ];

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::ScalingMinScale
            | ConfigKey::ScalingMinDistance
            | ConfigKey::ScalingMaxDistance => "scaling",
            ConfigKey::OverlapOffset | ConfigKey::OverlapRemove | ConfigKey::OverlapRaiseStep => {
                "overlap"
            }
            _ => "scene",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::LocationUpdateThreshold => "location_update_threshold_m",
            ConfigKey::MaxRenderDistance => "max_render_distance_m",
            ConfigKey::RefreshInterval => "refresh_interval_ms",
            ConfigKey::BearingAdjustment => "bearing_adjustment_deg",
            ConfigKey::GeodesicModel => "geodesic_model",
            ConfigKey::MinimalRefreshing => "minimal_refreshing",
            ConfigKey::ReanchorDynamicEveryFrame => "reanchor_dynamic_every_frame",
            ConfigKey::HorizonRisePerMeter => "horizon_rise_per_m",
            ConfigKey::HorizonCap => "horizon_cap_m",
            ConfigKey::ScalingMinScale => "min_scale",
            ConfigKey::ScalingMinDistance => "min_distance_m",
            ConfigKey::ScalingMaxDistance => "max_distance_m",
            ConfigKey::OverlapOffset => "offset_overlapping",
            ConfigKey::OverlapRemove => "remove_overlapping",
            ConfigKey::OverlapRaiseStep => "raise_step_m",
        }
    }

    /// Current value rendered as text.
    pub fn get(&self, config: &SceneConfig) -> String {
        match self {
            ConfigKey::LocationUpdateThreshold => config.location_update_threshold_m.to_string(),
            ConfigKey::MaxRenderDistance => config.max_render_distance_m.to_string(),
            ConfigKey::RefreshInterval => config
                .refresh_interval
                .map(|d| d.as_millis())
                .unwrap_or(0)
                .to_string(),
            ConfigKey::BearingAdjustment => config.bearing_adjustment_deg.to_string(),
            ConfigKey::GeodesicModel => config.geodesic_model.as_str().to_string(),
            ConfigKey::MinimalRefreshing => config.minimal_refreshing.to_string(),
            ConfigKey::ReanchorDynamicEveryFrame => config.reanchor_dynamic_every_frame.to_string(),
            ConfigKey::HorizonRisePerMeter => config.horizon_rise_per_m.to_string(),
            ConfigKey::HorizonCap => config.horizon_cap_m.to_string(),
            ConfigKey::ScalingMinScale => config.scaling.min_scale.to_string(),
            ConfigKey::ScalingMinDistance => config.scaling.min_distance_m.to_string(),
            ConfigKey::ScalingMaxDistance => config.scaling.max_distance_m.to_string(),
            ConfigKey::OverlapOffset => config.overlap.offset_overlapping.to_string(),
            ConfigKey::OverlapRemove => config.overlap.remove_overlapping.to_string(),
            ConfigKey::OverlapRaiseStep => config.overlap.raise_step_m.to_string(),
        }
    }

    /// Parse `value` and store it. Does not run cross-field validation.
    pub fn set(&self, config: &mut SceneConfig, value: &str) -> ConfigResult<()> {
        match self {
            ConfigKey::LocationUpdateThreshold => {
                config.location_update_threshold_m = parse_value(self, value)?
            }
            ConfigKey::MaxRenderDistance => config.max_render_distance_m = parse_value(self, value)?,
            ConfigKey::RefreshInterval => config.refresh_interval = parse_interval(self, value)?,
            ConfigKey::BearingAdjustment => config.bearing_adjustment_deg = parse_value(self, value)?,
            ConfigKey::GeodesicModel => {
                config.geodesic_model =
                    value
                        .trim()
                        .parse()
                        .map_err(|reason| ConfigError::InvalidValue {
                            key: self.to_string(),
                            value: value.to_string(),
                            reason,
                        })?
            }
            ConfigKey::MinimalRefreshing => config.minimal_refreshing = parse_value(self, value)?,
            ConfigKey::ReanchorDynamicEveryFrame => {
                config.reanchor_dynamic_every_frame = parse_value(self, value)?
            }
            ConfigKey::HorizonRisePerMeter => config.horizon_rise_per_m = parse_value(self, value)?,
            ConfigKey::HorizonCap => config.horizon_cap_m = parse_value(self, value)?,
            ConfigKey::ScalingMinScale => config.scaling.min_scale = parse_value(self, value)?,
            ConfigKey::ScalingMinDistance => {
                config.scaling.min_distance_m = parse_value(self, value)?
            }
            ConfigKey::ScalingMaxDistance => {
                config.scaling.max_distance_m = parse_value(self, value)?
            }
            ConfigKey::OverlapOffset => config.overlap.offset_overlapping = parse_value(self, value)?,
            ConfigKey::OverlapRemove => config.overlap.remove_overlapping = parse_value(self, value)?,
            ConfigKey::OverlapRaiseStep => config.overlap.raise_step_m = parse_value(self, value)?,
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.to_string() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
