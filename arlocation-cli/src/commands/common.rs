//! Argument parsing shared across CLI commands.

use arlocation::geodesy::{GeoPoint, GeodesicModel};
use clap::ValueEnum;

/// Geodesic model selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ModelArg {
    /// Vincenty on the WGS84 ellipsoid
    #[default]
    Ellipsoidal,
    /// Haversine on a sphere
    Spherical,
}

impl From<ModelArg> for GeodesicModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Ellipsoidal => GeodesicModel::Ellipsoidal,
            ModelArg::Spherical => GeodesicModel::Spherical,
        }
    }
}

/// Parse `LAT,LON` in decimal degrees.
pub fn parse_geo_point(s: &str) -> Result<GeoPoint, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("Expected LAT,LON but got '{}'", s))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("Invalid latitude '{}'", lat.trim()))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("Invalid longitude '{}'", lon.trim()))?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("Latitude {} out of range [-90, 90]", latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("Longitude {} out of range [-180, 180]", longitude));
    }
    Ok(GeoPoint::new(latitude, longitude))
}
