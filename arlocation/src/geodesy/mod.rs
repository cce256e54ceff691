//! Geodetic calculations on WGS84 coordinates.
//!
//! Provides the distance and initial azimuth between two geographic points
//! (the inverse geodesic problem) and the point reached from a start position
//! along an azimuth (the direct problem).
//!
//! # Models
//!
//! - [`GeodesicModel::Ellipsoidal`] (default): Vincenty's formulae on the
//!   WGS84 ellipsoid. Sub-meter accurate at AR scales.
//! - [`GeodesicModel::Spherical`]: haversine distance and great-circle bearing
//!   on a sphere of mean Earth radius. Cheaper, but disagrees with the
//!   ellipsoid by up to ~0.5%.
//!
//! A scene picks one model and uses it for every calculation, so threshold
//! checks and placement never disagree with each other.
//!
//! # Example
//!
//! ```
//! use arlocation::geodesy::{geodesic, GeoPoint};
//!
//! let berlin = GeoPoint::new(52.511414, 13.507132);
//! let north = GeoPoint::new(54.799974, 13.507132);
//!
//! let curve = geodesic(berlin, north);
//! assert!(curve.azimuth_deg < 0.1 || curve.azimuth_deg > 359.9);
//! ```

mod ellipsoid;
pub mod spherical;
mod vincenty;

pub use ellipsoid::Ellipsoid;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in [-90, 90] and longitude in [-180, 180]. NaN fails.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// The geodesic from a source to a destination point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodesicResult {
    /// Distance along the surface in meters (always >= 0).
    pub distance_m: f64,
    /// Initial bearing from the source, degrees clockwise from true north,
    /// in `[0, 360)`.
    pub azimuth_deg: f64,
}

/// Earth model used for geodesic calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeodesicModel {
    /// WGS84 ellipsoid (Vincenty).
    #[default]
    Ellipsoidal,
    /// Sphere of mean Earth radius (haversine).
    Spherical,
}

impl GeodesicModel {
    /// Solve the inverse problem with this model.
    pub fn geodesic(self, src: GeoPoint, dst: GeoPoint) -> GeodesicResult {
        match self {
            GeodesicModel::Ellipsoidal => geodesic(src, dst),
            GeodesicModel::Spherical => spherical::geodesic(src, dst),
        }
    }

    /// Solve the direct problem with this model.
    pub fn destination(self, start: GeoPoint, azimuth_deg: f64, distance_m: f64) -> GeoPoint {
        match self {
            GeodesicModel::Ellipsoidal => destination(start, azimuth_deg, distance_m),
            GeodesicModel::Spherical => spherical::destination(start, azimuth_deg, distance_m),
        }
    }

    /// Lowercase name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeodesicModel::Ellipsoidal => "ellipsoidal",
            GeodesicModel::Spherical => "spherical",
        }
    }
}

impl fmt::Display for GeodesicModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GeodesicModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ellipsoidal" | "wgs84" | "vincenty" => Ok(GeodesicModel::Ellipsoidal),
            "spherical" | "haversine" => Ok(GeodesicModel::Spherical),
            other => Err(format!("unknown geodesic model '{}'", other)),
        }
    }
}

/// Distance and initial azimuth from `src` to `dst` on the WGS84 ellipsoid.
///
/// Coincident points yield a distance of 0 and an azimuth of 0. Nearly
/// antipodal points may fail to converge; the last iterate is returned.
#[inline]
pub fn geodesic(src: GeoPoint, dst: GeoPoint) -> GeodesicResult {
    vincenty::inverse(&Ellipsoid::WGS84, src, dst)
}

/// The point reached by travelling `distance_m` from `start` along the
/// initial bearing `azimuth_deg`, on the WGS84 ellipsoid.
#[inline]
pub fn destination(start: GeoPoint, azimuth_deg: f64, distance_m: f64) -> GeoPoint {
    vincenty::direct(&Ellipsoid::WGS84, start, azimuth_deg, distance_m)
}

/// Normalize an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_azimuth(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
