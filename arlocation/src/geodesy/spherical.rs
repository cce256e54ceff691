//! Spherical-earth fallback (haversine distance, great-circle bearing).
//!
//! Kept for hosts that prefer the cheaper model. Not interchangeable with the
//! ellipsoidal calculator to sub-meter precision; select it scene-wide via
//! [`GeodesicModel::Spherical`](super::GeodesicModel::Spherical).

use super::{normalize_azimuth, GeoPoint, GeodesicResult};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance and initial great-circle bearing from `src` to `dst`.
pub fn geodesic(src: GeoPoint, dst: GeoPoint) -> GeodesicResult {
    GeodesicResult {
        distance_m: distance(src, dst),
        azimuth_deg: bearing(src, dst),
    }
}

/// Great-circle distance in meters.
pub fn distance(src: GeoPoint, dst: GeoPoint) -> f64 {
    let lat1 = src.latitude.to_radians();
    let lat2 = dst.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (dst.longitude - src.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial great-circle bearing in degrees, `[0, 360)`.
pub fn bearing(src: GeoPoint, dst: GeoPoint) -> f64 {
    let lat1 = src.latitude.to_radians();
    let lat2 = dst.latitude.to_radians();
    let d_lon = (dst.longitude - src.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    if x == 0.0 && y == 0.0 {
        return 0.0;
    }
    normalize_azimuth(y.atan2(x).to_degrees())
}

/// Destination along a great circle.
pub fn destination(start: GeoPoint, azimuth_deg: f64, distance_m: f64) -> GeoPoint {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = azimuth_deg.to_radians();
    let lat1 = start.latitude.to_radians();
    let lon1 = start.longitude.to_radians();

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    let lon2_deg = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    GeoPoint::new(lat2.to_degrees(), lon2_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!((bearing(origin, GeoPoint::new(1.0, 0.0)) - 0.0).abs() < 0.1);
        assert!((bearing(origin, GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 0.1);
        assert!((bearing(origin, GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 0.1);
        assert!((bearing(origin, GeoPoint::new(0.0, -1.0)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111_194.9).abs() < 1.0, "Got {}", d);
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = GeoPoint::new(48.3, 2.1);
        assert_eq!(distance(p, p), 0.0);
        assert_eq!(bearing(p, p), 0.0);
    }

    #[test]
    fn test_destination_roundtrip() {
        let start = GeoPoint::new(48.312442, 2.129019);
        let end = destination(start, 300.0, 5_000.0);
        let back = geodesic(start, end);
        assert!((back.distance_m - 5_000.0).abs() < 1e-6);
        assert!((back.azimuth_deg - 300.0).abs() < 1e-6);
    }
}
