//! Vincenty's inverse and direct formulae.
//!
//! Iterative solutions on an ellipsoid of revolution, accurate to well under
//! a millimeter for non-antipodal points.

use std::f64::consts::PI;

use super::{normalize_azimuth, Ellipsoid, GeoPoint, GeodesicResult};

/// Convergence tolerance on lambda / sigma (radians, ~0.006mm).
const TOLERANCE: f64 = 1e-12;

/// Iteration cap; antipodal inputs stop here instead of looping forever.
const MAX_ITERATIONS: usize = 200;

/// Trigonometric terms of the auxiliary sphere for one value of lambda.
#[derive(Debug, Clone, Copy)]
struct SphereTerms {
    sin_lambda: f64,
    cos_lambda: f64,
    sin_sigma: f64,
    cos_sigma: f64,
    sigma: f64,
    sin_alpha: f64,
    cos_sq_alpha: f64,
    cos_2sigma_m: f64,
}

fn sphere_terms(lambda: f64, sin_u1: f64, cos_u1: f64, sin_u2: f64, cos_u2: f64) -> SphereTerms {
    let (sin_lambda, cos_lambda) = lambda.sin_cos();

    let t1 = cos_u2 * sin_lambda;
    let t2 = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
    let sin_sigma = (t1 * t1 + t2 * t2).sqrt();
    let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
    let sigma = sin_sigma.atan2(cos_sigma);

    let sin_alpha = if sin_sigma == 0.0 {
        0.0
    } else {
        cos_u1 * cos_u2 * sin_lambda / sin_sigma
    };
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    // Equatorial line: cos_sq_alpha == 0
    let cos_2sigma_m = if cos_sq_alpha != 0.0 {
        cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
    } else {
        0.0
    };

    SphereTerms {
        sin_lambda,
        cos_lambda,
        sin_sigma,
        cos_sigma,
        sigma,
        sin_alpha,
        cos_sq_alpha,
        cos_2sigma_m,
    }
}

pub(super) fn inverse(ellipsoid: &Ellipsoid, src: GeoPoint, dst: GeoPoint) -> GeodesicResult {
    let a = ellipsoid.semi_major_axis;
    let b = ellipsoid.semi_minor_axis();
    let f = ellipsoid.flattening;

    let l = (dst.longitude - src.longitude).to_radians();
    let u1 = ((1.0 - f) * src.latitude.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * dst.latitude.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut t = sphere_terms(lambda, sin_u1, cos_u1, sin_u2, cos_u2);

    for _ in 0..MAX_ITERATIONS {
        if t.sin_sigma == 0.0 {
            break;
        }
        let c = f / 16.0 * t.cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * t.cos_sq_alpha));
        let next = l
            + (1.0 - c)
                * f
                * t.sin_alpha
                * (t.sigma
                    + c * t.sin_sigma
                        * (t.cos_2sigma_m
                            + c * t.cos_sigma * (-1.0 + 2.0 * t.cos_2sigma_m * t.cos_2sigma_m)));

        let converged = (next - lambda).abs() < TOLERANCE;
        lambda = next;
        // The distance must come from the final lambda, not the one before it.
        t = sphere_terms(lambda, sin_u1, cos_u1, sin_u2, cos_u2);
        if converged {
            break;
        }
    }

    if t.sin_sigma == 0.0 {
        return GeodesicResult {
            distance_m: 0.0,
            azimuth_deg: 0.0,
        };
    }

    let u_sq = t.cos_sq_alpha * (a * a - b * b) / (b * b);
    let (big_a, big_b) = series_coefficients(u_sq);
    let d_sigma = delta_sigma(big_b, t.sin_sigma, t.cos_sigma, t.cos_2sigma_m);

    let distance_m = (b * big_a * (t.sigma - d_sigma)).max(0.0);
    let azimuth = (cos_u2 * t.sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * t.cos_lambda);

    GeodesicResult {
        distance_m,
        azimuth_deg: normalize_azimuth(azimuth.to_degrees()),
    }
}

pub(super) fn direct(
    ellipsoid: &Ellipsoid,
    start: GeoPoint,
    azimuth_deg: f64,
    distance_m: f64,
) -> GeoPoint {
    let a = ellipsoid.semi_major_axis;
    let b = ellipsoid.semi_minor_axis();
    let f = ellipsoid.flattening;

    let (sin_alpha1, cos_alpha1) = azimuth_deg.to_radians().sin_cos();

    let tan_u1 = (1.0 - f) * start.latitude.to_radians().tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;

    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let (big_a, big_b) = series_coefficients(u_sq);

    let sigma_base = distance_m / (b * big_a);
    let mut sigma = sigma_base;
    for _ in 0..MAX_ITERATIONS {
        let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let previous = sigma;
        sigma = sigma_base + delta_sigma(big_b, sin_sigma, cos_sigma, cos_2sigma_m);
        if (sigma - previous).abs() < TOLERANCE {
            break;
        }
    }
    let (sin_sigma, cos_sigma) = sigma.sin_cos();
    let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();

    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let latitude = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
    let lambda =
        (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    let longitude = wrap_longitude(start.longitude.to_radians() + l);

    GeoPoint::new(latitude.to_degrees(), longitude.to_degrees())
}

/// Vincenty's `A` and `B` series coefficients for a given `u²`.
fn series_coefficients(u_sq: f64) -> (f64, f64) {
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    (big_a, big_b)
}

fn delta_sigma(big_b: f64, sin_sigma: f64, cos_sigma: f64, cos_2sigma_m: f64) -> f64 {
    let cos_2sigma_m_sq = cos_2sigma_m * cos_2sigma_m;
    big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m_sq)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m_sq)))
}

/// Wrap a longitude in radians into `[-π, π)`.
fn wrap_longitude(lon: f64) -> f64 {
    (lon + 3.0 * PI).rem_euclid(2.0 * PI) - PI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_equatorial_line() {
        // One degree of longitude along the equator is a/ (180/π) meters.
        let result = inverse(
            &Ellipsoid::WGS84,
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
        );
        let expected = Ellipsoid::WGS84.semi_major_axis * 1.0_f64.to_radians();
        assert!((result.distance_m - expected).abs() < 1e-3);
        assert!((result.azimuth_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_antipodal_terminates() {
        // Must return (any value) rather than spin.
        let result = inverse(
            &Ellipsoid::WGS84,
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.5, 179.7),
        );
        assert!(result.distance_m >= 0.0);
    }

    #[test]
    fn test_direct_north_along_meridian() {
        let end = direct(&Ellipsoid::WGS84, GeoPoint::new(52.0, 13.0), 0.0, 10_000.0);
        assert!((end.longitude - 13.0).abs() < 1e-9);
        assert!(end.latitude > 52.08 && end.latitude < 52.1);
    }

    #[test]
    fn test_inverse_short_distances_round_trip() {
        let start = GeoPoint::new(48.0, 2.0);
        for distance in [0.01, 0.5, 1.0, 5.0, 10.0] {
            let end = direct(&Ellipsoid::WGS84, start, 90.0, distance);
            let back = inverse(&Ellipsoid::WGS84, start, end);
            assert!(
                (back.distance_m - distance).abs() < 1e-6,
                "{} m came back as {} m",
                distance,
                back.distance_m
            );
        }
    }

    #[test]
    fn test_wrap_longitude() {
        assert!((wrap_longitude(0.0)).abs() < 1e-12);
        assert!((wrap_longitude(PI + 0.1) - (-PI + 0.1)).abs() < 1e-12);
        assert!((wrap_longitude(-PI - 0.1) - (PI - 0.1)).abs() < 1e-12);
    }
}
