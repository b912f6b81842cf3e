//! Vincenty's inverse solution on the WGS-84 ellipsoid.

use crate::{
    constants::{WGS84_A, WGS84_B, WGS84_F},
    haversine::distance_m,
    GeoPoint,
};

/// Iteration cap before giving up on convergence.
const MAX_ITERATIONS: usize = 200;

/// Convergence threshold on lambda (radians), roughly 0.06 mm.
const CONVERGENCE: f64 = 1e-12;

/// Ellipsoidal distance from `a` to `b` in meters.
///
/// Returns `None` when the iteration fails to converge within
/// 200 rounds (nearly antipodal points) or produces a non-finite
/// intermediate.
#[allow(clippy::many_single_char_names, clippy::similar_names)]
pub fn vincenty_distance_m(a: &GeoPoint, b: &GeoPoint) -> Option<f64> {
    let f = WGS84_F;
    let l = (b.lon_deg - a.lon_deg).to_radians();
    let u1 = ((1.0 - f) * a.lat_deg.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * b.lat_deg.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    for _ in 0..MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // Coincident points.
            return Some(0.0);
        }
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos_sq_alpha == 0.
        let cos_2sigma_m = if cos_sq_alpha == 0.0 {
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));

        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));
        if !lambda.is_finite() {
            return None;
        }

        if (lambda - lambda_prev).abs() < CONVERGENCE {
            let u_sq = cos_sq_alpha * (WGS84_A.powi(2) - WGS84_B.powi(2)) / WGS84_B.powi(2);
            let big_a =
                1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
            let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
            let delta_sigma = big_b
                * sin_sigma
                * (cos_2sigma_m
                    + big_b / 4.0
                        * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                            - big_b / 6.0
                                * cos_2sigma_m
                                * (-3.0 + 4.0 * sin_sigma.powi(2))
                                * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));
            let s = WGS84_B * big_a * (sigma - delta_sigma);
            return s.is_finite().then_some(s);
        }
    }
    None
}

/// Ellipsoidal distance from `a` to `b` in meters, falling back to the
/// haversine distance when the ellipsoidal solution diverges.
pub fn precise_distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    vincenty_distance_m(a, b).unwrap_or_else(|| distance_m(a, b))
}
