use crate::{angle::normalize_deg, constants::MEAN_EARTH_RADIUS, GeoPoint};

/// Initial great-circle bearing from `a` to `b`, in `[0, 360)`
/// degrees clockwise from true north.
///
/// Returns `None` if either point has a non-finite coordinate.
pub fn bearing_deg(a: &GeoPoint, b: &GeoPoint) -> Option<f64> {
    if !(a.lat_deg.is_finite()
        && a.lon_deg.is_finite()
        && b.lat_deg.is_finite()
        && b.lon_deg.is_finite())
    {
        return None;
    }

    let phi1 = a.lat_deg.to_radians();
    let phi2 = b.lat_deg.to_radians();
    let d_lambda = (b.lon_deg - a.lon_deg).to_radians();

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let (sin_phi2, cos_phi2) = phi2.sin_cos();
    let (sin_dl, cos_dl) = d_lambda.sin_cos();

    let y = sin_dl * cos_phi2;
    let x = cos_phi1 * sin_phi2 - sin_phi1 * cos_phi2 * cos_dl;

    Some(normalize_deg(y.atan2(x).to_degrees()))
}

/// Haversine great-circle distance from `a` to `b` in meters.
///
/// Altitude is ignored.
pub fn distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    central_angle(a, b) * MEAN_EARTH_RADIUS
}

/// Central angle between `a` and `b` in radians.
pub(crate) fn central_angle(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let phi1 = a.lat_deg.to_radians();
    let phi2 = b.lat_deg.to_radians();
    let half_d_phi = (b.lat_deg - a.lat_deg).to_radians() / 2.0;
    let half_d_lambda = (b.lon_deg - a.lon_deg).to_radians() / 2.0;

    let h = half_d_phi.sin().powi(2) + phi1.cos() * phi2.cos() * half_d_lambda.sin().powi(2);
    // Rounding can push `h` a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::{bearing_deg, distance_m};
    use crate::GeoPoint;
    use approx::assert_relative_eq;
    use geo::{HaversineDistance, Point};

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    const SAMPLES: [(f64, f64); 6] = [
        (0.0, 0.0),
        (44.2705, -71.30325),
        (-33.8688, 151.2093),
        (51.4779, -0.0015),
        (64.1466, -21.9426),
        (-54.8019, -68.303),
    ];

    #[test]
    fn test_due_east_on_equator() {
        let a = pt(0.0, 0.0);
        let b = pt(0.0, 0.1);
        assert_relative_eq!(bearing_deg(&a, &b).unwrap(), 90.0, epsilon = 1e-9);
        assert_relative_eq!(distance_m(&a, &b), 11_119.49, epsilon = 0.01);
    }

    #[test]
    fn test_bearing_rejects_nan() {
        let a = GeoPoint {
            lat_deg: f64::NAN,
            lon_deg: 0.0,
            alt_m: None,
        };
        assert!(bearing_deg(&a, &pt(1.0, 1.0)).is_none());
    }

    #[test]
    fn test_distance_zero_and_symmetric() {
        for &(lat1, lon1) in &SAMPLES {
            let a = pt(lat1, lon1);
            assert_eq!(distance_m(&a, &a), 0.0);
            for &(lat2, lon2) in &SAMPLES {
                let b = pt(lat2, lon2);
                assert_relative_eq!(distance_m(&a, &b), distance_m(&b, &a), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_reciprocal_bearings() {
        // Meridians converge by about `d_lon * sin(lat)` over a path, so
        // the reverse bearing strays from 180° by at most `d_lon`.
        let d = 0.05;
        for &(lat, lon) in &SAMPLES {
            let a = pt(lat, lon);
            let b = pt(lat + d, lon + d);
            let fwd = bearing_deg(&a, &b).unwrap();
            let rev = bearing_deg(&b, &a).unwrap();
            let diff = crate::heading_diff_deg(rev, fwd).abs();
            assert_relative_eq!(diff, 180.0, epsilon = d);
        }
    }

    #[test]
    fn test_reciprocal_bearings_follow_clairaut() {
        // On any great circle `sin(azimuth) * cos(lat)` is constant, and
        // the reverse bearing is the final bearing turned around.
        for &(lat1, lon1) in &SAMPLES {
            for &(lat2, lon2) in &SAMPLES {
                if (lat1, lon1) == (lat2, lon2) {
                    continue;
                }
                let (a, b) = (pt(lat1, lon1), pt(lat2, lon2));
                let fwd = bearing_deg(&a, &b).unwrap().to_radians();
                let rev = bearing_deg(&b, &a).unwrap().to_radians();
                assert_relative_eq!(
                    fwd.sin() * lat1.to_radians().cos(),
                    -rev.sin() * lat2.to_radians().cos(),
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_matches_geo_crate() {
        let a = pt(44.2705, -71.30325);
        let b = pt(-33.8688, 151.2093);
        let expected = Point::from(a).haversine_distance(&Point::from(b));
        // geo uses a slightly different mean radius.
        assert_relative_eq!(distance_m(&a, &b), expected, max_relative = 1e-4);
    }
}
