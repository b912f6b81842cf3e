//! Steering solutions from an observer pose to a target.

use crate::pose::ObserverPose;
use geodesy::{bearing_deg, distance_m, heading_diff_deg, GeoPoint, MEAN_EARTH_RADIUS};
use serde::Serialize;

/// Floor on horizontal distance when computing pitch, so that a
/// target directly overhead resolves to ±90° instead of NaN.
const MIN_HORIZONTAL_M: f64 = 1e-3;

/// How to point at a target.
///
/// Every field other than `valid` is `None` when its inputs are
/// missing. A zero is always a real zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SteeringSolution {
    /// Both observer and target positions were known.
    pub valid: bool,

    /// Initial great-circle bearing to the target.
    pub bearing_deg: Option<f64>,

    pub horizontal_distance_m: Option<f64>,

    /// Target altitude minus observer altitude.
    pub vertical_delta_m: Option<f64>,

    /// Straight-line pitch to the target, positive up.
    pub required_pitch_deg: Option<f64>,

    /// Pitch to the target over a refracted, curved earth. Only set
    /// when the solver has a k-factor.
    pub refracted_pitch_deg: Option<f64>,

    /// Slant range to the target.
    pub line_of_sight_distance_m: Option<f64>,

    /// Positive means turn right.
    pub heading_error_deg: Option<f64>,

    /// Positive means tilt up.
    pub pitch_error_deg: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Solver {
    /// Effective earth radius multiplier.
    k_factor: Option<f64>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also report pitch corrected for earth curvature and refraction.
    #[must_use]
    pub fn with_k_factor(mut self, k_factor: f64) -> Self {
        self.k_factor = (k_factor.is_finite() && k_factor > 0.0).then_some(k_factor);
        self
    }

    pub fn solve(&self, observer: &ObserverPose, target: Option<&GeoPoint>) -> SteeringSolution {
        let (Some(from), Some(to)) = (observer.position.as_ref(), target) else {
            return SteeringSolution::default();
        };
        let Some(bearing) = bearing_deg(from, to) else {
            return SteeringSolution::default();
        };
        let horizontal = distance_m(from, to);

        let mut solution = SteeringSolution {
            valid: true,
            bearing_deg: Some(bearing),
            horizontal_distance_m: Some(horizontal),
            ..Default::default()
        };

        let finite_alt = |p: &GeoPoint| p.alt_m.filter(|a| a.is_finite());
        if let (Some(from_alt), Some(to_alt)) = (finite_alt(from), finite_alt(to)) {
            let dz = to_alt - from_alt;
            let run = horizontal.max(MIN_HORIZONTAL_M);
            solution.vertical_delta_m = Some(dz);
            solution.required_pitch_deg = Some(dz.atan2(run).to_degrees());
            solution.line_of_sight_distance_m = Some(horizontal.hypot(dz));
            solution.refracted_pitch_deg = self.k_factor.map(|k| {
                let drop = horizontal.powi(2) / (2.0 * MEAN_EARTH_RADIUS * k);
                (dz - drop).atan2(run).to_degrees()
            });
        }

        if let Some(heading) = observer.earth_heading_deg() {
            solution.heading_error_deg = Some(heading_diff_deg(bearing, heading));
        }

        if let (Some(required), Some(pitch)) = (
            solution.required_pitch_deg,
            observer.pitch_deg.filter(|p| p.is_finite()),
        ) {
            solution.pitch_error_deg = Some(required - pitch);
        }

        solution
    }
}

/// Solves with the default, straight-line solver.
pub fn solve(observer: &ObserverPose, target: Option<&GeoPoint>) -> SteeringSolution {
    Solver::default().solve(observer, target)
}

#[cfg(test)]
mod tests {
    use super::{solve, Solver, SteeringSolution};
    use crate::pose::{Frame, ObserverPose};
    use approx::assert_relative_eq;
    use geodesy::GeoPoint;

    fn at(lat: f64, lon: f64, alt: Option<f64>) -> GeoPoint {
        let p = GeoPoint::new(lat, lon).unwrap();
        match alt {
            Some(alt) => p.with_alt(alt),
            None => p,
        }
    }

    fn pose(position: Option<GeoPoint>, heading: Option<f64>, pitch: Option<f64>) -> ObserverPose {
        ObserverPose {
            position,
            heading_deg: heading,
            pitch_deg: pitch,
            frame: Frame::Earth,
        }
    }

    #[test]
    fn test_due_east_level() {
        let observer = pose(Some(at(0.0, 0.0, Some(10.0))), None, None);
        let target = at(0.0, 0.1, Some(10.0));
        let s = solve(&observer, Some(&target));
        assert!(s.valid);
        assert_relative_eq!(s.bearing_deg.unwrap(), 90.0, epsilon = 1e-9);
        assert_relative_eq!(s.horizontal_distance_m.unwrap(), 11_119.49, epsilon = 0.01);
        assert_eq!(s.vertical_delta_m, Some(0.0));
        assert_relative_eq!(s.required_pitch_deg.unwrap(), 0.0);
        assert_relative_eq!(
            s.line_of_sight_distance_m.unwrap(),
            s.horizontal_distance_m.unwrap()
        );
        assert_eq!(s.heading_error_deg, None);
        assert_eq!(s.pitch_error_deg, None);
        assert_eq!(s.refracted_pitch_deg, None);
    }

    #[test]
    fn test_missing_positions_are_invalid() {
        let target = at(1.0, 1.0, Some(5.0));
        let observer = pose(None, Some(10.0), Some(1.0));
        assert_eq!(solve(&observer, Some(&target)), SteeringSolution::default());

        let observer = pose(Some(at(0.0, 0.0, Some(1.0))), Some(10.0), Some(1.0));
        assert_eq!(solve(&observer, None), SteeringSolution::default());

        let nan = GeoPoint {
            lat_deg: f64::NAN,
            lon_deg: 0.0,
            alt_m: None,
        };
        assert!(!solve(&observer, Some(&nan)).valid);
    }

    #[test]
    fn test_missing_altitude_leaves_vertical_unset() {
        let observer = pose(Some(at(0.0, 0.0, None)), Some(0.0), Some(0.0));
        let s = solve(&observer, Some(&at(0.0, 0.1, Some(50.0))));
        assert!(s.valid);
        assert!(s.bearing_deg.is_some());
        assert_eq!(s.vertical_delta_m, None);
        assert_eq!(s.required_pitch_deg, None);
        assert_eq!(s.line_of_sight_distance_m, None);
        assert_eq!(s.pitch_error_deg, None);
        // Heading error only needs the bearing.
        assert_relative_eq!(s.heading_error_deg.unwrap(), 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_errors_point_toward_target() {
        // Target to the north-east and above.
        let observer = pose(Some(at(0.0, 0.0, Some(0.0))), Some(10.0), Some(0.0));
        let target = at(0.01, 0.01, Some(100.0));
        let s = solve(&observer, Some(&target));
        assert!(s.heading_error_deg.unwrap() > 0.0, "should turn right");
        assert!(s.pitch_error_deg.unwrap() > 0.0, "should tilt up");

        let observer = pose(Some(at(0.0, 0.0, Some(200.0))), Some(80.0), Some(5.0));
        let s = solve(&observer, Some(&target));
        assert!(s.heading_error_deg.unwrap() < 0.0, "should turn left");
        assert!(s.pitch_error_deg.unwrap() < 0.0, "should tilt down");
    }

    #[test]
    fn test_device_frame_heading_ignored() {
        let mut observer = pose(Some(at(0.0, 0.0, None)), Some(10.0), None);
        observer.frame = Frame::Device;
        let s = solve(&observer, Some(&at(1.0, 1.0, None)));
        assert_eq!(s.heading_error_deg, None);
    }

    #[test]
    fn test_overhead_target() {
        let observer = pose(Some(at(10.0, 10.0, Some(0.0))), None, None);
        let s = solve(&observer, Some(&at(10.0, 10.0, Some(100.0))));
        assert_relative_eq!(s.required_pitch_deg.unwrap(), 90.0, epsilon = 1e-3);
        assert!(s.required_pitch_deg.unwrap().is_finite());
    }

    #[test]
    fn test_refracted_pitch_dips_below_straight_line() {
        let observer = pose(Some(at(0.0, 0.0, Some(10.0))), None, None);
        let target = at(0.0, 0.5, Some(10.0));
        let s = Solver::new()
            .with_k_factor(4.0 / 3.0)
            .solve(&observer, Some(&target));
        let d = s.horizontal_distance_m.unwrap();
        let drop = d * d / (2.0 * 6_371_000.0 * 4.0 / 3.0);
        assert_relative_eq!(
            s.refracted_pitch_deg.unwrap(),
            (-drop).atan2(d).to_degrees(),
            epsilon = 1e-12
        );
        assert!(s.refracted_pitch_deg.unwrap() < s.required_pitch_deg.unwrap());
    }
}
