//! Coarse magnetic declination estimates.
//!
//! These are advisory. A compass corrected with either model is good
//! enough to find a target, not to survey one; users can stack a
//! manual correction on top.

use geodesy::{bearing_deg, wrap180, GeoPoint};
use serde::{Deserialize, Serialize};

/// Geomagnetic north pole, IGRF 2025 epoch.
pub const GEOMAGNETIC_NORTH_POLE: GeoPoint = GeoPoint {
    lat_deg: 80.8,
    lon_deg: -72.7,
    alt_m: None,
};

/// Bound on the heuristic model's output (degrees).
const HEURISTIC_LIMIT_DEG: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclinationModel {
    /// No modeled declination.
    Off,

    /// `lon / 12 * cos(lat)`, clamped to ±25°.
    Heuristic,

    /// Centered dipole: magnetic north is the direction of the
    /// geomagnetic pole.
    #[default]
    Dipole,
}

impl DeclinationModel {
    /// Declination in degrees, positive when magnetic north lies east
    /// of true north.
    pub fn declination_deg(self, at: &GeoPoint) -> f64 {
        match self {
            DeclinationModel::Off => 0.0,
            DeclinationModel::Heuristic => {
                let base = at.lon_deg / 12.0 * at.lat_deg.to_radians().cos();
                base.clamp(-HEURISTIC_LIMIT_DEG, HEURISTIC_LIMIT_DEG)
            }
            DeclinationModel::Dipole => {
                bearing_deg(at, &GEOMAGNETIC_NORTH_POLE).map_or(0.0, wrap180)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeclinationModel, GEOMAGNETIC_NORTH_POLE};
    use approx::assert_relative_eq;
    use geodesy::GeoPoint;

    #[test]
    fn test_dipole_on_pole_meridian() {
        let p = GeoPoint::new(45.0, GEOMAGNETIC_NORTH_POLE.lon_deg).unwrap();
        assert_relative_eq!(
            DeclinationModel::Dipole.declination_deg(&p),
            0.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_dipole_sign() {
        // Pole lies to the west of Greenwich, to the east of Alaska.
        let greenwich = GeoPoint::new(51.4779, -0.0015).unwrap();
        assert!(DeclinationModel::Dipole.declination_deg(&greenwich) < 0.0);
        let anchorage = GeoPoint::new(61.2181, -149.9003).unwrap();
        assert!(DeclinationModel::Dipole.declination_deg(&anchorage) > 0.0);
    }

    #[test]
    fn test_heuristic_is_clamped() {
        let p = GeoPoint::new(0.0, 179.0).unwrap();
        assert_eq!(DeclinationModel::Heuristic.declination_deg(&p), 25.0);
        let p = GeoPoint::new(60.0, 60.0).unwrap();
        assert_relative_eq!(
            DeclinationModel::Heuristic.declination_deg(&p),
            2.5,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_off() {
        let p = GeoPoint::new(10.0, 10.0).unwrap();
        assert_eq!(DeclinationModel::Off.declination_deg(&p), 0.0);
    }
}
