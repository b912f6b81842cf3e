use geo::geometry::Point;
use serde::{Deserialize, Serialize};

/// A location on the earth in degrees, with optional mean-sea-level
/// altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat_deg: f64,

    pub lon_deg: f64,

    /// Altitude above mean sea level, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_m: Option<f64>,
}

impl GeoPoint {
    /// Returns a point at (`lat_deg`, `lon_deg`), or `None` if either
    /// value is not finite.
    ///
    /// Out of range coordinates are a caller bug. They trip a debug
    /// assertion and are otherwise clamped/wrapped with
    /// [`GeoPoint::clamped`].
    pub fn new(lat_deg: f64, lon_deg: f64) -> Option<Self> {
        if !(lat_deg.is_finite() && lon_deg.is_finite()) {
            return None;
        }
        debug_assert!(
            (-90.0..=90.0).contains(&lat_deg),
            "latitude {lat_deg} out of range"
        );
        debug_assert!(
            (-180.0..=180.0).contains(&lon_deg),
            "longitude {lon_deg} out of range"
        );
        Some(Self::clamped(lat_deg, lon_deg))
    }

    /// Returns a point with latitude clamped to `[-90, 90]` and
    /// longitude wrapped into `[-180, 180]`.
    pub fn clamped(lat_deg: f64, lon_deg: f64) -> Self {
        let lon_deg = if (-180.0..=180.0).contains(&lon_deg) {
            lon_deg
        } else {
            (lon_deg + 180.0).rem_euclid(360.0) - 180.0
        };
        Self {
            lat_deg: lat_deg.clamp(-90.0, 90.0),
            lon_deg,
            alt_m: None,
        }
    }

    #[must_use]
    pub fn with_alt(mut self, alt_m: f64) -> Self {
        self.alt_m = alt_m.is_finite().then_some(alt_m);
        self
    }

    /// True if both coordinates are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.lat_deg.is_finite()
            && self.lon_deg.is_finite()
            && (-90.0..=90.0).contains(&self.lat_deg)
            && (-180.0..=180.0).contains(&self.lon_deg)
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.lon_deg, p.lat_deg)
    }
}

impl From<Point<f64>> for GeoPoint {
    fn from(p: Point<f64>) -> Self {
        Self {
            lat_deg: p.y(),
            lon_deg: p.x(),
            alt_m: None,
        }
    }
}
