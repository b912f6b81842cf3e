use geodesy::GeoPoint;
use serde::{Deserialize, Serialize};

/// What a heading value is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frame {
    /// Heading is relative to north.
    Earth,

    /// Heading is relative to an arbitrary device zero.
    #[default]
    Device,
}

/// Where the observer is and which way the device points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObserverPose {
    pub position: Option<GeoPoint>,

    /// Heading in `[0, 360)`, interpreted per `frame`.
    pub heading_deg: Option<f64>,

    /// Pitch in `[-90, 90]`, positive up.
    pub pitch_deg: Option<f64>,

    pub frame: Frame,
}

impl ObserverPose {
    /// Declares this pose's heading to be north-referenced.
    ///
    /// Device-frame headings are never used for steering until the
    /// host promotes them.
    #[must_use]
    pub fn promote_to_earth(mut self) -> Self {
        self.frame = Frame::Earth;
        self
    }

    /// Heading, only if it is north-referenced.
    pub fn earth_heading_deg(&self) -> Option<f64> {
        match self.frame {
            Frame::Earth => self.heading_deg.filter(|h| h.is_finite()),
            Frame::Device => None,
        }
    }
}

/// Where the observer's altitude comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeSource {
    /// GPS altitude plus a geoid correction.
    Gps { geoid_offset_m: f64 },

    /// A fixed, user-entered altitude (meters MSL).
    Manual(f64),
}

impl Default for AltitudeSource {
    fn default() -> Self {
        AltitudeSource::Gps { geoid_offset_m: 0.0 }
    }
}

/// Resolves the altitude of the instrument, not the ground under it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObserverAltitude {
    pub source: AltitudeSource,

    /// Height of the instrument above the ground (meters).
    pub instrument_height_m: f64,
}

impl ObserverAltitude {
    /// Instrument altitude in meters MSL, or `None` when the source
    /// has nothing to offer.
    pub fn resolve(&self, gps_alt_m: Option<f64>) -> Option<f64> {
        let base = match self.source {
            AltitudeSource::Gps { geoid_offset_m } => {
                gps_alt_m.filter(|a| a.is_finite())? + geoid_offset_m
            }
            AltitudeSource::Manual(alt_m) => alt_m,
        };
        Some(base + self.instrument_height_m)
    }
}
