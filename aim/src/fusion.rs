//! Heading/pitch smoothing and session calibration.

use crate::{
    declination::DeclinationModel,
    device::OrientationSample,
    pose::{Frame, ObserverPose},
};
use geodesy::{normalize_deg, wrap180, GeoPoint};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Default exponential moving average weight of a new sample.
pub const DEFAULT_SMOOTHING: f64 = 0.25;

/// Bound on user-entered declination (degrees).
pub const MAX_MANUAL_DECLINATION_DEG: f64 = 40.0;

/// Which way raw pitch maps onto "up".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PitchSign {
    #[default]
    Normal,
    Inverted,
}

impl PitchSign {
    pub fn factor(self) -> f64 {
        match self {
            PitchSign::Normal => 1.0,
            PitchSign::Inverted => -1.0,
        }
    }

    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            PitchSign::Normal => PitchSign::Inverted,
            PitchSign::Inverted => PitchSign::Normal,
        }
    }
}

/// User calibration for one session.
///
/// Only changed by the explicit calibration operations on
/// [`OrientationFusion`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationState {
    pub heading_offset_deg: f64,
    pub pitch_zero_offset_deg: f64,
    pub pitch_sign: PitchSign,
    pub declination_manual_deg: f64,
}

/// Outcome of a calibration request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStatus {
    /// Calibration took effect; carries the new offset.
    Applied { offset_deg: f64 },

    /// No earth-frame heading has been ingested yet.
    NoHeadingSample,

    /// No pitch has been ingested yet.
    NoPitchSample,
}

impl CalibrationStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, CalibrationStatus::Applied { .. })
    }
}

/// Smooths raw orientation samples and applies calibration.
///
/// Every method is O(1) and free of I/O so it can run at sensor rate.
#[derive(Debug, Clone)]
pub struct OrientationFusion {
    smoothing: f64,

    /// Smoothed heading as a unit vector (sin, cos), so that samples
    /// straddling north average correctly.
    heading_ema: Option<(f64, f64)>,

    pitch_ema: Option<f64>,

    calibration: CalibrationState,

    declination_model: DeclinationModel,

    apply_declination: bool,

    /// Last known position, for modeled declination.
    position: Option<GeoPoint>,
}

impl Default for OrientationFusion {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING)
    }
}

impl OrientationFusion {
    /// `smoothing` is the weight of each new sample, in `(0, 1]`.
    pub fn new(smoothing: f64) -> Self {
        debug_assert!(smoothing > 0.0 && smoothing <= 1.0);
        Self {
            smoothing: smoothing.clamp(f64::EPSILON, 1.0),
            heading_ema: None,
            pitch_ema: None,
            calibration: CalibrationState::default(),
            declination_model: DeclinationModel::default(),
            apply_declination: true,
            position: None,
        }
    }

    /// Folds one raw reading into the running averages.
    ///
    /// Device-frame headings are dropped; their pitch is still used.
    pub fn ingest_sample(&mut self, raw_heading_deg: f64, raw_pitch_deg: f64, frame_is_earth: bool) {
        self.ingest(&OrientationSample {
            heading_deg: Some(raw_heading_deg),
            pitch_deg: Some(raw_pitch_deg),
            frame: if frame_is_earth {
                Frame::Earth
            } else {
                Frame::Device
            },
        });
    }

    /// Like [`OrientationFusion::ingest_sample`], for readings that may
    /// lack heading or pitch.
    pub fn ingest(&mut self, sample: &OrientationSample) {
        if let (Some(h), Frame::Earth) = (sample.heading_deg, sample.frame) {
            if h.is_finite() {
                let (s, c) = h.to_radians().sin_cos();
                let a = self.smoothing;
                self.heading_ema = Some(match self.heading_ema {
                    None => (s, c),
                    Some((ps, pc)) => (a * s + (1.0 - a) * ps, a * c + (1.0 - a) * pc),
                });
            }
        }
        if let Some(p) = sample.pitch_deg.filter(|p| p.is_finite()) {
            let a = self.smoothing;
            self.pitch_ema = Some(match self.pitch_ema {
                None => p,
                Some(prev) => a * p + (1.0 - a) * prev,
            });
        }
        trace!(
            "ingest; heading_ema: {:?}, pitch_ema: {:?}",
            self.raw_heading_deg(),
            self.pitch_ema
        );
    }

    /// Smoothed, uncalibrated heading.
    pub fn raw_heading_deg(&self) -> Option<f64> {
        let (s, c) = self.heading_ema?;
        // Opposing samples can cancel out entirely.
        if s.hypot(c) < 1e-9 {
            return None;
        }
        Some(normalize_deg(s.atan2(c).to_degrees()))
    }

    /// Smoothed, uncalibrated pitch.
    pub fn raw_pitch_deg(&self) -> Option<f64> {
        self.pitch_ema
    }

    /// Sets the heading offset so that the heading resolved for
    /// `current_raw_heading_deg` equals `bearing_to_target_deg`.
    pub fn calibrate_heading_to_target(
        &mut self,
        bearing_to_target_deg: f64,
        current_raw_heading_deg: f64,
    ) -> CalibrationStatus {
        if self.heading_ema.is_none() || !current_raw_heading_deg.is_finite() {
            debug!("heading calibration skipped; no heading sample");
            return CalibrationStatus::NoHeadingSample;
        }
        let offset =
            wrap180(bearing_to_target_deg - current_raw_heading_deg - self.declination_deg());
        self.calibration.heading_offset_deg = offset;
        debug!("heading calibrated; offset: {offset:.2}°");
        CalibrationStatus::Applied { offset_deg: offset }
    }

    /// Makes the current physical tilt read as level.
    pub fn quick_level(&mut self, current_raw_pitch_deg: f64) -> CalibrationStatus {
        if self.pitch_ema.is_none() || !current_raw_pitch_deg.is_finite() {
            debug!("quick level skipped; no pitch sample");
            return CalibrationStatus::NoPitchSample;
        }
        let offset = -self.calibration.pitch_sign.factor() * current_raw_pitch_deg;
        self.calibration.pitch_zero_offset_deg = offset;
        debug!("pitch leveled; offset: {offset:.2}°");
        CalibrationStatus::Applied { offset_deg: offset }
    }

    /// Zeroes every offset and restores the normal pitch sign.
    pub fn reset_calibration(&mut self) {
        debug!("calibration reset");
        self.calibration = CalibrationState::default();
    }

    /// Inverts the pitch axis for devices that report it upside down.
    pub fn flip_pitch_sign(&mut self) {
        self.calibration.pitch_sign = self.calibration.pitch_sign.flipped();
    }

    /// Sets the user's declination correction, clamped to ±40°.
    pub fn set_manual_declination(&mut self, deg: f64) {
        self.calibration.declination_manual_deg = if deg.is_finite() {
            deg.clamp(-MAX_MANUAL_DECLINATION_DEG, MAX_MANUAL_DECLINATION_DEG)
        } else {
            0.0
        };
    }

    pub fn set_apply_declination(&mut self, apply: bool) {
        self.apply_declination = apply;
    }

    pub fn set_declination_model(&mut self, model: DeclinationModel) {
        self.declination_model = model;
    }

    /// Updates the position used for modeled declination.
    pub fn set_position(&mut self, position: GeoPoint) {
        if position.is_valid() {
            self.position = Some(position);
        }
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Declination currently added to headings (manual + modeled), or
    /// zero when declination is off.
    pub fn declination_deg(&self) -> f64 {
        if !self.apply_declination {
            return 0.0;
        }
        let modeled = self
            .position
            .map_or(0.0, |p| self.declination_model.declination_deg(&p));
        self.calibration.declination_manual_deg + modeled
    }

    /// Calibrated heading in `[0, 360)`.
    pub fn resolved_heading_deg(&self) -> Option<f64> {
        let raw = self.raw_heading_deg()?;
        Some(normalize_deg(
            raw + self.declination_deg() + self.calibration.heading_offset_deg,
        ))
    }

    /// Calibrated pitch in `[-90, 90]`.
    pub fn resolved_pitch_deg(&self) -> Option<f64> {
        let raw = self.pitch_ema?;
        let CalibrationState {
            pitch_zero_offset_deg,
            pitch_sign,
            ..
        } = self.calibration;
        Some((pitch_sign.factor() * raw + pitch_zero_offset_deg).clamp(-90.0, 90.0))
    }

    /// The current pose. The heading is earth-referenced when present.
    pub fn pose(&self, position: Option<GeoPoint>) -> ObserverPose {
        let heading_deg = self.resolved_heading_deg();
        ObserverPose {
            position,
            heading_deg,
            pitch_deg: self.resolved_pitch_deg(),
            frame: if heading_deg.is_some() {
                Frame::Earth
            } else {
                Frame::Device
            },
        }
    }
}
