//! Human-facing steering cues.

use crate::solver::SteeringSolution;
use serde::Serialize;
use std::fmt;

/// Errors smaller than this are "on target" (degrees).
pub const DEFAULT_DEADBAND_DEG: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AzimuthCue {
    TurnLeft(f64),
    TurnRight(f64),
    OnAzimuth,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationCue {
    TiltUp(f64),
    TiltDown(f64),
    OnElevation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Guidance {
    pub azimuth: AzimuthCue,
    pub elevation: ElevationCue,
}

impl Guidance {
    pub fn from_solution(solution: &SteeringSolution, deadband_deg: f64) -> Self {
        let azimuth = match solution.heading_error_deg {
            None => AzimuthCue::Unknown,
            Some(e) if e.abs() <= deadband_deg => AzimuthCue::OnAzimuth,
            Some(e) if e > 0.0 => AzimuthCue::TurnRight(e),
            Some(e) => AzimuthCue::TurnLeft(-e),
        };
        let elevation = match solution.pitch_error_deg {
            None => ElevationCue::Unknown,
            Some(e) if e.abs() <= deadband_deg => ElevationCue::OnElevation,
            Some(e) if e > 0.0 => ElevationCue::TiltUp(e),
            Some(e) => ElevationCue::TiltDown(-e),
        };
        Self { azimuth, elevation }
    }

    pub fn on_target(&self) -> bool {
        self.azimuth == AzimuthCue::OnAzimuth && self.elevation == ElevationCue::OnElevation
    }
}

impl fmt::Display for Guidance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.azimuth {
            AzimuthCue::TurnLeft(deg) => write!(f, "turn left {deg:.1}°")?,
            AzimuthCue::TurnRight(deg) => write!(f, "turn right {deg:.1}°")?,
            AzimuthCue::OnAzimuth => write!(f, "on azimuth")?,
            AzimuthCue::Unknown => write!(f, "azimuth –")?,
        }
        match self.elevation {
            ElevationCue::TiltUp(deg) => write!(f, ", tilt up {deg:.1}°"),
            ElevationCue::TiltDown(deg) => write!(f, ", tilt down {deg:.1}°"),
            ElevationCue::OnElevation => write!(f, ", on elevation"),
            ElevationCue::Unknown => write!(f, ", elevation –"),
        }
    }
}

/// Angle between two azimuth/elevation directions, in `[0, 180]`
/// degrees.
pub fn pointing_error_deg(az1_deg: f64, el1_deg: f64, az2_deg: f64, el2_deg: f64) -> f64 {
    let unit = |az: f64, el: f64| {
        let (sin_az, cos_az) = az.to_radians().sin_cos();
        let (sin_el, cos_el) = el.to_radians().sin_cos();
        [sin_az * cos_el, cos_az * cos_el, sin_el]
    };
    let [x1, y1, z1] = unit(az1_deg, el1_deg);
    let [x2, y2, z2] = unit(az2_deg, el2_deg);
    (x1 * x2 + y1 * y2 + z1 * z2)
        .clamp(-1.0, 1.0)
        .acos()
        .to_degrees()
}
