//! Normalizes platform orientation events into fusion samples.
//!
//! Browsers and phones report orientation as Euler angles whose axes
//! follow the physical device, not the screen. Heading comes from a
//! magnetometer-backed compass when one is available, otherwise from
//! `alpha`, which is only north-referenced when `absolute` is set.

use crate::pose::Frame;
use geodesy::normalize_deg;
use serde::{Deserialize, Serialize};

/// A raw orientation reading as delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationEvent {
    /// Rotation about the z axis (degrees).
    pub alpha: Option<f64>,

    /// Front-back tilt (degrees).
    pub beta: Option<f64>,

    /// Left-right tilt (degrees).
    pub gamma: Option<f64>,

    /// True if `alpha` is north-referenced.
    pub absolute: bool,

    /// Magnetic compass heading, on platforms that provide one.
    pub compass_heading: Option<f64>,

    /// Screen rotation relative to the device's natural orientation
    /// (degrees, typically 0, 90, 180, or 270).
    pub screen_angle: f64,
}

/// A normalized heading/pitch reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientationSample {
    pub heading_deg: Option<f64>,
    pub pitch_deg: Option<f64>,
    pub frame: Frame,
}

impl From<&OrientationEvent> for OrientationSample {
    fn from(ev: &OrientationEvent) -> Self {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());

        let (heading_deg, frame) = if let Some(h) = finite(ev.compass_heading) {
            (Some(normalize_deg(h)), Frame::Earth)
        } else if let Some(alpha) = finite(ev.alpha) {
            if ev.absolute {
                (Some(normalize_deg(alpha + ev.screen_angle)), Frame::Earth)
            } else {
                (Some(normalize_deg(alpha)), Frame::Device)
            }
        } else {
            (None, Frame::Device)
        };

        OrientationSample {
            heading_deg,
            pitch_deg: screen_pitch(finite(ev.beta), finite(ev.gamma), ev.screen_angle),
            frame,
        }
    }
}

/// Pitch of the screen's top edge, accounting for screen rotation.
fn screen_pitch(beta: Option<f64>, gamma: Option<f64>, screen_angle: f64) -> Option<f64> {
    if beta.is_none() && gamma.is_none() {
        return None;
    }
    let b = beta.unwrap_or(0.0);
    let g = gamma.unwrap_or(0.0);
    #[allow(clippy::cast_possible_truncation)]
    let quadrant = ((normalize_deg(screen_angle) / 90.0).round() as i64).rem_euclid(4);
    let raw = match quadrant {
        1 => g,
        2 => -b,
        3 => -g,
        _ => b,
    };
    Some(raw.clamp(-90.0, 90.0))
}

#[cfg(test)]
mod tests {
    use super::{OrientationEvent, OrientationSample};
    use crate::pose::Frame;

    #[test]
    fn test_compass_heading_wins() {
        let ev = OrientationEvent {
            alpha: Some(10.0),
            compass_heading: Some(370.0),
            ..Default::default()
        };
        let s = OrientationSample::from(&ev);
        assert_eq!(s.heading_deg, Some(10.0));
        assert_eq!(s.frame, Frame::Earth);
    }

    #[test]
    fn test_absolute_alpha_adds_screen_angle() {
        let ev = OrientationEvent {
            alpha: Some(300.0),
            absolute: true,
            screen_angle: 90.0,
            ..Default::default()
        };
        let s = OrientationSample::from(&ev);
        assert_eq!(s.heading_deg, Some(30.0));
        assert_eq!(s.frame, Frame::Earth);
    }

    #[test]
    fn test_relative_alpha_is_device_frame() {
        let ev = OrientationEvent {
            alpha: Some(45.0),
            ..Default::default()
        };
        let s = OrientationSample::from(&ev);
        assert_eq!(s.heading_deg, Some(45.0));
        assert_eq!(s.frame, Frame::Device);
    }

    #[test]
    fn test_pitch_follows_screen_rotation() {
        let pitch = |screen_angle| {
            OrientationSample::from(&OrientationEvent {
                beta: Some(20.0),
                gamma: Some(-5.0),
                screen_angle,
                ..Default::default()
            })
            .pitch_deg
        };
        assert_eq!(pitch(0.0), Some(20.0));
        assert_eq!(pitch(90.0), Some(-5.0));
        assert_eq!(pitch(180.0), Some(-20.0));
        assert_eq!(pitch(270.0), Some(5.0));
        assert_eq!(pitch(-90.0), Some(5.0));
    }

    #[test]
    fn test_no_tilt_no_pitch() {
        let s = OrientationSample::from(&OrientationEvent::default());
        assert_eq!(s.pitch_deg, None);
        assert_eq!(s.heading_deg, None);
    }
}
