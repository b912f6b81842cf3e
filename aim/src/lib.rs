//! # Aiming
//!
//! Turns noisy heading/pitch samples into a calibrated pose, and a
//! pose plus a surveyed target into a steering solution.
//!
//! The host feeds [`OrientationSample`]s into [`OrientationFusion`] at
//! sensor rate, asks it for an [`ObserverPose`], and hands that pose
//! to [`Solver::solve`] whenever it wants to redraw.

pub mod declination;
pub mod device;
pub mod fusion;
pub mod guidance;
mod pose;
pub mod solver;

pub use crate::{
    declination::DeclinationModel,
    device::{OrientationEvent, OrientationSample},
    fusion::{CalibrationState, CalibrationStatus, OrientationFusion, PitchSign},
    guidance::{pointing_error_deg, Guidance},
    pose::{AltitudeSource, Frame, ObserverAltitude, ObserverPose},
    solver::{solve, Solver, SteeringSolution},
};
pub use geodesy;
