//! Curved-earth ray test over a terrain profile.

use crate::{
    error::PropahError,
    fresnel::{freq_to_wavelen, fresnel},
};
use geodesy::MEAN_EARTH_RADIUS;
use serde::Serialize;
use terrain::TerrainProfile;

/// Effective earth radius multiplier for a standard atmosphere.
pub const DEFAULT_K_FACTOR: f64 = 1.33;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LosResult {
    /// Terrain reaches or rises above the ray somewhere on the path.
    pub blocked: bool,

    /// Smallest gap between ray and terrain (negative when blocked).
    /// Infinite for an empty profile.
    pub min_clearance_m: f64,

    /// Ray height at each profile sample.
    pub ray_m: Vec<f64>,

    /// Ray height minus terrain at each profile sample.
    pub clearance_m: Vec<f64>,

    /// Smallest clearance left after subtracting the first Fresnel
    /// radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresnel_clearance_m: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresnel_obstructed: Option<bool>,
}

/// How far the ray has fallen below the observer's horizontal after
/// `d_m` meters over an earth of radius `R * k_factor`.
pub fn curvature_drop_m(d_m: f64, k_factor: f64) -> f64 {
    d_m * d_m / (2.0 * MEAN_EARTH_RADIUS * k_factor)
}

pub(crate) fn check_k_factor(k_factor: f64) -> Result<f64, PropahError> {
    if k_factor.is_finite() && k_factor > 0.0 {
        Ok(k_factor)
    } else {
        Err(PropahError::KFactor(k_factor))
    }
}

/// Tests the ray from `observer_height_m` to `target_height_m`
/// (absolute heights, antenna offsets included) against `profile`.
pub fn analyze_profile(
    profile: &TerrainProfile,
    observer_height_m: f64,
    target_height_m: f64,
    k_factor: f64,
) -> Result<LosResult, PropahError> {
    let k_factor = check_k_factor(k_factor)?;
    let distance_m = profile.distance_m;

    let mut blocked = false;
    let mut min_clearance_m = f64::INFINITY;
    let mut ray_m = Vec::with_capacity(profile.len());
    let mut clearance_m = Vec::with_capacity(profile.len());

    for &(f, terrain_m) in &profile.samples {
        let ray = observer_height_m + f * (target_height_m - observer_height_m)
            - curvature_drop_m(f * distance_m, k_factor);
        let clearance = ray - terrain_m;
        min_clearance_m = min_clearance_m.min(clearance);
        blocked |= terrain_m >= ray;
        ray_m.push(ray);
        clearance_m.push(clearance);
    }

    Ok(LosResult {
        blocked,
        min_clearance_m,
        ray_m,
        clearance_m,
        fresnel_clearance_m: None,
        fresnel_obstructed: None,
    })
}

impl LosResult {
    /// Fills in first Fresnel zone clearance for a link at `freq_hz`.
    ///
    /// `profile` must be the one this result was computed from.
    pub fn apply_fresnel(
        &mut self,
        profile: &TerrainProfile,
        freq_hz: f64,
    ) -> Result<(), PropahError> {
        if !(freq_hz.is_finite() && freq_hz > 0.0) {
            return Err(PropahError::Frequency(freq_hz));
        }
        let wavelen = freq_to_wavelen(freq_hz);
        let distance_m = profile.distance_m;
        let min = profile
            .samples
            .iter()
            .zip(&self.clearance_m)
            .map(|(&(f, _), clearance)| clearance - fresnel(1, wavelen, f * distance_m, distance_m))
            .fold(f64::INFINITY, f64::min);
        self.fresnel_clearance_m = Some(min);
        self.fresnel_obstructed = Some(min < 0.0);
        Ok(())
    }
}
