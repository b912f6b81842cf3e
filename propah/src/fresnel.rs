/// Speed of light in m/s
const C: f64 = 299_792_458.0;

pub fn freq_to_wavelen(freq_hz: f64) -> f64 {
    C / freq_hz
}

/// Radius of the `zone`th Fresnel zone at `d1_m` along a path of
/// `distance_m`.
pub fn fresnel(zone: u8, wavelen_m: f64, d1_m: f64, distance_m: f64) -> f64 {
    if distance_m <= 0.0 {
        return 0.0;
    }
    let d2_m = (distance_m - d1_m).max(0.0);
    (f64::from(zone) * wavelen_m * d1_m * d2_m / distance_m).sqrt()
}
