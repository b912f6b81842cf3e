/// Normalizes `deg` into `[0, 360)`.
pub fn normalize_deg(deg: f64) -> f64 {
    let x = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.
    if x >= 360.0 {
        0.0
    } else {
        x
    }
}

/// Wraps `deg` into `(-180, 180]`.
pub fn wrap180(deg: f64) -> f64 {
    let x = normalize_deg(deg);
    if x > 180.0 {
        x - 360.0
    } else {
        x
    }
}

/// Shortest signed rotation from `current` to `target`, in `(-180, 180]`.
///
/// Positive means turn right (clockwise).
pub fn heading_diff_deg(target: f64, current: f64) -> f64 {
    wrap180(normalize_deg(target) - normalize_deg(current))
}
