/// Mean earth radius in meters.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_000.0;

/// WGS-84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS-84 semi-minor axis in meters.
pub const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);

/// Effective earth radius multiplier for a standard atmosphere.
pub const STANDARD_K_FACTOR: f64 = 4.0 / 3.0;
