use crate::{
    error::PropahError,
    los::{analyze_profile, check_k_factor, LosResult, DEFAULT_K_FACTOR},
};
use elevation::Aggregator;
use geodesy::GeoPoint;
use log::debug;
use serde::Serialize;
use terrain::{TerrainProfile, DEFAULT_SAMPLES};

/// Samples the terrain between `observer` and `target` and tests the
/// ray between the two absolute heights.
pub async fn analyze(
    aggregator: &Aggregator,
    observer: GeoPoint,
    observer_height_m: f64,
    target: GeoPoint,
    target_height_m: f64,
    k_factor: f64,
) -> Result<(TerrainProfile, LosResult), PropahError> {
    let k_factor = check_k_factor(k_factor)?;
    let profile = TerrainProfile::builder()
        .start(observer)
        .end(target)
        .build(aggregator)
        .await?;
    let result = analyze_profile(&profile, observer_height_m, target_height_m, k_factor)?;
    Ok((profile, result))
}

/// Point to point line of sight estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineOfSight {
    pub profile: TerrainProfile,

    /// Ray height above mean sea level at the start.
    pub start_height_m: f64,

    /// Ray height above mean sea level at the end.
    pub end_height_m: f64,

    pub k_factor: f64,

    pub result: LosResult,
}

impl LineOfSight {
    pub fn builder() -> LineOfSightBuilder {
        LineOfSightBuilder {
            start: None,
            start_alt_m: 0.0,
            end: None,
            end_alt_m: 0.0,
            k_factor: DEFAULT_K_FACTOR,
            samples: DEFAULT_SAMPLES,
            freq_hz: None,
            prefer_bulk: true,
        }
    }
}

pub struct LineOfSightBuilder {
    /// Start point of the path (required).
    start: Option<GeoPoint>,

    /// Height above the start point (meters, defaults to 0).
    start_alt_m: f64,

    /// End point of the path (required).
    end: Option<GeoPoint>,

    /// Height above the end point (meters, defaults to 0).
    end_alt_m: f64,

    k_factor: f64,

    samples: usize,

    /// Link frequency for Fresnel clearance (optional).
    freq_hz: Option<f64>,

    prefer_bulk: bool,
}

impl LineOfSightBuilder {
    /// Start point of the path (required).
    ///
    /// If the point carries an altitude it is used as the ground
    /// height; otherwise the profile's first sample is.
    #[must_use]
    pub fn start(mut self, point: GeoPoint) -> Self {
        self.start = Some(point);
        self
    }

    /// Antenna or instrument height above the start point (meters,
    /// defaults to 0).
    #[must_use]
    pub fn start_alt(mut self, meters: f64) -> Self {
        self.start_alt_m = meters;
        self
    }

    /// End point of the path (required).
    #[must_use]
    pub fn end(mut self, point: GeoPoint) -> Self {
        self.end = Some(point);
        self
    }

    /// Height above the end point (meters, defaults to 0).
    #[must_use]
    pub fn end_alt(mut self, meters: f64) -> Self {
        self.end_alt_m = meters;
        self
    }

    /// Effective earth radius multiplier (defaults to 1.33).
    #[must_use]
    pub fn k_factor(mut self, k_factor: f64) -> Self {
        self.k_factor = k_factor;
        self
    }

    /// Profile samples, endpoints included (defaults to 64).
    #[must_use]
    pub fn samples(mut self, n: usize) -> Self {
        self.samples = n;
        self
    }

    /// Frequency of signal (Hz). Adds first Fresnel zone clearance.
    #[must_use]
    pub fn freq(mut self, freq_hz: f64) -> Self {
        self.freq_hz = Some(freq_hz);
        self
    }

    #[must_use]
    pub fn prefer_bulk(mut self, prefer_bulk: bool) -> Self {
        self.prefer_bulk = prefer_bulk;
        self
    }

    pub async fn build(&self, aggregator: &Aggregator) -> Result<LineOfSight, PropahError> {
        let start = self.start.ok_or(PropahError::Builder("start"))?;
        let end = self.end.ok_or(PropahError::Builder("end"))?;
        let k_factor = check_k_factor(self.k_factor)?;

        let profile = TerrainProfile::builder()
            .start(start)
            .end(end)
            .samples(self.samples)
            .prefer_bulk(self.prefer_bulk)
            .build(aggregator)
            .await?;

        let ground_start = profile.samples.first().map_or(0.0, |&(_, elev)| elev);
        let ground_end = profile.samples.last().map_or(0.0, |&(_, elev)| elev);
        let start_height_m = start.alt_m.unwrap_or(ground_start) + self.start_alt_m;
        let end_height_m = end.alt_m.unwrap_or(ground_end) + self.end_alt_m;

        let mut result = analyze_profile(&profile, start_height_m, end_height_m, k_factor)?;
        if let Some(freq_hz) = self.freq_hz {
            result.apply_fresnel(&profile, freq_hz)?;
        }

        debug!(
            "line of sight; distance_m: {:.0}, blocked: {}, min_clearance_m: {:.1}",
            profile.distance_m, result.blocked, result.min_clearance_m
        );

        Ok(LineOfSight {
            profile,
            start_height_m,
            end_height_m,
            k_factor,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{analyze, LineOfSight};
    use crate::{PropahError, DEFAULT_K_FACTOR};
    use approx::assert_relative_eq;
    use elevation::{Aggregator, BoxFuture, ElevationProvider, ProviderError};
    use geodesy::GeoPoint;
    use std::sync::Arc;

    /// Flat ground at sea level with an optional 50 m ridge between
    /// two longitudes.
    struct Ground {
        ridge: Option<(f64, f64)>,
    }

    impl ElevationProvider for Ground {
        fn id(&self) -> &str {
            "ground"
        }

        fn lookup(&self, point: GeoPoint) -> BoxFuture<'_, Result<f64, ProviderError>> {
            let elev = match self.ridge {
                Some((west, east)) if (west..=east).contains(&point.lon_deg) => 50.0,
                _ => 0.0,
            };
            Box::pin(std::future::ready(Ok(elev)))
        }
    }

    fn aggregator(ridge: Option<(f64, f64)>) -> Aggregator {
        Aggregator::builder()
            .provider(Arc::new(Ground { ridge }))
            .build()
            .unwrap()
    }

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[tokio::test]
    async fn test_clear_over_flat_ground() {
        let los = LineOfSight::builder()
            .start(pt(0.0, 0.0))
            .start_alt(2.0)
            .end(pt(0.0, 0.009))
            .end_alt(2.0)
            .build(&aggregator(None))
            .await
            .unwrap();
        assert_eq!(los.profile.len(), 64);
        assert_eq!(los.start_height_m, 2.0);
        assert_eq!(los.end_height_m, 2.0);
        assert_eq!(los.k_factor, DEFAULT_K_FACTOR);
        assert!(!los.result.blocked);
        assert!(los.result.min_clearance_m > 0.0);
    }

    #[tokio::test]
    async fn test_fresnel_needs_freq() {
        let agg = aggregator(None);
        let builder = LineOfSight::builder()
            .start(pt(0.0, 0.0))
            .start_alt(2.0)
            .end(pt(0.0, 0.009))
            .end_alt(2.0);
        let plain = builder.build(&agg).await.unwrap();
        assert_eq!(plain.result.fresnel_obstructed, None);
        let radio = builder.freq(900e6).build(&agg).await.unwrap();
        assert_eq!(radio.result.fresnel_obstructed, Some(true));
    }

    #[tokio::test]
    async fn test_point_altitude_overrides_ground() {
        let los = LineOfSight::builder()
            .start(pt(0.0, 0.0).with_alt(120.0))
            .start_alt(1.5)
            .end(pt(0.0, 0.009))
            .build(&aggregator(None))
            .await
            .unwrap();
        assert_relative_eq!(los.start_height_m, 121.5);
        assert_relative_eq!(los.end_height_m, 0.0);
    }

    #[tokio::test]
    async fn test_ridge_blocks() {
        let (profile, result) = analyze(
            &aggregator(Some((0.004, 0.005))),
            pt(0.0, 0.0),
            2.0,
            pt(0.0, 0.009),
            2.0,
            DEFAULT_K_FACTOR,
        )
        .await
        .unwrap();
        assert_eq!(profile.len(), 64);
        assert!(result.blocked);
        assert!(result.min_clearance_m < -40.0);
    }

    #[tokio::test]
    async fn test_builder_errors() {
        let agg = aggregator(None);
        let no_start = LineOfSight::builder().end(pt(0.0, 0.0)).build(&agg).await;
        assert_eq!(no_start, Err(PropahError::Builder("start")));
        let bad_k = LineOfSight::builder()
            .start(pt(0.0, 0.0))
            .end(pt(0.0, 0.001))
            .k_factor(-1.0)
            .build(&agg)
            .await;
        assert_eq!(bad_k, Err(PropahError::KFactor(-1.0)));
    }
}
