use crate::TerrainError;
use elevation::{Aggregator, RetryPolicy};
use futures::stream::{self, StreamExt};
use geodesy::{distance_m, geo::Point, linspace, GeoPoint, GreatCircleIter};
use log::{debug, warn};
use serde::Serialize;
use std::time::Instant;

/// Samples per profile unless the caller asks otherwise.
pub const DEFAULT_SAMPLES: usize = 64;

/// Per-point lookups in flight while stitching a profile.
const STITCH_CONCURRENCY: usize = 8;

/// Where a profile's elevations came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    /// One bulk request to the named provider.
    Bulk(String),

    /// Per-point aggregator lookups.
    Stitched,

    /// Handed in by the caller.
    Supplied,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerrainProfile {
    /// Great-circle distance from start to end in meters.
    pub distance_m: f64,

    /// Location of each sample along the great circle. Empty for
    /// supplied profiles.
    pub great_circle: Vec<GeoPoint>,

    /// `(fraction along path, ground elevation)` per sample, in
    /// path order.
    pub samples: Vec<(f64, f64)>,

    pub source: ProfileSource,
}

impl TerrainProfile {
    pub fn builder() -> ProfileBuilder {
        ProfileBuilder {
            start: None,
            end: None,
            samples: DEFAULT_SAMPLES,
            prefer_bulk: true,
        }
    }

    /// Profile from elevations already known to be evenly spaced over
    /// `distance_m`.
    pub fn from_elevations(distance_m: f64, elevations: &[f64]) -> Self {
        Self {
            distance_m,
            great_circle: Vec::new(),
            samples: linspace(0.0, 1.0, elevations.len())
                .zip(elevations.iter().copied())
                .collect(),
            source: ProfileSource::Supplied,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn elevations(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|&(_, elev)| elev)
    }
}

pub struct ProfileBuilder {
    /// Observer end of the path (required).
    start: Option<GeoPoint>,

    /// Target end of the path (required).
    end: Option<GeoPoint>,

    /// Number of samples, both endpoints included (defaults to 64).
    samples: usize,

    /// Ask bulk-capable providers first (defaults to true).
    prefer_bulk: bool,
}

impl ProfileBuilder {
    #[must_use]
    pub fn start(mut self, point: GeoPoint) -> Self {
        self.start = Some(point);
        self
    }

    #[must_use]
    pub fn end(mut self, point: GeoPoint) -> Self {
        self.end = Some(point);
        self
    }

    #[must_use]
    pub fn samples(mut self, n: usize) -> Self {
        self.samples = n;
        self
    }

    #[must_use]
    pub fn prefer_bulk(mut self, prefer_bulk: bool) -> Self {
        self.prefer_bulk = prefer_bulk;
        self
    }

    /// Resolves ground elevation at every sample.
    ///
    /// Each bulk-capable provider gets one attempt; the first answer
    /// with the right number of finite samples wins. Otherwise every
    /// point is looked up through `aggregator`, and any point with no
    /// aggregate fails the whole profile.
    pub async fn build(&self, aggregator: &Aggregator) -> Result<TerrainProfile, TerrainError> {
        let start = self.start.ok_or(TerrainError::Builder("start"))?;
        let end = self.end.ok_or(TerrainError::Builder("end"))?;
        let n = self.samples;
        if n == 0 {
            return Err(TerrainError::Builder("samples"));
        }

        let distance_m = distance_m(&start, &end);

        let (great_circle, path_runtime) = {
            let now = Instant::now();
            let great_circle: Vec<GeoPoint> =
                GreatCircleIter::new(Point::from(start), Point::from(end), n)
                    .map(GeoPoint::from)
                    .collect();
            (great_circle, now.elapsed())
        };

        let now = Instant::now();
        let bulk = if self.prefer_bulk && n > 1 {
            bulk_profile(aggregator, start, end, n).await
        } else {
            None
        };
        let (elevations, source) = match bulk {
            Some((id, elevations)) => (elevations, ProfileSource::Bulk(id)),
            None => (
                stitched_profile(aggregator, &great_circle).await?,
                ProfileSource::Stitched,
            ),
        };
        let terrain_runtime = now.elapsed();

        debug!(
            "profile; len: {}, source: {:?}, path_exec: {:?}, terrain_exec: {:?}",
            great_circle.len(),
            source,
            path_runtime,
            terrain_runtime
        );

        Ok(TerrainProfile {
            distance_m,
            great_circle,
            samples: linspace(0.0, 1.0, n).zip(elevations).collect(),
            source,
        })
    }
}

async fn bulk_profile(
    aggregator: &Aggregator,
    start: GeoPoint,
    end: GeoPoint,
    n: usize,
) -> Option<(String, Vec<f64>)> {
    let once = RetryPolicy::no_retry(aggregator.retry_policy().timeout);
    for provider in aggregator.providers().iter().filter(|p| p.supports_profile()) {
        let id = provider.id();
        match once.run(id, || provider.profile(start, end, n)).await {
            Ok(elevations) if elevations.len() == n && elevations.iter().all(|m| m.is_finite()) => {
                return Some((id.to_owned(), elevations));
            }
            Ok(elevations) => warn!(
                "{id}; bulk profile returned {} unusable samples, wanted {n}",
                elevations.len()
            ),
            Err(e) => warn!("{id}; bulk profile failed: {e}"),
        }
    }
    None
}

async fn stitched_profile(
    aggregator: &Aggregator,
    points: &[GeoPoint],
) -> Result<Vec<f64>, TerrainError> {
    let samples: Vec<_> = stream::iter(points)
        .map(|point| aggregator.lookup(point))
        .buffered(STITCH_CONCURRENCY)
        .collect()
        .await;
    samples
        .into_iter()
        .enumerate()
        .map(|(index, sample)| {
            sample
                .aggregate
                .ok_or(TerrainError::MissingElevation { index })
        })
        .collect()
}
