//! Multi-provider elevation aggregator.

use crate::{
    error::ElevationError,
    provider::ElevationProvider,
    retry::RetryPolicy,
    sample::{AggregationMethod, ElevationSample, ProviderOutcome},
};
use dashmap::DashMap;
use futures::future::join_all;
use geodesy::GeoPoint;
use log::{debug, warn};
use std::{collections::BTreeSet, sync::Arc};
use tokio::sync::OnceCell;

/// Cache grid resolution in degrees (~11 m of latitude).
const GRID_DEG: f64 = 1e-4;

/// A coordinate snapped to the cache grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat: i32,
    lon: i32,
}

impl CacheKey {
    /// The grid point this key stands for.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::clamped(f64::from(self.lat) * GRID_DEG, f64::from(self.lon) * GRID_DEG)
    }
}

impl From<&GeoPoint> for CacheKey {
    #[allow(clippy::cast_possible_truncation)]
    fn from(p: &GeoPoint) -> Self {
        CacheKey {
            lat: (p.lat_deg / GRID_DEG).round() as i32,
            lon: (p.lon_deg / GRID_DEG).round() as i32,
        }
    }
}

/// Queries every provider for a point and reconciles the answers.
///
/// The cache is the only shared mutable state: concurrent lookups of
/// the same grid cell share one set of provider calls.
pub struct Aggregator {
    providers: Vec<Arc<dyn ElevationProvider>>,

    method: AggregationMethod,

    retry: RetryPolicy,

    /// Samples which have been resolved (or are being resolved) on
    /// demand.
    cache: DashMap<CacheKey, Arc<OnceCell<ElevationSample>>>,
}

impl Aggregator {
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder {
            providers: Vec::new(),
            method: AggregationMethod::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Returns the reconciled elevation for the grid cell containing
    /// `point`.
    ///
    /// Never fails: provider failures are recorded in the sample, and
    /// a sample with no aggregate tells the host to fall back to
    /// manual entry. Such samples are not cached, so a later lookup
    /// tries the providers again.
    pub async fn lookup(&self, point: &GeoPoint) -> ElevationSample {
        let key = CacheKey::from(point);
        // Clone the cell out so no shard lock is held across awaits.
        let cell = Arc::clone(self.cache.entry(key).or_default().value());

        if let Some(sample) = cell.get() {
            debug!("cache hit; {key:?}");
            return sample.clone();
        }

        let resolved = cell
            .get_or_try_init(|| async {
                let sample = self.query(key.center()).await;
                if sample.aggregate.is_some() {
                    Ok(sample)
                } else {
                    Err(sample)
                }
            })
            .await;

        match resolved {
            Ok(sample) => sample.clone(),
            Err(sample) => {
                self.cache
                    .remove_if(&key, |_, c| Arc::ptr_eq(c, &cell) && !c.initialized());
                sample
            }
        }
    }

    /// Drops every cached sample.
    pub fn clear_cache(&self) {
        debug!("clearing {} cached samples", self.cache.len());
        self.cache.clear();
    }

    /// Number of resolved samples in the cache.
    pub fn cache_len(&self) -> usize {
        self.cache
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    /// Replaces the provider set, invalidating the cache.
    pub fn set_providers(
        &mut self,
        providers: Vec<Arc<dyn ElevationProvider>>,
    ) -> Result<(), ElevationError> {
        if providers.is_empty() {
            return Err(ElevationError::Builder("provider"));
        }
        ensure_unique_ids(&providers)?;
        self.providers = providers;
        self.clear_cache();
        Ok(())
    }

    /// Changes the aggregation method, invalidating the cache.
    pub fn set_method(&mut self, method: AggregationMethod) {
        if method != self.method {
            self.method = method;
            self.clear_cache();
        }
    }

    pub fn providers(&self) -> &[Arc<dyn ElevationProvider>] {
        &self.providers
    }

    pub fn method(&self) -> AggregationMethod {
        self.method
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

/// Private API.
impl Aggregator {
    async fn query(&self, point: GeoPoint) -> ElevationSample {
        debug!(
            "cache miss; querying {} providers for {:.4},{:.4}",
            self.providers.len(),
            point.lat_deg,
            point.lon_deg
        );

        let calls = self.providers.iter().map(|provider| async move {
            let id = provider.id().to_owned();
            let res = self.retry.run(&id, || provider.lookup(point)).await;
            if let Err(e) = &res {
                warn!("provider {id} failed: {e}");
            }
            (id, ProviderOutcome::from(res))
        });

        let per_provider = join_all(calls).await.into_iter().collect();
        ElevationSample::new(point, per_provider, self.method)
    }
}

/// Outcomes are keyed by provider id; a repeated id would hide an answer.
fn ensure_unique_ids(providers: &[Arc<dyn ElevationProvider>]) -> Result<(), ElevationError> {
    let mut ids = BTreeSet::new();
    for provider in providers {
        if !ids.insert(provider.id()) {
            return Err(ElevationError::DuplicateProvider(provider.id().to_owned()));
        }
    }
    Ok(())
}

pub struct AggregatorBuilder {
    providers: Vec<Arc<dyn ElevationProvider>>,
    method: AggregationMethod,
    retry: RetryPolicy,
}

impl AggregatorBuilder {
    /// Adds a provider (at least one is required).
    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn ElevationProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// How to combine provider values (defaults to mean).
    #[must_use]
    pub fn method(mut self, method: AggregationMethod) -> Self {
        self.method = method;
        self
    }

    /// Per-provider retry policy (defaults to 2 retries, 200 ms
    /// quadratic backoff, 7 s per attempt).
    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> Result<Aggregator, ElevationError> {
        if self.providers.is_empty() {
            return Err(ElevationError::Builder("provider"));
        }
        ensure_unique_ids(&self.providers)?;
        Ok(Aggregator {
            providers: self.providers,
            method: self.method,
            retry: self.retry,
            cache: DashMap::new(),
        })
    }
}
