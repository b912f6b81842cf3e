use crate::error::ProviderError;
use geodesy::GeoPoint;
use std::{future::Future, pin::Pin};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A source of ground elevation (meters above mean sea level).
///
/// Providers are held as `Arc<dyn ElevationProvider>`, so async
/// methods return boxed futures.
pub trait ElevationProvider: Send + Sync {
    /// Stable identifier, used as the key in per-provider results.
    fn id(&self) -> &str;

    /// Elevation at a single point.
    fn lookup(&self, point: GeoPoint) -> BoxFuture<'_, Result<f64, ProviderError>>;

    /// True if [`ElevationProvider::profile`] is implemented.
    fn supports_profile(&self) -> bool {
        false
    }

    /// `n` elevations evenly spaced along the great circle from
    /// `start` to `end`, both included.
    fn profile(
        &self,
        _start: GeoPoint,
        _end: GeoPoint,
        _n: usize,
    ) -> BoxFuture<'_, Result<Vec<f64>, ProviderError>> {
        Box::pin(std::future::ready(Err(ProviderError::Unsupported(
            "profile",
        ))))
    }
}
