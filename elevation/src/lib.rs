//! # Elevation
//!
//! Ground elevation lookups reconciled across independent providers.
//!
//! An [`Aggregator`] queries every configured [`ElevationProvider`]
//! concurrently, retries each one independently under a
//! [`RetryPolicy`], and caches the reconciled [`ElevationSample`] on a
//! ~11 m grid for the life of the process.

mod aggregator;
mod error;
pub mod http;
pub mod provider;
mod retry;
mod sample;
pub mod services;

pub use crate::{
    aggregator::{Aggregator, AggregatorBuilder, CacheKey},
    error::{ElevationError, ProviderError},
    http::{HttpClient, ReqwestClient},
    provider::{BoxFuture, ElevationProvider},
    retry::RetryPolicy,
    sample::{aggregate, AggregationMethod, ElevationSample, ProviderOutcome, SampleStatus},
    services::{OpenElevation, OpenTopoData},
};
pub use geodesy::GeoPoint;
