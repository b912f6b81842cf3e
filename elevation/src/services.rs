//! Public elevation web services.

use crate::{
    error::ProviderError,
    http::{HttpClient, ReqwestClient},
    provider::{BoxFuture, ElevationProvider},
};
use geodesy::GeoPoint;
use log::trace;
use serde::Deserialize;

pub const OPEN_ELEVATION_URL: &str = "https://api.open-elevation.com";
pub const OPEN_TOPO_DATA_URL: &str = "https://api.opentopodata.org";

/// Default OpenTopoData dataset.
pub const DEFAULT_DATASET: &str = "srtm30m";

/// The public OpenTopoData API rejects longer bulk requests.
pub const MAX_PROFILE_SAMPLES: usize = 100;

/// Body shared by both services:
/// `{"results": [{"elevation": 123.4, ...}], "error": "..."}`.
#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    results: Vec<LookupResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct LookupResult {
    elevation: Option<f64>,
}

fn parse_elevations(body: &[u8]) -> Result<Vec<f64>, ProviderError> {
    let response: LookupResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
    if let Some(msg) = response.error {
        return Err(ProviderError::InvalidResponse(msg));
    }
    if response.results.is_empty() {
        return Err(ProviderError::InvalidResponse("no results".into()));
    }
    response
        .results
        .into_iter()
        .map(|r| {
            r.elevation
                .filter(|m| m.is_finite())
                .ok_or_else(|| ProviderError::InvalidResponse("no data at location".into()))
        })
        .collect()
}

/// Host (and port) part of a base URL, used to tell instances apart.
fn host(base_url: &str) -> &str {
    let rest = base_url
        .split_once("://")
        .map_or(base_url, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

fn location(p: &GeoPoint) -> String {
    format!("{:.6},{:.6}", p.lat_deg, p.lon_deg)
}

/// [Open-Elevation](https://open-elevation.com) lookup API.
pub struct OpenElevation<C: HttpClient = ReqwestClient> {
    id: String,
    base_url: String,
    client: C,
}

impl OpenElevation {
    /// Client for the public instance.
    pub fn new() -> Result<Self, ProviderError> {
        Ok(Self::with_client(OPEN_ELEVATION_URL, ReqwestClient::new()?))
    }
}

impl<C: HttpClient> OpenElevation<C> {
    /// Client for a self-hosted instance, or a test double.
    pub fn with_client(base_url: impl Into<String>, client: C) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            id: format!("open-elevation@{}", host(&base_url)),
            base_url,
            client,
        }
    }

    fn url(&self, point: &GeoPoint) -> String {
        format!("{}/api/v1/lookup?locations={}", self.base_url, location(point))
    }
}

impl<C: HttpClient> ElevationProvider for OpenElevation<C> {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(&self, point: GeoPoint) -> BoxFuture<'_, Result<f64, ProviderError>> {
        Box::pin(async move {
            let body = self.client.get(&self.url(&point)).await?;
            let elevations = parse_elevations(&body)?;
            trace!("open-elevation: {elevations:?}");
            Ok(elevations[0])
        })
    }
}

/// [OpenTopoData](https://www.opentopodata.org) API for a single
/// dataset.
///
/// Also answers bulk profiles: the service interpolates `samples`
/// points between the two endpoints.
pub struct OpenTopoData<C: HttpClient = ReqwestClient> {
    id: String,
    base_url: String,
    dataset: String,
    client: C,
}

impl OpenTopoData {
    /// Client for `dataset` on the public instance.
    pub fn new(dataset: &str) -> Result<Self, ProviderError> {
        Ok(Self::with_client(
            OPEN_TOPO_DATA_URL,
            dataset,
            ReqwestClient::new()?,
        ))
    }
}

impl<C: HttpClient> OpenTopoData<C> {
    pub fn with_client(base_url: impl Into<String>, dataset: &str, client: C) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            id: format!("opentopodata/{dataset}@{}", host(&base_url)),
            base_url,
            dataset: dataset.to_owned(),
            client,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    fn url(&self, locations: &str) -> String {
        format!("{}/v1/{}?locations={locations}", self.base_url, self.dataset)
    }
}

impl<C: HttpClient> ElevationProvider for OpenTopoData<C> {
    fn id(&self) -> &str {
        &self.id
    }

    fn lookup(&self, point: GeoPoint) -> BoxFuture<'_, Result<f64, ProviderError>> {
        Box::pin(async move {
            let body = self.client.get(&self.url(&location(&point))).await?;
            let elevations = parse_elevations(&body)?;
            Ok(elevations[0])
        })
    }

    fn supports_profile(&self) -> bool {
        true
    }

    fn profile(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        n: usize,
    ) -> BoxFuture<'_, Result<Vec<f64>, ProviderError>> {
        Box::pin(async move {
            if !(2..=MAX_PROFILE_SAMPLES).contains(&n) {
                return Err(ProviderError::Unsupported("profile sample count"));
            }
            let locations = format!("{}|{}&samples={n}", location(&start), location(&end));
            let body = self.client.get(&self.url(&locations)).await?;
            let elevations = parse_elevations(&body)?;
            if elevations.len() != n {
                return Err(ProviderError::InvalidResponse(format!(
                    "expected {n} samples, got {}",
                    elevations.len()
                )));
            }
            Ok(elevations)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{host, OpenElevation, OpenTopoData};
    use crate::{
        aggregator::Aggregator, error::ProviderError, http::HttpClient,
        provider::ElevationProvider,
    };
    use approx::assert_relative_eq;
    use geodesy::GeoPoint;
    use std::sync::{Arc, Mutex};

    /// Returns the same body for every request and records the URLs.
    struct Canned {
        body: Result<Vec<u8>, ProviderError>,
        pub urls: Mutex<Vec<String>>,
    }

    impl Canned {
        pub fn ok(body: &str) -> Self {
            Self {
                body: Ok(body.as_bytes().to_vec()),
                urls: Mutex::new(Vec::new()),
            }
        }

        pub fn err(e: ProviderError) -> Self {
            Self {
                body: Err(e),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn last_url(&self) -> String {
            self.urls.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl HttpClient for Canned {
        async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
            self.urls.lock().unwrap().push(url.to_owned());
            self.body.clone()
        }
    }

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[tokio::test]
    async fn test_open_elevation_lookup() {
        let provider = OpenElevation::with_client(
            "http://localhost:8080/",
            Canned::ok(r#"{"results":[{"latitude":41.161758,"longitude":-8.583933,"elevation":117}]}"#),
        );
        let meters = provider.lookup(pt(41.161758, -8.583933)).await.unwrap();
        assert_eq!(meters, 117.0);
        assert_eq!(
            provider.client.last_url(),
            "http://localhost:8080/api/v1/lookup?locations=41.161758,-8.583933"
        );
        assert!(!provider.supports_profile());
    }

    #[tokio::test]
    async fn test_null_elevation_is_an_error() {
        let provider = OpenTopoData::with_client(
            "http://localhost",
            "etopo1",
            Canned::ok(r#"{"results":[{"elevation":null,"location":{"lat":0,"lng":0}}],"status":"OK"}"#),
        );
        let res = provider.lookup(pt(0.0, 0.0)).await;
        assert!(matches!(res, Err(ProviderError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_service_error_message() {
        let provider = OpenTopoData::with_client(
            "http://localhost",
            "nope",
            Canned::ok(r#"{"error":"Dataset 'nope' not in config.","status":"INVALID_REQUEST"}"#),
        );
        let res = provider.lookup(pt(1.0, 2.0)).await;
        assert_eq!(
            res,
            Err(ProviderError::InvalidResponse("Dataset 'nope' not in config.".into()))
        );
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let err = ProviderError::Status {
            status: 503,
            url: "http://localhost".into(),
        };
        let provider = OpenElevation::with_client("http://localhost", Canned::err(err.clone()));
        assert_eq!(provider.lookup(pt(1.0, 2.0)).await, Err(err));
    }

    #[tokio::test]
    async fn test_opentopodata_profile() {
        let provider = OpenTopoData::with_client(
            "http://localhost",
            "srtm90m",
            Canned::ok(r#"{"results":[{"elevation":10.0},{"elevation":12.5},{"elevation":11.0}],"status":"OK"}"#),
        );
        assert_eq!(provider.id(), "opentopodata/srtm90m@localhost");
        let profile = provider
            .profile(pt(10.0, 20.0), pt(10.1, 20.1), 3)
            .await
            .unwrap();
        assert_eq!(profile, vec![10.0, 12.5, 11.0]);
        assert_eq!(
            provider.client.last_url(),
            "http://localhost/v1/srtm90m?locations=10.000000,20.000000|10.100000,20.100000&samples=3"
        );
    }

    #[tokio::test]
    async fn test_profile_sample_count_checked() {
        let provider = OpenTopoData::with_client(
            "http://localhost",
            "srtm90m",
            Canned::ok(r#"{"results":[{"elevation":10.0}]}"#),
        );
        let short = provider.profile(pt(0.0, 0.0), pt(0.0, 1.0), 2).await;
        assert!(matches!(short, Err(ProviderError::InvalidResponse(_))));
        let long = provider.profile(pt(0.0, 0.0), pt(0.0, 1.0), 500).await;
        assert!(matches!(long, Err(ProviderError::Unsupported(_))));
        assert_eq!(provider.client.urls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_ids_name_the_instance() {
        assert_eq!(host("https://api.open-elevation.com"), "api.open-elevation.com");
        assert_eq!(host("http://localhost:8080/elev"), "localhost:8080");
        assert_eq!(host("localhost"), "localhost");
        let a = OpenElevation::with_client("http://a.example/", Canned::ok("{}"));
        let b = OpenElevation::with_client("http://b.example:8080", Canned::ok("{}"));
        assert_eq!(a.id(), "open-elevation@a.example");
        assert_eq!(b.id(), "open-elevation@b.example:8080");
    }

    #[tokio::test]
    async fn test_two_instances_of_one_service_both_count() {
        let low = OpenElevation::with_client(
            "http://a.example",
            Canned::ok(r#"{"results":[{"elevation":100}]}"#),
        );
        let high = OpenElevation::with_client(
            "http://b.example",
            Canned::ok(r#"{"results":[{"elevation":160}]}"#),
        );
        let agg = Aggregator::builder()
            .provider(Arc::new(low))
            .provider(Arc::new(high))
            .build()
            .unwrap();
        let sample = agg.lookup(&pt(46.5, 7.9)).await;
        assert_eq!(sample.per_provider.len(), 2);
        assert_relative_eq!(sample.aggregate.unwrap(), 130.0);
        assert!(sample.disagreement);
    }
}
