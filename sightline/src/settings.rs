use anyhow::{Context, Error as AnyError};
use elevation::{
    services::{DEFAULT_DATASET, OPEN_ELEVATION_URL, OPEN_TOPO_DATA_URL},
    AggregationMethod, Aggregator, ElevationProvider, OpenElevation, OpenTopoData,
    ReqwestClient, RetryPolicy,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, sync::Arc, time::Duration};

/// Settings file contents. Every field is optional.
///
/// ```json
/// {
///   "providers": [
///     { "kind": "open_elevation" },
///     { "kind": "open_topo_data", "dataset": "aster30m" }
///   ],
///   "method": "median",
///   "retries": 1,
///   "k_factor": 1.33
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub providers: Vec<ProviderSettings>,
    pub method: AggregationMethod,
    pub retries: u32,
    pub backoff_ms: u64,
    pub timeout_ms: u64,
    pub k_factor: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderSettings {
    OpenElevation {
        #[serde(default = "open_elevation_url")]
        url: String,
    },
    OpenTopoData {
        #[serde(default = "open_topo_data_url")]
        url: String,
        #[serde(default = "default_dataset")]
        dataset: String,
    },
}

fn open_elevation_url() -> String {
    OPEN_ELEVATION_URL.to_owned()
}

fn open_topo_data_url() -> String {
    OPEN_TOPO_DATA_URL.to_owned()
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_owned()
}

impl Default for Settings {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            providers: vec![
                ProviderSettings::OpenElevation {
                    url: open_elevation_url(),
                },
                ProviderSettings::OpenTopoData {
                    url: open_topo_data_url(),
                    dataset: default_dataset(),
                },
            ],
            method: AggregationMethod::default(),
            retries: retry.retries,
            backoff_ms: millis(retry.base_delay),
            timeout_ms: millis(retry.timeout),
            k_factor: propah::DEFAULT_K_FACTOR,
            samples: terrain::DEFAULT_SAMPLES,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, AnyError> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            base_delay: Duration::from_millis(self.backoff_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    pub fn aggregator(&self) -> Result<Aggregator, AnyError> {
        let client = ReqwestClient::with_timeout(Duration::from_millis(self.timeout_ms))?;
        let mut builder = Aggregator::builder()
            .method(self.method)
            .retry(self.retry_policy());
        for provider in &self.providers {
            let provider: Arc<dyn ElevationProvider> = match provider {
                ProviderSettings::OpenElevation { url } => {
                    Arc::new(OpenElevation::with_client(url.as_str(), client.clone()))
                }
                ProviderSettings::OpenTopoData { url, dataset } => Arc::new(
                    OpenTopoData::with_client(url.as_str(), dataset, client.clone()),
                ),
            };
            builder = builder.provider(provider);
        }
        Ok(builder.build()?)
    }
}
