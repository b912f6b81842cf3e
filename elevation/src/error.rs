use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// A single provider call failed.
///
/// These are recorded per provider and never abort a lookup.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0} not supported")]
    Unsupported(&'static str),
}

#[derive(Error, Debug)]
pub enum ElevationError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("duplicate provider id '{0}'")]
    DuplicateProvider(String),
}
