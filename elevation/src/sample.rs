use crate::error::ProviderError;
use geodesy::GeoPoint;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spread between providers beyond which the aggregate is flagged
/// as unreliable (meters).
pub const DISAGREEMENT_THRESHOLD_M: f64 = 20.0;

/// How successful provider values are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    #[default]
    Mean,
    Median,
}

/// What one provider returned for a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderOutcome {
    Meters(f64),
    Failed(ProviderError),
}

impl ProviderOutcome {
    pub fn meters(&self) -> Option<f64> {
        match self {
            ProviderOutcome::Meters(m) => Some(*m),
            ProviderOutcome::Failed(_) => None,
        }
    }
}

impl From<Result<f64, ProviderError>> for ProviderOutcome {
    fn from(res: Result<f64, ProviderError>) -> Self {
        match res {
            Ok(m) if m.is_finite() => ProviderOutcome::Meters(m),
            Ok(m) => ProviderOutcome::Failed(ProviderError::InvalidResponse(format!(
                "non-finite elevation {m}"
            ))),
            Err(e) => ProviderOutcome::Failed(e),
        }
    }
}

/// Reconciled elevation for one cache cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevationSample {
    /// Grid point the providers were asked about.
    pub point: GeoPoint,

    pub per_provider: BTreeMap<String, ProviderOutcome>,

    /// Combined elevation, or `None` if every provider failed.
    pub aggregate: Option<f64>,

    pub method: AggregationMethod,

    /// At least two providers answered and they differ by more than
    /// [`DISAGREEMENT_THRESHOLD_M`].
    pub disagreement: bool,
}

/// What the host should do with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Ok,

    /// Providers disagree; the aggregate may be off near cliffs or
    /// water.
    Unreliable,

    /// Nothing came back; ask the user for manual entry.
    AllProvidersFailed,
}

impl ElevationSample {
    pub fn new(
        point: GeoPoint,
        per_provider: BTreeMap<String, ProviderOutcome>,
        method: AggregationMethod,
    ) -> Self {
        let values: Vec<f64> = per_provider
            .values()
            .filter_map(ProviderOutcome::meters)
            .collect();
        let disagreement = values.len() >= 2 && spread(&values) > DISAGREEMENT_THRESHOLD_M;
        let aggregate = aggregate(&values, method);

        if aggregate.is_none() {
            warn!(
                "all {} providers failed for {:.4},{:.4}",
                per_provider.len(),
                point.lat_deg,
                point.lon_deg
            );
        } else if disagreement {
            warn!(
                "providers disagree by {:.1} m at {:.4},{:.4}",
                spread(&values),
                point.lat_deg,
                point.lon_deg
            );
        }

        Self {
            point,
            per_provider,
            aggregate,
            method,
            disagreement,
        }
    }

    pub fn status(&self) -> SampleStatus {
        match (self.aggregate, self.disagreement) {
            (None, _) => SampleStatus::AllProvidersFailed,
            (Some(_), true) => SampleStatus::Unreliable,
            (Some(_), false) => SampleStatus::Ok,
        }
    }
}

/// Combines `values` with `method`, or `None` if `values` is empty.
pub fn aggregate(values: &[f64], method: AggregationMethod) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = values.len() as f64;
    match method {
        AggregationMethod::Mean => Some(values.iter().sum::<f64>() / n),
        AggregationMethod::Median => {
            let mut sorted = values.to_vec();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                Some((sorted[mid - 1] + sorted[mid]) / 2.0)
            } else {
                Some(sorted[mid])
            }
        }
    }
}

fn spread(values: &[f64]) -> f64 {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max - min
}
