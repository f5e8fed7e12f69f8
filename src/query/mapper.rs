//! Backend JSON to host time series mapping.

use serde::Deserialize;
use serde_json::Value;

use crate::datasource::DatasourceError;
use crate::types::{Datapoint, MetricOption, TimeSeries};

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// One series of a raw or rate query response.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct SeriesPayload {
    /// Metric identifier, absent on some single-id responses.
    #[serde(default)]
    pub id: Option<String>,
    /// Samples in backend order.
    pub data: Vec<SamplePayload>,
}

/// A `{timestamp, value}` sample.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct SamplePayload {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Sample value; `null` for empty buckets.
    #[serde(default)]
    pub value: Option<f64>,
}

/// An entry of the metric listing response.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct MetricDefinition {
    /// Metric identifier.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Map a query response into named series.
///
/// Each series is named after its `id`. Without one, the request id at the
/// same position is used, but only when the backend answered with exactly
/// one series per requested id; a shorter or longer answer gives no
/// reliable pairing and such series fall back to `fallback`. A `null` body
/// (204 No Content) has no series.
///
/// # Errors
///
/// Returns `DatasourceError::Parse` if the body is not an array of series.
pub fn map_series(
    body: &Value,
    ids: &[String],
    fallback: &str,
) -> Result<Vec<TimeSeries>, DatasourceError> {
    if body.is_null() {
        return Ok(Vec::new());
    }
    let payload = Vec::<SeriesPayload>::deserialize(body)
        .map_err(|e| DatasourceError::Parse(format!("query response: {e}")))?;
    let positional = payload.len() == ids.len();

    Ok(payload
        .into_iter()
        .enumerate()
        .map(|(idx, series)| {
            let target = series
                .id
                .or_else(|| ids.get(idx).filter(|_| positional).cloned())
                .unwrap_or_else(|| fallback.to_owned());
            TimeSeries {
                target,
                datapoints: to_datapoints(series.data),
            }
        })
        .collect())
}

/// Convert samples to `[value, timestamp]` points, skipping empty buckets.
pub fn to_datapoints(samples: Vec<SamplePayload>) -> Vec<Datapoint> {
    samples
        .into_iter()
        .filter_map(|s| s.value.map(|value| Datapoint::new(value, s.timestamp)))
        .collect()
}

/// Map a metric listing response into autocomplete options.
///
/// # Errors
///
/// Returns `DatasourceError::Parse` if the body is not an array of definitions.
pub fn map_metric_options(body: &Value) -> Result<Vec<MetricOption>, DatasourceError> {
    if body.is_null() {
        return Ok(Vec::new());
    }
    let definitions = Vec::<MetricDefinition>::deserialize(body)
        .map_err(|e| DatasourceError::Parse(format!("metric listing: {e}")))?;
    Ok(definitions
        .into_iter()
        .map(|d| MetricOption {
            text: d.id.clone(),
            value: d.id,
        })
        .collect())
}
