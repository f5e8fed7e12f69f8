//! Host-facing data model.
//!
//! These types mirror the shapes the dashboard host hands to a data source
//! (`QueryOptions`, `Target`) and the shapes it expects back (`QueryResponse`,
//! `TimeSeries`, `MetricOption`). Serde names follow the host's JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name the host's query editor gives to a target nobody has filled in yet.
pub const PLACEHOLDER_TARGET: &str = "select metric";

// ---------------------------------------------------------------------------
// Query input
// ---------------------------------------------------------------------------

/// Kind of metric stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Absolute sampled values.
    Gauge,
    /// Monotonically increasing counters.
    Counter,
}

impl MetricKind {
    /// Path segment the backend uses for this kind (`gauges`, `counters`).
    pub fn endpoint_segment(self) -> &'static str {
        match self {
            Self::Gauge => "gauges",
            Self::Counter => "counters",
        }
    }

    /// Value of the `type` filter on the metric listing endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric kind '{0}', expected 'gauge' or 'counter'")]
pub struct UnknownMetricKind(pub String);

impl FromStr for MetricKind {
    type Err = UnknownMetricKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gauge" | "gauges" => Ok(Self::Gauge),
            "counter" | "counters" => Ok(Self::Counter),
            _ => Err(UnknownMetricKind(s.to_owned())),
        }
    }
}

/// Dashboard time range in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Range start.
    pub from: i64,
    /// Range end.
    pub to: i64,
}

/// A single query row from the dashboard panel editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Metric identifier, possibly containing `$name` placeholders.
    pub target: String,
    /// Metric kind, selects the backend endpoint.
    #[serde(rename = "type")]
    pub kind: MetricKind,
    /// Query rate-of-change values instead of raw samples.
    #[serde(default)]
    pub rate: bool,
    /// Hidden rows stay in the editor but are not queried.
    #[serde(default)]
    pub hide: bool,
}

impl Target {
    /// Build a visible target.
    pub fn new(target: impl Into<String>, kind: MetricKind, rate: bool) -> Self {
        Self {
            target: target.into(),
            kind,
            rate,
            hide: false,
        }
    }

    /// Whether this target should be sent to the backend at all.
    pub fn is_queryable(&self) -> bool {
        !self.hide && !self.target.trim().is_empty() && self.target != PLACEHOLDER_TARGET
    }
}

/// Options the host passes to `query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Requested time range.
    pub range: TimeRange,
    /// Panel targets in editor order.
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// Options the host passes to `metricFindQuery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFindOptions {
    /// Kind of metric to list.
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

// ---------------------------------------------------------------------------
// Query output
// ---------------------------------------------------------------------------

/// One point of a time series, serialised as `[value, timestamp]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, i64)", into = "(f64, i64)")]
pub struct Datapoint {
    /// Sample value.
    pub value: f64,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl Datapoint {
    /// Create a datapoint.
    pub fn new(value: f64, timestamp: i64) -> Self {
        Self { value, timestamp }
    }
}

impl From<(f64, i64)> for Datapoint {
    fn from((value, timestamp): (f64, i64)) -> Self {
        Self { value, timestamp }
    }
}

impl From<Datapoint> for (f64, i64) {
    fn from(point: Datapoint) -> Self {
        (point.value, point.timestamp)
    }
}

/// A named series of datapoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Series name shown in the panel legend.
    pub target: String,
    /// Points in backend order.
    pub datapoints: Vec<Datapoint>,
}

/// Result of `query`, read by the host as `result.data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// All series, grouped by target in editor order.
    pub data: Vec<TimeSeries>,
}

impl QueryResponse {
    /// Whether no series were returned.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Autocomplete entry returned by `metricFindQuery`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricOption {
    /// Label shown to the user.
    pub text: String,
    /// Value inserted into the target.
    pub value: String,
}

/// Success object returned by the connectivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Always `"success"`.
    pub status: String,
    /// Human-readable message.
    pub message: String,
    /// Short title for the host notification.
    pub title: String,
}

impl TestResult {
    /// The success object reported when the backend status endpoint answers 200.
    pub fn success() -> Self {
        Self {
            status: "success".to_owned(),
            message: "Data source is working".to_owned(),
            title: "Success".to_owned(),
        }
    }
}
