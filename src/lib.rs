//! Hawkular datasource: a dashboard adapter for Hawkular-style metrics backends.
//!
//! Translates a dashboard query model (targets, time range, template
//! variables) into backend HTTP requests and maps the JSON responses back
//! into `[value, timestamp]` time series.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod types;

pub mod query;
pub mod transport;
pub mod variables;

pub mod datasource;

pub use datasource::{DatasourceError, HawkularDatasource};
