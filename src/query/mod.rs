//! Stateless translation between the host query model and backend wire format.
//!
//! - [`compiler`] turns host descriptors into [`HttpRequest`](crate::transport::HttpRequest)s.
//! - [`mapper`] turns backend JSON into host time series.
//!
//! The datasource connects the two through the injected executor.

pub mod compiler;
pub mod mapper;
