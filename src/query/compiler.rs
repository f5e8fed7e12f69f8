//! Host descriptor to backend request compilation.

use serde::Serialize;
use serde_json::Value;

use crate::config::InstanceSettings;
use crate::transport::{HttpRequest, TENANT_HEADER};
use crate::types::{MetricKind, QueryOptions, Target};
use crate::variables::{expand_path, VariableResolver};

/// JSON body POSTed to the raw and rate query endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryBody {
    /// Range start, epoch milliseconds.
    pub start: i64,
    /// Range end, epoch milliseconds.
    pub end: i64,
    /// Concrete metric identifiers.
    pub ids: Vec<String>,
}

/// One compiled backend call together with what produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Target the call was compiled from.
    pub target: Target,
    /// Identifiers after variable expansion, in expansion order.
    pub ids: Vec<String>,
    /// Request to hand to the executor.
    pub request: HttpRequest,
}

fn base_url(settings: &InstanceSettings) -> &str {
    settings.url.trim_end_matches('/')
}

fn with_tenant(request: HttpRequest, settings: &InstanceSettings) -> HttpRequest {
    request
        .header("Content-Type", "application/json")
        .header(TENANT_HEADER, settings.tenant.as_str())
}

/// Query endpoint for a metric kind, raw or rate.
pub fn query_endpoint(base: &str, kind: MetricKind, rate: bool) -> String {
    let mode = if rate { "rate" } else { "raw" };
    format!(
        "{}/{}/{mode}/query",
        base.trim_end_matches('/'),
        kind.endpoint_segment()
    )
}

/// Compile a single target, or `None` if it expands to no identifiers.
///
/// # Errors
///
/// Returns an error if the body cannot be encoded as JSON.
pub fn compile_target(
    settings: &InstanceSettings,
    options: &QueryOptions,
    target: &Target,
    resolver: &dyn VariableResolver,
) -> Result<Option<BackendRequest>, serde_json::Error> {
    let ids = expand_path(&target.target, resolver);
    if ids.is_empty() {
        return Ok(None);
    }

    let body = serde_json::to_value(QueryBody {
        start: options.range.from,
        end: options.range.to,
        ids: ids.clone(),
    })?;
    let url = query_endpoint(base_url(settings), target.kind, target.rate);
    let request = with_tenant(HttpRequest::post(url, body), settings);

    Ok(Some(BackendRequest {
        target: target.clone(),
        ids,
        request,
    }))
}

/// Compile every queryable target of `options`, in editor order.
///
/// Placeholder, blank and hidden targets are dropped.
///
/// # Errors
///
/// Returns an error if a body cannot be encoded as JSON.
pub fn compile(
    settings: &InstanceSettings,
    options: &QueryOptions,
    resolver: &dyn VariableResolver,
) -> Result<Vec<BackendRequest>, serde_json::Error> {
    let mut compiled = Vec::new();
    for target in options.targets.iter().filter(|t| t.is_queryable()) {
        if let Some(request) = compile_target(settings, options, target, resolver)? {
            compiled.push(request);
        }
    }
    Ok(compiled)
}

/// Connectivity check request.
pub fn status_request(settings: &InstanceSettings) -> HttpRequest {
    HttpRequest::get(format!("{}/status", base_url(settings)))
        .header(TENANT_HEADER, settings.tenant.as_str())
}

/// Metric listing request filtered by kind.
pub fn metrics_request(settings: &InstanceSettings, kind: MetricKind) -> HttpRequest {
    with_tenant(
        HttpRequest::get(format!("{}/metrics", base_url(settings))),
        settings,
    )
    .param("type", kind.as_str())
}

/// Annotation request forwarding the host options verbatim.
pub fn annotations_request(settings: &InstanceSettings, options: Value) -> HttpRequest {
    with_tenant(
        HttpRequest::post(format!("{}/annotations", base_url(settings)), options),
        settings,
    )
}
