//! The datasource adapter exposed to the dashboard host.
//!
//! [`HawkularDatasource`] owns nothing but its connection settings and the
//! two injected capabilities. Every hook compiles requests with
//! [`query::compiler`](crate::query::compiler), runs them through the
//! [`RequestExecutor`] and shapes the results with
//! [`query::mapper`](crate::query::mapper).

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::InstanceSettings;
use crate::query::compiler::{self, BackendRequest};
use crate::query::mapper;
use crate::transport::{check_status, RequestExecutor, TransportError};
use crate::types::{
    MetricFindOptions, MetricOption, QueryOptions, QueryResponse, TestResult, TimeSeries,
};
use crate::variables::{expand_path, VariableResolver};

/// Errors surfaced to the host.
#[derive(Debug, thiserror::Error)]
pub enum DatasourceError {
    /// Request could not be executed or the backend rejected it.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Backend response did not match the expected shape.
    #[error("backend response parse error: {0}")]
    Parse(String),
    /// Request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Adapter between the host hooks and a Hawkular metrics backend.
#[derive(Clone)]
pub struct HawkularDatasource {
    settings: InstanceSettings,
    executor: Arc<dyn RequestExecutor>,
    resolver: Arc<dyn VariableResolver>,
}

impl std::fmt::Debug for HawkularDatasource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HawkularDatasource")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl HawkularDatasource {
    /// Create a datasource over injected executor and variable resolver.
    pub fn new(
        settings: InstanceSettings,
        executor: Arc<dyn RequestExecutor>,
        resolver: Arc<dyn VariableResolver>,
    ) -> Self {
        Self {
            settings,
            executor,
            resolver,
        }
    }

    /// Connection settings captured at construction.
    pub fn settings(&self) -> &InstanceSettings {
        &self.settings
    }

    /// Expand the placeholders of `path` with this datasource's resolver.
    pub fn resolve_variables(&self, path: &str) -> Vec<String> {
        expand_path(path, self.resolver.as_ref())
    }

    /// Run a panel query.
    ///
    /// One backend call is issued per queryable target; calls run
    /// concurrently but series are returned in target order. No call is
    /// made when nothing is queryable.
    ///
    /// # Errors
    ///
    /// Fails on the first transport error, non-2xx status, or malformed body.
    pub async fn query(&self, options: &QueryOptions) -> Result<QueryResponse, DatasourceError> {
        let compiled = compiler::compile(&self.settings, options, self.resolver.as_ref())?;
        if compiled.is_empty() {
            debug!(
                targets = options.targets.len(),
                "no queryable targets, skipping backend"
            );
            return Ok(QueryResponse::default());
        }

        info!(
            url = %self.settings.url,
            requests = compiled.len(),
            from = options.range.from,
            to = options.range.to,
            "querying backend"
        );

        let per_target = try_join_all(compiled.into_iter().map(|c| self.run(c))).await?;
        Ok(QueryResponse {
            data: per_target.into_iter().flatten().collect(),
        })
    }

    async fn run(&self, compiled: BackendRequest) -> Result<Vec<TimeSeries>, DatasourceError> {
        debug!(url = %compiled.request.url, ids = ?compiled.ids, "executing query");
        let response = self.executor.execute(compiled.request).await?;
        let response = check_status(response).inspect_err(|e| {
            warn!(target_name = %compiled.target.target, error = %e, "query rejected");
        })?;
        mapper::map_series(&response.body, &compiled.ids, &compiled.target.target)
    }

    /// Check connectivity against the backend status endpoint.
    ///
    /// Returns the success object only for a 200 answer, otherwise `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be delivered.
    pub async fn test_datasource(&self) -> Result<Option<TestResult>, DatasourceError> {
        let response = self
            .executor
            .execute(compiler::status_request(&self.settings))
            .await?;
        if response.status == 200 {
            info!(url = %self.settings.url, "datasource is working");
            return Ok(Some(TestResult::success()));
        }
        warn!(url = %self.settings.url, status = response.status, "status check failed");
        Ok(None)
    }

    /// Forward an annotation query and return the backend body as-is.
    ///
    /// # Errors
    ///
    /// Fails on transport error or non-2xx status.
    pub async fn annotation_query(&self, options: &Value) -> Result<Value, DatasourceError> {
        let request = compiler::annotations_request(&self.settings, options.clone());
        let response = check_status(self.executor.execute(request).await?)?;
        Ok(response.body)
    }

    /// List metrics of a kind for the query editor's autocomplete.
    ///
    /// # Errors
    ///
    /// Fails on transport error, non-2xx status, or malformed body.
    pub async fn metric_find_query(
        &self,
        options: &MetricFindOptions,
    ) -> Result<Vec<MetricOption>, DatasourceError> {
        let request = compiler::metrics_request(&self.settings, options.kind);
        let response = check_status(self.executor.execute(request).await?)?;
        let metrics = mapper::map_metric_options(&response.body)?;
        debug!(kind = %options.kind, count = metrics.len(), "listed metrics");
        Ok(metrics)
    }
}
