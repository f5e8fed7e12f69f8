//! Connectivity check, metric listing and annotation hooks.

use std::sync::Arc;

use serde_json::json;

use hawkular_datasource::datasource::DatasourceError;
use hawkular_datasource::transport::{HttpResponse, Method, TransportError, TENANT_HEADER};
use hawkular_datasource::types::{MetricFindOptions, MetricKind, TestResult};
use hawkular_datasource::variables::{ReplaceResolver, TemplateVariables};

use crate::support::{datasource, RecordingExecutor, BASE_URL, TENANT};

#[tokio::test]
async fn test_datasource_succeeds_on_200() {
    let executor = RecordingExecutor::new(|_| Ok(HttpResponse::new(200, json!({"status": "STARTED"}))));
    let ds = datasource(Arc::clone(&executor), Arc::new(TemplateVariables::new()));

    let result = ds.test_datasource().await.expect("check should complete");
    assert_eq!(result, Some(TestResult::success()));

    let requests = executor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(requests[0].url, format!("{BASE_URL}/status"));
}

#[tokio::test]
async fn test_datasource_reports_nothing_on_other_status() {
    for status in [201, 401, 503] {
        let executor = RecordingExecutor::new(move |_| Ok(HttpResponse::new(status, json!(null))));
        let ds = datasource(Arc::clone(&executor), Arc::new(TemplateVariables::new()));
        let result = ds.test_datasource().await.expect("check should complete");
        assert_eq!(result, None, "status {status} must not report success");
    }
}

#[tokio::test]
async fn test_datasource_propagates_transport_error() {
    let executor =
        RecordingExecutor::new(|_| Err(TransportError::InvalidUrl("bad".to_owned())));
    let ds = datasource(Arc::clone(&executor), Arc::new(TemplateVariables::new()));
    assert!(ds.test_datasource().await.is_err());
}

#[tokio::test]
async fn metric_find_query_lists_ids_of_requested_type() {
    let executor = RecordingExecutor::new(|_| {
        Ok(HttpResponse::new(
            200,
            json!([{"id": "memory", "type": "gauge"}, {"id": "cpu", "type": "gauge"}]),
        ))
    });
    let ds = datasource(Arc::clone(&executor), Arc::new(TemplateVariables::new()));

    let metrics = ds
        .metric_find_query(&MetricFindOptions {
            kind: MetricKind::Gauge,
        })
        .await
        .expect("listing should succeed");

    let ids: Vec<&str> = metrics.iter().map(|m| m.value.as_str()).collect();
    assert_eq!(ids, vec!["memory", "cpu"]);
    assert!(metrics.iter().all(|m| m.text == m.value));

    let requests = executor.requests();
    assert_eq!(requests[0].url, format!("{BASE_URL}/metrics"));
    assert_eq!(
        requests[0].params,
        vec![("type".to_owned(), "gauge".to_owned())]
    );
    assert_eq!(requests[0].header_value(TENANT_HEADER), Some(TENANT));
}

#[tokio::test]
async fn metric_find_query_rejects_error_status() {
    let executor = RecordingExecutor::new(|_| Ok(HttpResponse::new(403, json!("forbidden"))));
    let ds = datasource(Arc::clone(&executor), Arc::new(TemplateVariables::new()));

    let result = ds
        .metric_find_query(&MetricFindOptions {
            kind: MetricKind::Counter,
        })
        .await;
    assert!(matches!(
        result,
        Err(DatasourceError::Transport(TransportError::HttpStatus { status: 403, .. }))
    ));
}

#[tokio::test]
async fn annotation_query_returns_backend_body() {
    let annotations = json!([{"annotation": "deploy", "time": 1000, "title": "v1.2"}]);
    let reply = annotations.clone();
    let executor = RecordingExecutor::new(move |_| Ok(HttpResponse::new(200, reply.clone())));
    let ds = datasource(Arc::clone(&executor), Arc::new(TemplateVariables::new()));

    let options = json!({"range": {"from": 1, "to": 2}, "annotation": {"name": "deploy"}});
    let result = ds
        .annotation_query(&options)
        .await
        .expect("annotations should load");
    assert_eq!(result, annotations);

    let requests = executor.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].url, format!("{BASE_URL}/annotations"));
    assert_eq!(requests[0].body, Some(options));
}

#[test]
fn resolve_variables_uses_injected_resolver() {
    let executor = RecordingExecutor::new(|_| panic!("no request expected"));
    let resolver = ReplaceResolver::new(|token: &str| {
        assert_eq!(token, "$app");
        "{app_1,app_2}".to_owned()
    });
    let ds = datasource(executor, Arc::new(resolver));

    assert_eq!(
        ds.resolve_variables("$app/memory/usage"),
        vec!["app_1/memory/usage", "app_2/memory/usage"]
    );
    assert_eq!(ds.settings().tenant, TENANT);
}
