//! `ReqwestExecutor` against a one-shot local HTTP server.

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use hawkular_datasource::transport::reqwest_executor::ReqwestExecutor;
use hawkular_datasource::transport::{HttpRequest, RequestExecutor, TransportError};

/// Read headers plus `Content-Length` bytes of body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let read = match tokio::time::timeout(Duration::from_secs(2), socket.read(&mut chunk)).await
        {
            Ok(Ok(n)) if n > 0 => n,
            _ => break,
        };
        buf.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&buf).into_owned();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve one response and hand back the raw request text.
async fn serve_once(
    status_line: &str,
    content_type: &str,
    body: &str,
) -> (String, oneshot::Receiver<String>) {
    let listener_result = TcpListener::bind("127.0.0.1:0").await;
    assert!(listener_result.is_ok());
    let listener = match listener_result {
        Ok(listener) => listener,
        Err(err) => panic!("listener should bind: {err}"),
    };

    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => panic!("listener should expose local addr: {err}"),
    };

    let (tx, rx) = oneshot::channel();
    let status_line_owned = status_line.to_owned();
    let content_type_owned = content_type.to_owned();
    let body_owned = body.to_owned();
    tokio::spawn(async move {
        let accepted = listener.accept().await;
        if let Ok((mut socket, _)) = accepted {
            let raw = read_request(&mut socket).await;
            let _ = tx.send(raw);

            let response = format!(
                "HTTP/1.1 {status_line_owned}\r\nContent-Type: {content_type_owned}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body_owned}",
                body_owned.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (format!("http://{addr}"), rx)
}

fn executor() -> ReqwestExecutor {
    match ReqwestExecutor::new(Duration::from_secs(5)) {
        Ok(executor) => executor,
        Err(err) => panic!("executor should build: {err}"),
    }
}

#[tokio::test]
async fn post_sends_headers_and_json_body() {
    let (base, raw_request) = serve_once(
        "200 OK",
        "application/json",
        r#"[{"id":"memory","data":[{"timestamp":13,"value":15}]}]"#,
    )
    .await;

    let request = HttpRequest::post(
        format!("{base}/gauges/raw/query"),
        json!({"start": 15, "end": 30, "ids": ["memory"]}),
    )
    .header("Content-Type", "application/json")
    .header("Hawkular-Tenant", "test-tenant");

    let response = executor()
        .execute(request)
        .await
        .expect("request should complete");
    assert_eq!(response.status, 200);
    assert_eq!(response.body[0]["id"], "memory");

    let raw = raw_request.await.expect("server should capture request");
    assert!(raw.starts_with("POST /gauges/raw/query HTTP/1.1"));
    assert!(raw.to_ascii_lowercase().contains("hawkular-tenant: test-tenant"));
    assert!(raw.contains(r#""ids":["memory"]"#));
}

#[tokio::test]
async fn get_appends_query_params() {
    let (base, raw_request) = serve_once("200 OK", "application/json", "[]").await;

    let request = HttpRequest::get(format!("{base}/metrics")).param("type", "counter");
    let response = executor()
        .execute(request)
        .await
        .expect("request should complete");
    assert_eq!(response.body, json!([]));

    let raw = raw_request.await.expect("server should capture request");
    assert!(raw.starts_with("GET /metrics?type=counter HTTP/1.1"));
}

#[tokio::test]
async fn error_status_is_returned_not_raised() {
    let (base, _raw) = serve_once("503 Service Unavailable", "text/plain", "starting up").await;

    let response = executor()
        .execute(HttpRequest::get(format!("{base}/status")))
        .await
        .expect("request should complete");
    assert_eq!(response.status, 503);
    assert_eq!(response.body, json!("starting up"));
}

#[tokio::test]
async fn empty_body_decodes_to_null() {
    let (base, _raw) = serve_once("204 No Content", "application/json", "").await;

    let response = executor()
        .execute(HttpRequest::get(format!("{base}/gauges/raw/query")))
        .await
        .expect("request should complete");
    assert_eq!(response.status, 204);
    assert!(response.body.is_null());
}

#[tokio::test]
async fn invalid_url_is_rejected_before_sending() {
    let result = executor().execute(HttpRequest::get("not a url")).await;
    assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
}

#[tokio::test]
async fn wraps_caller_supplied_client() {
    let (base, raw_request) = serve_once("200 OK", "application/json", "{}").await;

    let client = match reqwest::Client::builder()
        .user_agent("hawkular-datasource-test")
        .build()
    {
        Ok(client) => client,
        Err(err) => panic!("client should build: {err}"),
    };
    let response = ReqwestExecutor::with_client(client)
        .execute(HttpRequest::get(format!("{base}/status")))
        .await
        .expect("request should complete");
    assert_eq!(response.status, 200);

    let raw = raw_request.await.expect("server should capture request");
    assert!(raw
        .to_ascii_lowercase()
        .contains("user-agent: hawkular-datasource-test"));
}
