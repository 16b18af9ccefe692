//! End-to-end delivery through the reqwest transport against a mock endpoint.

use std::collections::BTreeMap;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use dayflow_relay::config::WebhookConfig;
use dayflow_relay::delivery::{
    AttemptError, DeliveryResult, DeliverySender, ReqwestTransport, RetryPolicy,
};
use dayflow_relay::queue::PersistentQueue;
use dayflow_relay::relay::{DeliveryOutcome, FlushReport, Relay};
use serde_json::json;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(Duration::from_millis(5), Duration::from_millis(20), 2, max_attempts)
}

fn sender(url: String, headers: &[(&str, &str)], max_attempts: u32) -> DeliverySender<ReqwestTransport> {
    let mut config = WebhookConfig::new(url);
    config.headers = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<BTreeMap<_, _>>();
    let transport = ReqwestTransport::new(Duration::from_secs(5))
        .unwrap_or_else(|e| panic!("transport: {e}"));
    DeliverySender::new(&config, transport)
        .unwrap_or_else(|e| panic!("sender: {e}"))
        .with_policy(fast_policy(max_attempts))
}

async fn send(sender: &DeliverySender<ReqwestTransport>, payload: &str) -> DeliveryResult {
    sender
        .send(payload)
        .await
        .unwrap_or_else(|e| panic!("send: {e}"))
}

// ── Request shape ────────────────────────────────────────────────

#[tokio::test]
async fn posts_json_envelope_with_custom_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("content-type", "application/json"))
        .and(header("x-api-key", "secret"))
        .and(body_partial_json(json!({"payload": "hello"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let sender = sender(format!("{}/hook", server.uri()), &[("X-Api-Key", "secret")], 3);
    let result = send(&sender, "hello").await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.attempt_count, 1);
    assert_eq!(result.status_code, Some(200));

    let requests = server.received_requests().await.unwrap_or_default();
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).unwrap_or_else(|e| panic!("body: {e}"));
    assert!(body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
}

// ── Retry behaviour ──────────────────────────────────────────────

#[tokio::test]
async fn retries_until_endpoint_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let sender = sender(server.uri(), &[], 3);
    let result = send(&sender, "retry me").await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.attempt_count, 3);
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(3));
}

#[tokio::test]
async fn persistent_failure_reports_last_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let sender = sender(server.uri(), &[], 3);
    let result = send(&sender, "doomed").await;

    assert!(!result.success);
    assert_eq!(result.attempt_count, 3);
    assert_eq!(result.status_code, Some(503));
    assert_eq!(result.error, Some(AttemptError::Http(503)));
}

/// An address nothing is listening on: bind an ephemeral port, then release it.
fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap_or_else(|e| panic!("bind: {e}"));
    listener
        .local_addr()
        .unwrap_or_else(|e| panic!("local_addr: {e}"))
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let sender = sender(format!("http://{}/hook", closed_address()), &[], 2);
    let result = send(&sender, "nobody home").await;

    assert!(!result.success);
    assert_eq!(result.attempt_count, 2);
    assert_eq!(result.status_code, None);
    assert!(matches!(result.error, Some(AttemptError::Network(_))), "{result:?}");
}

// ── Queue round trip ─────────────────────────────────────────────

#[tokio::test]
async fn undeliverable_payload_survives_until_flush() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"payload": "parked"})))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
    let queue = PersistentQueue::open(dir.path().join("queue")).unwrap_or_else(|e| panic!("queue: {e}"));
    let relay = Relay::new(sender(server.uri(), &[], 2), queue);

    let outcome = relay
        .deliver_or_enqueue("parked".to_string())
        .await
        .unwrap_or_else(|e| panic!("deliver: {e}"));
    assert_eq!(outcome, DeliveryOutcome::Queued);
    assert_eq!(relay.queue().count().ok(), Some(1));

    let report = relay
        .flush(&CancellationToken::new())
        .await
        .unwrap_or_else(|e| panic!("flush: {e}"));
    assert_eq!(
        report,
        FlushReport {
            delivered: 1,
            requeued: 0,
            lost: 0
        }
    );
    assert_eq!(relay.queue().count().ok(), Some(0));
}
