// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: ingest through the HTTP API, then build and dispatch
//! digests.
//!
//! Each test creates an isolated TestHarness with a temp SQLite store, a
//! frozen clock at 2026-03-01 22:00:00, and a mock or wiremock transport.

use std::sync::Arc;
use std::time::Instant;

use alertmail_config::model::EmailConfig;
use alertmail_core::types::parse_alert_time;
use alertmail_core::{AlertStore, AlertmailError, NotificationTransport};
use alertmail_gateway::{AppState, router};
use alertmail_notify::{DigestPipeline, HttpFormTransport, RecipientDirectory};
use alertmail_test_utils::{MockTransport, TestHarness};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIRECTORY: &str = r#"[
    {"name": "Alice", "e_name": "alice", "email": "alice@co.com"},
    {"name": "Bob", "e_name": "bob", "email": ""}
]"#;

fn pipeline(harness: &TestHarness, transport: Arc<dyn NotificationTransport>) -> DigestPipeline {
    DigestPipeline::assemble(
        harness.store.clone(),
        Arc::new(RecipientDirectory::load_or_empty(&harness.directory_path)),
        harness.config.email.fallback_address.clone(),
        harness.clock.clone(),
        transport,
    )
    .unwrap()
}

async fn ingest(harness: &TestHarness, message: &str, recipient: &str, alert_time: &str) {
    let state = AppState {
        store: harness.store.clone(),
        pipeline: pipeline(harness, harness.transport.clone()),
        config: Arc::new(harness.config.clone()),
        clock: harness.clock.clone(),
        start_time: Instant::now(),
    };
    let body = serde_json::json!({
        "message": message,
        "recipient": recipient,
        "alert_time": alert_time,
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/alerts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

fn window() -> (chrono::NaiveDateTime, chrono::NaiveDateTime) {
    (
        parse_alert_time("2026-03-01 19:00:00").unwrap(),
        parse_alert_time("2026-03-01 22:00:00").unwrap(),
    )
}

// ---- Resolved recipient plus unknown token ----

#[tokio::test]
async fn alice_gets_her_digest_and_unknown_token_falls_back() {
    let harness = TestHarness::builder()
        .with_directory(DIRECTORY)
        .build()
        .await
        .unwrap();
    ingest(&harness, "disk full on db-1", "alice", "2026-03-01 19:30:00").await;
    ingest(&harness, "cpu hot on web-2", "alice", "2026-03-01 21:15:00").await;
    ingest(&harness, "queue backlog", "zz99", "2026-03-01 20:00:00").await;

    let (start, end) = window();
    let summary = pipeline(&harness, harness.transport.clone())
        .run(start, end)
        .await
        .unwrap();

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.failure_count, 0);
    assert_eq!(summary.unresolved_tokens, vec!["zz99"]);
    assert!(summary.fallback_sent);

    let to_alice = harness.transport.sent_to("alice@co.com");
    assert_eq!(to_alice.len(), 1);
    assert_eq!(to_alice[0].subject, "Alert digest - alice - 2026-03-01");
    assert!(to_alice[0].body_html.contains("Alert #2"));
    assert!(!to_alice[0].body_html.contains("Alert #3"));

    let to_operator = harness.transport.sent_to("operator@alertmail.test");
    assert_eq!(to_operator.len(), 1);
    assert!(to_operator[0].subject.contains("zz99"));
    assert!(to_operator[0].body_html.contains("zz99 (1 alerts)"));
}

// ---- Fan-out and empty directory addresses ----

#[tokio::test]
async fn fanned_out_alert_reaches_each_token_once() {
    let harness = TestHarness::builder()
        .with_directory(DIRECTORY)
        .build()
        .await
        .unwrap();
    ingest(&harness, "certificate expiring", "alice，bob, carol@co.com", "2026-03-01 20:30:00").await;

    let (start, end) = window();
    let summary = pipeline(&harness, harness.transport.clone())
        .run(start, end)
        .await
        .unwrap();

    // bob has an empty address in the directory, so he falls back.
    assert_eq!(summary.unresolved_tokens, vec!["bob"]);
    assert_eq!(
        summary.succeeded_addresses,
        vec!["alice@co.com", "carol@co.com", "operator@alertmail.test"]
    );
    assert_eq!(harness.transport.sent().len(), 3);
}

// ---- Window boundaries ----

#[tokio::test]
async fn only_alerts_inside_the_window_are_sent() {
    let harness = TestHarness::builder()
        .with_directory(DIRECTORY)
        .build()
        .await
        .unwrap();
    ingest(&harness, "at start", "alice", "2026-03-01 19:00:00").await;
    ingest(&harness, "at end", "alice", "2026-03-01 22:00:00").await;
    ingest(&harness, "after end", "alice", "2026-03-01 22:00:01").await;
    ingest(&harness, "old one", "zz99", "2026-02-28 20:00:00").await;

    let (start, end) = window();
    let summary = pipeline(&harness, harness.transport.clone())
        .run(start, end)
        .await
        .unwrap();

    assert!(summary.unresolved_tokens.is_empty());
    let sent = harness.transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body_html.contains("at start"));
    assert!(sent[0].body_html.contains("at end"));
    assert!(!sent[0].body_html.contains("after end"));

    // The old token is still a known recipient; it just has nothing in this window.
    assert_eq!(
        harness.store.list_distinct_recipients().await.unwrap(),
        vec!["alice", "zz99"]
    );
}

// ---- Partial failure ----

#[tokio::test]
async fn failed_send_does_not_block_the_fallback() {
    let harness = TestHarness::builder()
        .with_directory(DIRECTORY)
        .with_transport(MockTransport::new().failing_for("alice@co.com"))
        .build()
        .await
        .unwrap();
    ingest(&harness, "disk full", "alice,zz99", "2026-03-01 20:00:00").await;

    let (start, end) = window();
    let err = pipeline(&harness, harness.transport.clone())
        .run(start, end)
        .await
        .unwrap_err();

    match err {
        AlertmailError::Delivery {
            attempted,
            failed,
            summary,
        } => {
            assert_eq!((attempted, failed), (2, 1));
            assert!(summary.fallback_sent);
            assert_eq!(summary.failed_addresses, vec!["alice@co.com"]);
        }
        other => panic!("expected Delivery error, got {other:?}"),
    }
    assert_eq!(harness.transport.attempts().len(), 2);
}

// ---- Real HTTP transport against a mock endpoint ----

#[tokio::test]
async fn http_transport_posts_one_form_per_notification() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("to_list=alice%40co.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":0,"message":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("to_list=operator%40alertmail.test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":200,"message":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let harness = TestHarness::builder()
        .with_directory(DIRECTORY)
        .build()
        .await
        .unwrap();
    ingest(&harness, "disk full", "alice,zz99", "2026-03-01 20:00:00").await;

    let transport = HttpFormTransport::new(&EmailConfig {
        api_url: format!("{}/send", server.uri()),
        app_id: "alertmail-e2e".into(),
        app_secret: Some("secret".into()),
        ..EmailConfig::default()
    })
    .unwrap();

    let (start, end) = window();
    let summary = pipeline(&harness, Arc::new(transport))
        .run(start, end)
        .await
        .unwrap();
    assert_eq!(summary.success_count, 2);
    assert!(harness.transport.attempts().is_empty());
}

// ---- Missing directory degrades to fallback ----

#[tokio::test]
async fn missing_directory_routes_everything_to_operator() {
    let harness = TestHarness::builder().build().await.unwrap();
    ingest(&harness, "disk full", "alice,bob", "2026-03-01 20:00:00").await;

    let (start, end) = window();
    let summary = pipeline(&harness, harness.transport.clone())
        .run(start, end)
        .await
        .unwrap();

    assert_eq!(summary.unresolved_tokens, vec!["alice", "bob"]);
    assert_eq!(summary.succeeded_addresses, vec!["operator@alertmail.test"]);
    assert_eq!(harness.transport.sent().len(), 1);
}
