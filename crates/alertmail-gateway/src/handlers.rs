// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the ingestion and query API.
//!
//! Successful responses share the envelope `{ "code": 200, "message": ..., ... }`.

use alertmail_config::model::CronConfig;
use alertmail_core::types::{format_alert_time, parse_alert_time, split_recipients};
use alertmail_core::{AlertRecord, AlertStore, DispatchSummary, HealthStatus, NewAlert, Pagination};
use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Success envelope; `body` fields are flattened next to `code` and `message`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub message: &'static str,
    #[serde(flatten)]
    pub body: T,
}

fn ok<T: Serialize>(message: &'static str, body: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        code: StatusCode::OK.as_u16(),
        message,
        body,
    }))
}

/// Request body for POST /api/v1/alerts.
#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    pub message: String,
    /// One token or a `,`/`，` separated list.
    pub recipient: String,
    /// `YYYY-MM-DD HH:MM:SS`; defaults to now.
    #[serde(default)]
    pub alert_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedAlerts {
    pub data: Vec<AlertRecord>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub page_size: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlertList {
    pub data: Vec<AlertRecord>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

/// Optional window bounds. Empty values count as missing.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Narrows a period query to one token. Ignored by the send endpoint.
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PeriodAlerts {
    pub data: Vec<AlertRecord>,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct RecipientQuery {
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipientAlerts {
    pub data: Vec<AlertRecord>,
    pub recipient: String,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RecipientList {
    pub data: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DigestRun {
    pub data: DispatchSummary,
    pub start_time: String,
    pub end_time: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Email settings as exposed by GET /config. The secret is never included.
#[derive(Debug, Serialize)]
pub struct EmailView {
    pub api_url: String,
    pub effective_api_url: String,
    pub app_id: String,
    pub app_secret_set: bool,
    pub from: String,
    pub debug_mode: bool,
    pub timeout_secs: u64,
    pub fallback_address: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub email: EmailView,
    pub cron: CronConfig,
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<NaiveDateTime>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_alert_time(v)
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{name} must use YYYY-MM-DD HH:MM:SS"))),
    }
}

/// Resolves query bounds, defaulting each missing one to today's scheduled window.
fn resolve_window(
    state: &AppState,
    query: &PeriodQuery,
) -> Result<(NaiveDateTime, NaiveDateTime), ApiError> {
    let start = parse_bound("start_time", query.start_time.as_deref())?;
    let end = parse_bound("end_time", query.end_time.as_deref())?;
    let (default_start, default_end) =
        alertmail_cron::window_for_date(&state.config.cron, state.clock.now().date())?;
    Ok((start.unwrap_or(default_start), end.unwrap_or(default_end)))
}

/// POST /api/v1/alerts
///
/// Fans the recipient field out into one record per token, stored atomically.
pub async fn create_alert(
    State(state): State<AppState>,
    payload: Result<Json<CreateAlertRequest>, JsonRejection>,
) -> ApiResult<CreatedAlerts> {
    let Json(req) = payload?;
    let alert_time = match parse_bound("alert_time", req.alert_time.as_deref())? {
        Some(t) => t,
        None => state.clock.now(),
    };
    let tokens = split_recipients(&req.recipient);
    let alerts = NewAlert::fan_out(&req.message, &tokens, alert_time)?;
    let created = state.store.insert_alerts(&alerts).await?;
    info!(
        recipients = %tokens.join(","),
        count = created.len(),
        alert_time = %format_alert_time(&alert_time),
        "alerts created"
    );
    let count = created.len();
    ok("alerts created", CreatedAlerts {
        data: created,
        count,
    })
}

/// GET /api/v1/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<AlertList> {
    let as_int = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
    let page = Pagination::normalized(as_int(&query.page), as_int(&query.page_size));
    let result = state.store.list_alerts(page).await?;
    ok("alerts listed", AlertList {
        data: result.alerts,
        total: result.total,
        page: page.page,
        size: page.page_size,
    })
}

/// GET /api/v1/alerts/period
pub async fn alerts_by_period(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<PeriodAlerts> {
    let (start, end) = resolve_window(&state, &query)?;
    let recipient = query
        .recipient
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    let alerts = match &recipient {
        Some(token) => {
            state
                .store
                .query_by_time_range_and_recipient(start, end, token)
                .await?
        }
        None => state.store.query_by_time_range(start, end).await?,
    };
    let total = alerts.len();
    ok("alerts listed", PeriodAlerts {
        data: alerts,
        start_time: format_alert_time(&start),
        end_time: format_alert_time(&end),
        recipient,
        total,
    })
}

/// GET /api/v1/alerts/recipient
pub async fn alerts_by_recipient(
    State(state): State<AppState>,
    Query(query): Query<RecipientQuery>,
) -> ApiResult<RecipientAlerts> {
    let recipient = query
        .recipient
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ApiError::bad_request("recipient must not be empty"))?
        .to_string();
    let alerts = state.store.query_by_recipient(&recipient).await?;
    let total = alerts.len();
    ok("alerts listed", RecipientAlerts {
        data: alerts,
        recipient,
        total,
    })
}

/// GET /api/v1/recipients
pub async fn list_recipients(State(state): State<AppState>) -> ApiResult<RecipientList> {
    let recipients = state.store.list_distinct_recipients().await?;
    let total = recipients.len();
    ok("recipients listed", RecipientList {
        data: recipients,
        total,
    })
}

/// POST /api/v1/digests/send
///
/// Runs the digest pipeline once. A partial send failure answers 502 with
/// the summary attached.
pub async fn send_digests(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<DigestRun> {
    let (start, end) = resolve_window(&state, &query)?;
    info!(%start, %end, "manual digest run requested");
    let summary = state.pipeline.run(start, end).await?;
    ok("digests sent", DigestRun {
        data: summary,
        start_time: format_alert_time(&start),
        end_time: format_alert_time(&end),
    })
}

/// GET /health
pub async fn get_health(State(state): State<AppState>) -> Response {
    let store = match state.store.health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };
    let status_code = match store {
        HealthStatus::Unhealthy(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };
    let detail = match &store {
        HealthStatus::Healthy => None,
        HealthStatus::Degraded(d) | HealthStatus::Unhealthy(d) => Some(d.clone()),
    };
    let status = if status_code == StatusCode::OK {
        "ok"
    } else {
        "unavailable"
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        store: store.label().to_string(),
        detail,
    };
    (status_code, Json(body)).into_response()
}

/// GET /config
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let email = &state.config.email;
    Json(ConfigResponse {
        email: EmailView {
            api_url: email.api_url.clone(),
            effective_api_url: email.effective_api_url().to_string(),
            app_id: email.app_id.clone(),
            app_secret_set: email.app_secret.as_deref().is_some_and(|s| !s.is_empty()),
            from: email.from.clone(),
            debug_mode: email.debug_mode,
            timeout_secs: email.timeout_secs,
            fallback_address: email.fallback_address.clone(),
        },
        cron: state.config.cron.clone(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;
    use crate::server::router;
    use alertmail_notify::{DigestPipeline, RecipientDirectory};
    use alertmail_test_utils::{MockTransport, TestHarness};
    use axum::body::Body;
    use axum::http::{Request, header};
    use serde_json::Value;
    use tower::ServiceExt;

    const DIRECTORY: &str = r#"[{"name":"Alice","e_name":"alice","email":"alice@co.com"}]"#;

    pub(crate) fn state_for(harness: &TestHarness) -> AppState {
        let directory = RecipientDirectory::load_or_empty(&harness.directory_path);
        let pipeline = DigestPipeline::assemble(
            harness.store.clone(),
            Arc::new(directory),
            harness.config.email.fallback_address.clone(),
            harness.clock.clone(),
            harness.transport.clone(),
        )
        .unwrap();
        AppState {
            store: harness.store.clone(),
            pipeline,
            config: Arc::new(harness.config.clone()),
            clock: harness.clock.clone(),
            start_time: Instant::now(),
        }
    }

    async fn harness() -> TestHarness {
        TestHarness::builder()
            .with_directory(DIRECTORY)
            .build()
            .await
            .unwrap()
    }

    async fn call(harness: &TestHarness, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state_for(harness)).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_alert_fans_out_recipients() {
        let harness = harness().await;
        let (status, json) = call(
            &harness,
            post_json(
                "/api/v1/alerts",
                serde_json::json!({
                    "message": "disk full",
                    "recipient": "alice, bob，carol@co.com,",
                    "alert_time": "2026-03-01 20:00:00"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["code"], 200);
        assert_eq!(json["count"], 3);
        assert_eq!(json["data"][0]["alert_time"], "2026-03-01 20:00:00");
        assert_eq!(
            harness.store.list_distinct_recipients().await.unwrap(),
            vec!["alice", "bob", "carol@co.com"]
        );
    }

    #[tokio::test]
    async fn create_alert_defaults_time_to_now() {
        let harness = harness().await;
        let (status, json) = call(
            &harness,
            post_json(
                "/api/v1/alerts",
                serde_json::json!({"message": "cpu hot", "recipient": "alice"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"][0]["alert_time"], "2026-03-01 22:00:00");
    }

    #[tokio::test]
    async fn create_alert_rejects_bad_input_without_persisting() {
        let harness = harness().await;
        let cases = [
            serde_json::json!({"message": "x", "recipient": " , ，"}),
            serde_json::json!({"message": "x", "recipient": "alice", "alert_time": "2026-03-01T20:00:00"}),
            serde_json::json!({"recipient": "alice"}),
        ];
        for body in cases {
            let (status, json) = call(&harness, post_json("/api/v1/alerts", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["code"], 400);
        }
        assert!(harness.store.list_distinct_recipients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_alerts_paginates_newest_first() {
        let harness = harness().await;
        for minute in 0..5 {
            harness
                .seed(&format!("alert {minute}"), "alice", &format!("2026-03-01 20:0{minute}:00"))
                .await
                .unwrap();
        }

        let (status, json) = call(&harness, get("/api/v1/alerts?page=2&page_size=2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total"], 5);
        assert_eq!(json["page"], 2);
        assert_eq!(json["size"], 2);
        assert_eq!(json["data"][0]["message"], "alert 2");
        assert_eq!(json["data"][1]["message"], "alert 1");

        let (_, json) = call(&harness, get("/api/v1/alerts?page=0&page_size=500")).await;
        assert_eq!(json["page"], 1);
        assert_eq!(json["size"], 20);
        assert_eq!(json["data"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn period_defaults_to_scheduled_window() {
        let harness = harness().await;
        harness.seed("inside", "alice", "2026-03-01 21:00:00").await.unwrap();
        harness.seed("before", "alice", "2026-03-01 10:00:00").await.unwrap();

        let (status, json) = call(&harness, get("/api/v1/alerts/period")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["start_time"], "2026-03-01 19:00:00");
        assert_eq!(json["end_time"], "2026-03-01 22:00:00");
        assert_eq!(json["total"], 1);
        assert_eq!(json["data"][0]["message"], "inside");

        let (_, json) = call(
            &harness,
            get("/api/v1/alerts/period?start_time=2026-03-01%2000:00:00"),
        )
        .await;
        assert_eq!(json["total"], 2);

        let (_, json) = call(
            &harness,
            get("/api/v1/alerts/period?start_time=2026-03-01%2000:00:00&recipient=bob"),
        )
        .await;
        assert_eq!(json["total"], 0);
        assert_eq!(json["recipient"], "bob");

        let (status, _) = call(&harness, get("/api/v1/alerts/period?end_time=yesterday")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recipient_query_matches_exact_token() {
        let harness = harness().await;
        harness.seed("one", "alice,Alice", "2026-03-01 21:00:00").await.unwrap();

        let (status, json) = call(&harness, get("/api/v1/alerts/recipient?recipient=alice")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["recipient"], "alice");
        assert_eq!(json["total"], 1);

        let (status, json) = call(&harness, get("/api/v1/alerts/recipient?recipient=")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "recipient must not be empty");
    }

    #[tokio::test]
    async fn recipients_are_distinct() {
        let harness = harness().await;
        harness.seed("a", "bob,alice", "2026-03-01 21:00:00").await.unwrap();
        harness.seed("b", "alice", "2026-03-01 21:05:00").await.unwrap();

        let (_, json) = call(&harness, get("/api/v1/recipients")).await;
        assert_eq!(json["total"], 2);
        assert_eq!(json["data"], serde_json::json!(["alice", "bob"]));
    }

    #[tokio::test]
    async fn manual_send_runs_the_pipeline() {
        let harness = harness().await;
        harness.seed("disk full", "alice,zz99", "2026-03-01 20:00:00").await.unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/digests/send")
            .body(Body::empty())
            .unwrap();
        let (status, json) = call(&harness, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["success_count"], 2);
        assert_eq!(json["data"]["unresolved_tokens"], serde_json::json!(["zz99"]));
        assert_eq!(harness.transport.sent_to("alice@co.com").len(), 1);
        assert_eq!(harness.transport.sent_to("operator@alertmail.test").len(), 1);
    }

    #[tokio::test]
    async fn manual_send_failure_reports_summary() {
        let harness = TestHarness::builder()
            .with_directory(DIRECTORY)
            .with_transport(MockTransport::new().failing_for("alice@co.com"))
            .build()
            .await
            .unwrap();
        harness.seed("disk full", "alice", "2026-03-01 20:00:00").await.unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/digests/send")
            .body(Body::empty())
            .unwrap();
        let (status, json) = call(&harness, request).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], 502);
        assert_eq!(json["data"]["failed_addresses"], serde_json::json!(["alice@co.com"]));
    }

    #[tokio::test]
    async fn health_reports_store_status() {
        let harness = harness().await;
        let (status, json) = call(&harness, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["store"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn config_hides_the_secret() {
        let mut harness = harness().await;
        harness.config.email.app_secret = Some("s3cret".into());
        let (status, json) = call(&harness, get("/config")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["email"]["app_secret_set"], true);
        assert_eq!(json["cron"]["schedule"], "0 22 * * *");
        assert!(!json.to_string().contains("s3cret"));
    }
}
