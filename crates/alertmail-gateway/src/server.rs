// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use alertmail_config::AlertmailConfig;
use alertmail_config::model::ServerConfig;
use alertmail_core::{AlertStore, AlertmailError, Clock};
use alertmail_notify::DigestPipeline;
use axum::{
    Router,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Alert store for ingestion and queries.
    pub store: Arc<dyn AlertStore>,
    /// Digest pipeline behind the manual send endpoint.
    pub pipeline: DigestPipeline,
    /// Effective configuration (window defaults, `/config`).
    pub config: Arc<AlertmailConfig>,
    pub clock: Arc<dyn Clock>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

/// All routes with request tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/api/v1/alerts",
            post(handlers::create_alert).get(handlers::list_alerts),
        )
        .route("/api/v1/alerts/period", get(handlers::alerts_by_period))
        .route("/api/v1/alerts/recipient", get(handlers::alerts_by_recipient))
        .route("/api/v1/recipients", get(handlers::list_recipients))
        .route("/api/v1/digests/send", post(handlers::send_digests));

    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/config", get(handlers::get_config))
        .merge(api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).latency_unit(
                    tower_http::LatencyUnit::Millis,
                )),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `host:port` and serves until `cancel` fires, then drains in-flight
/// requests.
pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), AlertmailError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AlertmailError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(%addr, "gateway server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| AlertmailError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway server stopped");
    Ok(())
}
