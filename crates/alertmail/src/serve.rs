// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `alertmail serve` and `alertmail send` implementations.
//!
//! Both build the same components from config: the SQLite store, the
//! recipient directory, the HTTP transport, and the digest pipeline.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use alertmail_config::AlertmailConfig;
use alertmail_config::model::LogConfig;
use alertmail_core::types::format_alert_time;
use alertmail_core::{
    AlertmailError, Clock, DispatchSummary, HealthStatus, NotificationTransport, PluginAdapter,
    SystemClock,
};
use alertmail_cron::DigestScheduler;
use alertmail_gateway::AppState;
use alertmail_notify::{DigestPipeline, HttpFormTransport, RecipientDirectory};
use alertmail_storage::SqliteAlertStore;
use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use crate::shutdown;

/// Everything a run needs, wired from config.
struct Components {
    store: Arc<SqliteAlertStore>,
    transport: Arc<HttpFormTransport>,
    pipeline: DigestPipeline,
    clock: Arc<dyn Clock>,
}

async fn build_components(config: &AlertmailConfig) -> Result<Components, AlertmailError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store = SqliteAlertStore::new(config.storage.clone()).with_clock(clock.clone());
    store.initialize().await?;
    let store = Arc::new(store);

    let directory = RecipientDirectory::load_or_empty(Path::new(&config.directory.path));

    let transport = Arc::new(HttpFormTransport::new(&config.email)?);
    match transport.health_check().await {
        Ok(HealthStatus::Healthy) => {}
        Ok(status) => warn!(status = ?status, "notification transport is not fully configured"),
        Err(e) => warn!(error = %e, "notification transport health check failed"),
    }

    let pipeline = DigestPipeline::assemble(
        store.clone(),
        Arc::new(directory),
        config.email.fallback_address.clone(),
        clock.clone(),
        transport.clone() as Arc<dyn NotificationTransport>,
    )?;

    Ok(Components {
        store,
        transport,
        pipeline,
        clock,
    })
}

async fn shutdown_adapters(components: &Components) {
    if let Err(e) = components.store.shutdown().await {
        warn!(error = %e, "alert store shutdown failed");
    }
    if let Err(e) = components.transport.shutdown().await {
        warn!(error = %e, "transport shutdown failed");
    }
}

/// Runs the `alertmail serve` command.
///
/// Serves the HTTP API and, when enabled, the digest scheduler until SIGINT
/// or SIGTERM.
pub async fn run_serve(config: AlertmailConfig) -> Result<(), AlertmailError> {
    init_tracing(&config.log);
    info!(version = env!("CARGO_PKG_VERSION"), "starting alertmail serve");

    let components = build_components(&config).await?;
    let cancel = shutdown::install_signal_handler();

    let scheduler_handle = if config.cron.enabled {
        let scheduler = DigestScheduler::new(
            &config.cron,
            components.pipeline.clone(),
            components.clock.clone(),
        )?;
        Some(scheduler.spawn(cancel.clone()))
    } else {
        info!("digest scheduler disabled");
        None
    };

    let config = Arc::new(config);
    let state = AppState {
        store: components.store.clone(),
        pipeline: components.pipeline.clone(),
        config: config.clone(),
        clock: components.clock.clone(),
        start_time: Instant::now(),
    };

    let served = alertmail_gateway::start_server(&config.server, state, cancel.clone()).await;
    // The server may also stop on its own error; take the scheduler down with it.
    cancel.cancel();

    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "digest scheduler task failed");
        }
    }
    shutdown_adapters(&components).await;

    served?;
    info!("alertmail serve shutdown complete");
    Ok(())
}

/// Runs the `alertmail send` command: one pipeline run over the given bounds,
/// each defaulting to today's configured window.
pub async fn run_send(
    config: AlertmailConfig,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> Result<DispatchSummary, AlertmailError> {
    init_tracing(&config.log);

    let components = build_components(&config).await?;
    let (default_start, default_end) =
        alertmail_cron::window_for_date(&config.cron, components.clock.now().date())?;
    let start = start.unwrap_or(default_start);
    let end = end.unwrap_or(default_end);
    info!(
        start = %format_alert_time(&start),
        end = %format_alert_time(&end),
        "running digest pipeline once"
    );

    let result = components.pipeline.run(start, end).await;
    shutdown_adapters(&components).await;
    result
}

/// Initializes the tracing subscriber from the `[log]` section.
///
/// `RUST_LOG` overrides the configured level.
fn init_tracing(log: &LogConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("alertmail={0},tower_http={0},warn", log.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);

    let result = if log.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("alertmail: tracing already initialized: {e}");
    }
}
