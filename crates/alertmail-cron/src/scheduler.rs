// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The recurring digest job.
//!
//! One job, one schedule. Each fire computes today's window and runs the
//! digest pipeline for it. Runs never overlap: the next fire is computed only
//! after the previous run has finished.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use alertmail_config::model::CronConfig;
use alertmail_core::{AlertmailError, Clock, DispatchSummary};
use alertmail_notify::DigestPipeline;
use chrono::{Local, NaiveDateTime, TimeZone};
use croner::Cron;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::window::DailyWindow;

/// Parses a cron expression, mapping failures to [`AlertmailError::Schedule`].
pub fn parse_schedule(expression: &str) -> Result<Cron, AlertmailError> {
    Cron::from_str(expression)
        .map_err(|e| AlertmailError::Schedule(format!("invalid schedule '{expression}': {e}")))
}

pub struct DigestScheduler {
    schedule: Cron,
    expression: String,
    window: DailyWindow,
    pipeline: DigestPipeline,
    clock: Arc<dyn Clock>,
}

impl DigestScheduler {
    /// Fails if the schedule or window is invalid. Both are startup errors.
    pub fn new(
        config: &CronConfig,
        pipeline: DigestPipeline,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AlertmailError> {
        Ok(Self {
            schedule: parse_schedule(&config.schedule)?,
            expression: config.schedule.clone(),
            window: DailyWindow::from_config(config)?,
            pipeline,
            clock,
        })
    }

    /// First fire strictly after `after`, in local time.
    pub fn next_fire_after(&self, after: NaiveDateTime) -> Result<NaiveDateTime, AlertmailError> {
        let local = Local
            .from_local_datetime(&after)
            .earliest()
            .ok_or_else(|| AlertmailError::Schedule(format!("{after} does not exist in local time")))?;
        self.schedule
            .find_next_occurrence(&local, false)
            .map(|next| next.naive_local())
            .map_err(|e| {
                AlertmailError::Schedule(format!("no next fire for '{}': {e}", self.expression))
            })
    }

    /// One fire: today's window through the pipeline.
    pub async fn run_once(&self, now: NaiveDateTime) -> Result<DispatchSummary, AlertmailError> {
        let (start, end) = self.window.on(now.date());
        let started = Instant::now();
        let result = self.pipeline.run(start, end).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(summary) => info!(
                %start,
                %end,
                success = summary.success_count,
                failed = summary.failure_count,
                duration_ms,
                "scheduled digest run finished"
            ),
            Err(AlertmailError::Delivery {
                attempted, failed, ..
            }) => warn!(
                %start,
                %end,
                attempted,
                failed,
                duration_ms,
                "scheduled digest run finished with failed sends"
            ),
            Err(e) => error!(%start, %end, duration_ms, error = %e, "scheduled digest run failed"),
        }
        result
    }

    /// Runs until `cancel` fires. Run errors are logged and never end the loop;
    /// an in-progress run is finished before cancellation is observed.
    pub async fn run(self, cancel: CancellationToken) {
        info!(schedule = %self.expression, "digest scheduler started");
        loop {
            let now = self.clock.now();
            let next = match self.next_fire_after(now) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "digest scheduler stopping");
                    break;
                }
            };
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_fire = %next, "next digest run scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let _ = self.run_once(self.clock.now()).await;
                }
                _ = cancel.cancelled() => {
                    info!("digest scheduler shutting down");
                    break;
                }
            }
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertmail_core::types::parse_alert_time;
    use alertmail_core::SystemClock;
    use alertmail_notify::RecipientDirectory;
    use alertmail_test_utils::{MockTransport, TestHarness};

    fn at(s: &str) -> NaiveDateTime {
        parse_alert_time(s).unwrap()
    }

    fn pipeline_for(harness: &TestHarness, directory: RecipientDirectory) -> DigestPipeline {
        DigestPipeline::assemble(
            harness.store.clone(),
            Arc::new(directory),
            "ops@co.com",
            harness.clock.clone(),
            harness.transport.clone(),
        )
        .unwrap()
    }

    async fn scheduler(config: &CronConfig) -> (TestHarness, Result<DigestScheduler, AlertmailError>) {
        let harness = TestHarness::builder().build().await.unwrap();
        let pipeline = pipeline_for(&harness, RecipientDirectory::default());
        let scheduler = DigestScheduler::new(config, pipeline, harness.clock.clone());
        (harness, scheduler)
    }

    #[tokio::test]
    async fn invalid_schedule_is_a_schedule_error() {
        let config = CronConfig {
            schedule: "every night".into(),
            ..CronConfig::default()
        };
        let (_harness, result) = scheduler(&config).await;
        assert!(matches!(result, Err(AlertmailError::Schedule(_))));
    }

    #[tokio::test]
    async fn next_fire_follows_the_expression() {
        let (_harness, scheduler) = scheduler(&CronConfig::default()).await;
        let scheduler = scheduler.unwrap();
        assert_eq!(
            scheduler.next_fire_after(at("2026-03-01 12:00:00")).unwrap(),
            at("2026-03-01 22:00:00")
        );
        assert_eq!(
            scheduler.next_fire_after(at("2026-03-01 22:00:00")).unwrap(),
            at("2026-03-02 22:00:00")
        );
    }

    #[tokio::test]
    async fn run_once_covers_todays_window_only() {
        let (harness, scheduler) = scheduler(&CronConfig::default()).await;
        let scheduler = scheduler.unwrap();
        harness.seed("in window", "carol@co.com", "2026-03-01 19:00:00").await.unwrap();
        harness.seed("too early", "dave@co.com", "2026-03-01 18:59:59").await.unwrap();
        harness.seed("yesterday", "erin@co.com", "2026-02-28 20:00:00").await.unwrap();

        let summary = scheduler.run_once(harness.now()).await.unwrap();
        assert_eq!(summary.succeeded_addresses, vec!["carol@co.com"]);
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn run_once_window_follows_the_frozen_date() {
        let harness = TestHarness::builder()
            .with_now("2026-03-05 22:00:00")
            .build()
            .await
            .unwrap();
        let pipeline = pipeline_for(&harness, RecipientDirectory::default());
        let scheduler =
            DigestScheduler::new(&CronConfig::default(), pipeline, harness.clock.clone()).unwrap();
        harness.seed("thursday", "frank@co.com", "2026-03-05 20:00:00").await.unwrap();
        harness.seed("sunday", "grace@co.com", "2026-03-01 20:00:00").await.unwrap();

        let summary = scheduler.run_once(harness.now()).await.unwrap();
        assert_eq!(summary.succeeded_addresses, vec!["frank@co.com"]);
        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("2026-03-05"), "{}", sent[0].subject);
    }

    #[tokio::test]
    async fn run_once_with_empty_window_sends_nothing() {
        let (harness, scheduler) = scheduler(&CronConfig::default()).await;
        let summary = scheduler.unwrap().run_once(harness.now()).await.unwrap();
        assert_eq!(summary, DispatchSummary::default());
        assert!(harness.transport.attempts().is_empty());
    }

    #[tokio::test]
    async fn run_once_surfaces_delivery_failures() {
        let harness = TestHarness::builder()
            .with_transport(MockTransport::new().failing_all())
            .build()
            .await
            .unwrap();
        let pipeline = pipeline_for(&harness, RecipientDirectory::default());
        let scheduler =
            DigestScheduler::new(&CronConfig::default(), pipeline, harness.clock.clone()).unwrap();
        harness.seed("disk full", "carol@co.com", "2026-03-01 20:00:00").await.unwrap();

        let err = scheduler.run_once(harness.now()).await.unwrap_err();
        assert!(matches!(err, AlertmailError::Delivery { failed: 1, .. }));
    }

    #[tokio::test]
    async fn cancelled_loop_exits_without_running() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.seed("disk full", "carol@co.com", "2026-03-01 20:00:00").await.unwrap();
        let pipeline = pipeline_for(&harness, RecipientDirectory::default());
        let scheduler =
            DigestScheduler::new(&CronConfig::default(), pipeline, Arc::new(SystemClock)).unwrap();

        let cancel = CancellationToken::new();
        let handle = scheduler.spawn(cancel.clone());
        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("scheduler did not stop")
            .unwrap();
        assert!(harness.transport.attempts().is_empty());
    }
}
