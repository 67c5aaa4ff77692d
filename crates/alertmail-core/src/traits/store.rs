// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert store trait for durable alert persistence.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::AlertmailError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AlertPage, AlertRecord, NewAlert, Pagination};

/// Append-only alert store.
///
/// Time-range queries are inclusive on both bounds and return records
/// ordered by `alert_time` descending.
#[async_trait]
pub trait AlertStore: PluginAdapter {
    /// Inserts all alerts atomically and returns them with their assigned ids.
    async fn insert_alerts(&self, alerts: &[NewAlert]) -> Result<Vec<AlertRecord>, AlertmailError>;

    /// Lists one page of alerts, newest first.
    async fn list_alerts(&self, page: Pagination) -> Result<AlertPage, AlertmailError>;

    /// Alerts with `alert_time` in `[start, end]`.
    async fn query_by_time_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AlertRecord>, AlertmailError>;

    /// All alerts for one exact recipient token.
    async fn query_by_recipient(&self, token: &str) -> Result<Vec<AlertRecord>, AlertmailError>;

    /// Alerts for one exact recipient token with `alert_time` in `[start, end]`.
    async fn query_by_time_range_and_recipient(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        token: &str,
    ) -> Result<Vec<AlertRecord>, AlertmailError>;

    /// Every distinct recipient token that has at least one stored alert.
    async fn list_distinct_recipients(&self) -> Result<Vec<String>, AlertmailError>;
}
