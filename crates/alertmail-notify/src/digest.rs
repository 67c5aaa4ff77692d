// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Groups a window's alerts into per-recipient digests.
//!
//! The window is fetched with one range query and partitioned in memory, so
//! the candidate recipients are exactly those with alerts inside the window.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use alertmail_core::{AlertRecord, AlertStore, AlertmailError, Digest};
use chrono::NaiveDateTime;
use tracing::debug;

/// Builds digests for a time window from the alert store.
#[derive(Clone)]
pub struct DigestBuilder {
    store: Arc<dyn AlertStore>,
}

impl DigestBuilder {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    /// Digests for `[start, end]` inclusive, ordered by recipient token.
    /// An empty window yields an empty vector.
    pub async fn build_digests(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Digest>, AlertmailError> {
        let records = self.store.query_by_time_range(start, end).await?;
        let digests = group_into_digests(records);
        debug!(
            %start,
            %end,
            digest_count = digests.len(),
            "digests built"
        );
        Ok(digests)
    }
}

/// Partitions records by exact recipient token. Each digest's alerts are
/// ordered newest first (ties broken by id, newest first); digests are
/// ordered by token.
pub fn group_into_digests(records: Vec<AlertRecord>) -> Vec<Digest> {
    let mut groups: BTreeMap<String, Vec<AlertRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.recipient.clone()).or_default().push(record);
    }
    groups
        .into_iter()
        .map(|(recipient, mut alerts)| {
            alerts.sort_by_key(|a| Reverse((a.alert_time, a.id)));
            Digest::new(recipient, alerts)
        })
        .collect()
}
