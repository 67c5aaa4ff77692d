// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` provides a migrated temp SQLite store, a mock transport, a
//! frozen clock, and a config pointing at the temp directory.

use std::path::PathBuf;
use std::sync::Arc;

use alertmail_config::AlertmailConfig;
use alertmail_config::model::StorageConfig;
use alertmail_core::types::parse_alert_time;
use alertmail_core::{AlertStore, AlertmailError, FixedClock, NewAlert};
use alertmail_storage::SqliteAlertStore;
use chrono::NaiveDateTime;

use crate::mock_transport::MockTransport;

/// Opens a migrated store in a fresh temp directory. Keep the returned
/// `TempDir` alive for as long as the store is used.
pub async fn temp_store() -> Result<(tempfile::TempDir, Arc<SqliteAlertStore>), AlertmailError> {
    let temp_dir = tempfile::TempDir::new().map_err(AlertmailError::storage)?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteAlertStore::new(StorageConfig {
        database_path: db_path.to_string_lossy().into_owned(),
        wal_mode: true,
    });
    store.initialize().await?;
    Ok((temp_dir, Arc::new(store)))
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    now: String,
    directory_json: Option<String>,
    transport: MockTransport,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            now: "2026-03-01 22:00:00".to_string(),
            directory_json: None,
            transport: MockTransport::new(),
        }
    }

    /// Freeze the clock at `YYYY-MM-DD HH:MM:SS`.
    pub fn with_now(mut self, now: &str) -> Self {
        self.now = now.to_string();
        self
    }

    /// Write a recipient directory file with this JSON content.
    pub fn with_directory(mut self, json: &str) -> Self {
        self.directory_json = Some(json.to_string());
        self
    }

    /// Use a preconfigured mock transport (e.g. one that fails for an address).
    pub fn with_transport(mut self, transport: MockTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Build the harness, creating the temp directory and store.
    pub async fn build(self) -> Result<TestHarness, AlertmailError> {
        let now = parse_alert_time(&self.now)?;
        let temp_dir = tempfile::TempDir::new().map_err(AlertmailError::storage)?;

        let db_path = temp_dir.path().join("test.db");
        let directory_path = temp_dir.path().join("userlist.json");
        if let Some(json) = &self.directory_json {
            std::fs::write(&directory_path, json).map_err(AlertmailError::storage)?;
        }

        let mut config = AlertmailConfig::default();
        config.storage.database_path = db_path.to_string_lossy().into_owned();
        config.directory.path = directory_path.to_string_lossy().into_owned();
        config.email.fallback_address = "operator@alertmail.test".to_string();

        let clock = Arc::new(FixedClock(now));
        let store = SqliteAlertStore::new(config.storage.clone()).with_clock(clock.clone());
        store.initialize().await?;

        Ok(TestHarness {
            store: Arc::new(store),
            transport: Arc::new(self.transport),
            clock,
            config,
            directory_path,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock transport and temp storage.
pub struct TestHarness {
    /// SQLite alert store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteAlertStore>,
    /// Captures outbound notifications.
    pub transport: Arc<MockTransport>,
    /// Frozen clock shared with the store.
    pub clock: Arc<FixedClock>,
    /// Config whose storage and directory paths point into the temp dir.
    pub config: AlertmailConfig,
    /// Location of the directory file (may not exist).
    pub directory_path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The frozen "now".
    pub fn now(&self) -> NaiveDateTime {
        self.clock.0
    }

    /// Inserts one alert per comma-separated token at `alert_time`.
    pub async fn seed(&self, message: &str, recipients: &str, alert_time: &str) -> Result<(), AlertmailError> {
        let tokens = alertmail_core::types::split_recipients(recipients);
        let alerts = NewAlert::fan_out(message, &tokens, parse_alert_time(alert_time)?)?;
        self.store.insert_alerts(&alerts).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn temp_store_is_usable() {
        let (_dir, store) = temp_store().await.unwrap();
        assert!(store.list_distinct_recipients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn harness_seeds_through_fan_out() {
        let harness = TestHarness::builder()
            .with_directory(r#"[{"name":"A","e_name":"alice","email":"alice@co.com"}]"#)
            .build()
            .await
            .unwrap();
        harness.seed("disk full", "alice，bob", "2026-03-01 20:00:00").await.unwrap();

        assert!(harness.directory_path.exists());
        assert_eq!(
            harness.store.list_distinct_recipients().await.unwrap(),
            vec!["alice", "bob"]
        );
        let page = harness.store.list_alerts(Default::default()).await.unwrap();
        assert!(page.alerts.iter().all(|a| a.created_at == harness.now()));
    }
}
