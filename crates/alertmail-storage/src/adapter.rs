// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the AlertStore trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::OnceCell;
use tracing::debug;

use alertmail_config::model::StorageConfig;
use alertmail_core::{
    AdapterType, AlertPage, AlertRecord, AlertStore, AlertmailError, Clock, HealthStatus,
    NewAlert, Pagination, PluginAdapter, SystemClock,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed alert store.
///
/// Wraps a [`Database`] handle and delegates all query operations to
/// [`queries::alerts`]. The database is opened by [`SqliteAlertStore::initialize`].
pub struct SqliteAlertStore {
    config: StorageConfig,
    db: OnceCell<Database>,
    clock: Arc<dyn Clock>,
}

impl SqliteAlertStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock used for `created_at`/`updated_at` stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Opens the database and runs migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), AlertmailError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| AlertmailError::Storage {
            source: "alert store already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite alert store initialized");
        Ok(())
    }

    /// Opens an in-memory store. Used by tests and the test harness.
    pub async fn in_memory() -> Result<Self, AlertmailError> {
        let store = Self::new(StorageConfig {
            database_path: ":memory:".to_string(),
            wal_mode: false,
        });
        let db = Database::open_in_memory().await?;
        store.db.set(db).map_err(|_| AlertmailError::Internal("fresh OnceCell was set".into()))?;
        Ok(store)
    }

    fn db(&self) -> Result<&Database, AlertmailError> {
        self.db.get().ok_or_else(|| AlertmailError::Storage {
            source: "alert store not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteAlertStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, AlertmailError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let ping = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        Ok(match ping {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), AlertmailError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    async fn insert_alerts(&self, alerts: &[NewAlert]) -> Result<Vec<AlertRecord>, AlertmailError> {
        if alerts.is_empty() {
            return Ok(Vec::new());
        }
        queries::alerts::insert_alerts(self.db()?, alerts, self.clock.now()).await
    }

    async fn list_alerts(&self, page: Pagination) -> Result<AlertPage, AlertmailError> {
        queries::alerts::list_alerts(self.db()?, page).await
    }

    async fn query_by_time_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AlertRecord>, AlertmailError> {
        queries::alerts::query_by_time_range(self.db()?, start, end).await
    }

    async fn query_by_recipient(&self, token: &str) -> Result<Vec<AlertRecord>, AlertmailError> {
        queries::alerts::query_by_recipient(self.db()?, token).await
    }

    async fn query_by_time_range_and_recipient(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        token: &str,
    ) -> Result<Vec<AlertRecord>, AlertmailError> {
        queries::alerts::query_by_time_range_and_recipient(self.db()?, start, end, token).await
    }

    async fn list_distinct_recipients(&self) -> Result<Vec<String>, AlertmailError> {
        queries::alerts::list_distinct_recipients(self.db()?).await
    }
}
