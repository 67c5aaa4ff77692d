// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by the alert store and the notification transport.

use async_trait::async_trait;

use crate::error::AlertmailError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for alertmail's external collaborators.
///
/// Provides identity, lifecycle, and health check capabilities so the
/// health endpoint and shutdown path can treat every adapter uniformly.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the kind of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, AlertmailError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), AlertmailError>;
}
