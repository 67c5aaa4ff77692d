// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification transport for deterministic testing.
//!
//! `MockTransport` implements `NotificationTransport`, capturing every
//! attempted send and failing on demand for chosen addresses.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use alertmail_core::{
    AdapterType, AlertmailError, HealthStatus, NotificationTransport, OutboundEmail,
    PluginAdapter, TransportReceipt,
};

#[derive(Debug, Default)]
struct Captured {
    attempts: Vec<OutboundEmail>,
    delivered: Vec<OutboundEmail>,
}

/// A transport that records sends instead of delivering them.
///
/// - **attempts**: every call to `send()`, in order
/// - **sent**: only the calls that succeeded
#[derive(Debug, Default)]
pub struct MockTransport {
    captured: Arc<Mutex<Captured>>,
    failing: HashSet<String>,
    fail_all: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send addressed to `address`.
    pub fn failing_for(mut self, address: &str) -> Self {
        self.failing.insert(address.to_string());
        self
    }

    /// Fail every send.
    pub fn failing_all(mut self) -> Self {
        self.fail_all = true;
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Captured> {
        self.captured.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every attempted send.
    pub fn attempts(&self) -> Vec<OutboundEmail> {
        self.lock().attempts.clone()
    }

    /// Sends that succeeded.
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.lock().delivered.clone()
    }

    /// Successful sends whose recipient list contains `address`.
    pub fn sent_to(&self, address: &str) -> Vec<OutboundEmail> {
        self.lock()
            .delivered
            .iter()
            .filter(|e| e.to.iter().any(|to| to == address))
            .cloned()
            .collect()
    }

    fn should_fail(&self, email: &OutboundEmail) -> bool {
        self.fail_all || email.to.iter().any(|to| self.failing.contains(to))
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, AlertmailError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), AlertmailError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationTransport for MockTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<TransportReceipt, AlertmailError> {
        let fail = self.should_fail(email);
        let mut captured = self.lock();
        captured.attempts.push(email.clone());
        if fail {
            debug!(to = ?email.to, "mock transport rejecting send");
            return Err(AlertmailError::Transport {
                message: format!("mock failure for {}", email.to.join(",")),
                source: None,
            });
        }
        captured.delivered.push(email.clone());
        Ok(TransportReceipt {
            message: "mock accepted".to_string(),
        })
    }
}
