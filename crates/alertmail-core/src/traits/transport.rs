// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notification transport trait.

use async_trait::async_trait;

use crate::error::AlertmailError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{OutboundEmail, TransportReceipt};

/// Delivers rendered notifications. One call is one delivery attempt;
/// implementations must not retry.
#[async_trait]
pub trait NotificationTransport: PluginAdapter {
    async fn send(&self, email: &OutboundEmail) -> Result<TransportReceipt, AlertmailError>;
}
