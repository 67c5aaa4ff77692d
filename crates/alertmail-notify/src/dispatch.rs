// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sends digests and aggregates a run summary.
//!
//! Sends are strictly sequential and attempted once each. A failed send is
//! recorded and never stops later sends. Every unresolved digest of a run is
//! merged into one operator notification.

use std::sync::Arc;

use alertmail_core::{
    AlertmailError, Digest, DispatchSummary, NotificationTransport, OutboundEmail,
    RenderedNotification,
};
use tracing::{error, info, warn};

use crate::render::NotificationRenderer;
use crate::resolver::RecipientResolver;

/// Resolves, renders, and sends digests.
pub struct Dispatcher {
    resolver: RecipientResolver,
    renderer: Arc<NotificationRenderer>,
    transport: Arc<dyn NotificationTransport>,
}

impl Dispatcher {
    pub fn new(
        resolver: RecipientResolver,
        renderer: Arc<NotificationRenderer>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        Self {
            resolver,
            renderer,
            transport,
        }
    }

    /// Dispatches every digest. Returns [`AlertmailError::Delivery`] carrying
    /// the full summary when any send failed.
    pub async fn dispatch_all(&self, digests: &[Digest]) -> Result<DispatchSummary, AlertmailError> {
        let mut summary = DispatchSummary::default();
        let mut unresolved: Vec<Digest> = Vec::new();

        for digest in digests {
            let recipient = self.resolver.resolve(&digest.recipient);
            if !recipient.resolved {
                summary.unresolved_tokens.push(digest.recipient.clone());
                unresolved.push(digest.clone());
                continue;
            }

            let rendered = self.renderer.render(digest, &recipient);
            let ok = self
                .deliver(&recipient.address, &digest.recipient, digest.len(), rendered)
                .await;
            if ok {
                summary.record_success(&recipient.address);
            } else {
                summary.record_failure(&recipient.address);
            }
        }

        if !unresolved.is_empty() {
            let operator = self.resolver.fallback_address().to_string();
            let alert_count = unresolved.iter().map(Digest::len).sum();
            let tokens = summary.unresolved_tokens.join(",");
            let rendered = self.renderer.render_fallback(&unresolved);
            if self.deliver(&operator, &tokens, alert_count, rendered).await {
                summary.record_success(&operator);
                summary.fallback_sent = true;
            } else {
                summary.record_failure(&operator);
            }
        }

        info!(
            success = summary.success_count,
            failed = summary.failure_count,
            unresolved = summary.unresolved_tokens.len(),
            "dispatch run complete"
        );
        summary.into_result()
    }

    /// One send attempt. A render failure counts as a failed send.
    async fn deliver(
        &self,
        address: &str,
        recipient: &str,
        alert_count: usize,
        rendered: Result<RenderedNotification, AlertmailError>,
    ) -> bool {
        let notification = match rendered {
            Ok(n) => n,
            Err(e) => {
                error!(recipient, address, error = %e, "failed to render notification");
                return false;
            }
        };

        let email = OutboundEmail {
            to: vec![address.to_string()],
            subject: notification.subject,
            body_html: notification.body,
        };
        match self.transport.send(&email).await {
            Ok(receipt) => {
                info!(
                    recipient,
                    address,
                    alert_count,
                    subject = %email.subject,
                    provider_message = %receipt.message,
                    "notification sent"
                );
                true
            }
            Err(e) => {
                warn!(
                    recipient,
                    address,
                    alert_count,
                    subject = %email.subject,
                    error = %e,
                    "notification send failed"
                );
                false
            }
        }
    }
}
