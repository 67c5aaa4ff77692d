// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Digest Builder followed by Dispatcher, for one window.

use std::sync::Arc;

use alertmail_core::{AlertStore, AlertmailError, Clock, DispatchSummary, NotificationTransport};
use chrono::NaiveDateTime;
use tracing::info;

use crate::digest::DigestBuilder;
use crate::directory::RecipientDirectory;
use crate::dispatch::Dispatcher;
use crate::render::NotificationRenderer;
use crate::resolver::RecipientResolver;

/// Runs the full digest pipeline for a window. Shared by the scheduler,
/// the manual-send endpoint, and the `send` command.
#[derive(Clone)]
pub struct DigestPipeline {
    builder: DigestBuilder,
    dispatcher: Arc<Dispatcher>,
}

impl DigestPipeline {
    pub fn new(builder: DigestBuilder, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            builder,
            dispatcher,
        }
    }

    /// Wires every stage from its collaborators.
    pub fn assemble(
        store: Arc<dyn AlertStore>,
        directory: Arc<RecipientDirectory>,
        fallback_address: impl Into<String>,
        clock: Arc<dyn Clock>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Result<Self, AlertmailError> {
        let resolver = RecipientResolver::new(directory, fallback_address);
        let renderer = Arc::new(NotificationRenderer::new(clock)?);
        let dispatcher = Arc::new(Dispatcher::new(resolver, renderer, transport));
        Ok(Self::new(DigestBuilder::new(store), dispatcher))
    }

    /// Builds digests for `[start, end]` and dispatches them. With no
    /// digests, nothing is sent and an empty summary is returned.
    pub async fn run(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<DispatchSummary, AlertmailError> {
        let digests = self.builder.build_digests(start, end).await?;
        if digests.is_empty() {
            info!(%start, %end, "no alerts in window, nothing to send");
            return Ok(DispatchSummary::default());
        }
        info!(%start, %end, digest_count = digests.len(), "dispatching digests");
        self.dispatcher.dispatch_all(&digests).await
    }
}
