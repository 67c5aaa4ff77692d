// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns digests into subject + HTML body notifications.
//!
//! Rendering is a pure function of the digest, the resolution outcome, and
//! the injected clock.

use std::sync::Arc;

use alertmail_core::types::{format_alert_time, time_bounds};
use alertmail_core::{
    AlertRecord, AlertmailError, Clock, Digest, RenderedNotification, ResolvedRecipient,
};
use chrono::{NaiveDateTime, NaiveTime};
use handlebars::Handlebars;
use serde::Serialize;

use crate::templates;

#[derive(Serialize)]
struct AlertView<'a> {
    number: usize,
    message: &'a str,
    alert_time: String,
}

#[derive(Serialize)]
struct DigestView<'a> {
    generated_at: String,
    date: String,
    recipient: &'a str,
    unresolved: bool,
    window_start: String,
    window_end: String,
    total: usize,
    alerts: Vec<AlertView<'a>>,
}

#[derive(Serialize)]
struct GroupView<'a> {
    recipient: &'a str,
    total: usize,
    alerts: Vec<AlertView<'a>>,
}

#[derive(Serialize)]
struct FallbackView<'a> {
    generated_at: String,
    date: String,
    tokens: String,
    token_count: usize,
    window_start: String,
    window_end: String,
    total: usize,
    groups: Vec<GroupView<'a>>,
}

fn alert_views(alerts: &[AlertRecord]) -> Vec<AlertView<'_>> {
    alerts
        .iter()
        .enumerate()
        .map(|(i, alert)| AlertView {
            number: i + 1,
            message: &alert.message,
            alert_time: format_alert_time(&alert.alert_time),
        })
        .collect()
}

/// Renders digest and fallback notifications from registered templates.
pub struct NotificationRenderer {
    registry: Handlebars<'static>,
    clock: Arc<dyn Clock>,
}

impl NotificationRenderer {
    /// Builds the template registry. Fails only on a template defect.
    pub fn new(clock: Arc<dyn Clock>) -> Result<Self, AlertmailError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        templates::register_templates(&mut registry)?;
        Ok(Self { registry, clock })
    }

    /// Window bounds for display: the records' min/max, or the whole current
    /// day when there are no records.
    fn window<'a>(
        &self,
        now: NaiveDateTime,
        alerts: impl Iterator<Item = &'a AlertRecord>,
    ) -> (String, String) {
        let (start, end) = time_bounds(alerts).unwrap_or_else(|| {
            let day = now.date();
            (
                day.and_time(NaiveTime::MIN),
                day.and_hms_opt(23, 59, 59).unwrap_or(now),
            )
        });
        (format_alert_time(&start), format_alert_time(&end))
    }

    fn render_template<T: Serialize>(&self, name: &str, data: &T) -> Result<String, AlertmailError> {
        self.registry
            .render(name, data)
            .map_err(|e| AlertmailError::Template {
                message: format!("rendering {name}"),
                source: Some(Box::new(e)),
            })
    }

    /// One recipient's digest. An unresolved recipient gets an operator
    /// subject prefix and guidance in the body.
    pub fn render(
        &self,
        digest: &Digest,
        resolved: &ResolvedRecipient,
    ) -> Result<RenderedNotification, AlertmailError> {
        let now = self.clock.now();
        let (window_start, window_end) = self.window(now, digest.alerts.iter());
        let view = DigestView {
            generated_at: format_alert_time(&now),
            date: now.format("%Y-%m-%d").to_string(),
            recipient: &digest.recipient,
            unresolved: !resolved.resolved,
            window_start,
            window_end,
            total: digest.len(),
            alerts: alert_views(&digest.alerts),
        };
        Ok(RenderedNotification {
            subject: self.render_template(templates::digest_subject(resolved.resolved), &view)?,
            body: self.render_template(templates::DIGEST_BODY, &view)?,
        })
    }

    /// Merges every unresolved digest of a run into one operator document.
    pub fn render_fallback(&self, digests: &[Digest]) -> Result<RenderedNotification, AlertmailError> {
        let now = self.clock.now();
        let (window_start, window_end) =
            self.window(now, digests.iter().flat_map(|d| d.alerts.iter()));
        let tokens: Vec<&str> = digests.iter().map(|d| d.recipient.as_str()).collect();
        let view = FallbackView {
            generated_at: format_alert_time(&now),
            date: now.format("%Y-%m-%d").to_string(),
            tokens: tokens.join(", "),
            token_count: tokens.len(),
            window_start,
            window_end,
            total: digests.iter().map(Digest::len).sum(),
            groups: digests
                .iter()
                .map(|d| GroupView {
                    recipient: &d.recipient,
                    total: d.len(),
                    alerts: alert_views(&d.alerts),
                })
                .collect(),
        };
        Ok(RenderedNotification {
            subject: self.render_template(templates::FALLBACK_SUBJECT, &view)?,
            body: self.render_template(templates::FALLBACK_BODY, &view)?,
        })
    }
}
