// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the notification pipeline, and the HTTP API.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::AlertmailError;

/// Wire and storage format for alert timestamps (local time, second precision).
pub const ALERT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_alert_time(value: &str) -> Result<NaiveDateTime, AlertmailError> {
    NaiveDateTime::parse_from_str(value.trim(), ALERT_TIME_FORMAT).map_err(|_| {
        AlertmailError::Validation(format!(
            "invalid timestamp `{value}`, expected YYYY-MM-DD HH:MM:SS"
        ))
    })
}

/// Formats a timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_alert_time(value: &NaiveDateTime) -> String {
    value.format(ALERT_TIME_FORMAT).to_string()
}

/// Serde adapter for [`ALERT_TIME_FORMAT`] timestamps.
pub mod alert_time_serde {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&super::format_alert_time(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(de)?;
        super::parse_alert_time(&raw).map_err(serde::de::Error::custom)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    /// Short status label used by the health endpoint.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "ok",
            Self::Degraded(_) => "degraded",
            Self::Unhealthy(_) => "unhealthy",
        }
    }
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Store,
    Transport,
}

/// A persisted alert. Immutable after creation except for the audit timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Store-assigned monotonic identifier.
    pub id: i64,
    /// Free-text alert message.
    pub message: String,
    /// Raw recipient token: a direct address or a short identifier.
    pub recipient: String,
    /// When the alerted event happened.
    #[serde(with = "alert_time_serde")]
    pub alert_time: NaiveDateTime,
    #[serde(with = "alert_time_serde")]
    pub created_at: NaiveDateTime,
    #[serde(with = "alert_time_serde")]
    pub updated_at: NaiveDateTime,
}

/// An alert accepted by the ingestion API but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub message: String,
    pub recipient: String,
    pub alert_time: NaiveDateTime,
}

impl NewAlert {
    /// Builds one alert per token, all sharing the same message and time.
    ///
    /// Rejects an empty message or an empty token list.
    pub fn fan_out(
        message: &str,
        tokens: &[String],
        alert_time: NaiveDateTime,
    ) -> Result<Vec<Self>, AlertmailError> {
        if message.trim().is_empty() {
            return Err(AlertmailError::Validation("message must not be empty".into()));
        }
        if tokens.is_empty() {
            return Err(AlertmailError::Validation(
                "recipient must contain at least one token".into(),
            ));
        }
        Ok(tokens
            .iter()
            .map(|token| Self {
                message: message.to_string(),
                recipient: token.clone(),
                alert_time,
            })
            .collect())
    }
}

/// Splits a recipient field into tokens.
///
/// Accepts ASCII `,` and full-width `，` as separators; parts are trimmed and
/// empty parts dropped.
pub fn split_recipients(raw: &str) -> Vec<String> {
    raw.split([',', '，'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Page request for listing alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Normalizes raw query values: `page < 1` becomes 1, a page size outside
    /// `1..=100` becomes the default.
    pub fn normalized(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => 1,
        };
        let page_size = match page_size {
            Some(s) if (1..=i64::from(Self::MAX_PAGE_SIZE)).contains(&s) => s as u32,
            _ => Self::DEFAULT_PAGE_SIZE,
        };
        Self { page, page_size }
    }

    /// Row offset of the first record on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::normalized(None, None)
    }
}

/// One page of alerts plus the total number of stored alerts.
#[derive(Debug, Clone, Serialize)]
pub struct AlertPage {
    pub alerts: Vec<AlertRecord>,
    pub total: u64,
}

/// A recipient's alerts for one query window, newest first.
///
/// Built fresh per pipeline run and discarded after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub recipient: String,
    pub alerts: Vec<AlertRecord>,
}

impl Digest {
    pub fn new(recipient: impl Into<String>, alerts: Vec<AlertRecord>) -> Self {
        Self {
            recipient: recipient.into(),
            alerts,
        }
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Earliest and latest `alert_time` among this digest's records.
    pub fn time_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        time_bounds(self.alerts.iter())
    }
}

/// Earliest and latest `alert_time` across the given records.
pub fn time_bounds<'a>(
    alerts: impl Iterator<Item = &'a AlertRecord>,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    alerts.fold(None, |acc, alert| match acc {
        None => Some((alert.alert_time, alert.alert_time)),
        Some((min, max)) => Some((min.min(alert.alert_time), max.max(alert.alert_time))),
    })
}

/// Output of recipient resolution. `resolved == false` means the fallback
/// address was substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRecipient {
    pub address: String,
    pub resolved: bool,
}

impl ResolvedRecipient {
    pub fn resolved(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            resolved: true,
        }
    }

    pub fn fallback(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            resolved: false,
        }
    }
}

/// A rendered notification ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedNotification {
    pub subject: String,
    /// HTML document body.
    pub body: String,
}

/// A notification addressed to one or more deliverable addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub body_html: String,
}

/// Acknowledgement from the transport on a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReceipt {
    /// Provider message returned with the success response.
    pub message: String,
}

/// Aggregated outcome of one dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub succeeded_addresses: Vec<String>,
    pub failed_addresses: Vec<String>,
    /// Tokens that could not be mapped and were merged into the fallback notification.
    pub unresolved_tokens: Vec<String>,
    /// Whether the merged fallback notification was delivered.
    pub fallback_sent: bool,
}

impl DispatchSummary {
    /// Number of transport calls made.
    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn record_success(&mut self, address: &str) {
        self.success_count += 1;
        self.succeeded_addresses.push(address.to_string());
    }

    pub fn record_failure(&mut self, address: &str) {
        self.failure_count += 1;
        self.failed_addresses.push(address.to_string());
    }

    /// `Ok(self)` when nothing failed, otherwise a [`AlertmailError::Delivery`]
    /// carrying this summary.
    pub fn into_result(self) -> Result<Self, AlertmailError> {
        if self.failure_count == 0 {
            Ok(self)
        } else {
            Err(AlertmailError::Delivery {
                attempted: self.attempted(),
                failed: self.failure_count,
                summary: Box::new(self),
            })
        }
    }
}
