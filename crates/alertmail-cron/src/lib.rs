// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled digest delivery.
//!
//! [`DigestScheduler`] fires on a cron expression and runs the digest
//! pipeline over today's [`DailyWindow`]. Disabled entirely by
//! `cron.enabled = false`; the HTTP paths do not depend on it.

pub mod scheduler;
pub mod window;

use alertmail_config::model::CronConfig;
use alertmail_core::AlertmailError;
use chrono::{NaiveDate, NaiveDateTime};

pub use scheduler::{DigestScheduler, parse_schedule};
pub use window::DailyWindow;

/// The configured window on `date`. Used wherever a window defaults to the
/// scheduled one.
pub fn window_for_date(
    config: &CronConfig,
    date: NaiveDate,
) -> Result<(NaiveDateTime, NaiveDateTime), AlertmailError> {
    Ok(DailyWindow::from_config(config)?.on(date))
}
