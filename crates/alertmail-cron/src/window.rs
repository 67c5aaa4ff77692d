// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The daily `[start, end]` window a digest run covers.

use alertmail_config::model::CronConfig;
use alertmail_core::AlertmailError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Time-of-day bounds, applied to the date of each run. Seconds are always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl DailyWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, AlertmailError> {
        if start > end {
            return Err(AlertmailError::Schedule(format!(
                "window start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn from_config(config: &CronConfig) -> Result<Self, AlertmailError> {
        let time = |hour: u32, minute: u32| {
            NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
                AlertmailError::Schedule(format!("invalid time of day {hour:02}:{minute:02}"))
            })
        };
        Self::new(
            time(config.start_hour, config.start_minute)?,
            time(config.end_hour, config.end_minute)?,
        )
    }

    /// The window's bounds on `date`.
    pub fn on(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        (date.and_time(self.start), date.and_time(self.end))
    }
}
