// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Alert inserts and queries.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text, so range filters
//! compare strings and `ORDER BY alert_time` is chronological.

use alertmail_core::types::{format_alert_time, ALERT_TIME_FORMAT};
use alertmail_core::{AlertPage, AlertRecord, AlertmailError, NewAlert, Pagination};
use chrono::NaiveDateTime;
use rusqlite::{params, Row};

use crate::database::{map_tr_err, Database};

const SELECT_COLUMNS: &str =
    "SELECT id, message, recipient, alert_time, created_at, updated_at FROM alerts";

const ORDER_NEWEST_FIRST: &str = "ORDER BY alert_time DESC, id DESC";

fn parse_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, ALERT_TIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<AlertRecord> {
    Ok(AlertRecord {
        id: row.get(0)?,
        message: row.get(1)?,
        recipient: row.get(2)?,
        alert_time: parse_time(row, 3)?,
        created_at: parse_time(row, 4)?,
        updated_at: parse_time(row, 5)?,
    })
}

/// Inserts every alert in one transaction. Either all rows land or none do.
pub async fn insert_alerts(
    db: &Database,
    alerts: &[NewAlert],
    now: NaiveDateTime,
) -> Result<Vec<AlertRecord>, AlertmailError> {
    let alerts = alerts.to_vec();
    let stamp = format_alert_time(&now);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut records = Vec::with_capacity(alerts.len());
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO alerts (message, recipient, alert_time, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                )?;
                for alert in alerts {
                    stmt.execute(params![
                        alert.message,
                        alert.recipient,
                        format_alert_time(&alert.alert_time),
                        stamp,
                    ])?;
                    records.push(AlertRecord {
                        id: tx.last_insert_rowid(),
                        message: alert.message,
                        recipient: alert.recipient,
                        alert_time: alert.alert_time,
                        created_at: now,
                        updated_at: now,
                    });
                }
            }
            tx.commit()?;
            Ok(records)
        })
        .await
        .map_err(map_tr_err)
}

/// One page of alerts, newest first, plus the total row count.
pub async fn list_alerts(db: &Database, page: Pagination) -> Result<AlertPage, AlertmailError> {
    let limit = i64::from(page.page_size);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))?;
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} {ORDER_NEWEST_FIRST} LIMIT ?1 OFFSET ?2"))?;
            let alerts = stmt
                .query_map(params![limit, offset], row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(AlertPage {
                alerts,
                total: u64::try_from(total).unwrap_or_default(),
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Alerts with `alert_time` in `[start, end]`, newest first.
pub async fn query_by_time_range(
    db: &Database,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<AlertRecord>, AlertmailError> {
    let (start, end) = (format_alert_time(&start), format_alert_time(&end));
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE alert_time >= ?1 AND alert_time <= ?2 {ORDER_NEWEST_FIRST}"
            ))?;
            let rows = stmt.query_map(params![start, end], row_to_record)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// All alerts for one exact recipient token, newest first.
pub async fn query_by_recipient(
    db: &Database,
    token: &str,
) -> Result<Vec<AlertRecord>, AlertmailError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE recipient = ?1 {ORDER_NEWEST_FIRST}"
            ))?;
            let rows = stmt.query_map(params![token], row_to_record)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Alerts for one exact recipient token with `alert_time` in `[start, end]`.
pub async fn query_by_time_range_and_recipient(
    db: &Database,
    start: NaiveDateTime,
    end: NaiveDateTime,
    token: &str,
) -> Result<Vec<AlertRecord>, AlertmailError> {
    let (start, end) = (format_alert_time(&start), format_alert_time(&end));
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_COLUMNS} WHERE recipient = ?1 AND alert_time >= ?2 AND alert_time <= ?3 \
                 {ORDER_NEWEST_FIRST}"
            ))?;
            let rows = stmt.query_map(params![token, start, end], row_to_record)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Distinct recipient tokens, ascending.
pub async fn list_distinct_recipients(db: &Database) -> Result<Vec<String>, AlertmailError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT recipient FROM alerts ORDER BY recipient ASC")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })
        .await
        .map_err(map_tr_err)
}
