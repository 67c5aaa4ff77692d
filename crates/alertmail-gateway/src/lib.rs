// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for alertmail.
//!
//! Serves the ingestion and query API, `/health`, `/config`, and a manual
//! digest trigger. Every route works whether or not the scheduled job runs.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, router, start_server};
