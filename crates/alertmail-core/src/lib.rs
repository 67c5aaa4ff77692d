// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for alertmail.
//!
//! This crate provides the error type, the domain types that flow through the
//! digest pipeline, and the adapter traits implemented by the alert store and
//! the notification transport.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::AlertmailError;
pub use types::{
    AdapterType, AlertPage, AlertRecord, Digest, DispatchSummary, HealthStatus, NewAlert,
    OutboundEmail, Pagination, RenderedNotification, ResolvedRecipient, TransportReceipt,
};

pub use traits::{AlertStore, NotificationTransport, PluginAdapter};
