// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for alertmail integration tests.
//!
//! Provides a mock transport and temp-database harness for fast,
//! deterministic tests without a real notification endpoint.
//!
//! # Components
//!
//! - [`MockTransport`] - Captures outbound notifications, fails on demand
//! - [`TestHarness`] - Temp SQLite store, frozen clock, and matching config
//! - [`temp_store`] - Just the migrated temp store

pub mod harness;
pub mod mock_transport;

pub use harness::{TestHarness, temp_store};
pub use mock_transport::MockTransport;
