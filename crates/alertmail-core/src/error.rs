// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for alertmail.

use thiserror::Error;

use crate::types::DispatchSummary;

/// The primary error type used across all alertmail adapter traits and pipeline stages.
#[derive(Debug, Error)]
pub enum AlertmailError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller-supplied input was rejected (empty recipient, malformed timestamp).
    #[error("validation error: {0}")]
    Validation(String),

    /// Alert store errors (connection loss, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Outbound notification transport errors (network failure, non-success response).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Notification template registration or rendering failed.
    #[error("template error: {message}")]
    Template {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// One or more sends of a dispatch run failed. All sends were still attempted.
    #[error("notification delivery failed: {failed} of {attempted} sends failed")]
    Delivery {
        attempted: usize,
        failed: usize,
        summary: Box<DispatchSummary>,
    },

    /// Schedule expression could not be parsed or evaluated.
    #[error("schedule error: {0}")]
    Schedule(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AlertmailError {
    /// Wraps any error as a storage error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Returns true for errors caused by caller input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
