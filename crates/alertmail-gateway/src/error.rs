// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON error envelope for API responses.

use alertmail_core::{AlertmailError, DispatchSummary};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// Error response body: `{ "code": <status>, "message": <text> }`, plus the
/// run summary for failed digest sends.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<DispatchSummary>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    summary: Option<DispatchSummary>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            summary: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AlertmailError> for ApiError {
    fn from(err: AlertmailError) -> Self {
        match err {
            AlertmailError::Validation(message) => Self::bad_request(message),
            AlertmailError::Delivery {
                attempted,
                failed,
                summary,
            } => Self {
                status: StatusCode::BAD_GATEWAY,
                message: format!("{failed} of {attempted} sends failed"),
                summary: Some(*summary),
            },
            other => {
                error!(error = %other, "request failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: other.to_string(),
                    summary: None,
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            code: self.status.as_u16(),
            message: self.message,
            data: self.summary,
        };
        (self.status, Json(body)).into_response()
    }
}
