// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uniform JSON envelope for every API response.
//!
//! Success: `{"success": true, "data": ...}`. Failure: `{"success": false,
//! "error": {"message": ...}}` with a matching HTTP status. Handler errors
//! convert from [`ParleyError`]; internal detail stays out of the body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parley_core::error::ParleyError;
use serde::Serialize;
use serde_json::json;

/// Wrap payload data in the success envelope.
pub fn ok<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

/// A handler failure carrying the status to respond with.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("{what} not found"),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ParleyError> for ApiError {
    fn from(err: ParleyError) -> Self {
        let status = match &err {
            ParleyError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ParleyError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            ParleyError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ParleyError::Relay { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": { "message": self.message } })),
        )
            .into_response()
    }
}
