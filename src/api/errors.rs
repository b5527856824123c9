// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;
use tracing::warn;

use crate::errors::{ErrorKind, PlateError};
use crate::orchestration::wire::ErrorBody;

/// Error returned by every HTTP handler, rendered as `{"error": message}`
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidRequest(String),
    ServiceUnavailable(String),
    BadGateway(String),
    Timeout(String),
    InternalError(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) => 400,
            ApiError::InternalError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::Timeout(_) => 504,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::InvalidRequest(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Timeout(msg)
            | ApiError::InternalError(msg) => msg,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.message().to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.status_code())
    }
}

impl std::error::Error for ApiError {}

impl From<PlateError> for ApiError {
    fn from(err: PlateError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Input => ApiError::InvalidRequest(message),
            ErrorKind::NotReady => ApiError::ServiceUnavailable(message),
            ErrorKind::RemoteUnavailable if matches!(err, PlateError::RemoteTimeout { .. }) => {
                ApiError::Timeout(message)
            }
            ErrorKind::RemoteUnavailable => ApiError::BadGateway(message),
            ErrorKind::ModelInference | ErrorKind::Internal => ApiError::InternalError(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        (status, Json(self.to_body())).into_response()
    }
}
