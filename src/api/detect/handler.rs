// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! `POST /detect` handler

use axum::{extract::State, Json};
use std::time::Instant;
use tracing::{debug, info};

use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::upload::ImageUpload;
use crate::plate::DetectionResult;

/// POST /detect - Read every license plate in an uploaded image
///
/// # Request
/// A single image, either as `multipart/form-data` or as the raw body.
///
/// # Response
/// `{"cars": [{"plate", "raw_text", "confidence"}]}` in detector box order.
///
/// # Errors
/// - 400 Bad Request: not an image, empty, too large or undecodable
/// - 503 Service Unavailable: models not loaded
/// - 502 / 504: a stage service failed or timed out (distributed mode)
/// - 500 Internal Server Error: detection failed
pub async fn detect_handler(
    State(state): State<AppState>,
    upload: ImageUpload,
) -> Result<Json<DetectionResult>, ApiError> {
    let started = Instant::now();
    let bytes = upload.into_bytes_limited(state.max_image_bytes)?;
    debug!("Detect request received ({} bytes)", bytes.len());

    let orchestrator = state.orchestrator.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable(format!("{} node does not serve /detect", state.role))
    })?;

    let result = orchestrator.process_image(&bytes).await?;

    info!(
        "Detect complete: {} plates, {}ms ({})",
        result.len(),
        started.elapsed().as_millis(),
        orchestrator.mode()
    );

    Ok(Json(result))
}
