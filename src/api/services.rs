// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Stage service endpoints used in distributed mode
//!
//! - `POST /detect_plates`: image in, preprocessed plate crops out
//! - `POST /recognize_text`: preprocessed crop in, qualifying fragments out

use axum::{extract::State, Json};
use std::time::Instant;
use tracing::{debug, info};

use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::upload::ImageUpload;
use crate::errors::PlateError;
use crate::orchestration::wire::{FragmentsResponse, PlateCrop, PlateCropsResponse};
use crate::pipeline::detect_regions;
use crate::vision::{decode_image_bytes_limited, encode_base64_png};

/// POST /detect_plates - Detect, crop and preprocess plates
///
/// Crops are returned as base64 PNG in detector box order.
pub async fn detect_plates_handler(
    State(state): State<AppState>,
    upload: ImageUpload,
) -> Result<Json<PlateCropsResponse>, ApiError> {
    let started = Instant::now();
    let bytes = upload.into_bytes_limited(state.max_image_bytes)?;
    state.models.detection()?;

    let models = state.models.clone();
    let max_bytes = state.max_image_bytes;
    let plate_crops = tokio::task::spawn_blocking(move || {
        let (image, info) = decode_image_bytes_limited(&bytes, max_bytes)?;
        debug!("Detecting plates in {}x{} image", info.width, info.height);

        detect_regions(&models, &image, false)?
            .into_iter()
            .map(|region| {
                let image = encode_base64_png(&region.image)
                    .map_err(|e| PlateError::Internal(e.to_string()))?;
                Ok(PlateCrop::new(region.bbox, image))
            })
            .collect::<Result<Vec<_>, PlateError>>()
    })
    .await
    .map_err(PlateError::from)??;

    info!(
        "Detected {} plates in {}ms",
        plate_crops.len(),
        started.elapsed().as_millis()
    );

    Ok(Json(PlateCropsResponse { plate_crops }))
}

/// POST /recognize_text - Read text from one preprocessed plate crop
pub async fn recognize_text_handler(
    State(state): State<AppState>,
    upload: ImageUpload,
) -> Result<Json<FragmentsResponse>, ApiError> {
    let bytes = upload.into_bytes_limited(state.max_image_bytes)?;
    state.models.recognition()?;

    let models = state.models.clone();
    let max_bytes = state.max_image_bytes;
    let fragments = tokio::task::spawn_blocking(move || {
        let (image, _) = decode_image_bytes_limited(&bytes, max_bytes)?;
        models.recognition()?.recognize(&image)
    })
    .await
    .map_err(PlateError::from)??;

    debug!("Recognized {} fragments", fragments.len());

    Ok(Json(FragmentsResponse { fragments }))
}
