// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image upload extraction
//!
//! Accepts either `multipart/form-data` (the first non-empty field is the
//! image) or a raw request body. Content types that cannot be an image are
//! rejected before the bytes are read.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::debug;

use super::errors::ApiError;

pub const NOT_AN_IMAGE: &str = "File must be an image";

/// Raw bytes of an uploaded image
#[derive(Debug, Clone)]
pub struct ImageUpload(pub Bytes);

impl ImageUpload {
    /// Reject empty or oversize uploads
    pub fn into_bytes_limited(self, max_bytes: usize) -> Result<Bytes, ApiError> {
        if self.0.is_empty() {
            return Err(ApiError::InvalidRequest("Image data is empty".to_string()));
        }
        if self.0.len() > max_bytes {
            return Err(ApiError::InvalidRequest(format!(
                "Image data is too large: {} bytes (max: {} bytes)",
                self.0.len(),
                max_bytes
            )));
        }
        Ok(self.0)
    }
}

fn is_image_type(content_type: &str) -> bool {
    content_type.trim().to_ascii_lowercase().starts_with("image/")
}

#[async_trait]
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let mut multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

                while let Some(field) = multipart
                    .next_field()
                    .await
                    .map_err(|e| ApiError::InvalidRequest(e.body_text()))?
                {
                    if let Some(field_type) = field.content_type() {
                        if !is_image_type(field_type) {
                            return Err(ApiError::InvalidRequest(NOT_AN_IMAGE.to_string()));
                        }
                    }
                    let name = field.name().unwrap_or_default().to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
                    if !bytes.is_empty() {
                        debug!("Multipart image field '{}' ({} bytes)", name, bytes.len());
                        return Ok(ImageUpload(bytes));
                    }
                }

                Err(ApiError::InvalidRequest(
                    "No image found in multipart upload".to_string(),
                ))
            }
            Some(ct) if !(is_image_type(ct) || ct.starts_with("application/octet-stream")) => {
                Err(ApiError::InvalidRequest(NOT_AN_IMAGE.to_string()))
            }
            _ => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
                Ok(ImageUpload(bytes))
            }
        }
    }
}
