// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP clients for the detection and recognition stage services
//!
//! Every call carries a timeout. Timeouts become `RemoteTimeout`; any other
//! transport failure, non-2xx status or unreadable body becomes
//! `RemoteUnavailable`. Nothing is retried.

use async_trait::async_trait;
use image::ImageFormat;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::wire::{ErrorBody, PlateCrop, PlateCropsResponse, UPLOAD_FIELD};
use crate::errors::PlateError;
use crate::pipeline::{FragmentSource, PlateRegion, RegionSource, SourceImage};
use crate::plate::TextFragment;
use crate::vision::recognition::qualifying_fragments;
use crate::vision::{decode_base64_image, encode_png, RecognizerOutput};

const DETECTION_SERVICE: &str = "detection";
const RECOGNITION_SERVICE: &str = "recognition";

/// POST an image as multipart field `file` and decode the JSON answer
async fn post_image<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    service: &'static str,
    timeout_secs: u64,
    image: Vec<u8>,
    format: ImageFormat,
) -> Result<T, PlateError> {
    let transport_error = |e: reqwest::Error| {
        if e.is_timeout() {
            PlateError::RemoteTimeout {
                service,
                timeout_secs,
            }
        } else {
            PlateError::RemoteUnavailable {
                service,
                reason: e.to_string(),
            }
        }
    };

    let extension = format.extensions_str().first().copied().unwrap_or("bin");
    let part = Part::bytes(image)
        .file_name(format!("image.{}", extension))
        .mime_str(format.to_mime_type())
        .map_err(|e| PlateError::Internal(e.to_string()))?;
    let form = Form::new().part(UPLOAD_FIELD, part);

    debug!("POST {}", url);
    let response = client
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        return Err(PlateError::RemoteUnavailable {
            service,
            reason: format!("HTTP {}: {}", status.as_u16(), reason),
        });
    }

    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| PlateError::RemoteUnavailable {
        service,
        reason: format!("malformed response: {}", e),
    })
}

fn build_client(timeout: Duration) -> Result<Client, PlateError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PlateError::Internal(format!("failed to create HTTP client: {}", e)))
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Client for `POST /detect_plates`
#[derive(Debug, Clone)]
pub struct RemoteDetectionClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl RemoteDetectionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PlateError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: endpoint(base_url, "/detect_plates"),
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Send an encoded image and return the service's crops
    pub async fn detect_plates(
        &self,
        image: Vec<u8>,
        format: ImageFormat,
    ) -> Result<PlateCropsResponse, PlateError> {
        post_image(
            &self.client,
            &self.url,
            DETECTION_SERVICE,
            self.timeout_secs,
            image,
            format,
        )
        .await
    }
}

/// Turn one returned crop into a region, or `None` if it is unusable
fn crop_to_region(index: usize, crop: PlateCrop) -> Option<PlateRegion> {
    let Some(bbox) = crop.bounding_box() else {
        warn!("Skipping region {}: invalid bbox {:?}", index, crop.bbox);
        return None;
    };

    match decode_base64_image(&crop.image) {
        Ok((image, _)) => Some(PlateRegion {
            index,
            bbox,
            confidence: None,
            image,
            raw: None,
        }),
        Err(e) => {
            warn!("Skipping region {}: undecodable crop: {}", index, e);
            None
        }
    }
}

#[async_trait]
impl RegionSource for RemoteDetectionClient {
    /// The upload is forwarded as received; only crops travel as PNG
    async fn regions(&self, source: &SourceImage) -> Result<Vec<PlateRegion>, PlateError> {
        let response = self
            .detect_plates(source.encoded.to_vec(), source.format)
            .await?;
        debug!("Detection service returned {} crops", response.plate_crops.len());

        Ok(response
            .plate_crops
            .into_iter()
            .enumerate()
            .filter_map(|(index, crop)| crop_to_region(index, crop))
            .collect())
    }
}

/// Client for `POST /recognize_text`
#[derive(Debug, Clone)]
pub struct RemoteRecognitionClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl RemoteRecognitionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PlateError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: endpoint(base_url, "/recognize_text"),
            timeout_secs: timeout.as_secs(),
        })
    }

    /// Send an encoded crop and decode whatever shape the service answers with
    pub async fn recognize_text(&self, png: Vec<u8>) -> Result<RecognizerOutput, PlateError> {
        post_image(
            &self.client,
            &self.url,
            RECOGNITION_SERVICE,
            self.timeout_secs,
            png,
            ImageFormat::Png,
        )
        .await
    }
}

#[async_trait]
impl FragmentSource for RemoteRecognitionClient {
    async fn fragments(&self, region: &PlateRegion) -> Result<Vec<TextFragment>, PlateError> {
        let png = encode_png(&region.image).map_err(|e| PlateError::Internal(e.to_string()))?;
        let output = self.recognize_text(png).await?;
        Ok(qualifying_fragments(output))
    }
}
