// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process region and fragment sources backed by [`PlateModels`]
//!
//! Model calls are CPU bound and run on the blocking thread pool.

use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;

use super::{FragmentSource, PlateRegion, RegionSource, SourceImage};
use crate::errors::PlateError;
use crate::plate::TextFragment;
use crate::vision::{crop_region, PlateModels};

/// Detect plates, then crop and preprocess every box
///
/// `keep_raw` retains the unprocessed crop on each region.
pub fn detect_regions(
    models: &PlateModels,
    image: &DynamicImage,
    keep_raw: bool,
) -> Result<Vec<PlateRegion>, PlateError> {
    let boxes = models.detection()?.detect(image)?;
    let preprocessor = models.preprocessor();

    Ok(boxes
        .into_iter()
        .enumerate()
        .map(|(index, scored)| {
            let raw = crop_region(image, &scored.bbox);
            PlateRegion {
                index,
                bbox: scored.bbox,
                confidence: Some(scored.confidence),
                image: preprocessor.process(&raw),
                raw: keep_raw.then_some(raw),
            }
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct LocalRegionSource {
    models: Arc<PlateModels>,
    keep_raw: bool,
}

impl LocalRegionSource {
    pub fn new(models: Arc<PlateModels>) -> Self {
        Self {
            models,
            keep_raw: false,
        }
    }

    /// Also keep each unprocessed crop (for debug dumps)
    pub fn with_raw_crops(mut self, keep_raw: bool) -> Self {
        self.keep_raw = keep_raw;
        self
    }
}

#[async_trait]
impl RegionSource for LocalRegionSource {
    async fn regions(&self, source: &SourceImage) -> Result<Vec<PlateRegion>, PlateError> {
        self.models.detection()?;
        let models = self.models.clone();
        let image = source.image.clone();
        let keep_raw = self.keep_raw;
        tokio::task::spawn_blocking(move || detect_regions(&models, &image, keep_raw)).await?
    }
}

#[derive(Debug, Clone)]
pub struct LocalFragmentSource {
    models: Arc<PlateModels>,
}

impl LocalFragmentSource {
    pub fn new(models: Arc<PlateModels>) -> Self {
        Self { models }
    }
}

#[async_trait]
impl FragmentSource for LocalFragmentSource {
    fn ensure_ready(&self) -> Result<(), PlateError> {
        self.models.recognition().map(|_| ())
    }

    async fn fragments(&self, region: &PlateRegion) -> Result<Vec<TextFragment>, PlateError> {
        let models = self.models.clone();
        let image = region.image.clone();
        tokio::task::spawn_blocking(move || models.recognition()?.recognize(&image)).await?
    }
}
