// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate pipeline: regions in, normalized plates out
//!
//! The pipeline is written once against two seams: a [`RegionSource`] that
//! finds and preprocesses plate regions, and a [`FragmentSource`] that reads
//! text from one region. Local mode backs both with in-process models;
//! distributed mode backs them with HTTP calls to the stage services.
//!
//! Regions are read concurrently (bounded by `workers`) but the result keeps
//! the detector's box order. A region that fails is logged and skipped.

pub mod debug;
pub mod local;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use image::{DynamicImage, ImageFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;
use crate::errors::PlateError;
use crate::plate::{aggregate, DetectionResult, NormalizedPlate, TextFragment};
use crate::vision::{decode_image_bytes_limited, BoundingBox, ImageError, MAX_IMAGE_SIZE};

pub use debug::DebugDump;
pub use local::{detect_regions, LocalFragmentSource, LocalRegionSource};

/// A decoded upload together with the bytes it was decoded from
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: Arc<DynamicImage>,
    /// The upload exactly as received
    pub encoded: Bytes,
    pub format: ImageFormat,
}

impl SourceImage {
    /// Decode an upload no larger than `max_bytes`
    pub fn decode(bytes: &[u8], max_bytes: usize) -> Result<Self, ImageError> {
        let (image, info) = decode_image_bytes_limited(bytes, max_bytes)?;
        debug!(
            "Decoded {:?} upload {}x{} ({} bytes)",
            info.format, info.width, info.height, info.size_bytes
        );
        Ok(Self {
            image: Arc::new(image),
            encoded: Bytes::copy_from_slice(bytes),
            format: info.format,
        })
    }
}

/// A detected plate region ready for recognition
#[derive(Debug, Clone)]
pub struct PlateRegion {
    /// Position in the detector's box order
    pub index: usize,
    pub bbox: BoundingBox,
    /// Detector score, when known
    pub confidence: Option<f32>,
    /// Preprocessed crop handed to the recognizer
    pub image: DynamicImage,
    /// Crop before preprocessing (local mode only)
    pub raw: Option<DynamicImage>,
}

/// Finds plate regions in a full image
#[async_trait]
pub trait RegionSource: Send + Sync {
    async fn regions(&self, source: &SourceImage) -> Result<Vec<PlateRegion>, PlateError>;
}

/// Reads text fragments from one region
#[async_trait]
pub trait FragmentSource: Send + Sync {
    /// Fail fast when the source can never answer
    fn ensure_ready(&self) -> Result<(), PlateError> {
        Ok(())
    }

    async fn fragments(&self, region: &PlateRegion) -> Result<Vec<TextFragment>, PlateError>;
}

/// Per-request behaviour shared by both modes
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Regions recognized concurrently
    pub workers: usize,
    pub include_fragments: bool,
    pub debug_dir: Option<PathBuf>,
    /// Largest upload accepted for decoding
    pub max_image_bytes: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            include_fragments: false,
            debug_dir: None,
            max_image_bytes: MAX_IMAGE_SIZE,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            workers: config.recognition_workers,
            include_fragments: config.include_fragments,
            debug_dir: config.debug_crop_dir.clone(),
            max_image_bytes: config.max_image_bytes,
        }
    }
}

pub struct PlatePipeline<R, F> {
    regions: R,
    fragments: F,
    workers: usize,
    include_fragments: bool,
    max_image_bytes: usize,
    debug: Option<DebugDump>,
}

impl<R, F> std::fmt::Debug for PlatePipeline<R, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatePipeline")
            .field("workers", &self.workers)
            .field("include_fragments", &self.include_fragments)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl<R, F> PlatePipeline<R, F>
where
    R: RegionSource,
    F: FragmentSource,
{
    pub fn new(regions: R, fragments: F, options: PipelineOptions) -> Self {
        Self {
            regions,
            fragments,
            workers: options.workers.max(1),
            include_fragments: options.include_fragments,
            max_image_bytes: options.max_image_bytes,
            debug: options.debug_dir.map(DebugDump::new),
        }
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Run detection and recognition over one image
    ///
    /// # Errors
    /// Fails only when region detection fails (or the fragment source can
    /// never answer). Failures inside a single region drop that region.
    pub async fn run(&self, source: &SourceImage) -> Result<DetectionResult, PlateError> {
        let started = Instant::now();
        self.fragments.ensure_ready()?;

        let regions = self.regions.regions(source).await?;
        let region_count = regions.len();
        let stamp = chrono::Utc::now().timestamp();

        let plates: Vec<Option<NormalizedPlate>> = stream::iter(regions)
            .map(|region| self.read_region(region, stamp))
            .buffered(self.workers)
            .collect()
            .await;

        let cars: Vec<NormalizedPlate> = plates.into_iter().flatten().collect();
        info!(
            "Read {} plates from {} regions in {}ms",
            cars.len(),
            region_count,
            started.elapsed().as_millis()
        );

        Ok(DetectionResult { cars })
    }

    async fn read_region(&self, region: PlateRegion, stamp: i64) -> Option<NormalizedPlate> {
        let (region, debug_file) = match &self.debug {
            Some(dump) => {
                let dump = dump.clone();
                let index = region.index;
                match tokio::task::spawn_blocking(move || {
                    let path = dump.save(stamp, &region);
                    (region, path)
                })
                .await
                {
                    Ok(saved) => saved,
                    Err(e) => {
                        warn!("Skipping region {}: debug dump task failed: {}", index, e);
                        return None;
                    }
                }
            }
            None => (region, None),
        };

        let fragments = match self.fragments.fragments(&region).await {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(
                    "Skipping region {} {:?}: [{}] {}",
                    region.index,
                    region.bbox,
                    e.error_code(),
                    e
                );
                return None;
            }
        };

        let Some(candidate) = aggregate(&fragments) else {
            debug!("Region {}: no qualifying fragments", region.index);
            return None;
        };

        let Some(mut plate) = NormalizedPlate::from_candidate(candidate) else {
            debug!("Region {}: text rejected by normalizer", region.index);
            return None;
        };

        if self.include_fragments {
            plate.fragments = Some(fragments);
        }
        plate.debug_file = debug_file;
        Some(plate)
    }
}
