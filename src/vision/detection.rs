// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate detection stage
//!
//! Wraps a [`PlateDetector`] collaborator and turns its raw, float-valued
//! detections into integer boxes inside the image bounds. Boxes keep the
//! detector's own iteration order all the way to the final result.

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::errors::PlateError;

/// Default detector confidence threshold
pub const DEFAULT_CONFIDENCE: f32 = 0.3;

/// Default overlap threshold for non-max suppression
pub const DEFAULT_OVERLAP: f32 = 0.5;

/// Axis-aligned box in source image pixels, serialised as `[x1, y1, x2, y2]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u32; 4]", into = "[u32; 4]")]
pub struct BoundingBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl BoundingBox {
    /// Build a box; `None` when it has no area
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Option<Self> {
        (x1 < x2 && y1 < y2).then_some(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Clip to an image of the given size; `None` if nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        Self::new(
            self.x1.min(width),
            self.y1.min(height),
            self.x2.min(width),
            self.y2.min(height),
        )
    }
}

impl TryFrom<[u32; 4]> for BoundingBox {
    type Error = String;

    fn try_from([x1, y1, x2, y2]: [u32; 4]) -> Result<Self, Self::Error> {
        Self::new(x1, y1, x2, y2)
            .ok_or_else(|| format!("degenerate box [{}, {}, {}, {}]", x1, y1, x2, y2))
    }
}

impl From<BoundingBox> for [u32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One detection as the collaborator reports it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl RawDetection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
        }
    }

    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Intersection over union
    pub fn iou(&self, other: &RawDetection) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Truncate corners to whole pixels inside the image
    fn to_box(self, width: u32, height: u32) -> Option<BoundingBox> {
        let pixel = |v: f32, max: u32| {
            if v.is_nan() {
                0
            } else {
                (v.max(0.0) as u32).min(max)
            }
        };
        BoundingBox::new(
            pixel(self.x1, width),
            pixel(self.y1, height),
            pixel(self.x2, width),
            pixel(self.y2, height),
        )
    }
}

/// A surviving detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredBox {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// External plate detector
///
/// Returns boxes in the detector's native order. Implementations are
/// expected to honour both thresholds, but the stage applies them again.
#[cfg_attr(test, automock)]
pub trait PlateDetector: Send + Sync {
    fn detect(
        &self,
        image: &DynamicImage,
        confidence: f32,
        overlap: f32,
    ) -> anyhow::Result<Vec<RawDetection>>;
}

/// Greedy non-max suppression
///
/// Boxes are visited from highest to lowest confidence; a box is suppressed
/// when its IoU with an already kept box exceeds `overlap`. Survivors are
/// returned in their input order.
pub fn non_max_suppression(detections: &[RawDetection], overlap: f32) -> Vec<RawDetection> {
    let mut by_confidence: Vec<usize> = (0..detections.len()).collect();
    by_confidence.sort_by(|&a, &b| {
        detections[b]
            .confidence
            .partial_cmp(&detections[a].confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = vec![false; detections.len()];
    let mut kept: Vec<usize> = Vec::new();
    for index in by_confidence {
        let candidate = &detections[index];
        if kept
            .iter()
            .all(|&k| detections[k].iou(candidate) <= overlap)
        {
            keep[index] = true;
            kept.push(index);
        }
    }

    detections
        .iter()
        .zip(keep)
        .filter_map(|(d, k)| k.then_some(*d))
        .collect()
}

/// Cut a region out of the source image
pub fn crop_region(image: &DynamicImage, bbox: &BoundingBox) -> DynamicImage {
    image.crop_imm(bbox.x1, bbox.y1, bbox.width(), bbox.height())
}

/// Detection stage: collaborator + thresholds
#[derive(Clone)]
pub struct DetectionStage {
    detector: Arc<dyn PlateDetector>,
    confidence: f32,
    overlap: f32,
}

impl std::fmt::Debug for DetectionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionStage")
            .field("confidence", &self.confidence)
            .field("overlap", &self.overlap)
            .finish_non_exhaustive()
    }
}

impl DetectionStage {
    pub fn new(detector: Arc<dyn PlateDetector>) -> Self {
        Self {
            detector,
            confidence: DEFAULT_CONFIDENCE,
            overlap: DEFAULT_OVERLAP,
        }
    }

    pub fn with_thresholds(mut self, confidence: f32, overlap: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self.overlap = overlap.clamp(0.0, 1.0);
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence
    }

    pub fn overlap_threshold(&self) -> f32 {
        self.overlap
    }

    /// Find plate boxes in `image`, in detector order
    ///
    /// # Errors
    /// `PlateError::ModelInference` when the collaborator fails.
    pub fn detect(&self, image: &DynamicImage) -> Result<Vec<ScoredBox>, PlateError> {
        let raw = self
            .detector
            .detect(image, self.confidence, self.overlap)
            .map_err(|e| PlateError::inference("detection", format!("{:#}", e)))?;
        let reported = raw.len();

        let confident: Vec<RawDetection> = raw
            .into_iter()
            .filter(|d| d.confidence >= self.confidence)
            .collect();

        let (width, height) = image.dimensions();
        let boxes: Vec<ScoredBox> = non_max_suppression(&confident, self.overlap)
            .into_iter()
            .filter_map(|d| {
                d.to_box(width, height).map(|bbox| ScoredBox {
                    bbox,
                    confidence: d.confidence,
                })
            })
            .collect();

        debug!(
            "Detector reported {} boxes, {} kept after filtering",
            reported,
            boxes.len()
        );

        Ok(boxes)
    }
}
