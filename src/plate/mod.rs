// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate text model: grammar, OCR correction and fragment aggregation
//!
//! Everything in this module is pure and synchronous. It knows nothing
//! about images or models, only about recognized text.

pub mod aggregator;
pub mod grammar;
pub mod normalizer;

use serde::{Deserialize, Serialize};

pub use aggregator::aggregate;
pub use grammar::{is_standard_format, PLATE_LENGTH, PLATE_LETTERS};
pub use normalizer::{normalize, Correction, MIN_PLATE_CHARS};

/// One line of recognized text inside a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    /// Recognizer confidence (0.0-1.0)
    pub confidence: f32,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Fragments of one region merged into a single raw reading
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlateCandidate {
    /// Fragment texts joined by a single space, in recognition order
    pub raw_text: String,
    /// Arithmetic mean of fragment confidences
    pub average_confidence: f64,
}

/// A reported plate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPlate {
    /// Corrected plate text
    pub plate: String,
    /// Text as produced by the recognizer
    pub raw_text: String,
    /// Confidence in percent, one decimal place
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragments: Option<Vec<TextFragment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_file: Option<String>,
}

impl NormalizedPlate {
    /// Correct the candidate's text and build a plate, or `None` if the
    /// correction rejects it
    pub fn from_candidate(candidate: RawPlateCandidate) -> Option<Self> {
        let corrected = normalize(&candidate.raw_text).into_text()?;
        Some(Self {
            plate: corrected,
            confidence: confidence_percent(candidate.average_confidence),
            raw_text: candidate.raw_text,
            fragments: None,
            debug_file: None,
        })
    }
}

/// round(confidence * 100, 1), kept inside 0..=100
///
/// Exact halves round to even: 0.3125 becomes 31.2, 0.4375 becomes 43.8.
pub fn confidence_percent(confidence: f64) -> f64 {
    let percent = (confidence * 1000.0).round_ties_even() / 10.0;
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// All plates found in one image, in the detector's box order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub cars: Vec<NormalizedPlate>,
}

impl DetectionResult {
    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }
}
