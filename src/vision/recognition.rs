// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognition stage
//!
//! Wraps a [`TextRecognizer`] collaborator. Its output is decoded through
//! [`RecognizerOutput`] and filtered down to the fragments worth keeping.

use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use super::recognizer_output::RecognizerOutput;
use crate::errors::PlateError;
use crate::plate::TextFragment;

/// Fragments at or below this confidence are dropped
pub const MIN_FRAGMENT_CONFIDENCE: f32 = 0.3;

/// External text recognizer
#[cfg_attr(test, automock)]
pub trait TextRecognizer: Send + Sync {
    /// Read text from a preprocessed plate crop
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<RecognizerOutput>;
}

/// Keep non-empty fragments with confidence above the floor, in order
pub fn qualifying_fragments(output: RecognizerOutput) -> Vec<TextFragment> {
    output
        .into_fragments()
        .into_iter()
        .filter(|f| !f.text.is_empty() && f.confidence > MIN_FRAGMENT_CONFIDENCE)
        .collect()
}

#[derive(Clone)]
pub struct RecognitionStage {
    recognizer: Arc<dyn TextRecognizer>,
}

impl std::fmt::Debug for RecognitionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionStage").finish_non_exhaustive()
    }
}

impl RecognitionStage {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }

    /// Recognize text fragments in a preprocessed region
    ///
    /// # Errors
    /// `PlateError::ModelInference` when the collaborator fails.
    pub fn recognize(&self, image: &DynamicImage) -> Result<Vec<TextFragment>, PlateError> {
        let output = self
            .recognizer
            .recognize(image)
            .map_err(|e| PlateError::inference("recognition", format!("{:#}", e)))?;

        let fragments = qualifying_fragments(output);
        debug!("Recognized {} qualifying fragments", fragments.len());
        Ok(fragments)
    }
}
