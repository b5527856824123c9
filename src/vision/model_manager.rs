// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate model context
//!
//! Loaded once at start-up and shared read-only by every request.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::NodeConfig;
use crate::errors::PlateError;
use crate::vision::detection::{DetectionStage, PlateDetector};
use crate::vision::onnx::{OnnxPlateDetector, OnnxTextRecognizer};
use crate::vision::preprocessing::RegionPreprocessor;
use crate::vision::recognition::{RecognitionStage, TextRecognizer};

/// Information about a loaded model
#[derive(Debug, Clone)]
pub struct PlateModelInfo {
    pub name: &'static str,
    pub available: bool,
}

/// Detection and recognition stages available to this process
///
/// A model that fails to load is logged and left absent; callers that need
/// it get `PlateError::NotReady`.
#[derive(Debug, Clone, Default)]
pub struct PlateModels {
    detection: Option<DetectionStage>,
    recognition: Option<RecognitionStage>,
    preprocessor: RegionPreprocessor,
}

impl PlateModels {
    /// Load the models the configured role needs
    pub fn load(config: &NodeConfig) -> Self {
        let detection = if config.role.loads_detector() {
            match OnnxPlateDetector::load(&config.detector_model_path, config.detector_input_size) {
                Ok(detector) => {
                    info!(
                        "✅ Plate detector loaded from {}",
                        config.detector_model_path.display()
                    );
                    Some(
                        DetectionStage::new(Arc::new(detector))
                            .with_thresholds(config.detection_confidence, config.detection_iou),
                    )
                }
                Err(e) => {
                    warn!("⚠️ Failed to load plate detector: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        let recognition = if config.role.loads_recognizer() {
            match OnnxTextRecognizer::load(
                &config.recognizer_model_path,
                &config.recognizer_dict_path,
            ) {
                Ok(recognizer) => {
                    info!(
                        "✅ Plate recognizer loaded from {}",
                        config.recognizer_model_path.display()
                    );
                    Some(RecognitionStage::new(Arc::new(recognizer)))
                }
                Err(e) => {
                    warn!("⚠️ Failed to load plate recognizer: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            detection,
            recognition,
            preprocessor: RegionPreprocessor::default(),
        }
    }

    /// Build from arbitrary collaborators
    pub fn from_parts(
        detector: Option<Arc<dyn PlateDetector>>,
        recognizer: Option<Arc<dyn TextRecognizer>>,
    ) -> Self {
        Self {
            detection: detector.map(DetectionStage::new),
            recognition: recognizer.map(RecognitionStage::new),
            preprocessor: RegionPreprocessor::default(),
        }
    }

    pub fn with_detection_thresholds(mut self, confidence: f32, overlap: f32) -> Self {
        self.detection = self
            .detection
            .map(|stage| stage.with_thresholds(confidence, overlap));
        self
    }

    pub fn detection(&self) -> Result<&DetectionStage, PlateError> {
        self.detection
            .as_ref()
            .ok_or_else(|| PlateError::NotReady("plate detector".to_string()))
    }

    pub fn recognition(&self) -> Result<&RecognitionStage, PlateError> {
        self.recognition
            .as_ref()
            .ok_or_else(|| PlateError::NotReady("plate recognizer".to_string()))
    }

    pub fn preprocessor(&self) -> &RegionPreprocessor {
        &self.preprocessor
    }

    pub fn detector_loaded(&self) -> bool {
        self.detection.is_some()
    }

    pub fn recognizer_loaded(&self) -> bool {
        self.recognition.is_some()
    }

    /// List models and their availability
    pub fn list_models(&self) -> Vec<PlateModelInfo> {
        vec![
            PlateModelInfo {
                name: "plate-detector",
                available: self.detector_loaded(),
            },
            PlateModelInfo {
                name: "plate-recognizer",
                available: self.recognizer_loaded(),
            },
        ]
    }
}
