// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for plate reading
//!
//! This module provides:
//! - Plate detection (boxes in source image coordinates)
//! - Region preprocessing (grayscale, upscale, CLAHE)
//! - Plate text recognition
//!
//! Both models run on CPU via ONNX Runtime.

pub mod clahe;
pub mod detection;
pub mod image_utils;
pub mod model_manager;
pub mod onnx;
pub mod preprocessing;
pub mod recognition;
pub mod recognizer_output;

pub use detection::{
    crop_region, non_max_suppression, BoundingBox, DetectionStage, PlateDetector, RawDetection,
    ScoredBox,
};
pub use image_utils::{
    decode_base64_image, decode_image_bytes, decode_image_bytes_limited, detect_format,
    encode_base64_png, encode_png, ImageError, ImageInfo, MAX_IMAGE_SIZE,
};
pub use model_manager::{PlateModelInfo, PlateModels};
pub use preprocessing::RegionPreprocessor;
pub use recognition::{
    qualifying_fragments, RecognitionStage, TextRecognizer, MIN_FRAGMENT_CONFIDENCE,
};
pub use recognizer_output::RecognizerOutput;
