// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO-style plate detector
//!
//! Expects a single-input model taking a letterboxed `[1, 3, S, S]` tensor
//! scaled to [0, 1] and producing `[1, 4 + classes, N]` (or the transposed
//! `[1, N, 4 + classes]`) with centre-format boxes in letterbox pixels.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{ArrayViewD, Ix3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{build_session, input_name};
use crate::vision::detection::{non_max_suppression, PlateDetector, RawDetection};
use crate::vision::preprocessing::{preprocess_for_detection, PreprocessInfo};

pub struct OnnxPlateDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    input_size: u32,
}

impl std::fmt::Debug for OnnxPlateDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxPlateDetector")
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl OnnxPlateDetector {
    /// Load the detector model
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime rejects it.
    pub fn load<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!("Loading plate detector model from {}", model_path.display());

        let session = build_session(model_path, "Plate detector")?;
        let input_name = input_name(&session, "images");
        debug!("Detector model loaded - input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            input_size,
        })
    }
}

impl PlateDetector for OnnxPlateDetector {
    fn detect(
        &self,
        image: &DynamicImage,
        confidence: f32,
        overlap: f32,
    ) -> Result<Vec<RawDetection>> {
        let info = PreprocessInfo::new(image, self.input_size);
        let input = preprocess_for_detection(image, self.input_size);
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detector session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let candidates = parse_yolo_output(output, &info, confidence)?;
        Ok(non_max_suppression(&candidates, overlap))
    }
}

/// Decode a YOLO head into source-image detections at or above `confidence`
pub fn parse_yolo_output(
    output: ArrayViewD<f32>,
    info: &PreprocessInfo,
    confidence: f32,
) -> Result<Vec<RawDetection>> {
    let output = output
        .into_dimensionality::<Ix3>()
        .with_context(|| "Unexpected detector output rank, expected 3")?;
    let (_, rows, cols) = output.dim();

    // Channels-first unless the first axis is clearly the anchor axis
    let channels_first = rows <= cols;
    let (features, anchors) = if channels_first {
        (rows, cols)
    } else {
        (cols, rows)
    };
    if features < 5 {
        anyhow::bail!("Detector output has {} features, expected at least 5", features);
    }

    let value = |feature: usize, anchor: usize| {
        if channels_first {
            output[[0, feature, anchor]]
        } else {
            output[[0, anchor, feature]]
        }
    };

    let mut detections = Vec::new();
    for anchor in 0..anchors {
        let score = (4..features)
            .map(|f| value(f, anchor))
            .fold(f32::NEG_INFINITY, f32::max);
        if score < confidence {
            continue;
        }

        let (cx, cy) = (value(0, anchor), value(1, anchor));
        let (w, h) = (value(2, anchor), value(3, anchor));
        let (x1, y1) = info.map_to_original(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = info.map_to_original(cx + w / 2.0, cy + h / 2.0);
        detections.push(RawDetection::new(x1, y1, x2, y2, score));
    }

    debug!("Detector produced {} candidates above {}", detections.len(), confidence);
    Ok(detections)
}
