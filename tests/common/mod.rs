// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fakes for the integration tests
//!
//! The fake recognizer tells regions apart by the width of the crop it
//! receives. Scenes use boxes at least 80px tall so crops are never
//! upscaled and keep their box width through preprocessing.

#![allow(dead_code)]

use anyhow::bail;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use plate_reader_node::vision::{
    encode_png, PlateDetector, PlateModels, RawDetection, RecognizerOutput, TextRecognizer,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SCENE_WIDTH: u32 = 800;
pub const SCENE_HEIGHT: u32 = 600;

/// Detector that always reports the same boxes
#[derive(Default)]
pub struct FakeDetector {
    pub detections: Vec<RawDetection>,
    pub delay: Duration,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl FakeDetector {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self {
            detections,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl PlateDetector for FakeDetector {
    fn detect(
        &self,
        _image: &DynamicImage,
        _confidence: f32,
        _overlap: f32,
    ) -> anyhow::Result<Vec<RawDetection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if self.fail {
            bail!("detector exploded");
        }
        Ok(self.detections.clone())
    }
}

/// What the recognizer answers for crops of one width
#[derive(Clone)]
pub struct Reading {
    pub output: RecognizerOutput,
    pub delay: Duration,
    pub fail: bool,
}

impl Reading {
    pub fn text(text: &str, score: f32) -> Self {
        Self::output(RecognizerOutput::single(text, score))
    }

    pub fn output(output: RecognizerOutput) -> Self {
        Self {
            output,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            output: RecognizerOutput::Unrecognized(serde_json::Value::Null),
            delay: Duration::ZERO,
            fail: true,
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Recognizer keyed by crop width; unknown widths read nothing
#[derive(Default)]
pub struct FakeRecognizer {
    pub readings: HashMap<u32, Reading>,
    pub calls: AtomicUsize,
}

impl FakeRecognizer {
    pub fn new(readings: impl IntoIterator<Item = (u32, Reading)>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl TextRecognizer for FakeRecognizer {
    fn recognize(&self, image: &DynamicImage) -> anyhow::Result<RecognizerOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.readings.get(&image.width()) {
            Some(reading) => {
                std::thread::sleep(reading.delay);
                if reading.fail {
                    bail!("recognizer exploded on {}px crop", image.width());
                }
                Ok(reading.output.clone())
            }
            None => Ok(RecognizerOutput::Unrecognized(serde_json::Value::Null)),
        }
    }
}

/// A box `width` wide and 100px tall with its top-left corner at (x, y)
pub fn plate_box(x: f32, y: f32, width: f32, confidence: f32) -> RawDetection {
    RawDetection::new(x, y, x + width, y + 100.0, confidence)
}

pub fn scene_png() -> Vec<u8> {
    encode_png(&DynamicImage::new_rgb8(SCENE_WIDTH, SCENE_HEIGHT)).unwrap()
}

/// Deterministic per-pixel noise, which no codec compresses well
pub fn noisy_photo(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x2545_F491;
    let mut next = move || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 24) as u8
    };
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        Rgb([next(), next(), next()])
    }))
}

/// A camera-sized noisy JPEG; the same pixels as PNG exceed 10 MiB
pub fn large_noisy_jpeg() -> Vec<u8> {
    let mut bytes = Vec::new();
    noisy_photo(2400, 1800)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, 85))
        .unwrap();
    bytes
}

pub fn models(detector: FakeDetector, recognizer: FakeRecognizer) -> PlateModels {
    PlateModels::from_parts(Some(Arc::new(detector)), Some(Arc::new(recognizer)))
}

/// Three plates left to right: widths 200, 250 and 190
pub fn three_plate_models() -> PlateModels {
    models(
        FakeDetector::new(vec![
            plate_box(10.0, 10.0, 200.0, 0.9),
            plate_box(300.0, 200.0, 250.0, 0.8),
            plate_box(600.0, 400.0, 190.0, 0.7),
        ]),
        FakeRecognizer::new([
            (200, Reading::text("AA1234BB", 0.9)),
            (
                250,
                Reading::output(RecognizerOutput::Columns {
                    rec_texts: vec!["KA".into(), "0123".into(), "XT".into()],
                    rec_scores: vec![0.8, 0.6, 0.7],
                }),
            ),
            (190, Reading::text("8O12B4IO", 0.5)),
        ]),
    )
}
