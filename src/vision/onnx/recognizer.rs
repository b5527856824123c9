// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CTC plate text recognizer

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{build_session, input_name};
use crate::vision::preprocessing::preprocess_for_recognition;
use crate::vision::recognition::TextRecognizer;
use crate::vision::recognizer_output::RecognizerOutput;

/// Placeholder for the CTC blank at dictionary index 0
const BLANK: char = '\u{0}';

pub struct OnnxTextRecognizer {
    session: Arc<Mutex<Session>>,
    /// Index 0 is the CTC blank
    dictionary: Vec<char>,
    input_name: String,
}

impl std::fmt::Debug for OnnxTextRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxTextRecognizer")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OnnxTextRecognizer {
    /// Load the recognizer model and its character dictionary
    pub fn load<P: AsRef<Path>, D: AsRef<Path>>(model_path: P, dict_path: D) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();
        info!("Loading plate recognizer model from {}", model_path.display());

        let dictionary = load_dictionary(dict_path)?;
        let session = build_session(model_path, "Plate recognizer")?;
        let input_name = input_name(&session, "x");

        debug!(
            "Recognizer model loaded - input: {}, dictionary: {} symbols",
            input_name,
            dictionary.len()
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary,
            input_name,
        })
    }
}

impl TextRecognizer for OnnxTextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<RecognizerOutput> {
        let input = preprocess_for_recognition(image);
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Recognizer session lock poisoned"))?;
        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Recognition inference failed")?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let (text, confidence) = ctc_greedy_decode(output, &self.dictionary)?;
        Ok(RecognizerOutput::single(text, confidence))
    }
}

/// Load a dictionary file: one symbol per line, blank prepended at index 0
///
/// A trailing space symbol is appended when the file does not list one.
pub fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Vec<char>> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Recognizer dictionary not found: {}", path.display());
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

    let mut dictionary = vec![BLANK];
    for line in BufReader::new(file).lines() {
        let line = line.context("Failed to read dictionary line")?;
        let symbol = line.trim_end_matches('\r');
        if let Some(ch) = symbol.chars().next() {
            dictionary.push(ch);
        }
    }

    if dictionary.len() == 1 {
        anyhow::bail!("Recognizer dictionary is empty: {}", path.display());
    }
    if !dictionary[1..].contains(&' ') {
        dictionary.push(' ');
    }

    Ok(dictionary)
}

/// Greedy CTC decoding: argmax per step, collapse repeats, drop blanks
///
/// Confidence is the mean probability of the emitted symbols (0 when
/// nothing is emitted).
pub fn ctc_greedy_decode(output: ArrayViewD<f32>, dictionary: &[char]) -> Result<(String, f32)> {
    let shape = output.shape();
    let (steps, classes) = match shape.len() {
        3 => (shape[1], shape[2]),
        2 => (shape[0], shape[1]),
        _ => anyhow::bail!("Unexpected recognizer output shape: {:?}", shape),
    };

    let mut text = String::new();
    let mut total = 0.0f32;
    let mut emitted = 0usize;
    let mut previous: Option<usize> = None;

    for t in 0..steps {
        let mut best = (0usize, f32::NEG_INFINITY);
        for c in 0..classes {
            let prob = if shape.len() == 3 {
                output[IxDyn(&[0, t, c])]
            } else {
                output[IxDyn(&[t, c])]
            };
            if prob > best.1 {
                best = (c, prob);
            }
        }

        let (index, prob) = best;
        if index != 0 && previous != Some(index) {
            if let Some(&ch) = dictionary.get(index) {
                text.push(ch);
                total += prob;
                emitted += 1;
            }
        }
        previous = Some(index);
    }

    let confidence = if emitted == 0 {
        0.0
    } else {
        (total / emitted as f32).clamp(0.0, 1.0)
    };

    Ok((text, confidence))
}
