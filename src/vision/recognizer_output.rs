// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoder for the shapes a text recognizer may answer with
//!
//! Different recognizer versions return either parallel `rec_texts` /
//! `rec_scores` columns, a list of `[points, [text, score]]` lines, or a
//! batch of pages holding one of those. Everything funnels through
//! [`RecognizerOutput::into_fragments`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::plate::TextFragment;

/// Raw recognizer output, one variant per known shape
///
/// Variants are tried top to bottom when deserialising.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecognizerOutput {
    /// `{"fragments": [{"text", "confidence"}]}`
    Fragments { fragments: Vec<TextFragment> },
    /// `{"rec_texts": [..], "rec_scores": [..]}`
    Columns {
        rec_texts: Vec<String>,
        rec_scores: Vec<f32>,
    },
    /// `[[points, [text, score]], ..]`
    Lines(Vec<(Value, (String, f32))>),
    /// One entry per page; only the first page is read
    Batch(Vec<RecognizerOutput>),
    Unrecognized(Value),
}

impl RecognizerOutput {
    /// Single column pair, the shape emitted by the bundled ONNX recognizer
    pub fn single(text: impl Into<String>, score: f32) -> Self {
        RecognizerOutput::Columns {
            rec_texts: vec![text.into()],
            rec_scores: vec![score],
        }
    }

    /// Flatten into fragments in recognition order
    ///
    /// No confidence filtering happens here.
    pub fn into_fragments(self) -> Vec<TextFragment> {
        match self {
            RecognizerOutput::Fragments { fragments } => fragments,
            RecognizerOutput::Columns {
                rec_texts,
                rec_scores,
            } => {
                if rec_texts.len() != rec_scores.len() {
                    debug!(
                        "Recognizer returned {} texts but {} scores",
                        rec_texts.len(),
                        rec_scores.len()
                    );
                }
                rec_texts
                    .into_iter()
                    .zip(rec_scores)
                    .map(|(text, score)| TextFragment::new(text, score))
                    .collect()
            }
            RecognizerOutput::Lines(lines) => lines
                .into_iter()
                .map(|(_, (text, score))| TextFragment::new(text, score))
                .collect(),
            RecognizerOutput::Batch(pages) => pages
                .into_iter()
                .next()
                .map(RecognizerOutput::into_fragments)
                .unwrap_or_default(),
            RecognizerOutput::Unrecognized(Value::Null) => Vec::new(),
            RecognizerOutput::Unrecognized(other) => {
                warn!("Unrecognized recognizer output shape: {}", shape_hint(&other));
                Vec::new()
            }
        }
    }
}

fn shape_hint(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
