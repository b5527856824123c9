// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime implementations of the detector and recognizer collaborators
//!
//! Both run on CPU only.

pub mod detector;
pub mod recognizer;

pub use detector::OnnxPlateDetector;
pub use recognizer::OnnxTextRecognizer;

use anyhow::{Context, Result};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;

/// Intra-op threads per session
const INTRA_THREADS: usize = 4;

/// Open an ONNX model with the CPU provider and full graph optimisation
pub(crate) fn build_session(model_path: &Path, what: &str) -> Result<Session> {
    if !model_path.exists() {
        anyhow::bail!("{} model not found: {}", what, model_path.display());
    }

    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(INTRA_THREADS)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load {} model from {}", what, model_path.display()))
}

/// Name of the first model input, or `fallback`
pub(crate) fn input_name(session: &Session, fallback: &str) -> String {
    session
        .inputs
        .first()
        .map(|input| input.name.clone())
        .unwrap_or_else(|| fallback.to_string())
}
