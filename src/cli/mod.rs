// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{NodeConfig, NodeRole};
use crate::orchestration::Orchestrator;
use crate::pipeline::PipelineOptions;
use crate::plate::DetectionResult;
use crate::vision::PlateModels;

/// Read the plates in a single image and print them as JSON
#[derive(Parser, Debug, Clone)]
#[command(name = "plate-cli")]
#[command(version)]
#[command(about = "Detect, read and normalise licence plates in one image", long_about = None)]
pub struct PlateCliArgs {
    /// Image file to read
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Plate detector ONNX model
    #[arg(long, env = "DETECTOR_MODEL_PATH", default_value = "./models/plate_detector.onnx")]
    pub detector_model: PathBuf,

    /// Text recognizer ONNX model
    #[arg(long, env = "RECOGNIZER_MODEL_PATH", default_value = "./models/plate_rec.onnx")]
    pub recognizer_model: PathBuf,

    /// Character dictionary for the recognizer
    #[arg(long = "dict", env = "RECOGNIZER_DICT_PATH", default_value = "./models/plate_dict.txt")]
    pub dict: PathBuf,

    /// Minimum detector confidence
    #[arg(long, env = "DETECTION_CONFIDENCE", default_value_t = 0.3)]
    pub confidence: f32,

    /// Attach the qualifying fragments to each plate
    #[arg(long)]
    pub include_fragments: bool,

    /// Write region crops to this directory
    #[arg(long, env = "DEBUG_CROP_DIR")]
    pub debug_dir: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl PlateCliArgs {
    /// Monolith configuration with the paths given on the command line
    pub fn node_config(&self) -> NodeConfig {
        NodeConfig {
            role: NodeRole::Monolith,
            detector_model_path: self.detector_model.clone(),
            recognizer_model_path: self.recognizer_model.clone(),
            recognizer_dict_path: self.dict.clone(),
            detection_confidence: self.confidence,
            include_fragments: self.include_fragments,
            debug_crop_dir: self.debug_dir.clone(),
            ..NodeConfig::default()
        }
    }
}

/// Run the local pipeline once over `args.image`
pub async fn execute(args: &PlateCliArgs) -> Result<DetectionResult> {
    let config = args.node_config();
    config.validate().map_err(|e| anyhow!(e))?;

    let bytes = tokio::fs::read(&args.image).await?;

    let models = tokio::task::spawn_blocking({
        let config = config.clone();
        move || PlateModels::load(&config)
    })
    .await?;
    if !models.detector_loaded() || !models.recognizer_loaded() {
        warn!("Not all models loaded; see the errors above");
    }

    let orchestrator = Orchestrator::local(Arc::new(models), PipelineOptions::from_config(&config));
    let result = orchestrator.process_image(&bytes).await?;

    info!("Read {} plates from {}", result.len(), args.image.display());
    Ok(result)
}

/// Serialize a result the way the command prints it
pub fn render(result: &DetectionResult, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    })
}
