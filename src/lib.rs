// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod orchestration;
pub mod pipeline;
pub mod plate;
pub mod version;
pub mod vision;

// Re-export main types
pub use config::{NodeConfig, NodeRole};
pub use errors::PlateError;
pub use orchestration::Orchestrator;
pub use pipeline::{PipelineOptions, PlatePipeline};
pub use plate::{DetectionResult, NormalizedPlate, TextFragment};
pub use vision::PlateModels;
