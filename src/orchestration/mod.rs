// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request orchestration
//!
//! One entry point, [`Orchestrator::process_image`], for both deployment
//! modes. Local mode runs the models in this process; distributed mode
//! calls the detection and recognition services over HTTP. Both feed the
//! same [`PlatePipeline`], so normalization and aggregation never differ.

pub mod remote;
pub mod wire;

use std::sync::Arc;

use crate::config::{NodeConfig, NodeRole};
use crate::errors::PlateError;
use crate::pipeline::{
    LocalFragmentSource, LocalRegionSource, PipelineOptions, PlatePipeline, SourceImage,
};
use crate::plate::DetectionResult;
use crate::vision::PlateModels;

pub use remote::{RemoteDetectionClient, RemoteRecognitionClient};

pub type LocalPipeline = PlatePipeline<LocalRegionSource, LocalFragmentSource>;
pub type DistributedPipeline = PlatePipeline<RemoteDetectionClient, RemoteRecognitionClient>;

#[derive(Debug)]
pub enum Orchestrator {
    Local(LocalPipeline),
    Distributed(DistributedPipeline),
}

impl Orchestrator {
    pub fn local(models: Arc<PlateModels>, options: PipelineOptions) -> Self {
        let keep_raw = options.debug_dir.is_some();
        Orchestrator::Local(PlatePipeline::new(
            LocalRegionSource::new(models.clone()).with_raw_crops(keep_raw),
            LocalFragmentSource::new(models),
            options,
        ))
    }

    pub fn distributed(config: &NodeConfig) -> Result<Self, PlateError> {
        let timeout = config.remote_timeout();
        let detection = RemoteDetectionClient::new(&config.detection_service_url, timeout)?;
        let recognition = RemoteRecognitionClient::new(&config.recognition_service_url, timeout)?;

        Ok(Orchestrator::Distributed(PlatePipeline::new(
            detection,
            recognition,
            PipelineOptions::from_config(config),
        )))
    }

    /// Pick the mode the configured role calls for
    ///
    /// Returns `None` for the stage service roles, which do not orchestrate.
    pub fn for_role(
        config: &NodeConfig,
        models: Arc<PlateModels>,
    ) -> Result<Option<Self>, PlateError> {
        match config.role {
            NodeRole::Monolith => Ok(Some(Self::local(
                models,
                PipelineOptions::from_config(config),
            ))),
            NodeRole::Orchestrator => Self::distributed(config).map(Some),
            NodeRole::Detector | NodeRole::Recognizer => Ok(None),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Orchestrator::Local(_) => "local",
            Orchestrator::Distributed(_) => "distributed",
        }
    }

    /// Largest upload [`process_image`](Self::process_image) will decode
    pub fn max_image_bytes(&self) -> usize {
        match self {
            Orchestrator::Local(pipeline) => pipeline.max_image_bytes(),
            Orchestrator::Distributed(pipeline) => pipeline.max_image_bytes(),
        }
    }

    /// Decode an uploaded image and read every plate in it
    ///
    /// # Errors
    /// - `PlateError::Input` if the bytes are too large or not a decodable image
    /// - whatever region detection fails with
    pub async fn process_image(&self, bytes: &[u8]) -> Result<DetectionResult, PlateError> {
        let source = SourceImage::decode(bytes, self.max_image_bytes())?;

        match self {
            Orchestrator::Local(pipeline) => pipeline.run(&source).await,
            Orchestrator::Distributed(pipeline) => pipeline.run(&source).await,
        }
    }
}
