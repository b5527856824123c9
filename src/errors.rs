// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error taxonomy for the plate reading pipeline
//!
//! Every failure the pipeline can surface falls into one of a few kinds:
//! - input errors (the upload is not a decodable image)
//! - model inference errors (detector or recognizer call failed)
//! - remote errors (a downstream stage service is unreachable or timed out)
//!
//! None of these are retried inside the pipeline.

use thiserror::Error;

use crate::vision::image_utils::ImageError;

/// Coarse classification used for propagation and HTTP mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    ModelInference,
    RemoteUnavailable,
    NotReady,
    Internal,
}

/// Errors produced by the detection/recognition pipeline
#[derive(Error, Debug)]
pub enum PlateError {
    /// Upload could not be read as an image
    #[error("Invalid image: {0}")]
    Input(#[from] ImageError),

    /// Detector or recognizer call failed
    #[error("{stage} inference failed: {message}")]
    ModelInference { stage: &'static str, message: String },

    /// Downstream stage service unreachable or returned an error
    #[error("{service} service unavailable: {reason}")]
    RemoteUnavailable { service: &'static str, reason: String },

    /// Downstream stage service did not answer in time
    #[error("{service} service timed out after {timeout_secs}s")]
    RemoteTimeout {
        service: &'static str,
        timeout_secs: u64,
    },

    /// Required model is not loaded in this process
    #[error("Models not loaded: {0}")]
    NotReady(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlateError {
    /// Build an inference error for the given stage from any collaborator error
    pub fn inference(stage: &'static str, err: impl std::fmt::Display) -> Self {
        PlateError::ModelInference {
            stage,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PlateError::Input(_) => ErrorKind::Input,
            PlateError::ModelInference { .. } => ErrorKind::ModelInference,
            PlateError::RemoteUnavailable { .. } | PlateError::RemoteTimeout { .. } => {
                ErrorKind::RemoteUnavailable
            }
            PlateError::NotReady(_) => ErrorKind::NotReady,
            PlateError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            PlateError::Input(_) => "INPUT_ERROR",
            PlateError::ModelInference { .. } => "MODEL_INFERENCE_ERROR",
            PlateError::RemoteUnavailable { .. } => "REMOTE_UNAVAILABLE",
            PlateError::RemoteTimeout { .. } => "REMOTE_TIMEOUT",
            PlateError::NotReady(_) => "NOT_READY",
            PlateError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<tokio::task::JoinError> for PlateError {
    fn from(err: tokio::task::JoinError) -> Self {
        PlateError::Internal(format!("worker task failed: {}", err))
    }
}
