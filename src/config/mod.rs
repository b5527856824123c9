// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Everything is read from environment variables (a `.env` file is loaded
//! by the binaries first). Unparseable numbers fall back to their defaults;
//! an unknown role is an error.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Which part of the pipeline this process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Both models in one process, serves `/detect`
    Monolith,
    /// Detection stage service, serves `/detect_plates`
    Detector,
    /// Recognition stage service, serves `/recognize_text`
    Recognizer,
    /// No models; serves `/detect` by calling the stage services
    Orchestrator,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Monolith => "monolith",
            NodeRole::Detector => "detector",
            NodeRole::Recognizer => "recognizer",
            NodeRole::Orchestrator => "orchestrator",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            NodeRole::Monolith | NodeRole::Orchestrator => 8000,
            NodeRole::Detector => 8001,
            NodeRole::Recognizer => 8002,
        }
    }

    pub fn loads_detector(&self) -> bool {
        matches!(self, NodeRole::Monolith | NodeRole::Detector)
    }

    pub fn loads_recognizer(&self) -> bool {
        matches!(self, NodeRole::Monolith | NodeRole::Recognizer)
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monolith" | "local" => Ok(NodeRole::Monolith),
            "detector" => Ok(NodeRole::Detector),
            "recognizer" => Ok(NodeRole::Recognizer),
            "orchestrator" | "distributed" => Ok(NodeRole::Orchestrator),
            other => Err(format!(
                "unknown NODE_ROLE '{}' (expected monolith, detector, recognizer or orchestrator)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub role: NodeRole,
    pub host: String,
    pub port: u16,
    pub detector_model_path: PathBuf,
    /// Letterbox size fed to the detector
    pub detector_input_size: u32,
    pub recognizer_model_path: PathBuf,
    pub recognizer_dict_path: PathBuf,
    pub detection_confidence: f32,
    pub detection_iou: f32,
    pub detection_service_url: String,
    pub recognition_service_url: String,
    /// Per remote call timeout in seconds
    pub remote_timeout_secs: u64,
    /// Regions recognized concurrently within one request
    pub recognition_workers: usize,
    pub include_fragments: bool,
    /// When set, region crops are written here
    pub debug_crop_dir: Option<PathBuf>,
    pub max_image_bytes: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: NodeRole::Monolith,
            host: "0.0.0.0".to_string(),
            port: NodeRole::Monolith.default_port(),
            detector_model_path: PathBuf::from("./models/plate_detector.onnx"),
            detector_input_size: 640,
            recognizer_model_path: PathBuf::from("./models/plate_rec.onnx"),
            recognizer_dict_path: PathBuf::from("./models/plate_dict.txt"),
            detection_confidence: 0.3,
            detection_iou: 0.5,
            detection_service_url: "http://localhost:8001".to_string(),
            recognition_service_url: "http://localhost:8002".to_string(),
            remote_timeout_secs: 30,
            recognition_workers: 4,
            include_fragments: false,
            debug_crop_dir: None,
            max_image_bytes: MAX_IMAGE_SIZE,
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let role = match lookup("NODE_ROLE") {
            Some(value) => value.parse()?,
            None => defaults.role,
        };

        Ok(Self {
            role,
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "API_PORT").unwrap_or_else(|| role.default_port()),
            detector_model_path: lookup("DETECTOR_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.detector_model_path),
            detector_input_size: parse_var(&lookup, "DETECTOR_INPUT_SIZE")
                .unwrap_or(defaults.detector_input_size),
            recognizer_model_path: lookup("RECOGNIZER_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.recognizer_model_path),
            recognizer_dict_path: lookup("RECOGNIZER_DICT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.recognizer_dict_path),
            detection_confidence: parse_var(&lookup, "DETECTION_CONFIDENCE")
                .unwrap_or(defaults.detection_confidence),
            detection_iou: parse_var(&lookup, "DETECTION_IOU").unwrap_or(defaults.detection_iou),
            detection_service_url: lookup("DETECTION_SERVICE_URL")
                .unwrap_or(defaults.detection_service_url),
            recognition_service_url: lookup("RECOGNITION_SERVICE_URL")
                .unwrap_or(defaults.recognition_service_url),
            remote_timeout_secs: parse_var(&lookup, "REMOTE_TIMEOUT_SECS")
                .unwrap_or(defaults.remote_timeout_secs),
            recognition_workers: parse_var(&lookup, "RECOGNITION_WORKERS")
                .unwrap_or(defaults.recognition_workers),
            include_fragments: lookup("INCLUDE_FRAGMENTS")
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(defaults.include_fragments),
            debug_crop_dir: lookup("DEBUG_CROP_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            max_image_bytes: parse_var(&lookup, "MAX_IMAGE_BYTES").unwrap_or(defaults.max_image_bytes),
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.detection_confidence) {
            return Err("DETECTION_CONFIDENCE must be between 0 and 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.detection_iou) {
            return Err("DETECTION_IOU must be between 0 and 1".to_string());
        }
        if self.detector_input_size < 32 {
            return Err("DETECTOR_INPUT_SIZE must be at least 32".to_string());
        }
        if self.remote_timeout_secs == 0 {
            return Err("REMOTE_TIMEOUT_SECS must be at least 1".to_string());
        }
        if self.recognition_workers == 0 {
            return Err("RECOGNITION_WORKERS must be at least 1".to_string());
        }
        if self.max_image_bytes == 0 {
            return Err("MAX_IMAGE_BYTES must be at least 1".to_string());
        }
        if self.role == NodeRole::Orchestrator {
            for (name, url) in [
                ("DETECTION_SERVICE_URL", &self.detection_service_url),
                ("RECOGNITION_SERVICE_URL", &self.recognition_service_url),
            ] {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(format!("{} must be an http(s) URL", name));
                }
            }
        }
        Ok(())
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}
