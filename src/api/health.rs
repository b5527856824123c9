// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! `GET /health`

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::http_server::AppState;
use crate::config::NodeRole;
use crate::version::VERSION_NUMBER;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when a model this role needs is missing
    pub status: String,
    pub role: String,
    pub version: String,
    pub detector_loaded: bool,
    pub recognizer_loaded: bool,
}

impl HealthResponse {
    pub fn for_state(state: &AppState) -> Self {
        let detector_loaded = state.models.detector_loaded();
        let recognizer_loaded = state.models.recognizer_loaded();
        let ready = match state.role {
            NodeRole::Monolith => detector_loaded && recognizer_loaded,
            NodeRole::Detector => detector_loaded,
            NodeRole::Recognizer => recognizer_loaded,
            NodeRole::Orchestrator => state.orchestrator.is_some(),
        };

        Self {
            status: if ready { "ok" } else { "degraded" }.to_string(),
            role: state.role.to_string(),
            version: VERSION_NUMBER.to_string(),
            detector_loaded,
            recognizer_loaded,
        }
    }
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::for_state(&state))
}
