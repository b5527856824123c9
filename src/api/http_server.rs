// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::detect::detect_handler;
use super::health::health_handler;
use super::services::{detect_plates_handler, recognize_text_handler};
use crate::config::{NodeConfig, NodeRole};
use crate::orchestration::Orchestrator;
use crate::vision::PlateModels;

/// Room for multipart framing around the largest accepted image
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared handler state, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub role: NodeRole,
    pub models: Arc<PlateModels>,
    /// Present for roles that serve `/detect`
    pub orchestrator: Option<Arc<Orchestrator>>,
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(
        role: NodeRole,
        models: Arc<PlateModels>,
        orchestrator: Option<Orchestrator>,
        max_image_bytes: usize,
    ) -> Self {
        Self {
            role,
            models,
            orchestrator: orchestrator.map(Arc::new),
            max_image_bytes,
        }
    }

    /// Build state for the configured role: load its models and orchestrator
    pub fn from_config(config: &NodeConfig) -> anyhow::Result<Self> {
        let models = Arc::new(PlateModels::load(config));
        let orchestrator = Orchestrator::for_role(config, models.clone())?;
        Ok(Self::new(
            config.role,
            models,
            orchestrator,
            config.max_image_bytes,
        ))
    }
}

/// Routes served by each role, plus `/health` everywhere
pub fn create_router(state: AppState) -> Router {
    let router = Router::new().route("/health", get(health_handler));

    let router = match state.role {
        NodeRole::Monolith | NodeRole::Orchestrator => {
            router.route("/detect", post(detect_handler))
        }
        NodeRole::Detector => router.route("/detect_plates", post(detect_plates_handler)),
        NodeRole::Recognizer => router.route("/recognize_text", post(recognize_text_handler)),
    };

    router
        .layer(DefaultBodyLimit::max(
            state.max_image_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(config: NodeConfig, state: AppState) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 {} node listening on {}", config.role, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("⏹️  Shutting down...");
            }
        })
        .await?;

    Ok(())
}
