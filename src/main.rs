// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use plate_reader_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    version,
};
use std::env;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("🚀 Starting {}", version::get_version_string());
    info!("📦 BUILD VERSION: {}", version::VERSION);
    info!("Features: {}", version::FEATURES.join(", "));

    let config = NodeConfig::from_env().map_err(|e| anyhow!(e))?;
    config
        .validate()
        .map_err(|e| anyhow!("Invalid configuration: {}", e))?;
    info!("Role: {}", config.role);

    let state = tokio::task::spawn_blocking({
        let config = config.clone();
        move || AppState::from_config(&config)
    })
    .await??;

    for model in state.models.list_models() {
        if model.available {
            info!("Model {} ready", model.name);
        }
    }
    if config.role.loads_detector() && !state.models.detector_loaded() {
        warn!("Detector not loaded; detection requests will return 503");
    }
    if config.role.loads_recognizer() && !state.models.recognizer_loaded() {
        warn!("Recognizer not loaded; recognition requests will return 503");
    }
    if let Some(dir) = &config.debug_crop_dir {
        info!("Saving region crops to {}", dir.display());
    }

    start_server(config, state).await?;

    info!("👋 Goodbye!");
    Ok(())
}
