// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health for every role

use super::support::*;
use crate::common::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use plate_reader_node::{api::create_router, config::NodeRole, vision::PlateModels};

fn get_health() -> Request<Body> {
    Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_monolith_health_ok() {
    let app = create_router(monolith_state(three_plate_models()));
    let (status, body) = send(app, get_health()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["role"], "monolith");
    assert_eq!(body["detector_loaded"], true);
    assert_eq!(body["recognizer_loaded"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_monolith_without_models_degraded() {
    let app = create_router(monolith_state(PlateModels::default()));
    let (status, body) = send(app, get_health()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_stage_roles_only_need_their_model() {
    let detector_only = PlateModels::from_parts(
        Some(std::sync::Arc::new(FakeDetector::default())),
        None,
    );
    let app = create_router(stage_state(NodeRole::Detector, detector_only));
    let (_, body) = send(app, get_health()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["role"], "detector");

    let app = create_router(stage_state(NodeRole::Recognizer, PlateModels::default()));
    let (_, body) = send(app, get_health()).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["role"], "recognizer");
}
