// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Distributed mode answers exactly like local mode

use super::support::*;
use crate::common::*;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Request, StatusCode},
};
use plate_reader_node::{
    api::{create_router, AppState},
    config::{NodeConfig, NodeRole},
    orchestration::Orchestrator,
    pipeline::PipelineOptions,
    vision::{image_utils::MAX_IMAGE_SIZE, PlateModels},
    DetectionResult,
};
use std::sync::Arc;
use tower::util::ServiceExt;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_distributed_matches_local() {
    let local = Orchestrator::local(Arc::new(three_plate_models()), PipelineOptions::default())
        .process_image(&scene_png())
        .await
        .unwrap();

    let remote = distributed(three_plate_models(), three_plate_models())
        .await
        .process_image(&scene_png())
        .await
        .unwrap();

    assert_eq!(remote.len(), 3);
    assert_eq!(remote, local);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_large_jpeg_matches_local() {
    let jpeg = large_noisy_jpeg();
    assert!(jpeg.len() < MAX_IMAGE_SIZE, "fixture is {} bytes", jpeg.len());

    let local = Orchestrator::local(Arc::new(three_plate_models()), PipelineOptions::default())
        .process_image(&jpeg)
        .await
        .unwrap();

    let detection_url = spawn_service(NodeRole::Detector, three_plate_models()).await;
    let recognition_url = spawn_service(NodeRole::Recognizer, three_plate_models()).await;
    let config = NodeConfig {
        remote_timeout_secs: 30,
        ..orchestrator_config(&detection_url, &recognition_url)
    };
    let remote = Orchestrator::distributed(&config)
        .unwrap()
        .process_image(&jpeg)
        .await
        .unwrap();

    assert_eq!(local.len(), 3);
    assert_eq!(remote, local);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_distributed_keeps_box_order_with_slow_first_region() {
    let detector = models(
        FakeDetector::new(vec![
            plate_box(10.0, 10.0, 200.0, 0.9),
            plate_box(300.0, 200.0, 250.0, 0.8),
        ]),
        FakeRecognizer::default(),
    );
    let recognizer = models(
        FakeDetector::default(),
        FakeRecognizer::new([
            (
                200,
                Reading::text("AA1234BB", 0.9).slow(std::time::Duration::from_millis(300)),
            ),
            (250, Reading::text("KA0123XT", 0.8)),
        ]),
    );

    let result = distributed(detector, recognizer)
        .await
        .process_image(&scene_png())
        .await
        .unwrap();

    let plates: Vec<&str> = result.cars.iter().map(|c| c.plate.as_str()).collect();
    assert_eq!(plates, vec!["AA1234BB", "KA0123XT"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_orchestrator_node_detect_endpoint() {
    let orchestrator = distributed(three_plate_models(), three_plate_models()).await;
    let state = AppState::new(
        NodeRole::Orchestrator,
        Arc::new(PlateModels::default()),
        Some(orchestrator),
        MAX_IMAGE_SIZE,
    );

    let request = Request::builder()
        .method("POST")
        .uri("/detect")
        .header(CONTENT_TYPE, "image/png")
        .body(Body::from(scene_png()))
        .unwrap();
    let response = create_router(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let result: DetectionResult = serde_json::from_slice(&bytes).unwrap();
    let plates: Vec<&str> = result.cars.iter().map(|c| c.plate.as_str()).collect();
    assert_eq!(plates, vec!["AA1234BB", "KA0123XT", "BO1284IO"]);
}
