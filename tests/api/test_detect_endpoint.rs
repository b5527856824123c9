// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /detect on a monolith node

use super::support::*;
use crate::common::*;
use axum::http::StatusCode;
use plate_reader_node::{
    api::create_router,
    plate::DetectionResult,
    vision::{encode_png, image_utils::MAX_IMAGE_SIZE, PlateModels},
};
use serde_json::json;

#[tokio::test]
async fn test_detect_multipart() {
    let app = create_router(monolith_state(three_plate_models()));
    let (status, body) = send(app, multipart_request("/detect", "image/png", &scene_png())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"cars": [
            {"plate": "AA1234BB", "raw_text": "AA1234BB", "confidence": 90.0},
            {"plate": "KA0123XT", "raw_text": "KA 0123 XT", "confidence": 70.0},
            {"plate": "BO1284IO", "raw_text": "8O12B4IO", "confidence": 50.0},
        ]})
    );
}

#[tokio::test]
async fn test_raised_upload_limit_accepts_large_image() {
    let png = encode_png(&noisy_photo(2400, 1800)).unwrap();
    assert!(png.len() > MAX_IMAGE_SIZE);

    let app = create_router(monolith_state_with_limit(three_plate_models(), 32 * 1024 * 1024));
    let (status, body) = send(app, raw_request("/detect", "image/png", png.clone())).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let result: DetectionResult = serde_json::from_value(body).unwrap();
    assert_eq!(result.len(), 3);

    let app = create_router(monolith_state(three_plate_models()));
    let (status, _) = send(app, raw_request("/detect", "image/png", png)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detect_raw_body() {
    let app = create_router(monolith_state(three_plate_models()));
    let (status, body) = send(app, raw_request("/detect", "image/png", scene_png())).await;

    assert_eq!(status, StatusCode::OK);
    let result: DetectionResult = serde_json::from_value(body).unwrap();
    assert_eq!(result.len(), 3);
}

#[tokio::test]
async fn test_detect_octet_stream() {
    let app = create_router(monolith_state(three_plate_models()));
    let (status, _) = send(
        app,
        raw_request("/detect", "application/octet-stream", scene_png()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_image_upload_rejected() {
    let app = create_router(monolith_state(three_plate_models()));
    let (status, body) = send(
        app,
        raw_request("/detect", "text/plain", b"AA1234BB".to_vec()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "File must be an image"}));
}

#[tokio::test]
async fn test_non_image_multipart_field_rejected() {
    let app = create_router(monolith_state(three_plate_models()));
    let (status, body) = send(app, multipart_request("/detect", "text/plain", b"hello")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "File must be an image");
}

#[tokio::test]
async fn test_undecodable_image_rejected() {
    let app = create_router(monolith_state(three_plate_models()));
    let (status, body) = send(
        app,
        raw_request("/detect", "image/jpeg", b"not really a jpeg".to_vec()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_empty_upload_rejected() {
    let app = create_router(monolith_state(three_plate_models()));
    let (status, _) = send(app, raw_request("/detect", "image/png", Vec::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_models_missing_is_unavailable() {
    let app = create_router(monolith_state(PlateModels::default()));
    let (status, body) = send(app, raw_request("/detect", "image/png", scene_png())).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("not loaded"));
}

#[tokio::test]
async fn test_detector_failure_is_server_error() {
    let app = create_router(monolith_state(models(
        FakeDetector::failing(),
        FakeRecognizer::default(),
    )));
    let (status, body) = send(app, raw_request("/detect", "image/png", scene_png())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_no_plates_is_empty_list() {
    let app = create_router(monolith_state(models(
        FakeDetector::new(Vec::new()),
        FakeRecognizer::default(),
    )));
    let (status, body) = send(app, raw_request("/detect", "image/png", scene_png())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cars": []}));
}
