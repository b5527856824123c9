// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Local mode end to end: image bytes in, normalized plates out

use crate::common::*;
use plate_reader_node::{
    orchestration::Orchestrator,
    pipeline::PipelineOptions,
    plate::TextFragment,
    vision::{PlateModels, RecognizerOutput},
    PlateError,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn local(models: PlateModels) -> Orchestrator {
    Orchestrator::local(Arc::new(models), PipelineOptions::default())
}

#[tokio::test]
async fn test_three_plates_in_box_order() {
    let result = local(three_plate_models())
        .process_image(&scene_png())
        .await
        .unwrap();

    let plates: Vec<(&str, &str, f64)> = result
        .cars
        .iter()
        .map(|c| (c.plate.as_str(), c.raw_text.as_str(), c.confidence))
        .collect();
    assert_eq!(
        plates,
        vec![
            ("AA1234BB", "AA1234BB", 90.0),
            ("KA0123XT", "KA 0123 XT", 70.0),
            ("BO1284IO", "8O12B4IO", 50.0),
        ]
    );
    assert!(result.cars.iter().all(|c| c.fragments.is_none()));
}

#[tokio::test]
async fn test_failing_region_is_skipped() {
    let models = models(
        FakeDetector::new(vec![
            plate_box(10.0, 10.0, 200.0, 0.9),
            plate_box(300.0, 200.0, 250.0, 0.8),
            plate_box(600.0, 400.0, 190.0, 0.7),
        ]),
        FakeRecognizer::new([
            (200, Reading::text("AA1234BB", 0.9)),
            (250, Reading::failing()),
            (190, Reading::text("XK7777YY", 0.6)),
        ]),
    );

    let result = local(models).process_image(&scene_png()).await.unwrap();
    let plates: Vec<&str> = result.cars.iter().map(|c| c.plate.as_str()).collect();
    assert_eq!(plates, vec!["AA1234BB", "XK7777YY"]);
}

#[tokio::test]
async fn test_regions_without_text_contribute_nothing() {
    let models = models(
        FakeDetector::new(vec![
            plate_box(10.0, 10.0, 200.0, 0.9),
            plate_box(300.0, 200.0, 250.0, 0.8),
        ]),
        FakeRecognizer::new([
            // Every fragment at or below the floor
            (
                200,
                Reading::output(RecognizerOutput::Columns {
                    rec_texts: vec!["AA1234BB".into()],
                    rec_scores: vec![0.3],
                }),
            ),
            // Too short to be a plate
            (250, Reading::text("AB", 0.99)),
        ]),
    );

    let result = local(models).process_image(&scene_png()).await.unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_no_boxes_is_empty_result() {
    let recognizer = Arc::new(FakeRecognizer::default());
    let models = PlateModels::from_parts(
        Some(Arc::new(FakeDetector::new(Vec::new()))),
        Some(recognizer.clone()),
    );

    let result = local(models).process_image(&scene_png()).await.unwrap();
    assert!(result.is_empty());
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_detector_failure_fails_request() {
    let models = models(FakeDetector::failing(), FakeRecognizer::default());
    let err = local(models).process_image(&scene_png()).await.unwrap_err();
    assert!(matches!(err, PlateError::ModelInference { .. }));
    assert_eq!(err.error_code(), "MODEL_INFERENCE_ERROR");
}

#[tokio::test]
async fn test_detection_thresholds_applied() {
    let models = models(
        FakeDetector::new(vec![
            // Below the confidence floor
            plate_box(10.0, 10.0, 200.0, 0.29),
            // Exactly at the floor is kept
            plate_box(300.0, 200.0, 250.0, 0.3),
            plate_box(600.0, 400.0, 190.0, 0.9),
            // Overlaps the box above with a lower score
            plate_box(605.0, 405.0, 190.0, 0.6),
        ]),
        FakeRecognizer::new([
            (200, Reading::text("AA1234BB", 0.9)),
            (250, Reading::text("KA0123XT", 0.8)),
            (190, Reading::text("XK7777YY", 0.7)),
        ]),
    );

    let result = local(models).process_image(&scene_png()).await.unwrap();
    let plates: Vec<&str> = result.cars.iter().map(|c| c.plate.as_str()).collect();
    assert_eq!(plates, vec!["KA0123XT", "XK7777YY"]);
}

#[tokio::test]
async fn test_plates_never_exceed_boxes() {
    let detections: Vec<_> = (0..5)
        .map(|i| plate_box(i as f32 * 150.0, 50.0, 120.0 + i as f32, 0.9))
        .collect();
    let readings: Vec<_> = (0..5)
        .map(|i| (120 + i, Reading::text("AA1234BB", 0.9)))
        .collect();

    let result = local(models(FakeDetector::new(detections), FakeRecognizer::new(readings)))
        .process_image(&scene_png())
        .await
        .unwrap();
    assert!(result.len() <= 5);
    assert_eq!(result.len(), 5);
}

#[tokio::test]
async fn test_boxes_clamped_to_image() {
    // Right edge runs past the 800px scene: cropped to 150px wide
    let models = models(
        FakeDetector::new(vec![plate_box(650.0, 100.0, 300.0, 0.9)]),
        FakeRecognizer::new([(150, Reading::text("MO5555PX", 0.75))]),
    );

    let result = local(models).process_image(&scene_png()).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.cars[0].plate, "MO5555PX");
}

#[tokio::test]
async fn test_include_fragments() {
    let options = PipelineOptions {
        include_fragments: true,
        ..PipelineOptions::default()
    };
    let orchestrator = Orchestrator::local(Arc::new(three_plate_models()), options);

    let result = orchestrator.process_image(&scene_png()).await.unwrap();
    assert_eq!(
        result.cars[1].fragments,
        Some(vec![
            TextFragment::new("KA", 0.8),
            TextFragment::new("0123", 0.6),
            TextFragment::new("XT", 0.7),
        ])
    );
}

#[tokio::test]
async fn test_missing_recognizer_is_not_ready() {
    let models = PlateModels::from_parts(
        Some(Arc::new(FakeDetector::new(vec![plate_box(
            10.0, 10.0, 200.0, 0.9,
        )]))),
        None,
    );
    let err = local(models).process_image(&scene_png()).await.unwrap_err();
    assert!(matches!(err, PlateError::NotReady(_)));
}

#[tokio::test]
async fn test_undecodable_bytes_rejected_before_detection() {
    let detector = Arc::new(FakeDetector::new(Vec::new()));
    let models = PlateModels::from_parts(
        Some(detector.clone()),
        Some(Arc::new(FakeRecognizer::default())),
    );

    let err = local(models)
        .process_image(b"definitely not an image")
        .await
        .unwrap_err();
    assert!(matches!(err, PlateError::Input(_)));
    assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
}
