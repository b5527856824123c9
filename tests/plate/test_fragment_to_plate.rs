// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! From recognized fragments to a reported plate
//!
//! Covers the aggregation, correction and confidence rules a single region
//! goes through after recognition.

use plate_reader_node::plate::{aggregate, NormalizedPlate, TextFragment};
use plate_reader_node::vision::{qualifying_fragments, RecognizerOutput};

fn read(fragments: &[TextFragment]) -> Option<NormalizedPlate> {
    aggregate(fragments).and_then(NormalizedPlate::from_candidate)
}

#[test]
fn test_split_plate_joined_and_corrected() {
    let plate = read(&[
        TextFragment::new("0A", 0.9),
        TextFragment::new("1234", 0.8),
        TextFragment::new("I8", 0.7),
    ])
    .unwrap();

    assert_eq!(plate.raw_text, "0A 1234 I8");
    assert_eq!(plate.plate, "OA1234IB");
    assert_eq!(plate.confidence, 80.0);
}

#[test]
fn test_no_fragments_contributes_nothing() {
    assert!(read(&[]).is_none());
}

#[test]
fn test_short_reading_contributes_nothing() {
    assert!(read(&[TextFragment::new("AB", 0.99)]).is_none());
}

#[test]
fn test_best_effort_reading_kept() {
    let plate = read(&[TextFragment::new("XQ7Z9", 0.42)]).unwrap();
    assert_eq!(plate.plate, "XQ7Z9");
    assert_eq!(plate.confidence, 42.0);
}

#[test]
fn test_confidence_rounded_to_one_decimal() {
    let plate = read(&[
        TextFragment::new("AA12", 0.91),
        TextFragment::new("34BB", 0.82),
    ])
    .unwrap();
    // mean 0.865 -> 86.5
    assert_eq!(plate.confidence, 86.5);

    let plate = read(&[TextFragment::new("AA1234BB", 0.33333)]).unwrap();
    assert_eq!(plate.confidence, 33.3);
}

#[test]
fn test_low_confidence_fragments_dropped_before_aggregation() {
    let output = RecognizerOutput::Columns {
        rec_texts: vec!["AA1234BB".into(), "RUS".into(), "noise".into()],
        rec_scores: vec![0.9, 0.3, 0.1],
    };
    let fragments = qualifying_fragments(output);
    assert_eq!(fragments, vec![TextFragment::new("AA1234BB", 0.9)]);

    let plate = read(&fragments).unwrap();
    assert_eq!(plate.raw_text, "AA1234BB");
    assert_eq!(plate.confidence, 90.0);
}

#[test]
fn test_serialized_shape() {
    let plate = read(&[TextFragment::new("aa 1234 bb", 0.5)]).unwrap();
    let json = serde_json::to_value(&plate).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"plate": "AA1234BB", "raw_text": "aa 1234 bb", "confidence": 50.0})
    );
}
