// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Plate grammar and OCR correction through the public API

use plate_reader_node::plate::{is_standard_format, normalize, Correction, PLATE_LETTERS};

#[test]
fn test_every_alphabet_letter_accepted_in_letter_slots() {
    for c in PLATE_LETTERS.chars() {
        let plate = format!("{c}{c}1234{c}{c}");
        assert!(is_standard_format(&plate), "{} should be valid", plate);
    }
}

#[test]
fn test_letters_outside_alphabet_rejected() {
    for c in ['F', 'G', 'J', 'L', 'N', 'Q', 'R', 'S', 'V', 'W', 'Z'] {
        let plate = format!("{c}A1234BB");
        assert!(!is_standard_format(&plate), "{} should be invalid", plate);
    }
}

#[test]
fn test_grammar_shape() {
    assert!(is_standard_format("AA1234BB"));
    assert!(!is_standard_format("AA12345B"));
    assert!(!is_standard_format("AA1234B"));
    assert!(!is_standard_format("aa1234bb"));
    assert!(!is_standard_format("AA1234BBX"));
    assert!(!is_standard_format(""));
}

#[test]
fn test_corrected_standard_text_always_matches_grammar() {
    let inputs = [
        "AA0000OO", "0A1234I8", "aa-1234-bb", "18OIB0AA", "K A 0 1 2 3 X T", "BO12B4IO",
    ];
    for raw in inputs {
        if let Correction::Standard(text) = normalize(raw) {
            assert!(is_standard_format(&text), "{} -> {}", raw, text);
        }
    }
}

#[test]
fn test_reported_text_is_at_least_five_chars() {
    let inputs = ["AB", "ABC", "XQ7Z", "XQ7Z9", "A B C D", "AA1234BB", "12-34"];
    for raw in inputs {
        if let Some(text) = normalize(raw).into_text() {
            assert!(text.chars().count() >= 5, "{} -> {}", raw, text);
        }
    }
    assert_eq!(normalize("A B C D"), Correction::Rejected);
}
