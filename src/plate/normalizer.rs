// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OCR correction for plate text
//!
//! The recognizer confuses 0/O, 1/I and 8/B. When the cleaned text has
//! exactly the length of a standard plate, every position is forced into
//! the character class the grammar expects there. The correction is applied
//! before the grammar check and is never verified against anything else.
//!
//! Text that still fails the grammar is kept as a best-effort reading if it
//! has at least [`MIN_PLATE_CHARS`] characters.

use super::grammar::{expects_digit, expects_letter, is_standard_format, PLATE_LENGTH};

/// Shortest text reported as a plate
pub const MIN_PLATE_CHARS: usize = 5;

/// Shortest cleaned text worth correcting at all
pub const MIN_RAW_CHARS: usize = 3;

/// Outcome of correcting a raw reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correction {
    /// Matches the plate grammar
    Standard(String),
    /// Does not match the grammar but is long enough to report
    BestEffort(String),
    Rejected,
}

impl Correction {
    pub fn text(&self) -> Option<&str> {
        match self {
            Correction::Standard(text) | Correction::BestEffort(text) => Some(text),
            Correction::Rejected => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Correction::Standard(text) | Correction::BestEffort(text) => Some(text),
            Correction::Rejected => None,
        }
    }

    pub fn is_standard(&self) -> bool {
        matches!(self, Correction::Standard(_))
    }
}

fn as_letter(c: char) -> char {
    match c {
        '0' => 'O',
        '1' => 'I',
        '8' => 'B',
        other => other,
    }
}

fn as_digit(c: char) -> char {
    match c {
        'O' => '0',
        'I' => '1',
        'B' => '8',
        other => other,
    }
}

/// Strip spaces and hyphens, upper-case the rest
fn clean(raw: &str) -> Vec<char> {
    raw.chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect::<String>()
        .to_uppercase()
        .chars()
        .collect()
}

/// Correct a raw recognizer reading into plate text
pub fn normalize(raw: &str) -> Correction {
    let mut chars = clean(raw);
    if chars.len() < MIN_RAW_CHARS {
        return Correction::Rejected;
    }

    if chars.len() == PLATE_LENGTH {
        for (position, c) in chars.iter_mut().enumerate() {
            if expects_letter(position) {
                *c = as_letter(*c);
            } else if expects_digit(position) {
                *c = as_digit(*c);
            }
        }
    }

    let len = chars.len();
    let text: String = chars.into_iter().collect();
    if is_standard_format(&text) {
        Correction::Standard(text)
    } else if len >= MIN_PLATE_CHARS {
        Correction::BestEffort(text)
    } else {
        Correction::Rejected
    }
}
