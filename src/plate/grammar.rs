// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate grammar: two letters, four digits, two letters

use regex::Regex;
use std::sync::OnceLock;

/// Letters that appear on the supported plate scheme
pub const PLATE_LETTERS: &str = "ABCEHIKMOPTXDUY";

/// Length of a standard plate
pub const PLATE_LENGTH: usize = 8;

fn standard_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let letters = format!("[{}]", PLATE_LETTERS);
        Regex::new(&format!("^{letters}{{2}}[0-9]{{4}}{letters}{{2}}$"))
            .expect("plate pattern is a valid regex")
    })
}

/// Check whether `text` is a standard plate (e.g. `AA1234BB`)
pub fn is_standard_format(text: &str) -> bool {
    standard_pattern().is_match(text)
}

/// Positions 0, 1, 6 and 7 of a standard plate hold letters
pub fn expects_letter(position: usize) -> bool {
    matches!(position, 0 | 1 | 6 | 7)
}

/// Positions 2 through 5 of a standard plate hold digits
pub fn expects_digit(position: usize) -> bool {
    (2..6).contains(&position)
}
