// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Merge the fragments of one region into a single reading

use super::{RawPlateCandidate, TextFragment};

/// Join fragment texts with a single space and average their confidences
///
/// Returns `None` for an empty slice; such a region contributes nothing.
pub fn aggregate(fragments: &[TextFragment]) -> Option<RawPlateCandidate> {
    if fragments.is_empty() {
        return None;
    }

    let raw_text = fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let total: f64 = fragments.iter().map(|f| f.confidence as f64).sum();

    Some(RawPlateCandidate {
        raw_text,
        average_confidence: total / fragments.len() as f64,
    })
}
