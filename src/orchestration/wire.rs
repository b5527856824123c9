// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JSON bodies exchanged between the orchestrator and the stage services

use serde::{Deserialize, Serialize};

use crate::plate::TextFragment;
use crate::vision::BoundingBox;

/// Multipart field carrying the uploaded image
pub const UPLOAD_FIELD: &str = "file";

/// `POST /detect_plates` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateCropsResponse {
    pub plate_crops: Vec<PlateCrop>,
}

/// One preprocessed plate crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateCrop {
    /// `[x1, y1, x2, y2]` in source image pixels, as sent
    pub bbox: [i64; 4],
    /// Base64 PNG of the preprocessed crop
    pub image: String,
}

impl PlateCrop {
    pub fn new(bbox: BoundingBox, image: String) -> Self {
        let [x1, y1, x2, y2]: [u32; 4] = bbox.into();
        Self {
            bbox: [x1.into(), y1.into(), x2.into(), y2.into()],
            image,
        }
    }

    /// The box, unless it is negative, out of range or degenerate
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let [x1, y1, x2, y2] = self.bbox.map(|v| u32::try_from(v).ok());
        BoundingBox::new(x1?, y1?, x2?, y2?)
    }
}

/// `POST /recognize_text` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentsResponse {
    pub fragments: Vec<TextFragment>,
}

/// Error body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
