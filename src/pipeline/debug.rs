// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Region crop dumps for inspecting what the recognizer saw

use image::{DynamicImage, ImageFormat};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::PlateRegion;

/// Writes `<dir>/<stamp>_box<i>_raw.png` and `<dir>/<stamp>_box<i>_processed.png`
#[derive(Debug, Clone)]
pub struct DebugDump {
    dir: PathBuf,
}

impl DebugDump {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Save the crops of one region
    ///
    /// Returns the path of the raw crop, or of the processed crop when no
    /// raw crop is available. Write failures are logged and yield `None`.
    pub fn save(&self, stamp: i64, region: &PlateRegion) -> Option<String> {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!("Cannot create debug directory {}: {}", self.dir.display(), e);
            return None;
        }

        let raw_path = region
            .raw
            .as_ref()
            .and_then(|raw| self.write(raw, stamp, region.index, "raw"));
        let processed_path = self.write(&region.image, stamp, region.index, "processed");

        raw_path.or(processed_path)
    }

    fn write(&self, image: &DynamicImage, stamp: i64, index: usize, kind: &str) -> Option<String> {
        let path = self.dir.join(format!("{}_box{}_{}.png", stamp, index, kind));
        match image.save_with_format(&path, ImageFormat::Png) {
            Ok(()) => {
                debug!("Saved {} crop to {}", kind, path.display());
                Some(path.to_string_lossy().into_owned())
            }
            Err(e) => {
                warn!("Failed to save debug crop {}: {}", path.display(), e);
                None
            }
        }
    }
}
