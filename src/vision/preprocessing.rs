// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for plate regions and model inputs

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use ndarray::Array4;

use super::clahe::clahe;

/// Default letterbox size for the plate detector
pub const DETECTOR_INPUT_SIZE: u32 = 640;

/// Recognition model input height
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 320;

/// Grey used for letterbox padding
const PAD_VALUE: u8 = 128;

/// Contrast enhancement applied to every detected plate before recognition
///
/// Steps:
/// 1. Convert to grayscale
/// 2. Upscale 2x (cubic) when the crop is shorter than `upscale_below`
/// 3. CLAHE with `clip_limit` over a `tile_grid` of tiles
/// 4. Replicate the single channel back to RGB
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionPreprocessor {
    pub upscale_below: u32,
    pub clip_limit: f32,
    pub tile_grid: (u32, u32),
}

impl Default for RegionPreprocessor {
    fn default() -> Self {
        Self {
            upscale_below: 80,
            clip_limit: 1.5,
            tile_grid: (8, 8),
        }
    }
}

impl RegionPreprocessor {
    pub fn process(&self, region: &DynamicImage) -> DynamicImage {
        let mut gray = region.to_luma8();

        let (width, height) = gray.dimensions();
        if height < self.upscale_below && width > 0 && height > 0 {
            gray = image::imageops::resize(&gray, width * 2, height * 2, FilterType::CatmullRom);
        }

        let enhanced = clahe(&gray, self.clip_limit, self.tile_grid);
        DynamicImage::ImageLuma8(enhanced).to_rgb8().into()
    }
}

/// Preprocess a full image for the plate detector
///
/// Letterboxes to `target_size` and scales pixels to [0, 1] in NCHW order.
pub fn preprocess_for_detection(image: &DynamicImage, target_size: u32) -> Array4<f32> {
    let rgb = resize_with_padding(image, target_size).to_rgb8();
    let size = target_size as usize;

    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }

    tensor
}

/// Preprocess a plate crop for recognition
///
/// Steps:
/// 1. Resize to height 48, width from aspect ratio (clamped to 4..=320)
/// 2. Normalize to [-1, 1]: (pixel / 255 - 0.5) / 0.5
/// 3. Convert to NCHW tensor format [1, 3, 48, W]
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();

    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).round() as u32).clamp(4, REC_MAX_WIDTH);

    let resized = image.resize_exact(new_width, REC_INPUT_HEIGHT, FilterType::Lanczos3);
    let rgb = resized.to_rgb8();

    let mut tensor = Array4::zeros((1, 3, REC_INPUT_HEIGHT as usize, new_width as usize));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    tensor
}

/// Resize image with aspect ratio preservation and padding
///
/// The image is scaled to fit within target_size x target_size
/// while preserving aspect ratio, then padded with gray (128)
/// to reach the target dimensions.
pub fn resize_with_padding(image: &DynamicImage, target_size: u32) -> DynamicImage {
    let info = PreprocessInfo::new(image, target_size);
    let mut output = RgbImage::from_pixel(
        target_size,
        target_size,
        Rgb([PAD_VALUE, PAD_VALUE, PAD_VALUE]),
    );

    if info.original_width == 0 || info.original_height == 0 {
        return DynamicImage::ImageRgb8(output);
    }

    let resized = image
        .resize_exact(info.resized_width, info.resized_height, FilterType::Lanczos3)
        .to_rgb8();
    image::imageops::replace(
        &mut output,
        &resized,
        info.offset_x as i64,
        info.offset_y as i64,
    );

    DynamicImage::ImageRgb8(output)
}

/// Scaling factor and offsets used during letterboxing
///
/// Maps detector output back to source image coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PreprocessInfo {
    /// Scale factor applied
    pub scale: f32,
    /// X offset from padding
    pub offset_x: u32,
    /// Y offset from padding
    pub offset_y: u32,
    pub resized_width: u32,
    pub resized_height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl PreprocessInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (orig_w, orig_h) = image.dimensions();

        if orig_w == 0 || orig_h == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                resized_width: 0,
                resized_height: 0,
                original_width: orig_w,
                original_height: orig_h,
            };
        }

        let scale = (target_size as f32 / orig_w as f32).min(target_size as f32 / orig_h as f32);
        let new_w = ((orig_w as f32 * scale).round() as u32).clamp(1, target_size);
        let new_h = ((orig_h as f32 * scale).round() as u32).clamp(1, target_size);

        Self {
            scale,
            offset_x: (target_size - new_w) / 2,
            offset_y: (target_size - new_h) / 2,
            resized_width: new_w,
            resized_height: new_h,
            original_width: orig_w,
            original_height: orig_h,
        }
    }

    /// Map a coordinate from preprocessed space back to original image space
    pub fn map_to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let orig_x = (x - self.offset_x as f32) / self.scale;
        let orig_y = (y - self.offset_y as f32) / self.scale;
        (orig_x, orig_y)
    }
}
