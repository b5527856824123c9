// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Contrast limited adaptive histogram equalization (CLAHE)
//!
//! The image is split into a grid of tiles. Each tile gets its own
//! equalization table built from a clipped histogram, and every output pixel
//! blends the tables of the four nearest tile centres.

use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Apply CLAHE to a grayscale image
///
/// # Arguments
/// - `clip_limit`: histogram clip factor relative to a flat histogram
///   (values <= 0 disable clipping)
/// - `grid`: number of tiles along x and y
pub fn clahe(image: &GrayImage, clip_limit: f32, grid: (u32, u32)) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tile_w = width.div_ceil(grid.0.clamp(1, width));
    let tile_h = height.div_ceil(grid.1.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);
            luts.push(tile_lut(image, (x0, y0, x1, y1), clip_limit));
        }
    }
    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    let mut output = GrayImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let value = pixel[0] as usize;
        let (tx0, tx1, ax) = neighbours(x, tile_w, tiles_x);
        let (ty0, ty1, ay) = neighbours(y, tile_h, tiles_y);

        let top = lut_at(tx0, ty0)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty0)[value] as f32 * ax;
        let bottom =
            lut_at(tx0, ty1)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty1)[value] as f32 * ax;
        let blended = top * (1.0 - ay) + bottom * ay;

        output.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
    }

    output
}

/// Tiles whose centres surround `coord`, plus the weight of the second one
fn neighbours(coord: u32, tile_size: u32, tiles: u32) -> (u32, u32, f32) {
    let position = (coord as f32 + 0.5) / tile_size as f32 - 0.5;
    if position <= 0.0 {
        return (0, 0, 0.0);
    }
    let first = (position.floor() as u32).min(tiles - 1);
    let second = (first + 1).min(tiles - 1);
    let weight = if first == second {
        0.0
    } else {
        position - first as f32
    };
    (first, second, weight)
}

fn tile_lut(image: &GrayImage, (x0, y0, x1, y1): (u32, u32, u32, u32), clip_limit: f32) -> [u8; BINS] {
    let mut histogram = [0u32; BINS];
    for y in y0..y1 {
        for x in x0..x1 {
            histogram[image.get_pixel(x, y)[0] as usize] += 1;
        }
    }

    let area = (x1 - x0) * (y1 - y0);
    if clip_limit > 0.0 {
        let limit = ((clip_limit * area as f32 / BINS as f32) as u32).max(1);
        clip_histogram(&mut histogram, limit);
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; BINS];
    let mut cumulative = 0u32;
    for (bin, count) in histogram.iter().enumerate() {
        cumulative += count;
        lut[bin] = (cumulative as f32 * scale).round().min(255.0) as u8;
    }
    lut
}

/// Cap every bin at `limit` and spread the excess evenly over all bins
fn clip_histogram(histogram: &mut [u32; BINS], limit: u32) {
    let mut excess = 0u32;
    for count in histogram.iter_mut() {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }

    let per_bin = excess / BINS as u32;
    let mut residual = excess - per_bin * BINS as u32;
    for count in histogram.iter_mut() {
        *count += per_bin;
    }

    if residual > 0 {
        let step = (BINS / residual as usize).max(1);
        for bin in (0..BINS).step_by(step) {
            if residual == 0 {
                break;
            }
            histogram[bin] += 1;
            residual -= 1;
        }
    }
}
