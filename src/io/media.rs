// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Image loading, cropping and encoding.
//!
//! Thin layer over the `image` crate: frames are decoded to RGBA for
//! display and cropping, and converted back to RGB when written as JPEG
//! (the JPEG encoder does not accept an alpha channel).

use crate::models::annotation::BoxRect;
use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};
use std::path::Path;

/// Decode an image file to an RGBA pixel buffer.
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(image.to_rgba8())
}

/// Write an RGB-converted JPEG copy of a frame.
///
/// Used by label export, which keeps a full-size image next to the label
/// files; overwrites any previous copy.
pub fn save_jpeg_copy(image: &RgbaImage, dest: &Path) -> Result<()> {
    DynamicImage::ImageRgba8(image.clone())
        .to_rgb8()
        .save(dest)
        .with_context(|| format!("failed to write {}", dest.display()))?;
    Ok(())
}

/// Cut a box out of a frame.
///
/// The rectangle must already be clamped to the image bounds, which box
/// geometry guarantees.
pub fn crop(image: &RgbaImage, rect: &BoxRect) -> RgbaImage {
    image::imageops::crop_imm(
        image,
        rect.x1 as u32,
        rect.y1 as u32,
        rect.width(),
        rect.height(),
    )
    .to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_extent() {
        let mut source = RgbaImage::new(100, 100);
        source.put_pixel(45, 45, image::Rgba([255, 0, 0, 255]));

        let cropped = crop(&source, &BoxRect::new(40, 40, 60, 60));

        assert_eq!(cropped.dimensions(), (20, 20));
        assert_eq!(cropped.get_pixel(5, 5), &image::Rgba([255, 0, 0, 255]));
    }
}
