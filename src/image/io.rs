//! Convenience helpers for loading and saving images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{ColorImage, OwnedImage};
use crate::util::{ShapeTrackError, ShapeTrackResult};
use std::path::Path;

/// Creates an owned color frame from an RGB image buffer.
pub fn color_from_rgb_image(img: &image::RgbImage) -> ShapeTrackResult<ColorImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    ColorImage::new(img.as_raw().clone(), width, height)
}

/// Creates an owned color frame from a dynamic image.
pub fn color_from_dynamic_image(img: &image::DynamicImage) -> ShapeTrackResult<ColorImage> {
    let rgb = img.to_rgb8();
    color_from_rgb_image(&rgb)
}

/// Loads an image from disk and converts it to an RGB color frame.
pub fn load_color_image<P: AsRef<Path>>(path: P) -> ShapeTrackResult<ColorImage> {
    let img = image::open(path).map_err(|err| ShapeTrackError::ImageIo {
        reason: err.to_string(),
    })?;
    color_from_dynamic_image(&img)
}

/// Writes a single-channel mask to disk (format chosen by extension).
pub fn save_mask<P: AsRef<Path>>(mask: &OwnedImage, path: P) -> ShapeTrackResult<()> {
    let img = image::GrayImage::from_raw(
        mask.width() as u32,
        mask.height() as u32,
        mask.data().to_vec(),
    )
    .ok_or(ShapeTrackError::BufferTooSmall {
        needed: mask.width() * mask.height(),
        got: mask.data().len(),
    })?;
    img.save(path).map_err(|err| ShapeTrackError::ImageIo {
        reason: err.to_string(),
    })
}

/// Writes an RGB frame to disk (format chosen by extension).
pub fn save_color_image<P: AsRef<Path>>(frame: &ColorImage, path: P) -> ShapeTrackResult<()> {
    let img = image::RgbImage::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.data().to_vec(),
    )
    .ok_or(ShapeTrackError::BufferTooSmall {
        needed: frame.width() * frame.height() * ColorImage::CHANNELS,
        got: frame.data().len(),
    })?;
    img.save(path).map_err(|err| ShapeTrackError::ImageIo {
        reason: err.to_string(),
    })
}
