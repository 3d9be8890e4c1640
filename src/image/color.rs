//! Owned 3-channel frames.

use crate::util::{ShapeTrackError, ShapeTrackResult};

/// Owned interleaved RGB image (`width * height * 3` bytes, row-major).
#[derive(Clone, Debug, PartialEq)]
pub struct ColorImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl ColorImage {
    /// Number of interleaved channels per pixel.
    pub const CHANNELS: usize = 3;

    /// Wraps a contiguous interleaved RGB buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> ShapeTrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(ShapeTrackError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(Self::CHANNELS))
            .ok_or(ShapeTrackError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(ShapeTrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(ShapeTrackError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image with every pixel set to `rgb`.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> ShapeTrackResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(ShapeTrackError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(len * Self::CHANNELS);
        for _ in 0..len {
            data.extend_from_slice(&rgb);
        }
        Self::new(data, width, height)
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> ShapeTrackResult<Self>
    where
        F: FnMut(usize, usize) -> [u8; 3],
    {
        let mut data = Vec::with_capacity(width * height * Self::CHANNELS);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self::new(data, width, height)
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the interleaved pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the RGB triple at `(x, y)`; panics when out of bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let idx = (y * self.width + x) * Self::CHANNELS;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Overwrites the RGB triple at `(x, y)`; panics when out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let idx = (y * self.width + x) * Self::CHANNELS;
        self.data[idx..idx + Self::CHANNELS].copy_from_slice(&rgb);
    }
}
