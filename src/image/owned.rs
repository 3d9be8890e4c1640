//! Owned single-channel `u8` buffers used for grayscale planes and masks.

use crate::image::ImageView;
use crate::util::{ShapeTrackError, ShapeTrackResult};

/// Owned contiguous single-channel image buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a contiguous buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> ShapeTrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(ShapeTrackError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
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

    /// Creates an image filled with `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> ShapeTrackResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(ShapeTrackError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height)
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> ShapeTrackResult<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = view.row(y).ok_or(ShapeTrackError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the row-major pixel buffer mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns the pixel at `(x, y)`; panics when out of bounds.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Counts the non-zero pixels.
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Consumes the image and returns its buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::OwnedImage;
    use crate::image::ImageView;
    use crate::util::ShapeTrackError;

    #[test]
    fn new_rejects_mismatched_buffers() {
        let err = OwnedImage::new(vec![0; 3], 2, 2).unwrap_err();
        assert_eq!(err, ShapeTrackError::BufferTooSmall { needed: 4, got: 3 });

        let err = OwnedImage::new(vec![0; 5], 2, 2).unwrap_err();
        assert_eq!(
            err,
            ShapeTrackError::InvalidDimensions {
                width: 2,
                height: 2
            }
        );
    }

    #[test]
    fn from_view_drops_row_padding() {
        let data = [1u8, 2, 9, 3, 4, 9];
        let view = ImageView::new(&data, 2, 2, 3).unwrap();
        let owned = OwnedImage::from_view(view).unwrap();
        assert_eq!(owned.data(), &[1, 2, 3, 4]);
        assert_eq!(owned.at(1, 1), 4);
        assert_eq!(owned.count_nonzero(), 4);
    }
}
