//! Low-level building blocks for custom detection pipelines.
//!
//! These expose the individual preprocessing stages, moment computation and
//! the raw border follower behind the high-level `ShapeFinder` API. Most users
//! should prefer `ShapeFinder`, `TrackRegistry` and `Session`.

pub use crate::preprocess::{
    apply_mask, band, band_inverted, bilateral_blur, canny, gaussian_blur, in_range, median_blur,
    rgb_to_hsv, to_gray, to_hsv_image,
};
pub use crate::shape::{log_scale, Moments};

use crate::contour::{border, compress_runs, Contour, Point};
use crate::image::ImageView;

/// One traced border with its topology.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBorder {
    /// Every boundary pixel in traversal order (uncompressed).
    pub points: Vec<Point>,
    /// True for hole borders.
    pub is_hole: bool,
    /// Sequential border number of the parent border; 1 is the image frame.
    pub parent: usize,
}

/// Traces every outer and hole border of `mask` in raster discovery order.
pub fn trace_all_borders(mask: ImageView<'_, u8>) -> Vec<RawBorder> {
    border::follow_borders(mask, |_, _| true)
        .into_iter()
        .map(|b| RawBorder {
            points: b.points.into_iter().map(Point::from).collect(),
            is_hole: b.is_hole,
            parent: b.parent,
        })
        .collect()
}

/// Drops interior points of straight runs from a closed pixel chain.
pub fn compress_chain(points: &[Point]) -> Contour {
    let raw: Vec<(i32, i32)> = points.iter().map(|p| (p.x, p.y)).collect();
    Contour::new(compress_runs(&raw))
}
