//! Contour extraction from binary masks.
//!
//! Only the outer borders of top-level foreground regions are returned (regions
//! nested inside another region's hole are skipped). Boundaries are 8-connected
//! and vertex-compressed: interior points of straight horizontal, vertical or
//! diagonal runs are dropped, so a filled rectangle yields its four corners.
//! List order follows the raster scan and carries no identity meaning.

pub(crate) mod border;

use crate::image::{ImageView, OwnedImage};
use crate::trace::{trace_event, trace_span};

/// Integer pixel coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point {
    /// Creates a point from column and row.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Closed polygon approximating the boundary of a connected region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point>,
}

impl Contour {
    /// Wraps an ordered list of vertices; the last vertex connects back to the first.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Builds a contour from `(x, y)` tuples.
    pub fn from_xy(points: &[(i32, i32)]) -> Self {
        Self::new(points.iter().copied().map(Point::from).collect())
    }

    /// Returns the vertices in traversal order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the contour has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace area; the sign depends on traversal direction.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice = 0i64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice += i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y);
        }
        twice as f64 * 0.5
    }

    /// Enclosed polygon area in px².
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Closed arc length in px.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                let dx = f64::from(b.x - a.x);
                let dy = f64::from(b.y - a.y);
                dx.hypot(dy)
            })
            .sum()
    }

    /// Axis-aligned bounds as `(min, max)` corners, `None` when empty.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = *self.points.first()?;
        let bounds = self.points.iter().fold((first, first), |(lo, hi), p| {
            (
                Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        });
        Some(bounds)
    }
}

/// Drops vertices whose incoming and outgoing steps point the same way.
///
/// The first vertex is always kept so the traversal start stays stable.
pub(crate) fn compress_runs(points: &[(i32, i32)]) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points.iter().copied().map(Point::from).collect();
    }
    let mut out = Vec::with_capacity(n);
    for k in 0..n {
        let prev = points[(k + n - 1) % n];
        let cur = points[k];
        let next = points[(k + 1) % n];
        let step_in = (cur.0 - prev.0, cur.1 - prev.1);
        let step_out = (next.0 - cur.0, next.1 - cur.1);
        if k == 0 || step_in != step_out {
            out.push(Point::from(cur));
        }
    }
    out
}

/// Stateless contour extraction stage.
pub struct ContourExtractor;

impl ContourExtractor {
    /// Extracts the compressed outer contours of all top-level regions in `mask`.
    ///
    /// Any non-zero pixel counts as foreground.
    pub fn extract(mask: ImageView<'_, u8>) -> Vec<Contour> {
        let _span = trace_span!("extract_contours").entered();
        let contours: Vec<Contour> = border::follow_external_borders(mask)
            .into_iter()
            .map(|b| Contour::new(compress_runs(&b.points)))
            .collect();
        trace_event!("contours_extracted", count = contours.len());
        contours
    }

    /// Convenience wrapper over [`ContourExtractor::extract`] for owned masks.
    pub fn extract_owned(mask: &OwnedImage) -> Vec<Contour> {
        Self::extract(mask.view())
    }
}

#[cfg(test)]
mod tests {
    use super::{compress_runs, Contour, Point};

    #[test]
    fn compress_runs_keeps_corners_only() {
        let square = [
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 2),
            (2, 2),
            (2, 1),
            (2, 0),
            (1, 0),
        ];
        let out = compress_runs(&square);
        assert_eq!(
            out,
            vec![
                Point::new(0, 0),
                Point::new(0, 2),
                Point::new(2, 2),
                Point::new(2, 0)
            ]
        );
    }

    #[test]
    fn square_area_and_perimeter() {
        let c = Contour::from_xy(&[(0, 0), (0, 20), (20, 20), (20, 0)]);
        assert_eq!(c.area(), 400.0);
        assert_eq!(c.perimeter(), 80.0);
        assert_eq!(c.signed_area(), -400.0);
        assert_eq!(c.bounds(), Some((Point::new(0, 0), Point::new(20, 20))));
    }

    #[test]
    fn degenerate_contours_have_zero_area() {
        assert_eq!(Contour::from_xy(&[(3, 3)]).area(), 0.0);
        assert_eq!(Contour::from_xy(&[(0, 0), (5, 0)]).area(), 0.0);
        assert_eq!(Contour::from_xy(&[(0, 0), (5, 0)]).perimeter(), 10.0);
        assert_eq!(Contour::new(Vec::new()).bounds(), None);
    }
}
