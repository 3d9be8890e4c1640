//! Shape descriptors and Hu-moment based contour matching.
//!
//! Contours are compared through their seven Hu invariants, each mapped to
//! `m = sign(h) * log10(|h|)`. Three formulas are available:
//!
//! - `I1`: `sum |1/mA - 1/mB|`
//! - `I2`: `sum |mA - mB|`
//! - `I3`: `max |mA - mB| / |mA|`
//!
//! Invariants with magnitude below `1e-5` in either shape are skipped. A shape
//! whose invariants are all zero only matches another such shape.

mod moments;

pub use moments::{log_scale, Moments};

use crate::contour::{Contour, Point};
use crate::trace::{trace_event, trace_span};
use crate::util::math::truncate_to_i32;
use crate::util::{ShapeTrackError, ShapeTrackResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

const HU_EPS: f64 = 1.0e-5;

/// Distance formula used to compare Hu invariants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMethod {
    /// Sum of absolute differences of reciprocal log invariants.
    #[default]
    I1,
    /// Sum of absolute differences of log invariants.
    I2,
    /// Maximum relative difference of log invariants.
    I3,
}

impl MatchMethod {
    /// Maps 1, 2, 3 to `I1`, `I2`, `I3`.
    pub fn from_id(id: i64) -> ShapeTrackResult<Self> {
        match id {
            1 => Ok(Self::I1),
            2 => Ok(Self::I2),
            3 => Ok(Self::I3),
            _ => Err(ShapeTrackError::InvalidConfig {
                key: "MatchMethod",
                reason: format!("unknown match method {id}, expected 1..=3"),
            }),
        }
    }

    /// Compares two sets of raw Hu invariants.
    pub fn compare(self, hu_a: &[f64; 7], hu_b: &[f64; 7]) -> f64 {
        let mut result = 0.0f64;
        let mut any_a = false;
        let mut any_b = false;

        for (&ha, &hb) in hu_a.iter().zip(hu_b.iter()) {
            let ama = ha.abs();
            let amb = hb.abs();
            any_a |= ama > 0.0;
            any_b |= amb > 0.0;
            if ama <= HU_EPS || amb <= HU_EPS {
                continue;
            }
            let la = ha.signum() * ama.log10();
            let lb = hb.signum() * amb.log10();
            match self {
                Self::I1 => result += (1.0 / lb - 1.0 / la).abs(),
                Self::I2 => result += (lb - la).abs(),
                Self::I3 => {
                    let rel = ((la - lb) / la).abs();
                    if rel > result {
                        result = rel;
                    }
                }
            }
        }

        if any_a != any_b {
            return f64::MAX;
        }
        result
    }
}

/// Derived geometry of one contour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeDescriptor {
    /// Enclosed area in px².
    pub area: f64,
    /// Closed arc length in px.
    pub perimeter: f64,
    /// Exact centroid `(m10 / m00, m01 / m00)`.
    pub centroid: (f64, f64),
    /// Raw Hu invariants.
    pub hu: [f64; 7],
    /// Hu invariants mapped through `-sign(h) * log10(|h|)`, the display
    /// convention of [`log_scale`]. Matching uses the unnegated form.
    pub log_hu: [f64; 7],
}

impl ShapeDescriptor {
    /// Describes `contour`; `None` when it encloses no area.
    pub fn from_contour(contour: &Contour) -> Option<Self> {
        let moments = Moments::from_contour(contour);
        let centroid = moments.centroid()?;
        let hu = moments.hu();
        Some(Self {
            area: contour.area(),
            perimeter: contour.perimeter(),
            centroid,
            hu,
            log_hu: log_scale(&hu),
        })
    }

    /// Centroid truncated to integer pixels; this is the identity key used by
    /// tracking and voting.
    pub fn position(&self) -> Point {
        Point::new(
            truncate_to_i32(self.centroid.0),
            truncate_to_i32(self.centroid.1),
        )
    }
}

/// Shape distance between two contours; `None` when either encloses no area.
pub fn distance(a: &Contour, b: &Contour, method: MatchMethod) -> Option<f64> {
    let da = ShapeDescriptor::from_contour(a)?;
    let db = ShapeDescriptor::from_contour(b)?;
    Some(method.compare(&da.hu, &db.hu))
}

/// A contour that passed shape matching in the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Integer centroid.
    pub position: Point,
    /// Matching contour.
    pub contour: Contour,
    /// Shape distance to the template reference.
    pub distance: f64,
    /// Enclosed area in px².
    pub area: f64,
    /// Closed arc length in px.
    pub perimeter: f64,
}

/// Matches contours against one reference shape.
#[derive(Clone, Debug)]
pub struct ShapeMatcher {
    reference: ShapeDescriptor,
    method: MatchMethod,
}

impl ShapeMatcher {
    /// Creates a matcher for a reference descriptor.
    pub fn new(reference: ShapeDescriptor, method: MatchMethod) -> Self {
        Self { reference, method }
    }

    /// Returns the reference descriptor.
    pub fn reference(&self) -> &ShapeDescriptor {
        &self.reference
    }

    /// Returns the distance formula in use.
    pub fn method(&self) -> MatchMethod {
        self.method
    }

    /// Scores one contour; `None` when it encloses no area.
    pub fn score(&self, contour: Contour) -> Option<Candidate> {
        let desc = ShapeDescriptor::from_contour(&contour)?;
        let distance = self.method.compare(&self.reference.hu, &desc.hu);
        Some(Candidate {
            position: desc.position(),
            contour,
            distance,
            area: desc.area,
            perimeter: desc.perimeter,
        })
    }

    /// Keeps the non-degenerate contours whose distance is below `max_distance`.
    ///
    /// Output preserves input order.
    pub fn match_contours(&self, contours: Vec<Contour>, max_distance: f64) -> Vec<Candidate> {
        let _span = trace_span!("match_contours", contours = contours.len()).entered();

        #[cfg(feature = "rayon")]
        let candidates: Vec<Candidate> = contours
            .into_par_iter()
            .filter_map(|c| self.score(c))
            .filter(|c| c.distance < max_distance)
            .collect();

        #[cfg(not(feature = "rayon"))]
        let candidates: Vec<Candidate> = contours
            .into_iter()
            .filter_map(|c| self.score(c))
            .filter(|c| c.distance < max_distance)
            .collect();

        trace_event!("contours_matched", candidates = candidates.len());
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::{distance, MatchMethod, ShapeDescriptor, ShapeMatcher};
    use crate::contour::{Contour, Point};

    fn rect(x0: i32, y0: i32, w: i32, h: i32) -> Contour {
        Contour::from_xy(&[(x0, y0), (x0, y0 + h), (x0 + w, y0 + h), (x0 + w, y0)])
    }

    fn triangle(x0: i32, y0: i32, s: i32) -> Contour {
        Contour::from_xy(&[(x0, y0), (x0, y0 + s), (x0 + s, y0 + s)])
    }

    #[test]
    fn identical_shapes_have_zero_distance_for_every_method() {
        for method in [MatchMethod::I1, MatchMethod::I2, MatchMethod::I3] {
            let d = distance(&rect(0, 0, 20, 10), &rect(50, 50, 40, 20), method).unwrap();
            assert!(d < 1e-6, "{method:?}: {d}");
        }
    }

    #[test]
    fn different_shapes_are_farther_than_scaled_copies() {
        let base = rect(0, 0, 20, 20);
        let same = distance(&base, &rect(5, 5, 60, 60), MatchMethod::I2).unwrap();
        let other = distance(&base, &triangle(0, 0, 20), MatchMethod::I2).unwrap();
        assert!(other > same + 0.1);
    }

    #[test]
    fn method_ids_map_and_reject_unknown() {
        assert_eq!(MatchMethod::from_id(1).unwrap(), MatchMethod::I1);
        assert_eq!(MatchMethod::from_id(3).unwrap(), MatchMethod::I3);
        assert!(MatchMethod::from_id(0).is_err());
    }

    #[test]
    fn all_zero_invariants_only_match_each_other() {
        let zero = [0.0; 7];
        let some = [0.2, 0.01, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(MatchMethod::I1.compare(&zero, &zero), 0.0);
        assert_eq!(MatchMethod::I1.compare(&zero, &some), f64::MAX);
    }

    #[test]
    fn matcher_skips_degenerate_contours_and_reports_geometry() {
        let reference = ShapeDescriptor::from_contour(&rect(0, 0, 20, 20)).unwrap();
        let matcher = ShapeMatcher::new(reference, MatchMethod::I1);
        let contours = vec![
            Contour::from_xy(&[(5, 5)]),
            Contour::from_xy(&[(0, 0), (10, 0)]),
            rect(100, 40, 21, 21),
            triangle(0, 0, 30),
        ];
        let out = matcher.match_contours(contours, 0.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].position, Point::new(110, 50));
        assert_eq!(out[0].area, 441.0);
        assert_eq!(out[0].perimeter, 84.0);
        assert!(out[0].distance.is_finite());
    }
}
