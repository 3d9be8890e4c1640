//! Geometric filtering of shape-matched candidates.
//!
//! A candidate survives when its area and perimeter are close to the template's.
//! A tolerance of zero disables the corresponding filter.

use crate::shape::Candidate;
use crate::trace::trace_event;

/// Keeps candidates with `|area - template_area| < tol`; `tol == 0` passes everything.
pub fn area_filter(candidates: Vec<Candidate>, template_area: f64, tol: f64) -> Vec<Candidate> {
    retain_close(candidates, template_area, tol, |c| c.area)
}

/// Keeps candidates with `|perimeter - template_perimeter| < tol`; `tol == 0` passes everything.
pub fn perimeter_filter(
    candidates: Vec<Candidate>,
    template_perimeter: f64,
    tol: f64,
) -> Vec<Candidate> {
    retain_close(candidates, template_perimeter, tol, |c| c.perimeter)
}

fn retain_close<F>(mut candidates: Vec<Candidate>, target: f64, tol: f64, value: F) -> Vec<Candidate>
where
    F: Fn(&Candidate) -> f64,
{
    if tol == 0.0 {
        return candidates;
    }
    candidates.retain(|c| (value(c) - target).abs() < tol);
    candidates
}

/// Area and perimeter closeness to a template reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometricFilter {
    /// Reference area in px².
    pub template_area: f64,
    /// Reference perimeter in px.
    pub template_perimeter: f64,
    /// Area tolerance; zero disables the area check.
    pub area_tolerance: f64,
    /// Perimeter tolerance; zero disables the perimeter check.
    pub perimeter_tolerance: f64,
}

impl GeometricFilter {
    /// Applies the area filter, then the perimeter filter.
    pub fn apply(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let incoming = candidates.len();
        let by_area = area_filter(candidates, self.template_area, self.area_tolerance);
        let after_area = by_area.len();
        let survivors = perimeter_filter(by_area, self.template_perimeter, self.perimeter_tolerance);
        trace_event!(
            "geometric_filter",
            incoming = incoming,
            after_area = after_area,
            survivors = survivors.len()
        );
        survivors
    }
}
