//! Polygon moments up to third order and the seven Hu invariants.
//!
//! Spatial moments are integrated over the area enclosed by the contour using
//! Green's theorem, so a compressed polygon yields the same values as the full
//! boundary chain. Results are independent of traversal direction.

use crate::contour::Contour;

/// Spatial, central and normalized central moments of a closed polygon.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m20: f64,
    pub m11: f64,
    pub m02: f64,
    pub m30: f64,
    pub m21: f64,
    pub m12: f64,
    pub m03: f64,
    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
    pub mu30: f64,
    pub mu21: f64,
    pub mu12: f64,
    pub mu03: f64,
    pub nu20: f64,
    pub nu11: f64,
    pub nu02: f64,
    pub nu30: f64,
    pub nu21: f64,
    pub nu12: f64,
    pub nu03: f64,
}

impl Moments {
    /// Integrates the moments of the area enclosed by `contour`.
    ///
    /// Contours enclosing no area (fewer than three vertices, collinear
    /// vertices) produce all-zero moments.
    pub fn from_contour(contour: &Contour) -> Self {
        let pts = contour.points();
        if pts.len() < 3 {
            return Self::default();
        }

        let (mut a00, mut a10, mut a01) = (0.0f64, 0.0f64, 0.0f64);
        let (mut a20, mut a11, mut a02) = (0.0f64, 0.0f64, 0.0f64);
        let (mut a30, mut a21, mut a12, mut a03) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);

        let last = pts[pts.len() - 1];
        let mut xp = f64::from(last.x);
        let mut yp = f64::from(last.y);
        let mut xp2 = xp * xp;
        let mut yp2 = yp * yp;

        for p in pts {
            let xi = f64::from(p.x);
            let yi = f64::from(p.y);
            let xi2 = xi * xi;
            let yi2 = yi * yi;
            let dxy = xp * yi - xi * yp;
            let xii = xp + xi;
            let yii = yp + yi;

            a00 += dxy;
            a10 += dxy * xii;
            a01 += dxy * yii;
            a20 += dxy * (xp * xii + xi2);
            a11 += dxy * (xp * (yii + yp) + xi * (yii + yi));
            a02 += dxy * (yp * yii + yi2);
            a30 += dxy * xii * (xp2 + xi2);
            a03 += dxy * yii * (yp2 + yi2);
            a21 += dxy * (xp2 * (3.0 * yp + yi) + 2.0 * xi * xp * yii + xi2 * (yp + 3.0 * yi));
            a12 += dxy * (yp2 * (3.0 * xp + xi) + 2.0 * yi * yp * xii + yi2 * (xp + 3.0 * xi));

            xp = xi;
            yp = yi;
            xp2 = xi2;
            yp2 = yi2;
        }

        if a00.abs() <= f64::from(f32::EPSILON) {
            return Self::default();
        }

        let sign = if a00 > 0.0 { 1.0 } else { -1.0 };
        let mut m = Self {
            m00: a00 * sign / 2.0,
            m10: a10 * sign / 6.0,
            m01: a01 * sign / 6.0,
            m20: a20 * sign / 12.0,
            m11: a11 * sign / 24.0,
            m02: a02 * sign / 12.0,
            m30: a30 * sign / 20.0,
            m21: a21 * sign / 60.0,
            m12: a12 * sign / 60.0,
            m03: a03 * sign / 20.0,
            ..Self::default()
        };
        m.complete_central();
        m
    }

    fn complete_central(&mut self) {
        let cx = self.m10 / self.m00;
        let cy = self.m01 / self.m00;

        self.mu20 = self.m20 - self.m10 * cx;
        self.mu11 = self.m11 - self.m10 * cy;
        self.mu02 = self.m02 - self.m01 * cy;
        self.mu30 = self.m30 - cx * (3.0 * self.mu20 + cx * self.m10);
        self.mu21 = self.m21 - cx * (2.0 * self.mu11 + cx * self.m01) - cy * self.mu20;
        self.mu12 = self.m12 - cy * (2.0 * self.mu11 + cy * self.m10) - cx * self.mu02;
        self.mu03 = self.m03 - cy * (3.0 * self.mu02 + cy * self.m01);

        let inv_m00 = 1.0 / self.m00.abs();
        let s2 = inv_m00 * inv_m00;
        let s3 = s2 * inv_m00.sqrt();

        self.nu20 = self.mu20 * s2;
        self.nu11 = self.mu11 * s2;
        self.nu02 = self.mu02 * s2;
        self.nu30 = self.mu30 * s3;
        self.nu21 = self.mu21 * s3;
        self.nu12 = self.mu12 * s3;
        self.nu03 = self.mu03 * s3;
    }

    /// True when the contour encloses no area.
    pub fn is_degenerate(&self) -> bool {
        self.m00 == 0.0
    }

    /// First-order centroid `(m10 / m00, m01 / m00)`; `None` for degenerate input.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.is_degenerate() {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }

    /// The seven Hu moment invariants.
    pub fn hu(&self) -> [f64; 7] {
        let mut hu = [0.0f64; 7];
        let mut t0 = self.nu30 + self.nu12;
        let mut t1 = self.nu21 + self.nu03;
        let q0 = t0 * t0;
        let q1 = t1 * t1;
        let n4 = 4.0 * self.nu11;
        let s = self.nu20 + self.nu02;
        let d = self.nu20 - self.nu02;

        hu[0] = s;
        hu[1] = d * d + n4 * self.nu11;
        hu[3] = q0 + q1;
        hu[5] = d * (q0 - q1) + n4 * t0 * t1;

        t0 *= q0 - 3.0 * q1;
        t1 *= 3.0 * q0 - q1;

        let q0 = self.nu30 - 3.0 * self.nu12;
        let q1 = 3.0 * self.nu21 - self.nu03;

        hu[2] = q0 * q0 + q1 * q1;
        hu[4] = q0 * t0 + q1 * t1;
        hu[6] = q1 * t0 - q0 * t1;
        hu
    }
}

/// Maps each Hu invariant to `-sign(h) * log10(|h|)`; zero invariants stay zero.
///
/// This is the usual convention for printing Hu invariants, where typical
/// values come out positive. [`MatchMethod`](crate::shape::MatchMethod)
/// compares with the unnegated `sign(h) * log10(|h|)`; all three distances
/// come out the same under either sign.
pub fn log_scale(hu: &[f64; 7]) -> [f64; 7] {
    hu.map(|h| {
        if h == 0.0 {
            0.0
        } else {
            -h.signum() * h.abs().log10()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{log_scale, Moments};
    use crate::contour::Contour;

    fn rect(x0: i32, y0: i32, w: i32, h: i32) -> Contour {
        Contour::from_xy(&[(x0, y0), (x0, y0 + h), (x0 + w, y0 + h), (x0 + w, y0)])
    }

    #[test]
    fn rectangle_moments_match_closed_form() {
        let m = Moments::from_contour(&rect(0, 0, 4, 2));
        assert!((m.m00 - 8.0).abs() < 1e-9);
        assert!((m.m10 - 16.0).abs() < 1e-9);
        assert!((m.m01 - 8.0).abs() < 1e-9);
        // mu20 = w^3 h / 12, mu02 = w h^3 / 12
        assert!((m.mu20 - 64.0 * 2.0 / 12.0).abs() < 1e-9);
        assert!((m.mu02 - 4.0 * 8.0 / 12.0).abs() < 1e-9);
        assert!(m.mu11.abs() < 1e-9);
        assert_eq!(m.centroid(), Some((2.0, 1.0)));
    }

    #[test]
    fn traversal_direction_does_not_change_moments() {
        let ccw = rect(3, 5, 6, 9);
        let mut pts = ccw.points().to_vec();
        pts.reverse();
        let cw = Contour::new(pts);
        let a = Moments::from_contour(&ccw);
        let b = Moments::from_contour(&cw);
        assert!((a.m00 - b.m00).abs() < 1e-9);
        assert!((a.m21 - b.m21).abs() < 1e-6);
        for (x, y) in a.hu().iter().zip(b.hu().iter()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn hu_is_translation_and_scale_invariant() {
        let a = Moments::from_contour(&rect(0, 0, 10, 4)).hu();
        let b = Moments::from_contour(&rect(37, 11, 30, 12)).hu();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn degenerate_input_is_all_zero() {
        let line = Contour::from_xy(&[(0, 0), (4, 0), (8, 0)]);
        let m = Moments::from_contour(&line);
        assert!(m.is_degenerate());
        assert_eq!(m.centroid(), None);
        assert!(m.hu().iter().all(|h| *h == 0.0));
    }

    #[test]
    fn log_scale_uses_display_convention() {
        let out = log_scale(&[0.01, -0.001, 0.0, 1.0, 0.1, -0.1, 100.0]);
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert!((out[1] + 3.0).abs() < 1e-12);
        assert_eq!(out[2], 0.0);
        assert_eq!(out[3], 0.0);
        assert!((out[6] + 2.0).abs() < 1e-12);
    }
}
