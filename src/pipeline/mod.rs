//! Per-frame detection: preprocessing, contour extraction, shape matching and
//! geometric filtering against one template.

use crate::contour::ContourExtractor;
use crate::image::ColorImage;
use crate::preprocess::{FramePreprocessor, Preprocessed};
use crate::shape::{Candidate, MatchMethod};
use crate::template::Template;
use crate::trace::trace_event;

/// Pipeline options that are not part of a template's configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Shape distance formula.
    pub match_method: MatchMethod,
}

/// Output of one detection pass.
#[derive(Clone, Debug)]
pub struct FrameReport {
    /// Preprocessing products (color mask, masked frame, binary mask).
    pub preprocessed: Preprocessed,
    /// Number of outer contours found in the mask.
    pub contour_count: usize,
    /// Number of contours below the shape distance threshold.
    pub matched_count: usize,
    /// Candidates that also passed the area and perimeter filters.
    pub candidates: Vec<Candidate>,
}

/// Runs the detection stages in their fixed order.
#[derive(Clone, Debug, Default)]
pub struct ShapeFinder {
    config: PipelineConfig,
}

impl ShapeFinder {
    /// Creates a finder with the given options.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Returns the pipeline options.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Detects candidates matching `template` in `frame`.
    pub fn find(&self, frame: &ColorImage, template: &Template) -> FrameReport {
        let tpl_config = template.config();
        let preprocessed = FramePreprocessor::apply(frame, tpl_config);
        let contours = ContourExtractor::extract_owned(&preprocessed.mask);
        let contour_count = contours.len();

        let matcher = template.matcher(self.config.match_method);
        let matched = matcher.match_contours(contours, tpl_config.max_shape_distance());
        let matched_count = matched.len();

        let candidates = template.geometric_filter().apply(matched);

        trace_event!(
            "frame_detected",
            contours = contour_count,
            matched = matched_count,
            candidates = candidates.len()
        );

        FrameReport {
            preprocessed,
            contour_count,
            matched_count,
            candidates,
        }
    }
}
