//! Frame preprocessing: blur, HSV color range masking and binarization.
//!
//! The stages run in a fixed order and never fail: every parameter comes from a
//! `TemplateConfig` that was range-checked when it was loaded or updated.
//! The output mask has the frame's width and height and holds 0 or 255.

mod binary;
mod blur;
mod canny;
mod color;

pub use binary::{band, band_inverted, to_gray};
pub use blur::{bilateral_blur, gaussian_blur, median_blur};
pub use canny::canny;
pub use color::{apply_mask, in_range, rgb_to_hsv, to_hsv_image};

use crate::image::{ColorImage, OwnedImage};
use crate::template::TemplateConfig;
use crate::trace::{trace_event, trace_span};
use crate::util::{ShapeTrackError, ShapeTrackResult};

/// Smoothing applied before color masking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlurMode {
    /// Pass the frame through unchanged.
    #[default]
    None,
    /// 5x5 Gaussian kernel.
    Gaussian,
    /// 5x5 median filter.
    Median,
    /// Edge-preserving bilateral filter (d = 9, sigma 75/75).
    Bilateral,
}

impl BlurMode {
    /// Maps the persisted integer id (0..=3) to a blur mode.
    pub fn from_id(id: i64) -> ShapeTrackResult<Self> {
        match id {
            0 => Ok(Self::None),
            1 => Ok(Self::Gaussian),
            2 => Ok(Self::Median),
            3 => Ok(Self::Bilateral),
            _ => Err(ShapeTrackError::InvalidConfig {
                key: "Blur",
                reason: format!("unknown blur mode {id}, expected 0..=3"),
            }),
        }
    }

    /// Returns the persisted integer id.
    pub fn id(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Gaussian => 1,
            Self::Median => 2,
            Self::Bilateral => 3,
        }
    }
}

/// Binarization applied to the color-masked frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BinaryMethod {
    /// Gray values in `(lower, upper]` become foreground.
    Band,
    /// Gray values outside `(lower, upper]` become foreground.
    #[default]
    BandInverted,
    /// Canny edges with `lower`/`upper` hysteresis thresholds.
    Edges,
}

impl BinaryMethod {
    /// Maps the persisted integer id (0..=2) to a binarization method.
    pub fn from_id(id: i64) -> ShapeTrackResult<Self> {
        match id {
            0 => Ok(Self::Band),
            1 => Ok(Self::BandInverted),
            2 => Ok(Self::Edges),
            _ => Err(ShapeTrackError::InvalidConfig {
                key: "BinaryMethod",
                reason: format!("unknown binarization method {id}, expected 0..=2"),
            }),
        }
    }

    /// Returns the persisted integer id.
    pub fn id(self) -> i64 {
        match self {
            Self::Band => 0,
            Self::BandInverted => 1,
            Self::Edges => 2,
        }
    }
}

/// Intermediate and final products of one preprocessing pass.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    /// Pixels inside the HSV bounds (255) versus outside (0).
    pub color_mask: OwnedImage,
    /// Blurred frame with pixels outside the HSV bounds zeroed.
    pub masked: ColorImage,
    /// Final binary/edge mask handed to contour extraction.
    pub mask: OwnedImage,
}

/// Stateless preprocessing stage.
pub struct FramePreprocessor;

impl FramePreprocessor {
    /// Runs blur, color range masking and binarization on `frame`.
    pub fn apply(frame: &ColorImage, config: &TemplateConfig) -> Preprocessed {
        let _span = trace_span!(
            "preprocess",
            width = frame.width(),
            height = frame.height()
        )
        .entered();

        let blurred = match config.blur {
            BlurMode::None => frame.clone(),
            BlurMode::Gaussian => gaussian_blur(frame),
            BlurMode::Median => median_blur(frame),
            BlurMode::Bilateral => bilateral_blur(frame),
        };

        let hsv = to_hsv_image(&blurred);
        let color_mask = in_range(&hsv, config.hsv_lower, config.hsv_upper);
        let masked = apply_mask(&blurred, &color_mask);

        let gray = to_gray(&masked);
        let mask = match config.binary_method {
            BinaryMethod::Band => band(&gray, config.binary_lower, config.binary_upper),
            BinaryMethod::BandInverted => {
                band_inverted(&gray, config.binary_lower, config.binary_upper)
            }
            BinaryMethod::Edges => canny(&gray, config.binary_lower, config.binary_upper),
        };

        trace_event!(
            "preprocess_done",
            color_pixels = color_mask.count_nonzero(),
            foreground = mask.count_nonzero()
        );

        Preprocessed {
            color_mask,
            masked,
            mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BinaryMethod, BlurMode, FramePreprocessor};
    use crate::image::ColorImage;
    use crate::template::TemplateConfig;

    fn square_frame() -> ColorImage {
        ColorImage::from_fn(32, 32, |x, y| {
            if (8..24).contains(&x) && (8..24).contains(&y) {
                [20, 20, 20]
            } else {
                [230, 230, 230]
            }
        })
        .unwrap()
    }

    #[test]
    fn ids_round_trip_and_reject_unknown_values() {
        for id in 0..=3 {
            assert_eq!(BlurMode::from_id(id).unwrap().id(), id);
        }
        for id in 0..=2 {
            assert_eq!(BinaryMethod::from_id(id).unwrap().id(), id);
        }
        assert!(BlurMode::from_id(4).is_err());
        assert!(BinaryMethod::from_id(-1).is_err());
    }

    #[test]
    fn default_config_marks_dark_square_as_foreground() {
        let frame = square_frame();
        let out = FramePreprocessor::apply(&frame, &TemplateConfig::default());
        assert_eq!(out.mask.width(), 32);
        assert_eq!(out.mask.height(), 32);
        assert_eq!(out.mask.at(16, 16), 255);
        assert_eq!(out.mask.at(2, 2), 0);
        assert_eq!(out.mask.count_nonzero(), 16 * 16);
        assert_eq!(out.color_mask.count_nonzero(), 32 * 32);
    }

    #[test]
    fn band_method_selects_bright_background() {
        let frame = square_frame();
        let config = TemplateConfig {
            binary_method: BinaryMethod::Band,
            ..TemplateConfig::default()
        };
        let out = FramePreprocessor::apply(&frame, &config);
        assert_eq!(out.mask.at(16, 16), 0);
        assert_eq!(out.mask.at(2, 2), 255);
    }

    #[test]
    fn every_blur_mode_preserves_dimensions() {
        let frame = square_frame();
        for id in 0..=3 {
            let config = TemplateConfig {
                blur: BlurMode::from_id(id).unwrap(),
                ..TemplateConfig::default()
            };
            let out = FramePreprocessor::apply(&frame, &config);
            assert_eq!((out.mask.width(), out.mask.height()), (32, 32));
            assert_eq!(out.mask.at(16, 16), 255);
        }
    }

    #[test]
    fn edge_method_outlines_the_square() {
        let frame = square_frame();
        let config = TemplateConfig {
            binary_method: BinaryMethod::Edges,
            binary_lower: 50,
            binary_upper: 150,
            ..TemplateConfig::default()
        };
        let out = FramePreprocessor::apply(&frame, &config);
        assert_eq!(out.mask.at(16, 16), 0);
        assert_eq!(out.mask.at(2, 2), 0);
        assert!(out.mask.count_nonzero() > 0);
    }
}
