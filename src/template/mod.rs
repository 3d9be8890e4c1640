//! Reference shapes and their matching configuration.
//!
//! A [`Template`] is built from a reference color image: the image runs through
//! the same preprocessing as live frames and the largest enclosed outer contour
//! becomes the reference shape. Changing the configuration rebuilds the
//! reference.

mod config;

use std::path::{Path, PathBuf};

pub use config::{TemplateConfig, CONFIG_KEYS, MAX_DISTANCE_LIMIT, MAX_DISTANCE_SCALE};

use crate::contour::{Contour, ContourExtractor};
use crate::filter::GeometricFilter;
use crate::image::ColorImage;
use crate::preprocess::FramePreprocessor;
use crate::shape::{MatchMethod, ShapeDescriptor, ShapeMatcher};
use crate::trace::trace_event;
use crate::util::{ShapeTrackError, ShapeTrackResult};

/// Extension of template configuration files.
pub const CONFIG_EXTENSION: &str = "config";
/// Extension of saved template images.
pub const IMAGE_EXTENSION: &str = "png";

/// Returns the configuration path paired with a template image path.
pub fn config_path_for(image_path: impl AsRef<Path>) -> PathBuf {
    image_path.as_ref().with_extension(CONFIG_EXTENSION)
}

/// Returns `(image, config)` paths of the saved template `name` in `dir`.
///
/// Extensions are appended, so dots inside `name` are kept.
pub fn saved_template_paths(dir: impl AsRef<Path>, name: &str) -> (PathBuf, PathBuf) {
    let dir = dir.as_ref();
    (
        dir.join(format!("{name}.{IMAGE_EXTENSION}")),
        dir.join(format!("{name}.{CONFIG_EXTENSION}")),
    )
}

/// Reference image, its reference contour and the matching configuration.
#[derive(Clone, Debug)]
pub struct Template {
    name: String,
    image: ColorImage,
    config: TemplateConfig,
    reference: Contour,
    descriptor: ShapeDescriptor,
    config_path: Option<PathBuf>,
}

impl Template {
    /// Builds a template from a reference image.
    pub fn from_image(
        name: impl Into<String>,
        image: ColorImage,
        config: TemplateConfig,
    ) -> ShapeTrackResult<Self> {
        config.validate()?;
        let (reference, descriptor) = reference_shape(&image, &config)?;
        let name = name.into();
        trace_event!(
            "template_built",
            area = descriptor.area,
            perimeter = descriptor.perimeter
        );
        Ok(Self {
            name,
            image,
            config,
            reference,
            descriptor,
            config_path: None,
        })
    }

    /// Sets the file that [`Template::save_config`] writes to.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Validates `config` and rebuilds the reference contour with it.
    ///
    /// On error the template is left unchanged.
    pub fn reconfigure(&mut self, config: TemplateConfig) -> ShapeTrackResult<()> {
        config.validate()?;
        let (reference, descriptor) = reference_shape(&self.image, &config)?;
        self.config = config;
        self.reference = reference;
        self.descriptor = descriptor;
        Ok(())
    }

    /// Writes the configuration next to the template image.
    pub fn save_config(&self) -> ShapeTrackResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or_else(|| ShapeTrackError::TemplateIo {
                path: self.name.clone(),
                reason: "template has no configuration file".to_string(),
            })?;
        self.config.save(path)
    }

    /// Template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference image.
    pub fn image(&self) -> &ColorImage {
        &self.image
    }

    /// Current configuration.
    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Reference contour.
    pub fn reference(&self) -> &Contour {
        &self.reference
    }

    /// Reference descriptor (area, perimeter, Hu invariants).
    pub fn descriptor(&self) -> &ShapeDescriptor {
        &self.descriptor
    }

    /// Configuration file path, when the template came from disk.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Shape matcher against the reference contour.
    pub fn matcher(&self, method: MatchMethod) -> ShapeMatcher {
        ShapeMatcher::new(self.descriptor, method)
    }

    /// Area/perimeter filter configured from the reference and tolerances.
    pub fn geometric_filter(&self) -> GeometricFilter {
        GeometricFilter {
            template_area: self.descriptor.area,
            template_perimeter: self.descriptor.perimeter,
            area_tolerance: f64::from(self.config.area_filter),
            perimeter_tolerance: f64::from(self.config.perimeter_filter),
        }
    }
}

#[cfg(feature = "image-io")]
impl Template {
    /// Builds a new template from an image file with default configuration.
    ///
    /// The configuration path is the image path with a `.config` extension.
    pub fn new_from_file(path: impl AsRef<Path>) -> ShapeTrackResult<Self> {
        let path = path.as_ref();
        let image = crate::image::io::load_color_image(path)?;
        Self::from_image(file_stem(path), image, TemplateConfig::default())
            .map(|t| t.with_config_path(config_path_for(path)))
    }

    /// Loads the saved template `name` (`<name>.png` plus `<name>.config`) from `dir`.
    pub fn load(dir: impl AsRef<Path>, name: &str) -> ShapeTrackResult<Self> {
        let (image_path, config_path) = saved_template_paths(dir, name);
        let config = TemplateConfig::load(&config_path)?;
        let image = crate::image::io::load_color_image(&image_path)?;
        Self::from_image(name, image, config).map(|t| t.with_config_path(config_path))
    }
}

#[cfg(feature = "image-io")]
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn reference_shape(
    image: &ColorImage,
    config: &TemplateConfig,
) -> ShapeTrackResult<(Contour, ShapeDescriptor)> {
    let pre = FramePreprocessor::apply(image, config);
    ContourExtractor::extract_owned(&pre.mask)
        .into_iter()
        .filter_map(|c| ShapeDescriptor::from_contour(&c).map(|d| (c, d)))
        .fold(None, |best: Option<(Contour, ShapeDescriptor)>, item| match best {
            Some(b) if b.1.area >= item.1.area => Some(b),
            _ => Some(item),
        })
        .ok_or(ShapeTrackError::DegenerateTemplate {
            reason: "no contour with non-zero area in the reference image",
        })
}

#[cfg(test)]
mod tests {
    use super::{config_path_for, saved_template_paths, Template, TemplateConfig};
    use crate::image::ColorImage;
    use crate::util::ShapeTrackError;
    use std::path::PathBuf;

    fn two_squares() -> ColorImage {
        ColorImage::from_fn(64, 40, |x, y| {
            let small = (4..10).contains(&x) && (4..10).contains(&y);
            let large = (20..50).contains(&x) && (10..30).contains(&y);
            if small || large {
                [10, 10, 10]
            } else {
                [240, 240, 240]
            }
        })
        .unwrap()
    }

    #[test]
    fn largest_contour_becomes_reference() {
        let tpl = Template::from_image("squares", two_squares(), TemplateConfig::default()).unwrap();
        // pixel centers 20..=49 x 10..=29 enclose 29 x 19
        assert_eq!(tpl.descriptor().area, 29.0 * 19.0);
        assert_eq!(tpl.descriptor().perimeter, 2.0 * (29.0 + 19.0));
        assert_eq!(tpl.reference().len(), 4);
        assert_eq!(tpl.name(), "squares");
    }

    #[test]
    fn blank_image_is_degenerate() {
        let blank = ColorImage::filled(16, 16, [250, 250, 250]).unwrap();
        let err = Template::from_image("blank", blank, TemplateConfig::default()).unwrap_err();
        assert!(matches!(err, ShapeTrackError::DegenerateTemplate { .. }));
    }

    #[test]
    fn reconfigure_keeps_old_state_on_error() {
        let mut tpl =
            Template::from_image("squares", two_squares(), TemplateConfig::default()).unwrap();
        let bad = TemplateConfig {
            max_distance: 500,
            ..TemplateConfig::default()
        };
        assert!(tpl.reconfigure(bad).is_err());
        assert_eq!(tpl.config(), &TemplateConfig::default());

        // value bound excludes every pixel, so the mask is empty
        let empty = TemplateConfig {
            binary_lower: 5,
            binary_upper: 255,
            binary_method: crate::preprocess::BinaryMethod::Band,
            hsv_upper: [179, 255, 4],
            ..TemplateConfig::default()
        };
        assert!(tpl.reconfigure(empty).is_err());
        assert_eq!(tpl.descriptor().area, 29.0 * 19.0);
    }

    #[test]
    fn save_config_needs_a_path() {
        let tpl = Template::from_image("squares", two_squares(), TemplateConfig::default()).unwrap();
        assert!(matches!(
            tpl.save_config(),
            Err(ShapeTrackError::TemplateIo { .. })
        ));
    }

    #[test]
    fn paths_follow_naming_convention() {
        assert_eq!(
            config_path_for("/data/templates/gear.png"),
            PathBuf::from("/data/templates/gear.config")
        );
        let (img, cfg) = saved_template_paths("/data/templates", "gear");
        assert_eq!(img, PathBuf::from("/data/templates/gear.png"));
        assert_eq!(cfg, PathBuf::from("/data/templates/gear.config"));
    }

    #[test]
    fn dotted_names_keep_their_suffix() {
        let (img, cfg) = saved_template_paths("tpl", "gear.v2");
        assert_eq!(img, PathBuf::from("tpl/gear.v2.png"));
        assert_eq!(cfg, PathBuf::from("tpl/gear.v2.config"));
    }
}
