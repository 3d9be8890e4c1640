//! Template matching parameters and their `Key=Value` text persistence.

use std::fs;
use std::path::Path;

use crate::preprocess::{BinaryMethod, BlurMode};
use crate::trace::trace_warn;
use crate::util::{ShapeTrackError, ShapeTrackResult};

/// Persisted keys in write order.
pub const CONFIG_KEYS: [&str; 13] = [
    "BinaryLower",
    "BinaryUpper",
    "Blur",
    "HueLower",
    "HueUpper",
    "SaturationLower",
    "SaturationUpper",
    "ValueLower",
    "ValueUpper",
    "MaxDistance",
    "AreaFilter",
    "PerimeterFilter",
    "BinaryMethod",
];

/// Upper bound of the `MaxDistance` slider value.
pub const MAX_DISTANCE_LIMIT: u32 = 100;

/// Divisor mapping the `MaxDistance` slider value to a shape distance.
pub const MAX_DISTANCE_SCALE: f64 = 20.0;

/// Fixed-field configuration of one template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Lower binarization threshold (or low Canny threshold).
    pub binary_lower: u8,
    /// Upper binarization threshold (or high Canny threshold).
    pub binary_upper: u8,
    /// Smoothing applied before color masking.
    pub blur: BlurMode,
    /// Inclusive HSV lower bound `[h, s, v]`.
    pub hsv_lower: [u8; 3],
    /// Inclusive HSV upper bound `[h, s, v]`.
    pub hsv_upper: [u8; 3],
    /// Shape distance slider value (0..=100); see [`TemplateConfig::max_shape_distance`].
    pub max_distance: u32,
    /// Area tolerance in px²; zero disables the area filter.
    pub area_filter: u32,
    /// Perimeter tolerance in px; zero disables the perimeter filter.
    pub perimeter_filter: u32,
    /// Binarization applied to the masked frame.
    pub binary_method: BinaryMethod,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            binary_lower: 100,
            binary_upper: 255,
            blur: BlurMode::None,
            hsv_lower: [0, 0, 0],
            hsv_upper: [255, 255, 255],
            max_distance: 20,
            area_filter: 500,
            perimeter_filter: 500,
            binary_method: BinaryMethod::BandInverted,
        }
    }
}

impl TemplateConfig {
    /// Checks cross-field constraints.
    pub fn validate(&self) -> ShapeTrackResult<()> {
        if self.max_distance > MAX_DISTANCE_LIMIT {
            return Err(ShapeTrackError::InvalidConfig {
                key: "MaxDistance",
                reason: format!(
                    "{} exceeds the maximum of {MAX_DISTANCE_LIMIT}",
                    self.max_distance
                ),
            });
        }
        const CHANNELS: [(&str, usize); 3] = [("Hue", 0), ("Saturation", 1), ("Value", 2)];
        for (name, idx) in CHANNELS {
            if self.hsv_lower[idx] > self.hsv_upper[idx] {
                return Err(ShapeTrackError::InvalidConfig {
                    key: name,
                    reason: format!(
                        "lower bound {} is above upper bound {}",
                        self.hsv_lower[idx], self.hsv_upper[idx]
                    ),
                });
            }
        }
        Ok(())
    }

    /// Effective shape distance threshold (`MaxDistance / 20`).
    pub fn max_shape_distance(&self) -> f64 {
        f64::from(self.max_distance) / MAX_DISTANCE_SCALE
    }

    /// Returns the persisted integer value of `key`.
    pub fn get(&self, key: &str) -> Option<i64> {
        let value = match key {
            "BinaryLower" => i64::from(self.binary_lower),
            "BinaryUpper" => i64::from(self.binary_upper),
            "Blur" => self.blur.id(),
            "HueLower" => i64::from(self.hsv_lower[0]),
            "HueUpper" => i64::from(self.hsv_upper[0]),
            "SaturationLower" => i64::from(self.hsv_lower[1]),
            "SaturationUpper" => i64::from(self.hsv_upper[1]),
            "ValueLower" => i64::from(self.hsv_lower[2]),
            "ValueUpper" => i64::from(self.hsv_upper[2]),
            "MaxDistance" => i64::from(self.max_distance),
            "AreaFilter" => i64::from(self.area_filter),
            "PerimeterFilter" => i64::from(self.perimeter_filter),
            "BinaryMethod" => self.binary_method.id(),
            _ => return None,
        };
        Some(value)
    }

    /// Sets one field from its persisted key.
    ///
    /// Out-of-range values are rejected; unknown keys return `Ok(false)`.
    /// Cross-field constraints are left to [`TemplateConfig::validate`].
    pub fn set(&mut self, key: &str, value: i64) -> ShapeTrackResult<bool> {
        match key {
            "BinaryLower" => self.binary_lower = byte("BinaryLower", value)?,
            "BinaryUpper" => self.binary_upper = byte("BinaryUpper", value)?,
            "Blur" => self.blur = BlurMode::from_id(value)?,
            "HueLower" => self.hsv_lower[0] = byte("HueLower", value)?,
            "HueUpper" => self.hsv_upper[0] = byte("HueUpper", value)?,
            "SaturationLower" => self.hsv_lower[1] = byte("SaturationLower", value)?,
            "SaturationUpper" => self.hsv_upper[1] = byte("SaturationUpper", value)?,
            "ValueLower" => self.hsv_lower[2] = byte("ValueLower", value)?,
            "ValueUpper" => self.hsv_upper[2] = byte("ValueUpper", value)?,
            "MaxDistance" => self.max_distance = tolerance("MaxDistance", value)?,
            "AreaFilter" => self.area_filter = tolerance("AreaFilter", value)?,
            "PerimeterFilter" => self.perimeter_filter = tolerance("PerimeterFilter", value)?,
            "BinaryMethod" => self.binary_method = BinaryMethod::from_id(value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Parses `Key=Value` text on top of the defaults and validates the result.
    ///
    /// Blank lines and lines starting with `#` are skipped. Unknown keys are
    /// ignored; missing keys keep their default value.
    pub fn parse(text: &str) -> ShapeTrackResult<Self> {
        let mut config = Self::default();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or(ShapeTrackError::ConfigParse {
                line: line_no,
                reason: format!("expected Key=Value, got {line:?}"),
            })?;
            let key = key.trim();
            let value = value.trim();
            let value: i64 = value.parse().map_err(|_| ShapeTrackError::ConfigParse {
                line: line_no,
                reason: format!("value of {key} is not an integer: {value:?}"),
            })?;
            if !config.set(key, value)? {
                trace_warn!("ignoring unknown template config key {key:?} on line {line_no}");
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Serializes every key in [`CONFIG_KEYS`] order, one per line.
    pub fn to_config_string(&self) -> String {
        let mut out = String::new();
        for key in CONFIG_KEYS {
            if let Some(value) = self.get(key) {
                out.push_str(key);
                out.push('=');
                out.push_str(&value.to_string());
                out.push('\n');
            }
        }
        out
    }

    /// Reads and parses a config file.
    pub fn load(path: impl AsRef<Path>) -> ShapeTrackResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| ShapeTrackError::TemplateIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Writes the config file, replacing any existing one.
    pub fn save(&self, path: impl AsRef<Path>) -> ShapeTrackResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_config_string()).map_err(|err| ShapeTrackError::TemplateIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }
}

fn byte(key: &'static str, value: i64) -> ShapeTrackResult<u8> {
    u8::try_from(value).map_err(|_| ShapeTrackError::InvalidConfig {
        key,
        reason: format!("{value} is outside 0..=255"),
    })
}

fn tolerance(key: &'static str, value: i64) -> ShapeTrackResult<u32> {
    u32::try_from(value).map_err(|_| ShapeTrackError::InvalidConfig {
        key,
        reason: format!("{value} must be a non-negative integer"),
    })
}

#[cfg(test)]
mod tests {
    use super::{TemplateConfig, CONFIG_KEYS};
    use crate::preprocess::{BinaryMethod, BlurMode};
    use crate::util::ShapeTrackError;

    #[test]
    fn defaults_serialize_in_fixed_order() {
        let text = TemplateConfig::default().to_config_string();
        let keys: Vec<&str> = text
            .lines()
            .map(|l| l.split('=').next().unwrap())
            .collect();
        assert_eq!(keys, CONFIG_KEYS.to_vec());
        assert!(text.starts_with("BinaryLower=100\nBinaryUpper=255\nBlur=0\n"));
        assert!(text.ends_with("PerimeterFilter=500\nBinaryMethod=1\n"));
    }

    #[test]
    fn parse_skips_comments_and_keeps_defaults_for_missing_keys() {
        let text = "# saved by operator\n\n  Blur = 2 \nHueLower=10\nHueUpper=40\nColour=7\n";
        let config = TemplateConfig::parse(text).unwrap();
        assert_eq!(config.blur, BlurMode::Median);
        assert_eq!(config.hsv_lower, [10, 0, 0]);
        assert_eq!(config.hsv_upper, [40, 255, 255]);
        assert_eq!(config.binary_method, BinaryMethod::BandInverted);
        assert_eq!(config.area_filter, 500);
    }

    #[test]
    fn parse_reports_malformed_lines() {
        let err = TemplateConfig::parse("Blur=1\nMaxDistance\n").unwrap_err();
        assert!(matches!(err, ShapeTrackError::ConfigParse { line: 2, .. }));

        let err = TemplateConfig::parse("AreaFilter=big").unwrap_err();
        assert!(matches!(err, ShapeTrackError::ConfigParse { line: 1, .. }));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let err = TemplateConfig::parse("BinaryMethod=3").unwrap_err();
        assert!(matches!(
            err,
            ShapeTrackError::InvalidConfig {
                key: "BinaryMethod",
                ..
            }
        ));
        assert!(TemplateConfig::parse("HueUpper=300").is_err());
        assert!(TemplateConfig::parse("AreaFilter=-5").is_err());
        assert!(TemplateConfig::parse("MaxDistance=101").is_err());

        let inverted = TemplateConfig {
            hsv_lower: [0, 200, 0],
            hsv_upper: [255, 100, 255],
            ..TemplateConfig::default()
        };
        let err = inverted.validate().unwrap_err();
        assert!(matches!(
            err,
            ShapeTrackError::InvalidConfig {
                key: "Saturation",
                ..
            }
        ));
    }

    #[test]
    fn max_distance_is_scaled() {
        let config = TemplateConfig {
            max_distance: 10,
            ..TemplateConfig::default()
        };
        assert_eq!(config.max_shape_distance(), 0.5);
    }

    #[test]
    fn set_and_get_agree() {
        let mut config = TemplateConfig::default();
        for (i, key) in CONFIG_KEYS.iter().enumerate() {
            let value = (i % 3) as i64;
            assert!(config.set(key, value).unwrap());
            assert_eq!(config.get(key), Some(value));
        }
        assert!(!config.set("Unknown", 1).unwrap());
        assert_eq!(config.get("Unknown"), None);
    }
}
