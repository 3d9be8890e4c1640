//! Session settings file (`key=value` per line).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::util::{ShapeTrackError, ShapeTrackResult};

/// Settings consumed to build the external collaborators of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Camera index of the frame source.
    pub camera_number: i64,
    /// Message broker host.
    pub broker: String,
    /// Message broker port.
    pub port: u16,
    /// Topic carrying control commands.
    pub input_topic: String,
    /// Topic receiving published positions.
    pub output_topic: String,
    /// Directory (or path prefix) of template images and configs.
    pub template_filepath: String,
    /// Unrecognized keys, written back unchanged.
    pub extra: BTreeMap<String, String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            camera_number: 0,
            broker: "localhost".to_string(),
            port: 1883,
            input_topic: "vision/in".to_string(),
            output_topic: "vision/out".to_string(),
            template_filepath: "templates/".to_string(),
            extra: BTreeMap::new(),
        }
    }
}

impl SessionSettings {
    /// Parses settings text on top of the defaults.
    pub fn parse(text: &str) -> ShapeTrackResult<Self> {
        let mut settings = Self::default();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ShapeTrackError::ConfigParse {
                    line: line_no,
                    reason: format!("expected key=value, got {line:?}"),
                });
            };
            let key = key.trim();
            let value = value.trim();
            match key {
                "camera_number" => settings.camera_number = parse_int(line_no, key, value)?,
                "port" => settings.port = parse_int(line_no, key, value)?,
                "broker" => settings.broker = value.to_string(),
                "input_topic" => settings.input_topic = value.to_string(),
                "output_topic" => settings.output_topic = value.to_string(),
                "template_filepath" => settings.template_filepath = value.to_string(),
                _ => {
                    settings.extra.insert(key.to_string(), value.to_string());
                }
            }
        }
        Ok(settings)
    }

    /// Serializes the known keys followed by the extra ones.
    pub fn to_settings_string(&self) -> String {
        let mut out = format!(
            "camera_number={}\nbroker={}\nport={}\ninput_topic={}\noutput_topic={}\ntemplate_filepath={}\n",
            self.camera_number,
            self.broker,
            self.port,
            self.input_topic,
            self.output_topic,
            self.template_filepath
        );
        for (key, value) in &self.extra {
            out.push_str(&format!("{key}={value}\n"));
        }
        out
    }

    /// Reads and parses a settings file.
    pub fn load(path: impl AsRef<Path>) -> ShapeTrackResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| ShapeTrackError::TemplateIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Writes the settings file.
    pub fn save(&self, path: impl AsRef<Path>) -> ShapeTrackResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_settings_string()).map_err(|err| ShapeTrackError::TemplateIo {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }
}

fn parse_int<T: std::str::FromStr>(line: usize, key: &str, value: &str) -> ShapeTrackResult<T> {
    value.parse().map_err(|_| ShapeTrackError::ConfigParse {
        line,
        reason: format!("{key} expects an integer, got {value:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::SessionSettings;
    use crate::util::ShapeTrackError;

    const SAMPLE: &str = "\
# camera rig
camera_number=1
broker=10.0.0.5
port=1884
input_topic=cell/cmd
output_topic=cell/pos
template_filepath=/srv/templates/
exposure=auto
";

    #[test]
    fn parses_known_and_extra_keys() {
        let s = SessionSettings::parse(SAMPLE).unwrap();
        assert_eq!(s.camera_number, 1);
        assert_eq!(s.broker, "10.0.0.5");
        assert_eq!(s.port, 1884);
        assert_eq!(s.template_filepath, "/srv/templates/");
        assert_eq!(s.extra.get("exposure").map(String::as_str), Some("auto"));
    }

    #[test]
    fn serialized_settings_parse_back() {
        let s = SessionSettings::parse(SAMPLE).unwrap();
        assert_eq!(SessionSettings::parse(&s.to_settings_string()).unwrap(), s);
    }

    #[test]
    fn bad_port_is_a_parse_error() {
        let err = SessionSettings::parse("port=http").unwrap_err();
        assert!(matches!(err, ShapeTrackError::ConfigParse { line: 1, .. }));
        assert!(SessionSettings::parse("port=70000").is_err());
    }
}
