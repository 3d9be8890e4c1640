//! Control channel commands.

/// A recognized control command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Leave the session loop.
    Quit,
    /// Return from tracking to standby.
    StopTracking,
    /// Build a template from a raw image file and enter setup.
    NewTemplate(String),
    /// Load a saved template and start tracking.
    Track(String),
    /// Enter adjusting mode for a template.
    Overlay(String),
}

impl Command {
    /// Parses a `;`-delimited payload.
    ///
    /// Unknown commands, wrong field counts and empty arguments yield `None`.
    pub fn parse(payload: &str) -> Option<Self> {
        let fields: Vec<&str> = payload.trim().split(';').map(str::trim).collect();
        match fields.as_slice() {
            ["quit"] => Some(Self::Quit),
            ["stop_tracking"] => Some(Self::StopTracking),
            ["new_template", arg] if !arg.is_empty() => Some(Self::NewTemplate(arg.to_string())),
            ["track", arg] if !arg.is_empty() => Some(Self::Track(arg.to_string())),
            ["overlay", arg] if !arg.is_empty() => Some(Self::Overlay(arg.to_string())),
            _ => None,
        }
    }
}
