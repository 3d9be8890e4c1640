//! Collaborator interfaces of the session loop and simple in-memory versions.

use std::collections::VecDeque;

use crate::image::ColorImage;
use crate::template::Template;
use crate::util::ShapeTrackResult;

/// Supplies camera frames.
pub trait FrameSource {
    /// Returns the next frame; `Ok(None)` means no frame this cycle.
    fn next_frame(&mut self) -> ShapeTrackResult<Option<ColorImage>>;
}

/// Delivers raw control payloads.
pub trait ControlChannel {
    /// Returns one pending payload without blocking, if any.
    fn poll(&mut self) -> ShapeTrackResult<Option<String>>;
}

/// Receives published positions and operator messages.
pub trait ResultChannel {
    /// Publishes one result payload.
    fn publish(&mut self, payload: &str) -> ShapeTrackResult<()>;

    /// Reports an operator-visible message such as a failed template load.
    fn report(&mut self, message: &str) -> ShapeTrackResult<()> {
        let _ = message;
        Ok(())
    }
}

/// Resolves template commands to templates.
pub trait TemplateStore {
    /// Builds a template from the raw image `file` with default configuration.
    fn new_template(&mut self, file: &str) -> ShapeTrackResult<Template>;

    /// Loads the saved template `name`.
    fn load_template(&mut self, name: &str) -> ShapeTrackResult<Template>;
}

/// Frames served from a queue; yields `None` once drained.
#[derive(Clone, Debug, Default)]
pub struct QueuedFrames {
    frames: VecDeque<ColorImage>,
}

impl QueuedFrames {
    /// Creates a source over `frames`.
    pub fn new(frames: impl IntoIterator<Item = ColorImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Appends a frame.
    pub fn push(&mut self, frame: ColorImage) {
        self.frames.push_back(frame);
    }

    /// Number of frames left.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for QueuedFrames {
    fn next_frame(&mut self) -> ShapeTrackResult<Option<ColorImage>> {
        Ok(self.frames.pop_front())
    }
}

/// Control payloads served from a queue.
#[derive(Clone, Debug, Default)]
pub struct QueuedCommands {
    payloads: VecDeque<String>,
}

impl QueuedCommands {
    /// Creates a channel over `payloads`.
    pub fn new<I, S>(payloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            payloads: payloads.into_iter().map(Into::into).collect(),
        }
    }

    /// Appends a payload.
    pub fn push(&mut self, payload: impl Into<String>) {
        self.payloads.push_back(payload.into());
    }
}

impl ControlChannel for QueuedCommands {
    fn poll(&mut self) -> ShapeTrackResult<Option<String>> {
        Ok(self.payloads.pop_front())
    }
}

/// Stores everything published or reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectedResults {
    /// Published payloads in order.
    pub published: Vec<String>,
    /// Reported operator messages in order.
    pub reports: Vec<String>,
}

impl ResultChannel for CollectedResults {
    fn publish(&mut self, payload: &str) -> ShapeTrackResult<()> {
        self.published.push(payload.to_string());
        Ok(())
    }

    fn report(&mut self, message: &str) -> ShapeTrackResult<()> {
        self.reports.push(message.to_string());
        Ok(())
    }
}

/// Templates kept in a directory: raw images for new templates and
/// `<name>.png` / `<name>.config` pairs for saved ones.
#[cfg(feature = "image-io")]
#[derive(Clone, Debug)]
pub struct DirectoryTemplateStore {
    dir: std::path::PathBuf,
}

#[cfg(feature = "image-io")]
impl DirectoryTemplateStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store root.
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

#[cfg(feature = "image-io")]
impl TemplateStore for DirectoryTemplateStore {
    fn new_template(&mut self, file: &str) -> ShapeTrackResult<Template> {
        Template::new_from_file(self.dir.join(file))
    }

    fn load_template(&mut self, name: &str) -> ShapeTrackResult<Template> {
        Template::load(&self.dir, name)
    }
}
