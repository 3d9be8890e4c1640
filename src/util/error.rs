//! Error types for shapetrack.

use thiserror::Error;

/// Result alias for shapetrack operations.
pub type ShapeTrackResult<T> = std::result::Result<T, ShapeTrackError>;

/// Errors that can occur while configuring or running the tracking pipeline.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ShapeTrackError {
    /// Image dimensions are zero or overflow the address space.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("stride {stride} is smaller than width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the declared geometry requires.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A configuration field is outside its legal range.
    #[error("invalid config value for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },
    /// A `Key=Value` configuration line could not be parsed.
    #[error("config parse error on line {line}: {reason}")]
    ConfigParse { line: usize, reason: String },
    /// The reference image produced no usable contour.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// A template image or configuration file could not be read or written.
    #[error("template file {path}: {reason}")]
    TemplateIo { path: String, reason: String },
    /// Image decoding or encoding failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
    /// An external collaborator (frame source, control or result channel) failed.
    #[error("channel error: {reason}")]
    Channel { reason: String },
}
