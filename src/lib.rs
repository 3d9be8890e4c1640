//! ShapeTrack finds regions of a video frame whose silhouette matches a
//! reference template and keeps stable identities for them across frames.
//!
//! Each frame goes through preprocessing (blur, HSV color range, binarization),
//! outer contour extraction, Hu-moment shape matching against the template's
//! reference contour and area/perimeter filtering. Surviving candidates feed
//! either a persistence-scored [`TrackRegistry`] or a [`ConsensusSelector`]
//! that votes over a window of frames. [`Session`] ties the stages to a frame
//! source and control/result channels.
//!
//! Parallel shape matching is available with the `rayon` feature, image file
//! loading with `image-io`, and span/event instrumentation with `tracing`.

pub mod consensus;
pub mod contour;
pub mod filter;
pub mod image;
pub mod lowlevel;
pub mod pipeline;
pub mod preprocess;
pub mod session;
pub mod shape;
pub mod template;
mod trace;
pub mod track;
pub mod util;

pub use consensus::{ConsensusConfig, ConsensusSelector, ConsensusWinner, VoteOutcome};
pub use contour::{Contour, ContourExtractor, Point};
pub use filter::{area_filter, perimeter_filter, GeometricFilter};
pub use image::{ColorImage, ImageView, OwnedImage};
pub use pipeline::{FrameReport, PipelineConfig, ShapeFinder};
pub use preprocess::{BinaryMethod, BlurMode, FramePreprocessor, Preprocessed};
pub use session::{
    format_positions, Command, OutputMode, Session, SessionConfig, SessionSettings, SessionState,
    NOTHING_FOUND,
};
pub use shape::{distance, Candidate, MatchMethod, ShapeDescriptor, ShapeMatcher};
pub use template::{Template, TemplateConfig};
pub use track::{IdentityPolicy, TrackRegistry, TrackState, TrackedObject, TrackerConfig};
pub use util::{ShapeTrackError, ShapeTrackResult};
