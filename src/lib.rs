//! Multi-object video tracking with self-describing session archives.
//!
//! The crate is split the same way a tracking session flows:
//!
//! - [`tracker`]: the tracker engine, its algorithm variants and the centroid
//!   association used to keep object identities stable.
//! - [`data_io`]: the binary annotation codec and the session archive
//!   (writer, reader and validator).
//! - [`integration`]: the session pipeline that drives a frame source through
//!   the engine into an archive, plus the collaborator traits a host implements.

pub mod data_io;
pub mod error;
pub mod integration;
pub mod tracker;

/// A decoded video frame.
pub type Frame = image::RgbImage;

/// Boxed error returned by host-provided collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use data_io::{
    AnnotationItem, AnnotationStream, ArchiveReader, ArchiveValidator, ArchiveWriter,
    FrameAnnotationRecord, SessionMetadata, ValidationReport,
};
pub use error::{ArchiveError, CodecError, ConfigError, SessionError, TrackerError};
pub use integration::{
    FrameSource, RegionSelector, SessionConfig, SessionLog, SessionState, SessionSummary,
    StopSignal, TrackingSession,
};
pub use tracker::{
    AppearanceAlgorithm, BBox, InitReport, MultiObjectTracker, TrackedObject, TrackerEngine,
    TrackerKind, TrackerRegistry,
};
