//! Error types shared across the crate.

use std::io;

use thiserror::Error;

use crate::BoxError;

/// Failures while selecting or building a tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("unknown tracking algorithm '{0}'")]
    UnknownAlgorithm(String),
    #[error("no implementation registered for {0}")]
    NotRegistered(String),
}

/// Failures of the annotation binary codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The stream ends inside a header or an item block.
    #[error(
        "annotation stream truncated at byte {offset} (record starting at {record_offset}): \
         needed {needed} bytes, {available} available"
    )]
    Truncated {
        record_offset: usize,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("a frame record holds at most 65535 items, got {0}")]
    TooManyItems(usize),
}

/// Failures while writing or reading a session archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("archive container error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("metadata encoding failed: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("ROI snapshot encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("video codec failure: {0}")]
    Video(#[source] BoxError),
    #[error("archive member '{0}' is missing")]
    MissingMember(String),
    #[error("no ROI snapshot was recorded for this session")]
    MissingRoiFrame,
    #[error("invalid frame rate {0}: must be finite and positive")]
    InvalidFrameRate(f64),
}

/// Fatal session failures. Per-object tracking loss never surfaces here.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("frame source could not be opened: {0}")]
    SourceOpen(#[source] BoxError),
    #[error("frame source produced no initial frame")]
    NoInitialFrame,
    #[error("no region of interest was selected")]
    NoRegionSelected,
    #[error("none of the {rejected} candidate regions could be tracked")]
    NoValidRegion { rejected: usize },
    #[error("frame source failed: {0}")]
    Source(#[source] BoxError),
    #[error("detection source failed: {0}")]
    Detection(#[source] BoxError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Failures while loading a [`SessionConfig`](crate::integration::SessionConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}
