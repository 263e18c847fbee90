//! Running a tracking session end to end.
//!
//! The session pulls frames from a host-provided [`FrameSource`], advances a
//! [`TrackerEngine`](crate::tracker::TrackerEngine) and records everything in
//! a session archive. Cameras, region selection, detection models and video
//! codecs stay on the host side of the collaborator traits defined here.

mod config;
mod logging;
mod overlay;
mod pipeline;
mod source;

pub use config::SessionConfig;
pub use logging::{SessionLog, SessionLogWriter};
pub use overlay::{BoxOverlay, OverlayRenderer};
pub use pipeline::{SessionState, SessionSummary, TrackingSession};
pub use source::{
    DetectionSource, FixedRegion, FrameSource, IntoCentroids, RegionSelector, StopSignal,
};
