//! Collaborators a host supplies to a tracking session.

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nalgebra::Point2;

use crate::data_io::ArchivedFrames;
use crate::error::ArchiveError;
use crate::tracker::BBox;
use crate::{BoxError, Frame};

/// A stream of frames: a camera, a video file, a replayed archive.
pub trait FrameSource {
    type Error: Error + Send + Sync + 'static;

    /// Next frame, or `Ok(None)` once the stream has ended.
    fn fetch_frame(&mut self) -> Result<Option<Frame>, Self::Error>;

    /// Nominal frame rate of the stream.
    fn fps(&self) -> f64;
}

impl FrameSource for ArchivedFrames {
    type Error = ArchiveError;

    fn fetch_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
        self.next_frame()
    }

    fn fps(&self) -> f64 {
        ArchivedFrames::fps(self)
    }
}

/// Picks the region of interest on the first frame.
pub trait RegionSelector {
    /// `None` when the selection was cancelled.
    fn select_region(&mut self, frame: &Frame) -> Option<BBox>;
}

/// Non-interactive selection of a region known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRegion(pub BBox);

impl RegionSelector for FixedRegion {
    fn select_region(&mut self, _frame: &Frame) -> Option<BBox> {
        Some(self.0)
    }
}

impl<F> RegionSelector for F
where
    F: FnMut(&Frame) -> Option<BBox>,
{
    fn select_region(&mut self, frame: &Frame) -> Option<BBox> {
        self(frame)
    }
}

/// Object detection backend feeding the centroid tracker.
///
/// Implement this to connect any detection model to the session.
///
/// # Example
///
/// ```ignore
/// struct MyDetector { /* model handle */ }
///
/// impl DetectionSource for MyDetector {
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<BBox>, BoxError> {
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BBox>, BoxError>;
}

/// Helper for converting detection outputs into centroids.
pub trait IntoCentroids {
    fn into_centroids(self) -> Vec<Point2<f32>>;
}

impl IntoCentroids for Vec<BBox> {
    fn into_centroids(self) -> Vec<Point2<f32>> {
        self.iter().map(BBox::center).collect()
    }
}

/// Cooperative cancellation flag, checked once per frame.
///
/// Clones share the same flag, so one can be handed to a signal handler or
/// another thread while the session holds the other.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
