//! External tracking capabilities consumed by the engine.
//!
//! The engine never implements appearance models or optical flow itself; hosts
//! plug those in (OpenCV bindings, a GPU kernel, a test double...) through the
//! traits below.

use std::fmt;
use std::str::FromStr;

use image::GrayImage;
use nalgebra::Point2;

use crate::Frame;
use crate::error::TrackerError;
use crate::tracker::rect::BBox;

/// A single-object tracker following one box by its visual appearance.
pub trait SingleObjectTracker {
    /// Start tracking `bbox` in `frame`. Returns `false` if the tracker refuses
    /// the region.
    fn init(&mut self, frame: &Frame, bbox: BBox) -> bool;

    /// Advance one frame. `None` means the object was lost in this frame.
    fn update(&mut self, frame: &Frame) -> Option<BBox>;
}

/// Sparse optical flow between two grayscale frames.
pub trait SparseOpticalFlow {
    /// Track `points` from `prev` into `current`.
    ///
    /// The result has one entry per input point, in the same order: the new
    /// position, or `None` when the flow for that point was lost.
    fn track(
        &mut self,
        prev: &GrayImage,
        current: &GrayImage,
        points: &[Point2<f32>],
    ) -> Vec<Option<Point2<f32>>>;
}

/// Appearance-based algorithms the engine knows how to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppearanceAlgorithm {
    Csrt,
    Kcf,
    Mosse,
    MedianFlow,
}

impl AppearanceAlgorithm {
    pub const ALL: [AppearanceAlgorithm; 4] = [
        AppearanceAlgorithm::Csrt,
        AppearanceAlgorithm::Kcf,
        AppearanceAlgorithm::Mosse,
        AppearanceAlgorithm::MedianFlow,
    ];

    /// Name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            AppearanceAlgorithm::Csrt => "CSRTTracker",
            AppearanceAlgorithm::Kcf => "KCFTracker",
            AppearanceAlgorithm::Mosse => "MOSSETracker",
            AppearanceAlgorithm::MedianFlow => "MedianFlowTracker",
        }
    }
}

impl fmt::Display for AppearanceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default disappearance threshold of the centroid variant.
pub const DEFAULT_MAX_DISAPPEARED: u32 = 50;

/// Tag selecting a tracker engine variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerKind {
    Appearance(AppearanceAlgorithm),
    Centroid { max_disappeared: u32 },
    OpticalFlow,
}

impl TrackerKind {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerKind::Appearance(algorithm) => algorithm.name(),
            TrackerKind::Centroid { .. } => "CentroidTracker",
            TrackerKind::OpticalFlow => "OpticalFlowTracker",
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrackerKind {
    type Err = TrackerError;

    /// Accepts the configuration names (`CSRTTracker`, `CentroidTracker`...)
    /// and short lowercase aliases (`csrt`, `centroid`, `optical_flow`...).
    /// The centroid variant gets [`DEFAULT_MAX_DISAPPEARED`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim() {
            "CSRTTracker" | "csrt" => TrackerKind::Appearance(AppearanceAlgorithm::Csrt),
            "KCFTracker" | "kcf" => TrackerKind::Appearance(AppearanceAlgorithm::Kcf),
            "MOSSETracker" | "mosse" => TrackerKind::Appearance(AppearanceAlgorithm::Mosse),
            "MedianFlowTracker" | "medianflow" | "median_flow" => {
                TrackerKind::Appearance(AppearanceAlgorithm::MedianFlow)
            }
            "CentroidTracker" | "centroid" => TrackerKind::Centroid {
                max_disappeared: DEFAULT_MAX_DISAPPEARED,
            },
            "OpticalFlowTracker" | "optical_flow" | "opticalflow" => TrackerKind::OpticalFlow,
            other => return Err(TrackerError::UnknownAlgorithm(other.to_string())),
        };
        Ok(kind)
    }
}
