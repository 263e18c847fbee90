//! The tracker engine: one polymorphic interface over a closed set of variants.

use std::collections::BTreeMap;
use std::fmt;

use nalgebra::Point2;
use tracing::{info, warn};

use crate::Frame;
use crate::tracker::appearance::AppearanceTracker;
use crate::tracker::capability::TrackerKind;
use crate::tracker::centroid::CentroidTracker;
use crate::tracker::object::TrackedObject;
use crate::tracker::optical_flow::OpticalFlowTracker;
use crate::tracker::rect::BBox;

/// Why a candidate region was not turned into a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Width or height is zero or negative.
    NonPositiveSize,
    /// The box does not lie entirely inside the frame.
    OutOfBounds,
    /// The underlying tracker declined to start on the region.
    TrackerRefused,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RejectReason::NonPositiveSize => "non-positive width or height",
            RejectReason::OutOfBounds => "outside frame bounds",
            RejectReason::TrackerRefused => "tracker refused the region",
        })
    }
}

/// Outcome for one candidate box passed to `initialize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxOutcome {
    Accepted { id: u32 },
    Rejected { bbox: BBox, reason: RejectReason },
}

/// Per-box results of [`MultiObjectTracker::initialize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    pub outcomes: Vec<BoxOutcome>,
}

impl InitReport {
    /// At least one object was created.
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, BoxOutcome::Accepted { .. }))
    }

    pub fn accepted_ids(&self) -> Vec<u32> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                BoxOutcome::Accepted { id } => Some(*id),
                BoxOutcome::Rejected { .. } => None,
            })
            .collect()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, BoxOutcome::Rejected { .. }))
            .count()
    }
}

/// Check a candidate box against the frame it is meant to be tracked in.
pub fn check_region(frame: &Frame, bbox: BBox) -> Result<(), RejectReason> {
    if !bbox.has_positive_size() {
        return Err(RejectReason::NonPositiveSize);
    }
    let (width, height) = frame.dimensions();
    if !bbox.fits_within(width, height) {
        return Err(RejectReason::OutOfBounds);
    }
    Ok(())
}

/// Common interface of every tracker engine variant.
pub trait MultiObjectTracker {
    /// Start tracking `bbox`, returning the new object's id.
    ///
    /// Implementations validate the region with [`check_region`] before
    /// allocating an id, so a rejected box never consumes one.
    fn add_object(&mut self, frame: &Frame, bbox: BBox) -> Result<u32, RejectReason>;

    /// Stop tracking `id`. Returns `false` if no such object is live.
    fn remove_object(&mut self, id: u32) -> bool;

    /// Advance every live object by one frame.
    fn update(&mut self, frame: &Frame) -> BTreeMap<u32, BBox>;

    /// Snapshot of the live objects, in id order.
    fn tracked_objects(&self) -> Vec<TrackedObject>;

    /// Try every candidate box and report what happened to each one.
    ///
    /// Rejections are logged and recorded; they never abort the call.
    fn initialize(&mut self, frame: &Frame, boxes: &[BBox]) -> InitReport {
        let mut report = InitReport::default();
        for &bbox in boxes {
            match self.add_object(frame, bbox) {
                Ok(id) => {
                    info!(id, ?bbox, "tracking object");
                    report.outcomes.push(BoxOutcome::Accepted { id });
                }
                Err(reason) => {
                    warn!(?bbox, %reason, "rejected candidate region");
                    report.outcomes.push(BoxOutcome::Rejected { bbox, reason });
                }
            }
        }
        if !report.is_success() {
            warn!(candidates = boxes.len(), "no valid trackers were initialized");
        }
        report
    }
}

/// The tracker engine, selected by [`TrackerKind`] at construction.
///
/// Build one through [`TrackerRegistry::build`](crate::tracker::TrackerRegistry::build)
/// or directly from a variant.
pub enum TrackerEngine {
    Appearance(AppearanceTracker),
    Centroid(CentroidTracker),
    OpticalFlow(OpticalFlowTracker),
}

impl TrackerEngine {
    pub fn kind(&self) -> TrackerKind {
        match self {
            TrackerEngine::Appearance(t) => TrackerKind::Appearance(t.algorithm()),
            TrackerEngine::Centroid(t) => TrackerKind::Centroid {
                max_disappeared: t.max_disappeared(),
            },
            TrackerEngine::OpticalFlow(_) => TrackerKind::OpticalFlow,
        }
    }

    /// Feed detection centroids to the centroid variant.
    ///
    /// Returns `None` for variants that do not associate detections.
    pub fn update_centroids(
        &mut self,
        detections: &[Point2<f32>],
    ) -> Option<BTreeMap<u32, Point2<f32>>> {
        match self {
            TrackerEngine::Centroid(t) => Some(t.update_centroids(detections)),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn MultiObjectTracker {
        match self {
            TrackerEngine::Appearance(t) => t,
            TrackerEngine::Centroid(t) => t,
            TrackerEngine::OpticalFlow(t) => t,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn MultiObjectTracker {
        match self {
            TrackerEngine::Appearance(t) => t,
            TrackerEngine::Centroid(t) => t,
            TrackerEngine::OpticalFlow(t) => t,
        }
    }
}

impl MultiObjectTracker for TrackerEngine {
    fn add_object(&mut self, frame: &Frame, bbox: BBox) -> Result<u32, RejectReason> {
        self.inner_mut().add_object(frame, bbox)
    }

    fn remove_object(&mut self, id: u32) -> bool {
        self.inner_mut().remove_object(id)
    }

    fn update(&mut self, frame: &Frame) -> BTreeMap<u32, BBox> {
        self.inner_mut().update(frame)
    }

    fn tracked_objects(&self) -> Vec<TrackedObject> {
        self.inner().tracked_objects()
    }

    fn initialize(&mut self, frame: &Frame, boxes: &[BBox]) -> InitReport {
        self.inner_mut().initialize(frame, boxes)
    }
}

impl fmt::Debug for TrackerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerEngine")
            .field("kind", &self.kind())
            .field("objects", &self.tracked_objects().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_region() {
        let frame = Frame::new(100, 50);
        assert_eq!(check_region(&frame, BBox::new(0, 0, 100, 50)), Ok(()));
        assert_eq!(
            check_region(&frame, BBox::new(10, 10, 0, 5)),
            Err(RejectReason::NonPositiveSize)
        );
        assert_eq!(
            check_region(&frame, BBox::new(90, 10, 11, 5)),
            Err(RejectReason::OutOfBounds)
        );
    }

    #[test]
    fn test_report_success() {
        let report = InitReport {
            outcomes: vec![
                BoxOutcome::Rejected {
                    bbox: BBox::new(0, 0, 0, 0),
                    reason: RejectReason::NonPositiveSize,
                },
                BoxOutcome::Accepted { id: 0 },
            ],
        };
        assert!(report.is_success());
        assert_eq!(report.accepted_ids(), vec![0]);
        assert_eq!(report.rejected(), 1);
        assert!(!InitReport::default().is_success());
    }
}
