//! Optical-flow variant: one sparse point per object.

use std::collections::BTreeMap;

use image::GrayImage;
use image::imageops::grayscale;
use nalgebra::Point2;
use tracing::debug;

use crate::Frame;
use crate::tracker::capability::SparseOpticalFlow;
use crate::tracker::centroid::POINT_BOX_SIZE;
use crate::tracker::engine::{MultiObjectTracker, RejectReason, check_region};
use crate::tracker::object::{IdAllocator, TrackedObject};
use crate::tracker::rect::BBox;

struct FlowPoint {
    object: TrackedObject,
    point: Point2<f32>,
}

/// Tracks the centre point of each object with a [`SparseOpticalFlow`]
/// primitive and reports a small fixed-size box around it.
///
/// A point whose flow is lost is dropped together with its id.
pub struct OpticalFlowTracker {
    flow: Box<dyn SparseOpticalFlow>,
    prev_gray: Option<GrayImage>,
    points: Vec<FlowPoint>,
    ids: IdAllocator,
}

impl OpticalFlowTracker {
    pub fn new(flow: Box<dyn SparseOpticalFlow>) -> Self {
        Self {
            flow,
            prev_gray: None,
            points: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Current position of every tracked point.
    pub fn points(&self) -> BTreeMap<u32, Point2<f32>> {
        self.points.iter().map(|p| (p.object.id, p.point)).collect()
    }
}

impl MultiObjectTracker for OpticalFlowTracker {
    fn add_object(&mut self, frame: &Frame, bbox: BBox) -> Result<u32, RejectReason> {
        check_region(frame, bbox)?;
        if self.prev_gray.is_none() {
            self.prev_gray = Some(grayscale(frame));
        }
        let id = self.ids.next_id();
        self.points.push(FlowPoint {
            object: TrackedObject::new(id, bbox),
            point: bbox.center(),
        });
        Ok(id)
    }

    fn remove_object(&mut self, id: u32) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.object.id != id);
        before != self.points.len()
    }

    fn update(&mut self, frame: &Frame) -> BTreeMap<u32, BBox> {
        let gray = grayscale(frame);

        let prev = match self.prev_gray.take() {
            Some(prev) if !self.points.is_empty() => prev,
            _ => {
                self.prev_gray = Some(gray);
                return BTreeMap::new();
            }
        };

        let prev_points: Vec<Point2<f32>> = self.points.iter().map(|p| p.point).collect();
        let mut status = self.flow.track(&prev, &gray, &prev_points).into_iter();

        let mut tracked = BTreeMap::new();
        self.points.retain_mut(|p| match status.next().flatten() {
            Some(new_point) => {
                let bbox = BBox::around(new_point, POINT_BOX_SIZE, POINT_BOX_SIZE);
                p.point = new_point;
                p.object.observe(bbox);
                tracked.insert(p.object.id, bbox);
                true
            }
            None => {
                debug!(id = p.object.id, "optical flow lost point");
                false
            }
        });

        self.prev_gray = Some(gray);
        tracked
    }

    fn tracked_objects(&self) -> Vec<TrackedObject> {
        self.points.iter().map(|p| p.object.clone()).collect()
    }
}
