//! Centroid variant: identity recovered purely by spatial association.

use std::collections::BTreeMap;

use nalgebra::Point2;
use tracing::debug;

use crate::Frame;
use crate::tracker::engine::{MultiObjectTracker, RejectReason, check_region};
use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::object::{IdAllocator, TrackedObject};
use crate::tracker::rect::BBox;

/// Side of the square box reported around every centroid.
pub const POINT_BOX_SIZE: i32 = 4;

fn point_box(centroid: Point2<f32>) -> BBox {
    BBox::around(centroid, POINT_BOX_SIZE, POINT_BOX_SIZE)
}

#[derive(Debug, Clone)]
struct CentroidTrack {
    object: TrackedObject,
    centroid: Point2<f32>,
}

/// Multi-object tracker that re-identifies objects from detection centroids.
///
/// `update(frame)` only reports the held positions, as a
/// [`POINT_BOX_SIZE`] square around each centroid; association happens in
/// [`update_centroids`](Self::update_centroids).
#[derive(Debug, Clone)]
pub struct CentroidTracker {
    // Kept in id order, which is also insertion order.
    tracks: Vec<CentroidTrack>,
    ids: IdAllocator,
    max_disappeared: u32,
}

impl CentroidTracker {
    pub fn new(max_disappeared: u32) -> Self {
        Self {
            tracks: Vec::new(),
            ids: IdAllocator::new(),
            max_disappeared,
        }
    }

    pub fn max_disappeared(&self) -> u32 {
        self.max_disappeared
    }

    /// Current centroid of every live object.
    pub fn centroids(&self) -> BTreeMap<u32, Point2<f32>> {
        self.tracks
            .iter()
            .map(|t| (t.object.id, t.centroid))
            .collect()
    }

    fn register(&mut self, centroid: Point2<f32>) -> u32 {
        let id = self.ids.next_id();
        self.tracks.push(CentroidTrack {
            object: TrackedObject::new(id, point_box(centroid)),
            centroid,
        });
        id
    }

    /// Associate a new set of detection centroids with the live objects.
    ///
    /// Matching is the greedy row-minimum heuristic of
    /// [`matching::greedy_assignment`]. Unmatched objects accumulate a miss and
    /// are evicted once their count exceeds `max_disappeared`; unmatched
    /// detections become new objects.
    pub fn update_centroids(&mut self, detections: &[Point2<f32>]) -> BTreeMap<u32, Point2<f32>> {
        if self.tracks.is_empty() {
            for &c in detections {
                self.register(c);
            }
            return self.centroids();
        }

        let existing: Vec<Point2<f32>> = self.tracks.iter().map(|t| t.centroid).collect();
        let dists = matching::centroid_distance(&existing, detections);
        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::greedy_assignment(&dists);

        for (row, col) in matches {
            let track = &mut self.tracks[row];
            let c = detections[col];
            track.centroid = c;
            track.object.observe(point_box(c));
        }

        for &row in &unmatched_tracks {
            self.tracks[row].object.mark_missed();
        }

        for col in unmatched_detections {
            let c = detections[col];
            let id = self.register(c);
            debug!(id, x = c.x, y = c.y, "registered new object from detection");
        }

        let max_disappeared = self.max_disappeared;
        self.tracks.retain(|t| {
            let evict = t.object.disappeared_frames > max_disappeared;
            if evict {
                debug!(id = t.object.id, "object disappeared");
            }
            !evict
        });

        self.centroids()
    }
}

impl Default for CentroidTracker {
    fn default() -> Self {
        Self::new(crate::tracker::capability::DEFAULT_MAX_DISAPPEARED)
    }
}

impl MultiObjectTracker for CentroidTracker {
    fn add_object(&mut self, frame: &Frame, bbox: BBox) -> Result<u32, RejectReason> {
        check_region(frame, bbox)?;
        // Integer centre of the region, truncated toward zero.
        let c = bbox.center();
        Ok(self.register(Point2::new(c.x.trunc(), c.y.trunc())))
    }

    fn remove_object(&mut self, id: u32) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.object.id != id);
        before != self.tracks.len()
    }

    fn update(&mut self, _frame: &Frame) -> BTreeMap<u32, BBox> {
        self.tracks
            .iter()
            .map(|t| (t.object.id, point_box(t.centroid)))
            .collect()
    }

    fn tracked_objects(&self) -> Vec<TrackedObject> {
        self.tracks.iter().map(|t| t.object.clone()).collect()
    }
}
