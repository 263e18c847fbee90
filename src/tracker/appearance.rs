//! Appearance-based variant: one external single-object tracker per object.

use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::Frame;
use crate::tracker::capability::{AppearanceAlgorithm, SingleObjectTracker};
use crate::tracker::engine::{MultiObjectTracker, RejectReason, check_region};
use crate::tracker::object::{IdAllocator, TrackedObject};
use crate::tracker::rect::BBox;

/// Factory producing a fresh single-object tracker instance.
pub type SingleTrackerFactory = Rc<dyn Fn() -> Box<dyn SingleObjectTracker>>;

struct AppearanceTrack {
    object: TrackedObject,
    tracker: Box<dyn SingleObjectTracker>,
}

/// Follows each object with its own [`SingleObjectTracker`].
///
/// An object whose tracker loses it is left out of that frame's mapping but
/// stays live; it reappears as soon as its tracker finds it again. Boxes
/// reported after the first frame are not re-checked against the frame bounds.
pub struct AppearanceTracker {
    algorithm: AppearanceAlgorithm,
    factory: SingleTrackerFactory,
    tracks: Vec<AppearanceTrack>,
    ids: IdAllocator,
}

impl AppearanceTracker {
    pub fn new(algorithm: AppearanceAlgorithm, factory: SingleTrackerFactory) -> Self {
        Self {
            algorithm,
            factory,
            tracks: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    pub fn algorithm(&self) -> AppearanceAlgorithm {
        self.algorithm
    }
}

impl MultiObjectTracker for AppearanceTracker {
    fn add_object(&mut self, frame: &Frame, bbox: BBox) -> Result<u32, RejectReason> {
        check_region(frame, bbox)?;
        let mut tracker = (self.factory)();
        if !tracker.init(frame, bbox) {
            return Err(RejectReason::TrackerRefused);
        }
        let id = self.ids.next_id();
        self.tracks.push(AppearanceTrack {
            object: TrackedObject::new(id, bbox),
            tracker,
        });
        Ok(id)
    }

    fn remove_object(&mut self, id: u32) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.object.id != id);
        before != self.tracks.len()
    }

    fn update(&mut self, frame: &Frame) -> BTreeMap<u32, BBox> {
        let mut tracked = BTreeMap::new();
        for track in self.tracks.iter_mut() {
            match track.tracker.update(frame) {
                Some(bbox) => {
                    track.object.observe(bbox);
                    tracked.insert(track.object.id, bbox);
                }
                None => {
                    track.object.mark_missed();
                    debug!(
                        id = track.object.id,
                        missed = track.object.disappeared_frames,
                        algorithm = %self.algorithm,
                        "track lost"
                    );
                }
            }
        }
        tracked
    }

    fn tracked_objects(&self) -> Vec<TrackedObject> {
        self.tracks.iter().map(|t| t.object.clone()).collect()
    }
}
