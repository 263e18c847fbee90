//! Tracked object state and identity allocation.

use crate::tracker::rect::BBox;

/// A single object followed by the tracker engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    /// Unique identifier, never reused within one engine
    pub id: u32,
    /// Latest known bounding box
    pub bbox: BBox,
    /// Tracking confidence (the external trackers report none, so this is 1.0)
    pub confidence: f32,
    /// Consecutive frames in which the object was not found
    pub disappeared_frames: u32,
}

impl TrackedObject {
    pub fn new(id: u32, bbox: BBox) -> Self {
        Self {
            id,
            bbox,
            confidence: 1.0,
            disappeared_frames: 0,
        }
    }

    /// Record a successful observation.
    pub fn observe(&mut self, bbox: BBox) {
        self.bbox = bbox;
        self.disappeared_frames = 0;
    }

    pub fn mark_missed(&mut self) {
        self.disappeared_frames = self.disappeared_frames.saturating_add(1);
    }
}

/// Hands out object ids in strictly increasing order, starting at 0.
///
/// Each engine owns its allocator, so ids are unique per engine and a removed
/// id is never handed out again.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next unique object id.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) will return.
    pub fn peek(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.peek(), 2);
        assert_eq!(ids.next_id(), 2);
    }

    #[test]
    fn test_observe_resets_disappearance() {
        let mut obj = TrackedObject::new(3, BBox::new(0, 0, 10, 10));
        obj.mark_missed();
        obj.mark_missed();
        assert_eq!(obj.disappeared_frames, 2);
        obj.observe(BBox::new(1, 1, 10, 10));
        assert_eq!(obj.disappeared_frames, 0);
        assert_eq!(obj.bbox.x, 1);
    }
}
