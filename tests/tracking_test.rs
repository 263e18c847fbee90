mod common;

use image::GrayImage;
use nalgebra::Point2;
use vision_track::tracker::{
    BoxOutcome, CentroidTracker, RejectReason, SparseOpticalFlow, TrackerEngine,
};
use vision_track::{AppearanceAlgorithm, BBox, MultiObjectTracker, TrackerKind, TrackerRegistry};

use common::{drifting_registry, frame};

/// Shifts every point right by one pixel; loses points past `limit_x`.
struct ShiftFlow {
    limit_x: f32,
}

impl SparseOpticalFlow for ShiftFlow {
    fn track(
        &mut self,
        _prev: &GrayImage,
        _current: &GrayImage,
        points: &[Point2<f32>],
    ) -> Vec<Option<Point2<f32>>> {
        points
            .iter()
            .map(|p| Some(Point2::new(p.x + 1.0, p.y)).filter(|q| q.x <= self.limit_x))
            .collect()
    }
}

#[test]
fn test_identity_monotonic_across_removal() {
    let mut engine = drifting_registry((1, 0)).build_named("CSRTTracker").unwrap();
    let f = frame(100, 100, 0);

    let a = engine.add_object(&f, BBox::new(0, 0, 10, 10)).unwrap();
    let b = engine.add_object(&f, BBox::new(20, 20, 10, 10)).unwrap();
    assert_eq!((a, b), (0, 1));

    assert!(engine.remove_object(b));
    assert!(!engine.remove_object(b));

    let c = engine.add_object(&f, BBox::new(40, 40, 10, 10)).unwrap();
    assert_eq!(c, 2, "removed ids are never reused");

    let tracked = engine.update(&f);
    assert_eq!(tracked.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
    assert_eq!(tracked[&0], BBox::new(1, 0, 10, 10));
}

#[test]
fn test_initialize_rejects_invalid_boxes() {
    let mut engine = drifting_registry((0, 0)).build_named("kcf").unwrap();
    let f = frame(100, 100, 0);

    let report = engine.initialize(
        &f,
        &[
            BBox::new(10, 10, 0, 20),
            BBox::new(90, 10, 20, 20),
            BBox::new(10, 10, 20, 20),
        ],
    );

    assert!(report.is_success());
    assert_eq!(report.rejected(), 2);
    assert_eq!(report.accepted_ids(), vec![0]);
    assert!(matches!(
        report.outcomes[0],
        BoxOutcome::Rejected {
            reason: RejectReason::NonPositiveSize,
            ..
        }
    ));
    assert!(matches!(
        report.outcomes[1],
        BoxOutcome::Rejected {
            reason: RejectReason::OutOfBounds,
            ..
        }
    ));
    assert_eq!(engine.tracked_objects().len(), 1);
}

#[test]
fn test_initialize_fails_without_valid_box() {
    let mut engine = drifting_registry((0, 0)).build_named("MOSSETracker").unwrap();
    let report = engine.initialize(&frame(50, 50, 0), &[BBox::new(45, 45, 10, 10)]);
    assert!(!report.is_success());
    assert!(engine.tracked_objects().is_empty());
}

#[test]
fn test_centroid_association() {
    let mut engine = TrackerEngine::Centroid(CentroidTracker::new(1));
    let f = frame(100, 100, 0);
    let report = engine.initialize(&f, &[BBox::new(5, 5, 10, 10), BBox::new(45, 44, 10, 12)]);
    assert_eq!(report.accepted_ids(), vec![0, 1]);

    let detections = [Point2::new(52.0, 51.0), Point2::new(200.0, 200.0)];
    let centroids = engine.update_centroids(&detections).unwrap();
    assert_eq!(centroids.len(), 3);
    assert_eq!(centroids[&0], Point2::new(10.0, 10.0));
    assert_eq!(centroids[&1], Point2::new(52.0, 51.0));
    assert_eq!(centroids[&2], Point2::new(200.0, 200.0));

    let objects = engine.tracked_objects();
    let missed: Vec<u32> = objects.iter().map(|o| o.disappeared_frames).collect();
    assert_eq!(missed, vec![1, 0, 0]);

    // A second miss exceeds the threshold.
    let centroids = engine.update_centroids(&detections).unwrap();
    assert_eq!(centroids.keys().copied().collect::<Vec<_>>(), vec![1, 2]);

    // Every reported box is a 4x4 square around its centroid.
    let boxes = engine.update(&f);
    assert_eq!(boxes[&1], BBox::new(50, 49, 4, 4));
    assert_eq!(boxes[&2], BBox::new(198, 198, 4, 4));
}

#[test]
fn test_centroid_eviction_boundary() {
    let mut engine = TrackerRegistry::new()
        .build(TrackerKind::Centroid { max_disappeared: 2 })
        .unwrap();
    engine.update_centroids(&[Point2::new(5.0, 5.0)]);

    engine.update_centroids(&[]);
    let survivors = engine.update_centroids(&[]).unwrap();
    assert_eq!(survivors.len(), 1, "disappeared == max survives");
    assert_eq!(engine.tracked_objects()[0].disappeared_frames, 2);

    assert!(engine.update_centroids(&[]).unwrap().is_empty());
}

#[test]
fn test_update_centroids_only_for_centroid_variant() {
    let mut engine = drifting_registry((0, 0)).build_named("medianflow").unwrap();
    assert!(engine.update_centroids(&[Point2::new(1.0, 1.0)]).is_none());
    assert_eq!(
        engine.kind(),
        TrackerKind::Appearance(AppearanceAlgorithm::MedianFlow)
    );
}

#[test]
fn test_optical_flow_drops_lost_points_with_their_ids() {
    let registry = TrackerRegistry::new()
        .with_optical_flow(|| -> Box<dyn SparseOpticalFlow> { Box::new(ShiftFlow { limit_x: 31.0 }) });
    let mut engine = registry.build_named("OpticalFlowTracker").unwrap();
    let f = frame(64, 64, 0);

    let report = engine.initialize(&f, &[BBox::new(8, 8, 4, 4), BBox::new(28, 8, 4, 4)]);
    assert_eq!(report.accepted_ids(), vec![0, 1]);

    // Centres (10,10) and (30,10) move to (11,10) and (31,10).
    let tracked = engine.update(&f);
    assert_eq!(tracked[&0], BBox::new(9, 8, 4, 4));
    assert_eq!(tracked[&1], BBox::new(29, 8, 4, 4));

    // Point 1 crosses the limit and is dropped for good.
    let tracked = engine.update(&f);
    assert_eq!(tracked.keys().copied().collect::<Vec<_>>(), vec![0]);
    assert_eq!(engine.tracked_objects().len(), 1);
}

#[test]
fn test_unregistered_algorithm() {
    let registry = TrackerRegistry::new();
    assert!(registry.build_named("CSRTTracker").is_err());
    assert!(registry.build_named("OpticalFlowTracker").is_err());
    assert!(registry.build_named("centroid").is_ok());
    assert!(registry.build_named("GOTURN").is_err());
}
