mod appearance;
mod capability;
mod centroid;
mod engine;
mod matching;
mod object;
mod optical_flow;
mod rect;
mod registry;

pub use appearance::{AppearanceTracker, SingleTrackerFactory};
pub use capability::{
    AppearanceAlgorithm, DEFAULT_MAX_DISAPPEARED, SingleObjectTracker, SparseOpticalFlow,
    TrackerKind,
};
pub use centroid::{CentroidTracker, POINT_BOX_SIZE};
pub use engine::{
    BoxOutcome, InitReport, MultiObjectTracker, RejectReason, TrackerEngine, check_region,
};
pub use matching::{AssignmentResult, centroid_distance, greedy_assignment};
pub use object::{IdAllocator, TrackedObject};
pub use optical_flow::OpticalFlowTracker;
pub use rect::BBox;
pub use registry::TrackerRegistry;
