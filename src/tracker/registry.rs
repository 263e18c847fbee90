//! Explicit name-to-factory registration of tracking algorithms.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::TrackerError;
use crate::tracker::appearance::{AppearanceTracker, SingleTrackerFactory};
use crate::tracker::capability::{
    AppearanceAlgorithm, SingleObjectTracker, SparseOpticalFlow, TrackerKind,
};
use crate::tracker::centroid::CentroidTracker;
use crate::tracker::engine::TrackerEngine;
use crate::tracker::optical_flow::OpticalFlowTracker;

type FlowFactory = Rc<dyn Fn() -> Box<dyn SparseOpticalFlow>>;

/// Maps every algorithm the host can provide to a factory for it.
///
/// The centroid variant needs no external capability and is always available.
///
/// # Example
///
/// ```ignore
/// let registry = TrackerRegistry::new()
///     .with_appearance(AppearanceAlgorithm::Csrt, || Box::new(OpenCvCsrt::default()));
/// let engine = registry.build_named("CSRTTracker")?;
/// ```
#[derive(Clone, Default)]
pub struct TrackerRegistry {
    appearance: HashMap<AppearanceAlgorithm, SingleTrackerFactory>,
    optical_flow: Option<FlowFactory>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the implementation of an appearance-based algorithm.
    pub fn with_appearance<F>(mut self, algorithm: AppearanceAlgorithm, factory: F) -> Self
    where
        F: Fn() -> Box<dyn SingleObjectTracker> + 'static,
    {
        self.appearance.insert(algorithm, Rc::new(factory));
        self
    }

    /// Register the sparse optical-flow primitive.
    pub fn with_optical_flow<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn SparseOpticalFlow> + 'static,
    {
        self.optical_flow = Some(Rc::new(factory));
        self
    }

    pub fn supports(&self, kind: &TrackerKind) -> bool {
        match kind {
            TrackerKind::Appearance(algorithm) => self.appearance.contains_key(algorithm),
            TrackerKind::Centroid { .. } => true,
            TrackerKind::OpticalFlow => self.optical_flow.is_some(),
        }
    }

    /// Build a fresh engine of the given kind.
    pub fn build(&self, kind: TrackerKind) -> Result<TrackerEngine, TrackerError> {
        match kind {
            TrackerKind::Appearance(algorithm) => {
                let factory = self
                    .appearance
                    .get(&algorithm)
                    .ok_or_else(|| TrackerError::NotRegistered(algorithm.to_string()))?;
                Ok(TrackerEngine::Appearance(AppearanceTracker::new(
                    algorithm,
                    Rc::clone(factory),
                )))
            }
            TrackerKind::Centroid { max_disappeared } => {
                Ok(TrackerEngine::Centroid(CentroidTracker::new(max_disappeared)))
            }
            TrackerKind::OpticalFlow => {
                let factory = self
                    .optical_flow
                    .as_ref()
                    .ok_or_else(|| TrackerError::NotRegistered(kind.to_string()))?;
                Ok(TrackerEngine::OpticalFlow(OpticalFlowTracker::new(factory())))
            }
        }
    }

    /// Parse a configuration name and build the matching engine.
    pub fn build_named(&self, name: &str) -> Result<TrackerEngine, TrackerError> {
        self.build(name.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Frame;
    use crate::tracker::rect::BBox;

    struct Still;

    impl SingleObjectTracker for Still {
        fn init(&mut self, _frame: &Frame, _bbox: BBox) -> bool {
            true
        }
        fn update(&mut self, _frame: &Frame) -> Option<BBox> {
            Some(BBox::new(0, 0, 1, 1))
        }
    }

    #[test]
    fn test_build_registered() {
        let registry =
            TrackerRegistry::new().with_appearance(AppearanceAlgorithm::Kcf, || Box::new(Still));
        let engine = registry.build_named("KCFTracker").unwrap();
        assert_eq!(engine.kind(), TrackerKind::Appearance(AppearanceAlgorithm::Kcf));
    }

    #[test]
    fn test_centroid_always_available() {
        let registry = TrackerRegistry::new();
        let engine = registry
            .build(TrackerKind::Centroid { max_disappeared: 7 })
            .unwrap();
        assert_eq!(engine.kind(), TrackerKind::Centroid { max_disappeared: 7 });
    }

    #[test]
    fn test_missing_registration() {
        let registry = TrackerRegistry::new();
        assert!(!registry.supports(&TrackerKind::OpticalFlow));
        assert!(matches!(
            registry.build_named("CSRTTracker"),
            Err(TrackerError::NotRegistered(name)) if name == "CSRTTracker"
        ));
        assert!(matches!(
            registry.build_named("optical_flow"),
            Err(TrackerError::NotRegistered(_))
        ));
        assert!(matches!(
            registry.build_named("nope"),
            Err(TrackerError::UnknownAlgorithm(_))
        ));
    }
}
