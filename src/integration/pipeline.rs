//! TrackingSession: drives a frame source through the tracker into an archive.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use tracing::{debug, error, info, warn};

use crate::Frame;
use crate::data_io::{AnnotationItem, ArchiveWriter, SESSION_LOG, VideoBackend};
use crate::error::{ConfigError, SessionError};
use crate::tracker::{MultiObjectTracker, TrackerEngine, TrackerRegistry};

use super::{
    BoxOverlay, DetectionSource, FixedRegion, FrameSource, IntoCentroids, OverlayRenderer,
    RegionSelector, SessionConfig, SessionLog, StopSignal,
};

/// Confidence recorded for every tracked box.
const TRACK_CONFIDENCE: f32 = 1.0;

/// Lifecycle of a [`TrackingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    RegionSelected,
    Initialized,
    Tracking,
    Finalized,
    Failed,
}

/// Outcome of a session that produced an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    /// Frames written to the archive, not counting the ROI frame.
    pub frames_processed: u32,
    pub archive_path: PathBuf,
    /// Whether the loop ended on the [`StopSignal`] rather than end of stream.
    pub stopped_by_signal: bool,
}

/// A single tracking session.
///
/// This bundles a [`FrameSource`], a [`TrackerEngine`] and the archive
/// writer. Optional collaborators (region selector, detection source,
/// overlay renderer) are attached with the `with_*` methods.
pub struct TrackingSession<S: FrameSource> {
    source: S,
    engine: TrackerEngine,
    backend: Box<dyn VideoBackend>,
    output_path: PathBuf,
    selector: Option<Box<dyn RegionSelector>>,
    detector: Option<Box<dyn DetectionSource>>,
    overlay: Box<dyn OverlayRenderer>,
    stop: StopSignal,
    log: SessionLog,
    warm_up_frames: u32,
    state: SessionState,
}

impl<S: FrameSource> TrackingSession<S> {
    pub fn new(
        source: S,
        engine: TrackerEngine,
        backend: Box<dyn VideoBackend>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            engine,
            backend,
            output_path: output_path.into(),
            selector: None,
            detector: None,
            overlay: Box::new(BoxOverlay::default()),
            stop: StopSignal::new(),
            log: SessionLog::new(),
            warm_up_frames: 0,
            state: SessionState::Uninitialized,
        }
    }

    /// Build a session from a loaded configuration.
    ///
    /// The engine comes from `registry`, a configured `roi` becomes a
    /// [`FixedRegion`] selector and the archive name is derived from `now`
    /// when the configuration has none.
    pub fn from_config<Tz>(
        config: &SessionConfig,
        source: S,
        registry: &TrackerRegistry,
        backend: Box<dyn VideoBackend>,
        now: &DateTime<Tz>,
    ) -> Result<Self, ConfigError>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let engine = registry.build(config.tracker_kind()?)?;
        let mut session = Self::new(source, engine, backend, config.output_path(now))
            .with_warm_up(config.warm_up_frames);
        if let Some(roi) = config.roi_bbox() {
            session = session.with_selector(FixedRegion(roi));
        }
        Ok(session)
    }

    pub fn with_selector(mut self, selector: impl RegionSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Detections feed the centroid variant each frame; other variants ignore them.
    pub fn with_detector(mut self, detector: impl DetectionSource + 'static) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    pub fn with_overlay(mut self, overlay: impl OverlayRenderer + 'static) -> Self {
        self.overlay = Box::new(overlay);
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_log(mut self, log: SessionLog) -> Self {
        self.log = log;
        self
    }

    /// Discard this many frames before taking the first one.
    pub fn with_warm_up(mut self, frames: u32) -> Self {
        self.warm_up_frames = frames;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle that stops the session after the current frame.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn engine(&self) -> &TrackerEngine {
        &self.engine
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Run the session to completion.
    ///
    /// Selects the region on the first frame, initializes the engine and then
    /// tracks until the source ends or the stop signal is raised. Events are
    /// captured in the session log for the duration of the call.
    ///
    /// # Returns
    /// A summary of the written archive. A failure before initialization
    /// leaves no archive behind. A failure during tracking still finalizes
    /// the archive with the frames processed so far before the error is
    /// returned.
    pub fn run(&mut self) -> Result<SessionSummary, SessionError> {
        let log = self.log.clone();
        tracing::subscriber::with_default(log.subscriber(), || self.run_session())
    }

    fn run_session(&mut self) -> Result<SessionSummary, SessionError> {
        info!(
            algorithm = %self.engine.kind(),
            output = %self.output_path.display(),
            "starting tracking session"
        );

        let first = match self.first_frame() {
            Ok(frame) => frame,
            Err(e) => return Err(self.fail(e)),
        };

        let Some(roi) = self.selector.as_mut().and_then(|s| s.select_region(&first)) else {
            return Err(self.fail(SessionError::NoRegionSelected));
        };
        self.state = SessionState::RegionSelected;
        info!(?roi, "region of interest selected");

        let report = self.engine.initialize(&first, &[roi]);
        if !report.is_success() {
            return Err(self.fail(SessionError::NoValidRegion {
                rejected: report.rejected(),
            }));
        }
        self.state = SessionState::Initialized;

        let mut writer = match ArchiveWriter::create(
            self.output_path.clone(),
            self.backend.as_ref(),
            self.source.fps(),
            first.dimensions(),
        ) {
            Ok(writer) => writer,
            Err(e) => return Err(self.fail(e.into())),
        };
        writer.set_roi(&first, Some(roi));

        info!("tracking initialized, starting main loop");
        self.state = SessionState::Tracking;
        let tracked = self.track(&mut writer);

        let frames_processed = writer.frame_count();
        info!(frames = frames_processed, "finalizing session archive");
        writer.add_member(SESSION_LOG, self.log.contents());
        let finalized = writer.finalize();

        match (tracked, finalized) {
            (Ok(stopped_by_signal), Ok(archive_path)) => {
                self.state = SessionState::Finalized;
                Ok(SessionSummary {
                    frames_processed,
                    archive_path,
                    stopped_by_signal,
                })
            }
            (Err(e), Ok(archive_path)) => {
                self.state = SessionState::Finalized;
                error!(
                    error = %e,
                    archive = %archive_path.display(),
                    "tracking stopped on error, partial session archived"
                );
                Err(e)
            }
            (Err(e), Err(archive_err)) => {
                warn!(error = %archive_err, "session archive could not be finalized");
                Err(self.fail(e))
            }
            (Ok(_), Err(archive_err)) => Err(self.fail(archive_err.into())),
        }
    }

    fn first_frame(&mut self) -> Result<Frame, SessionError> {
        for _ in 0..self.warm_up_frames {
            if self.fetch_initial()?.is_none() {
                return Err(SessionError::NoInitialFrame);
            }
        }
        if self.warm_up_frames > 0 {
            debug!(frames = self.warm_up_frames, "discarded warm-up frames");
        }
        self.fetch_initial()?.ok_or(SessionError::NoInitialFrame)
    }

    fn fetch_initial(&mut self) -> Result<Option<Frame>, SessionError> {
        self.source
            .fetch_frame()
            .map_err(|e| SessionError::SourceOpen(Box::new(e)))
    }

    /// Main loop. Returns whether it ended on the stop signal.
    fn track(&mut self, writer: &mut ArchiveWriter) -> Result<bool, SessionError> {
        loop {
            if self.stop.is_raised() {
                info!("stop requested");
                return Ok(true);
            }

            let frame = match self.source.fetch_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("end of video feed");
                    return Ok(false);
                }
                Err(e) => return Err(SessionError::Source(Box::new(e))),
            };

            if matches!(self.engine, TrackerEngine::Centroid(_)) {
                if let Some(detector) = self.detector.as_mut() {
                    let detections = detector.detect(&frame).map_err(SessionError::Detection)?;
                    self.engine.update_centroids(&detections.into_centroids());
                }
            }
            let tracks = self.engine.update(&frame);

            let annotated = self.overlay.render(&frame, &tracks);
            let items = tracks
                .values()
                .map(|bbox| AnnotationItem::from_bbox(*bbox, TRACK_CONFIDENCE))
                .collect();
            let frame_number = writer.write_frame(&frame, &annotated, items)?;
            debug!(frame_number, objects = tracks.len(), "frame processed");
        }
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        self.state = SessionState::Failed;
        error!(error = %err, "tracking session failed");
        err
    }
}
