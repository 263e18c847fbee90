//! Write side of the session archive.

use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::{debug, info, warn};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::Frame;
use crate::data_io::annotation::{AnnotationItem, FrameAnnotationRecord};
use crate::data_io::format::{
    ANNOTATED_VIDEO, ANNOTATIONS_BIN, METADATA_JSON, RAW_VIDEO, README, ROI_FRAME, readme_content,
};
use crate::data_io::metadata::SessionMetadata;
use crate::data_io::scratch::ScratchDir;
use crate::data_io::video::{VideoBackend, VideoSpec, VideoWriter};
use crate::error::ArchiveError;
use crate::tracker::BBox;

/// Accumulates one tracking session and packages it as a single archive.
///
/// Video frames and annotation records are streamed into a private scratch
/// directory while the session runs. [`finalize`](Self::finalize) turns them
/// into the archive; [`abort`](Self::abort) discards them. The scratch
/// directory is removed on both paths, whether packaging succeeded or not.
pub struct ArchiveWriter {
    output_path: PathBuf,
    spec: VideoSpec,
    scratch: Option<ScratchDir>,
    raw_video: Option<Box<dyn VideoWriter>>,
    annotated_video: Option<Box<dyn VideoWriter>>,
    annotations: Option<BufWriter<File>>,
    record_buf: Vec<u8>,
    frame_count: u32,
    roi: Option<BBox>,
    roi_frame: Option<Frame>,
    extra_members: Vec<(String, Vec<u8>)>,
}

impl ArchiveWriter {
    /// Acquire scratch space and open both video streams.
    ///
    /// `fps` must be finite and positive.
    pub fn create(
        output_path: impl Into<PathBuf>,
        backend: &dyn VideoBackend,
        fps: f64,
        frame_size: (u32, u32),
    ) -> Result<Self, ArchiveError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ArchiveError::InvalidFrameRate(fps));
        }
        let output_path = output_path.into();
        let spec = VideoSpec::lossless(fps, frame_size);
        let scratch = ScratchDir::new("vision-track")?;

        // Any early return drops the scratch directory, which removes it.
        let raw_video = backend
            .create_writer(&scratch.file(RAW_VIDEO), &spec)
            .map_err(ArchiveError::Video)?;
        let annotated_video = backend
            .create_writer(&scratch.file(ANNOTATED_VIDEO), &spec)
            .map_err(ArchiveError::Video)?;
        let annotations = BufWriter::new(File::create(scratch.file(ANNOTATIONS_BIN))?);

        debug!(
            output = %output_path.display(),
            scratch = %scratch.path().display(),
            codec = %spec.codec_name(),
            fps,
            width = frame_size.0,
            height = frame_size.1,
            "opened session archive"
        );

        Ok(Self {
            output_path,
            spec,
            scratch: Some(scratch),
            raw_video: Some(raw_video),
            annotated_video: Some(annotated_video),
            annotations: Some(annotations),
            record_buf: Vec::new(),
            frame_count: 0,
            roi: None,
            roi_frame: None,
            extra_members: Vec::new(),
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Frames written so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Record the frame the region of interest was selected on.
    pub fn set_roi(&mut self, frame: &Frame, roi: Option<BBox>) {
        self.roi_frame = Some(frame.clone());
        self.roi = roi;
    }

    /// Append one processed frame and its annotations.
    ///
    /// Returns the frame number assigned to the record.
    pub fn write_frame(
        &mut self,
        raw: &Frame,
        annotated: &Frame,
        items: Vec<AnnotationItem>,
    ) -> Result<u32, ArchiveError> {
        let frame_number = self.frame_count;
        let record = FrameAnnotationRecord::new(frame_number, items);
        self.record_buf.clear();
        record.encode_into(&mut self.record_buf)?;

        if let Some(w) = self.raw_video.as_mut() {
            w.write_frame(raw).map_err(ArchiveError::Video)?;
        }
        if let Some(w) = self.annotated_video.as_mut() {
            w.write_frame(annotated).map_err(ArchiveError::Video)?;
        }
        if let Some(a) = self.annotations.as_mut() {
            a.write_all(&self.record_buf)?;
        }

        self.frame_count += 1;
        Ok(frame_number)
    }

    /// Add an extra member (e.g. the session log) to the archive.
    pub fn add_member(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.extra_members.push((name.into(), contents.into()));
    }

    /// Package all members into the output archive and release scratch space.
    pub fn finalize(mut self) -> Result<PathBuf, ArchiveError> {
        let packaged = self.package();
        let released = self.release();
        let path = packaged?;
        released?;
        info!(
            path = %path.display(),
            frames = self.frame_count,
            "session archive written"
        );
        Ok(path)
    }

    /// Discard the session without producing an archive.
    pub fn abort(mut self) -> Result<(), ArchiveError> {
        let finished = self.finish_streams();
        let released = self.release();
        finished?;
        released
    }

    fn finish_streams(&mut self) -> Result<(), ArchiveError> {
        let raw = self.raw_video.take().map(|w| w.finish());
        let annotated = self.annotated_video.take().map(|w| w.finish());
        let flushed = match self.annotations.take() {
            Some(mut a) => a.flush(),
            None => Ok(()),
        };
        if let Some(r) = raw {
            r.map_err(ArchiveError::Video)?;
        }
        if let Some(r) = annotated {
            r.map_err(ArchiveError::Video)?;
        }
        flushed?;
        Ok(())
    }

    fn metadata(&self) -> SessionMetadata {
        let (fps, frame_size) = (self.spec.fps, self.spec.frame_size);
        SessionMetadata::new(self.frame_count, fps, frame_size, self.roi)
    }

    fn package(&mut self) -> Result<PathBuf, ArchiveError> {
        self.finish_streams()?;
        let scratch = self.scratch.as_ref().ok_or_else(|| {
            ArchiveError::Io(io::Error::new(io::ErrorKind::NotFound, "scratch space already released"))
        })?;

        let roi_frame = self.roi_frame.as_ref().ok_or(ArchiveError::MissingRoiFrame)?;
        let mut roi_png = Vec::new();
        roi_frame.write_to(&mut Cursor::new(&mut roi_png), ImageFormat::Png)?;
        let metadata = serde_json::to_vec(&self.metadata())?;

        let partial = partial_path(&self.output_path);
        let written = self.write_zip(scratch, &partial, &metadata, &roi_png);
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&partial) {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!(path = %partial.display(), error = %cleanup, "failed to remove partial archive");
                }
            }
            return Err(e);
        }
        fs::rename(&partial, &self.output_path)?;
        Ok(self.output_path.clone())
    }

    fn write_zip(
        &self,
        scratch: &ScratchDir,
        path: &Path,
        metadata: &[u8],
        roi_png: &[u8],
    ) -> Result<(), ArchiveError> {
        let options = SimpleFileOptions::default();
        let mut zip = ZipWriter::new(BufWriter::new(File::create(path)?));

        for member in [RAW_VIDEO, ANNOTATED_VIDEO, ANNOTATIONS_BIN] {
            zip.start_file(member, options)?;
            let mut src = File::open(scratch.file(member))?;
            io::copy(&mut src, &mut zip)?;
        }

        zip.start_file(METADATA_JSON, options)?;
        zip.write_all(metadata)?;
        zip.start_file(ROI_FRAME, options)?;
        zip.write_all(roi_png)?;
        zip.start_file(README, options)?;
        zip.write_all(readme_content().as_bytes())?;

        for (name, contents) in &self.extra_members {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(contents)?;
        }

        let mut out = zip.finish()?;
        out.flush()?;
        Ok(())
    }

    fn release(&mut self) -> Result<(), ArchiveError> {
        if let Some(scratch) = self.scratch.take() {
            scratch.close()?;
        }
        Ok(())
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
