//! Read side of the session archive.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::Frame;
use crate::data_io::annotation::{AnnotationItem, AnnotationStream};
use crate::data_io::format::{
    ANNOTATED_VIDEO, ANNOTATIONS_BIN, METADATA_JSON, RAW_VIDEO, ROI_FRAME, SESSION_LOG,
};
use crate::data_io::metadata::SessionMetadata;
use crate::data_io::scratch::ScratchDir;
use crate::data_io::video::{VideoBackend, VideoReader};
use crate::error::{ArchiveError, CodecError};

/// An opened session archive.
///
/// Metadata, the ROI snapshot and the annotation stream are loaded eagerly;
/// video members are decoded on demand through a [`VideoBackend`].
pub struct ArchiveReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    metadata: SessionMetadata,
    roi_frame: Frame,
    annotations: Vec<u8>,
}

impl ArchiveReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let mut archive = ZipArchive::new(BufReader::new(File::open(&path)?))?;

        let metadata: SessionMetadata = serde_json::from_slice(&read_member(&mut archive, METADATA_JSON)?)?;
        let roi_png = read_member(&mut archive, ROI_FRAME)?;
        let roi_frame = image::load_from_memory_with_format(&roi_png, ImageFormat::Png)?.to_rgb8();
        let annotations = read_member(&mut archive, ANNOTATIONS_BIN)?;

        debug!(
            path = %path.display(),
            frames = metadata.frame_count,
            annotation_bytes = annotations.len(),
            "opened session archive for reading"
        );

        Ok(Self {
            path,
            archive,
            metadata,
            roi_frame,
            annotations,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &SessionMetadata {
        &self.metadata
    }

    /// The frame the region of interest was selected on.
    pub fn roi_frame(&self) -> &Frame {
        &self.roi_frame
    }

    pub fn annotation_bytes(&self) -> &[u8] {
        &self.annotations
    }

    /// Lazily decode the annotation stream from its first record.
    pub fn annotations(&self) -> AnnotationStream<'_> {
        AnnotationStream::new(&self.annotations)
    }

    /// Annotations recorded for `frame_number`, or `None` past the last record.
    pub fn annotations_for(
        &self,
        frame_number: u32,
    ) -> Result<Option<Vec<AnnotationItem>>, CodecError> {
        for record in self.annotations() {
            let record = record?;
            if record.frame_number == frame_number {
                return Ok(Some(record.items));
            }
        }
        Ok(None)
    }

    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    pub fn read_member(&mut self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        read_member(&mut self.archive, name)
    }

    /// The captured session log, if the archive carries one.
    pub fn session_log(&mut self) -> Result<Option<String>, ArchiveError> {
        match read_member(&mut self.archive, SESSION_LOG) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(ArchiveError::MissingMember(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Frame-by-frame reader over the raw video member.
    pub fn raw_frames(&mut self, backend: &dyn VideoBackend) -> Result<ArchivedFrames, ArchiveError> {
        self.frames(RAW_VIDEO, backend)
    }

    /// Frame-by-frame reader over the annotated video member.
    pub fn annotated_frames(
        &mut self,
        backend: &dyn VideoBackend,
    ) -> Result<ArchivedFrames, ArchiveError> {
        self.frames(ANNOTATED_VIDEO, backend)
    }

    fn frames(&mut self, member: &str, backend: &dyn VideoBackend) -> Result<ArchivedFrames, ArchiveError> {
        // The decoder needs a real file, so the member is extracted to scratch
        // space that lives exactly as long as the returned reader.
        let scratch = ScratchDir::new("vision-track-read")?;
        let video_path = scratch.file(member);
        fs::write(&video_path, read_member(&mut self.archive, member)?)?;
        let reader = backend.open_reader(&video_path).map_err(ArchiveError::Video)?;
        Ok(ArchivedFrames {
            reader,
            fps: self.metadata.fps,
            scratch,
        })
    }
}

fn read_member<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, ArchiveError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Err(ArchiveError::MissingMember(name.to_string())),
        Err(e) => return Err(e.into()),
    };
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Decoded frames of one archived video member.
///
/// Backed by a scratch copy of the member, removed on [`close`](Self::close)
/// or drop.
pub struct ArchivedFrames {
    reader: Box<dyn VideoReader>,
    fps: f64,
    scratch: ScratchDir,
}

impl ArchivedFrames {
    /// `Ok(None)` once every frame has been read.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, ArchiveError> {
        self.reader.read_frame().map_err(ArchiveError::Video)
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Directory holding the extracted video member.
    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    pub fn close(self) -> Result<(), ArchiveError> {
        let ArchivedFrames {
            reader, scratch, ..
        } = self;
        drop(reader);
        scratch.close()?;
        Ok(())
    }
}
