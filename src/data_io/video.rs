//! Video encoder/decoder collaborators.
//!
//! Encoding frames into a lossless video stream and decoding them again is
//! left to the host (FFmpeg, OpenCV, ...). The archive only moves the encoded
//! files around.

use std::path::Path;

use crate::{BoxError, Frame};

/// FourCC of the lossless codec used for both video members.
pub const VIDEO_CODEC: [u8; 4] = *b"HFYU";
pub const VIDEO_CODEC_EXTENSION: &str = ".avi";

/// Parameters of a video stream to encode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSpec {
    pub fourcc: [u8; 4],
    pub fps: f64,
    /// (width, height)
    pub frame_size: (u32, u32),
}

impl VideoSpec {
    pub fn lossless(fps: f64, frame_size: (u32, u32)) -> Self {
        Self {
            fourcc: VIDEO_CODEC,
            fps,
            frame_size,
        }
    }

    pub fn codec_name(&self) -> String {
        String::from_utf8_lossy(&self.fourcc).into_owned()
    }
}

/// Writes frames into an encoded video file.
pub trait VideoWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), BoxError>;

    /// Flush and close the file. Called exactly once, before the file is read.
    fn finish(self: Box<Self>) -> Result<(), BoxError>;
}

/// Reads frames back from an encoded video file.
pub trait VideoReader {
    /// `Ok(None)` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Frame>, BoxError>;
}

/// Opens writers and readers on files.
pub trait VideoBackend {
    fn create_writer(&self, path: &Path, spec: &VideoSpec) -> Result<Box<dyn VideoWriter>, BoxError>;

    fn open_reader(&self, path: &Path) -> Result<Box<dyn VideoReader>, BoxError>;
}
