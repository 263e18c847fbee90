#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use vision_track::data_io::{VideoBackend, VideoReader, VideoSpec, VideoWriter};
use vision_track::integration::FrameSource;
use vision_track::tracker::{AppearanceAlgorithm, SingleObjectTracker, TrackerRegistry};
use vision_track::{BBox, BoxError, Frame};

/// Uncompressed stand-in for a real codec: each frame is stored as
/// `width u32 LE, height u32 LE` followed by its RGB bytes.
pub struct RawVideoBackend;

struct RawWriter {
    out: BufWriter<File>,
}

impl VideoWriter for RawWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), BoxError> {
        self.out.write_all(&frame.width().to_le_bytes())?;
        self.out.write_all(&frame.height().to_le_bytes())?;
        self.out.write_all(frame.as_raw())?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<(), BoxError> {
        self.out.flush()?;
        Ok(())
    }
}

struct RawReader {
    input: BufReader<File>,
}

impl VideoReader for RawReader {
    fn read_frame(&mut self) -> Result<Option<Frame>, BoxError> {
        let mut dims = [0u8; 8];
        match self.input.read_exact(&mut dims) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let width = u32::from_le_bytes([dims[0], dims[1], dims[2], dims[3]]);
        let height = u32::from_le_bytes([dims[4], dims[5], dims[6], dims[7]]);
        let mut data = vec![0u8; width as usize * height as usize * 3];
        self.input.read_exact(&mut data)?;
        let frame = Frame::from_raw(width, height, data).ok_or("frame buffer size mismatch")?;
        Ok(Some(frame))
    }
}

impl VideoBackend for RawVideoBackend {
    fn create_writer(&self, path: &Path, _spec: &VideoSpec) -> Result<Box<dyn VideoWriter>, BoxError> {
        Ok(Box::new(RawWriter {
            out: BufWriter::new(File::create(path)?),
        }))
    }

    fn open_reader(&self, path: &Path) -> Result<Box<dyn VideoReader>, BoxError> {
        Ok(Box::new(RawReader {
            input: BufReader::new(File::open(path)?),
        }))
    }
}

/// Backend whose writers cannot be created.
pub struct BrokenVideoBackend;

impl VideoBackend for BrokenVideoBackend {
    fn create_writer(&self, _path: &Path, _spec: &VideoSpec) -> Result<Box<dyn VideoWriter>, BoxError> {
        Err("encoder unavailable".into())
    }

    fn open_reader(&self, _path: &Path) -> Result<Box<dyn VideoReader>, BoxError> {
        Err("decoder unavailable".into())
    }
}

/// Frames served from memory, optionally failing once they run out.
pub struct VecSource {
    frames: VecDeque<Frame>,
    fail_when_empty: bool,
    fps: f64,
    pub fetched: usize,
}

impl VecSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
            fail_when_empty: false,
            fps: 30.0,
            fetched: 0,
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    /// Error instead of reporting end of stream.
    pub fn failing_after(frames: Vec<Frame>) -> Self {
        Self {
            fail_when_empty: true,
            ..Self::new(frames)
        }
    }
}

impl FrameSource for VecSource {
    type Error = io::Error;

    fn fetch_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
        match self.frames.pop_front() {
            Some(frame) => {
                self.fetched += 1;
                Ok(Some(frame))
            }
            None if self.fail_when_empty => Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "camera disconnected",
            )),
            None => Ok(None),
        }
    }

    fn fps(&self) -> f64 {
        self.fps
    }
}

/// Single-object tracker that moves its box by a fixed step each frame.
pub struct DriftingTracker {
    bbox: BBox,
    step: (i32, i32),
}

impl DriftingTracker {
    pub fn new(step: (i32, i32)) -> Self {
        Self {
            bbox: BBox::new(0, 0, 0, 0),
            step,
        }
    }
}

impl SingleObjectTracker for DriftingTracker {
    fn init(&mut self, _frame: &Frame, bbox: BBox) -> bool {
        self.bbox = bbox;
        true
    }

    fn update(&mut self, _frame: &Frame) -> Option<BBox> {
        self.bbox.x += self.step.0;
        self.bbox.y += self.step.1;
        Some(self.bbox)
    }
}

/// Registry with a drifting tracker behind every appearance algorithm.
pub fn drifting_registry(step: (i32, i32)) -> TrackerRegistry {
    AppearanceAlgorithm::ALL
        .iter()
        .fold(TrackerRegistry::new(), |registry, &algorithm| {
            registry.with_appearance(algorithm, move || -> Box<dyn SingleObjectTracker> {
                Box::new(DriftingTracker::new(step))
            })
        })
}

/// Gradient frame, so different frames encode to different bytes.
pub fn frame(width: u32, height: u32, seed: u8) -> Frame {
    Frame::from_fn(width, height, |x, y| {
        image::Rgb([seed, (x % 256) as u8, (y % 256) as u8])
    })
}

pub fn frames(count: usize, width: u32, height: u32) -> Vec<Frame> {
    (0..count).map(|i| frame(width, height, i as u8)).collect()
}
