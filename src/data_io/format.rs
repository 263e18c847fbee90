//! Fixed names and layout of a session archive.

use crate::data_io::annotation::{HEADER_SIZE, ITEM_SIZE};
use crate::data_io::video::VIDEO_CODEC;

pub const RAW_VIDEO: &str = "raw_video.avi";
pub const ANNOTATED_VIDEO: &str = "annotated_video.avi";
pub const ANNOTATIONS_BIN: &str = "annotations.bin";
pub const METADATA_JSON: &str = "metadata.json";
pub const ROI_FRAME: &str = "roi_frame.png";
pub const README: &str = "README.txt";

/// Optional member holding the captured session log.
pub const SESSION_LOG: &str = "console.log";

/// Members every well-formed archive contains.
pub const MANIFEST: [&str; 6] = [
    RAW_VIDEO,
    ANNOTATED_VIDEO,
    ANNOTATIONS_BIN,
    METADATA_JSON,
    ROI_FRAME,
    README,
];

/// Exact key set of `metadata.json`.
pub const METADATA_KEYS: [&str; 4] = ["frame_count", "fps", "frame_size", "roi"];

/// Timestamp pattern of default archive names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H_%M_%S";

/// Text of the `README.txt` member.
pub fn readme_content() -> String {
    let codec = String::from_utf8_lossy(&VIDEO_CODEC);
    format!(
        "This archive contains tracking data in the following structure:\n\
         1. {RAW_VIDEO}: Raw video footage ({codec} codec)\n\
         2. {ANNOTATED_VIDEO}: Annotated video with tracking overlay\n\
         3. {ANNOTATIONS_BIN}: Binary tracking data with format:\n   \
         - Header: <IH ({HEADER_SIZE} bytes: frame_number u32, num_annotations u16)\n   \
         - Per annotation: <4f f ({ITEM_SIZE} bytes: x, y, w, h, confidence as f32)\n\
         4. {METADATA_JSON}: JSON metadata with tracking parameters\n\
         5. {ROI_FRAME}: Initial ROI selection frame\n\
         \n\
         All numeric values are little-endian. Video frame size and FPS are stored in metadata.\n"
    )
}
