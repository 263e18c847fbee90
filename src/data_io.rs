//! Session archive I/O: the binary annotation codec and the archive container.

mod annotation;
mod format;
mod metadata;
mod reader;
mod scratch;
mod validator;
mod video;
mod writer;

pub use annotation::{
    AnnotationItem, AnnotationStream, FrameAnnotationRecord, HEADER_SIZE, ITEM_SIZE, decode_all,
    validate_annotation_stream,
};
pub use format::{
    ANNOTATED_VIDEO, ANNOTATIONS_BIN, MANIFEST, METADATA_JSON, METADATA_KEYS, RAW_VIDEO, README,
    ROI_FRAME, SESSION_LOG, TIMESTAMP_FORMAT, readme_content,
};
pub use metadata::SessionMetadata;
pub use reader::{ArchiveReader, ArchivedFrames};
pub use scratch::ScratchDir;
pub use validator::{
    ArchiveValidator, ValidationFailure, ValidationReport, is_well_formed, validate,
    validate_reader,
};
pub use video::{
    VIDEO_CODEC, VIDEO_CODEC_EXTENSION, VideoBackend, VideoReader, VideoSpec, VideoWriter,
};
pub use writer::ArchiveWriter;
