//! Bit-exact binary codec for per-frame annotation records.
//!
//! Layout, all fields little-endian:
//!
//! ```text
//! header: frame_number u32 | item_count u16                 (6 bytes)
//! item:   x f32 | y f32 | w f32 | h f32 | confidence f32     (20 bytes, repeated)
//! ```

use crate::error::CodecError;
use crate::tracker::BBox;

pub const HEADER_SIZE: usize = 6;
pub const ITEM_SIZE: usize = 20;

/// One annotated object within a frame record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationItem {
    /// TLWH box
    pub bbox: [f32; 4],
    pub confidence: f32,
}

impl AnnotationItem {
    pub fn new(bbox: [f32; 4], confidence: f32) -> Self {
        Self { bbox, confidence }
    }

    pub fn from_bbox(bbox: BBox, confidence: f32) -> Self {
        Self::new(bbox.to_tlwh(), confidence)
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        for v in self.bbox {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&self.confidence.to_le_bytes());
    }

    fn read_from(block: &[u8]) -> Self {
        let f = |i: usize| {
            let start = i * 4;
            f32::from_le_bytes([
                block[start],
                block[start + 1],
                block[start + 2],
                block[start + 3],
            ])
        };
        Self {
            bbox: [f(0), f(1), f(2), f(3)],
            confidence: f(4),
        }
    }
}

/// All annotations of one processed frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameAnnotationRecord {
    pub frame_number: u32,
    pub items: Vec<AnnotationItem>,
}

impl FrameAnnotationRecord {
    pub fn new(frame_number: u32, items: Vec<AnnotationItem>) -> Self {
        Self {
            frame_number,
            items,
        }
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.items.len() * ITEM_SIZE
    }

    /// Append the encoded record to `out`, items in the order given.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        let count =
            u16::try_from(self.items.len()).map_err(|_| CodecError::TooManyItems(self.items.len()))?;
        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.frame_number.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        for item in &self.items {
            item.write_to(out);
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Decode the record starting at `offset`.
    ///
    /// Returns the record and the offset just past it. Nothing is returned for
    /// an incomplete header or item block; the error carries the position.
    pub fn decode_at(data: &[u8], offset: usize) -> Result<(Self, usize), CodecError> {
        let record_offset = offset;
        let header = take(data, record_offset, offset, HEADER_SIZE)?;
        let frame_number = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let count = u16::from_le_bytes([header[4], header[5]]) as usize;

        let mut pos = offset + HEADER_SIZE;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            let block = take(data, record_offset, pos, ITEM_SIZE)?;
            items.push(AnnotationItem::read_from(block));
            pos += ITEM_SIZE;
        }

        Ok((Self::new(frame_number, items), pos))
    }
}

fn take(data: &[u8], record_offset: usize, offset: usize, needed: usize) -> Result<&[u8], CodecError> {
    let available = data.len().saturating_sub(offset);
    if available < needed {
        return Err(CodecError::Truncated {
            record_offset,
            offset,
            needed,
            available,
        });
    }
    Ok(&data[offset..offset + needed])
}

/// Lazy decoder over an encoded annotation stream.
///
/// Yields one record per frame until the data is exhausted. After a
/// truncation error it yields nothing more; [`rewind`](Self::rewind) restarts
/// from offset 0.
#[derive(Debug, Clone)]
pub struct AnnotationStream<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> AnnotationStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    /// Byte offset of the next record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rewind(&mut self) {
        self.offset = 0;
        self.failed = false;
    }
}

impl Iterator for AnnotationStream<'_> {
    type Item = Result<FrameAnnotationRecord, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.data.len() {
            return None;
        }
        match FrameAnnotationRecord::decode_at(self.data, self.offset) {
            Ok((record, next)) => {
                self.offset = next;
                Some(Ok(record))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for AnnotationStream<'_> {}

/// Decode every record, failing on the first truncation.
pub fn decode_all(data: &[u8]) -> Result<Vec<FrameAnnotationRecord>, CodecError> {
    AnnotationStream::new(data).collect()
}

/// Check that `data` is a sequence of complete records with no leftover
/// bytes, returning the number of records.
pub fn validate_annotation_stream(data: &[u8]) -> Result<usize, CodecError> {
    let mut count = 0;
    for record in AnnotationStream::new(data) {
        record?;
        count += 1;
    }
    Ok(count)
}
