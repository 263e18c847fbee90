use serde::{Deserialize, Serialize};

use crate::tracker::BBox;

/// Capture parameters stored as `metadata.json`.
///
/// `frame_size` and `roi` serialize as JSON arrays; `roi` is `null` when no
/// region was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub frame_count: u32,
    pub fps: f64,
    /// (width, height)
    pub frame_size: (u32, u32),
    /// (x, y, width, height)
    pub roi: Option<(i32, i32, i32, i32)>,
}

impl SessionMetadata {
    pub fn new(frame_count: u32, fps: f64, frame_size: (u32, u32), roi: Option<BBox>) -> Self {
        Self {
            frame_count,
            fps,
            frame_size,
            roi: roi.map(Into::into),
        }
    }

    pub fn roi_bbox(&self) -> Option<BBox> {
        self.roi.map(BBox::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let meta = SessionMetadata::new(12, 29.97, (640, 480), Some(BBox::new(1, 2, 3, 4)));
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "frame_count": 12,
                "fps": 29.97,
                "frame_size": [640, 480],
                "roi": [1, 2, 3, 4],
            })
        );

        let back: SessionMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
        assert_eq!(back.roi_bbox(), Some(BBox::new(1, 2, 3, 4)));
    }

    #[test]
    fn test_missing_roi_is_null() {
        let meta = SessionMetadata::new(0, 30.0, (1, 1), None);
        let text = serde_json::to_string(&meta).unwrap();
        assert!(text.contains("\"roi\":null"));
    }
}
