//! Drawing tracked boxes onto frames for the annotated video.

use std::collections::BTreeMap;

use ab_glyph::{FontArc, PxScale};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::Frame;
use crate::tracker::BBox;

/// Produces the annotated copy of a frame.
pub trait OverlayRenderer {
    fn render(&self, frame: &Frame, tracks: &BTreeMap<u32, BBox>) -> Frame;
}

/// Gap between the top edge of a box and the baseline of its label.
const LABEL_GAP: i32 = 10;

/// Hollow rectangle around every tracked box, with an `ID: <id>` label above
/// it when a label font is set.
///
/// No font ships with the crate; without one only the rectangles are drawn.
#[derive(Clone)]
pub struct BoxOverlay {
    pub color: Rgb<u8>,
    pub thickness: u32,
    pub label_font: Option<FontArc>,
    pub label_scale: f32,
}

impl Default for BoxOverlay {
    fn default() -> Self {
        Self {
            color: Rgb([0, 255, 0]),
            thickness: 2,
            label_font: None,
            label_scale: 12.0,
        }
    }
}

impl std::fmt::Debug for BoxOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxOverlay")
            .field("color", &self.color)
            .field("thickness", &self.thickness)
            .field("labels", &self.label_font.is_some())
            .field("label_scale", &self.label_scale)
            .finish()
    }
}

impl BoxOverlay {
    pub fn with_label_font(mut self, font: FontArc) -> Self {
        self.label_font = Some(font);
        self
    }

    /// Parse a TrueType/OpenType font for the id labels.
    pub fn with_label_font_data(self, data: Vec<u8>) -> Result<Self, ab_glyph::InvalidFont> {
        Ok(self.with_label_font(FontArc::try_from_vec(data)?))
    }

    pub fn label_text(id: u32) -> String {
        format!("ID: {id}")
    }

    /// Top-left corner of the label for `bbox`. The label's baseline sits
    /// `LABEL_GAP` pixels above the box.
    pub fn label_origin(&self, bbox: BBox) -> (i32, i32) {
        (bbox.x, bbox.y - LABEL_GAP - self.label_scale.round() as i32)
    }

    fn draw(&self, canvas: &mut Frame, bbox: BBox) {
        for inset in 0..self.thickness as i32 {
            let w = bbox.width - 2 * inset;
            let h = bbox.height - 2 * inset;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(bbox.x + inset, bbox.y + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, rect, self.color);
        }
    }
}

impl OverlayRenderer for BoxOverlay {
    fn render(&self, frame: &Frame, tracks: &BTreeMap<u32, BBox>) -> Frame {
        let mut canvas = frame.clone();
        for (&id, bbox) in tracks {
            self.draw(&mut canvas, *bbox);
            if let Some(font) = &self.label_font {
                let (x, y) = self.label_origin(*bbox);
                let scale = PxScale::from(self.label_scale);
                draw_text_mut(&mut canvas, self.color, x, y, scale, font, &Self::label_text(id));
            }
        }
        canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_border_only() {
        let frame = Frame::new(20, 20);
        let tracks = BTreeMap::from([(0, BBox::new(2, 2, 10, 10))]);
        let out = BoxOverlay::default().render(&frame, &tracks);

        assert_eq!(out.get_pixel(2, 2), &Rgb([0, 255, 0]));
        assert_eq!(out.get_pixel(3, 3), &Rgb([0, 255, 0]));
        assert_eq!(out.get_pixel(6, 6), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(15, 15), &Rgb([0, 0, 0]));
        // Source frame untouched.
        assert_eq!(frame.get_pixel(2, 2), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_label_placement() {
        let overlay = BoxOverlay::default();
        assert_eq!(BoxOverlay::label_text(7), "ID: 7");
        assert_eq!(overlay.label_origin(BBox::new(30, 40, 10, 10)), (30, 18));
        assert_eq!(overlay.label_origin(BBox::new(0, 5, 4, 4)), (0, -17));
    }

    #[test]
    fn test_no_label_without_font() {
        let frame = Frame::new(40, 40);
        let tracks = BTreeMap::from([(3, BBox::new(10, 25, 10, 10))]);
        let out = BoxOverlay::default().render(&frame, &tracks);
        // Nothing is drawn in the band above the box.
        for y in 0..25 {
            for x in 0..40 {
                assert_eq!(out.get_pixel(x, y), &Rgb([0, 0, 0]), "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_rejects_invalid_font_data() {
        let overlay = BoxOverlay::default().with_label_font_data(b"not a font".to_vec());
        assert!(overlay.is_err());
    }

    #[test]
    fn test_degenerate_and_offscreen_boxes() {
        let frame = Frame::new(8, 8);
        let tracks = BTreeMap::from([
            (0, BBox::new(1, 1, 0, 5)),
            (1, BBox::new(6, 6, 10, 10)),
            (2, BBox::new(-3, -3, 1, 1)),
        ]);
        let out = BoxOverlay::default().render(&frame, &tracks);
        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(out.get_pixel(6, 6), &Rgb([0, 255, 0]));
    }
}
