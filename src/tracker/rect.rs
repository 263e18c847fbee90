use nalgebra::Point2;

/// Integer bounding box in TLWH format (top-left x, top-left y, width, height).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BBox {
    /// Top-left x coordinate
    pub x: i32,
    /// Top-left y coordinate
    pub y: i32,
    /// Width of the bounding box
    pub width: i32,
    /// Height of the bounding box
    pub height: i32,
}

impl BBox {
    /// Create a new box from top-left coordinates and dimensions.
    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a box of the given size centred on a point.
    ///
    /// The top-left corner is truncated toward zero.
    #[inline]
    pub fn around(center: Point2<f32>, width: i32, height: i32) -> Self {
        Self {
            x: (center.x - width as f32 / 2.0) as i32,
            y: (center.y - height as f32 / 2.0) as i32,
            width,
            height,
        }
    }

    /// Convert to TLWH floats, the layout stored in annotation records.
    #[inline]
    pub fn to_tlwh(&self) -> [f32; 4] {
        [
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        ]
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [i32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    #[inline]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Both dimensions are strictly positive.
    #[inline]
    pub fn has_positive_size(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// The box lies entirely inside a `frame_width` x `frame_height` frame.
    pub fn fits_within(&self, frame_width: u32, frame_height: u32) -> bool {
        let [x1, y1, x2, y2] = self.to_tlbr().map(i64::from);
        x1 >= 0 && y1 >= 0 && x2 <= i64::from(frame_width) && y2 <= i64::from(frame_height)
    }
}

impl From<BBox> for (i32, i32, i32, i32) {
    fn from(b: BBox) -> Self {
        (b.x, b.y, b.width, b.height)
    }
}

impl From<(i32, i32, i32, i32)> for BBox {
    fn from((x, y, width, height): (i32, i32, i32, i32)) -> Self {
        Self::new(x, y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_conversions() {
        let rect = BBox::new(10, 20, 30, 40);

        assert_eq!(rect.to_tlwh(), [10.0, 20.0, 30.0, 40.0]);
        assert_eq!(rect.to_tlbr(), [10, 20, 40, 60]);

        let c = rect.center();
        assert_eq!(c.x, 25.0);
        assert_eq!(c.y, 40.0);
    }

    #[test]
    fn test_around_point() {
        let b = BBox::around(Point2::new(52.0, 51.0), 4, 4);
        assert_eq!(b, BBox::new(50, 49, 4, 4));
    }

    #[test]
    fn test_fits_within() {
        assert!(BBox::new(0, 0, 640, 480).fits_within(640, 480));
        assert!(!BBox::new(600, 0, 41, 10).fits_within(640, 480));
        assert!(!BBox::new(-1, 0, 10, 10).fits_within(640, 480));
        assert!(!BBox::new(0, 475, 10, 10).fits_within(640, 480));
    }

    #[test]
    fn test_positive_size() {
        assert!(BBox::new(0, 0, 1, 1).has_positive_size());
        assert!(!BBox::new(0, 0, 0, 10).has_positive_size());
        assert!(!BBox::new(0, 0, 10, -3).has_positive_size());
    }
}
