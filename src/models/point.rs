use crate::utils::geometry;

/// Image-space point with floating point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResultPoint {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl ResultPoint {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &ResultPoint) -> f32 {
        geometry::distance(self.x, self.y, other.x, other.y)
    }

    /// Translate point by (dx, dy)
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Both coordinates are finite numbers
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The four image-space corners of a symbol.
///
/// Ordering is a caller contract: top-left, bottom-left, top-right,
/// bottom-right. Nothing re-derives it from the coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Corners {
    /// Top-left corner
    pub top_left: ResultPoint,
    /// Bottom-left corner
    pub bottom_left: ResultPoint,
    /// Top-right corner
    pub top_right: ResultPoint,
    /// Bottom-right corner
    pub bottom_right: ResultPoint,
}

impl Corners {
    /// Bundle four corners in caller order
    pub fn new(
        top_left: ResultPoint,
        bottom_left: ResultPoint,
        top_right: ResultPoint,
        bottom_right: ResultPoint,
    ) -> Self {
        Self {
            top_left,
            bottom_left,
            top_right,
            bottom_right,
        }
    }

    /// Axis-aligned rectangle spanning `[left, right] x [top, bottom]`
    pub fn rectangle(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self::new(
            ResultPoint::new(left, top),
            ResultPoint::new(left, bottom),
            ResultPoint::new(right, top),
            ResultPoint::new(right, bottom),
        )
    }

    /// Corners as an array in caller order
    pub fn as_array(&self) -> [ResultPoint; 4] {
        [
            self.top_left,
            self.bottom_left,
            self.top_right,
            self.bottom_right,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let a = ResultPoint::new(1.0, 1.0);
        let b = a.translate(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert!(!ResultPoint::new(f32::NAN, 0.0).is_finite());
    }

    #[test]
    fn test_rectangle_corner_order() {
        let c = Corners::rectangle(10.0, 20.0, 110.0, 70.0);
        let [tl, bl, tr, br] = c.as_array();
        assert_eq!(tl, ResultPoint::new(10.0, 20.0));
        assert_eq!(bl, ResultPoint::new(10.0, 70.0));
        assert_eq!(tr, ResultPoint::new(110.0, 20.0));
        assert_eq!(br, ResultPoint::new(110.0, 70.0));
    }
}
