use crate::error::{DecodeError, Result};
use crate::models::{BitMatrix, Corners, ResultPoint};
use crate::utils::geometry::{self, PerspectiveTransform};
use tracing::trace;

/// Samples an image-space bit matrix into a module-space symbol matrix.
///
/// The corners are the outer corners of the symbol: module-space `(0, 0)`,
/// `(0, rows)`, `(columns, 0)` and `(columns, rows)`.
pub struct GridSampler;

impl GridSampler {
    /// Sample `rows x columns` module centres through the corner homography.
    pub fn sample(
        image: &BitMatrix,
        corners: &Corners,
        rows: usize,
        columns: usize,
    ) -> Result<BitMatrix> {
        if rows == 0 || columns == 0 {
            return Err(DecodeError::geometry("cannot sample an empty grid"));
        }
        if corners.as_array().iter().any(|p| !p.is_finite()) {
            return Err(DecodeError::geometry("corner point is not finite"));
        }

        let top = corners.top_left.distance(&corners.top_right);
        let left = corners.top_left.distance(&corners.bottom_left);
        if top == 0.0 || left == 0.0 {
            return Err(DecodeError::geometry("degenerate symbol corners"));
        }
        let module_size = (top / columns as f32).min(left / rows as f32);

        let (r, c) = (rows as f32, columns as f32);
        let src = [
            ResultPoint::new(0.0, 0.0),
            ResultPoint::new(0.0, r),
            ResultPoint::new(c, 0.0),
            ResultPoint::new(c, r),
        ];
        let transform =
            PerspectiveTransform::quadrilateral_to_quadrilateral(&src, &corners.as_array())
                .ok_or_else(|| DecodeError::geometry("corner quadrilateral is singular"))?;

        // A 3x3 vote only helps when a module spans at least three pixels.
        let radius = if module_size >= 3.0 { 1 } else { 0 };
        trace!(module_size, radius, rows, columns, "sampling module grid");

        let mut result = BitMatrix::new(columns, rows);
        for y in 0..rows {
            for x in 0..columns {
                let center = ResultPoint::new(x as f32 + 0.5, y as f32 + 0.5);
                let p = transform
                    .transform(&center)
                    .ok_or_else(|| DecodeError::geometry("module centre maps to infinity"))?;
                let (px, py) = Self::nudge(image, geometry::round(p.x - 0.5), geometry::round(p.y - 0.5))?;

                let mut black = 0;
                let mut total = 0;
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        let sx = px + dx;
                        let sy = py + dy;
                        if sx >= 0
                            && sy >= 0
                            && (sx as usize) < image.width()
                            && (sy as usize) < image.height()
                        {
                            total += 1;
                            if image.pixel(sx, sy) {
                                black += 1;
                            }
                        }
                    }
                }
                result.set(x, y, black * 2 > total)?;
            }
        }

        Ok(result)
    }

    /// Pull points one pixel outside the image back onto its edge; anything
    /// further out is a geometry error.
    fn nudge(image: &BitMatrix, x: i32, y: i32) -> Result<(i32, i32)> {
        let w = image.width() as i32;
        let h = image.height() as i32;
        if x < -1 || y < -1 || x > w || y > h {
            return Err(DecodeError::geometry(format!(
                "sample point ({}, {}) outside {}x{} image",
                x, y, w, h
            )));
        }
        Ok((x.clamp(0, w - 1), y.clamp(0, h - 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;

    #[test]
    fn test_sample_scaled_checkerboard() {
        // 4x4 module checkerboard drawn at 5 px per module with a 3 px margin.
        let mut image = BitMatrix::new(26, 26);
        for my in 0..4 {
            for mx in 0..4 {
                if (mx + my) % 2 == 0 {
                    image.fill_rect(3 + mx * 5, 3 + my * 5, 5, 5, true);
                }
            }
        }
        let corners = Corners::rectangle(3.0, 3.0, 23.0, 23.0);
        let grid = GridSampler::sample(&image, &corners, 4, 4).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(grid.get(x, y).unwrap(), (x + y) % 2 == 0, "module ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_corners_far_outside_image() {
        let image = BitMatrix::new(10, 10);
        let corners = Corners::rectangle(0.0, 0.0, 40.0, 40.0);
        let err = GridSampler::sample(&image, &corners, 4, 4).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Geometry);
    }

    #[test]
    fn test_degenerate_corners() {
        let image = BitMatrix::new(10, 10);
        let p = ResultPoint::new(5.0, 5.0);
        let corners = Corners::new(p, p, p, p);
        let err = GridSampler::sample(&image, &corners, 4, 4).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Geometry);
    }
}
