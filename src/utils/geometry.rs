/// Geometry utilities: rounding, distances and perspective transformations
use crate::models::ResultPoint;

/// Round to the nearest integer, ties away from zero.
///
/// `round(2.5) == 3`, `round(-2.5) == -3`. Module centres are placed with
/// this rule, so it must not be replaced with banker's rounding. Values
/// outside the `i32` range saturate; NaN maps to 0.
#[inline]
pub fn round(x: f32) -> i32 {
    x.round() as i32
}

/// Euclidean distance between two float points
#[inline]
pub fn distance(a_x: f32, a_y: f32, b_x: f32, b_y: f32) -> f32 {
    let dx = a_x - b_x;
    let dy = a_y - b_y;
    (dx * dx + dy * dy).sqrt()
}

/// Euclidean distance between two integer points
#[inline]
pub fn distance_int(a_x: i32, a_y: i32, b_x: i32, b_y: i32) -> f32 {
    let dx = (a_x as i64 - b_x as i64) as f64;
    let dy = (a_y as i64 - b_y as i64) as f64;
    (dx * dx + dy * dy).sqrt() as f32
}

/// Perspective transformation matrix (3x3), row-major with `a33 = 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    a11: f64,
    a12: f64,
    a13: f64,
    a21: f64,
    a22: f64,
    a23: f64,
    a31: f64,
    a32: f64,
    a33: f64,
}

impl PerspectiveTransform {
    /// Transform mapping the four `src` points onto the four `dst` points.
    ///
    /// Returns `None` when the points are degenerate (three collinear, or
    /// repeated), which makes the linear system singular.
    pub fn quadrilateral_to_quadrilateral(
        src: &[ResultPoint; 4],
        dst: &[ResultPoint; 4],
    ) -> Option<Self> {
        // Direct linear transform: two equations per correspondence.
        let mut a = [[0.0f64; 8]; 8];
        let mut b = [0.0f64; 8];

        for i in 0..4 {
            let (sx, sy) = (src[i].x as f64, src[i].y as f64);
            let (dx, dy) = (dst[i].x as f64, dst[i].y as f64);

            let row = i * 2;
            a[row] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy];
            b[row] = dx;
            a[row + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -dy * sx, -dy * sy];
            b[row + 1] = dy;
        }

        solve_linear_system(&a, &b).map(|s| Self {
            a11: s[0],
            a12: s[1],
            a13: s[2],
            a21: s[3],
            a22: s[4],
            a23: s[5],
            a31: s[6],
            a32: s[7],
            a33: 1.0,
        })
    }

    /// Transform a point. Points on the horizon line map to `None`.
    pub fn transform(&self, p: &ResultPoint) -> Option<ResultPoint> {
        let x = p.x as f64;
        let y = p.y as f64;

        let denominator = self.a31 * x + self.a32 * y + self.a33;
        if denominator.abs() < 1e-12 {
            return None;
        }

        let x_new = (self.a11 * x + self.a12 * y + self.a13) / denominator;
        let y_new = (self.a21 * x + self.a22 * y + self.a23) / denominator;

        Some(ResultPoint::new(x_new as f32, y_new as f32))
    }
}

/// Solve 8x8 linear system using Gaussian elimination with partial pivoting
#[allow(clippy::needless_range_loop)]
fn solve_linear_system(a: &[[f64; 8]; 8], b: &[f64; 8]) -> Option<[f64; 8]> {
    let mut a = *a;
    let mut b = *b;
    let n = 8;

    for i in 0..n {
        let mut max_val = a[i][i].abs();
        let mut max_row = i;
        for k in (i + 1)..n {
            if a[k][i].abs() > max_val {
                max_val = a[k][i].abs();
                max_row = k;
            }
        }

        if max_val < 1e-10 {
            return None;
        }

        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            b[k] -= factor * b[i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_ties_away_from_zero() {
        assert_eq!(round(2.5), 3);
        assert_eq!(round(-2.5), -3);
        assert_eq!(round(0.5), 1);
        assert_eq!(round(-0.5), -1);
        assert_eq!(round(2.4999), 2);
        assert_eq!(round(-7.6), -8);
        assert_eq!(round(f32::NAN), 0);
    }

    #[test]
    fn test_distance() {
        assert_eq!(distance(0.0, 0.0, 3.0, 4.0), 5.0);
        assert_eq!(distance_int(0, 0, 3, 4), 5.0);
        assert_eq!(distance(2.0, 2.0, 2.0, 2.0), 0.0);
    }

    #[test]
    fn test_perspective_transform_scales() {
        let src = [
            ResultPoint::new(0.0, 0.0),
            ResultPoint::new(100.0, 0.0),
            ResultPoint::new(100.0, 100.0),
            ResultPoint::new(0.0, 100.0),
        ];
        let dst = [
            ResultPoint::new(0.0, 0.0),
            ResultPoint::new(50.0, 0.0),
            ResultPoint::new(50.0, 50.0),
            ResultPoint::new(0.0, 50.0),
        ];

        let t = PerspectiveTransform::quadrilateral_to_quadrilateral(&src, &dst).unwrap();
        let p = t.transform(&ResultPoint::new(50.0, 50.0)).unwrap();
        assert!((p.x - 25.0).abs() < 1e-3);
        assert!((p.y - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_perspective_transform_hits_corners() {
        let src = [
            ResultPoint::new(0.0, 0.0),
            ResultPoint::new(10.0, 0.0),
            ResultPoint::new(10.0, 10.0),
            ResultPoint::new(0.0, 10.0),
        ];
        let dst = [
            ResultPoint::new(12.0, 7.0),
            ResultPoint::new(95.0, 15.0),
            ResultPoint::new(101.0, 88.0),
            ResultPoint::new(4.0, 92.0),
        ];
        let t = PerspectiveTransform::quadrilateral_to_quadrilateral(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let p = t.transform(s).unwrap();
            assert!(p.distance(d) < 1e-2, "{:?} -> {:?}, want {:?}", s, p, d);
        }
    }

    #[test]
    fn test_degenerate_quad_has_no_transform() {
        let p = ResultPoint::new(5.0, 5.0);
        let src = [p, p, p, p];
        let dst = [
            ResultPoint::new(0.0, 0.0),
            ResultPoint::new(1.0, 0.0),
            ResultPoint::new(1.0, 1.0),
            ResultPoint::new(0.0, 1.0),
        ];
        assert!(PerspectiveTransform::quadrilateral_to_quadrilateral(&src, &dst).is_none());
    }

    proptest! {
        #[test]
        fn prop_round_within_half(x in -1.0e6f32..1.0e6f32) {
            let r = round(x) as f64;
            prop_assert!((r - x as f64).abs() <= 0.5);
        }

        #[test]
        fn prop_distance_overloads_agree(
            ax in -5000i32..5000, ay in -5000i32..5000,
            bx in -5000i32..5000, by in -5000i32..5000,
        ) {
            let f = distance(ax as f32, ay as f32, bx as f32, by as f32);
            let i = distance_int(ax, ay, bx, by);
            prop_assert!((f - i).abs() <= 1e-3 * i.max(1.0));
        }
    }
}
