use crate::error::{DecodeError, Result};

/// Compact bit matrix of dark (`true`) and light (`false`) modules.
///
/// Addressed by `(x, y)` = (column, row) with `(0, 0)` at the top-left.
/// Dimensions are fixed at construction; checked accessors report
/// out-of-range coordinates as [`DecodeError::Geometry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    /// Create a new all-light bit matrix with given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_needed = (width * height).div_ceil(8);
        Self {
            width,
            height,
            data: vec![0; bytes_needed],
        }
    }

    /// Build a matrix from rows of booleans. All rows must share one length.
    pub fn from_rows(rows: &[Vec<bool>]) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut matrix = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(DecodeError::geometry(format!(
                    "row {} has {} modules, expected {}",
                    y,
                    row.len(),
                    width
                )));
            }
            for (x, &dark) in row.iter().enumerate() {
                matrix.set_unchecked(x, y, dark);
            }
        }
        Ok(matrix)
    }

    /// Get matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get bit at (x, y)
    pub fn get(&self, x: usize, y: usize) -> Result<bool> {
        self.check(x, y)?;
        Ok(self.get_unchecked(x, y))
    }

    /// Set bit at (x, y)
    pub fn set(&mut self, x: usize, y: usize, value: bool) -> Result<()> {
        self.check(x, y)?;
        self.set_unchecked(x, y, value);
        Ok(())
    }

    /// Toggle bit at (x, y)
    pub fn toggle(&mut self, x: usize, y: usize) -> Result<()> {
        self.check(x, y)?;
        let index = y * self.width + x;
        self.data[index / 8] ^= 1 << (index % 8);
        Ok(())
    }

    /// Read a pixel with signed coordinates; anything outside the matrix is light.
    ///
    /// Scanners use this when a walk steps past the image edge into the
    /// (implicit) quiet zone.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        self.get_unchecked(x as usize, y as usize)
    }

    /// Fill an axis-aligned rectangle, clipped to the matrix.
    pub fn fill_rect(&mut self, x: usize, y: usize, width: usize, height: usize, value: bool) {
        let x_end = (x + width).min(self.width);
        let y_end = (y + height).min(self.height);
        for yy in y..y_end {
            for xx in x..x_end {
                self.set_unchecked(xx, yy, value);
            }
        }
    }

    /// Count dark modules
    pub fn count_dark(&self) -> usize {
        self.data.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Clear all bits to 0
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Get raw data as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn check(&self, x: usize, y: usize) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(DecodeError::geometry(format!(
                "module ({}, {}) outside {}x{} matrix",
                x, y, self.width, self.height
            )));
        }
        Ok(())
    }

    #[inline]
    fn get_unchecked(&self, x: usize, y: usize) -> bool {
        let index = y * self.width + x;
        (self.data[index / 8] >> (index % 8)) & 1 == 1
    }

    #[inline]
    fn set_unchecked(&mut self, x: usize, y: usize, value: bool) {
        let index = y * self.width + x;
        let byte_index = index / 8;
        let bit_index = index % 8;
        if value {
            self.data[byte_index] |= 1 << bit_index;
        } else {
            self.data[byte_index] &= !(1 << bit_index);
        }
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl std::fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get_unchecked(x, y) { "X " } else { "  " })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;

    #[test]
    fn test_bit_matrix() {
        let mut matrix = BitMatrix::new(8, 8);
        assert_eq!(matrix.width(), 8);
        assert_eq!(matrix.height(), 8);

        matrix.set(3, 4, true).unwrap();
        assert!(matrix.get(3, 4).unwrap());
        assert!(!matrix.get(3, 3).unwrap());

        matrix.toggle(3, 4).unwrap();
        assert!(!matrix.get(3, 4).unwrap());

        matrix.set(1, 1, true).unwrap();
        matrix.clear();
        assert_eq!(matrix.count_dark(), 0);
    }

    #[test]
    fn test_out_of_bounds_is_geometry_error() {
        let mut matrix = BitMatrix::new(8, 8);
        let err = matrix.set(10, 10, true).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Geometry);
        assert_eq!(matrix.get(8, 0).unwrap_err().kind(), DecodeErrorKind::Geometry);
        assert!(!matrix.pixel(-1, 3));
        assert!(!matrix.pixel(3, 100));
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let rows = vec![vec![true, false], vec![true]];
        assert!(BitMatrix::from_rows(&rows).is_err());

        let rows = vec![vec![true, false, true], vec![false, true, false]];
        let m = BitMatrix::from_rows(&rows).unwrap();
        assert_eq!((m.width(), m.height()), (3, 2));
        assert!(m.get(2, 0).unwrap());
        assert!(m.get(1, 1).unwrap());
        assert_eq!(m.count_dark(), 3);
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut m = BitMatrix::new(4, 4);
        m.fill_rect(2, 2, 10, 10, true);
        assert_eq!(m.count_dark(), 4);
        assert!(m.pixel(3, 3));
        assert!(!m.pixel(1, 3));
    }
}
