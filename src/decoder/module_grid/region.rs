//! Data region extraction: strip finder/clock borders and stitch the
//! sub-regions of a multi-region symbol into one logical matrix.

use crate::error::{DecodeError, Result};
use crate::models::{BitMatrix, SymbolVersion};
use tracing::{debug, trace};

/// Logical matrix that must have every cell written exactly once before use.
pub(crate) struct WorkingMatrix {
    bits: BitMatrix,
    written: BitMatrix,
    remaining: usize,
}

impl WorkingMatrix {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            bits: BitMatrix::new(width, height),
            written: BitMatrix::new(width, height),
            remaining: width * height,
        }
    }

    pub(crate) fn write(&mut self, x: usize, y: usize, value: bool) -> Result<()> {
        if self.written.get(x, y)? {
            return Err(DecodeError::format(format!(
                "data region module ({}, {}) written twice",
                x, y
            )));
        }
        self.written.set(x, y, true)?;
        self.bits.set(x, y, value)?;
        self.remaining -= 1;
        Ok(())
    }

    /// Hand out the populated matrix; fails while any cell is unwritten.
    pub(crate) fn finish(self) -> Result<BitMatrix> {
        if self.remaining != 0 {
            return Err(DecodeError::format(format!(
                "data region read with {} of {} modules unpopulated",
                self.remaining,
                self.bits.width() * self.bits.height()
            )));
        }
        Ok(self.bits)
    }
}

/// Check that the matrix is exactly the declared symbol size
pub(crate) fn check_dimensions(matrix: &BitMatrix, version: &SymbolVersion) -> Result<()> {
    version.validate()?;
    if matrix.height() < version.symbol_rows || matrix.width() < version.symbol_columns {
        return Err(DecodeError::geometry(format!(
            "{}x{} matrix is smaller than the {}x{} symbol of version {}",
            matrix.width(),
            matrix.height(),
            version.symbol_columns,
            version.symbol_rows,
            version.number
        )));
    }
    if matrix.height() != version.symbol_rows || matrix.width() != version.symbol_columns {
        return Err(DecodeError::geometry(format!(
            "{}x{} matrix does not match the {}x{} symbol of version {}",
            matrix.width(),
            matrix.height(),
            version.symbol_columns,
            version.symbol_rows,
            version.number
        )));
    }
    Ok(())
}

/// Expected colour of a border module of one bordered region.
///
/// `(r, c)` are local to the region including its border, which measures
/// `(rows + 2) x (columns + 2)`. Left column and bottom row are solid; the
/// top row and right column alternate (clock track). Interior cells are
/// `None`.
fn expected_border(r: usize, c: usize, rows: usize, columns: usize) -> Option<bool> {
    if c == 0 || r == rows + 1 {
        Some(true)
    } else if r == 0 {
        Some(c % 2 == 0)
    } else if c == columns + 1 {
        Some(r % 2 == 1)
    } else {
        None
    }
}

/// Count border modules of one region that disagree with the markers
fn marker_mismatches(
    matrix: &BitMatrix,
    version: &SymbolVersion,
    region_row: usize,
    region_column: usize,
) -> Result<(usize, usize)> {
    let rows = version.data_region_rows;
    let columns = version.data_region_columns;
    let top = region_row * (rows + 2);
    let left = region_column * (columns + 2);
    let mut mismatches = 0;
    let mut total = 0;
    for r in 0..rows + 2 {
        for c in 0..columns + 2 {
            if let Some(expected) = expected_border(r, c, rows, columns) {
                total += 1;
                if matrix.get(left + c, top + r)? != expected {
                    mismatches += 1;
                }
            }
        }
    }
    Ok((mismatches, total))
}

/// Strip borders and reassemble all data regions into one logical matrix.
///
/// Fails with a format error when any region's finder/clock border differs
/// from the expected pattern in more than `marker_tolerance` of its modules.
pub fn extract_data_region(
    matrix: &BitMatrix,
    version: &SymbolVersion,
    marker_tolerance: f32,
) -> Result<BitMatrix> {
    check_dimensions(matrix, version)?;

    let (regions_down, regions_across) = version.data_regions();
    let rows = version.data_region_rows;
    let columns = version.data_region_columns;

    for region_row in 0..regions_down {
        for region_column in 0..regions_across {
            let (mismatches, total) = marker_mismatches(matrix, version, region_row, region_column)?;
            trace!(region_row, region_column, mismatches, total, "region border checked");
            if mismatches as f32 > marker_tolerance * total as f32 {
                debug!(
                    region_row,
                    region_column, mismatches, total, "region border does not match markers"
                );
                return Err(DecodeError::format(format!(
                    "region ({}, {}) border: {} of {} modules off-pattern",
                    region_row, region_column, mismatches, total
                )));
            }
        }
    }

    let mut working = WorkingMatrix::new(version.mapping_columns(), version.mapping_rows());
    for region_row in 0..regions_down {
        let write_row_offset = region_row * rows;
        let read_row_offset = region_row * (rows + 2) + 1;
        for region_column in 0..regions_across {
            let write_column_offset = region_column * columns;
            let read_column_offset = region_column * (columns + 2) + 1;
            for i in 0..rows {
                for j in 0..columns {
                    let dark = matrix.get(read_column_offset + j, read_row_offset + i)?;
                    working.write(write_column_offset + j, write_row_offset + i, dark)?;
                }
            }
        }
    }
    working.finish()
}

/// Paint the finder/clock borders of every region of a symbol-sized matrix.
pub(crate) fn draw_borders(matrix: &mut BitMatrix, version: &SymbolVersion) -> Result<()> {
    let (regions_down, regions_across) = version.data_regions();
    let rows = version.data_region_rows;
    let columns = version.data_region_columns;
    for region_row in 0..regions_down {
        for region_column in 0..regions_across {
            let top = region_row * (rows + 2);
            let left = region_column * (columns + 2);
            for r in 0..rows + 2 {
                for c in 0..columns + 2 {
                    if let Some(dark) = expected_border(r, c, rows, columns) {
                        matrix.set(left + c, top + r, dark)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Write a logical data region back into the bordered symbol layout.
pub(crate) fn embed_data_region(
    matrix: &mut BitMatrix,
    mapping: &BitMatrix,
    version: &SymbolVersion,
) -> Result<()> {
    let (regions_down, regions_across) = version.data_regions();
    let rows = version.data_region_rows;
    let columns = version.data_region_columns;
    for region_row in 0..regions_down {
        for region_column in 0..regions_across {
            for i in 0..rows {
                for j in 0..columns {
                    let dark = mapping.get(region_column * columns + j, region_row * rows + i)?;
                    matrix.set(
                        region_column * (columns + 2) + 1 + j,
                        region_row * (rows + 2) + 1 + i,
                        dark,
                    )?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;

    fn bordered(version: &SymbolVersion) -> BitMatrix {
        let mut m = BitMatrix::new(version.symbol_columns, version.symbol_rows);
        draw_borders(&mut m, version).unwrap();
        m
    }

    #[test]
    fn test_border_pattern_of_single_region() {
        let v = SymbolVersion::from_number(1).unwrap();
        let m = bordered(&v);
        // Solid left column and bottom row.
        for i in 0..10 {
            assert!(m.get(0, i).unwrap());
            assert!(m.get(i, 9).unwrap());
        }
        // Clock track along the top and right.
        assert!(m.get(2, 0).unwrap());
        assert!(!m.get(9, 0).unwrap());
        assert!(m.get(9, 1).unwrap());
        assert!(!m.get(9, 2).unwrap());
    }

    #[test]
    fn test_multi_region_reassembly() {
        let v = SymbolVersion::from_number(10).unwrap(); // 32x32, 2x2 regions of 14
        let mut m = bordered(&v);
        // Mark the first data module of each region.
        m.set(1, 1, true).unwrap();
        m.set(17, 1, true).unwrap();
        m.set(1, 17, true).unwrap();
        m.set(17, 17, true).unwrap();
        let region = extract_data_region(&m, &v, 0.0).unwrap();
        assert_eq!((region.width(), region.height()), (28, 28));
        assert_eq!(region.count_dark(), 4);
        assert!(region.get(0, 0).unwrap());
        assert!(region.get(14, 0).unwrap());
        assert!(region.get(0, 14).unwrap());
        assert!(region.get(14, 14).unwrap());
    }

    #[test]
    fn test_broken_markers_are_format_errors() {
        let v = SymbolVersion::from_number(2).unwrap();
        let blank = BitMatrix::new(12, 12);
        let err = extract_data_region(&blank, &v, 0.25).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Format);

        // A few flipped border modules stay within tolerance.
        let mut m = bordered(&v);
        m.toggle(0, 3).unwrap();
        m.toggle(4, 11).unwrap();
        assert!(extract_data_region(&m, &v, 0.25).is_ok());
        assert!(extract_data_region(&m, &v, 0.0).is_err());
    }

    #[test]
    fn test_undersized_matrix_is_geometry_error() {
        let v = SymbolVersion::from_number(3).unwrap();
        let m = BitMatrix::new(12, 12);
        let err = extract_data_region(&m, &v, 0.25).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Geometry);
    }

    #[test]
    fn test_working_matrix_rejects_partial_and_double_writes() {
        let mut w = WorkingMatrix::new(2, 1);
        w.write(0, 0, true).unwrap();
        assert!(w.write(0, 0, false).is_err());
        assert_eq!(w.finish().unwrap_err().kind(), DecodeErrorKind::Format);

        let mut w = WorkingMatrix::new(1, 1);
        w.write(0, 0, true).unwrap();
        assert!(w.finish().unwrap().get(0, 0).unwrap());
    }
}
