//! Module placement tables for the fixed-grid codeword layout.
//!
//! Each codeword occupies eight modules of the reassembled data region. Most
//! codewords use the "utah" shape anchored at a diagonal sweep position; four
//! irregular corner shapes are used once each, at fixed sweep positions,
//! depending on the region size. The shapes are tables, not formulas.

use crate::error::{DecodeError, Result};
use crate::models::BitMatrix;

/// Module offsets of the utah shape relative to its anchor, most significant
/// bit first. Offsets may leave the region and are wrapped by [`wrap`].
pub(crate) const UTAH: [(i32, i32); 8] = [
    (-2, -2),
    (-2, -1),
    (-1, -2),
    (-1, -1),
    (-1, 0),
    (0, -2),
    (0, -1),
    (0, 0),
];

/// The four corner shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// Row sweep hits `row == rows` at column 0
    One,
    /// `row == rows - 2`, column 0, `columns % 4 != 0`
    Two,
    /// `row == rows + 4`, column 2, `columns % 8 == 0`
    Three,
    /// `row == rows - 2`, column 0, `columns % 8 == 4`
    Four,
}

// Corner tables: (row, column), MSB first. Non-negative values count from the
// top/left edge, negative values from the bottom/right edge (-1 = last).
const CORNER_ONE: [(i32, i32); 8] = [
    (-1, 0),
    (-1, 1),
    (-1, 2),
    (0, -2),
    (0, -1),
    (1, -1),
    (2, -1),
    (3, -1),
];

const CORNER_TWO: [(i32, i32); 8] = [
    (-3, 0),
    (-2, 0),
    (-1, 0),
    (0, -4),
    (0, -3),
    (0, -2),
    (0, -1),
    (1, -1),
];

const CORNER_THREE: [(i32, i32); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -3),
    (0, -2),
    (0, -1),
    (1, -3),
    (1, -2),
    (1, -1),
];

const CORNER_FOUR: [(i32, i32); 8] = [
    (-3, 0),
    (-2, 0),
    (-1, 0),
    (0, -2),
    (0, -1),
    (1, -1),
    (2, -1),
    (3, -1),
];

impl Corner {
    pub(crate) fn table(self) -> &'static [(i32, i32); 8] {
        match self {
            Corner::One => &CORNER_ONE,
            Corner::Two => &CORNER_TWO,
            Corner::Three => &CORNER_THREE,
            Corner::Four => &CORNER_FOUR,
        }
    }

    /// Absolute `(row, column)` module positions for a region size
    pub fn positions(self, num_rows: usize, num_columns: usize) -> Result<[(usize, usize); 8]> {
        let (rows, columns) = (num_rows as i32, num_columns as i32);
        let mut positions = [(0, 0); 8];
        for (slot, &(r, c)) in positions.iter_mut().zip(self.table()) {
            let r = if r < 0 { rows + r } else { r };
            let c = if c < 0 { columns + c } else { c };
            *slot = wrap(r, c, num_rows, num_columns)?;
        }
        Ok(positions)
    }
}

/// Wrap a logical position that left the region back inside it.
///
/// Leaving through the top re-enters at the bottom shifted right by
/// `4 - ((rows + 4) % 8)` columns; leaving through the left re-enters at the
/// right shifted down by `4 - ((columns + 4) % 8)` rows. An empty region is a
/// geometry error.
pub fn wrap(row: i32, column: i32, num_rows: usize, num_columns: usize) -> Result<(usize, usize)> {
    if num_rows == 0 || num_columns == 0 {
        return Err(DecodeError::geometry(format!(
            "no module to wrap into in a {}x{} region",
            num_rows, num_columns
        )));
    }
    let rows = num_rows as i32;
    let columns = num_columns as i32;
    let (mut row, mut column) = (row, column);
    if row < 0 {
        row += rows;
        column += 4 - ((rows + 4) & 0x07);
    }
    if column < 0 {
        column += columns;
        row += 4 - ((columns + 4) & 0x07);
    }
    if row >= rows {
        row -= rows;
    }
    Ok((row.rem_euclid(rows) as usize, column.rem_euclid(columns) as usize))
}

/// Utah shape positions for an anchor
pub fn utah_positions(
    row: i32,
    column: i32,
    num_rows: usize,
    num_columns: usize,
) -> Result<[(usize, usize); 8]> {
    let mut positions = [(0, 0); 8];
    for (slot, &(dr, dc)) in positions.iter_mut().zip(&UTAH) {
        *slot = wrap(row + dr, column + dc, num_rows, num_columns)?;
    }
    Ok(positions)
}

/// One codeword's shape in traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Irregular corner shape
    Corner(Corner),
    /// Utah shape anchored at `(row, column)`
    Utah {
        /// Anchor row
        row: i32,
        /// Anchor column
        column: i32,
    },
}

impl Placement {
    /// Absolute module positions of this placement, MSB first
    pub fn positions(self, num_rows: usize, num_columns: usize) -> Result<[(usize, usize); 8]> {
        match self {
            Placement::Corner(corner) => corner.positions(num_rows, num_columns),
            Placement::Utah { row, column } => utah_positions(row, column, num_rows, num_columns),
        }
    }
}

/// Codeword placements of a `num_rows x num_columns` data region in reading order.
///
/// The walk starts at (4, 0) and zig-zags diagonally: up-right, then
/// down-left, visiting corner shapes at their trigger positions. A utah
/// anchor already covered by an earlier codeword is skipped. An empty region
/// has no placements.
pub fn placements(num_rows: usize, num_columns: usize) -> Result<Vec<Placement>> {
    let mut out = Vec::with_capacity(num_rows * num_columns / 8);
    if num_rows == 0 || num_columns == 0 {
        return Ok(out);
    }
    let rows = num_rows as i32;
    let columns = num_columns as i32;
    let mut consumed = BitMatrix::new(num_columns, num_rows);

    let take = |placement: Placement, out: &mut Vec<Placement>, consumed: &mut BitMatrix| -> Result<()> {
        for (r, c) in placement.positions(num_rows, num_columns)? {
            consumed.set(c, r, true)?;
        }
        out.push(placement);
        Ok(())
    };
    let is_free = |row: i32, column: i32, consumed: &BitMatrix| {
        row >= 0 && row < rows && column >= 0 && column < columns && !consumed.pixel(column, row)
    };

    let mut row = 4i32;
    let mut column = 0i32;
    let mut corners_read = [false; 4];

    loop {
        if row == rows && column == 0 && !corners_read[0] {
            take(Placement::Corner(Corner::One), &mut out, &mut consumed)?;
            corners_read[0] = true;
            row -= 2;
            column += 2;
        } else if row == rows - 2 && column == 0 && (columns & 0x03) != 0 && !corners_read[1] {
            take(Placement::Corner(Corner::Two), &mut out, &mut consumed)?;
            corners_read[1] = true;
            row -= 2;
            column += 2;
        } else if row == rows + 4 && column == 2 && (columns & 0x07) == 0 && !corners_read[2] {
            take(Placement::Corner(Corner::Three), &mut out, &mut consumed)?;
            corners_read[2] = true;
            row -= 2;
            column += 2;
        } else if row == rows - 2 && column == 0 && (columns & 0x07) == 4 && !corners_read[3] {
            take(Placement::Corner(Corner::Four), &mut out, &mut consumed)?;
            corners_read[3] = true;
            row -= 2;
            column += 2;
        } else {
            // Sweep upward diagonally to the right
            loop {
                if is_free(row, column, &consumed) {
                    take(Placement::Utah { row, column }, &mut out, &mut consumed)?;
                }
                row -= 2;
                column += 2;
                if !(row >= 0 && column < columns) {
                    break;
                }
            }
            row += 1;
            column += 3;

            // Sweep downward diagonally to the left
            loop {
                if is_free(row, column, &consumed) {
                    take(Placement::Utah { row, column }, &mut out, &mut consumed)?;
                }
                row += 2;
                column -= 2;
                if !(row < rows && column >= 0) {
                    break;
                }
            }
            row += 3;
            column += 1;
        }

        if !(row < rows || column < columns) {
            break;
        }
    }

    Ok(out)
}

/// Filler for the bottom-right 2x2 block when the codewords leave it empty:
/// `(row, column, dark)` for each of the four modules.
pub fn unused_corner_fill(num_rows: usize, num_columns: usize) -> [(usize, usize, bool); 4] {
    [
        (num_rows - 1, num_columns - 1, true),
        (num_rows - 2, num_columns - 2, true),
        (num_rows - 1, num_columns - 2, false),
        (num_rows - 2, num_columns - 1, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::models::SymbolVersion;

    fn coverage(num_rows: usize, num_columns: usize) -> (usize, Vec<u8>) {
        let mut hits = vec![0u8; num_rows * num_columns];
        let list = placements(num_rows, num_columns).unwrap();
        for p in &list {
            for (r, c) in p.positions(num_rows, num_columns).unwrap() {
                hits[r * num_columns + c] += 1;
            }
        }
        (list.len(), hits)
    }

    #[test]
    fn test_eight_by_eight_order() {
        let list = placements(8, 8).unwrap();
        let anchors: Vec<(i32, i32)> = list
            .iter()
            .map(|p| match p {
                Placement::Utah { row, column } => (*row, *column),
                Placement::Corner(c) => panic!("unexpected corner {:?}", c),
            })
            .collect();
        assert_eq!(
            anchors,
            vec![(4, 0), (2, 2), (0, 4), (1, 7), (3, 5), (5, 3), (7, 1), (6, 6)]
        );
    }

    #[test]
    fn test_every_version_places_each_module_at_most_once() {
        for v in SymbolVersion::all() {
            let (rows, cols) = (v.mapping_rows(), v.mapping_columns());
            let (count, hits) = coverage(rows, cols);
            assert_eq!(count, v.total_codewords(), "version {}", v.number);
            assert!(hits.iter().all(|&h| h <= 1), "version {} overlaps", v.number);
            let uncovered = hits.iter().filter(|&&h| h == 0).count();
            if uncovered > 0 {
                assert_eq!(uncovered, 4, "version {}", v.number);
                for (r, c, _) in unused_corner_fill(rows, cols) {
                    assert_eq!(hits[r * cols + c], 0, "version {}", v.number);
                }
            }
        }
    }

    #[test]
    fn test_wrap_rules() {
        // Leaving the top of an 8x8 region shifts right by 4 - (12 & 7) = 0.
        assert_eq!(wrap(-2, 3, 8, 8).unwrap(), (6, 3));
        // 10x10: leaving the top shifts right by 4 - (14 & 7) = -2.
        assert_eq!(wrap(-1, 6, 10, 10).unwrap(), (9, 4));
        // Leaving the left of a 10-column region shifts down by -2.
        assert_eq!(wrap(5, -1, 10, 10).unwrap(), (3, 9));
        assert_eq!(wrap(10, 0, 10, 10).unwrap(), (0, 0));
    }

    #[test]
    fn test_empty_region_is_geometry_error() {
        assert_eq!(wrap(0, 0, 0, 8).unwrap_err().kind(), DecodeErrorKind::Geometry);
        assert_eq!(wrap(0, 0, 8, 0).unwrap_err().kind(), DecodeErrorKind::Geometry);
        assert!(utah_positions(4, 0, 0, 0).is_err());
        assert!(Corner::Two.positions(8, 0).is_err());
        assert!(placements(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_corner_positions_are_absolute() {
        let p = Corner::One.positions(12, 12).unwrap();
        assert_eq!(p[0], (11, 0));
        assert_eq!(p[3], (0, 10));
        assert_eq!(p[7], (3, 11));
        let p = Corner::Three.positions(16, 16).unwrap();
        assert_eq!(p[1], (15, 15));
        assert_eq!(p[2], (0, 13));
    }
}
