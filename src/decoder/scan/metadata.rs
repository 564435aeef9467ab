//! Row indicator metadata: what the indicator codewords announce about the
//! symbol, and the per-side voting that reconciles them.

use crate::error::{DecodeError, Result};
use crate::models::{Codeword, VoteCell};
use tracing::debug;

/// Largest number of logical rows
pub const MAX_ROWS: usize = 90;
/// Largest number of data columns
pub const MAX_COLUMNS: usize = 30;
/// Highest error-correction level
pub const MAX_EC_LEVEL: u8 = 8;

/// Symbol structure announced by the row indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolMetadata {
    /// Logical rows
    pub rows: usize,
    /// Data columns per row (indicators excluded)
    pub columns: usize,
    /// Error-correction level
    pub ec_level: u8,
}

impl SymbolMetadata {
    /// Validated metadata
    pub fn new(rows: usize, columns: usize, ec_level: u8) -> Result<Self> {
        if !(3..=MAX_ROWS).contains(&rows) {
            return Err(DecodeError::geometry(format!("{} rows outside 3..={}", rows, MAX_ROWS)));
        }
        if !(1..=MAX_COLUMNS).contains(&columns) {
            return Err(DecodeError::geometry(format!(
                "{} columns outside 1..={}",
                columns, MAX_COLUMNS
            )));
        }
        if ec_level > MAX_EC_LEVEL {
            return Err(DecodeError::geometry(format!("EC level {} above {}", ec_level, MAX_EC_LEVEL)));
        }
        Ok(Self {
            rows,
            columns,
            ec_level,
        })
    }

    fn row_count_upper(&self) -> u16 {
        ((self.rows - 1) / 3) as u16
    }

    fn row_count_lower_ec(&self) -> u16 {
        3 * self.ec_level as u16 + ((self.rows - 1) % 3) as u16
    }

    fn group_base(row: usize) -> u16 {
        30 * (row / 3) as u16
    }

    /// Value of the left row indicator of `row`
    pub fn left_indicator(&self, row: usize) -> u16 {
        Self::group_base(row)
            + match row % 3 {
                0 => self.row_count_upper(),
                1 => self.row_count_lower_ec(),
                _ => self.columns as u16 - 1,
            }
    }

    /// Value of the right row indicator of `row`
    pub fn right_indicator(&self, row: usize) -> u16 {
        self.right_indicator_with_columns(row, self.columns)
    }

    /// Right indicator announcing `columns` instead of the true count
    pub fn right_indicator_with_columns(&self, row: usize, columns: usize) -> u16 {
        Self::group_base(row)
            + match row % 3 {
                0 => columns as u16 - 1,
                1 => self.row_count_upper(),
                _ => self.row_count_lower_ec(),
            }
    }

    /// Error-correction codewords carried by the symbol
    pub fn ec_codewords(&self) -> usize {
        1 << (self.ec_level as usize + 1)
    }

    /// Value the length descriptor in cell (0, 0) must hold, if any
    pub fn length_descriptor(&self) -> Option<u16> {
        let total = self.rows * self.columns;
        total
            .checked_sub(self.ec_codewords())
            .filter(|&n| (1..929).contains(&n))
            .map(|n| n as u16)
    }
}

/// Which edge of the symbol an indicator was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Between start pattern and first data column
    Left,
    /// Between last data column and stop pattern
    Right,
}

#[derive(Debug, Default)]
struct SideVotes {
    columns: VoteCell<usize>,
    row_count_upper: VoteCell<usize>,
    row_count_lower_ec: VoteCell<usize>,
}

/// Indicator votes from both sides of the symbol
#[derive(Debug, Default)]
pub struct MetadataVotes {
    left: SideVotes,
    right: SideVotes,
}

impl MetadataVotes {
    /// Empty tally
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one indicator codeword read on `side`
    pub fn record(&mut self, side: Side, indicator: &Codeword) {
        let x = indicator.value as usize % 30;
        let row = indicator.indicator_row();
        let votes = match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        };
        let (slot, value) = match (side, row % 3) {
            (Side::Left, 0) | (Side::Right, 1) => (&mut votes.row_count_upper, x),
            (Side::Left, 1) | (Side::Right, 2) => (&mut votes.row_count_lower_ec, x),
            _ => (&mut votes.columns, x + 1),
        };
        slot.vote(value, indicator.penalty);
    }

    /// Whether any indicator was counted
    pub fn is_empty(&self) -> bool {
        [&self.left, &self.right].iter().all(|v| {
            v.columns.is_empty() && v.row_count_upper.is_empty() && v.row_count_lower_ec.is_empty()
        })
    }

    /// Reconcile both sides into one metadata record.
    ///
    /// Column counts may differ by `column_tolerance`; the side with more
    /// votes wins. Row count and EC level must agree exactly. Missing fields
    /// are detection errors; disagreement is a checksum error.
    pub fn resolve(&self, column_tolerance: usize) -> Result<SymbolMetadata> {
        let columns = match (self.left.columns.winner(), self.right.columns.winner()) {
            (Some((l, l_votes, _)), Some((r, r_votes, _))) => {
                if l.abs_diff(r) > column_tolerance {
                    debug!(left = l, right = r, "indicator column counts disagree");
                    return Err(DecodeError::checksum(format!(
                        "left indicators announce {} columns, right indicators {}",
                        l, r
                    )));
                }
                if r_votes > l_votes { r } else { l }
            }
            (Some((c, _, _)), None) | (None, Some((c, _, _))) => c,
            (None, None) => return Err(DecodeError::detection("no column count indicator read")),
        };

        let upper = agree(
            "row count",
            self.left.row_count_upper.value(),
            self.right.row_count_upper.value(),
        )?;
        let lower_ec = agree(
            "row count / EC level",
            self.left.row_count_lower_ec.value(),
            self.right.row_count_lower_ec.value(),
        )?;

        let rows = 3 * upper + lower_ec % 3 + 1;
        let ec_level = (lower_ec / 3) as u8;
        SymbolMetadata::new(rows, columns, ec_level)
            .map_err(|e| DecodeError::checksum(format!("indicators announce invalid symbol: {}", e)))
    }
}

fn agree(field: &str, left: Option<usize>, right: Option<usize>) -> Result<usize> {
    match (left, right) {
        (Some(l), Some(r)) if l != r => {
            debug!(field, left = l, right = r, "indicator fields disagree");
            Err(DecodeError::checksum(format!(
                "{} indicators disagree: left {}, right {}",
                field, l, r
            )))
        }
        (Some(v), _) | (None, Some(v)) => Ok(v),
        (None, None) => Err(DecodeError::detection(format!("no {} indicator read", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::scan::patterns::bucket_for_row;
    use crate::error::DecodeErrorKind;

    fn indicator(value: u16, row: usize) -> Codeword {
        Codeword {
            value,
            row,
            start_x: 0,
            end_x: 34,
            bucket: bucket_for_row(row),
            penalty: 0,
        }
    }

    fn votes_for(meta: &SymbolMetadata, rows: std::ops::Range<usize>) -> MetadataVotes {
        let mut votes = MetadataVotes::new();
        for row in rows {
            votes.record(Side::Left, &indicator(meta.left_indicator(row), row));
            votes.record(Side::Right, &indicator(meta.right_indicator(row), row));
        }
        votes
    }

    #[test]
    fn test_indicator_values_announce_their_row() {
        let meta = SymbolMetadata::new(14, 5, 2).unwrap();
        for row in 0..14 {
            assert_eq!(indicator(meta.left_indicator(row), row).indicator_row(), row);
            assert_eq!(indicator(meta.right_indicator(row), row).indicator_row(), row);
        }
        assert_eq!(meta.left_indicator(0), 4);
        assert_eq!(meta.left_indicator(1), 3 * 2 + 1);
        assert_eq!(meta.left_indicator(5), 30 + 4);
        assert_eq!(meta.right_indicator(3), 30 + 4);
    }

    #[test]
    fn test_resolve_round_trips_metadata() {
        let meta = SymbolMetadata::new(14, 5, 2).unwrap();
        assert_eq!(votes_for(&meta, 0..14).resolve(0).unwrap(), meta);
        // Three consecutive rows carry every field on each side.
        assert_eq!(votes_for(&meta, 6..9).resolve(0).unwrap(), meta);
    }

    #[test]
    fn test_column_disagreement_is_checksum_error() {
        let meta = SymbolMetadata::new(9, 4, 1).unwrap();
        let mut votes = MetadataVotes::new();
        for row in 0..9 {
            votes.record(Side::Left, &indicator(meta.left_indicator(row), row));
            votes.record(
                Side::Right,
                &indicator(meta.right_indicator_with_columns(row, 6), row),
            );
        }
        assert_eq!(votes.resolve(0).unwrap_err().kind(), DecodeErrorKind::Checksum);
        assert_eq!(votes.resolve(1).unwrap_err().kind(), DecodeErrorKind::Checksum);
        assert_eq!(votes.resolve(2).unwrap().columns, 4);
    }

    #[test]
    fn test_missing_fields_are_detection_errors() {
        let votes = MetadataVotes::new();
        assert!(votes.is_empty());
        assert_eq!(votes.resolve(0).unwrap_err().kind(), DecodeErrorKind::Detection);

        let meta = SymbolMetadata::new(6, 3, 0).unwrap();
        // Only rows 0 and 3 on the left: no column count there, none on the right.
        let mut votes = MetadataVotes::new();
        votes.record(Side::Left, &indicator(meta.left_indicator(0), 0));
        votes.record(Side::Left, &indicator(meta.left_indicator(3), 3));
        assert_eq!(votes.resolve(0).unwrap_err().kind(), DecodeErrorKind::Detection);
    }

    #[test]
    fn test_length_descriptor() {
        let meta = SymbolMetadata::new(10, 4, 1).unwrap();
        assert_eq!(meta.ec_codewords(), 4);
        assert_eq!(meta.length_descriptor(), Some(36));
        let tiny = SymbolMetadata::new(3, 1, 2).unwrap();
        assert_eq!(tiny.length_descriptor(), None);
        assert!(SymbolMetadata::new(2, 4, 0).is_err());
        assert!(SymbolMetadata::new(10, 31, 0).is_err());
    }
}
