use std::collections::HashMap;

/// One codeword read from a scan line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codeword {
    /// Codeword value (0..929)
    pub value: u16,
    /// Logical row the codeword belongs to
    pub row: usize,
    /// First pixel column of the codeword on its scan line
    pub start_x: i32,
    /// One past the last pixel column
    pub end_x: i32,
    /// Bucket (cluster) of the matched pattern: 0, 3 or 6
    pub bucket: u8,
    /// Modules that disagreed with the matched pattern
    pub penalty: u32,
}

impl Codeword {
    /// Pixel width of the read
    pub fn width(&self) -> i32 {
        self.end_x - self.start_x
    }

    /// Whether the bucket is the one used by `row`
    pub fn has_bucket_of_row(&self, row: usize) -> bool {
        self.bucket as usize == (row % 3) * 3
    }

    /// Row number announced by a row indicator codeword
    pub fn indicator_row(&self) -> usize {
        (self.value as usize / 30) * 3 + self.bucket as usize / 3
    }
}

/// Vote tally for one cell or metadata field.
///
/// Each value keeps its vote count and the lowest penalty it was seen with.
/// The winner has the most votes; ties go to the lower penalty, then to the
/// smaller value.
#[derive(Debug, Clone, Default)]
pub struct VoteCell<T: Copy + Eq + std::hash::Hash + Ord> {
    votes: HashMap<T, (u32, u32)>,
}

impl<T: Copy + Eq + std::hash::Hash + Ord> VoteCell<T> {
    /// Empty tally
    pub fn new() -> Self {
        Self {
            votes: HashMap::new(),
        }
    }

    /// Record one observation
    pub fn vote(&mut self, value: T, penalty: u32) {
        let entry = self.votes.entry(value).or_insert((0, penalty));
        entry.0 += 1;
        entry.1 = entry.1.min(penalty);
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Total observations
    pub fn total(&self) -> u32 {
        self.votes.values().map(|(count, _)| count).sum()
    }

    /// Winning value with its vote count and penalty
    pub fn winner(&self) -> Option<(T, u32, u32)> {
        self.votes
            .iter()
            .map(|(&value, &(count, penalty))| (value, count, penalty))
            .min_by(|a, b| {
                b.1.cmp(&a.1)
                    .then(a.2.cmp(&b.2))
                    .then(a.0.cmp(&b.0))
            })
    }

    /// Winning value only
    pub fn value(&self) -> Option<T> {
        self.winner().map(|(value, _, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_row() {
        let cw = Codeword {
            value: 30 * 4 + 7,
            row: 0,
            start_x: 10,
            end_x: 44,
            bucket: 6,
            penalty: 0,
        };
        assert_eq!(cw.indicator_row(), 14);
        assert_eq!(cw.width(), 34);
        assert!(cw.has_bucket_of_row(14));
        assert!(!cw.has_bucket_of_row(13));
    }

    #[test]
    fn test_vote_majority_then_penalty() {
        let mut cell = VoteCell::new();
        cell.vote(5u16, 1);
        cell.vote(9u16, 0);
        cell.vote(5u16, 0);
        assert_eq!(cell.winner(), Some((5, 2, 0)));
        assert_eq!(cell.total(), 3);

        let mut tie = VoteCell::new();
        tie.vote(7u16, 1);
        tie.vote(3u16, 0);
        assert_eq!(tie.value(), Some(3));
        assert!(VoteCell::<u16>::new().value().is_none());
    }
}
