//! Reading codewords along one horizontal scan line.

use super::patterns;
use crate::models::{BitMatrix, Codeword};

/// Codeword reader bound to one image row
pub(crate) struct LineReader<'a> {
    image: &'a BitMatrix,
    y: i32,
    min_width: f32,
    max_width: f32,
    skew: i32,
    max_mismatch: u32,
}

impl<'a> LineReader<'a> {
    pub(crate) fn new(
        image: &'a BitMatrix,
        y: i32,
        min_width: f32,
        max_width: f32,
        skew: i32,
        max_mismatch: u32,
    ) -> Self {
        Self {
            image,
            y,
            min_width,
            max_width,
            skew,
            max_mismatch,
        }
    }

    fn is_edge(&self, x: i32) -> bool {
        !self.image.pixel(x - 1, self.y) && self.image.pixel(x, self.y)
    }

    /// Nearest light-to-dark edge within the skew window around `predicted`.
    ///
    /// An edge at `x` means pixel `x - 1` is light and pixel `x` is dark.
    pub(crate) fn find_edge(&self, predicted: i32) -> Option<i32> {
        if self.is_edge(predicted) {
            return Some(predicted);
        }
        (1..=self.skew).find_map(|d| {
            if self.is_edge(predicted - d) {
                Some(predicted - d)
            } else if self.is_edge(predicted + d) {
                Some(predicted + d)
            } else {
                None
            }
        })
    }

    fn span_limit(&self) -> i32 {
        self.max_width.ceil() as i32 + self.skew + 1
    }

    /// Eight alternating runs starting with a bar at `start`, and the
    /// column where the following bar begins.
    fn runs_forward(&self, start: i32) -> Option<([u32; 8], i32)> {
        let limit = self.span_limit();
        let mut runs = [0u32; 8];
        let mut x = start;
        let mut index = 0;
        let mut dark = true;
        while index < 8 {
            if x - start > limit {
                return None;
            }
            if self.image.pixel(x, self.y) == dark {
                runs[index] += 1;
                x += 1;
            } else {
                index += 1;
                dark = !dark;
            }
        }
        Some((runs, x))
    }

    /// Eight runs read leftwards from `end` (exclusive), returned bar first,
    /// with the codeword's start column.
    fn runs_backward(&self, end: i32) -> Option<([u32; 8], i32)> {
        let limit = self.span_limit();
        let mut runs = [0u32; 8];
        let mut x = end - 1;
        let mut index = 0;
        let mut dark = false;
        while index < 8 {
            if end - x > limit {
                return None;
            }
            if self.image.pixel(x, self.y) == dark {
                runs[index] += 1;
                x -= 1;
            } else {
                index += 1;
                dark = !dark;
            }
        }
        runs.reverse();
        Some((runs, x + 1))
    }

    fn valid_width(&self, width: u32) -> bool {
        let w = width as f32;
        w >= self.min_width - self.skew as f32 && w <= self.max_width + self.skew as f32
    }

    /// Match measured runs against the pattern table.
    ///
    /// Exact matches carry no penalty. Otherwise the unique nearest pattern of
    /// `expected_bucket` is taken when it is close enough.
    pub(crate) fn classify(
        &self,
        runs: &[u32; 8],
        expected_bucket: Option<u8>,
    ) -> Option<(u8, u16, u32)> {
        if runs.iter().any(|&r| r == 0) {
            return None;
        }
        let elements = patterns::sample_bit_counts(runs);
        let signature = patterns::signature(&elements);
        if let Some((bucket, value)) = patterns::lookup(signature) {
            return Some((bucket, value, 0));
        }
        let bucket = expected_bucket?;
        patterns::nearest_in_bucket(signature, bucket, self.max_mismatch)
            .map(|(value, penalty)| (bucket, value, penalty))
    }

    fn codeword(
        &self,
        runs: [u32; 8],
        start_x: i32,
        end_x: i32,
        expected_bucket: Option<u8>,
    ) -> Option<Codeword> {
        let width: u32 = runs.iter().sum();
        if !self.valid_width(width) {
            return None;
        }
        let (bucket, value, penalty) = self.classify(&runs, expected_bucket)?;
        Some(Codeword {
            value,
            row: 0,
            start_x,
            end_x,
            bucket,
            penalty,
        })
    }

    /// Read the codeword whose first bar starts at `start`
    pub(crate) fn read_forward(&self, start: i32, expected_bucket: Option<u8>) -> Option<Codeword> {
        let (runs, end) = self.runs_forward(start)?;
        self.codeword(runs, start, end, expected_bucket)
    }

    /// Read the codeword that ends just before column `end`
    pub(crate) fn read_backward(&self, end: i32, expected_bucket: Option<u8>) -> Option<Codeword> {
        let (runs, start) = self.runs_backward(end)?;
        self.codeword(runs, start, end, expected_bucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Paint a run of elements on row 0 starting at `x`, returning the end.
    fn paint(m: &mut BitMatrix, mut x: usize, elements: &[u8], module: usize) -> usize {
        for (i, &w) in elements.iter().enumerate() {
            let px = w as usize * module;
            if i % 2 == 0 {
                m.fill_rect(x, 0, px, 1, true);
            }
            x += px;
        }
        x
    }

    fn line(elements: &[&[u8]], module: usize) -> (BitMatrix, Vec<usize>) {
        let mut m = BitMatrix::new(400, 1);
        let mut x = 10;
        let mut starts = vec![x];
        for e in elements {
            x = paint(&mut m, x, e, module);
            starts.push(x);
        }
        (m, starts)
    }

    #[test]
    fn test_read_forward_and_backward_agree() {
        let a = patterns::pattern_for(3, 100).unwrap();
        let b = patterns::pattern_for(3, 7).unwrap();
        let (m, starts) = line(&[&a, &b, &patterns::STOP_PATTERN], 2);
        let reader = LineReader::new(&m, 0, 30.0, 38.0, 2, 1);

        let first = reader.read_forward(starts[0] as i32, None).unwrap();
        assert_eq!((first.bucket, first.value, first.penalty), (3, 100, 0));
        assert_eq!(first.end_x, starts[1] as i32);

        let last = reader.read_backward(starts[2] as i32, None).unwrap();
        assert_eq!((last.bucket, last.value), (3, 7));
        assert_eq!(last.start_x, starts[1] as i32);
    }

    #[test]
    fn test_find_edge_within_skew() {
        let a = patterns::pattern_for(0, 5).unwrap();
        let (m, starts) = line(&[&a], 2);
        let reader = LineReader::new(&m, 0, 30.0, 38.0, 2, 1);
        let s = starts[0] as i32;
        assert_eq!(reader.find_edge(s), Some(s));
        assert_eq!(reader.find_edge(s - 2), Some(s));
        assert_eq!(reader.find_edge(s + 1), Some(s));
        assert_eq!(reader.find_edge(s - 5), None);
    }

    #[test]
    fn test_width_outside_range_is_rejected() {
        let a = patterns::pattern_for(6, 300).unwrap();
        let (m, starts) = line(&[&a, &a], 2);
        let narrow = LineReader::new(&m, 0, 50.0, 60.0, 2, 1);
        assert!(narrow.read_forward(starts[0] as i32, None).is_none());
        let wide = LineReader::new(&m, 0, 10.0, 20.0, 2, 1);
        assert!(wide.read_forward(starts[0] as i32, None).is_none());
    }

    #[test]
    fn test_one_module_error_snaps_to_expected_bucket() {
        let mut p = patterns::pattern_for(3, 22).unwrap();
        assert_eq!(p, [3, 1, 1, 1, 2, 4, 1, 4]);
        // Narrow the third bar by one module.
        p[4] -= 1;
        p[5] += 1;
        let (m, starts) = line(&[&p, &p], 3);
        let reader = LineReader::new(&m, 0, 45.0, 57.0, 2, 1);
        assert!(reader.read_forward(starts[0] as i32, None).is_none());
        let cw = reader.read_forward(starts[0] as i32, Some(3)).unwrap();
        assert_eq!((cw.bucket, cw.value, cw.penalty), (3, 22, 1));

        let strict = LineReader::new(&m, 0, 45.0, 57.0, 2, 0);
        assert!(strict.read_forward(starts[0] as i32, Some(3)).is_none());
    }
}
