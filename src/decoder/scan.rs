/// Perspective row scanner for stacked (PDF417-style) symbols
use crate::decoder::assembly::AssembledCodewords;
use crate::decoder::config::ScanConfig;
use crate::error::{DecodeError, Result};
use crate::models::{BitMatrix, Codeword, Corners, ResultPoint, VoteCell};
use crate::utils::geometry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// Row indicator metadata and voting
pub mod metadata;
/// Codeword pattern tables
pub mod patterns;
/// Run-length codeword reading on one scan line
pub(crate) mod reader;


pub use metadata::{MetadataVotes, Side, SymbolMetadata};

use reader::LineReader;

/// Skew and sampling figures of one scan
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanDiagnostics {
    /// Final left boundary correction (pixels) relative to the corner line
    pub left_correction: f32,
    /// Final right boundary correction (pixels)
    pub right_correction: f32,
    /// Scan lines whose boundary step was clamped to `max_skew_step`
    pub clamped_adjustments: usize,
    /// Codeword width estimate at the end of the scan (pixels)
    pub codeword_width: f32,
    /// Pixel height of each logical row, 0 when the row was never read
    pub row_heights: Vec<usize>,
    /// Mean module mismatch over the accepted codewords
    pub mean_penalty: f32,
    /// Scan lines examined, rescans included
    pub lines_scanned: usize,
    /// Cell (0, 0) was rebuilt from the metadata
    pub length_repaired: bool,
}

/// Codeword matrix recovered by [`ScanDecoder`]
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Symbol structure voted from the row indicators
    pub metadata: SymbolMetadata,
    /// `rows x columns` data codewords; `None` marks an erasure
    pub codewords: Vec<Vec<Option<Codeword>>>,
    /// Skew and sampling figures
    pub diagnostics: ScanDiagnostics,
}

impl ScanResult {
    /// Row-major indices of cells without an accepted read
    pub fn erasures(&self) -> Vec<usize> {
        self.codewords
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, cw)| cw.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Codeword values, row-major
    pub fn values(&self) -> Vec<Option<u16>> {
        self.codewords
            .iter()
            .flatten()
            .map(|cw| cw.map(|c| c.value))
            .collect()
    }

    /// Flatten into the sequence handed to error correction
    pub fn assemble(&self) -> AssembledCodewords {
        let rows: Vec<Vec<Option<u16>>> = self
            .codewords
            .iter()
            .map(|row| row.iter().map(|cw| cw.map(|c| c.value)).collect())
            .collect();
        AssembledCodewords::from_rows(&rows, Some(self.diagnostics.row_heights.clone()))
    }
}

/// One corner-to-corner boundary of the codeword area
#[derive(Debug, Clone, Copy)]
struct EdgeLine {
    top: ResultPoint,
    bottom: ResultPoint,
}

impl EdgeLine {
    fn new(top: ResultPoint, bottom: ResultPoint) -> Result<Self> {
        if bottom.y - top.y <= 0.0 {
            return Err(DecodeError::geometry(format!(
                "boundary from ({}, {}) to ({}, {}) has no height",
                top.x, top.y, bottom.x, bottom.y
            )));
        }
        Ok(Self { top, bottom })
    }

    fn x_at(&self, y: f32) -> f32 {
        let t = (y - self.top.y) / (self.bottom.y - self.top.y);
        self.top.x + t * (self.bottom.x - self.top.x)
    }
}

/// Running offset between the corner line and the boundary actually found
#[derive(Debug, Clone)]
struct SkewTracker {
    correction: f32,
    max_step: f32,
    clamped: usize,
}

impl SkewTracker {
    fn new(max_step: f32) -> Self {
        Self {
            correction: 0.0,
            max_step,
            clamped: 0,
        }
    }

    fn predict(&self, base: f32) -> i32 {
        geometry::round(base + self.correction)
    }

    fn observe(&mut self, base: f32, found: i32) {
        let mut step = (found as f32 - base) - self.correction;
        if step.abs() > self.max_step {
            trace!(step, max = self.max_step, "boundary step clamped");
            step = step.clamp(-self.max_step, self.max_step);
            self.clamped += 1;
        }
        self.correction += step;
    }
}

#[derive(Debug, Default)]
struct CellReads {
    votes: VoteCell<u16>,
    reads: Vec<Codeword>,
}

impl CellReads {
    fn add(&mut self, codeword: Codeword) {
        self.votes.vote(codeword.value, codeword.penalty);
        if !self.reads.iter().any(|r| r.value == codeword.value) {
            self.reads.push(codeword);
        }
    }

    fn best(&self) -> Option<Codeword> {
        let (value, _, penalty) = self.votes.winner()?;
        self.reads
            .iter()
            .find(|r| r.value == value)
            .map(|r| Codeword { penalty, ..*r })
    }
}

/// Row of `line_row`'s scan line a codeword actually belongs to, judged by
/// its bucket.
fn row_for_bucket(line_row: usize, bucket: u8) -> Option<usize> {
    if bucket == patterns::bucket_for_row(line_row) {
        Some(line_row)
    } else if bucket == patterns::bucket_for_row(line_row + 1) {
        Some(line_row + 1)
    } else {
        line_row.checked_sub(1)
    }
}

struct RowScan<'a> {
    image: &'a BitMatrix,
    config: &'a ScanConfig,
    min_width: f32,
    max_width: f32,
    left_edge: EdgeLine,
    right_edge: EdgeLine,
    left_skew: SkewTracker,
    right_skew: SkewTracker,
    width_estimate: f32,
    votes: MetadataVotes,
    cells: BTreeMap<(usize, usize), CellReads>,
    row_lines: BTreeMap<usize, (i32, i32)>,
    last: Option<(usize, i32)>,
    lines: usize,
}

impl<'a> RowScan<'a> {
    fn row_height(&self) -> f32 {
        match (self.row_lines.first_key_value(), self.row_lines.last_key_value()) {
            (Some((&r0, &(y0, _))), Some((&r1, &(y1, _)))) if r1 > r0 => {
                (y1 - y0) as f32 / (r1 - r0) as f32
            }
            _ => self.width_estimate * 3.0 / patterns::MODULES_PER_CODEWORD as f32,
        }
    }

    fn step(&self) -> i32 {
        ((self.row_height() / self.config.samples_per_row as f32) as i32).max(1)
    }

    fn row_from_buckets(&self, data: &[(usize, Codeword)]) -> Option<usize> {
        let (last_row, _) = self.last?;
        let mut counts: HashMap<u8, usize> = HashMap::new();
        for (_, cw) in data {
            *counts.entry(cw.bucket).or_default() += 1;
        }
        let bucket = counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(b, _)| b)?;
        (last_row..last_row + 3).find(|&r| patterns::bucket_for_row(r) == bucket)
    }

    /// Read one image row; returns the logical row it belongs to
    fn scan_line(&mut self, y: i32) -> Option<usize> {
        self.lines += 1;
        let centre = y as f32 + 0.5;
        let reader = LineReader::new(
            self.image,
            y,
            self.min_width,
            self.max_width,
            self.config.codeword_skew_size,
            self.config.max_pattern_mismatch,
        );

        let left_base = self.left_edge.x_at(centre);
        let predicted = self.left_skew.predict(left_base);
        let left = reader.find_edge(predicted).unwrap_or(predicted);
        let left_indicator = reader.read_forward(left, None);

        let right_base = self.right_edge.x_at(centre);
        let predicted = self.right_skew.predict(right_base);
        let right = reader.find_edge(predicted).unwrap_or(predicted);
        let right_indicator = reader.read_backward(right, None);

        if left_indicator.is_some() {
            self.left_skew.observe(left_base, left);
        }
        if right_indicator.is_some() {
            self.right_skew.observe(right_base, right);
        }

        let width = left_indicator
            .or(right_indicator)
            .map(|cw| cw.width() as f32)
            .unwrap_or(self.width_estimate);
        let slots = (geometry::round((right - left) as f32 / width) - 2).max(0) as usize;
        if left_indicator.is_some() && right_indicator.is_some() && slots > 0 {
            self.width_estimate = (right - left) as f32 / (slots + 2) as f32;
        }

        let mut row = left_indicator
            .or(right_indicator)
            .map(|cw| cw.indicator_row());
        let expected = row.map(patterns::bucket_for_row);

        let mut data = Vec::with_capacity(slots);
        let mut next_start = left_indicator.map(|cw| cw.end_x);
        for slot in 1..=slots {
            let predicted = next_start.unwrap_or(left + geometry::round(slot as f32 * width));
            let start = reader.find_edge(predicted).unwrap_or(predicted);
            match reader.read_forward(start, expected) {
                Some(cw) => {
                    let at = geometry::round((cw.start_x - left) as f32 / width);
                    if at >= 1 && at as usize <= slots {
                        data.push((at as usize - 1, cw));
                    }
                    next_start = Some(cw.end_x);
                }
                None => next_start = None,
            }
        }

        if row.is_none() {
            row = self.row_from_buckets(&data);
        }
        let row = row?;

        for (side, indicator) in [(Side::Left, left_indicator), (Side::Right, right_indicator)] {
            if let Some(mut cw) = indicator {
                cw.row = cw.indicator_row();
                self.votes.record(side, &cw);
            }
        }
        let read = data.len();
        for (column, mut cw) in data {
            if let Some(r) = row_for_bucket(row, cw.bucket) {
                cw.row = r;
                self.cells.entry((r, column)).or_default().add(cw);
            }
        }
        let span = self.row_lines.entry(row).or_insert((y, y));
        span.0 = span.0.min(y);
        span.1 = span.1.max(y);

        trace!(
            y,
            row,
            left,
            right,
            slots,
            read,
            left_indicator = left_indicator.is_some(),
            right_indicator = right_indicator.is_some(),
            "scan line"
        );
        Some(row)
    }

    fn scan(&mut self, y_start: i32, y_end: i32) {
        let mut y = y_start;
        while y < y_end {
            if let Some(row) = self.scan_line(y) {
                if let Some((last_row, last_y)) = self.last {
                    if row > last_row + 1 && y - last_y > 1 {
                        debug!(from = last_row, to = row, y, "row skipped, rescanning");
                        for between in last_y + 1..y {
                            self.scan_line(between);
                        }
                    }
                }
                self.last = Some((row, y));
            }
            y += self.step();
        }
    }

    fn row_heights(&self, rows: usize) -> Vec<usize> {
        (0..rows)
            .map(|r| match (self.row_lines.get(&r), self.row_lines.get(&(r + 1))) {
                (Some(&(first, _)), Some(&(next, _))) if next > first => (next - first) as usize,
                (Some(&(first, last)), _) => (last - first + 1) as usize,
                _ => 0,
            })
            .collect()
    }
}

/// Row-by-row decoder for stacked symbols located by four corners
#[derive(Debug, Clone)]
pub struct ScanDecoder {
    config: ScanConfig,
}

impl Default for ScanDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanDecoder {
    /// Decoder with environment-derived configuration
    pub fn new() -> Self {
        Self::with_config(ScanConfig::from_env())
    }

    /// Decoder with explicit configuration
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// [`ScanDecoder::decode`] with the corners bundled
    pub fn decode_corners(
        &self,
        image: &BitMatrix,
        corners: &Corners,
        min_codeword_width: f32,
        max_codeword_width: f32,
    ) -> Result<ScanResult> {
        self.decode(
            image,
            corners.top_left,
            corners.bottom_left,
            corners.top_right,
            corners.bottom_right,
            min_codeword_width,
            max_codeword_width,
        )
    }

    /// Decode the codeword area between four image-space corners.
    ///
    /// The left corners sit where the start pattern ends, the right corners
    /// where the stop pattern begins. Codeword widths are in pixels.
    ///
    /// Rows whose codewords cannot be matched become erasures. The decode
    /// fails with a detection error when too few rows are read or the row
    /// indicators are missing, and with a checksum error when the indicators
    /// contradict each other.
    #[allow(clippy::too_many_arguments)]
    pub fn decode(
        &self,
        image: &BitMatrix,
        top_left: ResultPoint,
        bottom_left: ResultPoint,
        top_right: ResultPoint,
        bottom_right: ResultPoint,
        min_codeword_width: f32,
        max_codeword_width: f32,
    ) -> Result<ScanResult> {
        let corners = [top_left, bottom_left, top_right, bottom_right];
        if corners.iter().any(|p| !p.is_finite()) {
            return Err(DecodeError::geometry("corner point is not finite"));
        }
        if !(min_codeword_width.is_finite()
            && max_codeword_width.is_finite()
            && min_codeword_width > 0.0
            && min_codeword_width <= max_codeword_width)
        {
            return Err(DecodeError::geometry(format!(
                "empty codeword width range {}..={}",
                min_codeword_width, max_codeword_width
            )));
        }
        let max_step = self.config.max_skew_step;
        if max_step.is_nan() || max_step <= 0.0 {
            return Err(DecodeError::geometry(format!(
                "max skew step must be positive, got {}",
                max_step
            )));
        }
        let left_edge = EdgeLine::new(top_left, bottom_left)?;
        let right_edge = EdgeLine::new(top_right, bottom_right)?;

        let top = top_left.distance(&top_right);
        let bottom = bottom_left.distance(&bottom_right);
        if top <= 0.0 || bottom <= 0.0 {
            return Err(DecodeError::geometry("codeword area has no width"));
        }
        let span = (top + bottom) / 2.0;
        let fewest = (span / max_codeword_width).ceil().max(1.0);
        let most = (span / min_codeword_width).floor();
        if fewest > most {
            return Err(DecodeError::geometry(format!(
                "no codeword count fits {:.1} px between {}..={} px per codeword",
                span, min_codeword_width, max_codeword_width
            )));
        }
        let count = (span / ((min_codeword_width + max_codeword_width) / 2.0))
            .round()
            .clamp(fewest, most);
        let width_estimate = span / count;
        debug!(span, count, width_estimate, "initial codeword width");

        let y_start = ((top_left.y.min(top_right.y) - 0.5).ceil() as i32).max(0);
        let y_end = ((bottom_left.y.max(bottom_right.y) - 0.5).ceil() as i32).min(image.height() as i32);

        let mut scan = RowScan {
            image,
            config: &self.config,
            min_width: min_codeword_width,
            max_width: max_codeword_width,
            left_edge,
            right_edge,
            left_skew: SkewTracker::new(max_step),
            right_skew: SkewTracker::new(max_step),
            width_estimate,
            votes: MetadataVotes::new(),
            cells: BTreeMap::new(),
            row_lines: BTreeMap::new(),
            last: None,
            lines: 0,
        };
        scan.scan(y_start, y_end);

        if scan.row_lines.len() < self.config.min_stable_rows {
            debug!(rows = scan.row_lines.len(), lines = scan.lines, "too few rows read");
            return Err(DecodeError::detection(format!(
                "{} rows read, at least {} required",
                scan.row_lines.len(),
                self.config.min_stable_rows
            )));
        }
        let metadata = scan.votes.resolve(self.config.column_count_tolerance)?;
        let stable = scan.row_lines.range(..metadata.rows).count();
        if stable < self.config.min_stable_rows {
            return Err(DecodeError::detection(format!(
                "{} of {} rows read, at least {} required",
                stable, metadata.rows, self.config.min_stable_rows
            )));
        }

        let mut codewords = vec![vec![None; metadata.columns]; metadata.rows];
        for (&(row, column), reads) in &scan.cells {
            if row < metadata.rows && column < metadata.columns {
                codewords[row][column] = reads.best();
            }
        }

        let mut length_repaired = false;
        if self.config.repair_length_descriptor {
            if let Some(expected) = metadata.length_descriptor() {
                let cell = &mut codewords[0][0];
                if cell.map(|cw| cw.value) != Some(expected) {
                    debug!(found = ?cell.map(|cw| cw.value), expected, "length descriptor repaired");
                    *cell = Some(Codeword {
                        value: expected,
                        row: 0,
                        start_x: 0,
                        end_x: 0,
                        bucket: patterns::bucket_for_row(0),
                        penalty: 0,
                    });
                    length_repaired = true;
                }
            }
        }

        let accepted: Vec<u32> = codewords.iter().flatten().flatten().map(|cw| cw.penalty).collect();
        let mean_penalty = if accepted.is_empty() {
            0.0
        } else {
            accepted.iter().sum::<u32>() as f32 / accepted.len() as f32
        };

        let diagnostics = ScanDiagnostics {
            left_correction: scan.left_skew.correction,
            right_correction: scan.right_skew.correction,
            clamped_adjustments: scan.left_skew.clamped + scan.right_skew.clamped,
            codeword_width: scan.width_estimate,
            row_heights: scan.row_heights(metadata.rows),
            mean_penalty,
            lines_scanned: scan.lines,
            length_repaired,
        };
        let result = ScanResult {
            metadata,
            codewords,
            diagnostics,
        };
        debug!(
            rows = metadata.rows,
            columns = metadata.columns,
            ec_level = metadata.ec_level,
            erasures = result.erasures().len(),
            left_correction = result.diagnostics.left_correction,
            right_correction = result.diagnostics.right_correction,
            clamped = result.diagnostics.clamped_adjustments,
            "stacked symbol scanned"
        );
        Ok(result)
    }
}
