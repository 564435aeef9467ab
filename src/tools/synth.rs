//! Synthetic symbols for round-trip tests, benches and the CLI.
//!
//! These place a given codeword sequence into a symbol layout; they do no
//! data encoding and compute no error correction.

use crate::decoder::module_grid::{layout, region};
use crate::decoder::scan::{SymbolMetadata, patterns};
use crate::error::{DecodeError, Result};
use crate::models::{BitMatrix, Corners, ResultPoint, SymbolVersion};

/// Place `codewords` into a fixed-grid symbol of `version`, borders included.
///
/// This is the inverse of the module-grid codeword reader.
pub fn render_module_grid(version: &SymbolVersion, codewords: &[u8]) -> Result<BitMatrix> {
    version.validate()?;
    let rows = version.mapping_rows();
    let columns = version.mapping_columns();
    let placements = layout::placements(rows, columns)?;
    if codewords.len() != placements.len() || codewords.len() != version.total_codewords() {
        return Err(DecodeError::format(format!(
            "{} codewords given, version {} holds {}",
            codewords.len(),
            version.number,
            version.total_codewords()
        )));
    }

    let mut working = region::WorkingMatrix::new(columns, rows);
    for (placement, &byte) in placements.iter().zip(codewords) {
        for (bit, (r, c)) in placement.positions(rows, columns)?.into_iter().enumerate() {
            working.write(c, r, byte & (0x80 >> bit) != 0)?;
        }
    }
    if rows * columns == 8 * codewords.len() + 4 {
        for (r, c, dark) in layout::unused_corner_fill(rows, columns) {
            working.write(c, r, dark)?;
        }
    }
    render_data_region(version, &working.finish()?)
}

/// Frame an already populated logical data region with the region borders
pub fn render_data_region(version: &SymbolVersion, mapping: &BitMatrix) -> Result<BitMatrix> {
    version.validate()?;
    if mapping.width() != version.mapping_columns() || mapping.height() != version.mapping_rows() {
        return Err(DecodeError::geometry(format!(
            "{}x{} data region for version {} which needs {}x{}",
            mapping.width(),
            mapping.height(),
            version.number,
            version.mapping_columns(),
            version.mapping_rows()
        )));
    }
    let mut symbol = BitMatrix::new(version.symbol_columns, version.symbol_rows);
    region::draw_borders(&mut symbol, version)?;
    region::embed_data_region(&mut symbol, mapping, version)?;
    Ok(symbol)
}

/// Scale a module-space matrix to pixels with a light margin.
///
/// Returns the image and the outer corners of the symbol in it.
pub fn scale_matrix(symbol: &BitMatrix, module_px: usize, quiet_zone: usize) -> (BitMatrix, Corners) {
    let module_px = module_px.max(1);
    let mut image = BitMatrix::new(
        symbol.width() * module_px + 2 * quiet_zone,
        symbol.height() * module_px + 2 * quiet_zone,
    );
    for y in 0..symbol.height() {
        for x in 0..symbol.width() {
            if symbol.pixel(x as i32, y as i32) {
                image.fill_rect(
                    quiet_zone + x * module_px,
                    quiet_zone + y * module_px,
                    module_px,
                    module_px,
                    true,
                );
            }
        }
    }
    let q = quiet_zone as f32;
    let corners = Corners::rectangle(
        q,
        q,
        q + (symbol.width() * module_px) as f32,
        q + (symbol.height() * module_px) as f32,
    );
    (image, corners)
}

/// Element widths painted in place of a data codeword of a corrupted row.
///
/// Seventeen modules like a real codeword, but the last space is wider than
/// any pattern allows.
pub const CORRUPT_ELEMENTS: [u8; 8] = [1, 1, 1, 1, 1, 1, 1, 10];

/// Codeword matrix of a stacked symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackedSymbol {
    metadata: SymbolMetadata,
    codewords: Vec<u16>,
}

impl StackedSymbol {
    /// Symbol from row-major data codewords
    pub fn new(metadata: SymbolMetadata, codewords: Vec<u16>) -> Result<Self> {
        if codewords.len() != metadata.rows * metadata.columns {
            return Err(DecodeError::format(format!(
                "{} codewords for a {}x{} symbol",
                codewords.len(),
                metadata.rows,
                metadata.columns
            )));
        }
        if let Some(&bad) = codewords.iter().find(|&&v| v as usize >= patterns::CODEWORD_VALUES) {
            return Err(DecodeError::format(format!("codeword value {} out of range", bad)));
        }
        Ok(Self {
            metadata,
            codewords,
        })
    }

    /// Deterministic pseudo-random content with a correct length descriptor
    pub fn sample(metadata: SymbolMetadata, seed: u64) -> Self {
        let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
        let mut codewords: Vec<u16> = (0..metadata.rows * metadata.columns)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % patterns::CODEWORD_VALUES as u64) as u16
            })
            .collect();
        if let Some(first) = codewords.first_mut() {
            *first = metadata.length_descriptor().unwrap_or(0);
        }
        Self {
            metadata,
            codewords,
        }
    }

    /// Symbol structure
    pub fn metadata(&self) -> &SymbolMetadata {
        &self.metadata
    }

    /// Row-major data codewords
    pub fn codewords(&self) -> &[u16] {
        &self.codewords
    }

    /// Data codeword at `(row, column)`
    pub fn codeword(&self, row: usize, column: usize) -> Option<u16> {
        if row >= self.metadata.rows || column >= self.metadata.columns {
            return None;
        }
        self.codewords.get(row * self.metadata.columns + column).copied()
    }
}

/// Rendering parameters for [`render_stacked`]
#[derive(Debug, Clone, PartialEq)]
pub struct StackedOptions {
    /// Pixels per module at the top of the symbol
    pub module_px: usize,
    /// Module rows per logical row
    pub row_modules: usize,
    /// Light margin on every side, in pixels
    pub quiet_zone: usize,
    /// Horizontal shift per pixel row
    pub shear: f32,
    /// Fraction by which the symbol is narrower at the bottom than at the top
    pub taper: f32,
    /// Rows whose data codewords are painted with [`CORRUPT_ELEMENTS`]
    pub corrupt_rows: Vec<usize>,
    /// Column count announced by the right indicators instead of the true one
    pub right_column_count: Option<usize>,
}

impl Default for StackedOptions {
    fn default() -> Self {
        Self {
            module_px: 2,
            row_modules: 3,
            quiet_zone: 10,
            shear: 0.0,
            taper: 0.0,
            corrupt_rows: Vec::new(),
            right_column_count: None,
        }
    }
}

/// A rendered stacked symbol and where its codeword area lies
#[derive(Debug, Clone)]
pub struct StackedRender {
    /// Rendered image
    pub image: BitMatrix,
    /// Corners of the codeword area: start pattern end to stop pattern start
    pub corners: Corners,
    /// Codeword width at the top of the symbol, in pixels
    pub codeword_width: f32,
}

fn push_elements(modules: &mut Vec<bool>, elements: &[u8]) {
    for (i, &width) in elements.iter().enumerate() {
        modules.extend(std::iter::repeat_n(i % 2 == 0, width as usize));
    }
}

fn codeword_elements(bucket: u8, value: u16) -> Result<patterns::Elements> {
    patterns::pattern_for(bucket, value)
        .ok_or_else(|| DecodeError::format(format!("no pattern for value {} in bucket {}", value, bucket)))
}

/// Module row of one logical row: start, indicators, data and stop
fn row_modules(symbol: &StackedSymbol, row: usize, options: &StackedOptions) -> Result<Vec<bool>> {
    let meta = &symbol.metadata;
    let bucket = patterns::bucket_for_row(row);
    let mut modules = Vec::with_capacity(17 * (meta.columns + 4) + 1);
    push_elements(&mut modules, &patterns::START_PATTERN);
    push_elements(&mut modules, &codeword_elements(bucket, meta.left_indicator(row))?);
    for column in 0..meta.columns {
        if options.corrupt_rows.contains(&row) {
            push_elements(&mut modules, &CORRUPT_ELEMENTS);
        } else {
            let value = symbol.codewords[row * meta.columns + column];
            push_elements(&mut modules, &codeword_elements(bucket, value)?);
        }
    }
    let right = match options.right_column_count {
        Some(columns) if (1..=30).contains(&columns) => meta.right_indicator_with_columns(row, columns),
        _ => meta.right_indicator(row),
    };
    push_elements(&mut modules, &codeword_elements(bucket, right)?);
    push_elements(&mut modules, &patterns::STOP_PATTERN);
    Ok(modules)
}

/// Paint a stacked symbol.
///
/// Each pixel row is sampled from its module row after shifting by `shear`
/// and scaling by the taper, so the codeword area is a quadrilateral whose
/// corners are returned exactly.
pub fn render_stacked(symbol: &StackedSymbol, options: &StackedOptions) -> Result<StackedRender> {
    if options.module_px == 0 || options.row_modules == 0 {
        return Err(DecodeError::geometry("module size must be positive"));
    }
    if !(0.0..0.5).contains(&options.taper) || !options.shear.is_finite() {
        return Err(DecodeError::geometry("taper must lie in 0..0.5 and shear be finite"));
    }
    let rows: Vec<Vec<bool>> = (0..symbol.metadata.rows)
        .map(|r| row_modules(symbol, r, options))
        .collect::<Result<_>>()?;
    let modules_per_row = rows.first().map_or(0, Vec::len);

    let module_px = options.module_px as f32;
    let row_px = options.row_modules * options.module_px;
    let height = symbol.metadata.rows * row_px;
    let h = height as f32;
    let top = options.quiet_zone as f32;
    let left = top + (-options.shear * h).max(0.0);

    let origin = |y: f32| left + options.shear * (y - top);
    let scale = |y: f32| 1.0 - options.taper * (y - top) / h;

    let width = (left + (options.shear * h).max(0.0) + modules_per_row as f32 * module_px).ceil() as usize
        + options.quiet_zone;
    let mut image = BitMatrix::new(width, height + 2 * options.quiet_zone);

    for py in 0..height {
        let y = options.quiet_zone + py;
        let centre = y as f32 + 0.5;
        let x0 = origin(centre);
        let module_width = module_px * scale(centre);
        let modules = &rows[py / row_px];
        for x in 0..width {
            let u = (x as f32 + 0.5 - x0) / module_width;
            if u >= 0.0 && (u as usize) < modules_per_row && modules[u as usize] {
                image.set(x, y, true)?;
            }
        }
    }

    let start_end = 17.0;
    let stop_start = (17 * (symbol.metadata.columns + 3)) as f32;
    let at = |y: f32, module: f32| ResultPoint::new(origin(y) + module * module_px * scale(y), y);
    let bottom = top + h;
    let corners = Corners::new(
        at(top, start_end),
        at(bottom, start_end),
        at(top, stop_start),
        at(bottom, stop_start),
    );

    Ok(StackedRender {
        image,
        corners,
        codeword_width: 17.0 * module_px,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::module_grid::ModuleGrid;

    #[test]
    fn test_module_grid_round_trip_every_version() {
        for version in SymbolVersion::all() {
            let codewords: Vec<u8> = (0..version.total_codewords())
                .map(|i| (i * 37 + version.number as usize) as u8)
                .collect();
            let symbol = render_module_grid(&version, &codewords).unwrap();
            let grid = ModuleGrid::new(&symbol, version.clone()).unwrap();
            assert_eq!(grid.read_codewords().unwrap(), codewords, "version {}", version.number);
        }
    }

    #[test]
    fn test_wrong_codeword_count_is_rejected() {
        let v = SymbolVersion::from_number(1).unwrap();
        assert!(render_module_grid(&v, &[0; 7]).is_err());
    }

    #[test]
    fn test_scale_matrix_corners() {
        let mut symbol = BitMatrix::new(3, 2);
        symbol.set(2, 1, true).unwrap();
        let (image, corners) = scale_matrix(&symbol, 4, 5);
        assert_eq!((image.width(), image.height()), (22, 18));
        assert_eq!(image.count_dark(), 16);
        assert!(image.pixel(5 + 8, 5 + 4));
        assert_eq!(corners.bottom_right, ResultPoint::new(17.0, 13.0));
    }

    #[test]
    fn test_stacked_layout_widths() {
        let meta = SymbolMetadata::new(3, 2, 0).unwrap();
        let symbol = StackedSymbol::sample(meta, 1);
        assert_eq!(symbol.codeword(0, 0), meta.length_descriptor());
        let render = render_stacked(&symbol, &StackedOptions::default()).unwrap();
        // start + left + 2 data + right + stop = 17 * 6 + 1 modules at 2 px
        assert_eq!(render.image.width(), 10 + 206 + 10);
        assert_eq!(render.image.height(), 10 + 18 + 10);
        assert_eq!(render.corners.top_left, ResultPoint::new(44.0, 10.0));
        assert_eq!(render.corners.bottom_right, ResultPoint::new(180.0, 28.0));
        // First start bar
        assert!(render.image.pixel(10, 10));
        assert!(render.image.pixel(25, 27));
        assert!(!render.image.pixel(26, 27));
    }

    #[test]
    fn test_stacked_symbol_validation() {
        let meta = SymbolMetadata::new(3, 1, 0).unwrap();
        assert!(StackedSymbol::new(meta, vec![1, 2]).is_err());
        assert!(StackedSymbol::new(meta, vec![1, 2, 929]).is_err());
        assert!(StackedSymbol::new(meta, vec![1, 2, 3]).is_ok());
    }
}
