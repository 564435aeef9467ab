/// Fixed-grid (DataMatrix-style) module parser
use crate::decoder::config::GridConfig;
use crate::error::{DecodeError, Result};
use crate::models::{BitMatrix, Corners, SymbolVersion};
use tracing::debug;

/// Module placement tables and traversal
pub mod layout;
/// Border checking and data region reassembly
pub mod region;
/// Image-space to module-space sampling
pub mod sampler;


pub use layout::{Corner, Placement};
pub use sampler::GridSampler;

/// Parser for one fixed-grid symbol.
///
/// Holds the reassembled, border-free data region of a symbol whose version
/// is known. Parsing is read-only: codewords can be read any number of times
/// with identical results.
#[derive(Debug, Clone)]
pub struct ModuleGrid {
    version: SymbolVersion,
    mapping: BitMatrix,
}

impl ModuleGrid {
    /// Parse a module-space symbol matrix of a declared version.
    ///
    /// Fails with a geometry error when the matrix size does not match the
    /// version, and with a format error when the region borders are off-pattern.
    pub fn new(matrix: &BitMatrix, version: SymbolVersion) -> Result<Self> {
        Self::with_config(matrix, version, &GridConfig::from_env())
    }

    /// [`ModuleGrid::new`] with explicit configuration
    pub fn with_config(
        matrix: &BitMatrix,
        version: SymbolVersion,
        config: &GridConfig,
    ) -> Result<Self> {
        let mapping = region::extract_data_region(matrix, &version, config.marker_tolerance)?;
        debug!(
            version = version.number,
            rows = mapping.height(),
            columns = mapping.width(),
            "data region extracted"
        );
        Ok(Self { version, mapping })
    }

    /// Parse a symbol matrix, resolving its version from the matrix size
    pub fn from_dimensions(matrix: &BitMatrix) -> Result<Self> {
        let version = SymbolVersion::for_dimensions(matrix.height(), matrix.width())?;
        Self::new(matrix, version)
    }

    /// Sample an image-space matrix through the symbol's outer corners, then parse
    pub fn from_image(image: &BitMatrix, corners: &Corners, version: SymbolVersion) -> Result<Self> {
        let symbol = GridSampler::sample(image, corners, version.symbol_rows, version.symbol_columns)?;
        Self::new(&symbol, version)
    }

    /// Declared version
    pub fn version(&self) -> &SymbolVersion {
        &self.version
    }

    /// Reassembled data region
    pub fn data_region(&self) -> &BitMatrix {
        &self.mapping
    }

    /// Read one logical module, wrapping positions that leave the region.
    ///
    /// `num_rows` x `num_columns` is the region the wrap rule works in; it
    /// must be non-empty and fit inside the data region.
    pub fn read_module(
        &self,
        row: i32,
        column: i32,
        num_rows: usize,
        num_columns: usize,
    ) -> Result<bool> {
        self.check_region(num_rows, num_columns)?;
        let (r, c) = layout::wrap(row, column, num_rows, num_columns)?;
        self.mapping.get(c, r)
    }

    /// Read the utah-shaped codeword anchored at `(row, column)`
    pub fn read_utah(
        &self,
        row: i32,
        column: i32,
        num_rows: usize,
        num_columns: usize,
    ) -> Result<u8> {
        self.check_region(num_rows, num_columns)?;
        self.read_positions(&layout::utah_positions(row, column, num_rows, num_columns)?)
    }

    /// Read one of the four corner-shaped codewords
    pub fn read_corner(&self, corner: Corner, num_rows: usize, num_columns: usize) -> Result<u8> {
        self.check_region(num_rows, num_columns)?;
        self.read_positions(&corner.positions(num_rows, num_columns)?)
    }

    fn check_region(&self, num_rows: usize, num_columns: usize) -> Result<()> {
        let (height, width) = (self.mapping.height(), self.mapping.width());
        if num_rows == 0 || num_columns == 0 || num_rows > height || num_columns > width {
            return Err(DecodeError::geometry(format!(
                "{}x{} region does not fit the {}x{} data region",
                num_rows, num_columns, height, width
            )));
        }
        Ok(())
    }

    fn read_positions(&self, positions: &[(usize, usize); 8]) -> Result<u8> {
        let mut byte = 0u8;
        for &(r, c) in positions {
            byte = (byte << 1) | self.mapping.get(c, r)? as u8;
        }
        Ok(byte)
    }

    /// Read all codewords in placement order.
    ///
    /// Fails with a format error if the traversal does not yield exactly the
    /// version's total codeword count.
    pub fn read_codewords(&self) -> Result<Vec<u8>> {
        let num_rows = self.mapping.height();
        let num_columns = self.mapping.width();
        let placements = layout::placements(num_rows, num_columns)?;
        if placements.len() != self.version.total_codewords() {
            return Err(DecodeError::format(format!(
                "layout yields {} codewords, version {} declares {}",
                placements.len(),
                self.version.number,
                self.version.total_codewords()
            )));
        }

        placements
            .into_iter()
            .map(|p| match p {
                Placement::Corner(corner) => self.read_corner(corner, num_rows, num_columns),
                Placement::Utah { row, column } => self.read_utah(row, column, num_rows, num_columns),
            })
            .collect()
    }
}
