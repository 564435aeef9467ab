use crate::decoder::tables;
use crate::error::{DecodeError, Result};

/// A group of error-correction blocks sharing one data length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EcBlock {
    /// Number of blocks in this group
    pub count: usize,
    /// Data codewords per block
    pub data_codewords: usize,
}

/// Error-correction block structure of a fixed-grid symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcBlocks {
    /// Error-correction codewords per block
    pub ec_codewords: usize,
    /// Block groups, longer data blocks first
    pub blocks: Vec<EcBlock>,
}

impl EcBlocks {
    /// Total number of blocks across all groups
    pub fn num_blocks(&self) -> usize {
        self.blocks.iter().map(|b| b.count).sum()
    }

    /// Total number of error-correction codewords
    pub fn total_ec_codewords(&self) -> usize {
        self.ec_codewords * self.num_blocks()
    }

    /// Total number of data codewords
    pub fn total_data_codewords(&self) -> usize {
        self.blocks.iter().map(|b| b.count * b.data_codewords).sum()
    }
}

/// Logical module layout of a fixed-grid symbol.
///
/// The symbol is `symbol_rows x symbol_columns` modules. It is split into
/// data regions of `data_region_rows x data_region_columns`, each framed by a
/// one-module finder/clock border, so the symbol measures
/// `regions * (data_region + 2)` in each direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolVersion {
    /// Version number (1-based index into the size table)
    pub number: u8,
    /// Symbol height in modules, borders included
    pub symbol_rows: usize,
    /// Symbol width in modules, borders included
    pub symbol_columns: usize,
    /// Height of one data region
    pub data_region_rows: usize,
    /// Width of one data region
    pub data_region_columns: usize,
    /// Error-correction block structure
    pub ec_blocks: EcBlocks,
}

impl SymbolVersion {
    /// Declare a version. `blocks` lists `(count, data_codewords)` groups.
    pub fn new(
        number: u8,
        symbol_rows: usize,
        symbol_columns: usize,
        data_region_rows: usize,
        data_region_columns: usize,
        ec_codewords: usize,
        blocks: &[(usize, usize)],
    ) -> Self {
        Self {
            number,
            symbol_rows,
            symbol_columns,
            data_region_rows,
            data_region_columns,
            ec_blocks: EcBlocks {
                ec_codewords,
                blocks: blocks
                    .iter()
                    .map(|&(count, data_codewords)| EcBlock {
                        count,
                        data_codewords,
                    })
                    .collect(),
            },
        }
    }

    /// Look up a built-in version by its number (1-30)
    pub fn from_number(number: u8) -> Result<Self> {
        tables::version_entry(number)
            .map(Self::from_entry)
            .ok_or_else(|| DecodeError::format(format!("unknown symbol version {}", number)))
    }

    /// Resolve a built-in version from symbol dimensions in modules
    pub fn for_dimensions(rows: usize, columns: usize) -> Result<Self> {
        tables::VERSIONS
            .iter()
            .find(|v| v.symbol_rows == rows && v.symbol_columns == columns)
            .map(Self::from_entry)
            .ok_or_else(|| {
                DecodeError::format(format!("no symbol version measures {}x{}", rows, columns))
            })
    }

    /// All built-in versions, in number order
    pub fn all() -> impl Iterator<Item = SymbolVersion> {
        tables::VERSIONS.iter().map(Self::from_entry)
    }

    fn from_entry(entry: &tables::VersionEntry) -> Self {
        Self::new(
            entry.number,
            entry.symbol_rows,
            entry.symbol_columns,
            entry.data_region_rows,
            entry.data_region_columns,
            entry.ec_codewords,
            entry.blocks,
        )
    }

    /// Number of data regions vertically and horizontally
    pub fn data_regions(&self) -> (usize, usize) {
        (
            self.symbol_rows / (self.data_region_rows + 2),
            self.symbol_columns / (self.data_region_columns + 2),
        )
    }

    /// Height of the reassembled data region (all regions, borders removed)
    pub fn mapping_rows(&self) -> usize {
        self.data_regions().0 * self.data_region_rows
    }

    /// Width of the reassembled data region (all regions, borders removed)
    pub fn mapping_columns(&self) -> usize {
        self.data_regions().1 * self.data_region_columns
    }

    /// Total codewords (data plus error correction) carried by the symbol
    pub fn total_codewords(&self) -> usize {
        self.ec_blocks.total_data_codewords() + self.ec_blocks.total_ec_codewords()
    }

    /// Check the declaration is internally consistent
    pub fn validate(&self) -> Result<()> {
        if self.data_region_rows == 0 || self.data_region_columns == 0 {
            return Err(DecodeError::geometry(format!(
                "version {} declares an empty data region",
                self.number
            )));
        }
        let (region_rows, region_columns) = self.data_regions();
        if region_rows * (self.data_region_rows + 2) != self.symbol_rows
            || region_columns * (self.data_region_columns + 2) != self.symbol_columns
        {
            return Err(DecodeError::geometry(format!(
                "version {}: {}x{} symbol is not a whole number of {}x{} bordered regions",
                self.number,
                self.symbol_rows,
                self.symbol_columns,
                self.data_region_rows,
                self.data_region_columns
            )));
        }
        let capacity = self.mapping_rows() * self.mapping_columns() / 8;
        if self.total_codewords() == 0 || self.total_codewords() > capacity {
            return Err(DecodeError::geometry(format!(
                "version {}: {} codewords do not fit {} module bytes",
                self.number,
                self.total_codewords(),
                capacity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smallest_square_version() {
        let v = SymbolVersion::from_number(1).unwrap();
        assert_eq!((v.symbol_rows, v.symbol_columns), (10, 10));
        assert_eq!((v.mapping_rows(), v.mapping_columns()), (8, 8));
        assert_eq!(v.total_codewords(), 8);
        assert_eq!(v.data_regions(), (1, 1));
    }

    #[test]
    fn test_all_builtin_versions_fill_their_mapping_matrix() {
        for v in SymbolVersion::all() {
            v.validate().unwrap();
            let modules = v.mapping_rows() * v.mapping_columns();
            // Leftover modules (at most 4) are the fixed bottom-right filler.
            assert!(modules - v.total_codewords() * 8 <= 4, "version {}", v.number);
        }
    }

    #[test]
    fn test_lookup_by_dimensions() {
        let v = SymbolVersion::for_dimensions(16, 48).unwrap();
        assert_eq!(v.number, 30);
        assert_eq!(v.data_regions(), (1, 2));
        assert!(SymbolVersion::for_dimensions(11, 11).is_err());
        assert!(SymbolVersion::from_number(31).is_err());
    }

    #[test]
    fn test_large_version_blocks() {
        let v = SymbolVersion::for_dimensions(144, 144).unwrap();
        assert_eq!(v.ec_blocks.num_blocks(), 10);
        assert_eq!(v.total_codewords(), 2178);
        assert_eq!(v.data_regions(), (6, 6));
    }
}
