//! Flattening of decoded codeword matrices into the sequence handed to error
//! correction, and de-interleaving of fixed-grid streams into blocks.

use crate::decoder::tables::SPLIT_BLOCK_VERSION;
use crate::error::{DecodeError, Result};
use crate::models::SymbolVersion;

/// Ordered codewords plus the positions that carry no reliable value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssembledCodewords {
    /// Codeword values in row-major order; erasures hold 0
    pub codewords: Vec<u16>,
    /// Sorted indices into `codewords` that are erasures
    pub erasures: Vec<usize>,
    /// Logical rows
    pub rows: usize,
    /// Codewords per row
    pub columns: usize,
    /// Pixel height of each row, when the source measured it
    pub row_heights: Option<Vec<usize>>,
}

impl AssembledCodewords {
    /// Flatten rows then columns. `None` cells become erasures.
    ///
    /// Rows shorter than the longest row are padded with erasures so every
    /// index of the `rows x columns` grid is accounted for.
    pub fn from_rows(rows: &[Vec<Option<u16>>], row_heights: Option<Vec<usize>>) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut codewords = Vec::with_capacity(rows.len() * columns);
        let mut erasures = Vec::new();
        for row in rows {
            for column in 0..columns {
                match row.get(column).copied().flatten() {
                    Some(value) => codewords.push(value),
                    None => {
                        erasures.push(codewords.len());
                        codewords.push(0);
                    }
                }
            }
        }
        Self {
            codewords,
            erasures,
            rows: rows.len(),
            columns,
            row_heights,
        }
    }

    /// Codewords read by the fixed-grid parser: one row, no erasures
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            codewords: bytes.iter().map(|&b| b as u16).collect(),
            erasures: Vec::new(),
            rows: 1,
            columns: bytes.len(),
            row_heights: None,
        }
    }

    /// Number of codewords, erasures included
    pub fn len(&self) -> usize {
        self.codewords.len()
    }

    /// Whether no codewords were assembled
    pub fn is_empty(&self) -> bool {
        self.codewords.is_empty()
    }

    /// Whether position `index` is an erasure
    pub fn is_erasure(&self, index: usize) -> bool {
        self.erasures.binary_search(&index).is_ok()
    }
}

/// One error-correction block of a fixed-grid symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    /// Number of leading data codewords in `codewords`
    pub num_data_codewords: usize,
    /// Data codewords followed by error-correction codewords
    pub codewords: Vec<u8>,
}

/// Split an interleaved codeword stream into its error-correction blocks.
///
/// Codewords are dealt round-robin across blocks: data first, then error
/// correction. All blocks share one data length except in the 144x144
/// symbol, where only the first eight blocks carry the longer one and the
/// error-correction stream starts at block 8.
pub fn data_blocks(raw: &[u8], version: &SymbolVersion) -> Result<Vec<DataBlock>> {
    if raw.len() != version.total_codewords() {
        return Err(DecodeError::format(format!(
            "{} codewords for version {} which holds {}",
            raw.len(),
            version.number,
            version.total_codewords()
        )));
    }

    let ec_codewords = version.ec_blocks.ec_codewords;
    let mut blocks: Vec<DataBlock> = version
        .ec_blocks
        .blocks
        .iter()
        .flat_map(|group| {
            (0..group.count).map(move |_| DataBlock {
                num_data_codewords: group.data_codewords,
                codewords: vec![0; group.data_codewords + ec_codewords],
            })
        })
        .collect();
    let total_blocks = blocks.len();
    let longer = blocks.first().map_or(0, |b| b.num_data_codewords);
    if longer == 0 {
        return Err(DecodeError::format(format!(
            "version {} declares no data blocks",
            version.number
        )));
    }
    let special = version.number == SPLIT_BLOCK_VERSION;

    let mut stream = raw.iter().copied();
    let mut put = |blocks: &mut Vec<DataBlock>, block: usize, index: usize| -> Result<()> {
        let value = stream
            .next()
            .ok_or_else(|| DecodeError::format("codeword stream ended early"))?;
        let slot = blocks
            .get_mut(block)
            .and_then(|b| b.codewords.get_mut(index))
            .ok_or_else(|| {
                DecodeError::format(format!(
                    "block structure of version {} is inconsistent",
                    version.number
                ))
            })?;
        *slot = value;
        Ok(())
    };

    for i in 0..longer - 1 {
        for j in 0..total_blocks {
            put(&mut blocks, j, i)?;
        }
    }
    let longer_blocks = if special { 8 } else { total_blocks };
    for j in 0..longer_blocks {
        put(&mut blocks, j, longer - 1)?;
    }
    for i in longer..longer + ec_codewords {
        for j in 0..total_blocks {
            let block = if special { (j + 8) % total_blocks } else { j };
            let index = if special && block > 7 { i - 1 } else { i };
            put(&mut blocks, block, index)?;
        }
    }
    Ok(blocks)
}
