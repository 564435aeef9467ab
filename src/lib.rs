//! rust_matrix_scan - module sampling and row scanning for 2D barcodes
//!
//! Turns a located symbol in an already binarized image into an ordered
//! codeword sequence for error correction:
//! - fixed-grid (DataMatrix-style) symbols through [`ModuleGrid`]
//! - stacked (PDF417-style) symbols through [`ScanDecoder`], with skew
//!   tracking between four corner points and erasure marking
//!
//! Binarization, corner detection, error correction and payload
//! interpretation are left to the caller.
//!
//! The crate logs through `tracing` and never installs a subscriber.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Symbol decoding: module grid, row scanner, codeword assembly
pub mod decoder;
/// Error types
pub mod error;
/// Core data structures (BitMatrix, points, versions, codewords)
pub mod models;
/// Decoder dispatch over symbologies
pub mod pipeline;
/// Image IO and synthetic fixtures
pub mod tools;
/// Geometry helpers
pub mod utils;

pub use decoder::{
    AssembledCodewords, GridConfig, ModuleGrid, ScanConfig, ScanDecoder, ScanDiagnostics, ScanResult,
    SymbolMetadata,
};
pub use error::{DecodeError, DecodeErrorKind, Result};
pub use models::{BitMatrix, Codeword, Corners, ResultPoint, SymbolVersion};
pub use pipeline::{DecodeHints, DecoderResult, SymbolDecoder, decode_batch, decode_first};

/// Decode a fixed-grid symbol matrix whose size identifies its version.
///
/// Shorthand for [`ModuleGrid::from_dimensions`] followed by
/// [`ModuleGrid::read_codewords`].
pub fn read_module_grid(matrix: &BitMatrix) -> Result<Vec<u8>> {
    ModuleGrid::from_dimensions(matrix)?.read_codewords()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::synth::render_module_grid;

    #[test]
    fn test_read_module_grid() {
        let version = SymbolVersion::from_number(1).unwrap();
        let codewords = [1, 2, 3, 4, 5, 6, 7, 8];
        let symbol = render_module_grid(&version, &codewords).unwrap();
        assert_eq!(read_module_grid(&symbol).unwrap(), codewords);
    }

    #[test]
    fn test_read_module_grid_rejects_unknown_size() {
        let err = read_module_grid(&BitMatrix::new(9, 9)).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Format);
    }
}
