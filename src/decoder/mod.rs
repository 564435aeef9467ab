//! Symbol decoding modules
//!
//! This module contains the logic that turns a located symbol into codewords:
//! - Fixed-grid module sampling and layout decoding
//! - Perspective row scanning of stacked symbols
//! - Codeword assembly and block de-interleaving

/// Codeword flattening and error-correction block splitting
pub mod assembly;
/// Tunable parameters with environment overrides
pub mod config;
/// Fixed-grid (DataMatrix-style) module parser
pub mod module_grid;
/// Stacked (PDF417-style) perspective row scanner
pub mod scan;
/// Fixed-grid symbol size table
pub(crate) mod tables;

pub use assembly::{AssembledCodewords, DataBlock, data_blocks};
pub use config::{GridConfig, ScanConfig};
pub use module_grid::{GridSampler, ModuleGrid};
pub use scan::{ScanDecoder, ScanDiagnostics, ScanResult, SymbolMetadata};
