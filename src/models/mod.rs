/// Scanned codewords and per-cell value voting
pub mod codeword;
/// Packed bit matrix with checked access
pub mod matrix;
/// Image-space points and symbol corners
pub mod point;
/// Fixed-grid symbol versions and block structure
pub mod version;

pub use codeword::{Codeword, VoteCell};
pub use matrix::BitMatrix;
pub use point::{Corners, ResultPoint};
pub use version::{EcBlock, EcBlocks, SymbolVersion};
