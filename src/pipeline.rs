//! Decoder dispatch: one capability over a closed set of symbologies.
//!
//! A caller holding one detection tries an ordered list of [`SymbolDecoder`]
//! variants until one succeeds. Independent detections can be decoded in
//! parallel with [`decode_batch`].

use crate::decoder::{AssembledCodewords, ModuleGrid, ScanDecoder, ScanDiagnostics, SymbolMetadata};
use crate::error::{DecodeError, Result};
use crate::models::{BitMatrix, Corners, SymbolVersion};
use rayon::prelude::*;
use tracing::debug;

/// Codeword width range assumed for stacked symbols when no hint is given:
/// one to eight pixels per module.
pub const DEFAULT_CODEWORD_WIDTH: (f32, f32) = (17.0, 136.0);

/// What the detector learned about a candidate
#[derive(Debug, Clone, Default)]
pub struct DecodeHints {
    /// Known fixed-grid version; otherwise resolved from the matrix size
    pub version: Option<SymbolVersion>,
    /// Image-space corners of the symbol.
    ///
    /// Fixed-grid symbols take the outer symbol corners; stacked symbols take
    /// the corners of the codeword area.
    pub corners: Option<Corners>,
    /// Stacked codeword width range in pixels
    pub codeword_width: Option<(f32, f32)>,
}

impl DecodeHints {
    /// Hints with corners only
    pub fn with_corners(corners: Corners) -> Self {
        Self {
            corners: Some(corners),
            ..Self::default()
        }
    }
}

/// Decoder variants, tried in caller order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolDecoder {
    /// Fixed-grid symbols read module by module
    ModuleGrid,
    /// Stacked symbols read by scanning rows between corners
    Scan,
}

/// Codewords from one successful decode
#[derive(Debug, Clone)]
pub struct DecoderResult {
    /// Variant that produced the result
    pub decoder: SymbolDecoder,
    /// Ordered codewords and erasures, ready for error correction
    pub codewords: AssembledCodewords,
    /// Fixed-grid version, when the module grid decoded
    pub version: Option<SymbolVersion>,
    /// Stacked symbol structure, when the scanner decoded
    pub metadata: Option<SymbolMetadata>,
    /// Scan figures, when the scanner decoded
    pub diagnostics: Option<ScanDiagnostics>,
}

impl SymbolDecoder {
    /// Every variant in the default trial order
    pub const ALL: [SymbolDecoder; 2] = [SymbolDecoder::ModuleGrid, SymbolDecoder::Scan];

    /// Attempt to decode `matrix` as this symbology
    pub fn try_decode(&self, matrix: &BitMatrix, hints: &DecodeHints) -> Result<DecoderResult> {
        match self {
            SymbolDecoder::ModuleGrid => decode_module_grid(matrix, hints),
            SymbolDecoder::Scan => decode_scan(matrix, hints),
        }
    }
}

fn decode_module_grid(matrix: &BitMatrix, hints: &DecodeHints) -> Result<DecoderResult> {
    let grid = match (&hints.corners, &hints.version) {
        (Some(corners), Some(version)) => ModuleGrid::from_image(matrix, corners, version.clone())?,
        (Some(_), None) => {
            return Err(DecodeError::format(
                "sampling through corners needs a version hint",
            ));
        }
        (None, Some(version)) => ModuleGrid::new(matrix, version.clone())?,
        (None, None) => ModuleGrid::from_dimensions(matrix)?,
    };
    let bytes = grid.read_codewords()?;
    Ok(DecoderResult {
        decoder: SymbolDecoder::ModuleGrid,
        codewords: AssembledCodewords::from_bytes(&bytes),
        version: Some(grid.version().clone()),
        metadata: None,
        diagnostics: None,
    })
}

fn decode_scan(matrix: &BitMatrix, hints: &DecodeHints) -> Result<DecoderResult> {
    let corners = hints
        .corners
        .as_ref()
        .ok_or_else(|| DecodeError::geometry("stacked symbols need corner points"))?;
    let (min_width, max_width) = hints.codeword_width.unwrap_or(DEFAULT_CODEWORD_WIDTH);
    let result = ScanDecoder::new().decode_corners(matrix, corners, min_width, max_width)?;
    Ok(DecoderResult {
        decoder: SymbolDecoder::Scan,
        codewords: result.assemble(),
        version: None,
        metadata: Some(result.metadata),
        diagnostics: Some(result.diagnostics),
    })
}

/// Try `decoders` in order and return the first success.
///
/// When every variant fails, the last failure is returned. An empty list is a
/// detection error.
pub fn decode_first(
    decoders: &[SymbolDecoder],
    matrix: &BitMatrix,
    hints: &DecodeHints,
) -> Result<DecoderResult> {
    let mut last = DecodeError::detection("no decoder variants given");
    for decoder in decoders {
        match decoder.try_decode(matrix, hints) {
            Ok(result) => return Ok(result),
            Err(e) => {
                debug!(?decoder, error = %e, "decoder variant failed");
                last = e;
            }
        }
    }
    Err(last)
}

/// Decode independent candidates in parallel, one result per candidate
pub fn decode_batch(
    decoders: &[SymbolDecoder],
    candidates: &[(BitMatrix, DecodeHints)],
) -> Vec<Result<DecoderResult>> {
    candidates
        .par_iter()
        .map(|(matrix, hints)| decode_first(decoders, matrix, hints))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::tools::synth::{StackedOptions, StackedSymbol, render_module_grid, render_stacked, scale_matrix};

    fn grid_symbol(number: u8) -> (BitMatrix, Vec<u8>, SymbolVersion) {
        let version = SymbolVersion::from_number(number).unwrap();
        let codewords: Vec<u8> = (0..version.total_codewords()).map(|i| (i * 7 + 1) as u8).collect();
        let symbol = render_module_grid(&version, &codewords).unwrap();
        (symbol, codewords, version)
    }

    #[test]
    fn test_module_grid_from_dimensions() {
        let (symbol, codewords, _) = grid_symbol(5);
        let result = SymbolDecoder::ModuleGrid
            .try_decode(&symbol, &DecodeHints::default())
            .unwrap();
        assert_eq!(result.decoder, SymbolDecoder::ModuleGrid);
        assert_eq!(result.version.map(|v| v.number), Some(5));
        let bytes: Vec<u8> = result.codewords.codewords.iter().map(|&c| c as u8).collect();
        assert_eq!(bytes, codewords);
        assert!(result.codewords.erasures.is_empty());
    }

    #[test]
    fn test_module_grid_through_corners_needs_version() {
        let (symbol, codewords, version) = grid_symbol(2);
        let (image, corners) = scale_matrix(&symbol, 3, 6);
        let hints = DecodeHints::with_corners(corners);
        let err = SymbolDecoder::ModuleGrid.try_decode(&image, &hints).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Format);

        let hints = DecodeHints {
            version: Some(version),
            ..hints
        };
        let result = SymbolDecoder::ModuleGrid.try_decode(&image, &hints).unwrap();
        assert_eq!(result.codewords.len(), codewords.len());
    }

    #[test]
    fn test_decode_first_falls_through_to_scan() {
        let meta = SymbolMetadata::new(6, 2, 1).unwrap();
        let symbol = StackedSymbol::sample(meta, 5);
        let render = render_stacked(&symbol, &StackedOptions::default()).unwrap();
        let hints = DecodeHints::with_corners(render.corners);

        let result = decode_first(&SymbolDecoder::ALL, &render.image, &hints).unwrap();
        assert_eq!(result.decoder, SymbolDecoder::Scan);
        assert_eq!(result.metadata, Some(meta));
        assert!(result.diagnostics.is_some());
        assert_eq!(result.codewords.codewords, symbol.codewords());
    }

    #[test]
    fn test_decode_first_reports_last_failure() {
        let blank = BitMatrix::new(40, 40);
        let err = decode_first(&SymbolDecoder::ALL, &blank, &DecodeHints::default()).unwrap_err();
        // The scanner runs last and has no corners to work from.
        assert_eq!(err.kind(), DecodeErrorKind::Geometry);

        let err = decode_first(&[], &blank, &DecodeHints::default()).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Detection);
    }

    #[test]
    fn test_decode_batch_keeps_candidate_order() {
        let candidates: Vec<(BitMatrix, DecodeHints)> = [1u8, 3, 10]
            .iter()
            .map(|&n| (grid_symbol(n).0, DecodeHints::default()))
            .chain(std::iter::once((BitMatrix::new(7, 7), DecodeHints::default())))
            .collect();
        let results = decode_batch(&[SymbolDecoder::ModuleGrid], &candidates);
        assert_eq!(results.len(), 4);
        let numbers: Vec<Option<u8>> = results
            .iter()
            .map(|r| r.as_ref().ok().and_then(|d| d.version.as_ref()).map(|v| v.number))
            .collect();
        assert_eq!(numbers, vec![Some(1), Some(3), Some(10), None]);
    }
}
