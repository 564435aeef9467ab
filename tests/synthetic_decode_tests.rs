//! End-to-end decoding of synthetic symbols through the public API.
//!
//! Fixtures are rendered by `tools::synth`, optionally written to PNG and
//! read back, then decoded through the dispatch layer.

use proptest::prelude::*;
use rust_matrix_scan::decoder::{ScanConfig, data_blocks};
use rust_matrix_scan::tools::synth::{
    StackedOptions, StackedSymbol, render_module_grid, render_stacked, scale_matrix,
};
use rust_matrix_scan::tools::{load_bit_matrix, save_bit_matrix};
use rust_matrix_scan::{
    DecodeErrorKind, DecodeHints, ScanDecoder, SymbolDecoder, SymbolMetadata, SymbolVersion, decode_batch,
    decode_first,
};
use std::path::PathBuf;

fn temp_png(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rust_matrix_scan_{}_{}.png", name, std::process::id()))
}

#[test]
fn module_grid_survives_png_round_trip() {
    let version = SymbolVersion::from_number(12).unwrap();
    let codewords: Vec<u8> = (0..version.total_codewords()).map(|i| (i * 43 + 9) as u8).collect();
    let symbol = render_module_grid(&version, &codewords).unwrap();
    let (image, corners) = scale_matrix(&symbol, 5, 20);

    let path = temp_png("grid");
    save_bit_matrix(&image, &path).unwrap();
    let loaded = load_bit_matrix(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, image);

    let hints = DecodeHints {
        version: Some(version.clone()),
        corners: Some(corners),
        codeword_width: None,
    };
    let result = decode_first(&SymbolDecoder::ALL, &loaded, &hints).unwrap();
    assert_eq!(result.decoder, SymbolDecoder::ModuleGrid);
    let bytes: Vec<u8> = result.codewords.codewords.iter().map(|&c| c as u8).collect();
    assert_eq!(bytes, codewords);

    let blocks = data_blocks(&bytes, &version).unwrap();
    let total: usize = blocks.iter().map(|b| b.codewords.len()).sum();
    assert_eq!(total, version.total_codewords());
}

#[test]
fn stacked_symbol_survives_png_round_trip() {
    let meta = SymbolMetadata::new(12, 4, 3).unwrap();
    let symbol = StackedSymbol::sample(meta, 99);
    let options = StackedOptions {
        module_px: 3,
        shear: 0.1,
        ..StackedOptions::default()
    };
    let render = render_stacked(&symbol, &options).unwrap();

    let path = temp_png("stacked");
    save_bit_matrix(&render.image, &path).unwrap();
    let loaded = load_bit_matrix(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let hints = DecodeHints::with_corners(render.corners);
    let result = SymbolDecoder::Scan.try_decode(&loaded, &hints).unwrap();
    assert_eq!(result.metadata, Some(meta));
    assert_eq!(result.codewords.codewords, symbol.codewords());
    assert!(result.codewords.erasures.is_empty());
    let heights = result.codewords.row_heights.unwrap();
    assert_eq!(heights.len(), 12);
    assert!(heights[..11].iter().all(|&h| h == 9), "{:?}", heights);
}

#[test]
fn corrupted_rows_are_reported_as_erasures() {
    let meta = SymbolMetadata::new(9, 3, 2).unwrap();
    let symbol = StackedSymbol::sample(meta, 3);
    let options = StackedOptions {
        corrupt_rows: vec![4, 7],
        ..StackedOptions::default()
    };
    let render = render_stacked(&symbol, &options).unwrap();
    let result = ScanDecoder::with_config(ScanConfig::default())
        .decode_corners(&render.image, &render.corners, 27.0, 41.0)
        .unwrap();
    assert_eq!(result.erasures(), vec![12, 13, 14, 21, 22, 23]);
    let assembled = result.assemble();
    for index in 0..27 {
        if !assembled.is_erasure(index) {
            assert_eq!(assembled.codewords[index], symbol.codewords()[index]);
        }
    }
}

#[test]
fn batch_decodes_mixed_candidates() {
    let version = SymbolVersion::from_number(3).unwrap();
    let grid = render_module_grid(&version, &vec![0x3C; version.total_codewords()]).unwrap();

    let meta = SymbolMetadata::new(6, 2, 1).unwrap();
    let stacked = render_stacked(&StackedSymbol::sample(meta, 11), &StackedOptions::default()).unwrap();

    let candidates = vec![
        (grid, DecodeHints::default()),
        (stacked.image, DecodeHints::with_corners(stacked.corners)),
        (
            rust_matrix_scan::BitMatrix::new(50, 50),
            DecodeHints::with_corners(stacked.corners),
        ),
    ];
    let results = decode_batch(&SymbolDecoder::ALL, &candidates);
    assert_eq!(results[0].as_ref().unwrap().decoder, SymbolDecoder::ModuleGrid);
    assert_eq!(results[1].as_ref().unwrap().decoder, SymbolDecoder::Scan);
    assert_eq!(results[2].as_ref().unwrap_err().kind(), DecodeErrorKind::Detection);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_stacked_symbols_decode_exactly(
        rows in 3usize..16,
        columns in 1usize..7,
        ec_level in 0u8..4,
        seed in any::<u64>(),
        shear in prop::sample::select(vec![0.0f32, 0.1, -0.15, 0.3, -0.3]),
    ) {
        let meta = SymbolMetadata::new(rows, columns, ec_level).unwrap();
        let symbol = StackedSymbol::sample(meta, seed);
        let options = StackedOptions { shear, ..StackedOptions::default() };
        let render = render_stacked(&symbol, &options).unwrap();
        let w = render.codeword_width;
        let result = ScanDecoder::with_config(ScanConfig::default())
            .decode_corners(&render.image, &render.corners, 0.8 * w, 1.2 * w)
            .unwrap();
        prop_assert_eq!(result.metadata, meta);
        let expected: Vec<Option<u16>> = symbol.codewords().iter().map(|&v| Some(v)).collect();
        prop_assert_eq!(result.values(), expected);
    }
}
