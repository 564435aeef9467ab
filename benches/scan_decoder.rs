use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_matrix_scan::decoder::{ScanConfig, ScanDecoder, SymbolMetadata};
use rust_matrix_scan::tools::synth::{StackedOptions, StackedRender, StackedSymbol, render_stacked};

fn fixture(rows: usize, columns: usize, options: StackedOptions) -> StackedRender {
    let meta = SymbolMetadata::new(rows, columns, 2).expect("valid metadata");
    let symbol = StackedSymbol::sample(meta, 42);
    render_stacked(&symbol, &options).expect("fixture renders")
}

fn bench_scan(c: &mut Criterion) {
    let decoder = ScanDecoder::with_config(ScanConfig::default());
    let cases = [
        ("scan_9x3_aligned", fixture(9, 3, StackedOptions::default())),
        (
            "scan_30x8_sheared",
            fixture(
                30,
                8,
                StackedOptions {
                    module_px: 3,
                    shear: 0.2,
                    ..StackedOptions::default()
                },
            ),
        ),
    ];
    for (name, render) in &cases {
        let w = render.codeword_width;
        c.bench_function(name, |b| {
            b.iter(|| {
                decoder
                    .decode_corners(black_box(&render.image), &render.corners, 0.8 * w, 1.2 * w)
                    .expect("decodes")
            })
        });
    }
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
