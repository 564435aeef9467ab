use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_matrix_scan::decoder::{ModuleGrid, data_blocks};
use rust_matrix_scan::models::SymbolVersion;
use rust_matrix_scan::tools::synth::{render_module_grid, scale_matrix};

fn fixture(number: u8) -> (rust_matrix_scan::BitMatrix, SymbolVersion) {
    let version = SymbolVersion::from_number(number).expect("known version");
    let codewords: Vec<u8> = (0..version.total_codewords()).map(|i| (i * 31) as u8).collect();
    let symbol = render_module_grid(&version, &codewords).expect("fixture renders");
    (symbol, version)
}

fn bench_read_codewords(c: &mut Criterion) {
    for number in [1u8, 10, 24] {
        let (symbol, version) = fixture(number);
        let name = format!("module_grid_v{}_{}x{}", number, version.symbol_rows, version.symbol_columns);
        c.bench_function(&name, |b| {
            b.iter(|| {
                let grid = ModuleGrid::new(black_box(&symbol), version.clone()).expect("parses");
                grid.read_codewords().expect("reads")
            })
        });
    }
}

fn bench_sampled_image(c: &mut Criterion) {
    let (symbol, version) = fixture(8);
    let (image, corners) = scale_matrix(&symbol, 6, 24);
    c.bench_function("module_grid_from_image_v8", |b| {
        b.iter(|| {
            let grid = ModuleGrid::from_image(black_box(&image), &corners, version.clone()).expect("samples");
            grid.read_codewords().expect("reads")
        })
    });
}

fn bench_data_blocks(c: &mut Criterion) {
    let version = SymbolVersion::from_number(24).expect("known version");
    let raw: Vec<u8> = (0..version.total_codewords()).map(|i| i as u8).collect();
    c.bench_function("data_blocks_144x144", |b| {
        b.iter(|| data_blocks(black_box(&raw), &version).expect("splits"))
    });
}

criterion_group!(benches, bench_read_codewords, bench_sampled_image, bench_data_blocks);
criterion_main!(benches);
