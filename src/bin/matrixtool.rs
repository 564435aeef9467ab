use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rust_matrix_scan::decoder::{ScanDecoder, SymbolMetadata};
use rust_matrix_scan::models::{Corners, ResultPoint, SymbolVersion};
use rust_matrix_scan::tools::synth::{StackedOptions, StackedSymbol, render_module_grid, render_stacked, scale_matrix};
use rust_matrix_scan::tools::{binary_stats, load_bit_matrix, save_bit_matrix};
use rust_matrix_scan::{DecodeHints, SymbolDecoder};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "matrixtool", version, about = "Module grid and row scan debugging tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read a fixed-grid symbol from a binarized image
    Grid {
        #[arg(long)]
        image: PathBuf,
        /// Symbol version; resolved from the image size when omitted
        #[arg(long)]
        version: Option<u8>,
        /// Corner file (TL, BL, TR, BR as "x y" pairs) for camera-space images
        #[arg(long)]
        points: Option<PathBuf>,
    },
    /// Scan a stacked symbol between four corners
    Scan {
        #[arg(long)]
        image: PathBuf,
        /// Corner file (TL, BL, TR, BR as "x y" pairs)
        #[arg(long)]
        points: PathBuf,
        #[arg(long, default_value_t = 17.0)]
        min_width: f32,
        #[arg(long, default_value_t = 136.0)]
        max_width: f32,
    },
    /// Write a synthetic symbol as an image
    Synth {
        #[command(subcommand)]
        kind: SynthKind,
    },
}

#[derive(Subcommand)]
enum SynthKind {
    /// Fixed-grid symbol with a counting codeword sequence
    Grid {
        #[arg(long)]
        version: u8,
        #[arg(long, default_value_t = 4)]
        module_px: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Stacked symbol with pseudo-random codewords
    Stacked {
        #[arg(long, default_value_t = 9)]
        rows: usize,
        #[arg(long, default_value_t = 3)]
        columns: usize,
        #[arg(long, default_value_t = 2)]
        ec_level: u8,
        #[arg(long, default_value_t = 2)]
        module_px: usize,
        #[arg(long, default_value_t = 0.0)]
        shear: f32,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("MATRIX_SCAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Grid {
            image,
            version,
            points,
        } => grid_cmd(&image, version, points.as_deref()),
        Command::Scan {
            image,
            points,
            min_width,
            max_width,
        } => scan_cmd(&image, &points, min_width, max_width),
        Command::Synth { kind } => synth_cmd(kind),
    }
}

fn grid_cmd(image: &Path, version: Option<u8>, points: Option<&Path>) -> Result<()> {
    let matrix = load_bit_matrix(image).with_context(|| format!("loading {}", image.display()))?;
    print_image_summary(image, &matrix);

    let hints = DecodeHints {
        version: version.map(SymbolVersion::from_number).transpose()?,
        corners: points.map(read_corners).transpose()?,
        codeword_width: None,
    };
    let start = Instant::now();
    let result = SymbolDecoder::ModuleGrid.try_decode(&matrix, &hints)?;
    let elapsed = start.elapsed();

    if let Some(v) = &result.version {
        println!(
            "Version {}: {}x{} symbol, {} codewords",
            v.number,
            v.symbol_rows,
            v.symbol_columns,
            v.total_codewords()
        );
    }
    let hex: Vec<String> = result
        .codewords
        .codewords
        .iter()
        .map(|c| format!("{:02x}", c))
        .collect();
    println!("Codewords: {}", hex.join(" "));
    println!("Decoded in {:.2?}", elapsed);
    Ok(())
}

fn scan_cmd(image: &Path, points: &Path, min_width: f32, max_width: f32) -> Result<()> {
    let matrix = load_bit_matrix(image).with_context(|| format!("loading {}", image.display()))?;
    print_image_summary(image, &matrix);
    let corners = read_corners(points)?;

    let start = Instant::now();
    let result = ScanDecoder::new().decode_corners(&matrix, &corners, min_width, max_width)?;
    let elapsed = start.elapsed();

    let meta = result.metadata;
    println!(
        "Symbol: {} rows x {} columns, EC level {}",
        meta.rows, meta.columns, meta.ec_level
    );
    for (r, row) in result.codewords.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .map(|cw| match cw {
                Some(cw) => format!("{:3}", cw.value),
                None => "  ?".to_string(),
            })
            .collect();
        println!("  row {:2}: {}", r, cells.join(" "));
    }
    let d = &result.diagnostics;
    println!(
        "Skew correction: left {:.2} px, right {:.2} px ({} clamped)",
        d.left_correction, d.right_correction, d.clamped_adjustments
    );
    println!(
        "Codeword width {:.2} px, mean penalty {:.3}, {} lines, {} erasures",
        d.codeword_width,
        d.mean_penalty,
        d.lines_scanned,
        result.erasures().len()
    );
    println!("Decoded in {:.2?}", elapsed);
    Ok(())
}

fn synth_cmd(kind: SynthKind) -> Result<()> {
    match kind {
        SynthKind::Grid {
            version,
            module_px,
            out,
        } => {
            let version = SymbolVersion::from_number(version)?;
            let codewords: Vec<u8> = (0..version.total_codewords()).map(|i| i as u8).collect();
            let symbol = render_module_grid(&version, &codewords)?;
            let (image, corners) = scale_matrix(&symbol, module_px, 4 * module_px);
            save_bit_matrix(&image, &out).with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {}", out.display());
            print_corners(&corners);
        }
        SynthKind::Stacked {
            rows,
            columns,
            ec_level,
            module_px,
            shear,
            seed,
            out,
        } => {
            let meta = SymbolMetadata::new(rows, columns, ec_level)?;
            let symbol = StackedSymbol::sample(meta, seed);
            let options = StackedOptions {
                module_px,
                shear,
                ..StackedOptions::default()
            };
            let render = render_stacked(&symbol, &options)?;
            save_bit_matrix(&render.image, &out).with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {} (codeword width {} px)", out.display(), render.codeword_width);
            print_corners(&render.corners);
        }
    }
    Ok(())
}

fn print_image_summary(path: &Path, matrix: &rust_matrix_scan::BitMatrix) {
    let stats = binary_stats(matrix);
    println!(
        "Image: {} ({}x{}), dark={:.2}%",
        path.display(),
        matrix.width(),
        matrix.height(),
        stats.dark_ratio * 100.0
    );
}

fn print_corners(corners: &Corners) {
    for p in corners.as_array() {
        println!("{} {}", p.x, p.y);
    }
}

fn read_corners(path: &Path) -> Result<Corners> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut vals = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for tok in line.split_whitespace() {
            vals.push(
                tok.parse::<f32>()
                    .with_context(|| format!("bad coordinate '{}' in {}", tok, path.display()))?,
            );
        }
    }
    if vals.len() != 8 {
        bail!("{} needs 4 corner points, found {} values", path.display(), vals.len());
    }
    let p = |i: usize| ResultPoint::new(vals[2 * i], vals[2 * i + 1]);
    Ok(Corners::new(p(0), p(1), p(2), p(3)))
}
