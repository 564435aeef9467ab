//! Tunable decoder parameters.
//!
//! Defaults can be overridden per process through `MATRIX_SCAN_*` /
//! `MATRIX_GRID_*` environment variables; each is read once and clamped to a
//! sane range. Explicit `with_*` setters override both.

use std::sync::OnceLock;

/// Bounds applied to `ScanConfig::max_skew_step` by the setter and the
/// environment override
const SKEW_STEP_RANGE: (f32, f32) = (0.25, 16.0);

fn parse_env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn parse_env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_env_f32(name: &str, default: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn parse_env_bool_u8(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(default)
}

/// Parameters of the perspective row scanner
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Largest change (pixels) of the boundary correction accepted from one
    /// scan line to the next. Larger observed jumps are clamped.
    pub max_skew_step: f32,
    /// Minimum number of logical rows that must produce a read
    pub min_stable_rows: usize,
    /// Largest module mismatch accepted when snapping to the nearest pattern
    pub max_pattern_mismatch: u32,
    /// Allowed disagreement between left and right indicator column counts
    pub column_count_tolerance: usize,
    /// Scan lines aimed at per logical row once the row height is known
    pub samples_per_row: usize,
    /// Pixels a codeword edge may be searched away from its prediction
    pub codeword_skew_size: i32,
    /// Rebuild the length descriptor in cell (0, 0) from the metadata
    pub repair_length_descriptor: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_skew_step: 2.0,
            min_stable_rows: 3,
            max_pattern_mismatch: 1,
            column_count_tolerance: 0,
            samples_per_row: 3,
            codeword_skew_size: 2,
            repair_length_descriptor: true,
        }
    }
}

static SCAN_CONFIG: OnceLock<ScanConfig> = OnceLock::new();

impl ScanConfig {
    /// Defaults with environment overrides applied (read once per process)
    pub fn from_env() -> Self {
        SCAN_CONFIG
            .get_or_init(|| {
                let d = ScanConfig::default();
                ScanConfig {
                    max_skew_step: parse_env_f32("MATRIX_SCAN_MAX_SKEW_STEP", d.max_skew_step)
                        .clamp(SKEW_STEP_RANGE.0, SKEW_STEP_RANGE.1),
                    min_stable_rows: parse_env_usize(
                        "MATRIX_SCAN_MIN_STABLE_ROWS",
                        d.min_stable_rows,
                    )
                    .clamp(1, 90),
                    max_pattern_mismatch: parse_env_u32(
                        "MATRIX_SCAN_MAX_PATTERN_MISMATCH",
                        d.max_pattern_mismatch,
                    )
                    .min(4),
                    column_count_tolerance: parse_env_usize(
                        "MATRIX_SCAN_COLUMN_TOLERANCE",
                        d.column_count_tolerance,
                    )
                    .min(4),
                    samples_per_row: parse_env_usize(
                        "MATRIX_SCAN_SAMPLES_PER_ROW",
                        d.samples_per_row,
                    )
                    .clamp(1, 8),
                    codeword_skew_size: d.codeword_skew_size,
                    repair_length_descriptor: parse_env_bool_u8(
                        "MATRIX_SCAN_REPAIR_LENGTH",
                        d.repair_length_descriptor,
                    ),
                }
            })
            .clone()
    }

    /// Set the per-line skew clamp, bounded to 0.25..=16 px.
    ///
    /// NaN leaves the current value in place.
    pub fn with_max_skew_step(mut self, pixels: f32) -> Self {
        if !pixels.is_nan() {
            self.max_skew_step = pixels.clamp(SKEW_STEP_RANGE.0, SKEW_STEP_RANGE.1);
        }
        self
    }

    /// Set the minimum number of rows that must be read
    pub fn with_min_stable_rows(mut self, rows: usize) -> Self {
        self.min_stable_rows = rows;
        self
    }

    /// Set the pattern snapping limit
    pub fn with_max_pattern_mismatch(mut self, modules: u32) -> Self {
        self.max_pattern_mismatch = modules;
        self
    }

    /// Set the indicator column count tolerance
    pub fn with_column_count_tolerance(mut self, columns: usize) -> Self {
        self.column_count_tolerance = columns;
        self
    }

    /// Set the scan density
    pub fn with_samples_per_row(mut self, samples: usize) -> Self {
        self.samples_per_row = samples.max(1);
        self
    }

    /// Enable or disable length descriptor repair
    pub fn with_length_descriptor_repair(mut self, enabled: bool) -> Self {
        self.repair_length_descriptor = enabled;
        self
    }
}

/// Parameters of the fixed-grid parser
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Fraction of border modules per region allowed to disagree with the
    /// expected finder/clock pattern
    pub marker_tolerance: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            marker_tolerance: 0.25,
        }
    }
}

static GRID_CONFIG: OnceLock<GridConfig> = OnceLock::new();

impl GridConfig {
    /// Defaults with environment overrides applied (read once per process)
    pub fn from_env() -> Self {
        GRID_CONFIG
            .get_or_init(|| GridConfig {
                marker_tolerance: parse_env_f32(
                    "MATRIX_GRID_MARKER_TOLERANCE",
                    GridConfig::default().marker_tolerance,
                )
                .clamp(0.0, 0.5),
            })
            .clone()
    }

    /// Set the border mismatch tolerance
    pub fn with_marker_tolerance(mut self, fraction: f32) -> Self {
        self.marker_tolerance = fraction;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_override_defaults() {
        let c = ScanConfig::default()
            .with_max_skew_step(0.5)
            .with_samples_per_row(0)
            .with_length_descriptor_repair(false);
        assert_eq!(c.max_skew_step, 0.5);
        assert_eq!(c.samples_per_row, 1);
        assert!(!c.repair_length_descriptor);
        assert_eq!(c.min_stable_rows, 3);

        let g = GridConfig::default().with_marker_tolerance(0.0);
        assert_eq!(g.marker_tolerance, 0.0);
    }

    #[test]
    fn test_skew_step_setter_stays_in_range() {
        let c = ScanConfig::default();
        assert_eq!(c.clone().with_max_skew_step(-1.0).max_skew_step, 0.25);
        assert_eq!(c.clone().with_max_skew_step(0.0).max_skew_step, 0.25);
        assert_eq!(c.clone().with_max_skew_step(100.0).max_skew_step, 16.0);
        assert_eq!(c.clone().with_max_skew_step(f32::INFINITY).max_skew_step, 16.0);
        assert_eq!(c.with_max_skew_step(f32::NAN).max_skew_step, 2.0);
    }

    #[test]
    fn test_env_parsers_fall_back_on_garbage() {
        assert_eq!(parse_env_usize("MATRIX_SCAN_TEST_UNSET_VARIABLE", 7), 7);
        assert_eq!(parse_env_f32("MATRIX_SCAN_TEST_UNSET_VARIABLE", 1.5), 1.5);
        assert!(parse_env_bool_u8("MATRIX_SCAN_TEST_UNSET_VARIABLE", true));
    }
}
