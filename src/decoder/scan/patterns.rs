//! Codeword bar/space pattern tables for the stacked symbology.
//!
//! A codeword is 17 modules wide: four bars and four spaces, each 1..=6
//! modules, starting with a bar. Its bucket is `(b1 - b2 + b3 - b4 + 9) % 9`
//! over the bar widths and must be 0, 3 or 6. Each bucket carries the 929
//! published PDF417 patterns of its cluster, indexed by codeword value.

use std::collections::HashMap;
use std::sync::OnceLock;

mod table;

use table::CODEWORD_SIGNATURES;

/// Modules per codeword
pub const MODULES_PER_CODEWORD: u32 = 17;
/// Distinct codeword values per bucket
pub const CODEWORD_VALUES: usize = 929;
/// Element widths of the start pattern (bar first)
pub const START_PATTERN: [u8; 8] = [8, 1, 1, 1, 1, 1, 1, 3];
/// Element widths of the stop pattern (bar first)
pub const STOP_PATTERN: [u8; 9] = [7, 1, 1, 3, 1, 1, 1, 2, 1];

/// Element widths of one codeword, bar first
pub type Elements = [u8; 8];

static LOOKUP: OnceLock<HashMap<u32, (u8, u16)>> = OnceLock::new();

fn lookup_table() -> &'static HashMap<u32, (u8, u16)> {
    LOOKUP.get_or_init(|| {
        let mut lookup = HashMap::with_capacity(3 * CODEWORD_VALUES);
        for (bucket_index, list) in CODEWORD_SIGNATURES.iter().enumerate() {
            for (value, &sig) in list.iter().enumerate() {
                lookup.insert(sig, (bucket_index as u8 * 3, value as u16));
            }
        }
        lookup
    })
}

fn bucket_signatures(bucket: u8) -> Option<&'static [u32; CODEWORD_VALUES]> {
    if bucket % 3 != 0 || bucket > 6 {
        return None;
    }
    Some(&CODEWORD_SIGNATURES[bucket as usize / 3])
}

/// Element widths encoded by a 17-module signature
fn elements_of(signature: u32) -> Elements {
    let mut elements = [0u8; 8];
    let mut index = 0;
    let mut dark = true;
    for module in (0..MODULES_PER_CODEWORD).rev() {
        let bit = (signature >> module) & 1 == 1;
        if bit != dark {
            index += 1;
            dark = bit;
        }
        elements[index] += 1;
    }
    elements
}

/// Bucket of an element tuple, or `None` when it is not 0, 3 or 6
pub fn bucket_of(elements: &Elements) -> Option<u8> {
    let b = elements[0] as i32 - elements[2] as i32 + elements[4] as i32 - elements[6] as i32 + 9;
    match b.rem_euclid(9) {
        b @ (0 | 3 | 6) => Some(b as u8),
        _ => None,
    }
}

/// 17-bit module signature of normalised element widths, first module in the
/// most significant bit. Dark modules are ones.
pub fn signature(elements: &Elements) -> u32 {
    let mut sig = 0u32;
    for (i, &width) in elements.iter().enumerate() {
        for _ in 0..width {
            sig = (sig << 1) | (i % 2 == 0) as u32;
        }
    }
    sig
}

/// Bucket used by logical row `row`
pub fn bucket_for_row(row: usize) -> u8 {
    (row % 3) as u8 * 3
}

/// Element widths of codeword `value` in `bucket` (0, 3 or 6)
pub fn pattern_for(bucket: u8, value: u16) -> Option<Elements> {
    bucket_signatures(bucket)?.get(value as usize).map(|&sig| elements_of(sig))
}

/// Exact signature lookup: `(bucket, value)`
pub fn lookup(signature: u32) -> Option<(u8, u16)> {
    lookup_table().get(&signature).copied()
}

/// Closest pattern of `bucket` by module mismatch count.
///
/// Returns `(value, mismatches)` only when the closest pattern is within
/// `max_mismatch` and no other pattern of the bucket is equally close.
pub fn nearest_in_bucket(signature: u32, bucket: u8, max_mismatch: u32) -> Option<(u16, u32)> {
    let signatures = bucket_signatures(bucket)?;
    let mut best: Option<(u16, u32)> = None;
    let mut tied = false;
    for (value, &sig) in signatures.iter().enumerate() {
        let d = (sig ^ signature).count_ones();
        if d > max_mismatch {
            continue;
        }
        match best {
            Some((_, best_d)) if d > best_d => {}
            Some((_, best_d)) if d == best_d => tied = true,
            _ => {
                best = Some((value as u16, d));
                tied = false;
            }
        }
    }
    if tied { None } else { best }
}

/// Normalise measured run lengths to 17 modules by sampling each module centre.
pub fn sample_bit_counts(runs: &[u32; 8]) -> Elements {
    let total: u32 = runs.iter().sum();
    let mut result = [0u8; 8];
    if total == 0 {
        return result;
    }
    let mut index = 0usize;
    let mut run_end = runs[0] as f32;
    for module in 0..MODULES_PER_CODEWORD {
        let centre = (module as f32 + 0.5) * total as f32 / MODULES_PER_CODEWORD as f32;
        while centre >= run_end && index < 7 {
            index += 1;
            run_end += runs[index] as f32;
        }
        result[index] += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_bucket_is_full() {
        for bucket in [0u8, 3, 6] {
            assert!(pattern_for(bucket, 928).is_some());
            assert!(pattern_for(bucket, 929).is_none());
        }
        assert!(pattern_for(1, 0).is_none());
    }

    #[test]
    fn test_published_codewords() {
        // First and last values of each cluster.
        assert_eq!(lookup(0x1d5c0), Some((0, 0)));
        assert_eq!(pattern_for(0, 0), Some([3, 1, 1, 1, 1, 1, 3, 6]));
        assert_eq!(pattern_for(0, 928), Some([2, 1, 5, 1, 4, 1, 1, 2]));
        assert_eq!(lookup(0x1f560), Some((3, 0)));
        assert_eq!(pattern_for(3, 0), Some([5, 1, 1, 1, 1, 1, 2, 5]));
        assert_eq!(lookup(0x13f26), Some((3, 928)));
        assert_eq!(lookup(0x1abe0), Some((6, 0)));
        assert_eq!(pattern_for(6, 928), Some([3, 3, 6, 1, 1, 1, 1, 1]));
        assert_eq!(signature(&[3, 1, 1, 1, 1, 1, 3, 6]), 0x1d5c0);
    }

    #[test]
    fn test_patterns_are_well_formed_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for bucket in [0u8, 3, 6] {
            for value in 0..CODEWORD_VALUES as u16 {
                let p = pattern_for(bucket, value).unwrap();
                assert_eq!(p.iter().map(|&w| w as u32).sum::<u32>(), 17);
                assert!(p.iter().all(|&w| (1..=6).contains(&w)));
                assert_eq!(bucket_of(&p), Some(bucket));
                assert!(seen.insert(signature(&p)));
                assert_eq!(lookup(signature(&p)), Some((bucket, value)));
            }
        }
    }

    #[test]
    fn test_sample_bit_counts_scales_runs() {
        let p = pattern_for(3, 417).unwrap();
        assert_eq!(p, [2, 2, 1, 4, 3, 3, 1, 1]);
        let runs = p.map(|w| w as u32 * 3);
        assert_eq!(sample_bit_counts(&runs), p);
        // One pixel of edge noise at 3 px per module is absorbed.
        let mut noisy = runs;
        noisy[0] += 1;
        noisy[1] -= 1;
        assert_eq!(sample_bit_counts(&noisy), p);
    }

    #[test]
    fn test_nearest_in_bucket() {
        let p = pattern_for(0, 17).unwrap();
        assert_eq!(p, [4, 1, 1, 1, 2, 2, 5, 1]);
        let sig = signature(&p);
        assert_eq!(nearest_in_bucket(sig, 0, 1), Some((17, 0)));

        // Narrow the third bar by one module.
        let noisy = signature(&[4, 1, 1, 1, 1, 3, 5, 1]);
        assert_eq!((noisy ^ sig).count_ones(), 1);
        assert_eq!(lookup(noisy), None);
        assert_eq!(nearest_in_bucket(noisy, 0, 1), Some((17, 1)));
        assert_eq!(nearest_in_bucket(noisy, 0, 0), None);
    }

    #[test]
    fn test_nearest_in_bucket_rejects_ties() {
        // One module away from both value 0 and value 3.
        let noisy = signature(&[3, 1, 1, 1, 1, 1, 4, 5]);
        assert_eq!(lookup(noisy), None);
        let d0 = (noisy ^ signature(&pattern_for(0, 0).unwrap())).count_ones();
        let d3 = (noisy ^ signature(&pattern_for(0, 3).unwrap())).count_ones();
        assert_eq!((d0, d3), (1, 1));
        assert_eq!(nearest_in_bucket(noisy, 0, 1), None);
        assert_eq!(nearest_in_bucket(noisy, 0, 2), None);
    }

    #[test]
    fn test_bucket_for_row_cycles() {
        assert_eq!(
            (0..6).map(bucket_for_row).collect::<Vec<_>>(),
            vec![0, 3, 6, 0, 3, 6]
        );
    }
}
