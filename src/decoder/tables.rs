/// One row of the fixed-grid size table.
pub struct VersionEntry {
    pub number: u8,
    pub symbol_rows: usize,
    pub symbol_columns: usize,
    pub data_region_rows: usize,
    pub data_region_columns: usize,
    pub ec_codewords: usize,
    /// `(count, data_codewords)` per block group
    pub blocks: &'static [(usize, usize)],
}

const fn entry(
    number: u8,
    symbol: (usize, usize),
    region: (usize, usize),
    ec_codewords: usize,
    blocks: &'static [(usize, usize)],
) -> VersionEntry {
    VersionEntry {
        number,
        symbol_rows: symbol.0,
        symbol_columns: symbol.1,
        data_region_rows: region.0,
        data_region_columns: region.1,
        ec_codewords,
        blocks,
    }
}

// ECC200 symbol sizes: 24 square followed by 6 rectangular.
pub static VERSIONS: [VersionEntry; 30] = [
    entry(1, (10, 10), (8, 8), 5, &[(1, 3)]),
    entry(2, (12, 12), (10, 10), 7, &[(1, 5)]),
    entry(3, (14, 14), (12, 12), 10, &[(1, 8)]),
    entry(4, (16, 16), (14, 14), 12, &[(1, 12)]),
    entry(5, (18, 18), (16, 16), 14, &[(1, 18)]),
    entry(6, (20, 20), (18, 18), 18, &[(1, 22)]),
    entry(7, (22, 22), (20, 20), 20, &[(1, 30)]),
    entry(8, (24, 24), (22, 22), 24, &[(1, 36)]),
    entry(9, (26, 26), (24, 24), 28, &[(1, 44)]),
    entry(10, (32, 32), (14, 14), 36, &[(1, 62)]),
    entry(11, (36, 36), (16, 16), 42, &[(1, 86)]),
    entry(12, (40, 40), (18, 18), 48, &[(1, 114)]),
    entry(13, (44, 44), (20, 20), 56, &[(1, 144)]),
    entry(14, (48, 48), (22, 22), 68, &[(1, 174)]),
    entry(15, (52, 52), (24, 24), 42, &[(2, 102)]),
    entry(16, (64, 64), (14, 14), 56, &[(2, 140)]),
    entry(17, (72, 72), (16, 16), 36, &[(4, 92)]),
    entry(18, (80, 80), (18, 18), 48, &[(4, 114)]),
    entry(19, (88, 88), (20, 20), 56, &[(4, 144)]),
    entry(20, (96, 96), (22, 22), 68, &[(4, 174)]),
    entry(21, (104, 104), (24, 24), 56, &[(6, 136)]),
    entry(22, (120, 120), (18, 18), 68, &[(6, 175)]),
    entry(23, (132, 132), (20, 20), 62, &[(8, 163)]),
    entry(24, (144, 144), (22, 22), 62, &[(8, 156), (2, 155)]),
    entry(25, (8, 18), (6, 16), 7, &[(1, 5)]),
    entry(26, (8, 32), (6, 14), 11, &[(1, 10)]),
    entry(27, (12, 26), (10, 24), 14, &[(1, 16)]),
    entry(28, (12, 36), (10, 16), 18, &[(1, 22)]),
    entry(29, (16, 36), (14, 16), 24, &[(1, 32)]),
    entry(30, (16, 48), (14, 22), 28, &[(1, 49)]),
];

pub fn version_entry(number: u8) -> Option<&'static VersionEntry> {
    if !(1..=30).contains(&number) {
        return None;
    }
    Some(&VERSIONS[number as usize - 1])
}

/// Version whose interleaving places the longer data codeword in only the
/// first 8 of its 10 blocks.
pub const SPLIT_BLOCK_VERSION: u8 = 24;
