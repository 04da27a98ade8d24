use lazy_static::lazy_static;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::binarization::{BinParams, BinarizationId};

pub const SYMBOLS_TXT: &str = include_str!("../samples/symbols.txt");
/// [`SYMBOLS`] coded as DTU(16, 4, 4) with 64 contexts, in four units of 1024
/// symbols, the contexts being reset between the units.
pub const SYMBOLS_DTU_GABAC: &[u8] = include_bytes!("../samples/symbols_dtu.gabac");
/// Offsets right after each unit of [`SYMBOLS_DTU_GABAC`].
pub const SYMBOLS_DTU_UNIT_ENDS: [usize; 4] = [785, 1600, 2383, 3145];
/// [`SYMBOLS`] coded as EG in bypass mode, in a single unit.
pub const SYMBOLS_EG_BYPASS_GABAC: &[u8] = include_bytes!("../samples/symbols_eg_bypass.gabac");

pub const SYMBOLS_DTU_PARAMS: BinParams = BinParams::dtu(16, 4, 4);
pub const SYMBOLS_UNIT_LEN: usize = 1024;

lazy_static! {
    pub static ref SYMBOLS: Vec<u64> = parse_symbols(SYMBOLS_TXT);
}

/// A binarization together with symbols it is able to represent.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub id: BinarizationId,
    pub params: BinParams,
    pub symbols: Vec<u64>,
}

lazy_static! {
    pub static ref RANDOM_TEST_CASES: Vec<TestCase> = vec![
        TestCase {
            id: BinarizationId::Bi,
            params: BinParams::bi(12),
            symbols: random_symbols(1, 10_000, 1 << 12),
        },
        TestCase {
            id: BinarizationId::Tu,
            params: BinParams::tu(15),
            symbols: random_skewed_symbols(2, 10_000, 16),
        },
        TestCase {
            id: BinarizationId::Eg,
            params: BinParams::eg(),
            symbols: random_skewed_symbols(3, 10_000, 1 << 20),
        },
        TestCase {
            id: BinarizationId::Teg,
            params: BinParams::teg(8),
            symbols: random_skewed_symbols(4, 10_000, 1 << 16),
        },
        TestCase {
            id: BinarizationId::Sutu,
            params: BinParams::sutu(16, 4),
            symbols: random_symbols(5, 10_000, 1 << 16),
        },
        TestCase {
            id: BinarizationId::Dtu,
            params: BinParams::dtu(16, 4, 4),
            symbols: random_skewed_symbols(6, 10_000, 4 + (1 << 16)),
        },
    ];
}

fn parse_symbols(text: &str) -> Vec<u64> {
    text.split_ascii_whitespace()
        .map(|symbol| symbol.parse().expect("Invalid symbol in test data"))
        .collect()
}

/// Uniformly distributed symbols in `0..max`.
#[must_use]
pub fn random_symbols(seed: u64, num: usize, max: u64) -> Vec<u64> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..num).map(|_| rng.gen_range(0..max)).collect()
}

/// Symbols in `0..max` where small values are much more likely, which is what
/// adaptive contexts are good at.
#[must_use]
pub fn random_skewed_symbols(seed: u64, num: usize, max: u64) -> Vec<u64> {
    assert!(max > 0);

    let max_bits = u64::BITS - max.leading_zeros();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    (0..num)
        .map(|_| {
            let bits = rng.gen_range(0..=max_bits);
            let limit = 1u64.checked_shl(bits).unwrap_or(u64::MAX).min(max);
            rng.gen_range(0..limit)
        })
        .collect()
}
