use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of Exp-Golomb prefix positions that may be coded with a context:
/// a value of `u64::MAX - 1` has 63 leading zeros followed by a one.
pub const EG_PREFIX_CONTEXTS: usize = 64;

/// Unit width used by the LUT symbol binarization.
pub const LUT_UNIT_SIZE: u32 = 2;

/// Identifier of a scheme mapping an integer symbol to a sequence of bins.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum BinarizationId {
    /// Fixed-length binary.
    Bi = 0,
    /// Truncated unary.
    Tu = 1,
    /// Exp-Golomb.
    Eg = 2,
    /// Truncated Exp-Golomb.
    Teg = 3,
    /// Split-unit truncated unary.
    Sutu = 4,
    /// Dependent truncated unary.
    Dtu = 5,
}

impl BinarizationId {
    pub const VALUES: [BinarizationId; 6] = [
        BinarizationId::Bi,
        BinarizationId::Tu,
        BinarizationId::Eg,
        BinarizationId::Teg,
        BinarizationId::Sutu,
        BinarizationId::Dtu,
    ];

    /// Returns the short, lowercase name of this binarization.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            BinarizationId::Bi => "bi",
            BinarizationId::Tu => "tu",
            BinarizationId::Eg => "eg",
            BinarizationId::Teg => "teg",
            BinarizationId::Sutu => "sutu",
            BinarizationId::Dtu => "dtu",
        }
    }

    /// Looks up a binarization by its name, ignoring ASCII case.
    ///
    /// # Examples
    /// ```
    /// use gabac::binarization::BinarizationId;
    ///
    /// assert_eq!(BinarizationId::from_name("SUTU"), Some(BinarizationId::Sutu));
    /// assert_eq!(BinarizationId::from_name("huffman"), None);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::VALUES
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(name))
    }

    /// Number of parameter slots (not counting the context offset) the
    /// binarization reads.
    #[must_use]
    pub fn param_num(&self) -> usize {
        match self {
            BinarizationId::Bi | BinarizationId::Tu | BinarizationId::Teg => 1,
            BinarizationId::Eg => 0,
            BinarizationId::Sutu => 2,
            BinarizationId::Dtu => 3,
        }
    }

    /// Checks whether `params` can be used with this binarization at all.
    ///
    /// # Examples
    /// ```
    /// use gabac::binarization::{BinParams, BinarizationId};
    ///
    /// assert!(BinarizationId::Sutu.params_valid(&BinParams::sutu(16, 4)));
    /// assert!(!BinarizationId::Sutu.params_valid(&BinParams::sutu(16, 0)));
    /// ```
    #[must_use]
    pub fn params_valid(&self, params: &BinParams) -> bool {
        match self {
            BinarizationId::Bi => params.get(0) <= 64,
            BinarizationId::Tu | BinarizationId::Eg | BinarizationId::Teg => true,
            BinarizationId::Sutu | BinarizationId::Dtu => {
                params.get(0) <= 64 && (1..=32).contains(&params.get(1))
            }
        }
    }

    /// Largest symbol representable with given (valid) params.
    #[must_use]
    pub fn max_symbol(&self, params: &BinParams) -> u64 {
        match self {
            BinarizationId::Bi | BinarizationId::Sutu => max_value(params.get(0)),
            BinarizationId::Tu => params.get(0) as u64,
            BinarizationId::Eg => u64::MAX - 1,
            BinarizationId::Teg => (u64::MAX - 1).saturating_add(params.get(0) as u64),
            BinarizationId::Dtu => (params.get(2) as u64).saturating_add(max_value(params.get(0))),
        }
    }

    /// Number of contexts a context-coded symbol with given params may touch,
    /// including the context offset. Used to size the context table.
    ///
    /// # Examples
    /// ```
    /// use gabac::binarization::{BinParams, BinarizationId};
    ///
    /// assert_eq!(BinarizationId::Tu.context_count(&BinParams::tu(8)), 8);
    /// assert_eq!(BinarizationId::Sutu.context_count(&BinParams::sutu(16, 4)), 60);
    /// ```
    #[must_use]
    pub fn context_count(&self, params: &BinParams) -> usize {
        let count = match self {
            BinarizationId::Bi | BinarizationId::Tu => params.get(0) as usize,
            BinarizationId::Eg => EG_PREFIX_CONTEXTS,
            BinarizationId::Teg => params.get(0) as usize + EG_PREFIX_CONTEXTS,
            BinarizationId::Sutu => sutu_context_count(params.get(0), params.get(1)),
            BinarizationId::Dtu => {
                params.get(2) as usize + sutu_context_count(params.get(0), params.get(1))
            }
        };

        params.context_offset() + count
    }
}

impl Display for BinarizationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name().to_ascii_uppercase())
    }
}

/// Error returned when converting an unknown binarization identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UnknownBinarizationId(pub u8);

impl Display for UnknownBinarizationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown binarization identifier: {}", self.0)
    }
}

impl Error for UnknownBinarizationId {}

impl TryFrom<u8> for BinarizationId {
    type Error = UnknownBinarizationId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::VALUES
            .into_iter()
            .find(|&id| id as u8 == value)
            .ok_or(UnknownBinarizationId(value))
    }
}

impl From<BinarizationId> for u8 {
    fn from(id: BinarizationId) -> Self {
        id as u8
    }
}

/// Parameters of a single binarization call.
///
/// Slots `0..3` hold the scheme-specific values, e.g. `[cMax]` for TU or
/// `[symSize, unitSize, cMaxDtu]` for DTU. Slot 3 is the offset of the first
/// context used in context-coded mode.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct BinParams([u32; 4]);

impl BinParams {
    pub const CONTEXT_OFFSET_SLOT: usize = 3;

    #[must_use]
    pub const fn bi(num_bits: u32) -> Self {
        Self([num_bits, 0, 0, 0])
    }

    #[must_use]
    pub const fn tu(c_max: u32) -> Self {
        Self([c_max, 0, 0, 0])
    }

    #[must_use]
    pub const fn eg() -> Self {
        Self([0; 4])
    }

    #[must_use]
    pub const fn teg(c_trunc: u32) -> Self {
        Self([c_trunc, 0, 0, 0])
    }

    #[must_use]
    pub const fn sutu(sym_size: u32, unit_size: u32) -> Self {
        Self([sym_size, unit_size, 0, 0])
    }

    #[must_use]
    pub const fn dtu(sym_size: u32, unit_size: u32, c_max_dtu: u32) -> Self {
        Self([sym_size, unit_size, c_max_dtu, 0])
    }

    #[must_use]
    pub const fn with_context_offset(self, context_offset: u32) -> Self {
        let [a, b, c, _] = self.0;
        Self([a, b, c, context_offset])
    }

    #[inline]
    #[must_use]
    pub const fn get(&self, index: usize) -> u32 {
        self.0[index]
    }

    #[inline]
    #[must_use]
    pub const fn context_offset(&self) -> usize {
        self.0[Self::CONTEXT_OFFSET_SLOT] as usize
    }

    #[inline]
    #[must_use]
    pub const fn slots(&self) -> [u32; 4] {
        self.0
    }
}

impl From<[u32; 4]> for BinParams {
    fn from(slots: [u32; 4]) -> Self {
        Self(slots)
    }
}

/// Widths of the chunks a `sym_size`-bit symbol is split into by SUTU, most
/// significant chunk first.
///
/// Chunks are right-aligned: the first one holds the `sym_size % unit_size`
/// leftover bits, if there are any.
///
/// # Examples
/// ```
/// use gabac::binarization::split_unit_widths;
///
/// assert_eq!(split_unit_widths(16, 4), vec![4, 4, 4, 4]);
/// assert_eq!(split_unit_widths(10, 4), vec![2, 4, 4]);
/// ```
///
/// # Panics
/// This function panics if `unit_size` is not in `1..=32`, or if `sym_size`
/// exceeds 64.
#[must_use]
pub fn split_unit_widths(sym_size: u32, unit_size: u32) -> Vec<u32> {
    assert!(
        (1..=32).contains(&unit_size),
        "Invalid split unit size: {}",
        unit_size
    );
    assert!(sym_size <= 64, "Invalid symbol size: {}", sym_size);

    let mut widths = Vec::with_capacity((sym_size / unit_size + 1) as usize);
    let leftover = sym_size % unit_size;
    if leftover != 0 {
        widths.push(leftover);
    }
    widths.extend(std::iter::repeat(unit_size).take((sym_size / unit_size) as usize));

    widths
}

/// Largest value of a truncated unary code covering a `width`-bit chunk.
#[inline]
#[must_use]
pub(crate) fn chunk_c_max(width: u32) -> u32 {
    debug_assert!(width <= 32);
    u32::MAX.checked_shr(32 - width).unwrap_or(0)
}

fn max_value(num_bits: u32) -> u64 {
    u64::MAX.checked_shr(64u32.saturating_sub(num_bits)).unwrap_or(0)
}

fn sutu_context_count(sym_size: u32, unit_size: u32) -> usize {
    split_unit_widths(sym_size, unit_size)
        .into_iter()
        .map(|width| chunk_c_max(width) as usize)
        .sum()
}
