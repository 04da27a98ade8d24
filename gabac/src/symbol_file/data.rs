use binrw::binrw;

use crate::binarization::{BinParams, BinarizationId, UnknownBinarizationId};
use crate::params::GabacParams;

/// Header of a symbol file, directly followed by `payload_len` bytes of the
/// GABAC stream.
#[binrw]
#[brw(big, magic = b"GABACSTR")]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SymbolFileHeader {
    pub version: u8,
    pub binarization: u8,
    pub bin_params: [u32; 4],
    pub bypass: u8,
    pub num_contexts: u32,
    pub symbol_num: u64,
    pub symbol_checksum: u32,
    pub payload_len: u32,
}

impl SymbolFileHeader {
    pub fn binarization_id(&self) -> Result<BinarizationId, UnknownBinarizationId> {
        BinarizationId::try_from(self.binarization)
    }

    #[must_use]
    pub fn bin_params(&self) -> BinParams {
        BinParams::from(self.bin_params)
    }

    #[must_use]
    pub fn gabac_params(&self) -> GabacParams {
        GabacParams::builder()
            .num_contexts(self.num_contexts as usize)
            .bypass(self.bypass != 0)
            .build()
    }

    /// Average payload size of a single symbol, in bits.
    #[must_use]
    pub fn bits_per_symbol(&self) -> f64 {
        if self.symbol_num == 0 {
            return 0.0;
        }

        self.payload_len as f64 * 8.0 / self.symbol_num as f64
    }
}
