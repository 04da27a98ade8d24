use log::{debug, trace};

use crate::binarization::{
    chunk_c_max, split_unit_widths, BinParams, BinarizationId, LUT_UNIT_SIZE,
};
use crate::bit_stream::BitOutputStream;
use crate::context_model::ContextTable;
use crate::encoder::{BinaryArithmeticEncoder, MAX_BINS_EP};
use crate::params::GabacParams;

/// Encodes integer symbols into a GABAC stream.
///
/// Each `write_as_*` call binarizes one symbol and codes its bins either
/// through the contexts starting at `context_offset` or, in bypass sessions,
/// as equiprobable bins. The stream consists of units: everything written
/// between construction (or [`Writer::start`]/[`Writer::reset`]) and
/// [`Writer::close`].
///
/// # Examples
/// ```
/// use gabac::{GabacParams, Reader, Writer};
///
/// let params = GabacParams::builder().num_contexts(8).build();
/// let mut writer = Writer::new(params);
/// writer.write_as_tu(3, 8, 0);
/// writer.close();
/// let data = writer.into_inner();
///
/// let mut reader = Reader::new(&data, params).unwrap();
/// assert_eq!(reader.read_as_tu(8, 0).unwrap(), 3);
/// assert_eq!(reader.close().unwrap(), data.len());
/// ```
#[derive(Debug, Clone)]
pub struct Writer {
    encoder: BinaryArithmeticEncoder,
    contexts: ContextTable,
    params: GabacParams,
}

impl Writer {
    #[must_use]
    pub fn new(params: GabacParams) -> Self {
        Self::with_output(BitOutputStream::new(), params)
    }

    /// Creates a writer appending units to an existing, byte-aligned stream.
    #[must_use]
    pub fn with_output(output: BitOutputStream, params: GabacParams) -> Self {
        debug!(
            "Starting GABAC writer with {} contexts (bypass: {})",
            params.num_contexts(),
            params.bypass()
        );

        Self {
            encoder: BinaryArithmeticEncoder::with_output(output),
            contexts: ContextTable::new(params.num_contexts()),
            params,
        }
    }

    #[must_use]
    pub fn params(&self) -> &GabacParams {
        &self.params
    }

    /// Restarts the arithmetic coder of the current unit, keeping the
    /// context states.
    pub fn start(&mut self) {
        self.encoder.start();
    }

    /// Terminates the current unit.
    ///
    /// Returns the total number of bytes written to the stream so far.
    pub fn close(&mut self) -> usize {
        self.encoder.flush();

        let len = self.encoder.data().len();
        debug!("Closed GABAC unit; stream length: {} bytes", len);
        len
    }

    /// Rebuilds the context table and starts a new unit.
    ///
    /// A unit written after `reset()` is byte-identical to the same unit
    /// written by a brand-new writer.
    pub fn reset(&mut self) {
        debug!("Resetting GABAC writer");

        self.contexts = ContextTable::new(self.params.num_contexts());
        self.encoder.start();
    }

    /// Bytes of all the units closed so far.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.encoder.data()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.encoder.into_output().into_inner()
    }

    /// Writes `symbol` using binarization `id` configured by `params`.
    ///
    /// # Panics
    /// Panics if the symbol cannot be represented with given binarization
    /// parameters, or if the binarization needs contexts outside the table.
    pub fn write_symbol(&mut self, id: BinarizationId, symbol: u64, params: &BinParams) {
        trace!("Writing symbol {} as {} {:?}", symbol, id, params.slots());

        let offset = params.context_offset();
        match id {
            BinarizationId::Bi => self.write_as_bi(symbol, params.get(0), offset),
            BinarizationId::Tu => self.write_as_tu(symbol, params.get(0), offset),
            BinarizationId::Eg => self.write_as_eg(symbol, offset),
            BinarizationId::Teg => self.write_as_teg(symbol, params.get(0), offset),
            BinarizationId::Sutu => {
                self.write_as_sutu(symbol, params.get(0), params.get(1), offset)
            }
            BinarizationId::Dtu => self.write_as_dtu(
                symbol,
                params.get(0),
                params.get(1),
                params.get(2),
                offset,
            ),
        }
    }

    /// Fixed-length binary: `num_bits` bits of `symbol`, most significant
    /// first, one context per bit position.
    pub fn write_as_bi(&mut self, symbol: u64, num_bits: u32, context_offset: usize) {
        assert!(num_bits <= 64, "Invalid BI width: {}", num_bits);
        assert!(
            symbol.checked_shr(num_bits).unwrap_or(0) == 0,
            "Symbol {} does not fit in {} bits",
            symbol,
            num_bits
        );

        if self.params.bypass() {
            self.write_bins_ep(symbol, num_bits);
        } else {
            for (i, shift) in (0..num_bits).rev().enumerate() {
                let bin = ((symbol >> shift) & 1) as u8;
                self.write_bin(bin, context_offset + i);
            }
        }
    }

    /// Truncated unary: `symbol` ones followed by a zero, unless `symbol`
    /// equals `c_max`.
    pub fn write_as_tu(&mut self, symbol: u64, c_max: u32, context_offset: usize) {
        assert!(
            symbol <= c_max as u64,
            "Symbol {} exceeds TU maximum {}",
            symbol,
            c_max
        );

        let symbol = symbol as usize;
        for i in 0..symbol {
            self.write_bin(1, context_offset + i);
        }
        if symbol < c_max as usize {
            self.write_bin(0, context_offset + symbol);
        }
    }

    /// Exp-Golomb: the prefix is coded like BI, the suffix always as
    /// equiprobable bins.
    pub fn write_as_eg(&mut self, symbol: u64, context_offset: usize) {
        assert!(symbol < u64::MAX, "Symbol {} too large for EG", symbol);

        let value = symbol + 1;
        let k = 63 - value.leading_zeros();
        self.write_as_bi(1, k + 1, context_offset);
        if k > 0 {
            self.write_bins_ep(value & (u64::MAX >> (64 - k)), k);
        }
    }

    /// Truncated Exp-Golomb: TU up to `c_trunc`, the excess coded as EG with
    /// contexts starting right after the TU ones.
    pub fn write_as_teg(&mut self, symbol: u64, c_trunc: u32, context_offset: usize) {
        if symbol < c_trunc as u64 {
            self.write_as_tu(symbol, c_trunc, context_offset);
        } else {
            self.write_as_tu(c_trunc as u64, c_trunc, context_offset);
            self.write_as_eg(symbol - c_trunc as u64, context_offset + c_trunc as usize);
        }
    }

    /// Split-unit truncated unary: one TU per `unit_size`-bit chunk of the
    /// `sym_size`-bit symbol, most significant chunk first.
    pub fn write_as_sutu(
        &mut self,
        symbol: u64,
        sym_size: u32,
        unit_size: u32,
        context_offset: usize,
    ) {
        assert!(
            symbol.checked_shr(sym_size).unwrap_or(0) == 0,
            "Symbol {} does not fit in {} bits",
            symbol,
            sym_size
        );

        let mut shift = sym_size;
        let mut offset = context_offset;
        for width in split_unit_widths(sym_size, unit_size) {
            shift -= width;
            let c_max = chunk_c_max(width);
            let chunk = (symbol >> shift) & c_max as u64;
            self.write_as_tu(chunk, c_max, offset);
            offset += c_max as usize;
        }
    }

    /// Dependent truncated unary: TU up to `c_max_dtu`, the excess coded as
    /// SUTU with contexts starting right after the TU ones.
    pub fn write_as_dtu(
        &mut self,
        symbol: u64,
        sym_size: u32,
        unit_size: u32,
        c_max_dtu: u32,
        context_offset: usize,
    ) {
        let c_max = c_max_dtu as u64;
        self.write_as_tu(symbol.min(c_max), c_max_dtu, context_offset);
        if symbol >= c_max {
            self.write_as_sutu(
                symbol - c_max,
                sym_size,
                unit_size,
                context_offset + c_max_dtu as usize,
            );
        }
    }

    /// Writes a look-up table entry of `sub_sym_size` bits.
    pub fn write_lut_symbol(&mut self, symbol: u64, sub_sym_size: u32) {
        self.write_as_sutu(symbol, sub_sym_size, LUT_UNIT_SIZE, 0);
    }

    /// Writes whether `value` is negative, using the last context of the
    /// table.
    pub fn write_sign_flag(&mut self, value: i64) {
        let bin = (value < 0) as u8;
        if self.params.bypass() {
            self.encoder.encode_bin_ep(bin);
        } else {
            self.encoder.encode_bin(bin, self.contexts.last_mut());
        }
    }

    #[inline]
    fn write_bin(&mut self, bin: u8, context_index: usize) {
        if self.params.bypass() {
            self.encoder.encode_bin_ep(bin);
        } else {
            self.encoder.encode_bin(bin, self.contexts.get_mut(context_index));
        }
    }

    fn write_bins_ep(&mut self, bins: u64, num_bins: u32) {
        if num_bins > MAX_BINS_EP {
            let high_bins = num_bins - MAX_BINS_EP;
            self.encoder
                .encode_bins_ep((bins >> MAX_BINS_EP) as u32, high_bins);
            self.encoder.encode_bins_ep(bins as u32, MAX_BINS_EP);
        } else {
            self.encoder.encode_bins_ep(bins as u32, num_bins);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::binarization::{BinParams, BinarizationId};
    use crate::params::GabacParams;
    use crate::writer::Writer;

    fn writer(num_contexts: usize, bypass: bool) -> Writer {
        Writer::new(
            GabacParams::builder()
                .num_contexts(num_contexts)
                .bypass(bypass)
                .build(),
        )
    }

    fn hex(data: &[u8]) -> String {
        data.iter().map(|byte| format!("{:02x}", byte)).collect()
    }

    #[test]
    fn empty_unit() {
        let mut writer = writer(0, false);
        assert_eq!(writer.close(), 2);
        assert_eq!(writer.into_inner(), vec![0xfe, 0x80]);
    }

    #[test]
    fn tu_fixtures() {
        let mut cabac = writer(8, false);
        let mut bypass = writer(8, true);
        for value in 0..=8 {
            cabac.write_as_tu(value, 8, 0);
            bypass.write_as_tu(value, 8, 0);
        }
        cabac.close();
        bypass.close();

        assert_eq!(hex(cabac.data()), "608c307f04e9e0");
        assert_eq!(hex(bypass.data()), "5b6239f8000ff8");
    }

    #[test]
    fn tu_at_c_max_omits_terminator() {
        let mut writer1 = writer(2, false);
        writer1.write_as_tu(1, 1, 0);
        writer1.close();
        assert_eq!(writer1.data(), &[0xfe, 0xc0]);

        let mut writer2 = writer(2, false);
        writer2.write_as_tu(1, 2, 0);
        writer2.close();
        assert_eq!(writer2.data(), &[0xc2, 0xe0]);
    }

    #[test]
    fn eg_fixtures() {
        let values = [0, 1, 2, 6, 100, 65535];

        let mut cabac = writer(32, false);
        let mut bypass = writer(32, true);
        for value in values {
            cabac.write_as_eg(value, 0);
            bypass.write_as_eg(value, 0);
        }
        cabac.close();
        bypass.close();

        assert_eq!(hex(cabac.data()), "e3d472814c580057c0");
        assert_eq!(hex(bypass.data()), "a5c9c24d803fc03fa0");
    }

    #[test]
    fn eg_zero_is_single_bin() {
        let mut writer = writer(1, true);
        writer.write_as_eg(0, 0);
        writer.close();

        // same as a single bypass `1`
        assert_eq!(writer.data(), &[0xfe, 0xc0]);
    }

    #[test]
    fn teg_fixture() {
        let mut writer = writer(8 + 64, false);
        for value in 0..20 {
            writer.write_as_teg(value, 8, 0);
        }
        writer.close();

        assert_eq!(
            hex(writer.data()),
            "608c307f04cc80046790fc109878b08b1b4283a6a0"
        );
    }

    #[test]
    fn sutu_fixture() {
        let mut writer = writer(60, false);
        for value in [0, 0x1234, 0xffff, 7] {
            writer.write_as_sutu(value, 16, 4, 0);
        }
        writer.close();

        assert_eq!(hex(writer.data()), "10f7bfffdfff9fff1fff84ff80");
    }

    #[test]
    fn sutu_is_chained_tu() {
        let mut sutu = writer(60, false);
        sutu.write_as_sutu(0xa5c3, 16, 4, 0);
        sutu.close();

        let mut tu = writer(60, false);
        for (chunk, offset) in [(0xa, 0), (0x5, 15), (0xc, 30), (0x3, 45)] {
            tu.write_as_tu(chunk, 15, offset);
        }
        tu.close();

        assert_eq!(sutu.data(), tu.data());
    }

    #[test]
    fn dtu_is_chained_tu() {
        let mut dtu = writer(4 + 60, false);
        dtu.write_as_dtu(2, 16, 4, 4, 0);
        dtu.write_as_dtu(4 + 0xa5c3, 16, 4, 4, 0);
        dtu.close();

        let mut tu = writer(4 + 60, false);
        tu.write_as_tu(2, 4, 0);
        tu.write_as_tu(4, 4, 0);
        for (chunk, offset) in [(0xa, 4), (0x5, 19), (0xc, 34), (0x3, 49)] {
            tu.write_as_tu(chunk, 15, offset);
        }
        tu.close();

        assert_eq!(dtu.data(), tu.data());
    }

    #[test]
    #[should_panic(expected = "Context index out of bounds")]
    fn sutu_needs_sixty_contexts() {
        let mut writer = writer(59, false);
        writer.write_as_sutu(0xffff, 16, 4, 0);
    }

    #[test]
    fn dtu_fixture() {
        let mut writer = writer(4 + 60, false);
        for value in [0, 3, 4, 5, 300, 4 + 0xffff] {
            writer.write_as_dtu(value, 16, 4, 4, 0);
        }
        writer.close();

        assert_eq!(hex(writer.data()), "7b808816ff09dffffff87fd933ffc0");
    }

    #[test]
    fn lut_fixture() {
        let mut writer = writer(8, false);
        for value in [0, 3, 2, 1] {
            writer.write_lut_symbol(value, 2);
        }
        writer.close();

        assert_eq!(writer.data(), &[0x81, 0xff, 0x80]);
    }

    #[test]
    fn sign_flag_fixture() {
        let mut writer = writer(4, false);
        for value in [-5, 3, 0, -1, -7, i64::MIN] {
            writer.write_sign_flag(value);
        }
        writer.close();

        assert_eq!(writer.data(), &[0xdd, 0x3e]);
    }

    #[test]
    fn zero_width_bi_is_noop() {
        let mut writer = writer(0, false);
        writer.write_as_bi(0, 0, 0);
        writer.close();

        assert_eq!(writer.data(), &[0xfe, 0x80]);
    }

    #[test]
    fn write_symbol_dispatches() {
        let mut direct = writer(72, false);
        direct.write_as_teg(13, 8, 0);
        direct.write_as_bi(0x5a, 8, 4);
        direct.close();

        let mut dispatched = writer(72, false);
        dispatched.write_symbol(BinarizationId::Teg, 13, &BinParams::teg(8));
        dispatched.write_symbol(
            BinarizationId::Bi,
            0x5a,
            &BinParams::bi(8).with_context_offset(4),
        );
        dispatched.close();

        assert_eq!(direct.data(), dispatched.data());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut reused = writer(8, false);
        for value in 0..=8 {
            reused.write_as_tu(value, 8, 0);
        }
        let first_len = reused.close();
        reused.reset();
        for value in 0..=8 {
            reused.write_as_tu(value, 8, 0);
        }
        reused.close();

        let data = reused.data();
        assert_eq!(first_len, 7);
        assert_eq!(data[..first_len], data[first_len..]);
        assert_eq!(hex(data), "608c307f04e9e0608c307f04e9e0");
    }

    #[test]
    #[should_panic(expected = "exceeds TU maximum")]
    fn tu_above_c_max() {
        let mut writer = writer(4, false);
        writer.write_as_tu(5, 4, 0);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn bi_too_wide() {
        let mut writer = writer(4, true);
        writer.write_as_bi(16, 4, 0);
    }
}
