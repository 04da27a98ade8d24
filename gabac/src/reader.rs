use log::{debug, trace};

use crate::binarization::{
    chunk_c_max, split_unit_widths, BinParams, BinarizationId, LUT_UNIT_SIZE,
};
use crate::context_model::ContextTable;
use crate::decoder::{BinaryArithmeticDecoder, GabacDecodeError, GabacDecodeResult};
use crate::encoder::MAX_BINS_EP;
use crate::params::GabacParams;

/// Longest Exp-Golomb prefix (in leading zeros) that still fits in a `u64`.
const MAX_EG_PREFIX_LEN: u32 = 63;

/// Decodes integer symbols from a GABAC stream written by
/// [`crate::Writer`] with the same [`GabacParams`].
///
/// Every `read_as_*` call has to mirror the corresponding `write_as_*` call,
/// including its parameters and context offset.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    decoder: BinaryArithmeticDecoder<'a>,
    contexts: ContextTable,
    params: GabacParams,
}

impl<'a> Reader<'a> {
    /// Creates a reader and starts decoding the first unit of `data`.
    pub fn new(data: &'a [u8], params: GabacParams) -> GabacDecodeResult<Self> {
        debug!(
            "Starting GABAC reader over {} bytes with {} contexts (bypass: {})",
            data.len(),
            params.num_contexts(),
            params.bypass()
        );

        Ok(Self {
            decoder: BinaryArithmeticDecoder::new(data)?,
            contexts: ContextTable::new(params.num_contexts()),
            params,
        })
    }

    #[must_use]
    pub fn params(&self) -> &GabacParams {
        &self.params
    }

    /// Starts decoding the next unit, keeping the context states.
    pub fn start(&mut self) -> GabacDecodeResult<()> {
        self.decoder.start()
    }

    /// Finishes the current unit.
    ///
    /// Returns the offset right after the unit, that is the total number of
    /// bytes consumed so far.
    pub fn close(&mut self) -> GabacDecodeResult<usize> {
        let bytes_read = self.decoder.close()?;
        debug!(
            "Closed GABAC unit; {} bytes read, {} bytes remaining",
            bytes_read,
            self.decoder.remaining()
        );

        Ok(bytes_read)
    }

    /// Rebuilds the context table and starts decoding the next unit.
    pub fn reset(&mut self) -> GabacDecodeResult<()> {
        debug!("Resetting GABAC reader");

        self.contexts = ContextTable::new(self.params.num_contexts());
        self.decoder.start()
    }

    /// Number of input bytes not consumed yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.decoder.remaining()
    }

    /// Reads a symbol written with [`crate::Writer::write_symbol`].
    pub fn read_symbol(
        &mut self,
        id: BinarizationId,
        params: &BinParams,
    ) -> GabacDecodeResult<u64> {
        let offset = params.context_offset();
        let symbol = match id {
            BinarizationId::Bi => self.read_as_bi(params.get(0), offset),
            BinarizationId::Tu => self.read_as_tu(params.get(0), offset),
            BinarizationId::Eg => self.read_as_eg(offset),
            BinarizationId::Teg => self.read_as_teg(params.get(0), offset),
            BinarizationId::Sutu => self.read_as_sutu(params.get(0), params.get(1), offset),
            BinarizationId::Dtu => {
                self.read_as_dtu(params.get(0), params.get(1), params.get(2), offset)
            }
        }?;
        trace!("Read symbol {} as {} {:?}", symbol, id, params.slots());

        Ok(symbol)
    }

    pub fn read_as_bi(&mut self, num_bits: u32, context_offset: usize) -> GabacDecodeResult<u64> {
        assert!(num_bits <= 64, "Invalid BI width: {}", num_bits);

        if self.params.bypass() {
            return self.read_bins_ep(num_bits);
        }

        let mut symbol = 0;
        for i in 0..num_bits as usize {
            symbol = (symbol << 1) | self.read_bin(context_offset + i)? as u64;
        }
        Ok(symbol)
    }

    pub fn read_as_tu(&mut self, c_max: u32, context_offset: usize) -> GabacDecodeResult<u64> {
        let c_max = c_max as usize;
        let mut symbol = 0;
        while symbol < c_max && self.read_bin(context_offset + symbol)? == 1 {
            symbol += 1;
        }

        Ok(symbol as u64)
    }

    /// Reads an Exp-Golomb symbol.
    ///
    /// Fails with [`GabacDecodeError::ExpGolombPrefixTooLong`] once the
    /// prefix exceeds what a `u64` symbol can produce.
    pub fn read_as_eg(&mut self, context_offset: usize) -> GabacDecodeResult<u64> {
        let mut k = 0;
        while self.read_bin(context_offset + k as usize)? == 0 {
            k += 1;
            if k > MAX_EG_PREFIX_LEN {
                return Err(GabacDecodeError::ExpGolombPrefixTooLong(k));
            }
        }

        let suffix = self.read_bins_ep(k)?;
        Ok(((1 << k) | suffix) - 1)
    }

    pub fn read_as_teg(&mut self, c_trunc: u32, context_offset: usize) -> GabacDecodeResult<u64> {
        let symbol = self.read_as_tu(c_trunc, context_offset)?;
        if symbol < c_trunc as u64 {
            return Ok(symbol);
        }

        let escape = self.read_as_eg(context_offset + c_trunc as usize)?;
        add_escape(symbol, escape)
    }

    pub fn read_as_sutu(
        &mut self,
        sym_size: u32,
        unit_size: u32,
        context_offset: usize,
    ) -> GabacDecodeResult<u64> {
        let mut symbol = 0;
        let mut offset = context_offset;
        for width in split_unit_widths(sym_size, unit_size) {
            let c_max = chunk_c_max(width);
            let chunk = self.read_as_tu(c_max, offset)?;
            symbol = (symbol << width) | chunk;
            offset += c_max as usize;
        }

        Ok(symbol)
    }

    pub fn read_as_dtu(
        &mut self,
        sym_size: u32,
        unit_size: u32,
        c_max_dtu: u32,
        context_offset: usize,
    ) -> GabacDecodeResult<u64> {
        let symbol = self.read_as_tu(c_max_dtu, context_offset)?;
        if symbol < c_max_dtu as u64 {
            return Ok(symbol);
        }

        let escape = self.read_as_sutu(sym_size, unit_size, context_offset + c_max_dtu as usize)?;
        add_escape(symbol, escape)
    }

    pub fn read_lut_symbol(&mut self, sub_sym_size: u32) -> GabacDecodeResult<u64> {
        self.read_as_sutu(sub_sym_size, LUT_UNIT_SIZE, 0)
    }

    /// Reads a sign flag; `true` means the value is negative.
    pub fn read_sign_flag(&mut self) -> GabacDecodeResult<bool> {
        let bin = if self.params.bypass() {
            self.decoder.decode_bin_ep()?
        } else {
            self.decoder.decode_bin(self.contexts.last_mut())?
        };

        Ok(bin == 1)
    }

    #[inline]
    fn read_bin(&mut self, context_index: usize) -> GabacDecodeResult<u8> {
        if self.params.bypass() {
            self.decoder.decode_bin_ep()
        } else {
            self.decoder.decode_bin(self.contexts.get_mut(context_index))
        }
    }

    fn read_bins_ep(&mut self, num_bins: u32) -> GabacDecodeResult<u64> {
        if num_bins > MAX_BINS_EP {
            let high = self.decoder.decode_bins_ep(num_bins - MAX_BINS_EP)? as u64;
            let low = self.decoder.decode_bins_ep(MAX_BINS_EP)? as u64;
            Ok((high << MAX_BINS_EP) | low)
        } else {
            Ok(self.decoder.decode_bins_ep(num_bins)? as u64)
        }
    }
}

fn add_escape(base: u64, escape: u64) -> GabacDecodeResult<u64> {
    base.checked_add(escape).ok_or(GabacDecodeError::SymbolOverflow(base, escape))
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    use crate::binarization::{BinParams, BinarizationId};
    use crate::decoder::GabacDecodeError;
    use crate::params::GabacParams;
    use crate::reader::Reader;
    use crate::writer::Writer;

    fn params(num_contexts: usize, bypass: bool) -> GabacParams {
        GabacParams::builder()
            .num_contexts(num_contexts)
            .bypass(bypass)
            .build()
    }

    fn unhex(hex: &str) -> Vec<u8> {
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
            .collect()
    }

    fn round_trip(id: BinarizationId, bin_params: BinParams, symbols: &[u64]) {
        for bypass in [false, true] {
            let params = params(id.context_count(&bin_params), bypass);

            let mut writer = Writer::new(params);
            for &symbol in symbols {
                writer.write_symbol(id, symbol, &bin_params);
            }
            writer.close();
            let data = writer.into_inner();

            let mut reader = Reader::new(&data, params).unwrap();
            for &symbol in symbols {
                assert_eq!(
                    reader.read_symbol(id, &bin_params).unwrap(),
                    symbol,
                    "{} {:?} (bypass: {})",
                    id,
                    bin_params,
                    bypass
                );
            }
            assert_eq!(reader.close().unwrap(), data.len());
        }
    }

    #[test_log::test]
    fn round_trip_tu() {
        round_trip(BinarizationId::Tu, BinParams::tu(8), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        round_trip(BinarizationId::Tu, BinParams::tu(0), &[0, 0, 0]);
    }

    #[test_log::test]
    fn round_trip_eg() {
        round_trip(
            BinarizationId::Eg,
            BinParams::eg(),
            &[0, 1, 2, 6, 100, 65535, 1 << 40, u64::MAX - 1],
        );
    }

    #[test_log::test]
    fn round_trip_teg() {
        let symbols: Vec<u64> = (0..20).collect();
        round_trip(BinarizationId::Teg, BinParams::teg(8), &symbols);
    }

    #[test_log::test]
    fn round_trip_sutu() {
        round_trip(
            BinarizationId::Sutu,
            BinParams::sutu(16, 4),
            &[0, 1, 15, 16, 0x1234, 0x8000, 0x7fff, 0xffff],
        );
        round_trip(BinarizationId::Sutu, BinParams::sutu(10, 4), &[0, 0x3ff, 0x155]);
    }

    #[test_log::test]
    fn round_trip_dtu() {
        round_trip(
            BinarizationId::Dtu,
            BinParams::dtu(16, 4, 4),
            &[0, 3, 4, 5, 19, 300, 4 + 0xffff],
        );
    }

    #[test_log::test]
    fn round_trip_bi() {
        for num_bits in 1..=32 {
            let all_ones = u64::MAX >> (64 - num_bits);
            let alternating = 0xaaaa_aaaa_aaaa_aaaa & all_ones;
            round_trip(
                BinarizationId::Bi,
                BinParams::bi(num_bits),
                &[0, all_ones, alternating],
            );
        }
        round_trip(
            BinarizationId::Bi,
            BinParams::bi(64),
            &[0, u64::MAX, 0x5555_5555_5555_5555],
        );
    }

    #[test]
    fn read_fixtures() {
        let data = unhex("608c307f04e9e0");
        let mut reader = Reader::new(&data, params(8, false)).unwrap();
        for value in 0..=8 {
            assert_eq!(reader.read_as_tu(8, 0).unwrap(), value);
        }
        assert_eq!(reader.close().unwrap(), 7);

        let data = unhex("a5c9c24d803fc03fa0");
        let mut reader = Reader::new(&data, params(32, true)).unwrap();
        for value in [0, 1, 2, 6, 100, 65535] {
            assert_eq!(reader.read_as_eg(0).unwrap(), value);
        }
        assert_eq!(reader.close().unwrap(), 9);

        let data = unhex("81ff80");
        let mut reader = Reader::new(&data, params(8, false)).unwrap();
        for value in [0, 3, 2, 1] {
            assert_eq!(reader.read_lut_symbol(2).unwrap(), value);
        }
        assert_eq!(reader.close().unwrap(), 3);
    }

    #[test]
    fn sign_flags() {
        let values = [-5, 3, 0, -1, -7, i64::MIN];
        for bypass in [false, true] {
            let mut writer = Writer::new(params(4, bypass));
            for value in values {
                writer.write_sign_flag(value);
            }
            writer.close();
            let data = writer.into_inner();

            let mut reader = Reader::new(&data, params(4, bypass)).unwrap();
            for value in values {
                assert_eq!(reader.read_sign_flag().unwrap(), value < 0);
            }
            reader.close().unwrap();
        }
    }

    #[test]
    fn zero_width_bi() {
        let data = [0xfe, 0x80];
        let mut reader = Reader::new(&data, params(0, false)).unwrap();
        assert_eq!(reader.read_as_bi(0, 0).unwrap(), 0);
        assert_eq!(reader.close().unwrap(), 2);
    }

    #[test]
    fn context_independence() {
        let low = BinParams::tu(8);
        let high = BinParams::tu(8).with_context_offset(8);
        let symbols = [(7, 0), (0, 8), (3, 3), (8, 1), (2, 6)];

        for (first, second) in [(low, high), (high, low)] {
            let params = params(16, false);
            let mut writer = Writer::new(params);
            for (a, b) in symbols {
                writer.write_symbol(BinarizationId::Tu, a, &first);
                writer.write_symbol(BinarizationId::Tu, b, &second);
            }
            writer.close();
            let data = writer.into_inner();

            let mut reader = Reader::new(&data, params).unwrap();
            for (a, b) in symbols {
                assert_eq!(reader.read_symbol(BinarizationId::Tu, &first).unwrap(), a);
                assert_eq!(reader.read_symbol(BinarizationId::Tu, &second).unwrap(), b);
            }
            reader.close().unwrap();
        }
    }

    #[test]
    fn dtu_reads_chained_tu() {
        let params = params(4 + 60, false);
        let mut writer = Writer::new(params);
        writer.write_as_tu(4, 4, 0);
        for (chunk, offset) in [(0x1, 4), (0x2, 19), (0xf, 34), (0x0, 49)] {
            writer.write_as_tu(chunk, 15, offset);
        }
        writer.write_as_tu(3, 4, 0);
        writer.close();
        let data = writer.into_inner();

        let mut reader = Reader::new(&data, params).unwrap();
        assert_eq!(reader.read_as_dtu(16, 4, 4, 0).unwrap(), 4 + 0x12f0);
        assert_eq!(reader.read_as_dtu(16, 4, 4, 0).unwrap(), 3);
        assert_eq!(reader.close().unwrap(), data.len());
    }

    #[test]
    fn bypass_and_cabac_decode_equally() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1337);
        let symbols: Vec<u64> = (0..500).map(|_| rng.gen_range(0..300)).collect();
        let bin_params = BinParams::teg(8);

        let mut streams = Vec::new();
        for bypass in [false, true] {
            let mut writer = Writer::new(params(72, bypass));
            for &symbol in &symbols {
                writer.write_symbol(BinarizationId::Teg, symbol, &bin_params);
            }
            writer.close();
            streams.push(writer.into_inner());
        }
        assert_ne!(streams[0], streams[1]);

        for (data, bypass) in streams.iter().zip([false, true]) {
            let mut reader = Reader::new(data, params(72, bypass)).unwrap();
            let decoded: Vec<u64> = (0..symbols.len())
                .map(|_| reader.read_symbol(BinarizationId::Teg, &bin_params).unwrap())
                .collect();
            assert_eq!(decoded, symbols);
        }
    }

    #[test_log::test]
    fn multiple_units() {
        let params = params(8, false);
        let mut writer = Writer::new(params);
        let mut ends = Vec::new();
        for unit in 0..3 {
            for value in 0..=unit * 3 {
                writer.write_as_tu(value, 8, 0);
            }
            ends.push(writer.close());
            writer.reset();
        }
        let data = writer.into_inner();
        assert_eq!(*ends.last().unwrap(), data.len());

        let mut reader = Reader::new(&data, params).unwrap();
        for (unit, end) in ends.into_iter().enumerate() {
            if unit > 0 {
                reader.reset().unwrap();
            }
            for value in 0..=unit as u64 * 3 {
                assert_eq!(reader.read_as_tu(8, 0).unwrap(), value);
            }
            assert_eq!(reader.close().unwrap(), end);
        }
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn eg_prefix_too_long() {
        // a long run of zero bypass bins never reaches the prefix terminator
        let mut writer = Writer::new(params(0, true));
        writer.write_as_bi(0, 64, 0);
        writer.write_as_bi(0, 64, 0);
        writer.close();
        let data = writer.into_inner();

        let mut reader = Reader::new(&data, params(0, true)).unwrap();
        assert_eq!(
            reader.read_as_eg(0),
            Err(GabacDecodeError::ExpGolombPrefixTooLong(64))
        );
    }

    #[test]
    fn truncated_unit() {
        let mut writer = Writer::new(params(0, true));
        for value in 0..100 {
            writer.write_as_bi(value, 32, 0);
        }
        writer.close();
        let data = writer.into_inner();

        let mut reader = Reader::new(&data[..data.len() / 2], params(0, true)).unwrap();
        let result: Result<Vec<_>, _> = (0..100).map(|_| reader.read_as_bi(32, 0)).collect();
        assert!(matches!(
            result,
            Err(GabacDecodeError::UnexpectedEndOfStream(_))
        ));
    }

    #[test]
    fn teg_escape_overflow() {
        let mut writer = Writer::new(params(0, true));
        writer.write_as_tu(2, 2, 0);
        writer.write_as_eg(u64::MAX - 1, 2);
        writer.close();
        let data = writer.into_inner();

        let mut reader = Reader::new(&data, params(0, true)).unwrap();
        assert_eq!(
            reader.read_as_teg(2, 0),
            Err(GabacDecodeError::SymbolOverflow(2, u64::MAX - 1))
        );
    }

    #[test]
    fn dtu_escape_overflow() {
        let mut writer = Writer::new(params(0, true));
        writer.write_as_tu(2, 2, 0);
        writer.write_as_sutu(u64::MAX, 64, 1, 2);
        writer.close();
        let data = writer.into_inner();

        let mut reader = Reader::new(&data, params(0, true)).unwrap();
        assert_eq!(
            reader.read_as_dtu(64, 1, 2, 0),
            Err(GabacDecodeError::SymbolOverflow(2, u64::MAX))
        );
    }

    #[test]
    fn largest_escapes_decode() {
        let mut writer = Writer::new(params(0, true));
        writer.write_as_teg(u64::MAX, 1, 0);
        writer.write_as_dtu(u64::MAX, 64, 1, 0, 0);
        writer.close();
        let data = writer.into_inner();

        let mut reader = Reader::new(&data, params(0, true)).unwrap();
        assert_eq!(reader.read_as_teg(1, 0).unwrap(), u64::MAX);
        assert_eq!(reader.read_as_dtu(64, 1, 0, 0).unwrap(), u64::MAX);
        assert_eq!(reader.close().unwrap(), data.len());
    }
}
