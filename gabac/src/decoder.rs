use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::bit_stream::BitInputStream;
use crate::cabac_tables::{LPS_TABLE, RENORM_TABLE};
use crate::context_model::ContextModel;
use crate::encoder::MAX_BINS_EP;

/// Error occurring when decoding a GABAC stream.
///
/// Arithmetic coding has no resynchronization points, so any of these means
/// the rest of the unit cannot be trusted and decoding should be abandoned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GabacDecodeError {
    /// The stream ended before the unit was fully decoded.
    UnexpectedEndOfStream(usize),
    /// The terminating bin was not found where the unit was supposed to end.
    MissingTerminator,
    /// The last byte of the unit does not contain a valid stop bit.
    InvalidStopBit(u8),
    /// Exp-Golomb prefix longer than any 64-bit value can produce.
    ExpGolombPrefixTooLong(u32),
    /// The escape part of a TEG or DTU symbol does not fit in a `u64` when
    /// added to its truncation threshold.
    SymbolOverflow(u64, u64),
}

impl GabacDecodeError {
    #[must_use]
    pub fn unexpected_end_of_stream(position: usize) -> Self {
        Self::UnexpectedEndOfStream(position)
    }

    #[must_use]
    pub fn invalid_stop_bit(last_byte: u8) -> Self {
        Self::InvalidStopBit(last_byte)
    }
}

impl Display for GabacDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GabacDecodeError::UnexpectedEndOfStream(position) => {
                write!(f, "Unexpected end of stream at byte {}", position)
            }
            GabacDecodeError::MissingTerminator => write!(f, "Terminating bin not found"),
            GabacDecodeError::InvalidStopBit(byte) => {
                write!(f, "Invalid stop bit in the last byte: {:#04x}", byte)
            }
            GabacDecodeError::ExpGolombPrefixTooLong(len) => {
                write!(f, "Exp-Golomb prefix too long: {} leading zeros", len)
            }
            GabacDecodeError::SymbolOverflow(base, escape) => {
                write!(f, "Decoded symbol overflows: {} + {}", base, escape)
            }
        }
    }
}

impl Error for GabacDecodeError {}

/// The result of decoding a GABAC stream.
pub type GabacDecodeResult<T> = Result<T, GabacDecodeError>;

/// Binary arithmetic (range) decoder, the exact inverse of
/// [`crate::encoder::BinaryArithmeticEncoder`].
///
/// `value` holds 16 + 7 bits of the stream aligned against `range << 7`;
/// `bits_needed` counts up from -8 to the moment a new byte has to be read.
#[derive(Debug, Clone)]
pub struct BinaryArithmeticDecoder<'a> {
    input: BitInputStream<'a>,
    range: u32,
    value: u32,
    bits_needed: i32,
    closed: bool,
}

impl<'a> BinaryArithmeticDecoder<'a> {
    pub fn new(data: &'a [u8]) -> GabacDecodeResult<Self> {
        Self::with_input(BitInputStream::new(data))
    }

    pub fn with_input(input: BitInputStream<'a>) -> GabacDecodeResult<Self> {
        let mut decoder = Self {
            input,
            range: 0,
            value: 0,
            bits_needed: 0,
            closed: true,
        };
        decoder.start()?;

        Ok(decoder)
    }

    /// Starts decoding a unit at the current position of the input.
    pub fn start(&mut self) -> GabacDecodeResult<()> {
        self.range = 510;
        self.bits_needed = -8;
        let high = self.input.read_byte()? as u32;
        let low = self.input.read_byte()? as u32;
        self.value = (high << 8) | low;
        self.closed = false;

        Ok(())
    }

    #[inline]
    fn read_byte(&mut self) -> GabacDecodeResult<u32> {
        Ok(self.input.read_byte()? as u32)
    }

    /// Decodes a single bin using (and updating) given context model.
    #[inline]
    pub fn decode_bin(&mut self, context: &mut ContextModel) -> GabacDecodeResult<u8> {
        assert!(!self.closed, "Decoder used after close()");

        let lps = LPS_TABLE[context.state() as usize][((self.range >> 6) & 3) as usize] as u32;
        self.range -= lps;
        let scaled_range = self.range << 7;

        let bin;
        if self.value < scaled_range {
            bin = context.mps();
            context.update_mps();

            if scaled_range < (256 << 7) {
                self.range = scaled_range >> 6;
                self.value <<= 1;

                self.bits_needed += 1;
                if self.bits_needed == 0 {
                    self.bits_needed = -8;
                    self.value += self.read_byte()?;
                }
            }
        } else {
            let num_bits = RENORM_TABLE[(lps >> 3) as usize] as i32;
            self.value = (self.value - scaled_range) << num_bits;
            self.range = lps << num_bits;
            bin = 1 - context.mps();
            context.update_lps();

            self.bits_needed += num_bits;
            if self.bits_needed >= 0 {
                self.value += self.read_byte()? << self.bits_needed;
                self.bits_needed -= 8;
            }
        }

        Ok(bin)
    }

    /// Decodes a single equiprobable bin.
    #[inline]
    pub fn decode_bin_ep(&mut self) -> GabacDecodeResult<u8> {
        assert!(!self.closed, "Decoder used after close()");

        self.value <<= 1;
        self.bits_needed += 1;
        if self.bits_needed >= 0 {
            self.bits_needed = -8;
            self.value += self.read_byte()?;
        }

        let scaled_range = self.range << 7;
        if self.value >= scaled_range {
            self.value -= scaled_range;
            Ok(1)
        } else {
            Ok(0)
        }
    }

    /// Decodes `num_bins` equiprobable bins, the first one ending up as the
    /// most significant bit of the result.
    ///
    /// # Panics
    /// Panics if `num_bins` exceeds [`MAX_BINS_EP`].
    pub fn decode_bins_ep(&mut self, mut num_bins: u32) -> GabacDecodeResult<u32> {
        assert!(!self.closed, "Decoder used after close()");
        assert!(
            num_bins <= MAX_BINS_EP,
            "Too many bypass bins in a single call: {}",
            num_bins
        );

        let mut bins = 0;
        while num_bins > 8 {
            self.value = (self.value << 8) + (self.read_byte()? << (8 + self.bits_needed));

            let mut scaled_range = self.range << 15;
            for _ in 0..8 {
                bins <<= 1;
                scaled_range >>= 1;
                if self.value >= scaled_range {
                    bins += 1;
                    self.value -= scaled_range;
                }
            }
            num_bins -= 8;
        }

        self.bits_needed += num_bins as i32;
        self.value <<= num_bins;
        if self.bits_needed >= 0 {
            self.value += self.read_byte()? << self.bits_needed;
            self.bits_needed -= 8;
        }

        let mut scaled_range = self.range << (num_bins + 7);
        for _ in 0..num_bins {
            bins <<= 1;
            scaled_range >>= 1;
            if self.value >= scaled_range {
                bins += 1;
                self.value -= scaled_range;
            }
        }

        Ok(bins)
    }

    /// Decodes a terminating bin.
    pub fn decode_bin_trm(&mut self) -> GabacDecodeResult<u8> {
        assert!(!self.closed, "Decoder used after close()");

        self.range -= 2;
        let scaled_range = self.range << 7;
        if self.value >= scaled_range {
            return Ok(1);
        }

        if scaled_range < (256 << 7) {
            self.range = scaled_range >> 6;
            self.value <<= 1;

            self.bits_needed += 1;
            if self.bits_needed == 0 {
                self.bits_needed = -8;
                self.value += self.read_byte()?;
            }
        }

        Ok(0)
    }

    /// Finishes the current unit.
    ///
    /// Consumes the terminating bin and checks the stop bit. Returns the
    /// total number of bytes consumed from the input, i.e. the offset right
    /// after this unit.
    pub fn close(&mut self) -> GabacDecodeResult<usize> {
        if self.decode_bin_trm()? != 1 {
            return Err(GabacDecodeError::MissingTerminator);
        }

        // the stop bit directly follows the bits already shifted into `value`
        let last_byte = self.input.peek_previous_byte().unwrap_or(0);
        if ((last_byte as u32) << (8 + self.bits_needed)) & 0xff != 0x80 {
            return Err(GabacDecodeError::invalid_stop_bit(last_byte));
        }
        self.closed = true;

        Ok(self.input.bytes_read())
    }

    #[inline]
    #[must_use]
    pub fn bytes_read(&self) -> usize {
        self.input.bytes_read()
    }

    /// Number of input bytes not consumed yet.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.input.remaining()
    }
}
