use crate::bit_stream::BitOutputStream;
use crate::cabac_tables::{LPS_TABLE, RENORM_TABLE};
use crate::context_model::ContextModel;

/// Maximum number of bins accepted by a single [`BinaryArithmeticEncoder::encode_bins_ep`] call.
pub const MAX_BINS_EP: u32 = 32;

/// Binary arithmetic (range) encoder.
///
/// Keeps a 9-bit `range` normalized to `[256, 510]` and a 32-bit `low`
/// register. Whole bytes are peeled off `low` as soon as fewer than 12 free
/// bits are left. A leading `0xFF` byte may still receive a carry, so such
/// bytes are only counted until a byte different from `0xFF` arrives.
#[derive(Debug, Clone)]
pub struct BinaryArithmeticEncoder {
    output: BitOutputStream,
    low: u32,
    range: u32,
    num_bits_left: i32,
    buffered_byte: u32,
    num_buffered_bytes: u32,
}

impl BinaryArithmeticEncoder {
    #[must_use]
    pub fn new() -> Self {
        Self::with_output(BitOutputStream::new())
    }

    /// Creates an encoder appending to an existing stream.
    ///
    /// # Panics
    /// Panics if the stream is not byte-aligned.
    #[must_use]
    pub fn with_output(output: BitOutputStream) -> Self {
        assert!(output.is_byte_aligned());

        let mut encoder = Self {
            output,
            low: 0,
            range: 0,
            num_bits_left: 0,
            buffered_byte: 0,
            num_buffered_bytes: 0,
        };
        encoder.start();
        encoder
    }

    /// Resets the coder registers for a new unit. Nothing is written.
    pub fn start(&mut self) {
        self.low = 0;
        self.range = 510;
        self.num_bits_left = 23;
        self.num_buffered_bytes = 0;
        self.buffered_byte = 0xff;
    }

    /// Encodes a single bin using (and updating) given context model.
    #[inline]
    pub fn encode_bin(&mut self, bin: u8, context: &mut ContextModel) {
        debug_assert!(bin <= 1);

        let lps = LPS_TABLE[context.state() as usize][((self.range >> 6) & 3) as usize] as u32;
        self.range -= lps;

        if bin != context.mps() {
            let num_bits = RENORM_TABLE[(lps >> 3) as usize] as i32;
            self.low = (self.low + self.range) << num_bits;
            self.range = lps << num_bits;
            context.update_lps();
            self.num_bits_left -= num_bits;
        } else {
            context.update_mps();
            if self.range >= 256 {
                return;
            }
            self.low <<= 1;
            self.range <<= 1;
            self.num_bits_left -= 1;
        }

        self.test_and_write_out();
    }

    /// Encodes a single equiprobable bin.
    #[inline]
    pub fn encode_bin_ep(&mut self, bin: u8) {
        debug_assert!(bin <= 1);

        self.low <<= 1;
        if bin != 0 {
            self.low += self.range;
        }
        self.num_bits_left -= 1;

        self.test_and_write_out();
    }

    /// Encodes the `num_bins` lowest bits of `bins` as equiprobable bins, most
    /// significant first.
    ///
    /// # Panics
    /// Panics if `num_bins` exceeds [`MAX_BINS_EP`].
    pub fn encode_bins_ep(&mut self, mut bins: u32, mut num_bins: u32) {
        assert!(
            num_bins <= MAX_BINS_EP,
            "Too many bypass bins in a single call: {}",
            num_bins
        );
        debug_assert!(bins.checked_shr(num_bins).unwrap_or(0) == 0);

        while num_bins > 8 {
            num_bins -= 8;
            let pattern = bins >> num_bins;
            self.low = (self.low << 8) + self.range * pattern;
            bins -= pattern << num_bins;
            self.num_bits_left -= 8;

            self.test_and_write_out();
        }

        self.low = (self.low << num_bins) + self.range * bins;
        self.num_bits_left -= num_bins as i32;

        self.test_and_write_out();
    }

    /// Encodes a terminating bin; `1` marks the end of the unit.
    pub fn encode_bin_trm(&mut self, bin: u8) {
        debug_assert!(bin <= 1);

        self.range -= 2;
        if bin != 0 {
            self.low += self.range;
            self.low <<= 7;
            self.range = 2 << 7;
            self.num_bits_left -= 7;
        } else if self.range >= 256 {
            return;
        } else {
            self.low <<= 1;
            self.range <<= 1;
            self.num_bits_left -= 1;
        }

        self.test_and_write_out();
    }

    /// Terminates the current unit and prepares the encoder for the next one.
    ///
    /// Codes the terminating bin, drains all buffered bytes, writes the stop
    /// bit and pads the output to a byte boundary.
    pub fn flush(&mut self) {
        self.encode_bin_trm(1);
        self.finish();
        self.output.write(1, 1);
        self.output.write_align_zero();

        self.start();
    }

    #[inline]
    fn test_and_write_out(&mut self) {
        if self.num_bits_left < 12 {
            self.write_out();
        }
    }

    fn write_out(&mut self) {
        let lead_byte = self.low >> (24 - self.num_bits_left);
        self.num_bits_left += 8;
        self.low &= 0xffff_ffff >> self.num_bits_left;

        if lead_byte == 0xff {
            self.num_buffered_bytes += 1;
        } else if self.num_buffered_bytes > 0 {
            let carry = lead_byte >> 8;
            let byte = self.buffered_byte + carry;
            self.buffered_byte = lead_byte & 0xff;
            self.output.write(byte, 8);

            let byte = (0xff + carry) & 0xff;
            while self.num_buffered_bytes > 1 {
                self.output.write(byte, 8);
                self.num_buffered_bytes -= 1;
            }
        } else {
            self.num_buffered_bytes = 1;
            self.buffered_byte = lead_byte;
        }
    }

    fn finish(&mut self) {
        let carry_shift = 32 - self.num_bits_left;
        if self.low >> carry_shift != 0 {
            self.output.write(self.buffered_byte + 1, 8);
            while self.num_buffered_bytes > 1 {
                self.output.write(0x00, 8);
                self.num_buffered_bytes -= 1;
            }
            self.low -= 1 << carry_shift;
        } else {
            if self.num_buffered_bytes > 0 {
                self.output.write(self.buffered_byte, 8);
            }
            while self.num_buffered_bytes > 1 {
                self.output.write(0xff, 8);
                self.num_buffered_bytes -= 1;
            }
        }

        self.output
            .write(self.low >> 8, (24 - self.num_bits_left) as u32);
    }

    /// Bytes of all the units flushed so far.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.output.data()
    }

    #[must_use]
    pub fn into_output(self) -> BitOutputStream {
        self.output
    }
}

impl Default for BinaryArithmeticEncoder {
    fn default() -> Self {
        Self::new()
    }
}
