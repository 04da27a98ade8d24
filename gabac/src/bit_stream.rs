use crate::decoder::{GabacDecodeError, GabacDecodeResult};

/// Growable MSB-first bit sink the arithmetic encoder writes to.
#[derive(Debug, Clone, Default)]
pub struct BitOutputStream {
    data: Vec<u8>,
    held_bits: u8,
    num_held_bits: u32,
}

impl BitOutputStream {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the `num_bits` lowest bits of `value`, most significant first.
    ///
    /// # Examples
    /// ```
    /// use gabac::bit_stream::BitOutputStream;
    ///
    /// let mut stream = BitOutputStream::new();
    /// stream.write(0b101, 3);
    /// stream.write(0b1_1000, 5);
    /// assert_eq!(stream.data(), &[0b1011_1000]);
    /// ```
    #[inline]
    pub fn write(&mut self, value: u32, num_bits: u32) {
        debug_assert!(num_bits <= 32);
        debug_assert!(
            value.checked_shr(num_bits).unwrap_or(0) == 0,
            "value {:#x} does not fit in {} bits",
            value,
            num_bits
        );

        let mut acc = ((self.held_bits as u64) << num_bits) | value as u64;
        let mut pending = self.num_held_bits + num_bits;
        while pending >= 8 {
            pending -= 8;
            self.data.push((acc >> pending) as u8);
        }
        acc &= (1 << pending) - 1;

        self.held_bits = acc as u8;
        self.num_held_bits = pending;
    }

    /// Pads the stream with zero bits up to the next byte boundary.
    pub fn write_align_zero(&mut self) {
        if self.num_held_bits > 0 {
            self.write(0, 8 - self.num_held_bits);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_byte_aligned(&self) -> bool {
        self.num_held_bits == 0
    }

    /// Number of complete bytes written so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.num_held_bits == 0
    }

    /// Complete bytes written so far; bits of an unfinished byte are not
    /// included.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the written bytes.
    ///
    /// # Panics
    /// Panics if the stream is not byte-aligned.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        assert!(
            self.is_byte_aligned(),
            "Bit output stream is not byte-aligned"
        );

        self.data
    }
}

/// Cursor over the bytes of an encoded stream.
///
/// The arithmetic decoder only ever consumes whole bytes, so the stream is
/// always byte-aligned.
#[derive(Debug, Clone)]
pub struct BitInputStream<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitInputStream<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    pub fn read_byte(&mut self) -> GabacDecodeResult<u8> {
        let byte = *self
            .data
            .get(self.position)
            .ok_or_else(|| GabacDecodeError::unexpected_end_of_stream(self.position))?;
        self.position += 1;

        Ok(byte)
    }

    /// The most recently read byte, if any.
    #[inline]
    #[must_use]
    pub fn peek_previous_byte(&self) -> Option<u8> {
        self.position
            .checked_sub(1)
            .map(|position| self.data[position])
    }

    #[inline]
    #[must_use]
    pub fn bytes_read(&self) -> usize {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

#[cfg(test)]
mod tests {
    use crate::bit_stream::{BitInputStream, BitOutputStream};
    use crate::decoder::GabacDecodeError;

    #[test]
    fn write_bits_across_bytes() {
        let mut stream = BitOutputStream::new();
        stream.write(0b1, 1);
        stream.write(0x3ff, 10);
        stream.write(0, 5);
        stream.write(0xdead_beef, 32);

        assert!(stream.is_byte_aligned());
        assert_eq!(stream.data(), &[0xff, 0xe0, 0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn write_zero_bits() {
        let mut stream = BitOutputStream::new();
        stream.write(0, 0);
        assert!(stream.is_empty());
    }

    #[test]
    fn align_zero() {
        let mut stream = BitOutputStream::new();
        stream.write(0b11, 2);
        assert!(!stream.is_byte_aligned());
        assert_eq!(stream.len(), 0);

        stream.write_align_zero();
        assert!(stream.is_byte_aligned());
        stream.write_align_zero();

        assert_eq!(stream.into_inner(), vec![0b1100_0000]);
    }

    #[test]
    #[should_panic(expected = "not byte-aligned")]
    fn into_inner_unaligned() {
        let mut stream = BitOutputStream::new();
        stream.write(1, 1);
        let _ = stream.into_inner();
    }

    #[test]
    fn read_bytes() {
        let data = [0x12, 0x34];
        let mut stream = BitInputStream::new(&data);
        assert_eq!(stream.peek_previous_byte(), None);

        assert_eq!(stream.read_byte().unwrap(), 0x12);
        assert_eq!(stream.peek_previous_byte(), Some(0x12));
        assert_eq!(stream.read_byte().unwrap(), 0x34);
        assert_eq!(stream.bytes_read(), 2);
        assert_eq!(stream.remaining(), 0);

        assert!(matches!(
            stream.read_byte(),
            Err(GabacDecodeError::UnexpectedEndOfStream(2))
        ));
    }
}
