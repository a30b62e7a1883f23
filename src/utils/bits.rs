use crate::error::{DemuxError, Result};

/// A bit-level reader for parsing codec bitstreams.
///
/// Reads most-significant bit first and implements the H.264/H.265 style
/// operations downstream codec parsers need:
/// - Reading individual bits
/// - Reading fixed-width fields of up to 32 bits
/// - Reading exponential Golomb codes (ue(v) and se(v))
///
/// Example:
/// ```
/// use tsdemux::utils::BitReader;
///
/// let data = [0b10110011];
/// let mut reader = BitReader::new(&data);
///
/// assert_eq!(reader.read_bit().unwrap(), 1);
/// assert_eq!(reader.read_bits(3).unwrap(), 0b011);
/// ```
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_offset: usize,
    bit_offset: u8,
}

impl<'a> BitReader<'a> {
    /// Creates a new BitReader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Reads a single bit and returns it as 0 or 1.
    ///
    /// Returns `EndOfData` once the cursor is past the last byte.
    pub fn read_bit(&mut self) -> Result<u8> {
        if self.byte_offset >= self.data.len() {
            return Err(DemuxError::EndOfData);
        }

        let bit = (self.data[self.byte_offset] >> (7 - self.bit_offset)) & 1;
        self.bit_offset += 1;

        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }

        Ok(bit)
    }

    /// Reads `n` bits MSB-first and returns them as an unsigned number.
    ///
    /// Fails with `InvalidArgument` if `n > 32` and with `EndOfData` if the
    /// buffer runs out. On `EndOfData` the cursor stays where the failing
    /// bit would have been read; the bits consumed so far are not restored.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > 32 {
            return Err(DemuxError::InvalidArgument(format!(
                "cannot read {} bits at once (max 32)",
                n
            )));
        }

        let mut value = 0u64;
        for _ in 0..n {
            value = (value << 1) | self.read_bit()? as u64;
        }

        Ok(value as u32)
    }

    /// Reads an unsigned exponential Golomb code (ue(v)) as defined by H.264/H.265.
    ///
    /// Format:
    /// 1. M leading zeros followed by a 1
    /// 2. M more INFO bits
    /// 3. Value = 2^M + INFO - 1
    ///
    /// Example: "00110" (M=2, INFO=10)
    /// - Count zeros until 1: M=2
    /// - Read 2 more bits: INFO=10=2
    /// - Value = 2^2 + 2 - 1 = 5
    ///
    /// Codes with more than 31 leading zeros do not fit in a `u32` and are
    /// rejected with `InvalidData`.
    pub fn read_exp_golomb(&mut self) -> Result<u32> {
        let mut leading_zeros = 0u32;
        while self.read_bit()? == 0 {
            leading_zeros += 1;
            if leading_zeros > 31 {
                return Err(DemuxError::InvalidData(
                    "exp-golomb code longer than 32 bits".into(),
                ));
            }
        }

        if leading_zeros == 0 {
            return Ok(0);
        }

        let rest = self.read_bits(leading_zeros)?;
        Ok((1u32 << leading_zeros) - 1 + rest)
    }

    /// Reads a signed exponential Golomb code (se(v)).
    ///
    /// The unsigned code k maps to `(k+1)/2` when odd and `-k/2` when even:
    /// 0, 1, -1, 2, -2, ...
    pub fn read_signed_exp_golomb(&mut self) -> Result<i32> {
        let k = self.read_exp_golomb()? as u64;
        let magnitude = ((k + 1) >> 1) as i32;
        if k & 1 == 1 {
            Ok(magnitude)
        } else {
            Ok(-magnitude)
        }
    }

    /// Skips n bits in the stream.
    pub fn skip_bits(&mut self, n: u32) -> Result<()> {
        for _ in 0..n {
            self.read_bit()?;
        }
        Ok(())
    }

    /// Aligns reader to next byte boundary by skipping remaining bits in current byte.
    pub fn align_byte(&mut self) {
        if self.bit_offset != 0 {
            self.bit_offset = 0;
            self.byte_offset += 1;
        }
    }

    /// Returns number of bits available to read.
    pub fn available_bits(&self) -> usize {
        (self.data.len() - self.byte_offset) * 8 - self.bit_offset as usize
    }

    /// Returns the cursor as an absolute bit index from the start of the buffer.
    pub fn position(&self) -> usize {
        self.byte_offset * 8 + self.bit_offset as usize
    }
}
