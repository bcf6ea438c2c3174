//! # Bit Reader
//!
//! Mirror image of [`BitWriter`](crate::BitWriter). Every `write_*` has a
//! `read_*` that consumes exactly the bits it produced.
//!
//! Reading past the declared bit count returns zero, latches the sticky
//! overflow flag and never touches memory outside the storage.
//!
//! Beyond plain reads the reader can look ahead without consuming
//! ([`BitReader::peek_unsigned_bits`]), compare encoded fields without
//! decoding them ([`BitReader::compare_bits`]) and cut a bit range out of the
//! stream in place ([`BitReader::excise_bits`]).

use crate::coord::{
    mp_fraction_bits, mp_integer_bits, COORD_FRACTIONAL_BITS, COORD_INTEGER_BITS,
    COORD_MP_MULTIPLIERS, COORD_MP_PAYLOAD_BITS, COORD_RAW_PAYLOAD_BITS, COORD_RESOLUTION,
    MP_INTEGER, MP_IN_BOUNDS, MP_SIGN, NORMAL_DENOMINATOR, NORMAL_FRACTIONAL_BITS,
};
use crate::cursor::BitCursor;
use crate::error::{BitBufError, BitBufResult};
use crate::varint::{
    zigzag_decode32, zigzag_decode64, MAX_VARINT32_BYTES, MAX_VARINT64_BYTES, UBIT_VAR_WIDTHS,
};
use crate::word::{self, EXTRA_MASKS};
use crate::writer::BitWriter;

/// Bit-packed stream reader over any byte range.
///
/// Unlike the writer, storage may be any length. An explicit bit count lets
/// the reader stop short of the last byte.
#[derive(Clone, Debug)]
pub struct BitReader<B> {
    /// Backing storage.
    data: B,
    /// Position, capacity and overflow state.
    cursor: BitCursor,
}

impl<B: AsRef<[u8]>> BitReader<B> {
    /// Creates a reader over every bit of `data`.
    ///
    /// # Panics
    ///
    /// Panics if `data` holds more than `u32::MAX` bits.
    #[must_use]
    pub fn new(data: B) -> Self {
        match Self::try_new(data) {
            Ok(reader) => reader,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a reader over every bit of `data`.
    pub fn try_new(data: B) -> BitBufResult<Self> {
        let bytes = data.as_ref().len();
        let bits = bytes as u64 * 8;
        let bits =
            u32::try_from(bits).map_err(|_| BitBufError::BitCountExceedsBuffer { bits, bytes })?;
        Ok(Self {
            data,
            cursor: BitCursor::new(bits),
        })
    }

    /// Creates a reader over the first `bit_count` bits of `data`.
    ///
    /// # Panics
    ///
    /// Panics if `bit_count` exceeds the storage.
    #[must_use]
    pub fn with_bit_count(data: B, bit_count: u32) -> Self {
        match Self::try_with_bit_count(data, bit_count) {
            Ok(reader) => reader,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a reader over the first `bit_count` bits of `data`.
    pub fn try_with_bit_count(data: B, bit_count: u32) -> BitBufResult<Self> {
        let bytes = data.as_ref().len();
        if u64::from(bit_count) > bytes as u64 * 8 {
            return Err(BitBufError::BitCountExceedsBuffer {
                bits: u64::from(bit_count),
                bytes,
            });
        }
        Ok(Self {
            data,
            cursor: BitCursor::new(bit_count),
        })
    }

    // =========================================================================
    // Cursor state
    // =========================================================================

    /// Bits consumed so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.cursor.position()
    }

    /// Bytes touched so far, counting a partial last byte.
    #[inline]
    #[must_use]
    pub const fn bytes_read(&self) -> usize {
        self.cursor.position().div_ceil(8) as usize
    }

    /// Bits still available.
    #[inline]
    #[must_use]
    pub const fn bits_left(&self) -> u32 {
        self.cursor.bits_left()
    }

    /// Whole bytes still available.
    #[inline]
    #[must_use]
    pub const fn bytes_left(&self) -> u32 {
        self.cursor.bits_left() >> 3
    }

    /// Declared length of the stream in bits.
    #[inline]
    #[must_use]
    pub const fn capacity_bits(&self) -> u32 {
        self.cursor.capacity_bits()
    }

    /// Returns true once any read has run past the end of the stream.
    #[inline]
    #[must_use]
    pub const fn is_overflowed(&self) -> bool {
        self.cursor.is_overflowed()
    }

    /// Sets the label reported when this reader overflows.
    pub fn set_debug_label(&mut self, label: &'static str) {
        self.cursor.set_label(label);
    }

    /// Turns the sticky overflow flag into a result.
    pub fn check(&self) -> BitBufResult<()> {
        self.cursor.check()
    }

    /// Back to bit 0 with the overflow flag cleared.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    /// Moves to an absolute bit offset.
    pub fn seek(&mut self, bit: u32) -> bool {
        self.cursor.seek(bit)
    }

    /// Moves by a signed number of bits.
    pub fn seek_relative(&mut self, delta: i32) -> bool {
        self.cursor.seek_relative(delta)
    }

    /// The whole backing storage.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Releases the backing storage.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.data
    }

    // =========================================================================
    // Integers
    // =========================================================================

    /// Reads `width` (0..=32) bits as an unsigned value.
    #[inline]
    pub fn read_unsigned_bits(&mut self, width: u32) -> u32 {
        debug_assert!(width <= 32, "bit width {width} out of range");
        let width = width.min(32);
        let position = self.cursor.position();
        if !self.cursor.reserve(width) {
            return 0;
        }
        word::extract_bits(self.data.as_ref(), position, width)
    }

    /// Reads a `width`-bit two's complement field and sign-extends it.
    #[inline]
    pub fn read_signed_bits(&mut self, width: u32) -> i32 {
        let width = width.min(32);
        if width == 0 {
            return 0;
        }
        let shift = 32 - width;
        ((self.read_unsigned_bits(width) << shift) as i32) >> shift
    }

    /// Reads a single bit.
    #[inline]
    pub fn read_bit(&mut self) -> bool {
        let position = self.cursor.position();
        if !self.cursor.reserve(1) {
            return false;
        }
        let byte = self.data.as_ref()[(position >> 3) as usize];
        (byte >> (position & 7)) & 1 != 0
    }

    /// Reads a value written by [`BitWriter::write_ubit_var`].
    pub fn read_ubit_var(&mut self) -> u32 {
        let selector = self.read_unsigned_bits(2);
        self.read_unsigned_bits(UBIT_VAR_WIDTHS[selector as usize])
    }

    /// Reads a 7-bits-per-byte varint. Stops after 5 bytes whatever the
    /// continuation bit says.
    pub fn read_var_u32(&mut self) -> u32 {
        self.read_varint(MAX_VARINT32_BYTES) as u32
    }

    /// Reads a 7-bits-per-byte varint. Stops after 10 bytes whatever the
    /// continuation bit says.
    pub fn read_var_u64(&mut self) -> u64 {
        self.read_varint(MAX_VARINT64_BYTES)
    }

    /// Reads a zigzag-folded varint.
    pub fn read_signed_var_i32(&mut self) -> i32 {
        zigzag_decode32(self.read_var_u32())
    }

    /// Reads a zigzag-folded varint.
    pub fn read_signed_var_i64(&mut self) -> i64 {
        zigzag_decode64(self.read_var_u64())
    }

    fn read_varint(&mut self, max_bytes: u32) -> u64 {
        let mut result = 0u64;
        for i in 0..max_bytes {
            let byte = self.read_unsigned_bits(8);
            result |= u64::from(byte & 0x7F) << (7 * i);
            if byte & 0x80 == 0 {
                break;
            }
        }
        result
    }

    /// Reads 8 bits.
    pub fn read_u8(&mut self) -> u8 {
        self.read_unsigned_bits(8) as u8
    }

    /// Reads 8 bits.
    pub fn read_i8(&mut self) -> i8 {
        self.read_signed_bits(8) as i8
    }

    /// Reads 16 bits.
    pub fn read_u16(&mut self) -> u16 {
        self.read_unsigned_bits(16) as u16
    }

    /// Reads 16 bits.
    pub fn read_i16(&mut self) -> i16 {
        self.read_signed_bits(16) as i16
    }

    /// Reads 32 bits.
    pub fn read_u32(&mut self) -> u32 {
        self.read_unsigned_bits(32)
    }

    /// Reads 32 bits.
    pub fn read_i32(&mut self) -> i32 {
        self.read_signed_bits(32)
    }

    /// Reads 64 bits, low word first.
    pub fn read_u64(&mut self) -> u64 {
        let low = self.read_unsigned_bits(32);
        let high = self.read_unsigned_bits(32);
        u64::from(low) | (u64::from(high) << 32)
    }

    /// Reads 64 bits, low word first.
    pub fn read_i64(&mut self) -> i64 {
        self.read_u64() as i64
    }

    /// Reads raw IEEE-754 bits.
    pub fn read_f32(&mut self) -> f32 {
        f32::from_bits(self.read_unsigned_bits(32))
    }

    // =========================================================================
    // Quantized floats
    // =========================================================================

    /// Reads a coord written by [`BitWriter::write_coord`].
    pub fn read_coord(&mut self) -> f32 {
        let has_integer = self.read_bit();
        let has_fraction = self.read_bit();
        if !has_integer && !has_fraction {
            return 0.0;
        }

        let negative = self.read_bit();
        let integer = if has_integer {
            self.read_unsigned_bits(COORD_INTEGER_BITS) + 1
        } else {
            0
        };
        let fraction = if has_fraction {
            self.read_unsigned_bits(COORD_FRACTIONAL_BITS)
        } else {
            0
        };

        let value = integer as f32 + fraction as f32 * COORD_RESOLUTION;
        if negative {
            -value
        } else {
            value
        }
    }

    /// Reads a coord written by [`BitWriter::write_coord_mp`] with the same
    /// mode flags.
    pub fn read_coord_mp(&mut self, integral: bool, low_precision: bool) -> f32 {
        if integral {
            let flags = self.read_unsigned_bits(2);
            if flags & MP_INTEGER == 0 {
                return 0.0;
            }
            // Sign in the low bit, integer above it.
            let bits = self.read_unsigned_bits(mp_integer_bits(flags & MP_IN_BOUNDS != 0) + 1);
            let value = ((bits >> 1) + 1) as f32;
            return if bits & 1 != 0 { -value } else { value };
        }

        let flags = self.read_unsigned_bits(3);
        let low = u32::from(low_precision);
        let index = (flags & (MP_IN_BOUNDS | MP_INTEGER)) + 4 * low;
        let mut fixed = self.read_unsigned_bits(COORD_MP_PAYLOAD_BITS[index as usize]);

        if flags & MP_INTEGER != 0 {
            // Payload is [int - 1][frac]; rebuild it as one fixed point number.
            let integer_bits = mp_integer_bits(flags & MP_IN_BOUNDS != 0);
            let integer = (fixed & EXTRA_MASKS[integer_bits as usize]) + 1;
            fixed = (fixed >> integer_bits) | (integer << mp_fraction_bits(low_precision));
        }

        let sign = u32::from(flags & MP_SIGN != 0);
        fixed as f32 * COORD_MP_MULTIPLIERS[(sign + 2 * low) as usize]
    }

    /// Reads an angle in degrees, `[0, 360)`.
    pub fn read_angle(&mut self, bits: u32) -> f32 {
        debug_assert!((1..=32).contains(&bits), "angle width {bits} out of range");
        let bits = bits.min(32);
        let step = self.read_unsigned_bits(bits);
        (f64::from(step) * 360.0 / (1u64 << bits) as f64) as f32
    }

    /// Reads one unit-vector component in `[-1, 1]`.
    pub fn read_normal(&mut self) -> f32 {
        let negative = self.read_bit();
        let fraction = self.read_unsigned_bits(NORMAL_FRACTIONAL_BITS);
        let value = fraction as f32 / NORMAL_DENOMINATOR as f32;
        if negative {
            -value
        } else {
            value
        }
    }

    /// Reads a position written by [`BitWriter::write_vec3_coord`].
    pub fn read_vec3_coord(&mut self) -> [f32; 3] {
        let present = [self.read_bit(), self.read_bit(), self.read_bit()];
        present.map(|flag| if flag { self.read_coord() } else { 0.0 })
    }

    /// Reads pitch, yaw and roll written by [`BitWriter::write_angles`].
    pub fn read_angles(&mut self) -> [f32; 3] {
        self.read_vec3_coord()
    }

    /// Reads a unit vector written by [`BitWriter::write_vec3_normal`].
    pub fn read_vec3_normal(&mut self) -> [f32; 3] {
        let present = [self.read_bit(), self.read_bit()];
        let [x, y] = present.map(|flag| if flag { self.read_normal() } else { 0.0 });
        let negative_z = self.read_bit();

        let planar = x * x + y * y;
        let z = if planar < 1.0 { (1.0 - planar).sqrt() } else { 0.0 };
        [x, y, if negative_z { -z } else { z }]
    }

    /// Consumes one coord and returns its raw bits as `flags | payload << 2`.
    pub fn read_coord_bits(&mut self) -> u32 {
        let flags = self.read_unsigned_bits(2);
        if flags == 0 {
            return 0;
        }
        let payload = self.read_unsigned_bits(COORD_RAW_PAYLOAD_BITS[(flags - 1) as usize]);
        flags | (payload << 2)
    }

    /// Consumes one multiplayer coord and returns its raw bits, payload
    /// packed above the flag bits.
    pub fn read_coord_mp_bits(&mut self, integral: bool, low_precision: bool) -> u32 {
        if integral {
            let flags = self.read_unsigned_bits(2);
            if flags & MP_INTEGER == 0 {
                return flags;
            }
            let payload = self.read_unsigned_bits(mp_integer_bits(flags & MP_IN_BOUNDS != 0) + 1);
            return flags | (payload << 2);
        }

        let flags = self.read_unsigned_bits(3);
        let index = (flags & (MP_IN_BOUNDS | MP_INTEGER)) + 4 * u32::from(low_precision);
        let payload = self.read_unsigned_bits(COORD_MP_PAYLOAD_BITS[index as usize]);
        flags | (payload << 3)
    }

    // =========================================================================
    // Bulk
    // =========================================================================

    /// Reads `bit_count` bits into `out`, low bit of each byte first.
    ///
    /// At most `8 * out.len()` bits are stored; any excess is skipped. Returns
    /// the number of bits stored. If the stream is shorter than `bit_count`,
    /// `out` is zeroed, the overflow flag latches and 0 is returned.
    pub fn read_bits(&mut self, out: &mut [u8], bit_count: u32) -> u32 {
        if bit_count > self.cursor.bits_left() {
            self.cursor.latch_overflow(bit_count);
            out.fill(0);
            return 0;
        }

        let stored = u32::try_from(out.len() as u64 * 8).map_or(bit_count, |room| room.min(bit_count));
        let mut left = stored;
        let mut offset = 0;

        let position = self.cursor.position();
        if position & 7 == 0 && left >= 32 {
            let len = (left >> 3) as usize;
            let start = (position >> 3) as usize;
            out[..len].copy_from_slice(&self.data.as_ref()[start..start + len]);
            self.cursor.set_position(position + len as u32 * 8);
            offset = len;
            left -= len as u32 * 8;
        }

        let whole = (left >> 3) as usize;
        for byte in &mut out[offset..offset + whole] {
            *byte = self.read_u8();
        }
        left &= 7;
        if left > 0 {
            out[offset + whole] = self.read_unsigned_bits(left) as u8;
        }

        let skipped = bit_count - stored;
        if skipped > 0 {
            self.cursor.set_position(self.cursor.position() + skipped);
        }
        stored
    }

    /// Fills `out` with the next `out.len()` bytes.
    pub fn read_bytes(&mut self, out: &mut [u8]) -> bool {
        match u32::try_from(out.len() as u64 * 8) {
            Ok(bits) => {
                self.read_bits(out, bits);
            }
            Err(_) => {
                self.cursor.latch_overflow(u32::MAX);
                out.fill(0);
            }
        }
        !self.cursor.is_overflowed()
    }

    /// Reads 8-bit characters through a NUL (or, with `stop_at_newline`, a
    /// newline) and decodes them as UTF-8, replacing invalid sequences.
    ///
    /// The terminator is always consumed. More than `limit` characters before
    /// it is [`BitBufError::StringTooLong`].
    pub fn read_string(&mut self, limit: usize, stop_at_newline: bool) -> BitBufResult<String> {
        let mut bytes = Vec::new();
        let mut truncated = false;
        loop {
            let byte = self.read_u8();
            self.cursor.check()?;
            if byte == 0 || (stop_at_newline && byte == b'\n') {
                break;
            }
            if bytes.len() < limit {
                bytes.push(byte);
            } else {
                truncated = true;
            }
        }

        if truncated {
            return Err(BitBufError::StringTooLong { limit });
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    // =========================================================================
    // Look-ahead and comparison
    // =========================================================================

    /// Reads `width` bits without consuming them. Position and overflow state
    /// are restored afterwards.
    pub fn peek_unsigned_bits(&mut self, width: u32) -> u32 {
        let saved = self.cursor;
        let value = self.read_unsigned_bits(width);
        self.cursor = saved;
        value
    }

    /// Reads `width` bits, then rewinds the cursor. Unlike
    /// [`peek_unsigned_bits`](Self::peek_unsigned_bits) an overflow stays
    /// latched.
    pub fn check_read_unsigned_bits(&mut self, width: u32) -> u32 {
        let position = self.cursor.position();
        let value = self.read_unsigned_bits(width);
        self.cursor.set_position(position);
        value
    }

    /// Consumes `width` bits from both readers and returns true if they
    /// differ anywhere.
    pub fn compare_bits<O: AsRef<[u8]>>(&mut self, other: &mut BitReader<O>, width: u32) -> bool {
        let mut left = width;
        let mut differ = false;
        while left > 0 {
            let chunk = left.min(32);
            differ |= self.read_unsigned_bits(chunk) != other.read_unsigned_bits(chunk);
            left -= chunk;
        }
        differ
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BitReader<B> {
    /// Cuts `count` bits out of the stream at `start`.
    ///
    /// Everything after the cut slides down to `start`, the stream shrinks by
    /// `count` bits and the cursor lands on `start`. A range past the end of
    /// the stream latches the overflow flag and changes nothing.
    pub fn excise_bits(&mut self, start: u32, count: u32) -> bool {
        let capacity = self.cursor.capacity_bits();
        let Some(end) = start.checked_add(count).filter(|&end| end <= capacity) else {
            self.cursor.latch_overflow(count);
            return false;
        };

        let mut tail = BitWriter::resume(self.data.as_mut(), start, capacity);
        let mut source = end;
        let mut left = capacity - end;
        while left > 0 {
            let chunk = left.min(32);
            let value = word::extract_bits(tail.data(), source, chunk);
            tail.write_unsigned_bits(value, chunk);
            source += chunk;
            left -= chunk;
        }

        self.cursor.shrink(count);
        self.cursor.set_position(start);
        tracing::debug!(
            label = self.cursor.label(),
            start,
            count,
            capacity = self.cursor.capacity_bits(),
            "excised bits"
        );
        true
    }
}
