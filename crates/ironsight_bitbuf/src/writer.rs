//! # Bit Writer
//!
//! Packs typed values into a pre-sized buffer at bit granularity.
//!
//! ## Failure Model
//!
//! Nothing here panics or returns an error for running out of room. The first
//! write that does not fit latches the sticky overflow flag, clamps the cursor
//! and leaves storage untouched; every later write is a no-op. Check the flag
//! once per message with [`BitWriter::check`].
//!
//! ```text
//! write_unsigned_bits(0b101, 3) at bit 30:
//!
//!   word 0: ..........................[1 0] ← bits 30..31
//!   word 1: [...............................1] ← bit 0
//! ```

use crate::coord::{
    coord_parts, mp_fraction_bits, mp_integer_bits, mp_resolution, normal_fraction,
    truncate_snapped, COORD_FRACTIONAL_BITS, COORD_INTEGER_BITS, COORD_INTEGER_BITS_MP,
    COORD_RESOLUTION, NORMAL_FRACTIONAL_BITS, NORMAL_RESOLUTION,
};
use crate::cursor::BitCursor;
use crate::error::{BitBufError, BitBufResult};
use crate::reader::BitReader;
use crate::varint::{
    encode_varint, ubit_var_selector, varint32_len, varint64_len, zigzag_encode32,
    zigzag_encode64, MAX_VARINT32_BYTES, MAX_VARINT64_BYTES, UBIT_VAR_WIDTHS,
};
use crate::word::{self, EXTRA_MASKS};

/// Bit-packed stream writer over caller-provided storage.
///
/// `B` is any owned or borrowed byte buffer (`Vec<u8>`, `&mut [u8]`,
/// `[u8; N]`, ...). Its length must be a multiple of 4 bytes.
///
/// # Example
///
/// ```rust
/// use ironsight_bitbuf::{BitReader, BitWriter};
///
/// let mut writer = BitWriter::new([0u8; 16]);
/// writer.write_unsigned_bits(37, 6);
/// writer.write_signed_var_i32(-300);
/// assert!(writer.check().is_ok());
///
/// let mut reader = BitReader::with_bit_count(writer.as_bytes(), writer.position());
/// assert_eq!(reader.read_unsigned_bits(6), 37);
/// assert_eq!(reader.read_signed_var_i32(), -300);
/// ```
#[derive(Clone, Debug)]
pub struct BitWriter<B> {
    /// Backing storage.
    data: B,
    /// Position, capacity and overflow state.
    cursor: BitCursor,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BitWriter<B> {
    /// Creates a writer over the whole of `data`.
    ///
    /// # Panics
    ///
    /// Panics if `data` is not a whole number of 32-bit words. That is a
    /// sizing bug in the caller, not a runtime condition.
    #[must_use]
    pub fn new(data: B) -> Self {
        match Self::try_new(data) {
            Ok(writer) => writer,
            Err(err) => panic!("{err}"),
        }
    }

    /// Creates a writer over the whole of `data`, rejecting misaligned storage.
    pub fn try_new(data: B) -> BitBufResult<Self> {
        let len = data.as_ref().len();
        let bits = len as u64 * 8;
        let bits = u32::try_from(bits)
            .map_err(|_| BitBufError::BitCountExceedsBuffer { bits, bytes: len })?;
        Self::try_with_bit_limit(data, bits)
    }

    /// Creates a writer that may only touch the first `max_bits` bits of
    /// `data`.
    pub fn try_with_bit_limit(data: B, max_bits: u32) -> BitBufResult<Self> {
        let len = data.as_ref().len();
        if len % 4 != 0 {
            return Err(BitBufError::MisalignedBuffer { len });
        }
        if u64::from(max_bits) > len as u64 * 8 {
            return Err(BitBufError::BitCountExceedsBuffer {
                bits: u64::from(max_bits),
                bytes: len,
            });
        }
        Ok(Self {
            data,
            cursor: BitCursor::new(max_bits),
        })
    }

    /// Picks up writing at `position` inside an already validated range.
    /// Storage need not be word-aligned.
    pub(crate) fn resume(data: B, position: u32, capacity_bits: u32) -> Self {
        debug_assert!(u64::from(capacity_bits) <= data.as_ref().len() as u64 * 8);
        let mut cursor = BitCursor::new(capacity_bits);
        cursor.set_position(position);
        Self { data, cursor }
    }

    // =========================================================================
    // Cursor state
    // =========================================================================

    /// Bits written so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.cursor.position()
    }

    /// Bytes touched so far, counting a partial last byte.
    #[inline]
    #[must_use]
    pub const fn bytes_written(&self) -> usize {
        self.cursor.position().div_ceil(8) as usize
    }

    /// Bits that still fit.
    #[inline]
    #[must_use]
    pub const fn bits_left(&self) -> u32 {
        self.cursor.bits_left()
    }

    /// Whole bytes that still fit.
    #[inline]
    #[must_use]
    pub const fn bytes_left(&self) -> u32 {
        self.cursor.bits_left() >> 3
    }

    /// Total capacity in bits.
    #[inline]
    #[must_use]
    pub const fn capacity_bits(&self) -> u32 {
        self.cursor.capacity_bits()
    }

    /// Returns true once any write has failed for lack of room.
    #[inline]
    #[must_use]
    pub const fn is_overflowed(&self) -> bool {
        self.cursor.is_overflowed()
    }

    /// Sets the label reported when this writer overflows.
    pub fn set_debug_label(&mut self, label: &'static str) {
        self.cursor.set_label(label);
    }

    /// Turns the sticky overflow flag into a result.
    pub fn check(&self) -> BitBufResult<()> {
        self.cursor.check()
    }

    /// Starts over at bit 0 with the overflow flag cleared. Storage is kept.
    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    /// Moves the write cursor, e.g. to back-patch a length field.
    ///
    /// Refused once the writer has overflowed, so a failed message stays
    /// frozen until [`reset`](Self::reset).
    pub fn seek_to_bit(&mut self, bit: u32) -> bool {
        if self.cursor.is_overflowed() {
            return false;
        }
        self.cursor.seek(bit)
    }

    /// The written range.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data.as_ref()[..self.bytes_written()]
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

    /// Writes the low `width` (0..=32) bits of `value`.
    #[inline]
    pub fn write_unsigned_bits(&mut self, value: u32, width: u32) {
        debug_assert!(width <= 32, "bit width {width} out of range");
        let width = width.min(32);
        let position = self.cursor.position();
        if !self.cursor.reserve(width) {
            return;
        }
        word::splice_bits(self.data.as_mut(), position, value, width);
    }

    /// Writes `value` as a `width`-bit two's complement field whose top bit
    /// carries the sign.
    #[inline]
    pub fn write_signed_bits(&mut self, value: i32, width: u32) {
        let width = width.min(32);
        if width == 0 {
            return;
        }
        let preserve = 0x7FFF_FFFFu32 >> (32 - width);
        let sign_extension = ((value >> 31) as u32) & !preserve;
        self.write_unsigned_bits((value as u32 & preserve) | sign_extension, width);
    }

    /// Writes a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        let position = self.cursor.position();
        if !self.cursor.reserve(1) {
            return;
        }
        let data = self.data.as_mut();
        let index = (position >> 5) as usize;
        let mask = 1u32 << (position & 31);
        let current = word::load_le_word(data, index);
        let updated = if bit { current | mask } else { current & !mask };
        word::store_le_word(data, index, updated);
    }

    /// Writes a 2-bit size selector followed by `value` in 4, 8, 12 or 32
    /// bits.
    pub fn write_ubit_var(&mut self, value: u32) {
        let selector = ubit_var_selector(value);
        self.write_unsigned_bits(selector, 2);
        self.write_unsigned_bits(value, UBIT_VAR_WIDTHS[selector as usize]);
    }

    /// Writes a 7-bits-per-byte varint (1..=5 bytes).
    pub fn write_var_u32(&mut self, value: u32) {
        self.write_varint(u64::from(value), varint32_len(value), MAX_VARINT32_BYTES);
    }

    /// Writes a 7-bits-per-byte varint (1..=10 bytes).
    pub fn write_var_u64(&mut self, value: u64) {
        self.write_varint(value, varint64_len(value), MAX_VARINT64_BYTES);
    }

    /// Writes a zigzag-folded varint.
    pub fn write_signed_var_i32(&mut self, value: i32) {
        self.write_var_u32(zigzag_encode32(value));
    }

    /// Writes a zigzag-folded varint.
    pub fn write_signed_var_i64(&mut self, value: i64) {
        self.write_var_u64(zigzag_encode64(value));
    }

    fn write_varint(&mut self, value: u64, len: u32, max_len: u32) {
        let position = self.cursor.position();
        if position & 7 == 0 && self.cursor.bits_left() >= max_len * 8 {
            // Byte-aligned with room for the longest encoding: store bytes directly.
            let start = (position >> 3) as usize;
            encode_varint(value, &mut self.data.as_mut()[start..start + len as usize]);
            self.cursor.set_position(position + len * 8);
            return;
        }

        let mut value = value;
        while value > 0x7F {
            self.write_unsigned_bits((value as u32 & 0x7F) | 0x80, 8);
            value >>= 7;
        }
        self.write_unsigned_bits(value as u32, 8);
    }

    /// Writes 8 bits.
    pub fn write_u8(&mut self, value: u8) {
        self.write_unsigned_bits(u32::from(value), 8);
    }

    /// Writes 8 bits.
    pub fn write_i8(&mut self, value: i8) {
        self.write_signed_bits(i32::from(value), 8);
    }

    /// Writes 16 bits.
    pub fn write_u16(&mut self, value: u16) {
        self.write_unsigned_bits(u32::from(value), 16);
    }

    /// Writes 16 bits.
    pub fn write_i16(&mut self, value: i16) {
        self.write_signed_bits(i32::from(value), 16);
    }

    /// Writes 32 bits.
    pub fn write_u32(&mut self, value: u32) {
        self.write_unsigned_bits(value, 32);
    }

    /// Writes 32 bits.
    pub fn write_i32(&mut self, value: i32) {
        self.write_signed_bits(value, 32);
    }

    /// Writes 64 bits, low word first.
    pub fn write_u64(&mut self, value: u64) {
        self.write_unsigned_bits(value as u32, 32);
        self.write_unsigned_bits((value >> 32) as u32, 32);
    }

    /// Writes 64 bits, low word first.
    pub fn write_i64(&mut self, value: i64) {
        self.write_u64(value as u64);
    }

    /// Writes the raw IEEE-754 bits of `value`.
    pub fn write_f32(&mut self, value: f32) {
        self.write_unsigned_bits(value.to_bits(), 32);
    }

    // =========================================================================
    // Quantized floats
    // =========================================================================

    /// Writes a world coordinate at 1/16 resolution.
    ///
    /// `0.0` costs two bits. Anything else is a sign bit plus whichever of
    /// the integer and fraction fields are non-zero.
    pub fn write_coord(&mut self, value: f32) {
        let negative = value <= -COORD_RESOLUTION;
        let (integer, fraction) = coord_parts(value, COORD_FRACTIONAL_BITS);

        self.write_bit(integer != 0);
        self.write_bit(fraction != 0);
        if integer == 0 && fraction == 0 {
            return;
        }

        self.write_bit(negative);
        if integer != 0 {
            // [1..=max] travels as [0..max)
            self.write_unsigned_bits(integer - 1, COORD_INTEGER_BITS);
        }
        if fraction != 0 {
            self.write_unsigned_bits(fraction, COORD_FRACTIONAL_BITS);
        }
    }

    /// Writes a bandwidth-tuned world coordinate.
    ///
    /// `integral` drops the fraction entirely; `low_precision` keeps it at
    /// 1/8 instead of 1/16. Integer parts below 2048 use the short field.
    pub fn write_coord_mp(&mut self, value: f32, integral: bool, low_precision: bool) {
        let negative = value <= -mp_resolution(low_precision);
        let (integer, fraction) = coord_parts(value, mp_fraction_bits(low_precision));
        let in_bounds = integer < (1 << COORD_INTEGER_BITS_MP);

        self.write_bit(in_bounds);
        self.write_bit(integer != 0);

        if integral {
            if integer != 0 {
                self.write_bit(negative);
                self.write_unsigned_bits(integer - 1, mp_integer_bits(in_bounds));
            }
            return;
        }

        self.write_bit(negative);
        if integer != 0 {
            self.write_unsigned_bits(integer - 1, mp_integer_bits(in_bounds));
        }
        self.write_unsigned_bits(fraction, mp_fraction_bits(low_precision));
    }

    /// Writes an angle in degrees as a `bits`-wide fraction of a full turn.
    /// Angles wrap, so any input is in range.
    pub fn write_angle(&mut self, degrees: f32, bits: u32) {
        debug_assert!((1..=32).contains(&bits), "angle width {bits} out of range");
        let bits = bits.min(32);
        if bits == 0 {
            return;
        }
        let steps = (1u64 << bits) as f64;
        let step = truncate_snapped(f64::from(degrees) / 360.0 * steps);
        self.write_unsigned_bits(step as u32 & EXTRA_MASKS[bits as usize], bits);
    }

    /// Writes one component of a unit vector: sign bit plus 11-bit magnitude.
    pub fn write_normal(&mut self, value: f32) {
        let fraction = normal_fraction(value);
        self.write_bit(fraction != 0 && value.is_sign_negative());
        self.write_unsigned_bits(fraction, NORMAL_FRACTIONAL_BITS);
    }

    /// Writes a position. Axes smaller than the coord resolution cost one
    /// flag bit each.
    pub fn write_vec3_coord(&mut self, value: [f32; 3]) {
        let present = value.map(|axis| axis >= COORD_RESOLUTION || axis <= -COORD_RESOLUTION);
        for flag in present {
            self.write_bit(flag);
        }
        for (axis, flag) in value.into_iter().zip(present) {
            if flag {
                self.write_coord(axis);
            }
        }
    }

    /// Writes pitch, yaw and roll with the same layout as
    /// [`write_vec3_coord`](Self::write_vec3_coord).
    pub fn write_angles(&mut self, angles: [f32; 3]) {
        self.write_vec3_coord(angles);
    }

    /// Writes a unit vector as x and y plus the sign of z. The reader rebuilds
    /// the magnitude of z from the unit-length identity.
    pub fn write_vec3_normal(&mut self, value: [f32; 3]) {
        let [x, y, z] = value;
        let present = [x, y].map(|axis| axis >= NORMAL_RESOLUTION || axis <= -NORMAL_RESOLUTION);
        for flag in present {
            self.write_bit(flag);
        }
        for (axis, flag) in [x, y].into_iter().zip(present) {
            if flag {
                self.write_normal(axis);
            }
        }
        self.write_bit(z.is_sign_negative());
    }

    // =========================================================================
    // Bulk
    // =========================================================================

    /// Writes every byte of `bytes`.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        match u32::try_from(bytes.len() as u64 * 8) {
            Ok(bits) => self.write_bits(bytes, bits),
            Err(_) => {
                self.cursor.latch_overflow(u32::MAX);
                false
            }
        }
    }

    /// Writes the first `bit_count` bits of `source`, low bit of each byte
    /// first. All or nothing: if the run does not fit, nothing is written.
    ///
    /// `bit_count` is clamped to the `8 * source.len()` bits available.
    pub fn write_bits(&mut self, source: &[u8], bit_count: u32) -> bool {
        let bit_count = u32::try_from(source.len() as u64 * 8)
            .map_or(bit_count, |available| bit_count.min(available));
        if bit_count > self.cursor.bits_left() {
            self.cursor.latch_overflow(bit_count);
            return false;
        }

        let mut source = source;
        let mut left = bit_count;

        let position = self.cursor.position();
        if position & 7 == 0 && left >= 32 {
            let len = (left >> 3) as usize;
            let start = (position >> 3) as usize;
            self.data.as_mut()[start..start + len].copy_from_slice(&source[..len]);
            self.cursor.set_position(position + len as u32 * 8);
            source = &source[len..];
            left -= len as u32 * 8;
        }

        let (words, tail) = source.split_at((left / 32) as usize * 4);
        for chunk in words.chunks_exact(4) {
            let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            self.write_unsigned_bits(value, 32);
        }
        left %= 32;

        let (bytes, rest) = tail.split_at((left / 8) as usize);
        for &byte in bytes {
            self.write_u8(byte);
        }
        left %= 8;

        if left > 0 {
            self.write_unsigned_bits(u32::from(rest[0]), left);
        }

        !self.cursor.is_overflowed()
    }

    /// Writes the bytes of `text` as 8-bit characters, stopping at an interior
    /// NUL or after `limit` bytes, then an optional terminator.
    pub fn write_string(&mut self, text: &str, null_terminate: bool, limit: Option<usize>) -> bool {
        let bytes = text.as_bytes();
        let mut end = bytes.iter().position(|&byte| byte == 0).unwrap_or(bytes.len());
        if let Some(limit) = limit {
            end = end.min(limit);
        }
        for &byte in &bytes[..end] {
            self.write_u8(byte);
        }
        if null_terminate {
            self.write_u8(0);
        }
        !self.cursor.is_overflowed()
    }

    /// Streams `bit_count` bits from `reader` straight into this writer,
    /// 32 at a time.
    pub fn write_bits_from_reader<R: AsRef<[u8]>>(
        &mut self,
        reader: &mut BitReader<R>,
        bit_count: u32,
    ) -> bool {
        let mut left = bit_count;
        while left > 32 {
            let value = reader.read_unsigned_bits(32);
            self.write_unsigned_bits(value, 32);
            left -= 32;
        }
        let value = reader.read_unsigned_bits(left);
        self.write_unsigned_bits(value, left);

        !self.cursor.is_overflowed() && !reader.is_overflowed()
    }
}
