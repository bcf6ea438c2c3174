//! # Varint Helpers
//!
//! 7 payload bits per byte, low group first, high bit set while more bytes
//! follow. Signed values are zigzag-folded first so small negatives stay
//! short.

/// Longest encoding of a 32-bit value.
pub const MAX_VARINT32_BYTES: u32 = 5;

/// Longest encoding of a 64-bit value.
pub const MAX_VARINT64_BYTES: u32 = 10;

/// Maps signed to unsigned: `0, -1, 1, -2, ...` to `0, 1, 2, 3, ...`.
#[inline]
#[must_use]
pub const fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag_encode32`].
#[inline]
#[must_use]
pub const fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// 64-bit [`zigzag_encode32`].
#[inline]
#[must_use]
pub const fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode64`].
#[inline]
#[must_use]
pub const fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Encoded size class of a 32-bit value in bytes (1..=5).
#[inline]
#[must_use]
pub const fn varint32_len(value: u32) -> u32 {
    let significant = 32 - (value | 1).leading_zeros();
    (significant + 6) / 7
}

/// Encoded size class of a 64-bit value in bytes (1..=10).
#[inline]
#[must_use]
pub const fn varint64_len(value: u64) -> u32 {
    let significant = 64 - (value | 1).leading_zeros();
    (significant + 6) / 7
}

/// Payload widths of the unsigned bit-var classes, indexed by the 2-bit
/// selector.
pub const UBIT_VAR_WIDTHS: [u32; 4] = [4, 8, 12, 32];

/// Smallest bit-var selector whose payload holds `value`.
#[inline]
#[must_use]
pub fn ubit_var_selector(value: u32) -> u32 {
    match value {
        0..=0xF => 0,
        0x10..=0xFF => 1,
        0x100..=0xFFF => 2,
        _ => 3,
    }
}

/// Fills `out` with the encoding of `value`. `out.len()` must equal the size
/// class of `value`, so every byte but the last carries the continuation bit.
#[inline]
pub(crate) fn encode_varint(value: u64, out: &mut [u8]) {
    let last = out.len() - 1;
    for (i, byte) in out.iter_mut().enumerate() {
        let group = (value >> (7 * i)) as u8 & 0x7F;
        *byte = if i == last { group } else { group | 0x80 };
    }
}
