//! # Word Access
//!
//! The stream is logically an array of little-endian 32-bit words. Bits fill
//! each word from the least significant end, so byte `n` of the storage always
//! holds stream bits `8n..8n + 8` regardless of host endianness.
//!
//! ```text
//! word 0                          word 1
//! ┌───────────────────────────────┬───────────────────────────────┐
//! │ bit 31 ............... bit 0  │ bit 63 .............. bit 32  │
//! └───────────────────────────────┴───────────────────────────────┘
//!   bytes [0, 1, 2, 3] (LE)         bytes [4, 5, 6, 7] (LE)
//! ```
//!
//! All storage access in the crate goes through `load_le_word` and
//! `store_le_word`. Both tolerate a trailing partial word so a reader over an
//! arbitrary byte range never touches memory outside it.

/// Low-order mask for every bit width from 0 to 32.
pub const EXTRA_MASKS: [u32; 33] = build_extra_masks();

/// Masks that keep everything except `len` bits starting at `start`.
///
/// Indexed `[start][len]`. Bits past the end of the word are ignored, so a
/// `(start, len)` pair that runs off the word only clears up to bit 31.
pub const BIT_WRITE_MASKS: [[u32; 33]; 32] = build_write_masks();

const fn build_extra_masks() -> [u32; 33] {
    let mut masks = [0u32; 33];
    let mut width = 0;
    while width < 32 {
        masks[width] = (1u32 << width) - 1;
        width += 1;
    }
    masks[32] = u32::MAX;
    masks
}

const fn build_write_masks() -> [[u32; 33]; 32] {
    let mut masks = [[0u32; 33]; 32];
    let mut start = 0;
    while start < 32 {
        let mut len = 0;
        while len < 33 {
            let end = start + len;
            let mut mask = (1u32 << start) - 1;
            if end < 32 {
                mask |= !((1u32 << end) - 1);
            }
            masks[start][len] = mask;
            len += 1;
        }
        start += 1;
    }
    masks
}

/// Loads word `index`, zero-filling bytes that lie past the end of `bytes`.
#[inline]
#[must_use]
pub fn load_le_word(bytes: &[u8], index: usize) -> u32 {
    let offset = index * 4;
    match bytes.get(offset..offset + 4) {
        Some(chunk) => u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
        None => {
            let mut raw = [0u8; 4];
            if let Some(tail) = bytes.get(offset..) {
                raw[..tail.len()].copy_from_slice(tail);
            }
            u32::from_le_bytes(raw)
        }
    }
}

/// Stores word `index`, dropping bytes that lie past the end of `bytes`.
#[inline]
pub fn store_le_word(bytes: &mut [u8], index: usize, value: u32) {
    let offset = index * 4;
    let raw = value.to_le_bytes();
    if let Some(chunk) = bytes.get_mut(offset..offset + 4) {
        chunk.copy_from_slice(&raw);
    } else if let Some(tail) = bytes.get_mut(offset..) {
        let len = tail.len();
        tail.copy_from_slice(&raw[..len]);
    }
}

/// Reads `width` (0..=32) bits starting at stream bit `position`.
///
/// The caller is responsible for bounds; bits past the storage read as zero.
#[inline]
#[must_use]
pub fn extract_bits(bytes: &[u8], position: u32, width: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    let index = (position >> 5) as usize;
    let start = position & 31;
    let mut value = load_le_word(bytes, index) >> start;
    if start + width > 32 {
        value |= load_le_word(bytes, index + 1) << (32 - start);
    }
    value & EXTRA_MASKS[width as usize]
}

/// Splices the low `width` (0..=32) bits of `value` in at stream bit
/// `position` without disturbing neighbouring bits.
///
/// The first word takes as many bits as fit above `position & 31`; anything
/// left over is merged into the low end of the following word.
#[inline]
pub fn splice_bits(bytes: &mut [u8], position: u32, value: u32, width: u32) {
    if width == 0 {
        return;
    }
    let value = value & EXTRA_MASKS[width as usize];
    let index = (position >> 5) as usize;
    let start = position & 31;
    let first = width.min(32 - start);

    let mut word = load_le_word(bytes, index);
    word &= BIT_WRITE_MASKS[start as usize][first as usize];
    word |= value << start;
    store_le_word(bytes, index, word);

    if width > first {
        let rest = width - first;
        let mut word = load_le_word(bytes, index + 1);
        word &= BIT_WRITE_MASKS[0][rest as usize];
        word |= value >> first;
        store_le_word(bytes, index + 1, word);
    }
}
