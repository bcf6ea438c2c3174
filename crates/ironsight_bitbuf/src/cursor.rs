//! # Bit Cursor
//!
//! Bounds bookkeeping shared by [`BitWriter`](crate::BitWriter) and
//! [`BitReader`](crate::BitReader).
//!
//! The cursor is the only authority on whether `n` more bits fit. Every
//! primitive asks it first via [`BitCursor::reserve`] and touches storage only
//! when the answer is yes.

use crate::error::{BitBufError, BitBufResult};

/// Label used when a buffer was never given one.
pub const UNNAMED: &str = "unnamed";

/// Position, capacity and sticky overflow state of one bit stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitCursor {
    /// Total addressable bits.
    capacity_bits: u32,
    /// Current read/write offset in bits.
    position: u32,
    /// Latched once any access runs past capacity.
    overflowed: bool,
    /// Diagnostics only.
    label: &'static str,
}

impl BitCursor {
    /// Creates a cursor at bit 0 over `capacity_bits` bits.
    #[must_use]
    pub const fn new(capacity_bits: u32) -> Self {
        Self {
            capacity_bits,
            position: 0,
            overflowed: false,
            label: UNNAMED,
        }
    }

    /// Total addressable bits.
    #[inline]
    #[must_use]
    pub const fn capacity_bits(&self) -> u32 {
        self.capacity_bits
    }

    /// Whole bytes covered by the capacity.
    #[inline]
    #[must_use]
    pub const fn capacity_bytes(&self) -> u32 {
        self.capacity_bits >> 3
    }

    /// Current bit offset.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> u32 {
        self.position
    }

    /// Bits between the cursor and the end of the stream.
    #[inline]
    #[must_use]
    pub const fn bits_left(&self) -> u32 {
        self.capacity_bits - self.position
    }

    /// Returns true once any access has run past capacity.
    #[inline]
    #[must_use]
    pub const fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Debug label.
    #[inline]
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Sets the debug label reported in logs and errors.
    pub fn set_label(&mut self, label: &'static str) {
        self.label = label;
    }

    /// Claims `bits` bits at the current position.
    ///
    /// On success the cursor advances and the caller may touch
    /// `[old_position, old_position + bits)`. On failure the overflow flag
    /// latches, the cursor clamps to capacity, and nothing may be touched.
    #[inline]
    pub fn reserve(&mut self, bits: u32) -> bool {
        if bits > self.bits_left() {
            self.latch_overflow(bits);
            return false;
        }
        self.position += bits;
        true
    }

    /// Latches the overflow flag and clamps the cursor to capacity.
    pub fn latch_overflow(&mut self, requested: u32) {
        if !self.overflowed {
            tracing::debug!(
                label = self.label,
                position = self.position,
                capacity = self.capacity_bits,
                requested,
                "bit buffer overflow"
            );
        }
        self.overflowed = true;
        self.position = self.capacity_bits;
    }

    /// Moves to an absolute bit offset. Out-of-range targets overflow.
    pub fn seek(&mut self, bit: u32) -> bool {
        if bit > self.capacity_bits {
            self.latch_overflow(bit - self.position.min(bit));
            return false;
        }
        self.position = bit;
        true
    }

    /// Moves by a signed number of bits. Out-of-range targets overflow.
    pub fn seek_relative(&mut self, delta: i32) -> bool {
        match self.position.checked_add_signed(delta) {
            Some(bit) => self.seek(bit),
            None => {
                self.latch_overflow(delta.unsigned_abs());
                false
            }
        }
    }

    /// Moves to an in-range position without touching the overflow flag.
    #[inline]
    pub(crate) fn set_position(&mut self, bit: u32) {
        debug_assert!(bit <= self.capacity_bits);
        self.position = bit;
    }

    /// Shrinks the capacity after bits were cut out of the stream.
    pub(crate) fn shrink(&mut self, bits: u32) {
        self.capacity_bits -= bits;
        self.position = self.position.min(self.capacity_bits);
    }

    /// Back to bit 0 with the overflow flag cleared.
    pub fn reset(&mut self) {
        self.position = 0;
        self.overflowed = false;
    }

    /// Converts the sticky flag into a result. Call once per message.
    pub fn check(&self) -> BitBufResult<()> {
        if self.overflowed {
            return Err(BitBufError::Overflowed {
                label: self.label,
                position: self.position,
                capacity: self.capacity_bits,
            });
        }
        Ok(())
    }
}
