//! # Quantized Float Layouts
//!
//! Constants and lookup tables for the lossy float encodings. Writer and
//! reader both build on these so the two sides cannot drift apart.
//!
//! ## Coord
//!
//! ```text
//! [int?][frac?] ─ both clear ─> 0.0 (2 bits)
//!       └─ either set ─> [sign][int - 1 : 14]?[frac : 4]?
//! ```
//!
//! ## Coord (multiplayer)
//!
//! ```text
//! integral:      [in_bounds][int?] ─> [sign][int - 1 : 11 | 14]?
//! fractional:    [in_bounds][int?][sign][int - 1 : 11 | 14]?[frac : 4 | 3]
//! ```
//!
//! **CRITICAL:** the multiplier and width tables are the wire format. They are
//! reproduced as published, not derived.

/// Integer bits of a full-range coord.
pub const COORD_INTEGER_BITS: u32 = 14;

/// Fractional bits of a coord.
pub const COORD_FRACTIONAL_BITS: u32 = 4;

/// Fixed-point denominator of a coord fraction.
pub const COORD_DENOMINATOR: u32 = 1 << COORD_FRACTIONAL_BITS;

/// Smallest non-zero coord magnitude (1/16).
pub const COORD_RESOLUTION: f32 = 1.0 / COORD_DENOMINATOR as f32;

/// Largest integer magnitude a coord can carry.
pub const MAX_COORD_INTEGER: u32 = 1 << COORD_INTEGER_BITS;

/// Integer bits of an in-bounds multiplayer coord.
pub const COORD_INTEGER_BITS_MP: u32 = 11;

/// Fractional bits of a low-precision multiplayer coord.
pub const COORD_FRACTIONAL_BITS_MP_LOWPRECISION: u32 = 3;

/// Fixed-point denominator of a low-precision fraction.
pub const COORD_DENOMINATOR_LOWPRECISION: u32 = 1 << COORD_FRACTIONAL_BITS_MP_LOWPRECISION;

/// Smallest non-zero low-precision magnitude (1/8).
pub const COORD_RESOLUTION_LOWPRECISION: f32 = 1.0 / COORD_DENOMINATOR_LOWPRECISION as f32;

/// Fractional bits of a normal component.
pub const NORMAL_FRACTIONAL_BITS: u32 = 11;

/// Fixed-point denominator of a normal component. All ones encodes 1.0.
pub const NORMAL_DENOMINATOR: u32 = (1 << NORMAL_FRACTIONAL_BITS) - 1;

/// Smallest non-zero normal magnitude (1/2047).
pub const NORMAL_RESOLUTION: f32 = 1.0 / NORMAL_DENOMINATOR as f32;

/// Multiplayer coord flag: integer part fits the in-bounds width.
pub(crate) const MP_IN_BOUNDS: u32 = 1;
/// Multiplayer coord flag: integer part present.
pub(crate) const MP_INTEGER: u32 = 2;
/// Multiplayer coord flag: negative (fractional modes only).
pub(crate) const MP_SIGN: u32 = 4;

/// Signed fraction step, indexed `sign + 2 * low_precision`.
pub(crate) const COORD_MP_MULTIPLIERS: [f32; 4] = [
    1.0 / (1 << COORD_FRACTIONAL_BITS) as f32,
    -1.0 / (1 << COORD_FRACTIONAL_BITS) as f32,
    1.0 / (1 << COORD_FRACTIONAL_BITS_MP_LOWPRECISION) as f32,
    -1.0 / (1 << COORD_FRACTIONAL_BITS_MP_LOWPRECISION) as f32,
];

/// Payload width after the three flag bits of a fractional multiplayer coord,
/// indexed `(flags & (IN_BOUNDS | INTEGER)) + 4 * low_precision`.
pub(crate) const COORD_MP_PAYLOAD_BITS: [u32; 8] = [
    COORD_FRACTIONAL_BITS,
    COORD_FRACTIONAL_BITS,
    COORD_FRACTIONAL_BITS + COORD_INTEGER_BITS,
    COORD_FRACTIONAL_BITS + COORD_INTEGER_BITS_MP,
    COORD_FRACTIONAL_BITS_MP_LOWPRECISION,
    COORD_FRACTIONAL_BITS_MP_LOWPRECISION,
    COORD_FRACTIONAL_BITS_MP_LOWPRECISION + COORD_INTEGER_BITS,
    COORD_FRACTIONAL_BITS_MP_LOWPRECISION + COORD_INTEGER_BITS_MP,
];

/// Raw payload width after the two flag bits of a coord, indexed `flags - 1`.
pub(crate) const COORD_RAW_PAYLOAD_BITS: [u32; 3] = [
    COORD_INTEGER_BITS + 1,
    COORD_FRACTIONAL_BITS + 1,
    COORD_INTEGER_BITS + COORD_FRACTIONAL_BITS + 1,
];

/// Fractional bits for the given multiplayer precision.
#[inline]
pub(crate) const fn mp_fraction_bits(low_precision: bool) -> u32 {
    if low_precision {
        COORD_FRACTIONAL_BITS_MP_LOWPRECISION
    } else {
        COORD_FRACTIONAL_BITS
    }
}

/// Sign threshold for the given multiplayer precision.
#[inline]
pub(crate) const fn mp_resolution(low_precision: bool) -> f32 {
    if low_precision {
        COORD_RESOLUTION_LOWPRECISION
    } else {
        COORD_RESOLUTION
    }
}

/// Integer bits for an integer part on either side of the in-bounds limit.
#[inline]
pub(crate) const fn mp_integer_bits(in_bounds: bool) -> u32 {
    if in_bounds {
        COORD_INTEGER_BITS_MP
    } else {
        COORD_INTEGER_BITS
    }
}

/// Splits a coord into its integer magnitude and `fraction_bits` wide
/// fraction. Both are truncated toward zero; the integer is clamped to
/// [`MAX_COORD_INTEGER`].
#[inline]
pub(crate) fn coord_parts(value: f32, fraction_bits: u32) -> (u32, u32) {
    let integer = (value.abs() as u32).min(MAX_COORD_INTEGER);
    let scaled = (f64::from(value) * f64::from(1u32 << fraction_bits)) as i64;
    let fraction = (scaled.unsigned_abs() & u64::from((1u32 << fraction_bits) - 1)) as u32;
    (integer, fraction)
}

/// Truncates toward zero, first snapping values that sit within float noise
/// of a whole step onto that step.
///
/// A decoded value multiplied back up can land a hair under its step; plain
/// truncation would then re-encode one step lower on every round trip.
#[inline]
pub(crate) fn truncate_snapped(scaled: f64) -> i64 {
    let nearest = scaled.round();
    let tolerance = f64::from(f32::EPSILON) * 4.0 * scaled.abs().max(1.0);
    if (scaled - nearest).abs() <= tolerance {
        nearest as i64
    } else {
        scaled.trunc() as i64
    }
}

/// Quantizes a normal component magnitude to the nearest step.
#[inline]
pub(crate) fn normal_fraction(value: f32) -> u32 {
    let scaled = (f64::from(value.abs()) * f64::from(NORMAL_DENOMINATOR)).round();
    (scaled as u32).min(NORMAL_DENOMINATOR)
}
