//! # Bit Buffer Error Types
//!
//! Errors surfaced at the edges of the codec.
//!
//! Individual reads and writes never return these. They latch the sticky
//! overflow flag instead, and the caller converts that flag into an error once
//! per message through `check()`.

use thiserror::Error;

/// Errors that can occur around the bit buffer codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitBufError {
    /// Writer storage must be made of whole 32-bit words.
    #[error("buffer length {len} is not a multiple of 4 bytes")]
    MisalignedBuffer {
        /// Length of the rejected storage in bytes.
        len: usize,
    },

    /// Declared bit count does not fit the storage.
    #[error("bit count {bits} exceeds a {bytes} byte buffer")]
    BitCountExceedsBuffer {
        /// Requested number of addressable bits.
        bits: u64,
        /// Available storage in bytes.
        bytes: usize,
    },

    /// A read or write ran past the declared capacity.
    #[error("bit buffer '{label}' overflowed at bit {position} of {capacity}")]
    Overflowed {
        /// Debug label of the buffer.
        label: &'static str,
        /// Clamped cursor position.
        position: u32,
        /// Capacity in bits.
        capacity: u32,
    },

    /// A string on the wire was longer than the caller allowed.
    #[error("string exceeds limit of {limit} bytes")]
    StringTooLong {
        /// The limit that was exceeded.
        limit: usize,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for bit buffer operations.
pub type BitBufResult<T> = Result<T, BitBufError>;
