//! # IRONSIGHT Bit Buffer
//!
//! Bit-packed stream codec behind entity replication, user commands, demo
//! recording and network messages.
//!
//! ## Design Principles
//!
//! 1. **Wire compatible** - Bits fill little-endian 32-bit words from the low end
//! 2. **Fail soft** - Running out of room latches a sticky flag, never panics
//! 3. **Zero allocations** - Buffers are sized once; only `read_string` allocates
//! 4. **One check per message** - Callers test `check()` after a batch, not per call
//!
//! ## Example
//!
//! ```rust
//! use ironsight_bitbuf::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new(vec![0u8; 64]);
//! writer.write_ubit_var(7);
//! writer.write_coord(128.5);
//! writer.write_vec3_normal([0.6, 0.8, -0.0]);
//! writer.check().expect("message fits");
//!
//! let mut reader = BitReader::with_bit_count(writer.as_bytes(), writer.position());
//! assert_eq!(reader.read_ubit_var(), 7);
//! assert!((reader.read_coord() - 128.5).abs() < 1.0 / 16.0);
//! let [x, _, z] = reader.read_vec3_normal();
//! assert!((x - 0.6).abs() < 1.0 / 2047.0);
//! assert!(z.is_sign_negative());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod coord;
pub mod cursor;
pub mod error;
pub mod reader;
pub mod varint;
pub mod word;
pub mod writer;

pub use config::BitBufConfig;
pub use coord::{
    COORD_FRACTIONAL_BITS, COORD_INTEGER_BITS, COORD_INTEGER_BITS_MP, COORD_RESOLUTION,
    COORD_RESOLUTION_LOWPRECISION, MAX_COORD_INTEGER, NORMAL_DENOMINATOR, NORMAL_FRACTIONAL_BITS,
    NORMAL_RESOLUTION,
};
pub use cursor::BitCursor;
pub use error::{BitBufError, BitBufResult};
pub use reader::BitReader;
pub use writer::BitWriter;
