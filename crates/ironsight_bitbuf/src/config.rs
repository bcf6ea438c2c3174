//! # Codec Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! packet_bytes = 1200
//! max_string_len = 512
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BitBufError, BitBufResult};
use crate::writer::BitWriter;

/// Default packet buffer size. Fits a single UDP datagram on common links.
pub const DEFAULT_PACKET_BYTES: u32 = 1200;

/// Default longest string a reader accepts.
pub const DEFAULT_MAX_STRING_LEN: usize = 512;

/// Buffer sizing shared by everything that encodes or decodes packets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitBufConfig {
    /// Size of packet buffers in bytes. Non-zero multiple of 4.
    pub packet_bytes: u32,
    /// Limit passed to [`BitReader::read_string`](crate::BitReader::read_string).
    pub max_string_len: usize,
}

impl Default for BitBufConfig {
    fn default() -> Self {
        Self {
            packet_bytes: DEFAULT_PACKET_BYTES,
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

impl BitBufConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> BitBufResult<Self> {
        let config: Self = toml::from_str(source).map_err(|err| reject(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> BitBufResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|err| reject(format!("{}: {err}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks field ranges.
    pub fn validate(&self) -> BitBufResult<()> {
        if self.packet_bytes == 0 || self.packet_bytes % 4 != 0 {
            return Err(reject(format!(
                "packet_bytes must be a non-zero multiple of 4, got {}",
                self.packet_bytes
            )));
        }
        if self.max_string_len == 0 {
            return Err(reject("max_string_len must be non-zero".to_owned()));
        }
        Ok(())
    }

    /// Serializes back to TOML.
    pub fn to_toml_string(&self) -> BitBufResult<String> {
        toml::to_string(self).map_err(|err| BitBufError::InvalidConfig(err.to_string()))
    }

    /// Allocates a zeroed packet buffer and wraps it in a writer.
    pub fn packet_writer(&self) -> BitBufResult<BitWriter<Vec<u8>>> {
        self.validate()?;
        BitWriter::try_new(vec![0u8; self.packet_bytes as usize])
    }
}

fn reject(reason: String) -> BitBufError {
    tracing::warn!(%reason, "rejected bit buffer configuration");
    BitBufError::InvalidConfig(reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = BitBufConfig::from_toml_str("").unwrap();
        assert_eq!(config, BitBufConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = BitBufConfig::from_toml_str("packet_bytes = 64").unwrap();
        assert_eq!(config.packet_bytes, 64);
        assert_eq!(config.max_string_len, DEFAULT_MAX_STRING_LEN);
    }

    #[test]
    fn test_rejects_misaligned_packet_size() {
        let err = BitBufConfig::from_toml_str("packet_bytes = 1201").unwrap_err();
        assert!(matches!(err, BitBufError::InvalidConfig(_)));
        assert!(BitBufConfig::from_toml_str("packet_bytes = 0").is_err());
        assert!(BitBufConfig::from_toml_str("max_string_len = 0").is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(BitBufConfig::from_toml_str("packet_bytes = \"big\"").is_err());
        assert!(BitBufConfig::from_toml_str("packet_bytes =").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = BitBufConfig::load("/nonexistent/ironsight/bitbuf.toml").unwrap_err();
        assert!(matches!(err, BitBufError::InvalidConfig(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BitBufConfig {
            packet_bytes: 256,
            max_string_len: 32,
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(BitBufConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_packet_writer_capacity() {
        let config = BitBufConfig {
            packet_bytes: 16,
            ..BitBufConfig::default()
        };
        let writer = config.packet_writer().unwrap();
        assert_eq!(writer.capacity_bits(), 128);
        assert_eq!(writer.position(), 0);
    }
}
