//! Compression detection and inflation for NBT documents.

use crate::error::{Result, SchematicError};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::borrow::Cow;
use std::io::Read;

/// Framing detected from the first two bytes of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Uncompressed,
    Gzip,
    Zlib,
}

impl Compression {
    /// Classify a buffer by its magic bytes.
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        match bytes {
            [0x1F, 0x8B, ..] => Ok(Compression::Gzip),
            [0x78, 0x01 | 0x5E | 0x9C | 0xDA, ..] => Ok(Compression::Zlib),
            [_, _, ..] => Ok(Compression::Uncompressed),
            _ => Err(SchematicError::InvalidInput(format!(
                "Need at least 2 bytes to detect compression, got {}",
                bytes.len()
            ))),
        }
    }
}

/// Inflate `bytes` if they are gzip or zlib framed.
///
/// Uncompressed input is borrowed unchanged.
pub fn decompress(bytes: &[u8]) -> Result<Cow<'_, [u8]>> {
    let compression = Compression::detect(bytes)?;
    log::debug!("Detected {:?} input ({} bytes)", compression, bytes.len());

    match compression {
        Compression::Uncompressed => Ok(Cow::Borrowed(bytes)),
        Compression::Gzip => {
            let mut decompressed = Vec::new();
            GzDecoder::new(bytes).read_to_end(&mut decompressed)?;
            Ok(Cow::Owned(decompressed))
        }
        Compression::Zlib => {
            let mut decompressed = Vec::new();
            ZlibDecoder::new(bytes).read_to_end(&mut decompressed)?;
            Ok(Cow::Owned(decompressed))
        }
    }
}
