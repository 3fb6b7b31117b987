//! File header parsing.
//!
//! The first 12 bytes of a blend file are
//! `"BLENDER"` + pointer width marker + endianness marker + 3-digit version.
//! The markers are single bytes, so they are read before any byte order is known.

use crate::codec::{self, DecodingConfig, Endianness, PointerWidth};
use crate::error::{Error, Result};
use tracing::debug;

/// Magic signature at offset 0
pub const MAGIC: &[u8; 7] = b"BLENDER";

/// Length of the file header; the block sequence starts right after it
pub const HEADER_LEN: usize = 12;

const POINTER_WIDTH_OFFSET: usize = 7;
const ENDIANNESS_OFFSET: usize = 8;
const VERSION_OFFSET: usize = 9;

const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xB5, 0x2F, 0xFD];

/// Parsed file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Decoding configuration for the rest of the file
    pub config: DecodingConfig,
    /// Version digits, e.g. `"402"`. Informational only.
    pub version: String,
}

impl FileHeader {
    /// Parses the header at the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.starts_with(GZIP_MAGIC) {
            return Err(Error::CompressedFile { codec: "gzip" });
        }
        if data.starts_with(ZSTD_MAGIC) {
            return Err(Error::CompressedFile { codec: "zstd" });
        }

        let magic = data.get(..MAGIC.len()).unwrap_or(data);
        if magic != MAGIC {
            return Err(Error::NotAContainerFile {
                expected: "BLENDER",
                found: String::from_utf8_lossy(magic).into_owned(),
            });
        }

        let header = codec::read_bytes(data, 0, HEADER_LEN)?;
        let pointer_width = PointerWidth::from_marker(header[POINTER_WIDTH_OFFSET])?;
        let endianness = Endianness::from_marker(header[ENDIANNESS_OFFSET])?;
        let version = codec::read_fixed_string(header, VERSION_OFFSET, HEADER_LEN - VERSION_OFFSET)?;

        debug!(
            "Header: version {}, {}-byte pointers, {:?} endian",
            version,
            pointer_width.bytes(),
            endianness
        );

        Ok(Self {
            config: DecodingConfig::new(endianness, pointer_width),
            version,
        })
    }
}
