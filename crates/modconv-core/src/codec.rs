//! Endian- and width-aware primitive access to a byte buffer.
//!
//! Every read and write is bounds-checked and reports [`Error::UnexpectedEof`]
//! instead of panicking. Byte order always comes from a [`DecodingConfig`]
//! (or an explicit [`Endianness`]), so a field is read and written back with
//! the same order.

use crate::error::{Error, Result};

/// Marker byte for 4-byte pointers (`_`)
pub const POINTER_MARKER_32: u8 = 0x5F;
/// Marker byte for 8-byte pointers (`-`)
pub const POINTER_MARKER_64: u8 = 0x2D;
/// Marker byte for little-endian files (`v`)
pub const ENDIAN_MARKER_LITTLE: u8 = 0x76;
/// Marker byte for big-endian files (`V`)
pub const ENDIAN_MARKER_BIG: u8 = 0x56;

/// Byte order of every multi-byte integer in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl Endianness {
    /// Decodes the header marker byte
    pub fn from_marker(marker: u8) -> Result<Self> {
        match marker {
            ENDIAN_MARKER_LITTLE => Ok(Self::Little),
            ENDIAN_MARKER_BIG => Ok(Self::Big),
            _ => Err(Error::UnsupportedEndianness { marker }),
        }
    }

    /// The header marker byte for this byte order
    pub fn marker(self) -> u8 {
        match self {
            Self::Little => ENDIAN_MARKER_LITTLE,
            Self::Big => ENDIAN_MARKER_BIG,
        }
    }

    /// Reads a `u16` at `offset`
    pub fn read_u16(self, buf: &[u8], offset: usize) -> Result<u16> {
        let bytes: [u8; 2] = read_array(buf, offset)?;
        Ok(match self {
            Self::Little => u16::from_le_bytes(bytes),
            Self::Big => u16::from_be_bytes(bytes),
        })
    }

    /// Reads a `u32` at `offset`
    pub fn read_u32(self, buf: &[u8], offset: usize) -> Result<u32> {
        let bytes: [u8; 4] = read_array(buf, offset)?;
        Ok(match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Overwrites the 4 bytes at `offset` with `value`
    pub fn write_u32(self, buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
        let bytes = match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        };
        let len = buf.len();
        let slot = offset
            .checked_add(bytes.len())
            .and_then(|end| buf.get_mut(offset..end))
            .ok_or_else(|| Error::eof(offset, bytes.len(), len))?;
        slot.copy_from_slice(&bytes);
        Ok(())
    }
}

/// Size of a pointer field in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerWidth {
    /// 4-byte pointers
    Four,
    /// 8-byte pointers
    Eight,
}

impl PointerWidth {
    /// Decodes the header marker byte
    pub fn from_marker(marker: u8) -> Result<Self> {
        match marker {
            POINTER_MARKER_32 => Ok(Self::Four),
            POINTER_MARKER_64 => Ok(Self::Eight),
            _ => Err(Error::UnsupportedPointerWidth { marker }),
        }
    }

    /// The header marker byte for this width
    pub fn marker(self) -> u8 {
        match self {
            Self::Four => POINTER_MARKER_32,
            Self::Eight => POINTER_MARKER_64,
        }
    }

    /// Width in bytes
    pub fn bytes(self) -> usize {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
        }
    }
}

/// How to decode every integer after the file header.
///
/// Built once from the header and passed by value to everything downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodingConfig {
    /// Byte order
    pub endianness: Endianness,
    /// Pointer size
    pub pointer_width: PointerWidth,
}

impl DecodingConfig {
    /// Creates a new decoding config
    pub fn new(endianness: Endianness, pointer_width: PointerWidth) -> Self {
        Self {
            endianness,
            pointer_width,
        }
    }

    /// Reads a `u16` at `offset` in the configured byte order
    pub fn read_u16(&self, buf: &[u8], offset: usize) -> Result<u16> {
        self.endianness.read_u16(buf, offset)
    }

    /// Reads a `u32` at `offset` in the configured byte order
    pub fn read_u32(&self, buf: &[u8], offset: usize) -> Result<u32> {
        self.endianness.read_u32(buf, offset)
    }

    /// Writes a `u32` at `offset` in the configured byte order
    pub fn write_u32(&self, buf: &mut [u8], offset: usize, value: u32) -> Result<()> {
        self.endianness.write_u32(buf, offset, value)
    }

    /// Pointer size in bytes
    pub fn pointer_bytes(&self) -> usize {
        self.pointer_width.bytes()
    }
}

/// Returns `len` bytes at `offset`
pub fn read_bytes(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| Error::eof(offset, len, buf.len()))
}

/// Reads a 4-byte block code
pub fn read_tag(buf: &[u8], offset: usize) -> Result<[u8; 4]> {
    read_array(buf, offset)
}

/// Reads a fixed-length string field.
///
/// Surrounding whitespace is trimmed and every NUL byte is dropped, so a
/// zero-padded `char[64]` reads as its text. Invalid UTF-8 is replaced.
pub fn read_fixed_string(buf: &[u8], offset: usize, len: usize) -> Result<String> {
    let bytes = read_bytes(buf, offset, len)?;
    let text = String::from_utf8_lossy(bytes);
    Ok(text.trim().replace('\0', ""))
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(read_bytes(buf, offset, N)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_both_orders() {
        let data = [0x01, 0x02, 0x03, 0x04];
        assert_eq!(Endianness::Little.read_u32(&data, 0).unwrap(), 0x0403_0201);
        assert_eq!(Endianness::Big.read_u32(&data, 0).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_write_then_read_is_identity() {
        for endianness in [Endianness::Little, Endianness::Big] {
            let mut data = [0u8; 12];
            endianness.write_u32(&mut data, 4, 0xDEAD_BEEF).unwrap();
            assert_eq!(endianness.read_u32(&data, 4).unwrap(), 0xDEAD_BEEF);
            assert_eq!(&data[..4], &[0; 4]);
            assert_eq!(&data[8..], &[0; 4]);
        }
    }

    #[test]
    fn test_rewrite_read_value_is_noop() {
        let original: Vec<u8> = (0u8..16).collect();
        for endianness in [Endianness::Little, Endianness::Big] {
            let mut data = original.clone();
            let value = endianness.read_u32(&data, 6).unwrap();
            endianness.write_u32(&mut data, 6, value).unwrap();
            assert_eq!(data, original);
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let mut data = [0u8; 6];
        assert!(matches!(
            Endianness::Little.read_u32(&data, 3),
            Err(Error::UnexpectedEof { offset: 3, need: 4, have: 3 })
        ));
        assert!(Endianness::Big.write_u32(&mut data, 4, 1).is_err());
        assert!(read_bytes(&data, usize::MAX, 2).is_err());
        assert_eq!(data, [0u8; 6]);
    }

    #[test]
    fn test_read_u16() {
        let data = [0xAB, 0xCD];
        assert_eq!(Endianness::Little.read_u16(&data, 0).unwrap(), 0xCDAB);
        assert_eq!(Endianness::Big.read_u16(&data, 0).unwrap(), 0xABCD);
    }

    #[test]
    fn test_fixed_string_strips_padding() {
        let mut field = [0u8; 16];
        field[..5].copy_from_slice(b"Bevel");
        assert_eq!(read_fixed_string(&field, 0, 16).unwrap(), "Bevel");
        assert_eq!(read_fixed_string(b"  ENDB ", 0, 7).unwrap(), "ENDB");
        assert_eq!(read_fixed_string(b"DNA1", 0, 4).unwrap(), "DNA1");
    }

    #[test]
    fn test_markers() {
        assert_eq!(PointerWidth::from_marker(b'_').unwrap(), PointerWidth::Four);
        assert_eq!(PointerWidth::from_marker(b'-').unwrap(), PointerWidth::Eight);
        assert!(matches!(
            PointerWidth::from_marker(b'x'),
            Err(Error::UnsupportedPointerWidth { marker: b'x' })
        ));
        assert_eq!(Endianness::from_marker(b'v').unwrap(), Endianness::Little);
        assert_eq!(Endianness::from_marker(b'V').unwrap(), Endianness::Big);
        assert!(matches!(
            Endianness::from_marker(0),
            Err(Error::UnsupportedEndianness { marker: 0 })
        ));
        assert_eq!(PointerWidth::Eight.bytes(), 8);
        assert_eq!(Endianness::Big.marker(), b'V');
    }
}
