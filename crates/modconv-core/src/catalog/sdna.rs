//! Parser for the `DNA1` catalog block.
//!
//! ## Layout
//!
//! ```text
//! "SDNA"
//! "NAME" u32 count, count × NUL-terminated field names, pad to 4
//! "TYPE" u32 count, count × NUL-terminated type names,  pad to 4
//! "TLEN" count × u16 type sizes,                         pad to 4
//! "STRC" u32 count, count × { u16 type, u16 n, n × { u16 type, u16 name } }
//! ```
//!
//! Integers use the file's byte order. Padding is relative to the start of
//! the block body.

use super::TypeCatalog;
use crate::codec::{self, DecodingConfig};
use crate::error::{Error, Result};
use tracing::debug;

/// One member of a struct layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdnaField {
    /// Index into the type-name table
    pub type_index: u16,
    /// Index into the field-name table
    pub name_index: u16,
}

/// One struct layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdnaStruct {
    /// Index into the type-name table
    pub type_index: u16,
    /// Members in declaration order
    pub fields: Vec<SdnaField>,
}

/// Parsed catalog tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sdna {
    /// Field names, e.g. `*next`, `name[64]`
    pub names: Vec<String>,
    /// Type names, index = type index
    pub types: Vec<String>,
    /// Size in bytes of each type
    pub type_lengths: Vec<u16>,
    /// Struct layouts, index = struct-layout index
    pub structs: Vec<SdnaStruct>,
}

impl Sdna {
    /// Parses a `DNA1` block body
    pub fn parse(body: &[u8], config: &DecodingConfig) -> Result<Self> {
        let mut reader = Reader {
            data: body,
            pos: 0,
            config,
        };

        reader.expect_tag(b"SDNA")?;

        reader.expect_tag(b"NAME")?;
        let name_count = reader.u32()? as usize;
        let names = reader.strings(name_count)?;
        reader.align();

        reader.expect_tag(b"TYPE")?;
        let type_count = reader.u32()? as usize;
        let types = reader.strings(type_count)?;
        reader.align();

        reader.expect_tag(b"TLEN")?;
        let type_lengths = (0..type_count)
            .map(|_| reader.u16())
            .collect::<Result<Vec<_>>>()?;
        reader.align();

        reader.expect_tag(b"STRC")?;
        let struct_count = reader.u32()? as usize;
        let mut structs = Vec::with_capacity(struct_count.min(body.len() / 4));
        for _ in 0..struct_count {
            let at = reader.pos;
            let type_index = reader.u16()?;
            if type_index as usize >= types.len() {
                return Err(Error::invalid_catalog(
                    at,
                    format!("struct type index {} out of {} types", type_index, types.len()),
                ));
            }

            let field_count = reader.u16()? as usize;
            let mut fields = Vec::with_capacity(field_count);
            for _ in 0..field_count {
                let at = reader.pos;
                let field = SdnaField {
                    type_index: reader.u16()?,
                    name_index: reader.u16()?,
                };
                if field.type_index as usize >= types.len()
                    || field.name_index as usize >= names.len()
                {
                    return Err(Error::invalid_catalog(
                        at,
                        "field refers past the name or type table",
                    ));
                }
                fields.push(field);
            }
            structs.push(SdnaStruct { type_index, fields });
        }

        debug!(
            "SDNA: {} names, {} types, {} structs",
            names.len(),
            types.len(),
            structs.len()
        );

        Ok(Self {
            names,
            types,
            type_lengths,
            structs,
        })
    }

    /// Size in bytes of the struct at a layout index
    pub fn struct_len(&self, layout_index: u32) -> Option<u16> {
        let layout = self.structs.get(layout_index as usize)?;
        self.type_lengths.get(layout.type_index as usize).copied()
    }
}

impl TypeCatalog for Sdna {
    fn type_count(&self) -> usize {
        self.types.len()
    }

    fn type_name_at(&self, index: u32) -> Option<&str> {
        self.types.get(index as usize).map(String::as_str)
    }

    fn layout_count(&self) -> usize {
        self.structs.len()
    }

    fn layout_at(&self, index: u32) -> Option<u32> {
        self.structs.get(index as usize).map(|s| u32::from(s.type_index))
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    config: &'a DecodingConfig,
}

impl Reader<'_> {
    fn expect_tag(&mut self, tag: &[u8; 4]) -> Result<()> {
        let found = codec::read_tag(self.data, self.pos).map_err(|_| self.eof(4))?;
        if &found != tag {
            return Err(Error::invalid_catalog(
                self.pos,
                format!(
                    "expected {:?}, found {:?}",
                    String::from_utf8_lossy(tag),
                    String::from_utf8_lossy(&found)
                ),
            ));
        }
        self.pos += 4;
        Ok(())
    }

    fn u16(&mut self) -> Result<u16> {
        let v = self.config.read_u16(self.data, self.pos).map_err(|_| self.eof(2))?;
        self.pos += 2;
        Ok(v)
    }

    fn u32(&mut self) -> Result<u32> {
        let v = self.config.read_u32(self.data, self.pos).map_err(|_| self.eof(4))?;
        self.pos += 4;
        Ok(v)
    }

    fn strings(&mut self, count: usize) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(count.min(self.data.len()));
        for _ in 0..count {
            let rest = self.data.get(self.pos..).unwrap_or_default();
            let len = rest
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| Error::invalid_catalog(self.pos, "unterminated string"))?;
            out.push(String::from_utf8_lossy(&rest[..len]).into_owned());
            self.pos += len + 1;
        }
        Ok(out)
    }

    fn align(&mut self) {
        self.pos = (self.pos + 3) & !3;
    }

    fn eof(&self, need: usize) -> Error {
        Error::invalid_catalog(
            self.pos,
            format!("need {} bytes, {} left", need, self.data.len().saturating_sub(self.pos)),
        )
    }
}
