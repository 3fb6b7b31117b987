//! In-place patching of a single data record.
//!
//! Every struct deriving from `ModifierData` starts with the same header:
//!
//! ```text
//! 0              ptr   *next
//! ptr            ptr   *prev
//! 2*ptr          int   type       <- patched
//! ...
//! 32             char  name[64]   <- validated
//! ```
//!
//! The record is checked before anything is written: both the name and the
//! current enum value must match the caller's expectations. A mismatch means
//! the layout assumption is wrong for this file, so it is an error rather
//! than a skipped block.

use crate::block::Block;
use crate::codec::{self, DecodingConfig};
use crate::error::{Error, Result};

/// Offset of the name field from the start of the record
pub const NAME_FIELD_OFFSET: usize = 32;

/// Length of the name field
pub const NAME_FIELD_LEN: usize = 64;

/// What to patch and what the record must look like beforehand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Structural type name used for catalog lookup, e.g. `BevelModifierData`
    pub type_name: String,
    /// Expected content of the record's own name field, e.g. `Bevel`
    pub record_name: String,
    /// Value the enum field must currently hold
    pub old_value: u32,
    /// Value to write into the enum field
    pub new_value: u32,
}

impl TargetSpec {
    /// Creates a new target spec
    pub fn new(
        type_name: impl Into<String>,
        record_name: impl Into<String>,
        old_value: u32,
        new_value: u32,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            record_name: record_name.into(),
            old_value,
            new_value,
        }
    }
}

/// Offset of the enum field from the start of the record
pub fn enum_field_offset(config: &DecodingConfig) -> usize {
    2 * config.pointer_bytes()
}

/// Smallest record body that holds both fields
pub fn min_record_len(config: &DecodingConfig) -> usize {
    (NAME_FIELD_OFFSET + NAME_FIELD_LEN).max(enum_field_offset(config) + 4)
}

/// Validates the record in `block` and overwrites its enum field.
///
/// `data` is the whole file buffer. Only the 4 bytes of the enum field are
/// written, and only after both checks pass.
pub fn patch_record(
    data: &mut [u8],
    block: &Block,
    config: &DecodingConfig,
    target: &TargetSpec,
) -> Result<()> {
    let need = min_record_len(config);
    if (block.body_len as usize) < need {
        return Err(Error::RecordTooShort {
            layout_index: block.layout_index,
            offset: block.offset,
            len: block.body_len as usize,
            need,
        });
    }

    let body = block.body_mut(data)?;
    let enum_offset = enum_field_offset(config);

    let actual_name = codec::read_fixed_string(body, NAME_FIELD_OFFSET, NAME_FIELD_LEN)?;
    if actual_name != target.record_name {
        return Err(Error::UnexpectedRecordIdentity {
            layout_index: block.layout_index,
            offset: block.offset,
            expected: target.record_name.clone(),
            actual: actual_name,
        });
    }

    let actual_value = config.read_u32(body, enum_offset)?;
    if actual_value != target.old_value {
        return Err(Error::UnexpectedFieldValue {
            layout_index: block.layout_index,
            offset: block.offset,
            expected: target.old_value,
            actual: actual_value,
        });
    }

    config.write_u32(body, enum_offset, target.new_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockCode, BLOCK_HEADER_LEN};
    use crate::codec::{Endianness, PointerWidth};

    fn record(config: &DecodingConfig, name: &str, value: u32, len: usize) -> Vec<u8> {
        let mut body = vec![0x11; len];
        body[NAME_FIELD_OFFSET..NAME_FIELD_OFFSET + NAME_FIELD_LEN].fill(0);
        body[NAME_FIELD_OFFSET..NAME_FIELD_OFFSET + name.len()].copy_from_slice(name.as_bytes());
        config
            .write_u32(&mut body, enum_field_offset(config), value)
            .unwrap();
        body
    }

    /// Lays `body` out as the only block of a buffer and returns both.
    fn place(body: &[u8]) -> (Vec<u8>, Block) {
        let mut data = vec![0xEE; BLOCK_HEADER_LEN];
        data.extend_from_slice(body);
        let block = Block {
            code: BlockCode::DATA,
            body_len: body.len() as u32,
            layout_index: 9,
            count: 1,
            offset: 0,
        };
        (data, block)
    }

    #[test]
    fn test_offsets() {
        let c64 = DecodingConfig::new(Endianness::Little, PointerWidth::Eight);
        let c32 = DecodingConfig::new(Endianness::Little, PointerWidth::Four);
        assert_eq!(enum_field_offset(&c64), 16);
        assert_eq!(enum_field_offset(&c32), 8);
        assert_eq!(min_record_len(&c64), 96);
    }

    #[test]
    fn test_patches_only_enum_field() {
        for config in [
            DecodingConfig::new(Endianness::Little, PointerWidth::Eight),
            DecodingConfig::new(Endianness::Big, PointerWidth::Four),
        ] {
            let (mut data, block) = place(&record(&config, "Bevel", 7, 120));
            let before = data.clone();
            let target = TargetSpec::new("BevelModifierData", "Bevel", 7, 42);

            patch_record(&mut data, &block, &config, &target).unwrap();

            let field = BLOCK_HEADER_LEN + enum_field_offset(&config);
            assert_eq!(config.read_u32(&data, field).unwrap(), 42);
            for (i, (a, b)) in before.iter().zip(&data).enumerate() {
                if !(field..field + 4).contains(&i) {
                    assert_eq!(a, b, "byte {} changed", i);
                }
            }
        }
    }

    #[test]
    fn test_name_mismatch_leaves_buffer_untouched() {
        let config = DecodingConfig::new(Endianness::Little, PointerWidth::Eight);
        let (mut data, block) = place(&record(&config, "Bevel.001", 7, 120));
        let before = data.clone();
        let target = TargetSpec::new("BevelModifierData", "Bevel", 7, 42);

        let err = patch_record(&mut data, &block, &config, &target).unwrap_err();
        match err {
            Error::UnexpectedRecordIdentity {
                layout_index,
                expected,
                actual,
                ..
            } => {
                assert_eq!(layout_index, 9);
                assert_eq!(expected, "Bevel");
                assert_eq!(actual, "Bevel.001");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(data, before);
    }

    #[test]
    fn test_value_mismatch_leaves_buffer_untouched() {
        let config = DecodingConfig::new(Endianness::Big, PointerWidth::Eight);
        let (mut data, block) = place(&record(&config, "Bevel", 8, 96));
        let before = data.clone();
        let target = TargetSpec::new("BevelModifierData", "Bevel", 7, 42);

        let err = patch_record(&mut data, &block, &config, &target).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedFieldValue {
                expected: 7,
                actual: 8,
                ..
            }
        ));
        assert_eq!(data, before);
    }

    #[test]
    fn test_short_record() {
        let config = DecodingConfig::new(Endianness::Little, PointerWidth::Eight);
        let (mut data, block) = place(&[0u8; 40]);
        assert!(matches!(
            patch_record(&mut data, &block, &config, &TargetSpec::new("T", "R", 0, 1)),
            Err(Error::RecordTooShort { len: 40, need: 96, .. })
        ));
    }
}
