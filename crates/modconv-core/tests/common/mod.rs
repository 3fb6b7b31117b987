//! Synthetic blend file builder shared by the integration tests.

#![allow(dead_code)]

use modconv_core::{DecodingConfig, Endianness, PointerWidth};

pub const MODIFIER_TYPES: &[&str] = &[
    "char",
    "int",
    "ModifierData",
    "BevelModifierData",
    "ArrayModifierData",
];

/// Layout index of `BevelModifierData` in [`BlendBuilder::with_catalog`]
pub const BEVEL_LAYOUT: u32 = 1;
/// Layout index of `ArrayModifierData` in [`BlendBuilder::with_catalog`]
pub const ARRAY_LAYOUT: u32 = 2;

pub struct BlendBuilder {
    config: DecodingConfig,
    blocks: Vec<([u8; 4], u32, Vec<u8>)>,
    terminated: bool,
}

impl BlendBuilder {
    pub fn new(endianness: Endianness, pointer_width: PointerWidth) -> Self {
        Self {
            config: DecodingConfig::new(endianness, pointer_width),
            blocks: Vec::new(),
            terminated: true,
        }
    }

    pub fn le64() -> Self {
        Self::new(Endianness::Little, PointerWidth::Eight)
    }

    pub fn config(&self) -> DecodingConfig {
        self.config
    }

    pub fn block(mut self, code: &[u8; 4], layout_index: u32, body: Vec<u8>) -> Self {
        self.blocks.push((*code, layout_index, body));
        self
    }

    /// Adds a catalog with layouts `[ModifierData, BevelModifierData, ArrayModifierData]`.
    pub fn with_catalog(self) -> Self {
        let body = self.sdna(MODIFIER_TYPES, &[2, 3, 4]);
        self.block(b"DNA1", 0, body)
    }

    pub fn record(self, layout_index: u32, name: &str, value: u32) -> Self {
        let body = self.record_body(name, value);
        self.block(b"DATA", layout_index, body)
    }

    pub fn without_endb(mut self) -> Self {
        self.terminated = false;
        self
    }

    pub fn u16(&self, v: u16) -> [u8; 2] {
        match self.config.endianness {
            Endianness::Little => v.to_le_bytes(),
            Endianness::Big => v.to_be_bytes(),
        }
    }

    pub fn u32(&self, v: u32) -> [u8; 4] {
        match self.config.endianness {
            Endianness::Little => v.to_le_bytes(),
            Endianness::Big => v.to_be_bytes(),
        }
    }

    /// Absolute offset of the enum field in the `n`th block
    pub fn enum_offset(&self, n: usize) -> usize {
        let start = 12 + self.blocks[..n]
            .iter()
            .map(|(_, _, b)| 24 + b.len())
            .sum::<usize>();
        start + 24 + 2 * self.config.pointer_bytes()
    }

    pub fn record_body(&self, name: &str, value: u32) -> Vec<u8> {
        let mut body = vec![0u8; 120];
        // Pointers and trailing settings get non-zero filler
        for (i, byte) in body.iter_mut().enumerate() {
            *byte = (i as u8).wrapping_mul(31) | 1;
        }
        body[32..96].fill(0);
        body[32..32 + name.len()].copy_from_slice(name.as_bytes());
        let at = 2 * self.config.pointer_bytes();
        body[at..at + 4].copy_from_slice(&self.u32(value));
        body
    }

    pub fn sdna(&self, types: &[&str], layouts: &[u16]) -> Vec<u8> {
        let pad = |out: &mut Vec<u8>| {
            while out.len() % 4 != 0 {
                out.push(0);
            }
        };
        let names = ["*next", "*prev", "type", "name[64]"];

        let mut out = b"SDNANAME".to_vec();
        out.extend_from_slice(&self.u32(names.len() as u32));
        for name in names {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
        }
        pad(&mut out);

        out.extend_from_slice(b"TYPE");
        out.extend_from_slice(&self.u32(types.len() as u32));
        for name in types {
            out.extend_from_slice(name.as_bytes());
            out.push(0);
        }
        pad(&mut out);

        out.extend_from_slice(b"TLEN");
        for _ in types {
            out.extend_from_slice(&self.u16(120));
        }
        pad(&mut out);

        out.extend_from_slice(b"STRC");
        out.extend_from_slice(&self.u32(layouts.len() as u32));
        for &type_index in layouts {
            out.extend_from_slice(&self.u16(type_index));
            out.extend_from_slice(&self.u16(2));
            for (t, n) in [(2u16, 0u16), (1, 2)] {
                out.extend_from_slice(&self.u16(t));
                out.extend_from_slice(&self.u16(n));
            }
        }
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = b"BLENDER".to_vec();
        out.push(self.config.pointer_width.marker());
        out.push(self.config.endianness.marker());
        out.extend_from_slice(b"402");

        for (code, layout_index, body) in &self.blocks {
            self.push_header(&mut out, code, body.len() as u32, *layout_index);
            out.extend_from_slice(body);
        }
        if self.terminated {
            self.push_header(&mut out, b"ENDB", 0, 0);
        }
        out
    }

    fn push_header(&self, out: &mut Vec<u8>, code: &[u8; 4], len: u32, layout_index: u32) {
        out.extend_from_slice(code);
        out.extend_from_slice(&self.u32(len));
        out.extend_from_slice(&[0x5A; 8]);
        out.extend_from_slice(&self.u32(layout_index));
        out.extend_from_slice(&self.u32(1));
    }
}

/// Offsets where `a` and `b` differ
pub fn diff_offsets(a: &[u8], b: &[u8]) -> Vec<usize> {
    assert_eq!(a.len(), b.len(), "length changed");
    a.iter()
        .zip(b)
        .enumerate()
        .filter(|(_, (x, y))| x != y)
        .map(|(i, _)| i)
        .collect()
}
