//! Sequential walk over the file blocks.
//!
//! Each block is a 24-byte header followed by its body:
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 4    | code (`DATA`, `DNA1`, ...)    |
//! | 4      | 4    | body length                   |
//! | 8      | 8    | old memory address (skipped)  |
//! | 16     | 4    | struct-layout (SDNA) index    |
//! | 20     | 4    | element count                 |
//!
//! The next block starts right after the body. The walk ends at the `ENDB`
//! block, which is consumed but never yielded.

use crate::codec::{self, DecodingConfig};
use crate::error::{Error, Result};
use crate::header::HEADER_LEN;
use std::ops::Range;
use tracing::trace;

/// Size of every block header
pub const BLOCK_HEADER_LEN: usize = 24;

const BODY_LEN_OFFSET: usize = 4;
const LAYOUT_INDEX_OFFSET: usize = 16;
const COUNT_OFFSET: usize = 20;

/// A 4-byte block code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockCode(pub [u8; 4]);

impl BlockCode {
    /// Plain data block holding struct instances
    pub const DATA: Self = Self(*b"DATA");
    /// Catalog block holding the SDNA
    pub const DNA1: Self = Self(*b"DNA1");
    /// End-of-file sentinel
    pub const ENDB: Self = Self(*b"ENDB");

    /// Code as text, for display
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl std::fmt::Display for BlockCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed block header with its location in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Block code
    pub code: BlockCode,
    /// Length of the body in bytes
    pub body_len: u32,
    /// Struct-layout index the body follows
    pub layout_index: u32,
    /// Number of struct instances in the body
    pub count: u32,
    /// Absolute offset of the block header
    pub offset: usize,
}

impl Block {
    /// Reads the block header at `offset`
    pub fn read(data: &[u8], offset: usize, config: &DecodingConfig) -> Result<Self> {
        let header = codec::read_bytes(data, offset, BLOCK_HEADER_LEN)?;
        Ok(Self {
            code: BlockCode(codec::read_tag(header, 0)?),
            body_len: config.read_u32(header, BODY_LEN_OFFSET)?,
            layout_index: config.read_u32(header, LAYOUT_INDEX_OFFSET)?,
            count: config.read_u32(header, COUNT_OFFSET)?,
            offset,
        })
    }

    /// Absolute offset of the body
    pub fn body_offset(&self) -> usize {
        self.offset + BLOCK_HEADER_LEN
    }

    /// Absolute byte range of the body
    pub fn body_range(&self) -> Range<usize> {
        let start = self.body_offset();
        start..start + self.body_len as usize
    }

    /// Absolute offset of the following block
    pub fn next_offset(&self) -> usize {
        self.body_range().end
    }

    /// Borrows the body from the file buffer
    pub fn body<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        codec::read_bytes(data, self.body_offset(), self.body_len as usize)
    }

    /// Borrows the body mutably from the file buffer
    pub fn body_mut<'a>(&self, data: &'a mut [u8]) -> Result<&'a mut [u8]> {
        let len = data.len();
        let range = self.body_range();
        data.get_mut(range.clone())
            .ok_or_else(|| Error::eof(range.start, range.len(), len))
    }

    /// Returns true if this is the end sentinel
    pub fn is_end(&self) -> bool {
        self.code == BlockCode::ENDB
    }
}

/// Lazy iterator over the blocks of a file.
///
/// Yields every block before `ENDB`, in file order. A header or body that
/// does not fit in the buffer yields [`Error::TruncatedFile`] once, after
/// which the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct BlockIter<'a> {
    data: &'a [u8],
    config: DecodingConfig,
    offset: usize,
    done: bool,
}

impl<'a> BlockIter<'a> {
    /// Starts a walk at the first block after the file header
    pub fn new(data: &'a [u8], config: DecodingConfig) -> Self {
        Self::starting_at(data, config, HEADER_LEN)
    }

    /// Starts a walk at an arbitrary block offset
    pub fn starting_at(data: &'a [u8], config: DecodingConfig, offset: usize) -> Self {
        Self {
            data,
            config,
            offset,
            done: false,
        }
    }

    fn truncated(&mut self) -> Error {
        self.done = true;
        Error::TruncatedFile {
            offset: self.offset,
            len: self.data.len(),
        }
    }
}

impl Iterator for BlockIter<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let fits = self
            .offset
            .checked_add(BLOCK_HEADER_LEN)
            .is_some_and(|end| end <= self.data.len());
        if !fits {
            return Some(Err(self.truncated()));
        }

        let block = match Block::read(self.data, self.offset, &self.config) {
            Ok(block) => block,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        if block.is_end() {
            trace!("ENDB at offset {}", block.offset);
            self.done = true;
            return None;
        }

        if block.next_offset() > self.data.len() {
            return Some(Err(self.truncated()));
        }

        trace!(
            "Block {} at offset {} ({} bytes, sdna index {})",
            block.code,
            block.offset,
            block.body_len,
            block.layout_index
        );
        self.offset = block.next_offset();
        Some(Ok(block))
    }
}

impl std::iter::FusedIterator for BlockIter<'_> {}

/// Finds the first block with the given code
pub fn find_block(data: &[u8], config: DecodingConfig, code: BlockCode) -> Result<Option<Block>> {
    for block in BlockIter::new(data, config) {
        let block = block?;
        if block.code == code {
            return Ok(Some(block));
        }
    }
    Ok(None)
}
