//! Error types for the modconv-core library.
//!
//! Every variant belongs to one of four families (see [`ErrorKind`]). Format
//! and validation errors abort a run with nothing written; resolution errors
//! only mean there is nothing to patch.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for modconv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input is not a readable container, or its structure is broken
    Format,
    /// The target type or layout is absent from the file's catalog
    Resolution,
    /// A matched record does not hold the expected values
    Validation,
    /// File-system failure around the run
    Io,
}

/// Comprehensive error type for all modconv operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Output file already exists and overwriting was not requested
    #[error("output file '{path}' already exists")]
    OutputExists {
        /// The existing output path
        path: PathBuf,
    },

    /// The output path resolves to the input file
    #[error("output path '{path}' is the input file")]
    OutputIsInput {
        /// The offending output path
        path: PathBuf,
    },

    /// Derived output paths need a non-empty suffix
    #[error("output suffix must not be empty")]
    EmptySuffix,

    /// Magic signature at offset 0 is wrong
    #[error("not a blend file: expected magic {expected:?}, found {found:?}")]
    NotAContainerFile {
        /// The magic the format requires
        expected: &'static str,
        /// What was actually at offset 0 (lossy)
        found: String,
    },

    /// The file is a compressed container
    #[error("file is {codec}-compressed; decompress it before patching")]
    CompressedFile {
        /// Compression codec recognised from the leading bytes
        codec: &'static str,
    },

    /// Pointer width marker is neither of the two known values
    #[error("unsupported pointer width marker {marker:#04x}")]
    UnsupportedPointerWidth {
        /// The raw marker byte
        marker: u8,
    },

    /// Endianness marker is neither of the two known values
    #[error("unsupported endianness marker {marker:#04x}")]
    UnsupportedEndianness {
        /// The raw marker byte
        marker: u8,
    },

    /// A read or write would go past the end of the buffer
    #[error("unexpected end of data at offset {offset:#x} (need {need} bytes, have {have})")]
    UnexpectedEof {
        /// Offset the access started at
        offset: usize,
        /// Bytes required
        need: usize,
        /// Bytes available from `offset`
        have: usize,
    },

    /// Block sequence ran off the buffer before the end sentinel
    #[error("truncated file: block at offset {offset:#x} lies beyond the {len}-byte buffer without an ENDB block")]
    TruncatedFile {
        /// Offset where the next block header was expected
        offset: usize,
        /// Total buffer length
        len: usize,
    },

    /// No catalog block in the file
    #[error("no DNA1 catalog block found")]
    MissingCatalog,

    /// Catalog block is malformed
    #[error("invalid DNA1 catalog at body offset {offset:#x}: {details}")]
    InvalidCatalog {
        /// Offset relative to the catalog body
        offset: usize,
        /// Detailed description of the issue
        details: String,
    },

    /// An eligible block's body cannot hold the record fields
    #[error("data block at offset {offset:#x} (sdna index {layout_index}) is {len} bytes, need at least {need}")]
    RecordTooShort {
        /// Struct-layout index of the block
        layout_index: u32,
        /// Absolute offset of the block header
        offset: usize,
        /// Body length
        len: usize,
        /// Minimum body length for the record fields
        need: usize,
    },

    /// Structural type name not in the catalog
    #[error("type '{name}' not found in catalog")]
    TypeNotFound {
        /// The name that was looked up
        name: String,
    },

    /// No struct layout refers to the type index
    #[error("no struct layout for type '{name}' (type index {type_index})")]
    LayoutNotFound {
        /// Type name
        name: String,
        /// Resolved type index
        type_index: u32,
    },

    /// The record's own name field does not match
    #[error(
        "unexpected record name in data block with sdna index {layout_index} at offset {offset:#x}: \
         expected '{expected}', found '{actual}'"
    )]
    UnexpectedRecordIdentity {
        /// Struct-layout index of the block
        layout_index: u32,
        /// Absolute offset of the block header
        offset: usize,
        /// Name the caller expected
        expected: String,
        /// Name found in the record
        actual: String,
    },

    /// The enum field does not hold the expected old value
    #[error(
        "unexpected enum value in data block with sdna index {layout_index} at offset {offset:#x}: \
         expected {expected}, found {actual}"
    )]
    UnexpectedFieldValue {
        /// Struct-layout index of the block
        layout_index: u32,
        /// Absolute offset of the block header
        offset: usize,
        /// Value the caller expected
        expected: u32,
        /// Value found in the record
        actual: u32,
    },

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new end-of-data error for an access of `need` bytes at `offset`
    pub fn eof(offset: usize, need: usize, buffer_len: usize) -> Self {
        Self::UnexpectedEof {
            offset,
            need,
            have: buffer_len.saturating_sub(offset),
        }
    }

    /// Creates a new catalog error
    pub fn invalid_catalog(offset: usize, details: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the family this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileRead { .. }
            | Self::FileWrite { .. }
            | Self::OutputExists { .. }
            | Self::OutputIsInput { .. }
            | Self::EmptySuffix => ErrorKind::Io,
            Self::TypeNotFound { .. } | Self::LayoutNotFound { .. } => ErrorKind::Resolution,
            Self::UnexpectedRecordIdentity { .. } | Self::UnexpectedFieldValue { .. } => {
                ErrorKind::Validation
            }
            _ => ErrorKind::Format,
        }
    }

    /// Returns true if this error must abort the run.
    ///
    /// Only resolution errors are survivable: they degrade to zero eligible blocks.
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::Resolution
    }
}
