//! # modconv-core
//!
//! A library for patching modifier records inside Blender `.blend` files.
//!
//! A blend file is a 12-byte header followed by a sequence of blocks. Data
//! blocks are tagged with a struct-layout index that is only meaningful
//! through the file's own type catalog (the `DNA1` block). This crate:
//!
//! - Reads the header to learn pointer width and byte order
//! - Resolves a struct type name to its layout index through the catalog
//! - Walks the blocks and, for each `DATA` block with that layout, checks the
//!   record's name and enum field before overwriting the enum in place
//!
//! The file length never changes and no other byte is touched.
//!
//! ## Architecture
//!
//! - [`codec`]: Endian-aware integer and fixed-string access
//! - [`header`]: File header and decoding configuration
//! - [`block`]: Block header parsing and iteration
//! - [`catalog`]: Type catalog lookup and the SDNA parser
//! - [`patch`]: Single-record validation and patching
//! - [`driver`]: Whole-file runs and output
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use modconv_core::{patch_file, PatchOptions, TargetSpec};
//!
//! // Turn every "Bevel" modifier with enum type 7 into type 42
//! let target = TargetSpec::new("BevelModifierData", "Bevel", 7, 42);
//! let report = patch_file("scene.blend", &target, &PatchOptions::default())?;
//!
//! match report.output {
//!     Some(path) => println!("wrote {}", path.display()),
//!     None => println!("nothing to do"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod block;
pub mod catalog;
pub mod codec;
pub mod driver;
pub mod error;
pub mod header;
pub mod patch;

// Re-export primary types for convenience
pub use block::{Block, BlockCode, BlockIter};
pub use catalog::{Sdna, TypeCatalog};
pub use codec::{DecodingConfig, Endianness, PointerWidth};
pub use driver::{
    output_path_for, patch_bytes, patch_file, PatchOptions, PatchResult, PatchSession, RunReport,
    RunState,
};
pub use error::{Error, ErrorKind, Result};
pub use header::FileHeader;
pub use patch::TargetSpec;

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
