//! Type catalog lookup.
//!
//! Data blocks are tagged with a struct-layout index, not a type name. To
//! find the blocks holding a given type we resolve the name in two steps:
//!
//! 1. type name → type index, via the catalog's type-name table
//! 2. type index → struct-layout index, via the first layout built on that type
//!
//! Both steps are first-match linear searches in catalog order.
//!
//! ## Extensibility
//!
//! The [`TypeCatalog`] trait is the seam between resolution and parsing.
//! [`Sdna`] implements it over a file's `DNA1` block; any other source of
//! the two tables can implement it too:
//!
//! ```
//! use modconv_core::catalog::TypeCatalog;
//!
//! struct Tables {
//!     names: Vec<&'static str>,
//!     layouts: Vec<u32>,
//! }
//!
//! impl TypeCatalog for Tables {
//!     fn type_count(&self) -> usize {
//!         self.names.len()
//!     }
//!     fn type_name_at(&self, index: u32) -> Option<&str> {
//!         self.names.get(index as usize).copied()
//!     }
//!     fn layout_count(&self) -> usize {
//!         self.layouts.len()
//!     }
//!     fn layout_at(&self, index: u32) -> Option<u32> {
//!         self.layouts.get(index as usize).copied()
//!     }
//! }
//!
//! let tables = Tables { names: vec!["int", "Object"], layouts: vec![1] };
//! assert_eq!(tables.resolve_layout_index("Object").unwrap(), 0);
//! ```

mod sdna;

use crate::error::{Error, Result};
use tracing::info;

pub use sdna::{Sdna, SdnaField, SdnaStruct};

/// Read-only view of a file's type tables
pub trait TypeCatalog {
    /// Number of entries in the type-name table
    fn type_count(&self) -> usize;

    /// Type name at a type index
    fn type_name_at(&self, index: u32) -> Option<&str>;

    /// Number of entries in the struct-layout table
    fn layout_count(&self) -> usize;

    /// Type index that the layout at `index` describes
    fn layout_at(&self, index: u32) -> Option<u32>;

    /// Lowest type index whose name equals `name`
    fn index_of_type_name(&self, name: &str) -> Option<u32> {
        (0..self.type_count() as u32).find(|&i| self.type_name_at(i) == Some(name))
    }

    /// Lowest layout index describing `type_index`
    fn layout_of_type_index(&self, type_index: u32) -> Option<u32> {
        (0..self.layout_count() as u32).find(|&i| self.layout_at(i) == Some(type_index))
    }

    /// Resolves a type name to the struct-layout index used to tag its data blocks.
    ///
    /// Fails with [`Error::TypeNotFound`] or [`Error::LayoutNotFound`]; both
    /// are resolution errors, not format errors.
    fn resolve_layout_index(&self, name: &str) -> Result<u32> {
        info!("Finding type index for {}...", name);
        let type_index = self
            .index_of_type_name(name)
            .ok_or_else(|| Error::TypeNotFound { name: name.to_string() })?;
        info!("  `-> {}", type_index);

        info!("Finding sdna index for type index {}...", type_index);
        let layout_index = self
            .layout_of_type_index(type_index)
            .ok_or_else(|| Error::LayoutNotFound {
                name: name.to_string(),
                type_index,
            })?;
        info!("  `-> {}", layout_index);

        Ok(layout_index)
    }
}
