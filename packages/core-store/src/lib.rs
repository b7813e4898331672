//! Core fontstore: Semantic Store Layer
//!
//! This layer adds meaning to the raw bytes of the LL layer:
//! - `PropertyValue`: Parsed property-list trees
//! - `Element`: Generic XML trees, the form glyph and plist units travel in
//! - `StorageKey`: Validated physical locations
//! - `Backend`: Routing of each font unit down to bytes, with override points
//! - `FileSystem`: A session owning the name-to-key mappings
//!
//! # Example
//!
//! ```rust
//! use fontstore_core_store::{plist, Dict, PropertyValue};
//!
//! let mut info = Dict::new();
//! info.insert("familyName".to_string(), "Example Sans".into());
//! let bytes = plist::to_bytes(&PropertyValue::Dict(info.clone())).unwrap();
//! assert_eq!(plist::from_bytes(&bytes).unwrap(), PropertyValue::Dict(info));
//! ```

pub use bytes::Bytes;

mod backend;
mod error;
mod filesystem;
mod key;
pub mod plist;
mod value;
pub mod xml;

#[cfg(test)]
mod test_support;

#[cfg(any(test, feature = "test-utils"))]
pub mod contract;

pub use backend::{
    layer_contents_from_property, layer_contents_to_property, Backend, GlyphAddress,
    GlyphSetContents, LayerAddress, LayerContents, MetaInfo, TopLevelFile,
    DEFAULT_LAYER_CONTAINER, DEFAULT_LAYER_NAME, GLYPH_SET_CONTENTS,
};
pub use error::Error;
pub use filesystem::{FileSystem, GLYPH_KEY_SUFFIX, LAYER_CONTAINER_PREFIX};
pub use key::StorageKey;
pub use value::{Dict, PropertyValue};
pub use xml::Element;

// Re-export LL types for convenience
pub use fontstore_ll_store::{LLError, LLPath, LLReader, LLStore, LLWriter};
