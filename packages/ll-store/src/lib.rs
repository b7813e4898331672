//! Low-level fontstore traits.
//!
//! This is the narrow waist of the fontstore stack. Everything at this level
//! is pure bytes addressed by key segments - no plist parsing, no glyph
//! semantics, no key validation.
//!
//! Every physical font container (a directory tree, a zip archive, a
//! database table) implements these traits. Higher layers route the logical
//! font files (`fontinfo.plist`, `glyphs/A_.glif`, ...) onto them.
//!
//! # Example
//!
//! ```rust
//! use fontstore_ll_store::{LLError, LLPath, LLReader, LLWriter};
//! use bytes::Bytes;
//!
//! struct InMemoryLLStore {
//!     data: std::collections::HashMap<String, Bytes>,
//! }
//!
//! impl LLReader for InMemoryLLStore {
//!     fn ll_read(&mut self, path: &[&str]) -> Result<Option<Bytes>, LLError> {
//!         Ok(self.data.get(&path.join("/")).cloned())
//!     }
//!
//!     fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
//!         Ok(self
//!             .data
//!             .keys()
//!             .map(|k| k.split('/').map(str::to_string).collect())
//!             .collect())
//!     }
//! }
//! ```

pub use bytes::Bytes;

mod error;
mod traits;

pub use error::LLError;
pub use traits::{LLPath, LLReader, LLStore, LLWriter};

/// Convenience function to create an owned path from string slices.
pub fn ll_path(components: &[&str]) -> LLPath {
    components.iter().map(|c| c.to_string()).collect()
}

/// Join path components into the flat `a/b/c` form used by stores that
/// have no native hierarchy (archive entries, database rows).
pub fn flat_key(components: &[&str]) -> String {
    components.join("/")
}

/// Split a flat `a/b/c` key back into owned components.
pub fn split_flat_key(key: &str) -> LLPath {
    key.split('/')
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_keys_round_trip() {
        let key = flat_key(&["glyphs", "A_.glif"]);
        assert_eq!(key, "glyphs/A_.glif");
        assert_eq!(split_flat_key(&key), ll_path(&["glyphs", "A_.glif"]));
    }

    #[test]
    fn split_ignores_empty_components() {
        assert_eq!(split_flat_key("a//b/"), ll_path(&["a", "b"]));
    }
}
