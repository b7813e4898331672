//! In-memory byte store.

use std::collections::BTreeMap;

use fontstore_core_store::{Backend, Bytes, LLError, LLPath, LLReader, LLWriter};
use fontstore_ll_store::{flat_key, split_flat_key};

/// A font package held entirely in memory.
///
/// Useful for scratch sessions and tests. Nothing survives the value.
///
/// # Example
///
/// ```rust
/// use fontstore_stores::MemoryStore;
/// use fontstore_core_store::Backend;
///
/// let mut store = MemoryStore::new();
/// store.write_features("languagesystem DFLT dflt;").unwrap();
/// assert_eq!(
///     store.read_features().unwrap().as_deref(),
///     Some("languagesystem DFLT dflt;")
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flat `a/b` keys of everything stored.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LLReader for MemoryStore {
    fn ll_read(&mut self, path: &[&str]) -> Result<Option<Bytes>, LLError> {
        Ok(self.entries.get(&flat_key(path)).cloned())
    }

    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
        Ok(self.entries.keys().map(|k| split_flat_key(k)).collect())
    }
}

impl LLWriter for MemoryStore {
    fn ll_write(&mut self, path: &[&str], data: Bytes) -> Result<(), LLError> {
        self.entries.insert(flat_key(path), data);
        Ok(())
    }
}

impl Backend for MemoryStore {}
