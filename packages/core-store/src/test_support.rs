//! Scratch backend for unit tests in this crate.

use std::collections::BTreeMap;

use bytes::Bytes;
use fontstore_ll_store::{split_flat_key, LLError, LLPath, LLReader, LLWriter};

use crate::Backend;

/// Flat byte map that counts closes.
#[derive(Default)]
pub struct MapBackend {
    pub data: BTreeMap<String, Bytes>,
    pub closes: usize,
}

impl LLReader for MapBackend {
    fn ll_read(&mut self, path: &[&str]) -> Result<Option<Bytes>, LLError> {
        Ok(self.data.get(&path.join("/")).cloned())
    }

    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
        Ok(self.data.keys().map(|k| split_flat_key(k)).collect())
    }
}

impl LLWriter for MapBackend {
    fn ll_write(&mut self, path: &[&str], data: Bytes) -> Result<(), LLError> {
        self.data.insert(path.join("/"), data);
        Ok(())
    }

    fn ll_close(&mut self) -> Result<(), LLError> {
        self.closes += 1;
        Ok(())
    }
}

impl Backend for MapBackend {}
