//! Core traits for the LL layer.

use bytes::Bytes;

use crate::LLError;

/// An owned path at the LL level - a sequence of key segments.
///
/// No validation is performed on the components. Stores with a native
/// hierarchy (directories) use them as nested names, flat stores join them
/// with `/`.
pub type LLPath = Vec<String>;

/// Read bytes from a path.
///
/// This is the lowest-level read interface. No parsing, no validation.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn LLReader>`.
pub trait LLReader: Send {
    /// Read raw bytes from path components.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - The path does not exist (not an error condition).
    /// * `Ok(Some(bytes))` - The data at the path.
    /// * `Err(LLError)` - A transport or system error occurred.
    fn ll_read(&mut self, path: &[&str]) -> Result<Option<Bytes>, LLError>;

    /// Enumerate every path that currently holds data.
    ///
    /// Order is store specific. Stores that cannot enumerate return
    /// `LLError::NotSupported`.
    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError>;
}

/// Write bytes to a path.
///
/// Writes are upserts: an existing unit at the same path is replaced whole.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn LLWriter>`.
pub trait LLWriter: Send {
    /// Write raw bytes to path components, replacing any previous data.
    fn ll_write(&mut self, path: &[&str], data: Bytes) -> Result<(), LLError>;

    /// Finish the session: flush buffered writes, finalize the container and
    /// release handles.
    ///
    /// Writes made before a successful close are durable; writes made after
    /// it are undefined. The default does nothing.
    fn ll_close(&mut self) -> Result<(), LLError> {
        Ok(())
    }
}

/// Combined read/write at the LL level.
///
/// Automatically implemented for any type that implements both `LLReader`
/// and `LLWriter`.
pub trait LLStore: LLReader + LLWriter {}
impl<T: LLReader + LLWriter + ?Sized> LLStore for T {}

// Blanket implementations for references and boxes

impl<T: LLReader + ?Sized> LLReader for &mut T {
    fn ll_read(&mut self, path: &[&str]) -> Result<Option<Bytes>, LLError> {
        (*self).ll_read(path)
    }

    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
        (*self).ll_list()
    }
}

impl<T: LLWriter + ?Sized> LLWriter for &mut T {
    fn ll_write(&mut self, path: &[&str], data: Bytes) -> Result<(), LLError> {
        (*self).ll_write(path, data)
    }

    fn ll_close(&mut self) -> Result<(), LLError> {
        (*self).ll_close()
    }
}

impl<T: LLReader + ?Sized> LLReader for Box<T> {
    fn ll_read(&mut self, path: &[&str]) -> Result<Option<Bytes>, LLError> {
        self.as_mut().ll_read(path)
    }

    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
        self.as_mut().ll_list()
    }
}

impl<T: LLWriter + ?Sized> LLWriter for Box<T> {
    fn ll_write(&mut self, path: &[&str], data: Bytes) -> Result<(), LLError> {
        self.as_mut().ll_write(path, data)
    }

    fn ll_close(&mut self) -> Result<(), LLError> {
        self.as_mut().ll_close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// A simple in-memory LL store for testing.
    struct TestLLStore {
        data: BTreeMap<Vec<String>, Bytes>,
        closed: bool,
    }

    impl TestLLStore {
        fn new() -> Self {
            Self {
                data: BTreeMap::new(),
                closed: false,
            }
        }
    }

    impl LLReader for TestLLStore {
        fn ll_read(&mut self, path: &[&str]) -> Result<Option<Bytes>, LLError> {
            let key: Vec<String> = path.iter().map(|c| c.to_string()).collect();
            Ok(self.data.get(&key).cloned())
        }

        fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
            Ok(self.data.keys().cloned().collect())
        }
    }

    impl LLWriter for TestLLStore {
        fn ll_write(&mut self, path: &[&str], data: Bytes) -> Result<(), LLError> {
            let key: Vec<String> = path.iter().map(|c| c.to_string()).collect();
            self.data.insert(key, data);
            Ok(())
        }

        fn ll_close(&mut self) -> Result<(), LLError> {
            self.closed = true;
            Ok(())
        }
    }

    #[test]
    fn basic_read_write_works() {
        let mut store = TestLLStore::new();

        let path = &["glyphs", "A_.glif"];
        let data = Bytes::from_static(b"<glyph/>");
        store.ll_write(path, data.clone()).unwrap();

        let result = store.ll_read(path).unwrap();
        assert_eq!(result, Some(data));

        // Read non-existent path
        let result = store.ll_read(&["nonexistent"]).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn writes_replace_previous_data() {
        let mut store = TestLLStore::new();
        store
            .ll_write(&["lib.plist"], Bytes::from_static(b"first"))
            .unwrap();
        store
            .ll_write(&["lib.plist"], Bytes::from_static(b"second"))
            .unwrap();

        assert_eq!(
            store.ll_read(&["lib.plist"]).unwrap(),
            Some(Bytes::from_static(b"second"))
        );
        assert_eq!(store.ll_list().unwrap().len(), 1);
    }

    #[test]
    fn object_safety_works() {
        let mut store = TestLLStore::new();
        let boxed: &mut dyn LLStore = &mut store;

        boxed
            .ll_write(&["test"], Bytes::from_static(b"data"))
            .unwrap();
        let result = boxed.ll_read(&["test"]).unwrap();
        assert_eq!(result, Some(Bytes::from_static(b"data")));
    }

    #[test]
    fn box_dyn_forwards_close() {
        let mut boxed: Box<dyn LLStore> = Box::new(TestLLStore::new());

        boxed
            .ll_write(&["dyn_test"], Bytes::from_static(b"dyn_data"))
            .unwrap();
        boxed.ll_close().unwrap();
        assert_eq!(boxed.ll_list().unwrap(), vec![vec!["dyn_test".to_string()]]);
    }

    #[test]
    fn default_close_is_a_no_op() {
        struct WriteOnly;
        impl LLWriter for WriteOnly {
            fn ll_write(&mut self, _path: &[&str], _data: Bytes) -> Result<(), LLError> {
                Ok(())
            }
        }

        let mut store = WriteOnly;
        assert!(store.ll_close().is_ok());
    }
}
