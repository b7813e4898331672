//! Pluggable persistence for UFO-style font packages.
//!
//! A package can live in a directory, a zip archive, a single XML
//! document or a SQLite database. All of them present the same logical
//! file layout, so code above [`Backend`] never needs to know which one
//! it is talking to.
//!
//! ```
//! use fontstore::{open, Font, StoreConfig, UfoReaderWriter};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = StoreConfig::from_path(dir.path().join("Demo.ufoz")).unwrap();
//!
//! let mut font = Font::new();
//! font.new_layer("public.default").unwrap().new_glyph("space");
//!
//! let mut writer = UfoReaderWriter::new(open(&config).unwrap());
//! font.save(&mut writer).unwrap();
//! writer.close().unwrap();
//!
//! let (_session, font) = fontstore::load_font(&config).unwrap();
//! assert_eq!(font.layer_names(), vec!["public.default"]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

mod config;

pub use config::{open, StoreConfig};

pub use fontstore_core_store::{Backend, Dict, Error, FileSystem, LLError, PropertyValue};
pub use fontstore_font::*;
pub use fontstore_glif::{read_glyph, write_glyph, ReadOptions};
pub use fontstore_stores::{
    ArchiveStore, DirectoryStore, MemoryStore, SingleDocumentStore, SqliteStore,
};

/// A session over whichever backend a configuration picked.
pub type Session = UfoReaderWriter<Box<dyn Backend>>;

/// Open a shared session and load the font it holds. Glyphs stay lazy
/// until asked for, so keep the session alive while using the font.
pub fn load_font(config: &StoreConfig) -> Result<(Rc<RefCell<Session>>, Font), Error> {
    let session = Rc::new(RefCell::new(UfoReaderWriter::new(open(config)?)));
    let font = Font::load(&session)?;
    Ok((session, font))
}
