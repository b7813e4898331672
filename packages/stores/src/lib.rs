//! Concrete fontstore backends.
//!
//! Each store owns one physical font package and implements
//! [`Backend`](fontstore_core_store::Backend). The byte-oriented stores
//! only provide the LL traits and inherit all routing; the single-document
//! store overrides every routing point instead.

pub mod archive;
pub mod directory;
pub mod memory;
pub mod single_document;
pub mod sqlite;

pub use archive::ArchiveStore;
pub use directory::DirectoryStore;
pub use memory::MemoryStore;
pub use single_document::SingleDocumentStore;
pub use sqlite::SqliteStore;
