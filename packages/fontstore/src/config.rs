//! Choosing a backend for a font package.
//!
//! Configurations are JSON objects like:
//! ```json
//! {"type": "directory", "path": "MyFont.ufo"}
//! {"type": "archive", "path": "MyFont.ufoz"}
//! {"type": "single_document", "path": "MyFont.xml"}
//! {"type": "sqlite", "path": "MyFont.ufodb"}
//! ```

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use fontstore_core_store::{Backend, Error};
use fontstore_stores::{ArchiveStore, DirectoryStore, SingleDocumentStore, SqliteStore};

/// Which backend holds a package, and where.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// One file per unit under a directory
    Directory { path: PathBuf },
    /// A zip archive with an in-memory write journal
    Archive { path: PathBuf },
    /// The whole font in one XML document
    SingleDocument { path: PathBuf },
    /// A SQLite database with one row per unit
    Sqlite { path: PathBuf },
}

impl StoreConfig {
    /// Infer the backend from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<StoreConfig, Error> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let path = path.to_path_buf();
        match extension.as_deref() {
            Some("ufo") => Ok(StoreConfig::Directory { path }),
            Some("ufoz") => Ok(StoreConfig::Archive { path }),
            Some("xml") => Ok(StoreConfig::SingleDocument { path }),
            Some("ufodb") => Ok(StoreConfig::Sqlite { path }),
            _ => Err(Error::not_supported(format!(
                "no backend for {}",
                path.display()
            ))),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            StoreConfig::Directory { path }
            | StoreConfig::Archive { path }
            | StoreConfig::SingleDocument { path }
            | StoreConfig::Sqlite { path } => path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StoreConfig::Directory { .. } => "directory",
            StoreConfig::Archive { .. } => "archive",
            StoreConfig::SingleDocument { .. } => "single_document",
            StoreConfig::Sqlite { .. } => "sqlite",
        }
    }
}

/// Open the backend a configuration names.
pub fn open(config: &StoreConfig) -> Result<Box<dyn Backend>, Error> {
    info!("opening {} store at {}", config.kind(), config.path().display());
    Ok(match config {
        StoreConfig::Directory { path } => Box::new(DirectoryStore::new(path)?),
        StoreConfig::Archive { path } => Box::new(ArchiveStore::new(path)?),
        StoreConfig::SingleDocument { path } => Box::new(SingleDocumentStore::new(path)?),
        StoreConfig::Sqlite { path } => Box::new(SqliteStore::new(path)?),
    })
}
