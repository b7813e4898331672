//! Font packages as directory trees.

use std::{ffi, fs, io, path};

use log::debug;

use fontstore_core_store::{Backend, Bytes, Error, LLError, LLPath, LLReader, LLWriter};

/// One file per key under a root directory.
///
/// Key segments become nested directories. Writes replace whole files and
/// are durable once they return, so there is no close step.
pub struct DirectoryStore {
    root: path::PathBuf,
}

impl DirectoryStore {
    /// Open the package at `root`, creating the directory if needed.
    pub fn new(root: impl Into<path::PathBuf>) -> Result<DirectoryStore, Error> {
        let root = root.into();
        match fs::metadata(&root) {
            Ok(attr) if !attr.is_dir() => {
                return Err(io::Error::other(format!(
                    "package root {} is not a directory",
                    root.display()
                ))
                .into());
            }
            Ok(_) => {}
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!("Creating package directory {}...", root.display());
                fs::create_dir_all(&root)?;
            }
            Err(error) => return Err(error.into()),
        }
        Ok(DirectoryStore {
            root: root.canonicalize()?,
        })
    }

    pub fn root(&self) -> &path::Path {
        &self.root
    }

    fn file_path(&self, key: &[&str]) -> path::PathBuf {
        self.root
            .components()
            .chain(
                key.iter()
                    .map(|s| path::Component::Normal(ffi::OsStr::new(s))),
            )
            .collect()
    }
}

impl LLReader for DirectoryStore {
    fn ll_read(&mut self, key: &[&str]) -> Result<Option<Bytes>, LLError> {
        let file_path = self.file_path(key);
        debug!("Reading {}...", file_path.display());
        match fs::read(&file_path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
        let mut keys = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(LLError::transport)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(LLError::transport)?;
            keys.push(
                relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect(),
            );
        }
        Ok(keys)
    }
}

impl LLWriter for DirectoryStore {
    fn ll_write(&mut self, key: &[&str], data: Bytes) -> Result<(), LLError> {
        let file_path = self.file_path(key);
        debug!("Writing {} ({} bytes)...", file_path.display(), data.len());
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, &data)?;
        Ok(())
    }
}

impl Backend for DirectoryStore {}
