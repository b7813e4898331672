//! Font packages as zip archives.

use std::collections::HashSet;
use std::io::Read;
use std::{fs, io, path};

use indexmap::IndexMap;
use log::{debug, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use fontstore_core_store::{Backend, Bytes, Error, LLError, LLPath, LLReader, LLWriter};
use fontstore_ll_store::{flat_key, split_flat_key};

/// A zip archive holding one font package.
///
/// Writes go to an in-session journal and reads see them immediately. The
/// archive on disk is only replaced by `ll_close`, which compacts the old
/// entries and the journal into a new archive and renames it into place.
/// A session that never writes never touches the file.
pub struct ArchiveStore {
    path: path::PathBuf,
    archive: Option<ZipArchive<fs::File>>,
    journal: Vec<(String, Bytes)>,
}

impl ArchiveStore {
    /// Open the archive at `path`. A missing file is an empty package.
    pub fn new(path: impl Into<path::PathBuf>) -> Result<ArchiveStore, Error> {
        let path = path.into();
        let archive = Self::open_archive(&path)?;
        Ok(ArchiveStore {
            path,
            archive,
            journal: Vec::new(),
        })
    }

    pub fn path(&self) -> &path::Path {
        &self.path
    }

    fn open_archive(path: &path::Path) -> Result<Option<ZipArchive<fs::File>>, LLError> {
        match fs::File::open(path) {
            Ok(file) => {
                debug!("Opening archive {}...", path.display());
                Ok(Some(ZipArchive::new(file).map_err(LLError::transport)?))
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn read_entry(&mut self, name: &str) -> Result<Option<Bytes>, LLError> {
        let Some(archive) = self.archive.as_mut() else {
            return Ok(None);
        };
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(error) => return Err(LLError::transport(error)),
        };
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(Some(Bytes::from(data)))
    }

    fn compact(&mut self) -> Result<(), LLError> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => path::PathBuf::from("."),
        };
        let mut temp = tempfile::NamedTempFile::new_in(&directory)?;
        let latest = latest_writes(&self.journal);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut writer = ZipWriter::new(temp.as_file_mut());
        let mut kept = 0;
        if let Some(archive) = self.archive.as_mut() {
            for index in 0..archive.len() {
                let entry = archive.by_index_raw(index).map_err(LLError::transport)?;
                if latest.contains_key(entry.name()) {
                    continue;
                }
                debug!("Copying archive entry {}...", entry.name());
                writer.raw_copy_file(entry).map_err(LLError::transport)?;
                kept += 1;
            }
        }
        for (name, data) in &latest {
            debug!("Writing archive entry {} ({} bytes)...", name, data.len());
            writer
                .start_file(*name, options)
                .map_err(LLError::transport)?;
            io::Write::write_all(&mut writer, &data[..])?;
        }
        writer.finish().map_err(LLError::transport)?;
        let written = latest.len();

        self.archive = None;
        temp.persist(&self.path).map_err(|e| LLError::from(e.error))?;
        info!(
            "Compacted {} ({} entries kept, {} written)",
            self.path.display(),
            kept,
            written
        );

        self.journal.clear();
        self.archive = Self::open_archive(&self.path)?;
        Ok(())
    }
}

/// Latest journal entry per key, in first-write order.
fn latest_writes(journal: &[(String, Bytes)]) -> IndexMap<&str, &Bytes> {
    let mut latest = IndexMap::new();
    for (name, data) in journal {
        latest.insert(name.as_str(), data);
    }
    latest
}

impl LLReader for ArchiveStore {
    fn ll_read(&mut self, key: &[&str]) -> Result<Option<Bytes>, LLError> {
        let name = flat_key(key);
        debug!("Reading {} from {}...", name, self.path.display());
        if let Some((_, data)) = self.journal.iter().rev().find(|(n, _)| *n == name) {
            return Ok(Some(data.clone()));
        }
        self.read_entry(&name)
    }

    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let archived = self
            .archive
            .iter()
            .flat_map(|archive| archive.file_names())
            .filter(|name| !name.ends_with('/'));
        let journaled = self.journal.iter().map(|(name, _)| name.as_str());
        for name in archived.chain(journaled) {
            if seen.insert(name) {
                keys.push(split_flat_key(name));
            }
        }
        Ok(keys)
    }
}

impl LLWriter for ArchiveStore {
    fn ll_write(&mut self, key: &[&str], data: Bytes) -> Result<(), LLError> {
        let name = flat_key(key);
        debug!("Journaling {} ({} bytes)...", name, data.len());
        self.journal.push((name, data));
        Ok(())
    }

    fn ll_close(&mut self) -> Result<(), LLError> {
        if self.journal.is_empty() {
            return Ok(());
        }
        self.compact()
    }
}

impl Backend for ArchiveStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use fontstore_core_store::contract;

    fn open(location: &path::Path) -> ArchiveStore {
        ArchiveStore::new(location).unwrap()
    }

    fn scratch() -> (tempfile::TempDir, ArchiveStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir.path().join("Test.ufoz"));
        (dir, store)
    }

    #[test]
    fn byte_contract() {
        contract::write_then_read_works(&mut scratch().1);
        contract::missing_reads_none(&mut scratch().1);
        contract::overwrite_replaces(&mut scratch().1);
        contract::list_reports_writes(&mut scratch().1);
        contract::reopen_keeps_writes(open);
    }

    #[test]
    fn backend_contract() {
        contract::backend_round_trip(open);
        contract::read_only_session_changes_nothing(open);
        contract::session_names_survive_reopen(open);
    }

    #[test]
    fn compaction_keeps_one_entry_per_key() {
        let (dir, mut store) = scratch();
        store
            .ll_write(&["lib.plist"], Bytes::from_static(b"first"))
            .unwrap();
        store
            .ll_write(&["groups.plist"], Bytes::from_static(b"groups"))
            .unwrap();
        store
            .ll_write(&["lib.plist"], Bytes::from_static(b"second"))
            .unwrap();
        store.ll_close().unwrap();

        let file = fs::File::open(dir.path().join("Test.ufoz")).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 2);
        let mut data = String::new();
        archive
            .by_name("lib.plist")
            .unwrap()
            .read_to_string(&mut data)
            .unwrap();
        assert_eq!(data, "second");
    }

    #[test]
    fn later_sessions_replace_and_keep_entries() {
        let (dir, mut store) = scratch();
        store
            .ll_write(&["lib.plist"], Bytes::from_static(b"old"))
            .unwrap();
        store
            .ll_write(&["groups.plist"], Bytes::from_static(b"groups"))
            .unwrap();
        store.ll_close().unwrap();

        let location = dir.path().join("Test.ufoz");
        let mut store = open(&location);
        store
            .ll_write(&["lib.plist"], Bytes::from_static(b"new"))
            .unwrap();
        assert_eq!(
            store.ll_read(&["lib.plist"]).unwrap(),
            Some(Bytes::from_static(b"new"))
        );
        store.ll_close().unwrap();

        let mut store = open(&location);
        assert_eq!(
            store.ll_read(&["lib.plist"]).unwrap(),
            Some(Bytes::from_static(b"new"))
        );
        assert_eq!(
            store.ll_read(&["groups.plist"]).unwrap(),
            Some(Bytes::from_static(b"groups"))
        );
        assert_eq!(store.ll_list().unwrap().len(), 2);
    }

    #[test]
    fn reads_after_close_see_the_new_archive() {
        let (_dir, mut store) = scratch();
        store
            .ll_write(&["features.fea"], Bytes::from_static(b"# empty"))
            .unwrap();
        store.ll_close().unwrap();
        assert_eq!(
            store.ll_read(&["features.fea"]).unwrap(),
            Some(Bytes::from_static(b"# empty"))
        );
    }

    #[test]
    fn untouched_sessions_create_nothing() {
        let (dir, mut store) = scratch();
        assert_eq!(store.ll_read(&["lib.plist"]).unwrap(), None);
        store.ll_close().unwrap();
        assert!(!dir.path().join("Test.ufoz").exists());
    }

    #[test]
    fn garbage_is_not_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("Broken.ufoz");
        fs::write(&location, b"definitely not a zip file").unwrap();
        assert!(ArchiveStore::new(&location).is_err());
    }
}
