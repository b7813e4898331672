//! Font packages as SQLite databases.

use std::path;

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};

use fontstore_core_store::{Backend, Bytes, Error, LLError, LLPath, LLReader, LLWriter};
use fontstore_ll_store::{flat_key, split_flat_key};

/// One row per key in a single `data` table.
///
/// The first write of a session opens a transaction and `ll_close` commits
/// it, so a session's writes land together or not at all.
pub struct SqliteStore {
    path: path::PathBuf,
    connection: Connection,
    in_transaction: bool,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn new(path: impl Into<path::PathBuf>) -> Result<SqliteStore, Error> {
        let path = path.into();
        debug!("Opening database {}...", path.display());
        let connection = Connection::open(&path).map_err(LLError::transport)?;
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS data (
                    location TEXT PRIMARY KEY,
                    bytes BLOB NOT NULL
                )",
                [],
            )
            .map_err(LLError::transport)?;
        Ok(SqliteStore {
            path,
            connection,
            in_transaction: false,
        })
    }

    pub fn path(&self) -> &path::Path {
        &self.path
    }
}

impl LLReader for SqliteStore {
    fn ll_read(&mut self, key: &[&str]) -> Result<Option<Bytes>, LLError> {
        let location = flat_key(key);
        debug!("Reading {} from {}...", location, self.path.display());
        let data: Option<Vec<u8>> = self
            .connection
            .query_row(
                "SELECT bytes FROM data WHERE location = ?1",
                params![location],
                |row| row.get(0),
            )
            .optional()
            .map_err(LLError::transport)?;
        Ok(data.map(Bytes::from))
    }

    fn ll_list(&mut self) -> Result<Vec<LLPath>, LLError> {
        let mut statement = self
            .connection
            .prepare("SELECT location FROM data ORDER BY location")
            .map_err(LLError::transport)?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(LLError::transport)?;
        let mut keys = Vec::new();
        for location in rows {
            keys.push(split_flat_key(&location.map_err(LLError::transport)?));
        }
        Ok(keys)
    }
}

impl LLWriter for SqliteStore {
    fn ll_write(&mut self, key: &[&str], data: Bytes) -> Result<(), LLError> {
        let location = flat_key(key);
        if !self.in_transaction {
            self.connection
                .execute("BEGIN IMMEDIATE", [])
                .map_err(LLError::transport)?;
            self.in_transaction = true;
        }
        debug!("Writing {} ({} bytes)...", location, data.len());
        self.connection
            .execute(
                "INSERT INTO data (location, bytes) VALUES (?1, ?2)
                 ON CONFLICT(location) DO UPDATE SET bytes = excluded.bytes",
                params![location, &data[..]],
            )
            .map_err(LLError::transport)?;
        Ok(())
    }

    fn ll_close(&mut self) -> Result<(), LLError> {
        if self.in_transaction {
            self.connection
                .execute("COMMIT", [])
                .map_err(LLError::transport)?;
            self.in_transaction = false;
            info!("Committed session to {}", self.path.display());
        }
        Ok(())
    }
}

impl Backend for SqliteStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use fontstore_core_store::contract;

    fn open(location: &path::Path) -> SqliteStore {
        SqliteStore::new(location).unwrap()
    }

    fn scratch() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir.path().join("Test.ufodb"));
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
    fn uncommitted_sessions_leave_nothing() {
        let (dir, mut store) = scratch();
        store
            .ll_write(&["lib.plist"], Bytes::from_static(b"lost"))
            .unwrap();
        drop(store);

        let mut store = open(&dir.path().join("Test.ufodb"));
        assert_eq!(store.ll_read(&["lib.plist"]).unwrap(), None);
    }

    #[test]
    fn sessions_can_continue_after_close() {
        let (_dir, mut store) = scratch();
        store
            .ll_write(&["a"], Bytes::from_static(b"1"))
            .unwrap();
        store.ll_close().unwrap();
        store
            .ll_write(&["b"], Bytes::from_static(b"2"))
            .unwrap();
        store.ll_close().unwrap();
        assert_eq!(store.ll_list().unwrap().len(), 2);
    }
}
