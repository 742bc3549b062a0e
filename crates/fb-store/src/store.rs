//! Store handle: one SQLite connection, exclusive to this process.

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use crate::error::StoreError;
use crate::migrations;

/// Directory under `$HOME` that holds the index database.
const APP_DIR: &str = ".local/fubber";
/// Database file name.
const DB_FILE: &str = "index.db";

/// Handle to the index database. Every mutating call runs inside a
/// transaction; the prepared-statement cache lives with the connection.
pub struct Store {
    conn: Connection,
}

/// A write transaction over the store. Dropped without [`StoreTx::commit`]
/// (via the closure in [`Store::tx`] returning `Err`), all writes roll back.
pub struct StoreTx<'a> {
    pub(crate) conn: &'a Connection,
}

impl Store {
    /// Open (or create) the database at its default location,
    /// `$HOME/.local/fubber/index.db`, creating the directory on demand.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open_at(&Self::default_path()?)
    }

    /// The default database path under the caller's home directory.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let home = std::env::var_os("HOME").ok_or(StoreError::MissingHome)?;
        Ok(PathBuf::from(home).join(APP_DIR).join(DB_FILE))
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        configure_pragmas(&conn)?;
        migrations::apply(&conn, fb_core::now_epoch())?;
        Ok(Self { conn })
    }

    /// Run `f` inside one write transaction; commit on `Ok`, roll back on
    /// `Err`.
    pub fn tx<T>(
        &mut self,
        f: impl FnOnce(&StoreTx<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let tx = self.conn.transaction()?;
        let result = f(&StoreTx { conn: &tx });
        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Verify the FTS mirror agrees with the content table. Surfaces as an
    /// `Err` (corrupt vtab) when the two have diverged.
    pub fn check_fts_integrity(&self) -> Result<(), StoreError> {
        self.conn
            .execute("INSERT INTO code_index(code_index) VALUES('integrity-check')", [])?;
        Ok(())
    }
}

fn configure_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;\
         PRAGMA busy_timeout = 5000;\
         PRAGMA synchronous = NORMAL;\
         PRAGMA foreign_keys = ON;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_initializes_schema() {
        let store = Store::open_in_memory().unwrap();
        store.check_fts_integrity().unwrap();
    }

    #[test]
    fn open_at_creates_parent_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("dir").join("index.db");
        let _store = Store::open_at(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn reopen_is_idempotent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("index.db");
        drop(Store::open_at(&path).unwrap());
        let _again = Store::open_at(&path).unwrap();
    }

    #[test]
    fn tx_rolls_back_on_error() {
        let mut store = Store::open_in_memory().unwrap();
        let result: Result<(), StoreError> = store.tx(|tx| {
            tx.conn.execute(
                "INSERT INTO project_roots (project_root, project_name, registered_at) \
                 VALUES ('/p', 'p', 1)",
                [],
            )?;
            Err(StoreError::MissingHome)
        });
        assert!(result.is_err());

        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM project_roots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn tx_commits_on_ok() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .tx(|tx| {
                tx.conn.execute(
                    "INSERT INTO project_roots (project_root, project_name, registered_at) \
                     VALUES ('/p', 'p', 1)",
                    [],
                )?;
                Ok(())
            })
            .unwrap();

        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM project_roots", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
