//! File metadata rows: one per indexed file, keyed by absolute path.

use rusqlite::{params, Connection, Row};

use crate::error::StoreError;
use crate::store::{Store, StoreTx};

/// Metadata recorded for each indexed file. `filetime` is the mtime
/// observed when the file's entities were last written; `verified_time`
/// is the last moment the updater confirmed the row against disk.
#[derive(Debug, Clone)]
pub struct FileMeta {
    pub filename: String,
    pub project_root: String,
    pub filetime: i64,
    pub verified_time: i64,
    pub file_hash: i64,
    pub entry_count: u32,
    pub language: String,
}

fn row_to_meta(row: &Row<'_>) -> rusqlite::Result<FileMeta> {
    Ok(FileMeta {
        filename: row.get(0)?,
        project_root: row.get(1)?,
        filetime: row.get(2)?,
        verified_time: row.get(3)?,
        file_hash: row.get(4)?,
        entry_count: row.get(5)?,
        language: row.get(6)?,
    })
}

const META_COLUMNS: &str =
    "filename, project_root, filetime, verified_time, file_hash, entry_count, language";

impl StoreTx<'_> {
    /// Insert or replace a file's metadata row.
    pub fn upsert_file(&self, meta: &FileMeta) -> Result<(), StoreError> {
        self.conn
            .prepare_cached(
                "INSERT OR REPLACE INTO file_metadata \
                 (filename, project_root, filetime, verified_time, file_hash, entry_count, language) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?
            .execute(params![
                meta.filename,
                meta.project_root,
                meta.filetime,
                meta.verified_time,
                meta.file_hash,
                meta.entry_count,
                meta.language,
            ])?;
        Ok(())
    }

    /// Stamp a file's `verified_time` without touching anything else.
    pub fn touch_verified(&self, filename: &str, now: i64) -> Result<(), StoreError> {
        self.conn
            .prepare_cached("UPDATE file_metadata SET verified_time = ?2 WHERE filename = ?1")?
            .execute(params![filename, now])?;
        Ok(())
    }
}

impl Store {
    /// Metadata for one file, if indexed.
    pub fn file_meta(&self, filename: &str) -> Result<Option<FileMeta>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {META_COLUMNS} FROM file_metadata WHERE filename = ?1"
        ))?;
        let mut rows = stmt.query(params![filename])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_meta(row)?)),
            None => Ok(None),
        }
    }

    /// All metadata rows for a project.
    pub fn files_for_project(&self, project_root: &str) -> Result<Vec<FileMeta>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {META_COLUMNS} FROM file_metadata WHERE project_root = ?1"
        ))?;
        let rows = stmt.query_map(params![project_root], row_to_meta)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Files verified within the recency window, most recently verified
    /// first. This is the updater's preferential sweep order.
    pub fn recent_files(
        &self,
        project_root: &str,
        window_start: i64,
    ) -> Result<Vec<FileMeta>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {META_COLUMNS} FROM file_metadata \
             WHERE project_root = ?1 AND verified_time >= ?2 \
             ORDER BY verified_time DESC"
        ))?;
        let rows = stmt.query_map(params![project_root, window_start], row_to_meta)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Files outside the recency window, least recently verified first,
    /// capped at `limit` rows.
    pub fn cold_files(
        &self,
        project_root: &str,
        window_start: i64,
        limit: usize,
    ) -> Result<Vec<FileMeta>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {META_COLUMNS} FROM file_metadata \
             WHERE project_root = ?1 AND verified_time < ?2 \
             ORDER BY verified_time ASC LIMIT ?3"
        ))?;
        let rows = stmt.query_map(
            params![project_root, window_start, limit as i64],
            row_to_meta,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Filenames of every indexed file in a project.
pub(crate) fn project_filenames(
    conn: &Connection,
    project_root: &str,
) -> Result<Vec<String>, StoreError> {
    let mut stmt =
        conn.prepare_cached("SELECT filename FROM file_metadata WHERE project_root = ?1")?;
    let rows = stmt.query_map(params![project_root], |row| row.get(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(filename: &str, verified: i64) -> FileMeta {
        FileMeta {
            filename: filename.to_string(),
            project_root: "/p".to_string(),
            filetime: 1_000,
            verified_time: verified,
            file_hash: 42,
            entry_count: 3,
            language: "php".to_string(),
        }
    }

    #[test]
    fn upsert_and_fetch() {
        let mut store = Store::open_in_memory().unwrap();
        store.tx(|tx| tx.upsert_file(&meta("/p/a.php", 100))).unwrap();

        let fetched = store.file_meta("/p/a.php").unwrap().unwrap();
        assert_eq!(fetched.project_root, "/p");
        assert_eq!(fetched.entry_count, 3);

        // Replace on re-upsert
        let mut updated = meta("/p/a.php", 200);
        updated.entry_count = 9;
        store.tx(|tx| tx.upsert_file(&updated)).unwrap();
        let fetched = store.file_meta("/p/a.php").unwrap().unwrap();
        assert_eq!(fetched.entry_count, 9);
        assert_eq!(fetched.verified_time, 200);
    }

    #[test]
    fn recent_sweep_order_is_newest_first() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .tx(|tx| {
                tx.upsert_file(&meta("/p/a.php", 100))?;
                tx.upsert_file(&meta("/p/b.php", 300))?;
                tx.upsert_file(&meta("/p/c.php", 200))
            })
            .unwrap();

        let recent = store.recent_files("/p", 150).unwrap();
        let names: Vec<&str> = recent.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(names, vec!["/p/b.php", "/p/c.php"]);
    }

    #[test]
    fn cold_sweep_order_is_oldest_first_and_capped() {
        let mut store = Store::open_in_memory().unwrap();
        store
            .tx(|tx| {
                tx.upsert_file(&meta("/p/a.php", 10))?;
                tx.upsert_file(&meta("/p/b.php", 30))?;
                tx.upsert_file(&meta("/p/c.php", 20))
            })
            .unwrap();

        let cold = store.cold_files("/p", 1_000, 2).unwrap();
        let names: Vec<&str> = cold.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(names, vec!["/p/a.php", "/p/c.php"]);
    }

    #[test]
    fn touch_verified_updates_only_timestamp() {
        let mut store = Store::open_in_memory().unwrap();
        store.tx(|tx| tx.upsert_file(&meta("/p/a.php", 100))).unwrap();
        store.tx(|tx| tx.touch_verified("/p/a.php", 999)).unwrap();

        let fetched = store.file_meta("/p/a.php").unwrap().unwrap();
        assert_eq!(fetched.verified_time, 999);
        assert_eq!(fetched.filetime, 1_000);
    }
}
