//! Entity rows: batched insert and batched, chunked deletion.

use rusqlite::{params, params_from_iter, Connection};

use crate::error::StoreError;
use crate::store::StoreTx;
use crate::DELETE_BATCH_SIZE;

/// One row ready for insertion: the extractor record plus the tokenized
/// field set the FTS mirror indexes.
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub preamble: String,
    pub signature: String,
    pub body: String,
    pub namespace: String,
    pub ext: String,
    pub path: String,
    pub preamble_raw: String,
    pub signature_raw: String,
    pub kind: String,
    pub name: String,
    pub enclosing: String,
    pub filename: String,
    pub line_start: u32,
    pub line_end: u32,
}

impl StoreTx<'_> {
    /// Insert entity rows. The insert trigger mirrors each row into the
    /// FTS table.
    pub fn insert_entities(&self, rows: &[NewEntity]) -> Result<(), StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO code_entities \
             (preamble, signature, body, namespace, ext, path, \
              preamble_raw, signature_raw, type, name, enclosing, \
              filename, line_start, line_end) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        )?;
        for row in rows {
            stmt.execute(params![
                row.preamble,
                row.signature,
                row.body,
                row.namespace,
                row.ext,
                row.path,
                row.preamble_raw,
                row.signature_raw,
                row.kind,
                row.name,
                row.enclosing,
                row.filename,
                row.line_start,
                row.line_end,
            ])?;
        }
        Ok(())
    }

    /// Delete all entity and metadata rows for the given files, in
    /// `IN (...)` chunks of at most [`DELETE_BATCH_SIZE`] names. The
    /// delete trigger emits one FTS delete command per removed rowid.
    pub fn purge_files(&self, filenames: &[String]) -> Result<usize, StoreError> {
        let mut removed = 0usize;
        for chunk in filenames.chunks(DELETE_BATCH_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("DELETE FROM code_entities WHERE filename IN ({placeholders})");
            removed += self
                .conn
                .prepare_cached(&sql)?
                .execute(params_from_iter(chunk.iter()))?;
            let sql = format!("DELETE FROM file_metadata WHERE filename IN ({placeholders})");
            self.conn
                .prepare_cached(&sql)?
                .execute(params_from_iter(chunk.iter()))?;
        }
        Ok(removed)
    }

    /// Delete every entity and metadata row belonging to a project.
    pub fn purge_project(&self, project_root: &str) -> Result<usize, StoreError> {
        let files = crate::files::project_filenames(self.conn, project_root)?;
        self.purge_files(&files)
    }
}

/// Count of live entity rows.
pub fn entity_count(conn: &Connection, project_root: &str) -> Result<usize, StoreError> {
    let count: i64 = conn
        .prepare_cached(
            "SELECT COUNT(*) FROM code_entities \
             WHERE substr(filename, 1, length(?1)) = ?1",
        )?
        .query_row(params![prefix_of(project_root)], |row| row.get(0))?;
    Ok(count as usize)
}

impl crate::Store {
    /// Number of entity rows belonging to a project.
    pub fn entity_count(&self, project_root: &str) -> Result<usize, StoreError> {
        entity_count(self.conn(), project_root)
    }
}

/// Prefix used for project scoping: the root path plus the separator, so
/// `/a/b` never matches files under `/a/bc`.
pub(crate) fn prefix_of(project_root: &str) -> String {
    let mut p = project_root.trim_end_matches('/').to_string();
    p.push('/');
    p
}
