//! Table, index, and trigger definitions at the current schema version.
//!
//! `code_index` is an external-content FTS mirror of `code_entities`; the
//! three triggers keep the two coherent. The delete command rows must come
//! from exactly one place (the AFTER DELETE trigger) — issuing a second
//! `'delete'` for the same rowid corrupts an external-content index.

use rusqlite::Connection;

use crate::error::StoreError;

/// Create all tables, indexes, and triggers at the current version.
/// Every statement is `IF NOT EXISTS`, so this is safe on reopen.
pub fn create_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_roots (
            project_root       TEXT PRIMARY KEY,
            project_name       TEXT NOT NULL,
            registered_at      INTEGER NOT NULL,
            last_indexed       INTEGER,
            last_accessed      INTEGER,
            last_update_check  INTEGER
        );

        CREATE TABLE IF NOT EXISTS file_metadata (
            filename       TEXT PRIMARY KEY,
            project_root   TEXT NOT NULL,
            filetime       INTEGER NOT NULL,
            verified_time  INTEGER NOT NULL,
            file_hash      INTEGER NOT NULL,
            entry_count    INTEGER NOT NULL,
            language       TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_file_metadata_project
            ON file_metadata(project_root);
        CREATE INDEX IF NOT EXISTS idx_file_metadata_verified
            ON file_metadata(project_root, verified_time);

        CREATE TABLE IF NOT EXISTS code_entities (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            preamble       TEXT NOT NULL,
            signature      TEXT NOT NULL,
            body           TEXT NOT NULL,
            namespace      TEXT NOT NULL,
            ext            TEXT NOT NULL,
            path           TEXT NOT NULL,
            preamble_raw   TEXT NOT NULL,
            signature_raw  TEXT NOT NULL,
            type           TEXT NOT NULL,
            name           TEXT NOT NULL DEFAULT '',
            enclosing      TEXT NOT NULL DEFAULT '',
            filename       TEXT NOT NULL,
            line_start     INTEGER NOT NULL,
            line_end       INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_code_entities_filename
            ON code_entities(filename);
        CREATE INDEX IF NOT EXISTS idx_code_entities_type
            ON code_entities(type);

        CREATE VIRTUAL TABLE IF NOT EXISTS code_index USING fts5(
            preamble, signature, body, namespace, ext, path,
            content='code_entities',
            content_rowid='id',
            tokenize='unicode61'
        );

        CREATE TRIGGER IF NOT EXISTS code_entities_ai
        AFTER INSERT ON code_entities BEGIN
            INSERT INTO code_index(rowid, preamble, signature, body, namespace, ext, path)
            VALUES (new.id, new.preamble, new.signature, new.body, new.namespace, new.ext, new.path);
        END;

        CREATE TRIGGER IF NOT EXISTS code_entities_ad
        AFTER DELETE ON code_entities BEGIN
            INSERT INTO code_index(code_index, rowid, preamble, signature, body, namespace, ext, path)
            VALUES ('delete', old.id, old.preamble, old.signature, old.body, old.namespace, old.ext, old.path);
        END;

        CREATE TRIGGER IF NOT EXISTS code_entities_au
        AFTER UPDATE ON code_entities BEGIN
            INSERT INTO code_index(code_index, rowid, preamble, signature, body, namespace, ext, path)
            VALUES ('delete', old.id, old.preamble, old.signature, old.body, old.namespace, old.ext, old.path);
            INSERT INTO code_index(rowid, preamble, signature, body, namespace, ext, path)
            VALUES (new.id, new.preamble, new.signature, new.body, new.namespace, new.ext, new.path);
        END;
        "#,
    )?;
    Ok(())
}

/// Drop and recreate the FTS mirror (used by the v1→v2 migration and as a
/// rebuild escape hatch). Re-populates from the content table.
pub fn rebuild_fts(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS code_index;
        CREATE VIRTUAL TABLE code_index USING fts5(
            preamble, signature, body, namespace, ext, path,
            content='code_entities',
            content_rowid='id',
            tokenize='unicode61'
        );
        INSERT INTO code_index(code_index) VALUES('rebuild');
        "#,
    )?;
    Ok(())
}
