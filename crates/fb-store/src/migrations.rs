//! Linear, versioned migrations applied on open.
//!
//! `schema_version` holds a single row. A fresh database is created
//! directly at `CURRENT_VERSION`; older databases replay each step in
//! order. Steps are written to be idempotent so an interrupted migration
//! can re-run.

use rusqlite::Connection;

use crate::error::StoreError;
use crate::schema;

/// Current schema revision.
pub const CURRENT_VERSION: u32 = 4;

/// Read the stored schema version; 0 means a fresh (or pre-versioning)
/// database.
pub fn stored_version(conn: &Connection) -> Result<u32, StoreError> {
    let has_table: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    if has_table == 0 {
        return Ok(0);
    }
    let version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            other => Err(other),
        })?;
    Ok(version.unwrap_or(0))
}

/// Bring the database to `CURRENT_VERSION`, creating or migrating as
/// needed. Returns the version the database had before.
pub fn apply(conn: &Connection, now: i64) -> Result<u32, StoreError> {
    let found = stored_version(conn)?;
    if found > CURRENT_VERSION {
        return Err(StoreError::SchemaTooNew {
            found,
            supported: CURRENT_VERSION,
        });
    }

    if found == 0 {
        schema::create_schema(conn)?;
        set_version(conn, CURRENT_VERSION, now)?;
        return Ok(found);
    }

    let mut version = found;
    while version < CURRENT_VERSION {
        tracing::info!(from = version, to = version + 1, "applying schema migration");
        match version {
            1 => migrate_v1_to_v2(conn)?,
            2 => migrate_v2_to_v3(conn)?,
            3 => migrate_v3_to_v4(conn)?,
            other => {
                return Err(StoreError::MigrationFailed {
                    from: other,
                    reason: "no migration step defined".to_string(),
                })
            }
        }
        version += 1;
        set_version(conn, version, now)?;
    }
    Ok(found)
}

fn set_version(conn: &Connection, version: u32, now: i64) -> Result<(), StoreError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version, updated_at) VALUES (?1, ?2)",
        rusqlite::params![version, now],
    )?;
    Ok(())
}

/// v1→v2: the FTS mirror changed shape; drop and recreate it, and clear
/// `last_indexed` so every project reindexes on next use.
fn migrate_v1_to_v2(conn: &Connection) -> Result<(), StoreError> {
    schema::rebuild_fts(conn)?;
    conn.execute("UPDATE project_roots SET last_indexed = NULL", [])?;
    Ok(())
}

/// v2→v3: `project_roots` shed obsolete columns; rebuild the table with
/// the surviving set via rename-copy-drop.
fn migrate_v2_to_v3(conn: &Connection) -> Result<(), StoreError> {
    let legacy: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'project_roots_old'",
        [],
        |row| row.get(0),
    )?;
    if legacy == 0 {
        conn.execute("ALTER TABLE project_roots RENAME TO project_roots_old", [])?;
    }
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS project_roots (
            project_root   TEXT PRIMARY KEY,
            project_name   TEXT NOT NULL,
            registered_at  INTEGER NOT NULL,
            last_indexed   INTEGER,
            last_accessed  INTEGER
        );
        INSERT OR IGNORE INTO project_roots
            (project_root, project_name, registered_at, last_indexed, last_accessed)
            SELECT project_root, project_name, registered_at, last_indexed, last_accessed
            FROM project_roots_old;
        DROP TABLE project_roots_old;
        "#,
    )?;
    Ok(())
}

/// v3→v4: add the auto-update throttle column.
fn migrate_v3_to_v4(conn: &Connection) -> Result<(), StoreError> {
    let has_column: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('project_roots') WHERE name = 'last_update_check'",
        [],
        |row| row.get(0),
    )?;
    if has_column == 0 {
        conn.execute(
            "ALTER TABLE project_roots ADD COLUMN last_update_check INTEGER",
            [],
        )?;
    }
    Ok(())
}
